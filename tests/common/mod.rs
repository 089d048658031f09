use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;
use quillchat::app::ChatApp;
use quillchat::config::TransportConfig;
use quillchat::storage::SqliteStore;
use quillchat::transport::HttpTransport;

#[allow(dead_code)]
pub fn create_temp_store() -> (SqliteStore, TempDir) {
    let tmp = TempDir::new().expect("failed to create tempdir");
    let db_path = tmp.path().join("store.db");
    let store = SqliteStore::new_with_path(db_path).expect("failed to create sqlite store");
    (store, tmp)
}

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}

/// Transport aimed at a mock server
#[allow(dead_code)]
pub fn transport_for(endpoint: &str) -> HttpTransport {
    let config = TransportConfig {
        endpoint: endpoint.to_string(),
        timeout_seconds: 5,
        ..TransportConfig::default()
    };
    HttpTransport::new(&config).expect("failed to build transport")
}

/// App backed by a temp SQLite store with `api_key` saved
#[allow(dead_code)]
pub fn app_for(endpoint: &str, api_key: Option<&str>) -> (ChatApp<HttpTransport>, TempDir) {
    let (store, tmp) = create_temp_store();
    if let Some(key) = api_key {
        quillchat::settings::save_api_key(&store, key).expect("failed to save key");
    }
    let app = ChatApp::new(Box::new(store), transport_for(endpoint), 50)
        .expect("failed to create app");
    (app, tmp)
}
