use crate::app::ChatApp;
use crate::error::{ChatError, Result};
use crate::export::ExportFormat;
use crate::transport::Transport;
use colored::Colorize;
use std::path::{Path, PathBuf};

/// Export a saved chat to `output`
///
/// Without an id the most recent chat is exported.
pub fn handle_export<T: Transport>(
    app: &mut ChatApp<T>,
    id: Option<String>,
    format: ExportFormat,
    output: &Path,
) -> Result<PathBuf> {
    let id = match id {
        Some(id) => id,
        None => app
            .chats()?
            .first()
            .map(|chat| chat.id.clone())
            .ok_or(ChatError::EmptyTranscript)?,
    };
    app.load_chat(&id)?;

    let exported = app.export(format);
    let file = super::finish(app, exported)?;
    let path = file.write_to(output)?;
    println!("Saved {}", path.display().to_string().cyan());
    Ok(path)
}
