use crate::app::ChatApp;
use crate::cli::KeyCommand;
use crate::error::Result;
use crate::transport::Transport;

/// Handle API key commands
///
/// `test` reports an unaccepted key through a notice and still returns
/// `Ok`; only a failure to reach the endpoint is an error.
pub async fn handle_key<T: Transport>(app: &mut ChatApp<T>, command: KeyCommand) -> Result<()> {
    let result = match command {
        KeyCommand::Set { key } => app.set_api_key(&key),
        KeyCommand::Test { key } => app.verify_api_key(key.as_deref()).await.map(|_| ()),
        KeyCommand::Clear => app.set_api_key(""),
    };
    super::finish(app, result)
}
