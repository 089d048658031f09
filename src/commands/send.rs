use crate::app::{ChatApp, SendOutcome};
use crate::display;
use crate::error::{ChatError, Result};
use crate::transport::Transport;
use std::path::PathBuf;

/// Send one message with optional attachments and print the reply
///
/// # Errors
///
/// Fails when an attachment cannot be read, no API key is saved, or the
/// exchange fails. In the last case the error reply is printed first.
pub async fn handle_send<T: Transport>(
    app: &mut ChatApp<T>,
    text: &str,
    files: &[PathBuf],
) -> Result<SendOutcome> {
    for path in files {
        let attached = app.attach_file(path).await;
        super::finish(app, attached)?;
    }

    let sent = app.send_message(text).await;
    let outcome = super::finish(app, sent)?;

    if let Some(reply) = app.session().messages.last() {
        if outcome != SendOutcome::Ignored {
            println!(
                "{}",
                display::render_message(
                    reply,
                    app.settings().theme,
                    app.settings().syntax_highlight
                )
            );
        }
    }

    match outcome {
        SendOutcome::Failed => {
            Err(ChatError::RequestFailed("the endpoint did not return a reply".to_string()).into())
        }
        other => Ok(other),
    }
}
