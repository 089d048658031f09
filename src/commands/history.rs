use crate::app::ChatApp;
use crate::cli::HistoryCommand;
use crate::display;
use crate::error::Result;
use crate::transport::Transport;
use colored::Colorize;

/// Handle history commands
pub fn handle_history<T: Transport>(app: &mut ChatApp<T>, command: HistoryCommand) -> Result<()> {
    match command {
        HistoryCommand::List => {
            let chats = app.chats()?;
            display::print_chat_table(&chats);
            if !chats.is_empty() {
                println!();
                println!(
                    "Use {} to continue a chat.",
                    "quillchat chat --resume <ID>".cyan()
                );
                println!();
            }
        }
        HistoryCommand::Show { id } => {
            app.load_chat(&id)?;
            display::print_transcript(app.session(), app.settings());
        }
    }

    Ok(())
}
