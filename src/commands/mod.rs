/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint:

- `chat`    : Interactive chat (REPL with slash commands)
- `send`    : One message, one reply
- `history` : List and show saved chats
- `settings`: Show, change and reset settings
- `key`     : Save, test and clear the API key
- `export`  : Write a transcript to disk

Handlers are generic over [`Transport`](crate::transport::Transport) so they
run against any endpoint implementation.
*/

use crate::app::ChatApp;
use crate::display;
use crate::error::Result;
use crate::transport::Transport;

// Slash command parser for interactive mode
pub mod special_commands;

pub mod export;
pub mod history;
pub mod key;
pub mod send;
pub mod settings;

/// Print queued notices and pass the result through
pub(crate) fn finish<T: Transport, R>(app: &mut ChatApp<T>, result: Result<R>) -> Result<R> {
    display::print_notices(&app.drain_notices());
    result
}

// Chat command handler
pub mod chat {
    //! Interactive chat mode handler.
    //!
    //! Runs a readline loop. Lines starting with `/` are client commands;
    //! everything else is sent to the endpoint and the reply rendered.

    use super::*;
    use crate::app::{code_prompt, SendOutcome};
    use crate::commands::special_commands::{
        parse_special_command, print_help, SpecialCommand, COMMAND_NAMES,
    };
    use crate::config::ChatConfig;
    use crate::suggest;
    use colored::Colorize;
    use rustyline::completion::Completer;
    use rustyline::error::ReadlineError;
    use rustyline::highlight::Highlighter;
    use rustyline::hint::Hinter;
    use rustyline::history::DefaultHistory;
    use rustyline::validate::Validator;
    use rustyline::{Context, Editor, Helper};
    use std::borrow::Cow;
    use std::path::Path;

    /// Tab completion and inline hints from the common phrase list
    struct PhraseHelper;

    fn candidates(prefix: &str) -> Vec<String> {
        if prefix.starts_with('/') {
            let lower = prefix.to_lowercase();
            COMMAND_NAMES
                .iter()
                .filter(|name| name.starts_with(&lower))
                .map(|name| name.to_string())
                .collect()
        } else {
            suggest::complete(prefix)
                .into_iter()
                .map(str::to_string)
                .collect()
        }
    }

    impl Completer for PhraseHelper {
        type Candidate = String;

        fn complete(
            &self,
            line: &str,
            pos: usize,
            _ctx: &Context<'_>,
        ) -> rustyline::Result<(usize, Vec<String>)> {
            Ok((0, candidates(&line[..pos])))
        }
    }

    impl Hinter for PhraseHelper {
        type Hint = String;

        fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
            if pos < line.len() || line.starts_with('/') {
                return None;
            }
            suggest::complete(line)
                .first()
                .map(|phrase| phrase[line.len()..].to_string())
        }
    }

    impl Highlighter for PhraseHelper {
        fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
            Cow::Owned(hint.dimmed().to_string())
        }
    }

    impl Validator for PhraseHelper {}

    impl Helper for PhraseHelper {}

    /// Start interactive chat mode
    ///
    /// # Arguments
    ///
    /// * `app` - Client state, with settings and key already loaded
    /// * `chat_config` - Banner and suggestion options
    /// * `resume` - Optional id (or id prefix) of a saved chat to continue
    pub async fn run_chat<T: Transport>(
        app: &mut ChatApp<T>,
        chat_config: &ChatConfig,
        resume: Option<String>,
    ) -> Result<()> {
        if let Some(id) = resume {
            app.load_chat(&id)?;
            display::print_transcript(app.session(), app.settings());
        }

        let mut rl: Editor<PhraseHelper, DefaultHistory> = Editor::new()?;
        rl.set_helper(Some(PhraseHelper));

        print_welcome_banner(app, chat_config);

        loop {
            let prompt = app.settings().theme.accent("quill> ").to_string();
            match rl.readline(&prompt) {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    rl.add_history_entry(trimmed)?;

                    let command = match parse_special_command(trimmed) {
                        Ok(command) => command,
                        Err(e) => {
                            eprintln!("{}", e.to_string().red());
                            continue;
                        }
                    };
                    if command == SpecialCommand::Exit {
                        break;
                    }

                    let result = handle_command(app, chat_config, command, trimmed).await;
                    let notices = app.drain_notices();
                    display::print_notices(&notices);
                    if let Err(e) = result {
                        tracing::debug!("Command failed: {:#}", e);
                        if notices.is_empty() {
                            eprintln!("{}", format!("Error: {}", e).red());
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("CTRL-C");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    println!("CTRL-D");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {:?}", err);
                    break;
                }
            }
        }

        println!("Goodbye!");
        Ok(())
    }

    async fn handle_command<T: Transport>(
        app: &mut ChatApp<T>,
        chat_config: &ChatConfig,
        command: SpecialCommand,
        line: &str,
    ) -> Result<()> {
        match command {
            SpecialCommand::NewChat => {
                app.new_chat();
                println!("{}", "Started a new chat".green());
                if chat_config.show_suggestions {
                    display::print_suggestions(&suggest::random_suggestions(
                        chat_config.suggestion_count,
                    ));
                }
            }
            SpecialCommand::ClearChat => app.clear_chat(),
            SpecialCommand::Export(format) => {
                let file = app.export(format)?;
                let path = file.write_to(Path::new("."))?;
                println!("Saved {}", path.display().to_string().cyan());
            }
            SpecialCommand::ListHistory => {
                display::print_chat_table(&app.chats()?);
                println!("Use {} to open one.", "/load <ID>".cyan());
            }
            SpecialCommand::LoadChat(id) => {
                app.load_chat(&id)?;
                display::print_transcript(app.session(), app.settings());
            }
            SpecialCommand::ShowSettings => display::print_settings(app.settings()),
            SpecialCommand::SetSetting { name, value } => app.update_setting(&name, &value)?,
            SpecialCommand::SetKey(key) => app.set_api_key(&key)?,
            SpecialCommand::TestKey => {
                app.verify_api_key(None).await?;
            }
            SpecialCommand::Attach(path) => {
                app.attach_file(&path).await?;
                println!(
                    "{} ({} attached)",
                    format!("Attached {}", path.display()).green(),
                    app.attachments().len()
                );
            }
            SpecialCommand::Detach(index) => {
                let removed = app.remove_attachment(index)?;
                println!("Removed {}", removed.name.cyan());
            }
            SpecialCommand::ListAttachments => display::print_attachments(app.attachments()),
            SpecialCommand::CodePrompt { language, path } => {
                let code = tokio::fs::read_to_string(&path).await?;
                send_and_render(app, &code_prompt(&language, &code)).await?;
            }
            SpecialCommand::Search(query) => {
                let hits = app.search(&query);
                display::print_search_hits(&query, &hits);
            }
            SpecialCommand::Stats => println!("{}", app.stats().summary()),
            SpecialCommand::Suggest => display::print_suggestions(
                &suggest::random_suggestions(chat_config.suggestion_count),
            ),
            SpecialCommand::ShowStatus => print_status(app),
            SpecialCommand::Help => print_help(),
            SpecialCommand::Exit => {}
            SpecialCommand::None => send_and_render(app, line).await?,
        }
        Ok(())
    }

    async fn send_and_render<T: Transport>(app: &mut ChatApp<T>, text: &str) -> Result<()> {
        println!("{}", "Thinking...".dimmed());
        match app.send_message(text).await? {
            SendOutcome::Ignored => {}
            SendOutcome::Replied | SendOutcome::Failed => {
                if let Some(reply) = app.session().messages.last() {
                    println!(
                        "\n{}",
                        display::render_message(
                            reply,
                            app.settings().theme,
                            app.settings().syntax_highlight
                        )
                    );
                }
            }
        }
        Ok(())
    }

    fn print_welcome_banner<T: Transport>(app: &ChatApp<T>, chat_config: &ChatConfig) {
        let theme = app.settings().theme;
        println!();
        println!("{}", theme.accent("QuillChat").bold());
        println!("Type a message, {} for commands, or exit.", "/help".cyan());
        if !app.has_api_key() {
            println!(
                "{}",
                "No API key saved. Set one with /key <KEY> before sending.".yellow()
            );
        }
        if chat_config.show_suggestions && app.session().is_empty() {
            display::print_suggestions(&suggest::random_suggestions(
                chat_config.suggestion_count,
            ));
        }
        println!();
    }

    fn print_status<T: Transport>(app: &ChatApp<T>) {
        let session = app.session();
        println!("Chat:        {} ({})", session.title.bold(), session.id);
        println!("Messages:    {}", session.len());
        println!("Attachments: {}", app.attachments().len());
        println!(
            "API key:     {}",
            if app.has_api_key() {
                "saved".green()
            } else {
                "missing".red()
            }
        );
        println!("Theme:       {}", app.settings().theme);
    }

}
