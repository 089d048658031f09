use crate::app::ChatApp;
use crate::cli::SettingsCommand;
use crate::display;
use crate::error::Result;
use crate::settings::Settings;
use crate::transport::Transport;

/// Handle settings commands
pub fn handle_settings<T: Transport>(
    app: &mut ChatApp<T>,
    command: SettingsCommand,
) -> Result<()> {
    let result = match command {
        SettingsCommand::Show => {
            display::print_settings(app.settings());
            Ok(())
        }
        SettingsCommand::Set { key, value } => app.update_setting(&key, &value),
        SettingsCommand::Reset => app.save_settings(Settings::default()),
    };
    super::finish(app, result)
}
