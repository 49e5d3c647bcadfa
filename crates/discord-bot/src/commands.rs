use serenity::builder::CreateApplicationCommands;

pub mod admin;
pub mod quiz;
pub mod voice;

/// Names of every registered slash command.
pub const COMMAND_NAMES: [&str; 8] = [
    "config",
    "autorole",
    "setupvoice",
    "removevoice",
    "listvoice",
    "quiz",
    "massgive",
    "help",
];

/// Register all commands for the bot.
///
/// Every command is restricted to administrators and unavailable in DMs.
pub fn register_commands(commands: &mut CreateApplicationCommands) -> &mut CreateApplicationCommands {
    for command in [
        admin::config_command(),
        admin::autorole_command(),
        voice::setupvoice_command(),
        voice::removevoice_command(),
        voice::listvoice_command(),
        quiz::quiz_command(),
        quiz::massgive_command(),
        admin::help_command(),
    ] {
        commands.add_application_command(command);
    }
    commands
}
