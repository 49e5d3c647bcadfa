use serenity::{
    builder::CreateApplicationCommand,
    model::{application::command::CommandOptionType, channel::ChannelType, permissions::Permissions},
};

pub(crate) fn admin_command(name: &str, description: &str) -> CreateApplicationCommand {
    let mut command = CreateApplicationCommand::default();
    command
        .name(name)
        .description(description)
        .dm_permission(false)
        .default_member_permissions(Permissions::ADMINISTRATOR);
    command
}

/// Create the /config command group
pub fn config_command() -> CreateApplicationCommand {
    let mut command = admin_command("config", "Server configuration");
    command
        .create_option(|option| {
            option
                .name("language")
                .description("Set the bot language for this server")
                .kind(CommandOptionType::SubCommand)
                .create_sub_option(|sub_option| {
                    sub_option
                        .name("language")
                        .description("Language code")
                        .kind(CommandOptionType::String)
                        .add_string_choice("English", "en")
                        .add_string_choice("Français", "fr")
                        .required(true)
                })
        })
        .create_option(|option| {
            option
                .name("autorole")
                .description("Add or update an auto-role")
                .kind(CommandOptionType::SubCommand)
                .create_sub_option(|sub_option| {
                    sub_option
                        .name("role")
                        .description("Role to give automatically")
                        .kind(CommandOptionType::Role)
                        .required(true)
                })
                .create_sub_option(|sub_option| {
                    sub_option
                        .name("expiry_minutes")
                        .description("Minutes before the role is removed again")
                        .kind(CommandOptionType::Integer)
                        .required(false)
                })
                .create_sub_option(|sub_option| {
                    sub_option
                        .name("check_rejoin")
                        .description("Skip members who joined before")
                        .kind(CommandOptionType::Boolean)
                        .required(false)
                })
                .create_sub_option(|sub_option| {
                    sub_option
                        .name("trigger")
                        .description("When to give the role")
                        .kind(CommandOptionType::String)
                        .add_string_choice("on_join", "on_join")
                        .add_string_choice("on_quiz_access", "on_quiz_access")
                        .required(false)
                })
        })
        .create_option(|option| {
            option
                .name("remove_autorole")
                .description("Remove one auto-role, or all of them")
                .kind(CommandOptionType::SubCommand)
                .create_sub_option(|sub_option| {
                    sub_option
                        .name("role")
                        .description("Auto-role to remove (all when omitted)")
                        .kind(CommandOptionType::Role)
                        .required(false)
                })
        })
        .create_option(|option| {
            option
                .name("autorole_logs")
                .description("Set the channel receiving auto-role logs")
                .kind(CommandOptionType::SubCommand)
                .create_sub_option(|sub_option| {
                    sub_option
                        .name("channel")
                        .description("Log channel")
                        .kind(CommandOptionType::Channel)
                        .channel_types(&[ChannelType::Text])
                        .required(true)
                })
        })
        .create_option(|option| {
            option
                .name("sticky")
                .description("Keep a message at the bottom of a channel")
                .kind(CommandOptionType::SubCommand)
                .create_sub_option(|sub_option| {
                    sub_option
                        .name("channel")
                        .description("Channel holding the sticky message")
                        .kind(CommandOptionType::Channel)
                        .channel_types(&[ChannelType::Text])
                        .required(true)
                })
                .create_sub_option(|sub_option| {
                    sub_option
                        .name("content")
                        .description("Message content")
                        .kind(CommandOptionType::String)
                        .required(true)
                })
        })
        .create_option(|option| {
            option
                .name("remove_sticky")
                .description("Remove the sticky message of a channel")
                .kind(CommandOptionType::SubCommand)
                .create_sub_option(|sub_option| {
                    sub_option
                        .name("channel")
                        .description("Channel holding the sticky message")
                        .kind(CommandOptionType::Channel)
                        .channel_types(&[ChannelType::Text])
                        .required(true)
                })
        });

    command
}

/// Create the /autorole command group
pub fn autorole_command() -> CreateApplicationCommand {
    let mut command = admin_command("autorole", "Auto-role tools");
    command
        .create_option(|option| {
            option
                .name("list_configs")
                .description("Show the active auto-role configuration")
                .kind(CommandOptionType::SubCommand)
        })
        .create_option(|option| {
            option
                .name("list_expiry")
                .description("List members and the time left before their auto-role expires")
                .kind(CommandOptionType::SubCommand)
        })
        .create_option(|option| {
            option
                .name("list_no_expiry")
                .description("List members holding an auto-role without expiry")
                .kind(CommandOptionType::SubCommand)
        });

    command
}

/// Create the /help command
pub fn help_command() -> CreateApplicationCommand {
    admin_command("help", "Show the bot help")
}
