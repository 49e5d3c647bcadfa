use serenity::{
    builder::CreateApplicationCommand,
    model::{application::command::CommandOptionType, channel::ChannelType},
};

use super::admin::admin_command;

pub const DEFAULT_TEMPLATE: &str = "Channel of {user}";
pub const DEFAULT_CREATOR_NAME: &str = "➕ Join to Create";

/// Create the /setupvoice command
pub fn setupvoice_command() -> CreateApplicationCommand {
    let mut command = admin_command("setupvoice", "Create a join-to-create voice channel");
    command
        .create_option(|option| {
            option
                .name("template_name")
                .description("Name of created channels, {user} is replaced by the member name")
                .kind(CommandOptionType::String)
                .required(false)
        })
        .create_option(|option| {
            option
                .name("position")
                .description("Where created channels go relative to the creator")
                .kind(CommandOptionType::String)
                .add_string_choice("before", "before")
                .add_string_choice("after", "after")
                .required(false)
        })
        .create_option(|option| {
            option
                .name("creator_name")
                .description("Name of the creator channel")
                .kind(CommandOptionType::String)
                .required(false)
        })
        .create_option(|option| {
            option
                .name("user_limit")
                .description("User limit of created channels (0 = unlimited)")
                .kind(CommandOptionType::Integer)
                .min_int_value(0)
                .max_int_value(99)
                .required(false)
        });

    command
}

/// Create the /removevoice command
pub fn removevoice_command() -> CreateApplicationCommand {
    let mut command = admin_command("removevoice", "Remove a voice channel creator");
    command.create_option(|option| {
        option
            .name("channel")
            .description("The creator channel to remove")
            .kind(CommandOptionType::Channel)
            .channel_types(&[ChannelType::Voice])
            .required(true)
    });

    command
}

/// Create the /listvoice command
pub fn listvoice_command() -> CreateApplicationCommand {
    admin_command("listvoice", "List the voice channel creators of this server")
}
