use serenity::{
    builder::CreateApplicationCommand,
    model::{application::command::CommandOptionType, channel::ChannelType},
};

use super::admin::admin_command;

pub const MIN_CHECK_INTERVAL_SECS: u64 = 10;
pub const MAX_CHECK_INTERVAL_SECS: u64 = 3600;

/// Create the /quiz command group
pub fn quiz_command() -> CreateApplicationCommand {
    let mut command = admin_command("quiz", "Quiz automation");
    command
        .create_option(|option| {
            option
                .name("setup")
                .description("Configure the quiz automation with Google Sheets")
                .kind(CommandOptionType::SubCommand)
                .create_sub_option(|sub_option| {
                    sub_option
                        .name("spreadsheet_id")
                        .description("Google Sheets spreadsheet id")
                        .kind(CommandOptionType::String)
                        .required(true)
                })
                .create_sub_option(|sub_option| {
                    sub_option
                        .name("waiting_role")
                        .description("Role members hold while waiting for their result")
                        .kind(CommandOptionType::Role)
                        .required(true)
                })
                .create_sub_option(|sub_option| {
                    sub_option
                        .name("access_role")
                        .description("Role given to members who pass")
                        .kind(CommandOptionType::Role)
                        .required(true)
                })
                .create_sub_option(|sub_option| {
                    sub_option
                        .name("min_score")
                        .description("Minimum score required (default 17)")
                        .kind(CommandOptionType::Integer)
                        .min_int_value(0)
                        .max_int_value(20)
                        .required(false)
                })
                .create_sub_option(|sub_option| {
                    sub_option
                        .name("check_interval")
                        .description("Seconds between two checks (default 60)")
                        .kind(CommandOptionType::Integer)
                        .min_int_value(10)
                        .max_int_value(3600)
                        .required(false)
                })
                .create_sub_option(|sub_option| {
                    sub_option
                        .name("log_channel")
                        .description("Channel receiving quiz logs")
                        .kind(CommandOptionType::Channel)
                        .channel_types(&[ChannelType::Text])
                        .required(false)
                })
        })
        .create_option(|option| {
            option
                .name("status")
                .description("Show the quiz automation status")
                .kind(CommandOptionType::SubCommand)
        })
        .create_option(|option| {
            option
                .name("test")
                .description("Test the connection to the spreadsheet")
                .kind(CommandOptionType::SubCommand)
        });

    command
}

/// Create the /massgive command
pub fn massgive_command() -> CreateApplicationCommand {
    let mut command = admin_command("massgive", "Give a role to many members at once");
    command
        .create_option(|option| {
            option
                .name("target_role")
                .description("Role to give")
                .kind(CommandOptionType::Role)
                .required(true)
        })
        .create_option(|option| {
            option
                .name("filter_role")
                .description("Only members holding this role")
                .kind(CommandOptionType::Role)
                .required(false)
        })
        .create_option(|option| {
            option
                .name("everyone")
                .description("Give the role to every member")
                .kind(CommandOptionType::Boolean)
                .required(false)
        });

    command
}
