use eyre::{Result, eyre};
use serde_json::{Map, Value};
use serenity::model::application::interaction::application_command::CommandDataOption;

use repere_core::models::{ChannelId, RoleId};

/// Option values of one (sub)command, keyed by option name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandOptions {
    values: Map<String, Value>,
}

impl From<Map<String, Value>> for CommandOptions {
    fn from(values: Map<String, Value>) -> Self {
        Self { values }
    }
}

impl CommandOptions {
    pub fn from_data(options: &[CommandDataOption]) -> Self {
        let values = options
            .iter()
            .filter_map(|option| Some((option.name.clone(), option.value.clone()?)))
            .collect();
        Self { values }
    }

    pub fn string(&self, name: &str) -> Option<String> {
        self.values.get(name)?.as_str().map(str::to_string)
    }

    pub fn required_string(&self, name: &str) -> Result<String> {
        self.string(name).ok_or_else(|| eyre!("Missing {} parameter", name))
    }

    pub fn integer(&self, name: &str) -> Option<i64> {
        self.values.get(name)?.as_i64()
    }

    pub fn boolean(&self, name: &str) -> Option<bool> {
        self.values.get(name)?.as_bool()
    }

    /// Role, channel and user options carry their id as a string.
    pub fn snowflake(&self, name: &str) -> Option<u64> {
        match self.values.get(name)? {
            Value::String(raw) => raw.parse().ok(),
            Value::Number(number) => number.as_u64(),
            _ => None,
        }
    }

    pub fn role(&self, name: &str) -> Option<RoleId> {
        self.snowflake(name).map(RoleId)
    }

    pub fn required_role(&self, name: &str) -> Result<RoleId> {
        self.role(name).ok_or_else(|| eyre!("Missing {} parameter", name))
    }

    pub fn channel(&self, name: &str) -> Option<ChannelId> {
        self.snowflake(name).map(ChannelId)
    }

    pub fn required_channel(&self, name: &str) -> Result<ChannelId> {
        self.channel(name).ok_or_else(|| eyre!("Missing {} parameter", name))
    }
}

/// Name and options of the subcommand the user picked.
pub fn subcommand(options: &[CommandDataOption]) -> Result<(&str, CommandOptions)> {
    let subcommand = options.first().ok_or_else(|| eyre!("Missing subcommand"))?;
    Ok((subcommand.name.as_str(), CommandOptions::from_data(&subcommand.options)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn options(value: Value) -> CommandOptions {
        match value {
            Value::Object(values) => CommandOptions::from(values),
            _ => CommandOptions::default(),
        }
    }

    #[test]
    fn reads_typed_values() {
        let options = options(json!({
            "role": "123456789012345678",
            "expiry_minutes": 30,
            "check_rejoin": true,
            "trigger": "on_quiz_access",
        }));

        assert_eq!(options.role("role"), Some(RoleId(123456789012345678)));
        assert_eq!(options.integer("expiry_minutes"), Some(30));
        assert_eq!(options.boolean("check_rejoin"), Some(true));
        assert_eq!(options.string("trigger").as_deref(), Some("on_quiz_access"));
    }

    #[test]
    fn missing_values_are_reported() {
        let options = options(json!({ "channel": "not-a-number" }));
        assert_eq!(options.channel("channel"), None);
        assert!(options.required_role("role").unwrap_err().to_string().contains("role"));
        assert_eq!(options.boolean("everyone"), None);
    }
}
