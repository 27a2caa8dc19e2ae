//! Inbound serenity payloads to [`InteractionCommand`]s.

use serde_json::Value;
use serenity::model::application::command::CommandOptionType;
use serenity::model::application::interaction::application_command::CommandDataOption;

use super::option_type_of;
use crate::interaction::{InteractionCommand, OptionValue, SuppliedOption};

/// Resolves group and subcommand from the nested options and flattens the
/// remaining values in the order Discord sent them.
pub fn to_interaction_command(name: &str, options: &[CommandDataOption]) -> InteractionCommand {
    let mut command = InteractionCommand::new(name);
    let mut values = options;

    if let Some(first) = values.first() {
        if first.kind == CommandOptionType::SubCommandGroup {
            command = command.group(&first.name);
            values = &first.options;
        }
    }
    if let Some(first) = values.first() {
        if first.kind == CommandOptionType::SubCommand {
            command = command.subcommand(&first.name);
            values = &first.options;
        }
    }

    for option in values {
        if let Some(supplied) = to_supplied_option(option) {
            command = command.option(supplied);
        }
    }
    command
}

fn to_supplied_option(option: &CommandDataOption) -> Option<SuppliedOption> {
    let option_type = option_type_of(option.kind)?;
    let raw = option.value.as_ref();

    // A partially typed value arrives as text whatever the option type.
    if option.focused {
        let text = match raw {
            Some(Value::String(text)) => text.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };
        return Some(SuppliedOption::partial(&option.name, option_type, text));
    }

    let raw = raw?;
    let value = match option.kind {
        CommandOptionType::String => OptionValue::String(raw.as_str()?.to_string()),
        CommandOptionType::Integer => OptionValue::Integer(raw.as_i64()?),
        CommandOptionType::Number => OptionValue::Number(raw.as_f64()?),
        CommandOptionType::Boolean => OptionValue::Boolean(raw.as_bool()?),
        CommandOptionType::User => OptionValue::User(snowflake(raw)?),
        CommandOptionType::Channel => OptionValue::Channel(snowflake(raw)?),
        CommandOptionType::Role => OptionValue::Role(snowflake(raw)?),
        CommandOptionType::Mentionable => OptionValue::Mentionable(snowflake(raw)?),
        CommandOptionType::Attachment => OptionValue::Attachment(snowflake(raw)?),
        _ => return None,
    };
    Some(SuppliedOption::new(&option.name, value))
}

/// Snowflakes are sent as strings.
fn snowflake(raw: &Value) -> Option<u64> {
    match raw {
        Value::String(id) => id.parse().ok(),
        other => other.as_u64(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::DiscordOptionType;
    use serde_json::json;

    fn option(value: Value) -> CommandDataOption {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_subcommand_values_flatten() {
        let add = option(json!({
            "name": "add",
            "type": 1,
            "options": [
                { "name": "name", "type": 3, "value": "Benny" },
                { "name": "age", "type": 4, "value": 3 }
            ]
        }));

        let command = to_interaction_command("cat", &[add]);
        assert_eq!(command.subcommand.as_deref(), Some("add"));
        assert_eq!(command.reconstruct_input(), "cat add Benny 3");
    }

    #[test]
    fn test_group_and_reference_values() {
        let group = option(json!({
            "name": "owner",
            "type": 2,
            "options": [{
                "name": "set",
                "type": 1,
                "options": [{ "name": "who", "type": 6, "value": "80351110224678912" }]
            }]
        }));

        let command = to_interaction_command("cat", &[group]);
        assert_eq!(command.path(), "cat owner set");
        assert_eq!(command.get("who"), Some(&OptionValue::User(80351110224678912)));
    }

    #[test]
    fn test_focused_integer_is_partial() {
        let age = option(json!({ "name": "age", "type": 4, "value": "1", "focused": true }));

        let command = to_interaction_command("cat", &[age]);
        let focused = command.focused_option().unwrap();
        assert_eq!(focused.option_type, DiscordOptionType::INTEGER);
        assert_eq!(focused.value, OptionValue::String("1".to_string()));
    }
}
