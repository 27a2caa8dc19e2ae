//! Compiled, platform-independent shape of Discord slash commands.

use serde::Serialize;

use crate::error::CompileError;
use crate::options::DiscordOptionType;

const MAX_NAME_LEN: usize = 32;
const MAX_DESCRIPTION_LEN: usize = 100;
const MAX_OPTIONS: usize = 25;
pub const MAX_CHOICES: usize = 25;

/// Backing value of a static choice.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ChoiceValue {
    String(String),
    Integer(i64),
    Number(f64),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionChoice {
    pub name: String,
    pub value: ChoiceValue,
}

impl OptionChoice {
    pub fn new(name: impl Into<String>, value: ChoiceValue) -> Self {
        OptionChoice {
            name: name.into(),
            value,
        }
    }

    pub fn string(value: impl Into<String>) -> Self {
        let value = value.into();
        Self::new(value.clone(), ChoiceValue::String(value))
    }

    pub fn integer(value: i64) -> Self {
        Self::new(value.to_string(), ChoiceValue::Integer(value))
    }

    pub fn number(value: f64) -> Self {
        Self::new(value.to_string(), ChoiceValue::Number(value))
    }

    pub fn strings<I, S>(values: I) -> Vec<OptionChoice>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        values.into_iter().map(Self::string).collect()
    }
}

/// Min/max bounds whose variant always matches the option's type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Range {
    Integer { min: i64, max: i64 },
    Number { min: f64, max: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubCommand {
    pub name: String,
    pub description: String,
    pub options: Vec<DiscordOption>,
}

impl SubCommand {
    /// A group holds subcommands; a leaf subcommand holds variables (or nothing).
    pub fn is_group(&self) -> bool {
        matches!(self.options.first(), Some(DiscordOption::SubCommand(_)))
    }

    pub fn option_type(&self) -> DiscordOptionType {
        if self.is_group() {
            DiscordOptionType::SUB_COMMAND_GROUP
        } else {
            DiscordOptionType::SUB_COMMAND
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Variable {
    pub name: String,
    pub description: String,
    pub option_type: DiscordOptionType,
    pub required: bool,
    pub autocomplete: bool,
    pub range: Option<Range>,
    pub choices: Vec<OptionChoice>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiscordOption {
    SubCommand(SubCommand),
    Variable(Variable),
}

impl DiscordOption {
    pub fn name(&self) -> &str {
        match self {
            DiscordOption::SubCommand(sub) => &sub.name,
            DiscordOption::Variable(variable) => &variable.name,
        }
    }

    pub fn description(&self) -> &str {
        match self {
            DiscordOption::SubCommand(sub) => &sub.description,
            DiscordOption::Variable(variable) => &variable.description,
        }
    }

    pub fn option_type(&self) -> DiscordOptionType {
        match self {
            DiscordOption::SubCommand(sub) => sub.option_type(),
            DiscordOption::Variable(variable) => variable.option_type,
        }
    }
}

/// A compiled root command.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiscordCommand {
    pub name: String,
    pub description: String,
    pub options: Vec<DiscordOption>,
    pub default_member_permissions: Option<u64>,
}

impl DiscordCommand {
    /// Checks the naming and size limits Discord enforces on registration.
    pub fn validate(&self) -> Result<(), CompileError> {
        validate_named(&self.name, &self.name, &self.description)?;
        validate_options(&self.name, &self.options)
    }
}

fn validate_options(path: &str, options: &[DiscordOption]) -> Result<(), CompileError> {
    if options.len() > MAX_OPTIONS {
        return Err(limit(path, format!("{} options (max {})", options.len(), MAX_OPTIONS)));
    }
    for option in options {
        let child_path = format!("{} {}", path, option.name());
        validate_named(&child_path, option.name(), option.description())?;
        match option {
            DiscordOption::SubCommand(sub) => validate_options(&child_path, &sub.options)?,
            DiscordOption::Variable(variable) => {
                if variable.choices.len() > MAX_CHOICES {
                    return Err(limit(
                        &child_path,
                        format!("{} choices (max {})", variable.choices.len(), MAX_CHOICES),
                    ));
                }
            }
        }
    }
    Ok(())
}

fn validate_named(path: &str, name: &str, description: &str) -> Result<(), CompileError> {
    let name_len = name.chars().count();
    if name_len == 0 || name_len > MAX_NAME_LEN {
        return Err(limit(path, format!("name must be 1-{} characters", MAX_NAME_LEN)));
    }
    if name.chars().any(|c| c.is_whitespace() || c.is_uppercase()) {
        return Err(limit(path, "name must be lowercase without whitespace".to_string()));
    }
    let description_len = description.chars().count();
    if description_len == 0 || description_len > MAX_DESCRIPTION_LEN {
        return Err(limit(
            path,
            format!("description must be 1-{} characters", MAX_DESCRIPTION_LEN),
        ));
    }
    Ok(())
}

fn limit(path: &str, reason: String) -> CompileError {
    CompileError::PlatformLimit {
        path: path.to_string(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variable(name: &str) -> DiscordOption {
        DiscordOption::Variable(Variable {
            name: name.to_string(),
            description: name.to_string(),
            option_type: DiscordOptionType::STRING,
            required: true,
            autocomplete: false,
            range: None,
            choices: Vec::new(),
        })
    }

    fn command(name: &str, options: Vec<DiscordOption>) -> DiscordCommand {
        DiscordCommand {
            name: name.to_string(),
            description: "A command".to_string(),
            options,
            default_member_permissions: None,
        }
    }

    #[test]
    fn test_subcommand_group_detection() {
        let leaf = SubCommand {
            name: "add".to_string(),
            description: "add".to_string(),
            options: vec![variable("name")],
        };
        assert!(!leaf.is_group());
        assert_eq!(leaf.option_type(), DiscordOptionType::SUB_COMMAND);

        let group = SubCommand {
            name: "group".to_string(),
            description: "group".to_string(),
            options: vec![DiscordOption::SubCommand(leaf)],
        };
        assert!(group.is_group());
        assert_eq!(group.option_type(), DiscordOptionType::SUB_COMMAND_GROUP);
    }

    #[test]
    fn test_validate_accepts_well_formed_command() {
        assert!(command("cat", vec![variable("name")]).validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_names() {
        assert!(command("Cat", vec![]).validate().is_err());
        assert!(command("cat food", vec![]).validate().is_err());
        assert!(command(&"c".repeat(33), vec![]).validate().is_err());
        assert!(command("cat", vec![variable("Name")]).validate().is_err());
    }

    #[test]
    fn test_validate_rejects_too_many_options() {
        let options = (0..26).map(|i| variable(&format!("opt{}", i))).collect();
        let err = command("cat", options).validate().unwrap_err();
        assert!(matches!(err, CompileError::PlatformLimit { .. }));
    }

    #[test]
    fn test_integer_choice_labels() {
        let choice = OptionChoice::integer(3);
        assert_eq!(choice.name, "3");
        assert_eq!(choice.value, ChoiceValue::Integer(3));
    }
}
