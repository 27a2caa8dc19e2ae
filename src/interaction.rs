//! Platform-independent view of an inbound slash command or autocomplete
//! interaction, plus the responder used to answer it.

use anyhow::Result;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

use crate::options::{DiscordOptionType, ValueKind};

/// Typed value Discord supplied for one option.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    String(String),
    Integer(i64),
    Number(f64),
    Boolean(bool),
    User(u64),
    Channel(u64),
    Role(u64),
    Mentionable(u64),
    Attachment(u64),
}

impl OptionValue {
    pub fn option_type(&self) -> DiscordOptionType {
        match self {
            OptionValue::String(_) => DiscordOptionType::STRING,
            OptionValue::Integer(_) => DiscordOptionType::INTEGER,
            OptionValue::Number(_) => DiscordOptionType::NUMBER,
            OptionValue::Boolean(_) => DiscordOptionType::BOOLEAN,
            OptionValue::User(_) => DiscordOptionType::USER,
            OptionValue::Channel(_) => DiscordOptionType::CHANNEL,
            OptionValue::Role(_) => DiscordOptionType::ROLE,
            OptionValue::Mentionable(_) => DiscordOptionType::MENTIONABLE,
            OptionValue::Attachment(_) => DiscordOptionType::ATTACHMENT,
        }
    }

    /// Snowflake id for reference values (users, roles, channels, ...).
    pub fn reference_id(&self) -> Option<u64> {
        match self {
            OptionValue::User(id)
            | OptionValue::Channel(id)
            | OptionValue::Role(id)
            | OptionValue::Mentionable(id)
            | OptionValue::Attachment(id) => Some(*id),
            _ => None,
        }
    }
}

/// Text form used when rebuilding the command input. References render as
/// their bare snowflake id so they never collide with free text.
impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::String(value) => f.write_str(value),
            OptionValue::Integer(value) => write!(f, "{}", value),
            OptionValue::Number(value) => write!(f, "{}", value),
            OptionValue::Boolean(value) => write!(f, "{}", value),
            other => match other.reference_id() {
                Some(id) => write!(f, "{}", id),
                None => Ok(()),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SuppliedOption {
    pub name: String,
    /// Declared type of the option. Differs from `value.option_type()` only
    /// for a partially typed autocomplete value, which arrives as raw text.
    pub option_type: DiscordOptionType,
    pub value: OptionValue,
    /// Set on the option the user is typing into during autocomplete.
    pub focused: bool,
}

impl SuppliedOption {
    pub fn new(name: impl Into<String>, value: OptionValue) -> Self {
        SuppliedOption {
            name: name.into(),
            option_type: value.option_type(),
            value,
            focused: false,
        }
    }

    pub fn focused(name: impl Into<String>, value: OptionValue) -> Self {
        SuppliedOption {
            focused: true,
            ..Self::new(name, value)
        }
    }

    /// Focused option of `option_type` whose text is still being typed.
    pub fn partial(name: impl Into<String>, option_type: DiscordOptionType, text: impl Into<String>) -> Self {
        SuppliedOption {
            option_type,
            ..Self::focused(name, OptionValue::String(text.into()))
        }
    }
}

/// The resolved command path and options of an interaction.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InteractionCommand {
    pub root: String,
    pub group: Option<String>,
    pub subcommand: Option<String>,
    /// In the order Discord supplied them.
    pub options: Vec<SuppliedOption>,
}

impl InteractionCommand {
    pub fn new(root: impl Into<String>) -> Self {
        InteractionCommand {
            root: root.into(),
            ..Default::default()
        }
    }

    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn subcommand(mut self, subcommand: impl Into<String>) -> Self {
        self.subcommand = Some(subcommand.into());
        self
    }

    pub fn option(mut self, option: SuppliedOption) -> Self {
        self.options.push(option);
        self
    }

    /// `root [group] [subcommand]`.
    pub fn path(&self) -> String {
        let mut path = self.root.clone();
        for segment in [&self.group, &self.subcommand].into_iter().flatten() {
            path.push(' ');
            path.push_str(segment);
        }
        path
    }

    /// Rebuilds the generic input string: the command path followed by every
    /// non-empty supplied value, single-space separated, without a trailing space.
    pub fn reconstruct_input(&self) -> String {
        Self::join(self.path(), &self.options)
    }

    /// Input handed to the engine for autocomplete: values up to and including
    /// the focused one. An empty focused value leaves a trailing space so the
    /// engine completes a fresh word in that slot.
    pub fn autocomplete_input(&self) -> String {
        let Some(index) = self.options.iter().position(|option| option.focused) else {
            return self.reconstruct_input();
        };
        let mut input = Self::join(self.path(), &self.options[..=index]);
        if self.options[index].value.to_string().is_empty() {
            input.push(' ');
        }
        input
    }

    fn join(mut input: String, options: &[SuppliedOption]) -> String {
        for option in options {
            let value = option.value.to_string();
            if value.is_empty() {
                continue;
            }
            input.push(' ');
            input.push_str(&value);
        }
        input
    }

    pub fn focused_option(&self) -> Option<&SuppliedOption> {
        self.options.iter().find(|option| option.focused)
    }

    pub fn get(&self, name: &str) -> Option<&OptionValue> {
        self.options
            .iter()
            .find(|option| option.name == name)
            .map(|option| &option.value)
    }
}

/// Choice list sent back for an autocomplete request.
#[derive(Debug, Clone, PartialEq)]
pub enum AutocompleteChoices {
    Integer(Vec<(String, i64)>),
    Number(Vec<(String, f64)>),
    String(Vec<(String, String)>),
}

impl AutocompleteChoices {
    pub fn len(&self) -> usize {
        match self {
            AutocompleteChoices::Integer(choices) => choices.len(),
            AutocompleteChoices::Number(choices) => choices.len(),
            AutocompleteChoices::String(choices) => choices.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// An empty list of the shape `option_type` expects.
    pub fn empty_for(option_type: &DiscordOptionType) -> Self {
        match option_type.kind {
            ValueKind::Integer => AutocompleteChoices::Integer(Vec::new()),
            ValueKind::Number => AutocompleteChoices::Number(Vec::new()),
            _ => AutocompleteChoices::String(Vec::new()),
        }
    }
}

/// Answers one interaction on the platform.
#[async_trait]
pub trait InteractionResponder: Send + Sync {
    async fn respond(&self, content: &str, ephemeral: bool) -> Result<()>;

    async fn suggest(&self, choices: AutocompleteChoices) -> Result<()>;

    /// Acknowledges the interaction ahead of the reply. Replies sent after a
    /// defer complete the deferred message and then follow up.
    async fn defer(&self, ephemeral: bool) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionKind {
    Command,
    Autocomplete,
}

/// Handle for one inbound interaction, created per event and dropped once the
/// response path is done.
#[derive(Clone)]
pub struct SlashInteraction {
    pub id: u64,
    pub kind: InteractionKind,
    pub guild_id: Option<u64>,
    pub channel_id: u64,
    pub user_id: u64,
    pub command: InteractionCommand,
    responder: Arc<dyn InteractionResponder>,
}

impl SlashInteraction {
    pub fn new(
        id: u64,
        kind: InteractionKind,
        command: InteractionCommand,
        responder: Arc<dyn InteractionResponder>,
    ) -> Self {
        SlashInteraction {
            id,
            kind,
            guild_id: None,
            channel_id: 0,
            user_id: 0,
            command,
            responder,
        }
    }

    pub fn in_guild(mut self, guild_id: Option<u64>) -> Self {
        self.guild_id = guild_id;
        self
    }

    pub fn from_channel(mut self, channel_id: u64, user_id: u64) -> Self {
        self.channel_id = channel_id;
        self.user_id = user_id;
        self
    }

    pub fn responder(&self) -> &Arc<dyn InteractionResponder> {
        &self.responder
    }

    pub async fn respond_ephemeral(&self, content: &str) -> Result<()> {
        self.responder.respond(content, true).await
    }

    pub async fn respond_public(&self, content: &str) -> Result<()> {
        self.responder.respond(content, false).await
    }

    /// Typed value of `name` as Discord sent it; a shortcut for parsers, the
    /// reconstructed input stays authoritative.
    pub fn typed_option(&self, name: &str) -> Option<&OptionValue> {
        self.command.get(name)
    }

    /// Finds the supplied reference option whose snowflake is `id`.
    pub fn resolve_reference(&self, id: u64) -> Option<&SuppliedOption> {
        self.command
            .options
            .iter()
            .find(|option| option.value.reference_id() == Some(id))
    }
}

impl fmt::Debug for SlashInteraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlashInteraction")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("guild_id", &self.guild_id)
            .field("command", &self.command)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reconstruct_subcommand_input() {
        let command = InteractionCommand::new("cat")
            .subcommand("add")
            .option(SuppliedOption::new("name", OptionValue::String("Benny".to_string())))
            .option(SuppliedOption::new("age", OptionValue::Integer(3)));

        assert_eq!(command.reconstruct_input(), "cat add Benny 3");
    }

    #[test]
    fn test_reconstruct_group_input() {
        let command = InteractionCommand::new("cat")
            .group("owner")
            .subcommand("set")
            .option(SuppliedOption::new("weight", OptionValue::Number(4.5)))
            .option(SuppliedOption::new("indoor", OptionValue::Boolean(true)));

        assert_eq!(command.path(), "cat owner set");
        assert_eq!(command.reconstruct_input(), "cat owner set 4.5 true");
    }

    #[test]
    fn test_references_render_as_ids() {
        let command = InteractionCommand::new("ban")
            .option(SuppliedOption::new("target", OptionValue::User(80351110224678912)))
            .option(SuppliedOption::new("reason", OptionValue::String("spam".to_string())));

        assert_eq!(command.reconstruct_input(), "ban 80351110224678912 spam");
    }

    #[test]
    fn test_trailing_space_is_stripped() {
        let command = InteractionCommand::new("cat")
            .subcommand("remove")
            .option(SuppliedOption::focused("name", OptionValue::String(String::new())));

        assert_eq!(command.reconstruct_input(), "cat remove");
        assert_eq!(command.focused_option().map(|o| o.name.as_str()), Some("name"));
    }

    #[test]
    fn test_empty_focused_value_between_options() {
        let command = InteractionCommand::new("cat")
            .subcommand("add")
            .option(SuppliedOption::partial("name", DiscordOptionType::STRING, ""))
            .option(SuppliedOption::new("age", OptionValue::Integer(3)));

        assert_eq!(command.reconstruct_input(), "cat add 3");
        assert_eq!(command.autocomplete_input(), "cat add ");
    }

    #[test]
    fn test_autocomplete_input_stops_at_focus() {
        let command = InteractionCommand::new("cat")
            .subcommand("add")
            .option(SuppliedOption::new("name", OptionValue::String("Benny".to_string())))
            .option(SuppliedOption::partial("age", DiscordOptionType::INTEGER, "1"));
        assert_eq!(command.autocomplete_input(), "cat add Benny 1");

        let command = InteractionCommand::new("cat")
            .subcommand("add")
            .option(SuppliedOption::partial("name", DiscordOptionType::STRING, "Be"))
            .option(SuppliedOption::new("age", OptionValue::Integer(3)));
        assert_eq!(command.autocomplete_input(), "cat add Be");

        let command = InteractionCommand::new("cat")
            .subcommand("remove")
            .option(SuppliedOption::partial("name", DiscordOptionType::STRING, ""));
        assert_eq!(command.autocomplete_input(), "cat remove ");
    }

    #[test]
    fn test_partial_option_keeps_declared_type() {
        let option = SuppliedOption::partial("age", DiscordOptionType::INTEGER, "1");
        assert!(option.focused);
        assert_eq!(option.option_type, DiscordOptionType::INTEGER);
        assert_eq!(option.value.to_string(), "1");
    }

    #[test]
    fn test_empty_choices_shape() {
        assert_eq!(
            AutocompleteChoices::empty_for(&DiscordOptionType::INTEGER),
            AutocompleteChoices::Integer(Vec::new())
        );
        assert_eq!(
            AutocompleteChoices::empty_for(&DiscordOptionType::USER),
            AutocompleteChoices::String(Vec::new())
        );
    }
}
