//! # Serenity Binding
//!
//! Connects the router to a serenity gateway client: translates compiled
//! commands into application command builders, turns inbound interactions
//! into [`SlashInteraction`](crate::interaction::SlashInteraction)s and
//! answers them.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.0.0: Global and guild publishing, command and autocomplete routing

pub mod convert;
pub mod handler;
pub mod publisher;
pub mod responder;

pub use handler::RouterHandler;
pub use publisher::SerenityPublisher;

use serenity::model::application::command::CommandOptionType;

use crate::error::RegistryError;
use crate::options::{parsers, DiscordOptionType, OptionRegistry};

/// Adds the mappings for Discord's reference types (users, channels, roles,
/// mentionables, attachments) on top of the standard ones.
pub fn register_platform_mappings(registry: &mut OptionRegistry) -> Result<(), RegistryError> {
    registry
        .register_mapping(DiscordOptionType::USER, parsers::USER)?
        .register_mapping(DiscordOptionType::CHANNEL, parsers::CHANNEL)?
        .register_mapping(DiscordOptionType::ROLE, parsers::ROLE)?
        .register_mapping(DiscordOptionType::MENTIONABLE, parsers::MENTIONABLE)?
        .register_mapping(DiscordOptionType::ATTACHMENT, parsers::ATTACHMENT)?;
    Ok(())
}

/// Serenity's option kind for a registry type, keyed on the discriminator.
pub fn platform_kind(option_type: &DiscordOptionType) -> CommandOptionType {
    match option_type.value {
        1 => CommandOptionType::SubCommand,
        2 => CommandOptionType::SubCommandGroup,
        3 => CommandOptionType::String,
        4 => CommandOptionType::Integer,
        5 => CommandOptionType::Boolean,
        6 => CommandOptionType::User,
        7 => CommandOptionType::Channel,
        8 => CommandOptionType::Role,
        9 => CommandOptionType::Mentionable,
        10 => CommandOptionType::Number,
        11 => CommandOptionType::Attachment,
        _ => CommandOptionType::Unknown,
    }
}

/// Registry type for an inbound serenity option kind.
pub fn option_type_of(kind: CommandOptionType) -> Option<DiscordOptionType> {
    let option_type = match kind {
        CommandOptionType::SubCommand => DiscordOptionType::SUB_COMMAND,
        CommandOptionType::SubCommandGroup => DiscordOptionType::SUB_COMMAND_GROUP,
        CommandOptionType::String => DiscordOptionType::STRING,
        CommandOptionType::Integer => DiscordOptionType::INTEGER,
        CommandOptionType::Boolean => DiscordOptionType::BOOLEAN,
        CommandOptionType::User => DiscordOptionType::USER,
        CommandOptionType::Channel => DiscordOptionType::CHANNEL,
        CommandOptionType::Role => DiscordOptionType::ROLE,
        CommandOptionType::Mentionable => DiscordOptionType::MENTIONABLE,
        CommandOptionType::Number => DiscordOptionType::NUMBER,
        CommandOptionType::Attachment => DiscordOptionType::ATTACHMENT,
        _ => return None,
    };
    Some(option_type)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping_is_symmetric() {
        let registry = {
            let mut registry = OptionRegistry::standard();
            register_platform_mappings(&mut registry).unwrap();
            registry
        };
        for option_type in registry.option_types() {
            assert_eq!(option_type_of(platform_kind(option_type)), Some(*option_type));
        }
        assert_eq!(option_type_of(CommandOptionType::Unknown), None);
    }

    #[test]
    fn test_platform_mappings_are_idempotent() {
        let mut registry = OptionRegistry::standard();
        register_platform_mappings(&mut registry).unwrap();
        register_platform_mappings(&mut registry).unwrap();
        assert_eq!(registry.option_types().len(), 9);
    }
}
