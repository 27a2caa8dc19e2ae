//! # Option Type Registry
//!
//! Maps generic parser identities onto Discord option types. Discriminators
//! are the values Discord assigns; nothing here invents new ones.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.0.0: Standard mappings plus platform registration hook

use log::debug;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

use crate::error::{CompileError, RegistryError};
use crate::tree::ParserId;

/// Kind of value an option type produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ValueKind {
    Options,
    String,
    Integer,
    Boolean,
    Number,
    User,
    Channel,
    Role,
    Mentionable,
    Attachment,
}

/// A Discord application command option type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DiscordOptionType {
    pub name: &'static str,
    pub value: u8,
    pub kind: ValueKind,
}

impl DiscordOptionType {
    pub const SUB_COMMAND: DiscordOptionType = Self::of("SUB_COMMAND", 1, ValueKind::Options);
    pub const SUB_COMMAND_GROUP: DiscordOptionType =
        Self::of("SUB_COMMAND_GROUP", 2, ValueKind::Options);
    pub const STRING: DiscordOptionType = Self::of("STRING", 3, ValueKind::String);
    pub const INTEGER: DiscordOptionType = Self::of("INTEGER", 4, ValueKind::Integer);
    pub const BOOLEAN: DiscordOptionType = Self::of("BOOLEAN", 5, ValueKind::Boolean);
    pub const USER: DiscordOptionType = Self::of("USER", 6, ValueKind::User);
    pub const CHANNEL: DiscordOptionType = Self::of("CHANNEL", 7, ValueKind::Channel);
    pub const ROLE: DiscordOptionType = Self::of("ROLE", 8, ValueKind::Role);
    pub const MENTIONABLE: DiscordOptionType = Self::of("MENTIONABLE", 9, ValueKind::Mentionable);
    pub const NUMBER: DiscordOptionType = Self::of("NUMBER", 10, ValueKind::Number);
    pub const ATTACHMENT: DiscordOptionType = Self::of("ATTACHMENT", 11, ValueKind::Attachment);

    /// Option types Discord will send autocomplete requests for.
    pub const AUTOCOMPLETE: [DiscordOptionType; 3] = [Self::STRING, Self::INTEGER, Self::NUMBER];

    pub const fn of(name: &'static str, value: u8, kind: ValueKind) -> Self {
        DiscordOptionType { name, value, kind }
    }

    pub fn supports_autocomplete(&self) -> bool {
        Self::AUTOCOMPLETE.contains(self)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self.kind, ValueKind::Integer | ValueKind::Number)
    }
}

impl fmt::Display for DiscordOptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.value)
    }
}

/// Parser identities understood out of the box.
pub mod parsers {
    use crate::tree::ParserId;

    pub const STRING: ParserId = ParserId::from_static("string");
    pub const INTEGER: ParserId = ParserId::from_static("integer");
    pub const BOOLEAN: ParserId = ParserId::from_static("boolean");
    pub const NUMBER: ParserId = ParserId::from_static("number");
    pub const USER: ParserId = ParserId::from_static("user");
    pub const CHANNEL: ParserId = ParserId::from_static("channel");
    pub const ROLE: ParserId = ParserId::from_static("role");
    pub const MENTIONABLE: ParserId = ParserId::from_static("mentionable");
    pub const ATTACHMENT: ParserId = ParserId::from_static("attachment");
}

#[derive(Debug, Clone, Default)]
pub struct OptionRegistry {
    by_parser: HashMap<ParserId, DiscordOptionType>,
    types: Vec<DiscordOptionType>,
}

impl OptionRegistry {
    /// An empty registry with no mappings at all.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registry with the platform-independent mappings (string, integer, boolean, number).
    pub fn standard() -> Self {
        let mut registry = Self::empty();
        for (option_type, parser) in [
            (DiscordOptionType::STRING, parsers::STRING),
            (DiscordOptionType::INTEGER, parsers::INTEGER),
            (DiscordOptionType::BOOLEAN, parsers::BOOLEAN),
            (DiscordOptionType::NUMBER, parsers::NUMBER),
        ] {
            registry.insert(option_type, parser);
        }
        registry
    }

    /// Associates `parser` with `option_type`.
    ///
    /// Registering the same pair twice is harmless; remapping a parser to a
    /// different type is a configuration error.
    pub fn register_mapping(
        &mut self,
        option_type: DiscordOptionType,
        parser: impl Into<ParserId>,
    ) -> Result<&mut Self, RegistryError> {
        let parser = parser.into();
        if let Some(existing) = self.by_parser.get(&parser) {
            if *existing == option_type {
                return Ok(self);
            }
            return Err(RegistryError::DuplicateMapping {
                parser: parser.to_string(),
                existing: existing.to_string(),
                requested: option_type.to_string(),
            });
        }

        self.insert(option_type, parser);
        Ok(self)
    }

    fn insert(&mut self, option_type: DiscordOptionType, parser: ParserId) {
        debug!("Mapping parser `{}` to option type {}", parser, option_type);
        self.by_parser.insert(parser, option_type);
        if !self.types.contains(&option_type) {
            self.types.push(option_type);
        }
    }

    /// Resolves the option type for `parser`. `path` names the argument for errors.
    pub fn resolve(&self, parser: &ParserId, path: &str) -> Result<DiscordOptionType, CompileError> {
        self.by_parser
            .get(parser)
            .copied()
            .ok_or_else(|| CompileError::UnmappedType {
                path: path.to_string(),
                parser: parser.to_string(),
            })
    }

    pub fn option_types(&self) -> &[DiscordOptionType] {
        &self.types
    }

    pub fn by_value(&self, value: u8) -> Option<DiscordOptionType> {
        self.types.iter().copied().find(|option| option.value == value)
    }

    pub fn by_name(&self, name: &str) -> Option<DiscordOptionType> {
        self.types
            .iter()
            .copied()
            .find(|option| option.name.eq_ignore_ascii_case(name))
    }
}
