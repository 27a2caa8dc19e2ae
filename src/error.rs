//! Error taxonomy shared by the compiler, registry, scopes and router.

use thiserror::Error;

use crate::options::DiscordOptionType;

/// Structural errors raised while compiling one root command.
///
/// Any of these aborts compilation of the offending root only; the other
/// roots in the same pass are unaffected.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    #[error("command `{path}` nests deeper than Discord allows (max 2 levels below the root)")]
    DepthExceeded { path: String },

    #[error("`{path}` mixes subcommands and arguments; `{node}` does not match its siblings")]
    MixedChildren { path: String, node: String },

    #[error("argument `{path}` has no Discord option type mapped for parser `{parser}`")]
    UnmappedType { path: String, parser: String },

    #[error("argument `{path}` requests autocomplete but also declares static choices")]
    AutocompleteWithChoices { path: String },

    #[error("argument `{path}` declares a numeric range but its option type is {option_type}")]
    RangeOnNonNumeric { path: String, option_type: String },

    #[error("choice `{choice}` on `{path}` cannot be expressed as {option_type}")]
    ChoiceTypeMismatch {
        path: String,
        choice: String,
        option_type: String,
    },

    #[error("argument `{path}` is followed by the literal `{literal}`")]
    LiteralAfterArgument { path: String, literal: String },

    #[error("argument `{path}` branches into {count} children")]
    BranchingArgument { path: String, count: usize },

    #[error("`{path}` carries unreadable scope metadata: {reason}")]
    InvalidScope { path: String, reason: String },

    #[error("command `{path}` violates a platform limit: {reason}")]
    PlatformLimit { path: String, reason: String },
}

impl CompileError {
    pub(crate) fn range_on_non_numeric(path: &str, option_type: &DiscordOptionType) -> Self {
        CompileError::RangeOnNonNumeric {
            path: path.to_string(),
            option_type: option_type.name.to_string(),
        }
    }
}

/// Setup-time misconfiguration of the option type registry.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistryError {
    #[error("parser `{parser}` is already mapped to {existing}, refusing to remap it to {requested}")]
    DuplicateMapping {
        parser: String,
        existing: String,
        requested: String,
    },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScopeError {
    #[error("a guild scope must name at least one guild")]
    EmptyGuildSet,
}

/// Which family a [`CommandError`] belongs to. Exception handlers are keyed by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Execution,
    ArgumentParse,
    NoSuchCommand,
    NoPermission,
    InvalidSender,
    InvalidSyntax,
}

/// Errors surfaced by the engine while executing a command.
#[derive(Error, Debug, Clone)]
pub enum CommandError {
    #[error("command execution failed: {0}")]
    Execution(String),

    #[error("{0}")]
    ArgumentParse(String),

    #[error("unknown command: {input}")]
    NoSuchCommand { input: String },

    #[error("missing permission `{permission}`")]
    NoPermission { permission: String },

    #[error("this command can only be used by {expected}")]
    InvalidSender { expected: String },

    #[error("invalid syntax, expected /{correct_syntax}")]
    InvalidSyntax { correct_syntax: String },
}

impl CommandError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CommandError::Execution(_) => ErrorKind::Execution,
            CommandError::ArgumentParse(_) => ErrorKind::ArgumentParse,
            CommandError::NoSuchCommand { .. } => ErrorKind::NoSuchCommand,
            CommandError::NoPermission { .. } => ErrorKind::NoPermission,
            CommandError::InvalidSender { .. } => ErrorKind::InvalidSender,
            CommandError::InvalidSyntax { .. } => ErrorKind::InvalidSyntax,
        }
    }
}

impl From<anyhow::Error> for CommandError {
    fn from(err: anyhow::Error) -> Self {
        CommandError::Execution(err.to_string())
    }
}

/// Failures inside the router that indicate a bug rather than user error.
#[derive(Error, Debug)]
pub enum RouterError {
    #[error("suggestion `{suggestion}` is not a valid {option_type} value")]
    InvalidSuggestion {
        suggestion: String,
        option_type: &'static str,
    },

    #[error("autocomplete interaction for `{command}` has no focused option")]
    NoFocusedOption { command: String },

    #[error(transparent)]
    Platform(#[from] anyhow::Error),
}
