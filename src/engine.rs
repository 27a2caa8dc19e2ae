//! Contract consumed from the generic command engine.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use crate::error::CommandError;
use crate::interaction::SlashInteraction;
use crate::tree::CommandTree;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub value: String,
    /// Label shown instead of `value` when set.
    pub display: Option<String>,
}

impl Suggestion {
    pub fn new(value: impl Into<String>) -> Self {
        Suggestion {
            value: value.into(),
            display: None,
        }
    }

    pub fn with_display(mut self, display: impl Into<String>) -> Self {
        self.display = Some(display.into());
        self
    }
}

/// Ordered suggestions plus the input text they were computed against.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Suggestions {
    /// The part of the input the engine is completing, usually the words it
    /// could not consume yet. Multi-word suggestions are trimmed against it.
    pub input: String,
    pub list: Vec<Suggestion>,
}

impl Suggestions {
    pub fn new(input: impl Into<String>, list: Vec<Suggestion>) -> Self {
        Suggestions {
            input: input.into(),
            list,
        }
    }
}

/// The generic engine: owns the tree, parses text, executes and suggests.
#[async_trait]
pub trait CommandEngine: Send + Sync + 'static {
    type Sender: Send + Sync + 'static;

    /// Current tree snapshot. Read once per compile pass.
    fn command_tree(&self) -> Arc<CommandTree>;

    async fn execute(
        &self,
        sender: Self::Sender,
        input: &str,
        interaction: Arc<SlashInteraction>,
    ) -> Result<(), CommandError>;

    async fn suggest(
        &self,
        sender: Self::Sender,
        input: &str,
        interaction: Arc<SlashInteraction>,
    ) -> Result<Suggestions>;
}
