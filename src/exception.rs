//! Turns execution errors into the single reply a user sees.

use anyhow::Result;
use log::warn;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{CommandError, ErrorKind};
use crate::interaction::SlashInteraction;

pub type ExceptionHandler = Arc<dyn Fn(&CommandError, &SlashInteraction) -> String + Send + Sync>;

/// Message builders keyed by [`ErrorKind`].
#[derive(Clone)]
pub struct ExceptionController {
    handlers: HashMap<ErrorKind, ExceptionHandler>,
}

impl ExceptionController {
    pub fn new() -> Self {
        let mut controller = ExceptionController {
            handlers: HashMap::new(),
        };
        controller.register(ErrorKind::Execution, |err, _| match err {
            CommandError::Execution(cause) => format!("Command failed: {}", cause),
            other => other.to_string(),
        });
        controller.register(ErrorKind::ArgumentParse, |err, _| match err {
            CommandError::ArgumentParse(message) => format!("Invalid Command Argument: {}", message),
            other => other.to_string(),
        });
        controller.register(ErrorKind::NoSuchCommand, |_, _| "Unknown command".to_string());
        controller.register(ErrorKind::NoPermission, |_, _| "Insufficient permissions".to_string());
        controller.register(ErrorKind::InvalidSender, |err, _| err.to_string());
        controller.register(ErrorKind::InvalidSyntax, |err, _| match err {
            CommandError::InvalidSyntax { correct_syntax } => format!(
                "Invalid Command Syntax. Correct command syntax is: /{}",
                correct_syntax
            ),
            other => other.to_string(),
        });
        controller
    }

    /// Replaces the handler for `kind`.
    pub fn register<F>(&mut self, kind: ErrorKind, handler: F) -> &mut Self
    where
        F: Fn(&CommandError, &SlashInteraction) -> String + Send + Sync + 'static,
    {
        self.handlers.insert(kind, Arc::new(handler));
        self
    }

    pub fn message(&self, err: &CommandError, interaction: &SlashInteraction) -> String {
        match self.handlers.get(&err.kind()) {
            Some(handler) => handler(err, interaction),
            None => err.to_string(),
        }
    }

    /// Sends exactly one reply describing `err`, visible only to the invoking
    /// user when `ephemeral` is set.
    pub async fn handle(&self, err: &CommandError, interaction: &SlashInteraction, ephemeral: bool) -> Result<()> {
        let message = self.message(err, interaction);
        warn!(
            "Command `{}` failed ({:?}): {}",
            interaction.command.path(),
            err.kind(),
            err
        );
        interaction.responder().respond(&message, ephemeral).await
    }
}

impl Default for ExceptionController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interaction::{AutocompleteChoices, InteractionCommand, InteractionKind, InteractionResponder};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct Silent;

    #[async_trait]
    impl InteractionResponder for Silent {
        async fn respond(&self, _content: &str, _ephemeral: bool) -> Result<()> {
            Ok(())
        }

        async fn suggest(&self, _choices: AutocompleteChoices) -> Result<()> {
            Ok(())
        }

        async fn defer(&self, _ephemeral: bool) -> Result<()> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct Recording(Mutex<Vec<(String, bool)>>);

    #[async_trait]
    impl InteractionResponder for Recording {
        async fn respond(&self, content: &str, ephemeral: bool) -> Result<()> {
            self.0.lock().unwrap().push((content.to_string(), ephemeral));
            Ok(())
        }

        async fn suggest(&self, _choices: AutocompleteChoices) -> Result<()> {
            Ok(())
        }

        async fn defer(&self, _ephemeral: bool) -> Result<()> {
            Ok(())
        }
    }

    fn interaction() -> SlashInteraction {
        SlashInteraction::new(1, InteractionKind::Command, InteractionCommand::new("cat"), Arc::new(Silent))
    }

    #[test]
    fn test_default_messages() {
        let controller = ExceptionController::new();
        let interaction = interaction();

        let cases = vec![
            (
                CommandError::NoSuchCommand { input: "dog".to_string() },
                "Unknown command",
            ),
            (
                CommandError::NoPermission { permission: "cat.add".to_string() },
                "Insufficient permissions",
            ),
            (
                CommandError::InvalidSyntax { correct_syntax: "cat add <name>".to_string() },
                "Invalid Command Syntax. Correct command syntax is: /cat add <name>",
            ),
            (
                CommandError::ArgumentParse("'x' is not a number".to_string()),
                "Invalid Command Argument: 'x' is not a number",
            ),
            (
                CommandError::Execution("database offline".to_string()),
                "Command failed: database offline",
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(controller.message(&err, &interaction), expected);
        }
    }

    #[test]
    fn test_custom_handler_replaces_default() {
        let mut controller = ExceptionController::new();
        controller.register(ErrorKind::NoPermission, |_, interaction| {
            format!("You cannot use /{}", interaction.command.path())
        });

        let err = CommandError::NoPermission { permission: "x".to_string() };
        assert_eq!(controller.message(&err, &interaction()), "You cannot use /cat");
    }

    #[tokio::test]
    async fn test_error_visibility_follows_setting() {
        let err = CommandError::NoSuchCommand { input: "dog".to_string() };

        let responder = Arc::new(Recording::default());
        let interaction =
            SlashInteraction::new(1, InteractionKind::Command, InteractionCommand::new("dog"), responder.clone());
        let controller = ExceptionController::new();
        controller.handle(&err, &interaction, true).await.unwrap();
        controller.handle(&err, &interaction, false).await.unwrap();

        assert_eq!(
            *responder.0.lock().unwrap(),
            vec![("Unknown command".to_string(), true), ("Unknown command".to_string(), false)]
        );
    }
}
