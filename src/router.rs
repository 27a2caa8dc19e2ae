//! # Interaction Router
//!
//! Bridges platform events and the command engine. Lifecycle events trigger a
//! clear/publish cycle per scope, command interactions are rebuilt into the
//! engine's text input and executed on their own task, and autocomplete
//! requests are answered with trimmed, typed suggestions.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.0.0: Ready/guild publishing, spawned execution, bounded autocomplete

use dashmap::DashMap;
use log::{debug, error, info, warn};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::timeout;

use crate::compiler::{CommandCompiler, CompileReport};
use crate::config::Settings;
use crate::engine::{CommandEngine, Suggestion};
use crate::error::{CommandError, RouterError};
use crate::exception::ExceptionController;
use crate::interaction::{AutocompleteChoices, SlashInteraction};
use crate::ir::MAX_CHOICES;
use crate::options::{DiscordOptionType, OptionRegistry, ValueKind};
use crate::publisher::CommandPublisher;
use crate::scope::{AlwaysTrue, CommandScope, ScopePredicate};

/// Maps an inbound interaction to the engine's sender type.
pub type SenderMapper<S> = Arc<dyn Fn(&SlashInteraction) -> S + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RouterState {
    Idle = 0,
    AwaitingReady = 1,
    Live = 2,
}

impl RouterState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => RouterState::AwaitingReady,
            2 => RouterState::Live,
            _ => RouterState::Idle,
        }
    }
}

#[derive(Debug)]
pub enum RouterEvent {
    Ready,
    GuildAvailable(u64),
    CommandInvoked(SlashInteraction),
    AutocompleteRequested(SlashInteraction),
}

/// What happened to one spawned command execution.
#[derive(Debug, Clone)]
pub enum ExecutionOutcome {
    Completed,
    /// The engine failed and the user was told through the exception controller.
    Failed(CommandError),
}

pub struct InteractionRouter<E: CommandEngine> {
    engine: Arc<E>,
    publisher: Arc<dyn CommandPublisher>,
    sender_mapper: SenderMapper<E::Sender>,
    compiler: Arc<CommandCompiler>,
    settings: Arc<Settings>,
    predicate: Arc<dyn ScopePredicate>,
    exceptions: Arc<ExceptionController>,
    state: AtomicU8,
    publish_locks: DashMap<CommandScope, Arc<Mutex<()>>>,
}

impl<E: CommandEngine> InteractionRouter<E> {
    pub fn new(
        engine: Arc<E>,
        publisher: Arc<dyn CommandPublisher>,
        sender_mapper: SenderMapper<E::Sender>,
    ) -> Self {
        InteractionRouter {
            engine,
            publisher,
            sender_mapper,
            compiler: Arc::new(CommandCompiler::new(OptionRegistry::standard())),
            settings: Arc::new(Settings::default()),
            predicate: Arc::new(AlwaysTrue),
            exceptions: Arc::new(ExceptionController::new()),
            state: AtomicU8::new(RouterState::Idle as u8),
            publish_locks: DashMap::new(),
        }
    }

    pub fn with_compiler(mut self, compiler: Arc<CommandCompiler>) -> Self {
        self.compiler = compiler;
        self
    }

    pub fn with_settings(mut self, settings: Arc<Settings>) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_predicate(mut self, predicate: Arc<dyn ScopePredicate>) -> Self {
        self.predicate = predicate;
        self
    }

    pub fn with_exceptions(mut self, exceptions: Arc<ExceptionController>) -> Self {
        self.exceptions = exceptions;
        self
    }

    pub fn state(&self) -> RouterState {
        RouterState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Leaves `Idle`. Called by the binding before it connects.
    pub fn start(&self) {
        if self
            .state
            .compare_exchange(
                RouterState::Idle as u8,
                RouterState::AwaitingReady as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
        {
            debug!("Interaction router awaiting ready");
        }
    }

    fn go_live(&self) {
        if self
            .state
            .compare_exchange(
                RouterState::AwaitingReady as u8,
                RouterState::Live as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
        {
            info!("🟢 Interaction router is live");
        }
    }

    pub async fn dispatch(&self, event: RouterEvent) -> Result<(), RouterError> {
        match event {
            RouterEvent::Ready => {
                self.on_ready().await?;
            }
            RouterEvent::GuildAvailable(guild_id) => {
                self.on_guild_available(guild_id).await?;
            }
            RouterEvent::CommandInvoked(interaction) => {
                // Detached; the outcome is logged by the task itself.
                drop(self.on_command(interaction));
            }
            RouterEvent::AutocompleteRequested(interaction) => {
                self.on_autocomplete(interaction).await?;
            }
        }
        Ok(())
    }

    pub async fn on_ready(&self) -> Result<CompileReport, RouterError> {
        let report = self
            .sync_scope(CommandScope::global(), self.settings.auto_register_global)
            .await;
        self.go_live();
        report
    }

    pub async fn on_guild_available(&self, guild_id: u64) -> Result<CompileReport, RouterError> {
        let report = self
            .sync_scope(
                CommandScope::guild_target(guild_id),
                self.settings.auto_register_guild,
            )
            .await;
        self.go_live();
        report
    }

    /// Clears and/or publishes `scope`. Calls for the same scope run one at a
    /// time so a clear always lands before the create that follows it.
    pub async fn sync_scope(
        &self,
        scope: CommandScope,
        register: bool,
    ) -> Result<CompileReport, RouterError> {
        let lock = self
            .publish_locks
            .entry(scope.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        if self.settings.clear_existing {
            self.publisher.clear(&scope).await.map_err(|err| {
                error!("❌ Failed to clear commands in {}: {}", scope, err);
                RouterError::Platform(err)
            })?;
            debug!("Cleared commands in {}", scope);
        }

        if !register {
            return Ok(CompileReport::default());
        }

        let tree = self.engine.command_tree();
        let mut report = self.compiler.compile_for(&tree, &scope, self.predicate.as_ref());

        let mut valid = Vec::with_capacity(report.commands.len());
        for command in report.commands.drain(..) {
            match command.validate() {
                Ok(()) => valid.push(command),
                Err(err) => {
                    error!("Refusing to publish `{}`: {}", command.name, err);
                    report.errors.push(err);
                }
            }
        }
        report.commands = valid;

        if report.commands.is_empty() {
            info!("No commands to publish in {}", scope);
            return Ok(report);
        }

        self.publisher
            .publish(&scope, &report.commands)
            .await
            .map_err(|err| {
                error!("❌ Failed to publish commands in {}: {}", scope, err);
                RouterError::Platform(err)
            })?;
        info!(
            "✅ Published {} command(s) in {} ({} failed to compile)",
            report.commands.len(),
            scope,
            report.errors.len()
        );

        Ok(report)
    }

    /// Runs the command on its own task, deferring first when a forced defer
    /// is configured. Errors and panics are answered through the exception
    /// controller and never escape the task.
    pub fn on_command(&self, interaction: SlashInteraction) -> JoinHandle<ExecutionOutcome> {
        let input = interaction.command.reconstruct_input();
        let sender = (self.sender_mapper)(&interaction);
        let interaction = Arc::new(interaction);
        let engine = self.engine.clone();
        let exceptions = self.exceptions.clone();
        let defer = self.settings.forced_defer();
        let ephemeral_errors = self.settings.ephemeral_error_messages;

        tokio::spawn(async move {
            if let Some(ephemeral) = defer {
                if let Err(why) = interaction.responder().defer(ephemeral).await {
                    error!("Failed to defer `{}`: {}", input, why);
                }
            }

            debug!("Executing `{}`", input);
            let execution = {
                let input = input.clone();
                let interaction = interaction.clone();
                tokio::spawn(async move { engine.execute(sender, &input, interaction).await })
            };
            let result = match execution.await {
                Ok(result) => result,
                Err(join_error) => {
                    error!("💥 Command `{}` did not finish: {}", input, join_error);
                    let cause = if join_error.is_panic() {
                        "command panicked"
                    } else {
                        "command was cancelled"
                    };
                    Err(CommandError::Execution(cause.to_string()))
                }
            };

            match result {
                Ok(()) => ExecutionOutcome::Completed,
                Err(err) => {
                    if let Err(why) = exceptions.handle(&err, &interaction, ephemeral_errors).await {
                        error!("Failed to send error response for `{}`: {}", input, why);
                    }
                    ExecutionOutcome::Failed(err)
                }
            }
        })
    }

    /// Answers an autocomplete request and returns what was sent.
    pub async fn on_autocomplete(
        &self,
        interaction: SlashInteraction,
    ) -> Result<AutocompleteChoices, RouterError> {
        let focused = interaction
            .command
            .focused_option()
            .cloned()
            .ok_or_else(|| RouterError::NoFocusedOption {
                command: interaction.command.path(),
            })?;

        let input = interaction.command.autocomplete_input();

        let sender = (self.sender_mapper)(&interaction);
        let interaction = Arc::new(interaction);
        let (completed, suggestions) = match timeout(
            self.settings.suggestion_timeout,
            self.engine.suggest(sender, &input, interaction.clone()),
        )
        .await
        {
            Ok(Ok(suggestions)) => (suggestions.input, suggestions.list),
            Ok(Err(err)) => {
                warn!("Suggestion lookup for `{}` failed: {}", input, err);
                (input.clone(), Vec::new())
            }
            Err(_) => {
                warn!(
                    "Suggestion lookup for `{}` timed out after {:?}",
                    input, self.settings.suggestion_timeout
                );
                (input.clone(), Vec::new())
            }
        };

        let trimmed = trim_suggestions(&completed, suggestions);
        let choices = build_choices(&focused.option_type, trimmed).map_err(|err| {
            error!("Autocomplete for `{}` produced a bad suggestion: {}", input, err);
            err
        })?;

        interaction.responder().suggest(choices.clone()).await?;
        Ok(choices)
    }
}

/// Strips the words of `input` that precede the word being completed from
/// each suggestion, drops the ones left empty, and keeps at most
/// [`MAX_CHOICES`]. `input` is the text the engine reported completing.
pub fn trim_suggestions(input: &str, suggestions: Vec<Suggestion>) -> Vec<Suggestion> {
    suggestions
        .into_iter()
        .filter_map(|suggestion| {
            let value = trim_suggestion(input, &suggestion.value);
            if value.is_empty() {
                None
            } else {
                Some(Suggestion {
                    value,
                    display: suggestion.display,
                })
            }
        })
        .take(MAX_CHOICES)
        .collect()
}

/// Removes the longest word-aligned suffix of the consumed input (everything
/// before its last space) that prefixes `suggestion`.
fn trim_suggestion(input: &str, suggestion: &str) -> String {
    let consumed = match input.rfind(' ') {
        Some(index) => &input[..index],
        None => return suggestion.to_string(),
    };
    if !suggestion.contains(' ') {
        return suggestion.to_string();
    }

    let words: Vec<&str> = consumed.split(' ').collect();
    for start in 0..words.len() {
        let suffix = words[start..].join(" ");
        if suffix.is_empty() {
            continue;
        }
        if let Some(rest) = suggestion.strip_prefix(suffix.as_str()) {
            if rest.is_empty() {
                return String::new();
            }
            if let Some(rest) = rest.strip_prefix(' ') {
                return rest.to_string();
            }
        }
    }

    suggestion.to_string()
}

/// Builds the typed choice list for the focused option's type.
pub fn build_choices(
    option_type: &DiscordOptionType,
    suggestions: Vec<Suggestion>,
) -> Result<AutocompleteChoices, RouterError> {
    let label = |suggestion: &Suggestion| {
        suggestion
            .display
            .clone()
            .unwrap_or_else(|| suggestion.value.clone())
    };
    let invalid = |suggestion: &Suggestion| RouterError::InvalidSuggestion {
        suggestion: suggestion.value.clone(),
        option_type: option_type.name,
    };

    Ok(match option_type.kind {
        ValueKind::Integer => AutocompleteChoices::Integer(
            suggestions
                .iter()
                .map(|s| {
                    s.value
                        .trim()
                        .parse::<i64>()
                        .map(|value| (label(s), value))
                        .map_err(|_| invalid(s))
                })
                .collect::<Result<_, _>>()?,
        ),
        ValueKind::Number => AutocompleteChoices::Number(
            suggestions
                .iter()
                .map(|s| {
                    s.value
                        .trim()
                        .parse::<f64>()
                        .map(|value| (label(s), value))
                        .map_err(|_| invalid(s))
                })
                .collect::<Result<_, _>>()?,
        ),
        _ => AutocompleteChoices::String(
            suggestions
                .into_iter()
                .map(|s| (label(&s), s.value))
                .collect(),
        ),
    })
}
