//! # Slash Command Manager
//!
//! Entry point for wiring an engine to Discord. Owns the option registry,
//! compiler, settings, predicates and exception handlers, and hands them to
//! the router it builds.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.0.0: Registry, predicates and exception wiring

use std::sync::Arc;

use crate::compiler::{CommandCompiler, CompileReport};
use crate::config::Settings;
use crate::engine::CommandEngine;
use crate::error::{CommandError, ErrorKind, RegistryError};
use crate::exception::ExceptionController;
use crate::interaction::SlashInteraction;
use crate::options::{DiscordOptionType, OptionRegistry};
use crate::publisher::CommandPublisher;
use crate::router::{InteractionRouter, SenderMapper};
use crate::scope::{AlwaysTrue, CommandScope, ScopePredicate};
use crate::tree::{ParserId, Permission};

pub type PermissionPredicate<S> = Arc<dyn Fn(&S, &Permission) -> bool + Send + Sync>;

pub struct SlashCommandManager<E: CommandEngine> {
    engine: Arc<E>,
    sender_mapper: SenderMapper<E::Sender>,
    compiler: CommandCompiler,
    settings: Settings,
    scope_predicate: Arc<dyn ScopePredicate>,
    permission_predicate: PermissionPredicate<E::Sender>,
    exceptions: ExceptionController,
}

impl<E: CommandEngine> SlashCommandManager<E> {
    pub fn new<F>(engine: Arc<E>, sender_mapper: F) -> Self
    where
        F: Fn(&SlashInteraction) -> E::Sender + Send + Sync + 'static,
    {
        SlashCommandManager {
            engine,
            sender_mapper: Arc::new(sender_mapper),
            compiler: CommandCompiler::new(OptionRegistry::standard()),
            settings: Settings::default(),
            scope_predicate: Arc::new(AlwaysTrue),
            permission_predicate: Arc::new(|_, _| true),
            exceptions: ExceptionController::new(),
        }
    }

    pub fn engine(&self) -> &Arc<E> {
        &self.engine
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    pub fn registry(&self) -> &OptionRegistry {
        self.compiler.registry()
    }

    pub fn registry_mut(&mut self) -> &mut OptionRegistry {
        self.compiler.registry_mut()
    }

    pub fn register_mapping(
        &mut self,
        option_type: DiscordOptionType,
        parser: impl Into<ParserId>,
    ) -> Result<&mut Self, RegistryError> {
        self.compiler.registry_mut().register_mapping(option_type, parser)?;
        Ok(self)
    }

    /// Filter consulted once per root on every publish.
    pub fn scope_predicate(&mut self, predicate: impl ScopePredicate + 'static) -> &mut Self {
        self.scope_predicate = Arc::new(predicate);
        self
    }

    pub fn permission_predicate<F>(&mut self, predicate: F) -> &mut Self
    where
        F: Fn(&E::Sender, &Permission) -> bool + Send + Sync + 'static,
    {
        self.permission_predicate = Arc::new(predicate);
        self
    }

    pub fn has_permission(&self, sender: &E::Sender, permission: &Permission) -> bool {
        (self.permission_predicate)(sender, permission)
    }

    /// Shared handle to the permission check, for engines that run it themselves.
    pub fn permission_checker(&self) -> PermissionPredicate<E::Sender> {
        self.permission_predicate.clone()
    }

    pub fn exception_handler<F>(&mut self, kind: ErrorKind, handler: F) -> &mut Self
    where
        F: Fn(&CommandError, &SlashInteraction) -> String + Send + Sync + 'static,
    {
        self.exceptions.register(kind, handler);
        self
    }

    /// Compiles the engine's current tree for `scope` without publishing.
    pub fn compile_for(&self, scope: &CommandScope) -> CompileReport {
        let tree = self.engine.command_tree();
        self.compiler
            .compile_for(&tree, scope, self.scope_predicate.as_ref())
    }

    /// Builds the router. Settings and handlers are frozen at this point.
    pub fn build_router(&self, publisher: Arc<dyn CommandPublisher>) -> Arc<InteractionRouter<E>> {
        let router = InteractionRouter::new(self.engine.clone(), publisher, self.sender_mapper.clone())
            .with_compiler(Arc::new(self.compiler.clone()))
            .with_settings(Arc::new(self.settings.clone()))
            .with_predicate(self.scope_predicate.clone())
            .with_exceptions(Arc::new(self.exceptions.clone()));
        Arc::new(router)
    }
}
