use log::{debug, error, info, warn};
use serenity::async_trait;
use serenity::model::application::interaction::Interaction;
use serenity::model::gateway::Ready;
use serenity::model::guild::Guild;
use serenity::prelude::*;
use std::sync::Arc;

use super::convert::to_interaction_command;
use super::publisher::SerenityPublisher;
use super::responder::{AutocompleteResponder, CommandResponder};
use crate::engine::CommandEngine;
use crate::interaction::{InteractionKind, SlashInteraction};
use crate::router::{ExecutionOutcome, InteractionRouter, RouterEvent};

/// Serenity event handler that feeds gateway events into the router.
pub struct RouterHandler<E: CommandEngine> {
    router: Arc<InteractionRouter<E>>,
    publisher: Arc<SerenityPublisher>,
}

impl<E: CommandEngine> RouterHandler<E> {
    /// Moves the router out of `Idle`; build the handler right before
    /// starting the client.
    pub fn new(router: Arc<InteractionRouter<E>>, publisher: Arc<SerenityPublisher>) -> Self {
        router.start();
        RouterHandler { router, publisher }
    }
}

#[async_trait]
impl<E: CommandEngine> EventHandler for RouterHandler<E> {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!("🎉 {} is connected and ready!", ready.user.name);
        info!("📡 Connected to {} guilds", ready.guilds.len());
        if let Some(shard) = ready.shard {
            info!("⚡ Shard: {}/{}", shard[0] + 1, shard[1]);
        }

        self.publisher.bind_application(ready.application.id.0);
        if let Err(e) = self.router.dispatch(RouterEvent::Ready).await {
            error!("❌ Failed to sync global slash commands: {}", e);
        }
    }

    async fn guild_create(&self, _ctx: Context, guild: Guild, _is_new: bool) {
        debug!("Guild available: {} ({})", guild.name, guild.id);
        if let Err(e) = self.router.dispatch(RouterEvent::GuildAvailable(guild.id.0)).await {
            error!("❌ Failed to sync slash commands for guild {}: {}", guild.id, e);
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        match interaction {
            Interaction::ApplicationCommand(command) => {
                let payload = to_interaction_command(&command.data.name, &command.data.options);
                let slash = SlashInteraction::new(
                    command.id.0,
                    InteractionKind::Command,
                    payload,
                    Arc::new(CommandResponder::new(ctx.http.clone(), command.clone())),
                )
                .in_guild(command.guild_id.map(|id| id.0))
                .from_channel(command.channel_id.0, command.user.id.0);

                match self.router.on_command(slash).await {
                    Ok(ExecutionOutcome::Completed) => {
                        debug!("Slash command '{}' completed", command.data.name);
                    }
                    Ok(ExecutionOutcome::Failed(e)) => {
                        debug!("Slash command '{}' failed: {}", command.data.name, e);
                    }
                    Err(e) => {
                        error!("Error handling slash command '{}': {}", command.data.name, e);
                    }
                }
            }
            Interaction::Autocomplete(autocomplete) => {
                let payload = to_interaction_command(&autocomplete.data.name, &autocomplete.data.options);
                let slash = SlashInteraction::new(
                    autocomplete.id.0,
                    InteractionKind::Autocomplete,
                    payload,
                    Arc::new(AutocompleteResponder::new(ctx.http.clone(), autocomplete.clone())),
                )
                .in_guild(autocomplete.guild_id.map(|id| id.0))
                .from_channel(autocomplete.channel_id.0, autocomplete.user.id.0);

                if let Err(e) = self.router.dispatch(RouterEvent::AutocompleteRequested(slash)).await {
                    error!("Error handling autocomplete for '{}': {}", autocomplete.data.name, e);
                }
            }
            Interaction::Ping(_) => {
                info!("Ping interaction received - Discord health check");
            }
            other => {
                warn!("Ignoring unsupported interaction {:?}", other.kind());
            }
        }
    }
}
