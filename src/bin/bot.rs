use anyhow::Result;
use dashmap::DashMap;
use dotenvy::dotenv;
use log::{error, info};
use serenity::async_trait;
use serenity::http::Http;
use serenity::prelude::*;
use std::sync::Arc;

use slashtree::config::Config;
use slashtree::engine::{CommandEngine, Suggestion, Suggestions};
use slashtree::error::CommandError;
use slashtree::gateway::{register_platform_mappings, RouterHandler, SerenityPublisher};
use slashtree::interaction::SlashInteraction;
use slashtree::manager::SlashCommandManager;
use slashtree::scope::{CommandScope, SkipGlobalInGuilds};
use slashtree::tree::{Argument, CommandNode, CommandTree, NumericRange};

/// Tiny engine keeping a registry of cats per process.
struct CatEngine {
    tree: Arc<CommandTree>,
    cats: DashMap<String, i64>,
}

impl CatEngine {
    fn new(dev_guild_id: Option<u64>) -> Result<Self> {
        let mut cat = CommandNode::literal("cat")
            .describe("Keep track of cats")
            .child(
                CommandNode::literal("add")
                    .describe("Register a cat")
                    .argument_chain([
                        CommandNode::argument("name", Argument::new("string")).describe("Name of the cat"),
                        CommandNode::argument(
                            "age",
                            Argument::new("integer").range(NumericRange::Integer { min: 0, max: 40 }),
                        )
                        .describe("Age in years"),
                    ]),
            )
            .child(
                CommandNode::literal("remove")
                    .describe("Forget a cat")
                    .child(CommandNode::argument("name", Argument::new("string")).describe("Name of the cat")),
            );
        if let Some(guild_id) = dev_guild_id {
            cat = cat.with_scope(&CommandScope::guilds([guild_id])?);
        }

        let ping = CommandNode::literal("ping").describe("Test bot responsiveness");

        Ok(CatEngine {
            tree: Arc::new(CommandTree::new(vec![cat, ping])),
            cats: DashMap::new(),
        })
    }
}

#[async_trait]
impl CommandEngine for CatEngine {
    type Sender = u64;

    fn command_tree(&self) -> Arc<CommandTree> {
        self.tree.clone()
    }

    async fn execute(
        &self,
        _sender: u64,
        input: &str,
        interaction: Arc<SlashInteraction>,
    ) -> Result<(), CommandError> {
        let words: Vec<&str> = input.split_whitespace().collect();
        match words.as_slice() {
            ["ping"] => interaction.respond_public("Pong!").await?,
            ["cat", "add", name, age] => {
                let age: i64 = age
                    .parse()
                    .map_err(|_| CommandError::ArgumentParse(format!("'{}' is not a whole number", age)))?;
                self.cats.insert(name.to_string(), age);
                interaction
                    .respond_public(&format!("🐱 Added {} ({} years)", name, age))
                    .await?;
            }
            ["cat", "remove", name] => match self.cats.remove(*name) {
                Some(_) => interaction.respond_public(&format!("👋 Removed {}", name)).await?,
                None => return Err(CommandError::Execution(format!("no cat named {}", name))),
            },
            ["cat", "add", ..] => {
                return Err(CommandError::InvalidSyntax {
                    correct_syntax: "cat add <name> <age>".to_string(),
                })
            }
            ["cat", "remove", ..] => {
                return Err(CommandError::InvalidSyntax {
                    correct_syntax: "cat remove <name>".to_string(),
                })
            }
            _ => {
                return Err(CommandError::NoSuchCommand {
                    input: input.to_string(),
                })
            }
        }
        Ok(())
    }

    async fn suggest(
        &self,
        _sender: u64,
        input: &str,
        _interaction: Arc<SlashInteraction>,
    ) -> Result<Suggestions> {
        let typed = input.rsplit(' ').next().unwrap_or_default();
        let partial = typed.to_lowercase();
        let list = if input.starts_with("cat remove ") {
            self.cats
                .iter()
                .map(|entry| entry.key().clone())
                .filter(|name| name.to_lowercase().starts_with(&partial))
                .map(Suggestion::new)
                .collect()
        } else if input.starts_with("cat add ") && input.split(' ').count() == 4 {
            ["1", "2", "5", "10"]
                .iter()
                .filter(|age| age.starts_with(&partial))
                .map(|age| Suggestion::new(*age).with_display(format!("{} years", age)))
                .collect()
        } else {
            Vec::new()
        };
        Ok(Suggestions::new(typed, list))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let config = Config::from_env()?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();

    info!("Starting slashtree demo bot...");

    let engine = Arc::new(CatEngine::new(config.dev_guild_id)?);
    let mut manager = SlashCommandManager::new(engine, |interaction: &SlashInteraction| interaction.user_id)
        .with_settings(config.settings.clone());
    register_platform_mappings(manager.registry_mut())?;
    manager.scope_predicate(SkipGlobalInGuilds);

    let publisher = Arc::new(SerenityPublisher::new(Arc::new(Http::new(&config.discord_token))));
    let router = manager.build_router(publisher.clone());
    let handler = RouterHandler::new(router, publisher);

    let intents = GatewayIntents::GUILDS;

    let mut client = Client::builder(&config.discord_token, intents)
        .event_handler(handler)
        .await
        .map_err(|e| {
            error!("Failed to create Discord client: {}", e);
            anyhow::anyhow!("Client creation failed: {}", e)
        })?;

    info!("Establishing WebSocket connection to Discord gateway...");
    info!("Gateway intents: {:?}", intents);

    if let Err(why) = client.start().await {
        error!("Gateway connection failed: {:?}", why);
        return Err(anyhow::anyhow!("Failed to establish gateway connection: {}", why));
    }

    Ok(())
}
