use anyhow::Result;
use log::{info, warn};
use serde_json::{json, Value};
use serenity::async_trait;
use serenity::builder::{CreateApplicationCommand, CreateApplicationCommandOption};
use serenity::http::Http;
use serenity::model::application::command::Command;
use serenity::model::id::GuildId;
use serenity::model::Permissions;
use std::sync::Arc;

use super::platform_kind;
use crate::ir::{DiscordCommand, DiscordOption, OptionChoice, Range, SubCommand, Variable};
use crate::publisher::CommandPublisher;
use crate::scope::CommandScope;

/// Publishes through the Discord REST API.
pub struct SerenityPublisher {
    http: Arc<Http>,
}

impl SerenityPublisher {
    pub fn new(http: Arc<Http>) -> Self {
        SerenityPublisher { http }
    }

    pub fn http(&self) -> &Arc<Http> {
        &self.http
    }

    /// Application commands are addressed by application id, which is only
    /// known once the gateway reports ready.
    pub fn bind_application(&self, application_id: u64) {
        self.http.set_application_id(application_id);
    }
}

#[async_trait]
impl CommandPublisher for SerenityPublisher {
    async fn publish(&self, scope: &CommandScope, commands: &[DiscordCommand]) -> Result<()> {
        for command in commands {
            command.validate()?;
        }

        match scope {
            CommandScope::Global => {
                for command in commands {
                    let builder = build_command(command);
                    Command::create_global_application_command(&self.http, |c| {
                        *c = builder;
                        c
                    })
                    .await?;
                }
                info!("Registered {} global command(s)", commands.len());
            }
            CommandScope::Guilds(_) => {
                let guild_ids = scope.guild_ids();
                if guild_ids.is_empty() {
                    warn!("Scope {} names no concrete guild, nothing to publish", scope);
                }
                for guild_id in guild_ids {
                    for command in commands {
                        let builder = build_command(command);
                        GuildId(guild_id)
                            .create_application_command(&self.http, |c| {
                                *c = builder;
                                c
                            })
                            .await?;
                    }
                    info!("Registered {} command(s) for guild: {}", commands.len(), guild_id);
                }
            }
        }
        Ok(())
    }

    async fn clear(&self, scope: &CommandScope) -> Result<()> {
        match scope {
            CommandScope::Global => {
                Command::set_global_application_commands(&self.http, |c| c).await?;
            }
            CommandScope::Guilds(_) => {
                for guild_id in scope.guild_ids() {
                    GuildId(guild_id)
                        .set_application_commands(&self.http, |c| c)
                        .await?;
                }
            }
        }
        Ok(())
    }
}

/// Builds the serenity payload for one compiled command.
pub fn build_command(command: &DiscordCommand) -> CreateApplicationCommand {
    let mut builder = CreateApplicationCommand::default();
    builder.name(&command.name).description(&command.description);
    if let Some(bits) = command.default_member_permissions {
        builder.default_member_permissions(Permissions::from_bits_truncate(bits));
    }
    for option in &command.options {
        builder.add_option(build_option(option));
    }
    builder
}

fn build_option(option: &DiscordOption) -> CreateApplicationCommandOption {
    match option {
        DiscordOption::SubCommand(sub) => build_subcommand(sub),
        DiscordOption::Variable(variable) => build_variable(variable),
    }
}

fn build_subcommand(sub: &SubCommand) -> CreateApplicationCommandOption {
    let mut builder = CreateApplicationCommandOption::default();
    builder
        .name(&sub.name)
        .description(&sub.description)
        .kind(platform_kind(&sub.option_type()));
    for option in &sub.options {
        builder.add_sub_option(build_option(option));
    }
    builder
}

fn build_variable(variable: &Variable) -> CreateApplicationCommandOption {
    let mut builder = CreateApplicationCommandOption::default();
    builder
        .name(&variable.name)
        .description(&variable.description)
        .kind(platform_kind(&variable.option_type))
        .required(variable.required);
    if variable.autocomplete {
        builder.set_autocomplete(true);
    }
    // Written as raw fields so 64-bit integers survive untouched.
    match variable.range {
        Some(Range::Integer { min, max }) => {
            builder.0.insert("min_value", json!(min));
            builder.0.insert("max_value", json!(max));
        }
        Some(Range::Number { min, max }) => {
            builder.0.insert("min_value", json!(min));
            builder.0.insert("max_value", json!(max));
        }
        None => {}
    }
    if !variable.choices.is_empty() {
        builder.0.insert("choices", choices_json(&variable.choices));
    }
    builder
}

fn choices_json(choices: &[OptionChoice]) -> Value {
    Value::Array(
        choices
            .iter()
            .map(|choice| json!({ "name": choice.name, "value": choice.value }))
            .collect(),
    )
}
