use anyhow::{anyhow, Result};
use serenity::async_trait;
use serenity::http::Http;
use serenity::model::application::interaction::application_command::ApplicationCommandInteraction;
use serenity::model::application::interaction::autocomplete::AutocompleteInteraction;
use serenity::model::application::interaction::InteractionResponseType;
use log::debug;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use crate::interaction::{AutocompleteChoices, InteractionResponder};

const FRESH: u8 = 0;
const DEFERRED: u8 = 1;
const ANSWERED: u8 = 2;

/// Replies to a slash command. The first reply answers the interaction, or
/// fills in the deferred response when one was sent; later ones are sent as
/// follow-ups.
pub struct CommandResponder {
    http: Arc<Http>,
    interaction: ApplicationCommandInteraction,
    state: AtomicU8,
}

impl CommandResponder {
    pub fn new(http: Arc<Http>, interaction: ApplicationCommandInteraction) -> Self {
        CommandResponder {
            http,
            interaction,
            state: AtomicU8::new(FRESH),
        }
    }
}

#[async_trait]
impl InteractionResponder for CommandResponder {
    async fn respond(&self, content: &str, ephemeral: bool) -> Result<()> {
        match self.state.swap(ANSWERED, Ordering::AcqRel) {
            FRESH => {
                self.interaction
                    .create_interaction_response(&self.http, |response| {
                        response
                            .kind(InteractionResponseType::ChannelMessageWithSource)
                            .interaction_response_data(|message| message.content(content).ephemeral(ephemeral))
                    })
                    .await?;
            }
            // Visibility was fixed by the defer.
            DEFERRED => {
                self.interaction
                    .edit_original_interaction_response(&self.http, |message| message.content(content))
                    .await?;
            }
            _ => {
                self.interaction
                    .create_followup_message(&self.http, |message| {
                        message.content(content).ephemeral(ephemeral)
                    })
                    .await?;
            }
        }
        Ok(())
    }

    async fn suggest(&self, _choices: AutocompleteChoices) -> Result<()> {
        Err(anyhow!(
            "`{}` is a command interaction and cannot take suggestions",
            self.interaction.data.name
        ))
    }

    async fn defer(&self, ephemeral: bool) -> Result<()> {
        if self
            .state
            .compare_exchange(FRESH, DEFERRED, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("`{}` was already answered, not deferring", self.interaction.data.name);
            return Ok(());
        }
        self.interaction
            .create_interaction_response(&self.http, |response| {
                response
                    .kind(InteractionResponseType::DeferredChannelMessageWithSource)
                    .interaction_response_data(|message| message.ephemeral(ephemeral))
            })
            .await?;
        Ok(())
    }
}

pub struct AutocompleteResponder {
    http: Arc<Http>,
    interaction: AutocompleteInteraction,
}

impl AutocompleteResponder {
    pub fn new(http: Arc<Http>, interaction: AutocompleteInteraction) -> Self {
        AutocompleteResponder { http, interaction }
    }
}

#[async_trait]
impl InteractionResponder for AutocompleteResponder {
    async fn respond(&self, _content: &str, _ephemeral: bool) -> Result<()> {
        Err(anyhow!(
            "`{}` is an autocomplete interaction and cannot send messages",
            self.interaction.data.name
        ))
    }

    async fn suggest(&self, choices: AutocompleteChoices) -> Result<()> {
        self.interaction
            .create_autocomplete_response(&self.http, |response| {
                match &choices {
                    AutocompleteChoices::Integer(list) => {
                        for (name, value) in list {
                            response.add_int_choice(name, *value);
                        }
                    }
                    AutocompleteChoices::Number(list) => {
                        for (name, value) in list {
                            response.add_number_choice(name, *value);
                        }
                    }
                    AutocompleteChoices::String(list) => {
                        for (name, value) in list {
                            response.add_string_choice(name, value);
                        }
                    }
                }
                response
            })
            .await?;
        Ok(())
    }

    async fn defer(&self, _ephemeral: bool) -> Result<()> {
        Err(anyhow!(
            "`{}` is an autocomplete interaction and cannot be deferred",
            self.interaction.data.name
        ))
    }
}
