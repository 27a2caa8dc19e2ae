//! Contract the platform binding implements to materialize compiled commands.

use anyhow::Result;
use async_trait::async_trait;

use crate::ir::DiscordCommand;
use crate::scope::CommandScope;

#[async_trait]
pub trait CommandPublisher: Send + Sync + 'static {
    /// Creates `commands` in `scope`.
    async fn publish(&self, scope: &CommandScope, commands: &[DiscordCommand]) -> Result<()>;

    /// Deletes every command currently registered in `scope`.
    async fn clear(&self, scope: &CommandScope) -> Result<()>;
}
