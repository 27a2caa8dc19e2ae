//! # Command Scopes
//!
//! Where a command is published: globally, or to a set of guilds. Scopes live
//! in node metadata under [`SCOPE_META_KEY`](crate::tree::SCOPE_META_KEY) and
//! are folded up to the root before every publish.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.0.0: Scope overlap, leaf-to-root resolution and scope predicates

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{json, Value};
use std::collections::BTreeSet;
use std::fmt;

use crate::error::{CompileError, ScopeError};
use crate::tree::{CommandNode, SCOPE_META_KEY};

/// One entry in a guild scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GuildTarget {
    /// Wildcard marker standing for "any guild".
    Any,
    Id(u64),
}

impl Serialize for GuildTarget {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            GuildTarget::Any => serializer.serialize_str("*"),
            GuildTarget::Id(id) => serializer.serialize_u64(*id),
        }
    }
}

impl<'de> Deserialize<'de> for GuildTarget {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::String(marker) if marker == "*" => Ok(GuildTarget::Any),
            Value::Number(id) => id
                .as_u64()
                .map(GuildTarget::Id)
                .ok_or_else(|| D::Error::custom(format!("invalid guild id {}", id))),
            other => Err(D::Error::custom(format!("invalid guild target {}", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "ScopeRepr")]
pub enum CommandScope {
    Global,
    Guilds(BTreeSet<GuildTarget>),
}

#[derive(Deserialize)]
#[serde(rename_all = "snake_case")]
enum ScopeRepr {
    Global,
    Guilds(BTreeSet<GuildTarget>),
}

impl TryFrom<ScopeRepr> for CommandScope {
    type Error = ScopeError;

    fn try_from(repr: ScopeRepr) -> Result<Self, Self::Error> {
        match repr {
            ScopeRepr::Global => Ok(CommandScope::Global),
            ScopeRepr::Guilds(targets) => CommandScope::from_targets(targets),
        }
    }
}

impl CommandScope {
    pub fn global() -> Self {
        CommandScope::Global
    }

    pub fn guilds(ids: impl IntoIterator<Item = u64>) -> Result<Self, ScopeError> {
        Self::from_targets(ids.into_iter().map(GuildTarget::Id))
    }

    /// A guild scope that overlaps every other guild scope.
    pub fn any_guild() -> Self {
        CommandScope::Guilds(BTreeSet::from([GuildTarget::Any]))
    }

    /// Publish target for one guild. Roots declared for "any guild" still
    /// land there through the wildcard on their own side.
    pub fn guild_target(guild_id: u64) -> Self {
        CommandScope::Guilds(BTreeSet::from([GuildTarget::Id(guild_id)]))
    }

    pub fn from_targets(targets: impl IntoIterator<Item = GuildTarget>) -> Result<Self, ScopeError> {
        let targets: BTreeSet<GuildTarget> = targets.into_iter().collect();
        if targets.is_empty() {
            return Err(ScopeError::EmptyGuildSet);
        }
        Ok(CommandScope::Guilds(targets))
    }

    pub fn is_global(&self) -> bool {
        matches!(self, CommandScope::Global)
    }

    /// Symmetric overlap test.
    pub fn overlaps(&self, other: &CommandScope) -> bool {
        match (self, other) {
            (CommandScope::Global, _) | (_, CommandScope::Global) => true,
            (CommandScope::Guilds(a), CommandScope::Guilds(b)) => {
                a.contains(&GuildTarget::Any)
                    || b.contains(&GuildTarget::Any)
                    || a.intersection(b).next().is_some()
            }
        }
    }

    /// Union of two scopes. Global absorbs everything.
    pub fn merge(&self, other: &CommandScope) -> CommandScope {
        match (self, other) {
            (CommandScope::Guilds(a), CommandScope::Guilds(b)) => {
                CommandScope::Guilds(a.union(b).copied().collect())
            }
            _ => CommandScope::Global,
        }
    }

    /// Concrete guild ids named by this scope, ignoring the wildcard.
    pub fn guild_ids(&self) -> Vec<u64> {
        match self {
            CommandScope::Global => Vec::new(),
            CommandScope::Guilds(targets) => targets
                .iter()
                .filter_map(|target| match target {
                    GuildTarget::Id(id) => Some(*id),
                    GuildTarget::Any => None,
                })
                .collect(),
        }
    }

    /// Metadata form, identical to the serde representation.
    pub fn to_meta(&self) -> Value {
        match self {
            CommandScope::Global => json!("global"),
            CommandScope::Guilds(targets) => {
                let targets: Vec<Value> = targets
                    .iter()
                    .map(|target| match target {
                        GuildTarget::Any => json!("*"),
                        GuildTarget::Id(id) => json!(id),
                    })
                    .collect();
                json!({ "guilds": targets })
            }
        }
    }
}

impl fmt::Display for CommandScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandScope::Global => f.write_str("global"),
            CommandScope::Guilds(targets) => {
                let rendered: Vec<String> = targets
                    .iter()
                    .map(|target| match target {
                        GuildTarget::Any => "*".to_string(),
                        GuildTarget::Id(id) => id.to_string(),
                    })
                    .collect();
                write!(f, "guilds[{}]", rendered.join(","))
            }
        }
    }
}

/// Folds leaf scopes up to the root.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScopeResolver;

impl ScopeResolver {
    /// Scope of `root`: each leaf takes the nearest `scope` metadata on its
    /// path (global when there is none) and the leaf scopes are merged.
    pub fn resolve(&self, root: &CommandNode) -> Result<CommandScope, CompileError> {
        let mut resolved = None;
        Self::walk(root, None, &root.name, &mut resolved)?;
        Ok(resolved.unwrap_or(CommandScope::Global))
    }

    fn walk(
        node: &CommandNode,
        inherited: Option<&CommandScope>,
        path: &str,
        resolved: &mut Option<CommandScope>,
    ) -> Result<(), CompileError> {
        let own = match node.meta.get(SCOPE_META_KEY) {
            Some(value) => Some(CommandScope::deserialize(value).map_err(|err| {
                CompileError::InvalidScope {
                    path: path.to_string(),
                    reason: err.to_string(),
                }
            })?),
            None => None,
        };
        let current = own.as_ref().or(inherited);

        if node.is_leaf() {
            let leaf_scope = current.cloned().unwrap_or(CommandScope::Global);
            *resolved = Some(match resolved.take() {
                Some(existing) => existing.merge(&leaf_scope),
                None => leaf_scope,
            });
            return Ok(());
        }

        for child in &node.children {
            let child_path = format!("{} {}", path, child.name);
            Self::walk(child, current, &child_path, resolved)?;
        }
        Ok(())
    }
}

/// User filter consulted once per root per publish target.
pub trait ScopePredicate: Send + Sync {
    fn test(&self, root: &CommandNode, scope: &CommandScope) -> bool;
}

impl<F> ScopePredicate for F
where
    F: Fn(&CommandNode, &CommandScope) -> bool + Send + Sync,
{
    fn test(&self, root: &CommandNode, scope: &CommandScope) -> bool {
        self(root, scope)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysTrue;

impl ScopePredicate for AlwaysTrue {
    fn test(&self, _root: &CommandNode, _scope: &CommandScope) -> bool {
        true
    }
}

/// Keeps globally scoped roots out of guild publishes, so a command does not
/// show up twice in guilds that also receive the global set.
#[derive(Debug, Clone, Copy, Default)]
pub struct SkipGlobalInGuilds;

impl ScopePredicate for SkipGlobalInGuilds {
    fn test(&self, root: &CommandNode, scope: &CommandScope) -> bool {
        if scope.is_global() {
            return true;
        }
        !matches!(ScopeResolver.resolve(root), Ok(CommandScope::Global))
    }
}
