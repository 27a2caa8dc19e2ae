//! # Command Tree
//!
//! Read-only view of the generic command tree the engine owns. The compiler,
//! scope resolver and router only ever read these nodes.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.0.0: Node model with arguments, permissions, sender types and metadata

use serde_json::Value;
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::ir::OptionChoice;
use crate::scope::CommandScope;

/// Metadata key holding a serialized [`CommandScope`].
pub const SCOPE_META_KEY: &str = "scope";

/// Identity of a generic argument parser, e.g. `"integer"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParserId(pub Cow<'static, str>);

impl ParserId {
    pub const fn from_static(id: &'static str) -> Self {
        ParserId(Cow::Borrowed(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for ParserId {
    fn from(id: &'static str) -> Self {
        ParserId::from_static(id)
    }
}

impl From<String> for ParserId {
    fn from(id: String) -> Self {
        ParserId(Cow::Owned(id))
    }
}

/// Who is allowed to run a command (a user in a guild, a DM user, a console, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SenderType(pub Cow<'static, str>);

impl SenderType {
    /// Matches every sender type.
    pub const ANY: SenderType = SenderType(Cow::Borrowed("*"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        SenderType(name.into())
    }
}

impl fmt::Display for SenderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A permission requirement attached to a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Permission {
    /// Discord permission bits, folded into `default_member_permissions`.
    Discord(u64),
    /// An engine-level permission string checked at execution time.
    Named(String),
}

/// Numeric bounds declared by a parser.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumericRange {
    Integer { min: i64, max: i64 },
    Float { min: f64, max: f64 },
}

/// Leaf argument carried by a variable node.
#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    pub parser: ParserId,
    pub required: bool,
    pub range: Option<NumericRange>,
    pub choices: Vec<OptionChoice>,
    /// `None` lets the compiler pick the platform default.
    pub autocomplete: Option<bool>,
}

impl Argument {
    pub fn new(parser: impl Into<ParserId>) -> Self {
        Argument {
            parser: parser.into(),
            required: true,
            range: None,
            choices: Vec::new(),
            autocomplete: None,
        }
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn range(mut self, range: NumericRange) -> Self {
        self.range = Some(range);
        self
    }

    pub fn choices(mut self, choices: impl IntoIterator<Item = OptionChoice>) -> Self {
        self.choices.extend(choices);
        self
    }

    pub fn autocomplete(mut self, enabled: bool) -> Self {
        self.autocomplete = Some(enabled);
        self
    }
}

/// A node in the generic command tree.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandNode {
    pub name: String,
    pub description: Option<String>,
    pub argument: Option<Argument>,
    /// Target sender type of the command rooted here. Only read on roots.
    pub sender_type: Option<SenderType>,
    pub permissions: HashMap<SenderType, Permission>,
    pub meta: BTreeMap<String, Value>,
    pub children: Vec<CommandNode>,
}

impl CommandNode {
    fn new(name: impl Into<String>, argument: Option<Argument>) -> Self {
        CommandNode {
            name: name.into(),
            description: None,
            argument,
            sender_type: None,
            permissions: HashMap::new(),
            meta: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    pub fn literal(name: impl Into<String>) -> Self {
        Self::new(name, None)
    }

    pub fn argument(name: impl Into<String>, argument: Argument) -> Self {
        Self::new(name, Some(argument))
    }

    pub fn is_literal(&self) -> bool {
        self.argument.is_none()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn sender_type(mut self, sender_type: SenderType) -> Self {
        self.sender_type = Some(sender_type);
        self
    }

    pub fn permission(mut self, sender_type: SenderType, permission: Permission) -> Self {
        self.permissions.insert(sender_type, permission);
        self
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: Value) -> Self {
        self.meta.insert(key.into(), value);
        self
    }

    pub fn with_scope(self, scope: &CommandScope) -> Self {
        self.with_meta(SCOPE_META_KEY, scope.to_meta())
    }

    pub fn child(mut self, child: CommandNode) -> Self {
        self.children.push(child);
        self
    }

    /// Appends `arguments` as a chain: each argument becomes the only child of
    /// the previous one, which is how a generic parser links consecutive args.
    pub fn argument_chain(self, arguments: impl IntoIterator<Item = CommandNode>) -> Self {
        let mut arguments: Vec<CommandNode> = arguments.into_iter().collect();
        let mut tail: Option<CommandNode> = None;
        while let Some(mut argument) = arguments.pop() {
            if let Some(next) = tail.take() {
                argument.children.push(next);
            }
            tail = Some(argument);
        }
        match tail {
            Some(head) => self.child(head),
            None => self,
        }
    }

    /// Description shown on Discord, falling back to the node name.
    pub fn display_description(&self) -> &str {
        match self.description.as_deref() {
            Some(description) if !description.is_empty() => description,
            _ => &self.name,
        }
    }

    pub fn find_child(&self, name: &str) -> Option<&CommandNode> {
        self.children.iter().find(|child| child.name == name)
    }
}

/// Immutable snapshot of the engine's command tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandTree {
    pub roots: Vec<CommandNode>,
}

impl CommandTree {
    pub fn new(roots: Vec<CommandNode>) -> Self {
        CommandTree { roots }
    }

    pub fn root(&self, name: &str) -> Option<&CommandNode> {
        self.roots.iter().find(|root| root.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argument_chain_nests_arguments() {
        let node = CommandNode::literal("add").argument_chain([
            CommandNode::argument("name", Argument::new("string")),
            CommandNode::argument("age", Argument::new("integer")),
        ]);

        assert_eq!(node.children.len(), 1);
        let name = &node.children[0];
        assert_eq!(name.name, "name");
        assert_eq!(name.children.len(), 1);
        assert_eq!(name.children[0].name, "age");
        assert!(name.children[0].is_leaf());
    }

    #[test]
    fn test_display_description_falls_back_to_name() {
        let node = CommandNode::literal("cat");
        assert_eq!(node.display_description(), "cat");

        let node = CommandNode::literal("cat").describe("");
        assert_eq!(node.display_description(), "cat");

        let node = CommandNode::literal("cat").describe("Manage cats");
        assert_eq!(node.display_description(), "Manage cats");
    }

    #[test]
    fn test_tree_root_lookup() {
        let tree = CommandTree::new(vec![CommandNode::literal("cat"), CommandNode::literal("dog")]);
        assert!(tree.root("dog").is_some());
        assert!(tree.root("bird").is_none());
    }
}
