//! # Command Compiler
//!
//! Turns generic command trees into Discord's two-level slash command shape:
//! root → optional group → subcommand → variables.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.0.0: Depth and uniformity checks, typed ranges and choices, permission aggregation

use log::{debug, error};

use crate::error::CompileError;
use crate::ir::{ChoiceValue, DiscordCommand, DiscordOption, OptionChoice, Range, SubCommand, Variable};
use crate::options::{DiscordOptionType, OptionRegistry, ValueKind};
use crate::scope::{CommandScope, ScopePredicate, ScopeResolver};
use crate::tree::{Argument, CommandNode, CommandTree, NumericRange, Permission, SenderType};

/// Deepest level a literal may sit at below the root (group → subcommand).
const MAX_DEPTH: usize = 2;

/// Outcome of compiling every eligible root for one scope.
#[derive(Debug, Default)]
pub struct CompileReport {
    pub commands: Vec<DiscordCommand>,
    pub errors: Vec<CompileError>,
}

impl CompileReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct CommandCompiler {
    registry: OptionRegistry,
    resolver: ScopeResolver,
}

impl CommandCompiler {
    pub fn new(registry: OptionRegistry) -> Self {
        CommandCompiler {
            registry,
            resolver: ScopeResolver,
        }
    }

    pub fn registry(&self) -> &OptionRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut OptionRegistry {
        &mut self.registry
    }

    /// Compiles the roots of `tree` whose scope overlaps `scope` and that
    /// `predicate` accepts. The predicate sees every root with readable scope
    /// metadata exactly once, in tree order.
    pub fn compile_for(
        &self,
        tree: &CommandTree,
        scope: &CommandScope,
        predicate: &dyn ScopePredicate,
    ) -> CompileReport {
        let mut report = CompileReport::default();

        for root in &tree.roots {
            let root_scope = match self.resolver.resolve(root) {
                Ok(root_scope) => root_scope,
                Err(err) => {
                    error!("Skipping command `{}`: {}", root.name, err);
                    report.errors.push(err);
                    continue;
                }
            };

            let overlaps = root_scope.overlaps(scope);
            let accepted = predicate.test(root, scope);
            if !overlaps || !accepted {
                debug!(
                    "Command `{}` ({}) not published to {} (overlaps: {}, accepted: {})",
                    root.name, root_scope, scope, overlaps, accepted
                );
                continue;
            }

            match self.compile(root) {
                Ok(command) => report.commands.push(command),
                Err(err) => {
                    error!("Failed to compile command `{}`: {}", root.name, err);
                    report.errors.push(err);
                }
            }
        }

        report
    }

    /// Compiles a single root. No partial output is produced on error.
    pub fn compile(&self, root: &CommandNode) -> Result<DiscordCommand, CompileError> {
        let options = self.compile_children(root, &root.name, 0)?;

        Ok(DiscordCommand {
            name: root.name.clone(),
            description: root.display_description().to_string(),
            options,
            default_member_permissions: aggregate_permissions(root),
        })
    }

    fn compile_children(
        &self,
        parent: &CommandNode,
        path: &str,
        depth: usize,
    ) -> Result<Vec<DiscordOption>, CompileError> {
        let mut options = Vec::with_capacity(parent.children.len());

        for child in &parent.children {
            let child_path = format!("{} {}", path, child.name);
            if child.is_literal() {
                if depth + 1 > MAX_DEPTH {
                    return Err(CompileError::DepthExceeded { path: child_path });
                }
                let sub_options = self.compile_children(child, &child_path, depth + 1)?;
                options.push(DiscordOption::SubCommand(SubCommand {
                    name: child.name.clone(),
                    description: child.display_description().to_string(),
                    options: sub_options,
                }));
            } else {
                options.extend(self.compile_argument_chain(child, path)?);
            }
        }

        ensure_uniform(path, &options)?;
        Ok(options)
    }

    /// Flattens `head` and the arguments chained below it into sibling variables.
    fn compile_argument_chain(
        &self,
        head: &CommandNode,
        parent_path: &str,
    ) -> Result<Vec<DiscordOption>, CompileError> {
        let mut variables = Vec::new();
        let mut current = head;
        let mut path = format!("{} {}", parent_path, head.name);

        loop {
            variables.push(DiscordOption::Variable(self.compile_variable(current, &path)?));

            match current.children.as_slice() {
                [] => break,
                [next] if next.is_literal() => {
                    return Err(CompileError::LiteralAfterArgument {
                        path,
                        literal: next.name.clone(),
                    });
                }
                [next] => {
                    path = format!("{} {}", parent_path, next.name);
                    current = next;
                }
                children => {
                    return Err(CompileError::BranchingArgument {
                        path,
                        count: children.len(),
                    });
                }
            }
        }

        Ok(variables)
    }

    fn compile_variable(&self, node: &CommandNode, path: &str) -> Result<Variable, CompileError> {
        // Only called for argument nodes.
        let argument: &Argument = match &node.argument {
            Some(argument) => argument,
            None => {
                return Err(CompileError::LiteralAfterArgument {
                    path: path.to_string(),
                    literal: node.name.clone(),
                })
            }
        };

        let option_type = self.registry.resolve(&argument.parser, path)?;
        let range = map_range(argument.range, &option_type, path)?;
        let choices = argument
            .choices
            .iter()
            .map(|choice| coerce_choice(choice, &option_type, path))
            .collect::<Result<Vec<_>, _>>()?;

        let autocomplete = match argument.autocomplete {
            Some(true) if !choices.is_empty() => {
                return Err(CompileError::AutocompleteWithChoices {
                    path: path.to_string(),
                })
            }
            Some(true) if !option_type.supports_autocomplete() => {
                return Err(CompileError::PlatformLimit {
                    path: path.to_string(),
                    reason: format!("{} options cannot autocomplete", option_type.name),
                })
            }
            Some(enabled) => enabled,
            None => choices.is_empty() && option_type.supports_autocomplete(),
        };

        Ok(Variable {
            name: node.name.clone(),
            description: node.display_description().to_string(),
            option_type,
            required: argument.required,
            autocomplete,
            range,
            choices,
        })
    }
}

fn ensure_uniform(path: &str, options: &[DiscordOption]) -> Result<(), CompileError> {
    let Some(first) = options.first() else {
        return Ok(());
    };
    let first_is_sub = matches!(first, DiscordOption::SubCommand(_));
    match options
        .iter()
        .find(|option| matches!(option, DiscordOption::SubCommand(_)) != first_is_sub)
    {
        Some(odd) => Err(CompileError::MixedChildren {
            path: path.to_string(),
            node: odd.name().to_string(),
        }),
        None => Ok(()),
    }
}

fn map_range(
    range: Option<NumericRange>,
    option_type: &DiscordOptionType,
    path: &str,
) -> Result<Option<Range>, CompileError> {
    let Some(range) = range else {
        return Ok(None);
    };

    let mapped = match (option_type.kind, range) {
        (ValueKind::Integer, NumericRange::Integer { min, max }) => Range::Integer { min, max },
        (ValueKind::Integer, NumericRange::Float { min, max }) => Range::Integer {
            min: min.trunc() as i64,
            max: max.trunc() as i64,
        },
        (ValueKind::Number, NumericRange::Integer { min, max }) => Range::Number {
            min: min as f64,
            max: max as f64,
        },
        (ValueKind::Number, NumericRange::Float { min, max }) => Range::Number { min, max },
        _ => return Err(CompileError::range_on_non_numeric(path, option_type)),
    };
    Ok(Some(mapped))
}

fn coerce_choice(
    choice: &OptionChoice,
    option_type: &DiscordOptionType,
    path: &str,
) -> Result<OptionChoice, CompileError> {
    let value = match (option_type.kind, &choice.value) {
        (ValueKind::String, ChoiceValue::String(value)) => ChoiceValue::String(value.clone()),
        (ValueKind::Integer, ChoiceValue::Integer(value)) => ChoiceValue::Integer(*value),
        (ValueKind::Integer, ChoiceValue::Number(value)) if value.fract() == 0.0 => {
            ChoiceValue::Integer(*value as i64)
        }
        (ValueKind::Number, ChoiceValue::Integer(value)) => ChoiceValue::Number(*value as f64),
        (ValueKind::Number, ChoiceValue::Number(value)) => ChoiceValue::Number(*value),
        _ => {
            return Err(CompileError::ChoiceTypeMismatch {
                path: path.to_string(),
                choice: choice.name.clone(),
                option_type: option_type.name.to_string(),
            })
        }
    };
    Ok(OptionChoice::new(choice.name.clone(), value))
}

/// ORs together every Discord permission attached to a node under `root`
/// for the root's sender type. `None` means no restriction.
fn aggregate_permissions(root: &CommandNode) -> Option<u64> {
    let target = root.sender_type.clone().unwrap_or(SenderType::ANY);
    let mut aggregate = None;
    collect_permissions(root, &target, &mut aggregate);
    aggregate
}

fn collect_permissions(node: &CommandNode, target: &SenderType, aggregate: &mut Option<u64>) {
    let permission = node
        .permissions
        .get(target)
        .or_else(|| node.permissions.get(&SenderType::ANY));
    if let Some(Permission::Discord(bits)) = permission {
        *aggregate = Some(aggregate.unwrap_or(0) | bits);
    }
    for child in &node.children {
        collect_permissions(child, target, aggregate);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::parsers;
    use crate::scope::AlwaysTrue;
    use crate::tree::Argument;

    fn compiler() -> CommandCompiler {
        CommandCompiler::new(OptionRegistry::standard())
    }

    fn arg(name: &str, parser: crate::tree::ParserId) -> CommandNode {
        CommandNode::argument(name, Argument::new(parser))
    }

    fn variable(option: &DiscordOption) -> &Variable {
        match option {
            DiscordOption::Variable(variable) => variable,
            DiscordOption::SubCommand(sub) => panic!("expected variable, got subcommand {}", sub.name),
        }
    }

    fn subcommand(option: &DiscordOption) -> &SubCommand {
        match option {
            DiscordOption::SubCommand(sub) => sub,
            DiscordOption::Variable(variable) => panic!("expected subcommand, got {}", variable.name),
        }
    }

    #[test]
    fn test_command_creation() {
        let root = CommandNode::literal("command")
            .describe("Command Description")
            .child(
                CommandNode::literal("foo").argument_chain([
                    CommandNode::argument(
                        "integer",
                        Argument::new(parsers::INTEGER).range(NumericRange::Integer { min: 1, max: 10 }),
                    )
                    .describe("Integer Argument"),
                    CommandNode::argument("boolean", Argument::new(parsers::BOOLEAN).optional()),
                ]),
            )
            .child(CommandNode::literal("bar").child(CommandNode::argument(
                "string",
                Argument::new(parsers::STRING).choices(OptionChoice::strings(["cat", "dog"])),
            )));

        let command = compiler().compile(&root).unwrap();
        assert_eq!(command.name, "command");
        assert_eq!(command.description, "Command Description");
        assert_eq!(command.options.len(), 2);

        let foo = subcommand(&command.options[0]);
        assert_eq!(foo.name, "foo");
        assert_eq!(foo.description, "foo");
        assert_eq!(foo.options.len(), 2);
        let integer = variable(&foo.options[0]);
        assert_eq!(integer.description, "Integer Argument");
        assert_eq!(integer.option_type, DiscordOptionType::INTEGER);
        assert!(integer.required);
        assert!(integer.autocomplete);
        assert_eq!(integer.range, Some(Range::Integer { min: 1, max: 10 }));
        let boolean = variable(&foo.options[1]);
        assert_eq!(boolean.option_type, DiscordOptionType::BOOLEAN);
        assert!(!boolean.required);
        assert!(!boolean.autocomplete);

        let bar = subcommand(&command.options[1]);
        let string = variable(&bar.options[0]);
        assert!(!string.autocomplete);
        assert_eq!(string.choices, OptionChoice::strings(["cat", "dog"]));
    }

    #[test]
    fn test_subcommand_group() {
        let root = CommandNode::literal("command").child(
            CommandNode::literal("group")
                .child(CommandNode::literal("foo"))
                .child(CommandNode::literal("bar")),
        );

        let command = compiler().compile(&root).unwrap();
        assert_eq!(command.options.len(), 1);
        assert_eq!(command.options[0].option_type(), DiscordOptionType::SUB_COMMAND_GROUP);
        let group = subcommand(&command.options[0]);
        let names: Vec<&str> = group.options.iter().map(|o| o.name()).collect();
        assert_eq!(names, vec!["foo", "bar"]);
        assert!(group.options.iter().all(|o| o.option_type() == DiscordOptionType::SUB_COMMAND));
    }

    #[test]
    fn test_root_variables_directly() {
        let root = CommandNode::literal("echo").argument_chain([arg("text", parsers::STRING)]);
        let command = compiler().compile(&root).unwrap();
        assert_eq!(command.options.len(), 1);
        assert_eq!(variable(&command.options[0]).name, "text");
    }

    #[test]
    fn test_depth_exceeded_fails_without_partial_output() {
        let root = CommandNode::literal("a").child(
            CommandNode::literal("b").child(CommandNode::literal("c").child(CommandNode::literal("d"))),
        );

        let err = compiler().compile(&root).unwrap_err();
        assert_eq!(err, CompileError::DepthExceeded { path: "a b c d".to_string() });

        let tree = CommandTree::new(vec![root, CommandNode::literal("ping")]);
        let report = compiler().compile_for(&tree, &CommandScope::Global, &AlwaysTrue);
        assert_eq!(report.commands.len(), 1);
        assert_eq!(report.commands[0].name, "ping");
        assert_eq!(report.errors.len(), 1);
    }

    #[test]
    fn test_depth_two_with_variables_is_allowed() {
        let root = CommandNode::literal("cat").child(
            CommandNode::literal("owner")
                .child(CommandNode::literal("set").argument_chain([arg("name", parsers::STRING)])),
        );
        assert!(compiler().compile(&root).is_ok());
    }

    #[test]
    fn test_mixed_children_fail() {
        let root = CommandNode::literal("cat").child(
            CommandNode::literal("add")
                .child(CommandNode::literal("quick"))
                .child(arg("name", parsers::STRING)),
        );

        let err = compiler().compile(&root).unwrap_err();
        assert_eq!(
            err,
            CompileError::MixedChildren {
                path: "cat add".to_string(),
                node: "name".to_string(),
            }
        );
    }

    #[test]
    fn test_mixed_children_at_root_fail() {
        let root = CommandNode::literal("cat")
            .child(arg("name", parsers::STRING))
            .child(CommandNode::literal("list"));
        let err = compiler().compile(&root).unwrap_err();
        assert!(matches!(err, CompileError::MixedChildren { node, .. } if node == "list"));
    }

    #[test]
    fn test_autocomplete_with_choices_fails() {
        let root = CommandNode::literal("pick").child(CommandNode::argument(
            "animal",
            Argument::new(parsers::STRING)
                .autocomplete(true)
                .choices(OptionChoice::strings(["cat"])),
        ));
        let err = compiler().compile(&root).unwrap_err();
        assert_eq!(
            err,
            CompileError::AutocompleteWithChoices { path: "pick animal".to_string() }
        );
    }

    #[test]
    fn test_explicit_autocomplete_off() {
        let root = CommandNode::literal("say")
            .child(CommandNode::argument("text", Argument::new(parsers::STRING).autocomplete(false)));
        let command = compiler().compile(&root).unwrap();
        assert!(!variable(&command.options[0]).autocomplete);
    }

    #[test]
    fn test_unmapped_type_is_reported() {
        let root = CommandNode::literal("ban").child(arg("target", parsers::USER));
        let err = compiler().compile(&root).unwrap_err();
        assert!(matches!(err, CompileError::UnmappedType { path, .. } if path == "ban target"));
    }

    #[test]
    fn test_range_follows_option_type() {
        let root = CommandNode::literal("math")
            .argument_chain([
                CommandNode::argument(
                    "count",
                    Argument::new(parsers::INTEGER).range(NumericRange::Float { min: 1.7, max: 9.2 }),
                ),
                CommandNode::argument(
                    "ratio",
                    Argument::new(parsers::NUMBER).range(NumericRange::Integer { min: -2, max: 5 }),
                ),
                CommandNode::argument(
                    "scale",
                    Argument::new(parsers::NUMBER).range(NumericRange::Float { min: 0.25, max: 0.75 }),
                ),
            ]);

        let command = compiler().compile(&root).unwrap();
        assert_eq!(variable(&command.options[0]).range, Some(Range::Integer { min: 1, max: 9 }));
        assert_eq!(variable(&command.options[1]).range, Some(Range::Number { min: -2.0, max: 5.0 }));
        assert_eq!(variable(&command.options[2]).range, Some(Range::Number { min: 0.25, max: 0.75 }));
    }

    #[test]
    fn test_range_on_string_fails() {
        let root = CommandNode::literal("say").child(CommandNode::argument(
            "text",
            Argument::new(parsers::STRING).range(NumericRange::Integer { min: 1, max: 2 }),
        ));
        assert!(matches!(
            compiler().compile(&root),
            Err(CompileError::RangeOnNonNumeric { .. })
        ));
    }

    #[test]
    fn test_choice_coercion() {
        let root = CommandNode::literal("roll").argument_chain([
            CommandNode::argument(
                "sides",
                Argument::new(parsers::INTEGER).choices([OptionChoice::number(6.0)]),
            ),
            CommandNode::argument(
                "weight",
                Argument::new(parsers::NUMBER).choices([OptionChoice::integer(2)]),
            ),
        ]);
        let command = compiler().compile(&root).unwrap();
        assert_eq!(variable(&command.options[0]).choices[0].value, ChoiceValue::Integer(6));
        assert_eq!(variable(&command.options[1]).choices[0].value, ChoiceValue::Number(2.0));

        let root = CommandNode::literal("roll").child(CommandNode::argument(
            "sides",
            Argument::new(parsers::INTEGER).choices([OptionChoice::string("six")]),
        ));
        assert!(matches!(
            compiler().compile(&root),
            Err(CompileError::ChoiceTypeMismatch { .. })
        ));
    }

    #[test]
    fn test_literal_after_argument_fails() {
        let root = CommandNode::literal("cat")
            .child(arg("name", parsers::STRING).child(CommandNode::literal("delete")));
        assert!(matches!(
            compiler().compile(&root),
            Err(CompileError::LiteralAfterArgument { literal, .. }) if literal == "delete"
        ));
    }

    #[test]
    fn test_branching_argument_fails() {
        let root = CommandNode::literal("cat").child(
            arg("name", parsers::STRING)
                .child(arg("age", parsers::INTEGER))
                .child(arg("color", parsers::STRING)),
        );
        assert!(matches!(
            compiler().compile(&root),
            Err(CompileError::BranchingArgument { count: 2, .. })
        ));
    }

    #[test]
    fn test_permission_aggregation() {
        let member = SenderType::new("member");
        let root = CommandNode::literal("mod")
            .sender_type(member.clone())
            .child(
                CommandNode::literal("kick").permission(member.clone(), Permission::Discord(0b0010)),
            )
            .child(
                CommandNode::literal("ban").permission(SenderType::ANY, Permission::Discord(0b0100)),
            )
            .child(
                CommandNode::literal("note")
                    .permission(member.clone(), Permission::Named("mod.note".to_string()))
                    .permission(SenderType::new("console"), Permission::Discord(0b1000)),
            );

        let command = compiler().compile(&root).unwrap();
        assert_eq!(command.default_member_permissions, Some(0b0110));
    }

    #[test]
    fn test_no_permissions_means_no_restriction() {
        let root = CommandNode::literal("ping");
        assert_eq!(compiler().compile(&root).unwrap().default_member_permissions, None);
    }

    #[test]
    fn test_compile_for_respects_scope_and_predicate() {
        let scoped = CommandNode::literal("cat").with_scope(&CommandScope::guilds([5]).unwrap());
        let tree = CommandTree::new(vec![scoped]);
        let target = CommandScope::guilds([5]).unwrap();

        let report = compiler().compile_for(&tree, &target, &AlwaysTrue);
        assert_eq!(report.commands.len(), 1);
        assert!(report.is_clean());

        let reject = |_: &CommandNode, _: &CommandScope| false;
        let report = compiler().compile_for(&tree, &target, &reject);
        assert!(report.commands.is_empty());
        assert!(report.is_clean());

        let other = CommandScope::guilds([6]).unwrap();
        assert!(compiler().compile_for(&tree, &other, &AlwaysTrue).commands.is_empty());
    }

    #[test]
    fn test_predicate_called_once_per_root() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let calls = AtomicUsize::new(0);
        let counting = |_: &CommandNode, _: &CommandScope| {
            calls.fetch_add(1, Ordering::SeqCst);
            true
        };
        let tree = CommandTree::new(vec![
            CommandNode::literal("a"),
            CommandNode::literal("b").with_scope(&CommandScope::guilds([1]).unwrap()),
            CommandNode::literal("c"),
        ]);

        let report = compiler().compile_for(&tree, &CommandScope::guilds([2]).unwrap(), &counting);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        let names: Vec<&str> = report.commands.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["a", "c"]);
    }

    #[test]
    fn test_guild_publish_skips_other_guilds_roots() {
        let tree = CommandTree::new(vec![
            CommandNode::literal("secret").with_scope(&CommandScope::guilds([1]).unwrap()),
            CommandNode::literal("shared").with_scope(&CommandScope::any_guild()),
            CommandNode::literal("local").with_scope(&CommandScope::guilds([5]).unwrap()),
        ]);

        let report = compiler().compile_for(&tree, &CommandScope::guild_target(5), &AlwaysTrue);
        let names: Vec<&str> = report.commands.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["shared", "local"]);
    }
}
