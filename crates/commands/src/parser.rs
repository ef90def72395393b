//! Parsing a command line against the tree.
//!
//! Parsing never fails outright. Every branch that could apply is tried and
//! the most successful attempt is kept; [`ParseResults`] records how far it
//! got and why the other branches were rejected.

use crate::context::{CommandContextBuilder, ParsedArgument};
use crate::dispatcher::CommandDispatcher;
use crate::error::{CommandSyntaxError, ErrorKind};
use crate::node::{Denial, NodeId, NodeKind};
use crate::reader::StringReader;
use crate::source::CommandSource;
use crate::suggestion::StringRange;
use indexmap::IndexMap;
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::trace;

/// Why a branch did not make it into the result.
#[derive(Debug, Clone, PartialEq)]
pub enum BranchFailure {
    /// The branch is not available to the source.
    Denied(Denial),
    Syntax(CommandSyntaxError),
}

/// Outcome of attempting a single child.
enum BranchOutcome<S> {
    Matched(ParseResults<S>),
    NotApplicable(Denial),
    SyntaxError(CommandSyntaxError),
}

pub struct ParseResults<S> {
    context: CommandContextBuilder<S>,
    reader: StringReader,
    errors: IndexMap<NodeId, BranchFailure>,
}

impl<S: Clone> Clone for ParseResults<S> {
    fn clone(&self) -> Self {
        Self {
            context: self.context.clone(),
            reader: self.reader.clone(),
            errors: self.errors.clone(),
        }
    }
}

impl<S: Clone> ParseResults<S> {
    pub fn context(&self) -> &CommandContextBuilder<S> {
        &self.context
    }

    /// The reader positioned where parsing stopped.
    pub fn reader(&self) -> &StringReader {
        &self.reader
    }

    pub fn errors(&self) -> &IndexMap<NodeId, BranchFailure> {
        &self.errors
    }

    /// Whether the whole input was consumed.
    pub fn is_complete(&self) -> bool {
        !self.reader.can_read()
    }

    /// The error to report when the input was not fully consumed.
    ///
    /// A single syntax error is reported as is. Without any syntax error, the
    /// first branch that was denied to the source explains the failure.
    /// Otherwise the input is unknown.
    pub fn failure(&self) -> CommandSyntaxError {
        let mut syntax = self.errors.values().filter_map(|failure| match failure {
            BranchFailure::Syntax(err) => Some(err),
            BranchFailure::Denied(_) => None,
        });
        if let (Some(err), None) = (syntax.next(), syntax.next()) {
            return err.clone();
        }

        let has_syntax = self
            .errors
            .values()
            .any(|failure| matches!(failure, BranchFailure::Syntax(_)));
        if !has_syntax {
            let denial = self.errors.values().find_map(|failure| match failure {
                BranchFailure::Denied(denial) => Some(denial.clone()),
                BranchFailure::Syntax(_) => None,
            });
            if let Some(denial) = denial {
                return denial.into_error(&self.reader);
            }
        }

        if self.context.range().is_empty() {
            ErrorKind::UnknownCommand.create_with_context(&self.reader)
        } else {
            ErrorKind::UnknownArgument.create_with_context(&self.reader)
        }
    }

    fn empty(context: CommandContextBuilder<S>, reader: StringReader) -> Self {
        Self {
            context,
            reader,
            errors: IndexMap::new(),
        }
    }

    /// Orders fully consumed results first, then results without errors.
    fn compare(&self, other: &Self) -> Ordering {
        match (self.reader.can_read(), other.reader.can_read()) {
            (false, true) => return Ordering::Less,
            (true, false) => return Ordering::Greater,
            _ => {}
        }
        match (self.errors.is_empty(), other.errors.is_empty()) {
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            _ => Ordering::Equal,
        }
    }
}

impl<S: CommandSource> CommandDispatcher<S> {
    pub fn parse(&self, input: impl Into<Arc<str>>, source: S) -> ParseResults<S> {
        self.parse_reader(StringReader::new(input), source)
    }

    /// Parses from the reader's cursor. Leading whitespace is skipped before
    /// the first token.
    pub fn parse_reader(&self, mut reader: StringReader, source: S) -> ParseResults<S> {
        reader.skip_whitespace();
        let root = self.root();
        let context = CommandContextBuilder::new(source, root, reader.cursor());
        self.parse_nodes(root, &reader, context)
    }

    fn parse_nodes(
        &self,
        node: NodeId,
        original: &StringReader,
        context_so_far: CommandContextBuilder<S>,
    ) -> ParseResults<S> {
        let mut errors = IndexMap::new();
        let mut potentials = Vec::new();
        let mut record = |child: NodeId, outcome: BranchOutcome<S>| -> bool {
            match outcome {
                BranchOutcome::Matched(parse) => {
                    potentials.push(parse);
                    true
                }
                BranchOutcome::NotApplicable(denial) => {
                    errors.insert(child, BranchFailure::Denied(denial));
                    false
                }
                BranchOutcome::SyntaxError(err) => {
                    trace!("Branch {} failed: {}", child, err);
                    errors.insert(child, BranchFailure::Syntax(err));
                    false
                }
            }
        };

        let current = &self.tree[node];
        let token = original.peek_token();

        // A token naming an option is never read as a literal or an argument.
        let option = token
            .strip_prefix("--")
            .and_then(|name| current.options.get(name).copied());

        if let Some(option) = option {
            let outcome = self.parse_option(node, option, original, &context_so_far);
            record(option, outcome);
        } else {
            // A literal matching the token shadows every argument sibling
            // unless it is unavailable to the source.
            let literal_matched = match current.literals.get(token).copied() {
                Some(literal) => {
                    let outcome = self.parse_branch(literal, original, &context_so_far);
                    record(literal, outcome)
                }
                None => false,
            };
            if !literal_matched {
                for &child in &current.arguments {
                    let outcome = self.parse_branch(child, original, &context_so_far);
                    record(child, outcome);
                }
            }
        }

        let best = potentials
            .into_iter()
            .min_by(|a, b| a.compare(b));
        match best {
            Some(best) => best,
            None => ParseResults {
                context: context_so_far,
                reader: original.clone(),
                errors,
            },
        }
    }

    /// Attempts one child at the reader's position. The original reader and
    /// context are left untouched, so a failed branch needs no cleanup.
    fn parse_branch(
        &self,
        child: NodeId,
        original: &StringReader,
        context_so_far: &CommandContextBuilder<S>,
    ) -> BranchOutcome<S> {
        let node = &self.tree[child];
        let mut reader = original.clone();
        let mut context = context_so_far.clone();
        let console = node.console.resolve(context.console_policy());
        // A denied branch is still tried so that malformed input reports the
        // syntax problem rather than the denial.
        let gate = node.check(context.source(), console);

        let start = reader.cursor();
        match &node.kind {
            NodeKind::Literal(name) => {
                if reader.peek_token() != name {
                    return BranchOutcome::SyntaxError(
                        ErrorKind::LiteralIncorrect(name.clone()).create_with_context(&reader),
                    );
                }
                reader.set_cursor(start + name.len());
            }
            NodeKind::Argument { name, arg_type } => match arg_type.parse(&mut reader) {
                Ok(value) => {
                    let range = StringRange::between(start, reader.cursor());
                    context.with_argument(name.clone(), ParsedArgument::new(range, value));
                }
                Err(err) => return BranchOutcome::SyntaxError(err),
            },
            NodeKind::Root | NodeKind::Option { .. } => {
                return BranchOutcome::SyntaxError(ErrorKind::UnknownArgument.create_with_context(&reader));
            }
        }

        if reader.peek().is_some_and(|c| !c.is_whitespace()) {
            return BranchOutcome::SyntaxError(
                ErrorKind::ExpectedArgumentSeparator.create_with_context(&reader),
            );
        }
        if let Err(denial) = gate {
            return BranchOutcome::NotApplicable(denial);
        }

        let range = StringRange::between(start, reader.cursor());
        context.with_node(child, node, range, console);
        context.with_command(node.command.clone());

        let separated = reader.can_read();
        reader.skip_whitespace();

        if let Some(target) = node.redirect {
            if !separated {
                return BranchOutcome::Matched(ParseResults::empty(context, reader));
            }
            let child_context = CommandContextBuilder::new(
                context.source().clone(),
                target,
                reader.cursor(),
            )
            .with_console_policy(console);
            if !reader.can_read() {
                context.with_child(child_context);
                return BranchOutcome::Matched(ParseResults::empty(context, reader));
            }
            let parse = self.parse_nodes(target, &reader, child_context);
            context.with_child(parse.context);
            return BranchOutcome::Matched(ParseResults {
                context,
                reader: parse.reader,
                errors: parse.errors,
            });
        }

        if reader.can_read() {
            BranchOutcome::Matched(self.parse_nodes(child, &reader, context))
        } else {
            BranchOutcome::Matched(ParseResults::empty(context, reader))
        }
    }

    /// Parses `--name <value>` at `owner` and carries on at the same node.
    fn parse_option(
        &self,
        owner: NodeId,
        option: NodeId,
        original: &StringReader,
        context_so_far: &CommandContextBuilder<S>,
    ) -> BranchOutcome<S> {
        let node = &self.tree[option];
        let NodeKind::Option { name, arg_type } = &node.kind else {
            return BranchOutcome::SyntaxError(ErrorKind::UnknownArgument.create_with_context(original));
        };
        let console = node.console.resolve(context_so_far.console_policy());
        if let Err(denial) = node.check(context_so_far.source(), console) {
            return BranchOutcome::NotApplicable(denial);
        }
        if context_so_far.has_option(name) {
            return BranchOutcome::SyntaxError(
                ErrorKind::OptionDuplicate(name.clone()).create_with_context(original),
            );
        }

        let mut reader = original.clone();
        let mut context = context_so_far.clone();
        let name_start = reader.cursor();
        reader.set_cursor(name_start + 2 + name.len());
        let name_range = StringRange::between(name_start, reader.cursor());

        reader.skip_whitespace();
        if !reader.can_read() {
            return BranchOutcome::SyntaxError(
                ErrorKind::OptionExpectedValue(name.clone()).create_with_context(&reader),
            );
        }
        let value_start = reader.cursor();
        let value = match arg_type.parse(&mut reader) {
            Ok(value) => value,
            Err(err) => return BranchOutcome::SyntaxError(err),
        };
        if reader.peek().is_some_and(|c| !c.is_whitespace()) {
            return BranchOutcome::SyntaxError(
                ErrorKind::ExpectedArgumentSeparator.create_with_context(&reader),
            );
        }
        let value_range = StringRange::between(value_start, reader.cursor());
        context.with_option(name, option, owner, name_range, value_range, value);

        reader.skip_whitespace();
        if reader.can_read() {
            BranchOutcome::Matched(self.parse_nodes(owner, &reader, context))
        } else {
            BranchOutcome::Matched(ParseResults::empty(context, reader))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arguments::{integer, word};
    use crate::builder::{argument, literal, option};
    use crate::source::ConsolePolicy;

    #[derive(Clone)]
    struct Player {
        permissions: &'static [&'static str],
        console: bool,
    }

    impl CommandSource for Player {
        fn has_permission(&self, permission: &str) -> bool {
            self.permissions.contains(&permission)
        }

        fn is_console(&self) -> bool {
            self.console
        }
    }

    const ADMIN: Player = Player {
        permissions: &["ban", "stop"],
        console: false,
    };
    const GUEST: Player = Player {
        permissions: &[],
        console: false,
    };
    const CONSOLE: Player = Player {
        permissions: &["ban", "stop"],
        console: true,
    };

    fn dispatcher() -> CommandDispatcher<Player> {
        let mut dispatcher = CommandDispatcher::new();
        dispatcher.register(
            literal("ban")
                .requires_permission("ban")
                .with_option(option("reason", word()))
                .then(argument("target", word()).executes(|_| Ok(()))),
        );
        dispatcher.register(
            literal("give")
                .then(literal("all").executes(|_| Ok(())))
                .then(argument("target", word()).then(argument("amount", integer()).executes(|_| Ok(())))),
        );
        dispatcher.register(
            literal("home")
                .console(ConsolePolicy::Denied)
                .executes(|_| Ok(())),
        );
        dispatcher
    }

    #[test]
    fn parses_full_path() {
        let dispatcher = dispatcher();
        let parse = dispatcher.parse("ban Steve", ADMIN);
        assert!(parse.is_complete());
        let nodes: Vec<_> = parse.context().nodes().iter().map(|n| n.range()).collect();
        assert_eq!(nodes, vec![StringRange::between(0, 3), StringRange::between(4, 9)]);
        assert!(parse.context().command().is_some());
    }

    #[test]
    fn literal_shadows_argument() {
        let dispatcher = dispatcher();
        let parse = dispatcher.parse("give all", GUEST);
        assert!(parse.is_complete());
        let last = parse.context().nodes().last().unwrap().node();
        assert_eq!(Some(last), dispatcher.find_node(&["give", "all"]));

        // "all" never falls through to <target>.
        let parse = dispatcher.parse("give all 5", GUEST);
        assert!(!parse.is_complete());
    }

    #[test]
    fn leading_whitespace_is_skipped() {
        let dispatcher = dispatcher();
        let parse = dispatcher.parse("  give all", GUEST);
        assert!(parse.is_complete());
        let nodes: Vec<_> = parse.context().nodes().iter().map(|n| n.range()).collect();
        assert_eq!(nodes, vec![StringRange::between(2, 6), StringRange::between(7, 10)]);
        assert_eq!(parse.context().range().start(), 2);
    }

    #[test]
    fn missing_separator() {
        let dispatcher = dispatcher();
        let parse = dispatcher.parse("give Steve 5x", GUEST);
        let err = parse.failure();
        assert_eq!(err.kind(), &ErrorKind::ExpectedArgumentSeparator);
        assert_eq!(err.cursor(), Some(12));
    }

    #[test]
    fn denied_literal_reports_permission() {
        let dispatcher = dispatcher();
        let parse = dispatcher.parse("ban Steve", GUEST);
        assert!(!parse.is_complete());
        assert_eq!(
            parse.failure().kind(),
            &ErrorKind::PermissionDenied("ban".to_string())
        );
    }

    #[test]
    fn console_policy_is_enforced() {
        let dispatcher = dispatcher();
        assert!(dispatcher.parse("home", ADMIN).is_complete());
        let parse = dispatcher.parse("home", CONSOLE);
        assert_eq!(parse.failure().kind(), &ErrorKind::ConsoleDenied);
    }

    #[test]
    fn unknown_command_and_argument() {
        let dispatcher = dispatcher();
        assert_eq!(
            dispatcher.parse("nope", ADMIN).failure().kind(),
            &ErrorKind::UnknownCommand
        );
        let err = dispatcher.parse("give Steve five", ADMIN).failure();
        assert_eq!(err.kind(), &ErrorKind::ExpectedInt);
    }

    #[test]
    fn options_are_parsed_anywhere_below_owner() {
        let dispatcher = dispatcher();
        let parse = dispatcher.parse("ban --reason griefing Steve", ADMIN);
        assert!(parse.is_complete());
        let context = parse.context().build("ban --reason griefing Steve");
        assert_eq!(context.argument::<String>("reason").unwrap(), "griefing");
        assert_eq!(context.argument::<String>("target").unwrap(), "Steve");

        let parse = dispatcher.parse("ban Steve --reason x --reason y", ADMIN);
        assert_eq!(
            parse.failure().kind(),
            &ErrorKind::OptionDuplicate("reason".to_string())
        );

        let parse = dispatcher.parse("ban Steve --reason", ADMIN);
        assert_eq!(
            parse.failure().kind(),
            &ErrorKind::OptionExpectedValue("reason".to_string())
        );
    }
}
