use crate::argument::ArgumentValue;
use crate::error::{CommandResult, InternalError};
use crate::node::{Command, CommandNode, NodeId, RedirectModifier};
use crate::source::ConsolePolicy;
use crate::suggestion::StringRange;
use indexmap::IndexMap;
use std::any::type_name;
use std::sync::Arc;

#[derive(Clone)]
pub struct ParsedArgument {
    range: StringRange,
    value: ArgumentValue,
}

impl ParsedArgument {
    pub fn new(range: StringRange, value: ArgumentValue) -> Self {
        Self { range, value }
    }

    pub fn range(&self) -> StringRange {
        self.range
    }

    pub fn value(&self) -> &ArgumentValue {
        &self.value
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedNode {
    node: NodeId,
    range: StringRange,
    /// Console policy in effect once this node was entered.
    console: ConsolePolicy,
}

impl ParsedNode {
    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn range(&self) -> StringRange {
        self.range
    }

    pub fn console_policy(&self) -> ConsolePolicy {
        self.console
    }
}

/// An option matched while parsing, kept out of the node path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedOption {
    name: String,
    option: NodeId,
    owner: NodeId,
    name_range: StringRange,
    value_range: StringRange,
}

impl ParsedOption {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn option(&self) -> NodeId {
        self.option
    }

    /// The node the option was matched at.
    pub fn owner(&self) -> NodeId {
        self.owner
    }

    pub fn name_range(&self) -> StringRange {
        self.name_range
    }

    pub fn value_range(&self) -> StringRange {
        self.value_range
    }
}

/// Where completion should look for candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SuggestionTarget {
    /// The children (and options) of `parent`, replacing input from `start`.
    Children {
        parent: NodeId,
        console: ConsolePolicy,
        start: usize,
    },
    /// The value of an option that is being typed.
    OptionValue { option: NodeId, start: usize },
}

/// Accumulates the outcome of parsing one branch.
#[derive(Clone)]
pub struct CommandContextBuilder<S> {
    source: S,
    root: NodeId,
    arguments: IndexMap<String, ParsedArgument>,
    nodes: Vec<ParsedNode>,
    options: Vec<ParsedOption>,
    command: Option<Command<S>>,
    child: Option<Box<CommandContextBuilder<S>>>,
    range: StringRange,
    modifier: Option<RedirectModifier<S>>,
    forks: bool,
    console: ConsolePolicy,
    start_console: ConsolePolicy,
}

impl<S: Clone> CommandContextBuilder<S> {
    pub fn new(source: S, root: NodeId, start: usize) -> Self {
        Self {
            source,
            root,
            arguments: IndexMap::new(),
            nodes: Vec::new(),
            options: Vec::new(),
            command: None,
            child: None,
            range: StringRange::at(start),
            modifier: None,
            forks: false,
            console: ConsolePolicy::Inherit,
            start_console: ConsolePolicy::Inherit,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn range(&self) -> StringRange {
        self.range
    }

    pub fn arguments(&self) -> &IndexMap<String, ParsedArgument> {
        &self.arguments
    }

    pub fn nodes(&self) -> &[ParsedNode] {
        &self.nodes
    }

    pub fn options(&self) -> &[ParsedOption] {
        &self.options
    }

    pub fn command(&self) -> Option<&Command<S>> {
        self.command.as_ref()
    }

    pub fn child(&self) -> Option<&CommandContextBuilder<S>> {
        self.child.as_deref()
    }

    pub fn last_child(&self) -> &CommandContextBuilder<S> {
        let mut result = self;
        while let Some(child) = &result.child {
            result = child;
        }
        result
    }

    pub fn console_policy(&self) -> ConsolePolicy {
        self.console
    }

    pub(crate) fn with_console_policy(mut self, console: ConsolePolicy) -> Self {
        self.console = console;
        self.start_console = console;
        self
    }

    pub(crate) fn has_option(&self, name: &str) -> bool {
        self.options.iter().any(|option| option.name == name)
    }

    pub fn with_argument(&mut self, name: impl Into<String>, argument: ParsedArgument) {
        self.arguments.insert(name.into(), argument);
    }

    pub fn with_command(&mut self, command: Option<Command<S>>) {
        self.command = command;
    }

    /// Appends `node` to the path. The redirect behaviour of the context is
    /// taken from the node.
    pub fn with_node(
        &mut self,
        id: NodeId,
        node: &CommandNode<S>,
        range: StringRange,
        console: ConsolePolicy,
    ) {
        self.nodes.push(ParsedNode { node: id, range, console });
        self.range = StringRange::encompassing(self.range, range);
        self.modifier = node.redirect_modifier().cloned();
        self.forks = node.is_fork();
        self.console = console;
    }

    pub(crate) fn with_option(
        &mut self,
        name: &str,
        option: NodeId,
        owner: NodeId,
        name_range: StringRange,
        value_range: StringRange,
        value: ArgumentValue,
    ) {
        self.arguments
            .insert(name.to_string(), ParsedArgument::new(value_range, value));
        self.options.push(ParsedOption {
            name: name.to_string(),
            option,
            owner,
            name_range,
            value_range,
        });
        self.range = StringRange::encompassing(
            self.range,
            StringRange::between(name_range.start(), value_range.end()),
        );
    }

    pub fn with_child(&mut self, child: CommandContextBuilder<S>) {
        self.child = Some(Box::new(child));
    }

    pub fn build(&self, input: impl Into<Arc<str>>) -> CommandContext<S> {
        self.build_shared(input.into())
    }

    fn build_shared(&self, input: Arc<str>) -> CommandContext<S> {
        CommandContext {
            source: self.source.clone(),
            input: input.clone(),
            arguments: self.arguments.clone(),
            command: self.command.clone(),
            root: self.root,
            nodes: self.nodes.clone(),
            range: self.range,
            child: self
                .child
                .as_ref()
                .map(|child| Box::new(child.build_shared(input))),
            modifier: self.modifier.clone(),
            forks: self.forks,
        }
    }

    pub(crate) fn find_suggestion_context(&self, cursor: usize, input: &str) -> SuggestionTarget {
        let mut parent = self.root;
        let mut console = self.initial_console_policy();

        // The cursor sits in the separator before this context's first token.
        if self.range.start() > cursor {
            return SuggestionTarget::Children {
                parent,
                console,
                start: cursor,
            };
        }

        for option in &self.options {
            let value = option.value_range;
            if value.start() <= cursor && cursor <= value.end() {
                return SuggestionTarget::OptionValue {
                    option: option.option,
                    start: value.start(),
                };
            }
            let name = option.name_range;
            if name.start() <= cursor && cursor <= name.end() {
                return SuggestionTarget::Children {
                    parent: option.owner,
                    console: self.console_at(option.owner),
                    start: name.start(),
                };
            }
        }

        if self.range.end() < cursor {
            if let Some(child) = &self.child {
                return child.find_suggestion_context(cursor, input);
            }
            let end = match self.nodes.last() {
                Some(last) => {
                    parent = last.node;
                    console = last.console;
                    self.options
                        .iter()
                        .map(|option| option.value_range.end())
                        .fold(last.range.end(), usize::max)
                }
                None => self.range.start(),
            };
            let start = input
                .get(end..cursor)
                .and_then(|gap| gap.find(|c: char| !c.is_whitespace()))
                .map_or(cursor, |offset| end + offset);
            return SuggestionTarget::Children {
                parent,
                console,
                start,
            };
        }

        for node in &self.nodes {
            if node.range.start() <= cursor && cursor <= node.range.end() {
                return SuggestionTarget::Children {
                    parent,
                    console,
                    start: node.range.start(),
                };
            }
            parent = node.node;
            console = node.console;
        }
        SuggestionTarget::Children {
            parent,
            console,
            start: self.range.start(),
        }
    }

    /// The policy the context started with, before any of its own nodes.
    fn initial_console_policy(&self) -> ConsolePolicy {
        self.start_console
    }

    fn console_at(&self, node: NodeId) -> ConsolePolicy {
        self.nodes
            .iter()
            .rev()
            .find(|parsed| parsed.node == node)
            .map_or(self.initial_console_policy(), |parsed| parsed.console)
    }
}

/// The finished state of a parse, handed to executors and redirect
/// modifiers.
pub struct CommandContext<S> {
    source: S,
    input: Arc<str>,
    arguments: IndexMap<String, ParsedArgument>,
    command: Option<Command<S>>,
    root: NodeId,
    nodes: Vec<ParsedNode>,
    range: StringRange,
    child: Option<Box<CommandContext<S>>>,
    modifier: Option<RedirectModifier<S>>,
    forks: bool,
}

impl<S: Clone> Clone for CommandContext<S> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            input: self.input.clone(),
            arguments: self.arguments.clone(),
            command: self.command.clone(),
            root: self.root,
            nodes: self.nodes.clone(),
            range: self.range,
            child: self.child.clone(),
            modifier: self.modifier.clone(),
            forks: self.forks,
        }
    }
}

impl<S: Clone> CommandContext<S> {
    /// A copy of this context running for a different source.
    pub fn copy_for(&self, source: S) -> Self {
        let mut copy = self.clone();
        copy.source = source;
        copy
    }
}

impl<S> CommandContext<S> {
    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    /// The value parsed for argument (or option) `name`.
    pub fn argument<T: Clone + 'static>(&self, name: &str) -> CommandResult<T> {
        self.argument_ref(name).cloned()
    }

    pub fn argument_ref<T: 'static>(&self, name: &str) -> CommandResult<&T> {
        let argument = self
            .arguments
            .get(name)
            .ok_or_else(|| InternalError::MissingArgument {
                name: name.to_string(),
            })?;
        let value = argument.value.downcast_ref::<T>().ok_or_else(|| {
            InternalError::WrongArgumentType {
                name: name.to_string(),
                expected: type_name::<T>().to_string(),
            }
        })?;
        Ok(value)
    }

    /// Like [`Self::argument`], but `None` when the argument was not given.
    pub fn optional_argument<T: Clone + 'static>(&self, name: &str) -> CommandResult<Option<T>> {
        if self.has_argument(name) {
            self.argument(name).map(Some)
        } else {
            Ok(None)
        }
    }

    pub fn has_argument(&self, name: &str) -> bool {
        self.arguments.contains_key(name)
    }

    /// The input text an argument was parsed from.
    pub fn raw_argument(&self, name: &str) -> Option<&str> {
        self.arguments
            .get(name)
            .and_then(|argument| self.input.get(argument.range.start()..argument.range.end()))
    }

    pub fn command(&self) -> Option<&Command<S>> {
        self.command.as_ref()
    }

    pub fn child(&self) -> Option<&CommandContext<S>> {
        self.child.as_deref()
    }

    pub fn last_child(&self) -> &CommandContext<S> {
        let mut result = self;
        while let Some(child) = &result.child {
            result = child;
        }
        result
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn nodes(&self) -> &[ParsedNode] {
        &self.nodes
    }

    pub fn has_nodes(&self) -> bool {
        !self.nodes.is_empty()
    }

    pub fn range(&self) -> StringRange {
        self.range
    }

    pub fn redirect_modifier(&self) -> Option<&RedirectModifier<S>> {
        self.modifier.as_ref()
    }

    pub fn is_forked(&self) -> bool {
        self.forks
    }
}
