use crate::argument::ErasedArgumentType;
use crate::builder::{ArgumentBuilder, BuilderKind};
use crate::context::CommandContext;
use crate::error::{CommandResult, CommandSyntaxError, ErrorKind};
use crate::reader::StringReader;
use crate::source::{CommandSource, ConsolePolicy};
use crate::suggestion::{Suggestions, SuggestionFuture, SuggestionsBuilder};
use futures::future::{self, FutureExt};
use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use std::fmt;
use std::ops::Index;
use std::sync::Arc;
use tracing::debug;

pub type Command<S> = Arc<dyn Fn(&CommandContext<S>) -> CommandResult<()> + Send + Sync>;
pub type Requirement<S> = Arc<dyn Fn(&S) -> bool + Send + Sync>;
/// Turns the context matched so far into the sources the redirected part of
/// the command runs for. Returning several sources fans the command out.
pub type RedirectModifier<S> =
    Arc<dyn Fn(&CommandContext<S>) -> CommandResult<Vec<S>> + Send + Sync>;

/// Stable handle of a node inside a [`CommandTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

pub enum NodeKind<S> {
    Root,
    Literal(String),
    Argument {
        name: String,
        arg_type: Arc<dyn ErasedArgumentType<S>>,
    },
    Option {
        name: String,
        arg_type: Arc<dyn ErasedArgumentType<S>>,
    },
}

/// Why a node does not apply to an actor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Denial {
    Requirement,
    Permission(String),
    Console,
}

impl Denial {
    pub fn into_error(self, reader: &StringReader) -> CommandSyntaxError {
        let kind = match self {
            Denial::Requirement => ErrorKind::RequirementNotMet,
            Denial::Permission(permission) => ErrorKind::PermissionDenied(permission),
            Denial::Console => ErrorKind::ConsoleDenied,
        };
        kind.create_with_context(reader)
    }
}

pub struct CommandNode<S> {
    pub(crate) kind: NodeKind<S>,
    pub(crate) children: IndexMap<String, NodeId>,
    pub(crate) literals: FxHashMap<String, NodeId>,
    pub(crate) arguments: Vec<NodeId>,
    pub(crate) options: IndexMap<String, NodeId>,
    pub(crate) command: Option<Command<S>>,
    pub(crate) requirement: Option<Requirement<S>>,
    pub(crate) permission: Option<String>,
    pub(crate) console: ConsolePolicy,
    pub(crate) redirect: Option<NodeId>,
    pub(crate) modifier: Option<RedirectModifier<S>>,
    pub(crate) forks: bool,
}

impl<S> CommandNode<S> {
    fn new(kind: NodeKind<S>) -> Self {
        Self {
            kind,
            children: IndexMap::new(),
            literals: FxHashMap::default(),
            arguments: Vec::new(),
            options: IndexMap::new(),
            command: None,
            requirement: None,
            permission: None,
            console: ConsolePolicy::Inherit,
            redirect: None,
            modifier: None,
            forks: false,
        }
    }

    pub fn kind(&self) -> &NodeKind<S> {
        &self.kind
    }

    /// The key this node is stored under in its parent.
    pub fn name(&self) -> &str {
        match &self.kind {
            NodeKind::Root => "",
            NodeKind::Literal(name) => name,
            NodeKind::Argument { name, .. } | NodeKind::Option { name, .. } => name,
        }
    }

    pub fn usage_text(&self) -> String {
        match &self.kind {
            NodeKind::Root => String::new(),
            NodeKind::Literal(name) => name.clone(),
            NodeKind::Argument { name, .. } => format!("<{name}>"),
            NodeKind::Option { name, .. } => format!("--{name} <{name}>"),
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(self.kind, NodeKind::Literal(_))
    }

    pub fn children(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.children.values().copied()
    }

    pub fn child(&self, name: &str) -> Option<NodeId> {
        self.children.get(name).copied()
    }

    pub fn options(&self) -> impl Iterator<Item = (&str, NodeId)> + '_ {
        self.options.iter().map(|(name, id)| (name.as_str(), *id))
    }

    pub fn command(&self) -> Option<&Command<S>> {
        self.command.as_ref()
    }

    pub fn has_command(&self) -> bool {
        self.command.is_some()
    }

    pub fn redirect(&self) -> Option<NodeId> {
        self.redirect
    }

    pub fn redirect_modifier(&self) -> Option<&RedirectModifier<S>> {
        self.modifier.as_ref()
    }

    pub fn is_fork(&self) -> bool {
        self.forks
    }

    pub fn permission(&self) -> Option<&str> {
        self.permission.as_deref()
    }

    pub fn console_policy(&self) -> ConsolePolicy {
        self.console
    }

    pub(crate) fn arg_type(&self) -> Option<&Arc<dyn ErasedArgumentType<S>>> {
        match &self.kind {
            NodeKind::Argument { arg_type, .. } | NodeKind::Option { arg_type, .. } => {
                Some(arg_type)
            }
            _ => None,
        }
    }

    pub fn examples(&self) -> Vec<String> {
        match &self.kind {
            NodeKind::Root => Vec::new(),
            NodeKind::Literal(name) => vec![name.clone()],
            NodeKind::Argument { arg_type, .. } | NodeKind::Option { arg_type, .. } => {
                arg_type.examples().iter().map(|s| s.to_string()).collect()
            }
        }
    }

    /// Whether `input` on its own would be accepted by this node.
    pub fn is_valid_input(&self, input: &str) -> bool {
        let mut reader = StringReader::new(input);
        match &self.kind {
            NodeKind::Root => false,
            NodeKind::Literal(name) => reader.peek_token() == name,
            NodeKind::Argument { arg_type, .. } | NodeKind::Option { arg_type, .. } => {
                arg_type.parse(&mut reader).is_ok()
                    && reader.peek().is_none_or(char::is_whitespace)
            }
        }
    }

    pub(crate) fn list_suggestions(
        &self,
        context: &CommandContext<S>,
        mut builder: SuggestionsBuilder,
    ) -> SuggestionFuture {
        match &self.kind {
            NodeKind::Root => future::ready(Suggestions::empty()).boxed(),
            NodeKind::Literal(name) => {
                if name.to_lowercase().starts_with(builder.remaining_lowercase()) {
                    builder.suggest(name.clone());
                }
                builder.build_future()
            }
            NodeKind::Argument { arg_type, .. } | NodeKind::Option { arg_type, .. } => {
                arg_type.list_suggestions(context, builder)
            }
        }
    }
}

impl<S: CommandSource> CommandNode<S> {
    /// Checks the gates of this node. `console` is the policy in effect once
    /// this node's own policy has been applied.
    pub fn check(&self, source: &S, console: ConsolePolicy) -> Result<(), Denial> {
        if let Some(requirement) = &self.requirement {
            if !requirement(source) {
                return Err(Denial::Requirement);
            }
        }
        if let Some(permission) = &self.permission {
            if !source.has_permission(permission) {
                return Err(Denial::Permission(permission.clone()));
            }
        }
        if console == ConsolePolicy::Denied && source.is_console() {
            return Err(Denial::Console);
        }
        Ok(())
    }

    pub fn can_use(&self, source: &S, inherited: ConsolePolicy) -> bool {
        self.check(source, self.console.resolve(inherited)).is_ok()
    }
}

/// Arena holding every node of a command graph. Node 0 is the root.
///
/// Nodes are only ever added, so a [`NodeId`] stays valid for the lifetime
/// of the tree. Redirects are plain ids and may point anywhere, including
/// at an ancestor.
pub struct CommandTree<S> {
    nodes: Vec<CommandNode<S>>,
}

impl<S> Default for CommandTree<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> CommandTree<S> {
    pub fn new() -> Self {
        Self {
            nodes: vec![CommandNode::new(NodeKind::Root)],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn get(&self, id: NodeId) -> Option<&CommandNode<S>> {
        self.nodes.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn find_node(&self, path: &[&str]) -> Option<NodeId> {
        path.iter()
            .try_fold(self.root(), |node, name| self[node].child(name))
    }

    /// The names leading from the root to `target`, not following redirects.
    pub fn path_of(&self, target: NodeId) -> Option<Vec<String>> {
        fn walk<S>(
            tree: &CommandTree<S>,
            node: NodeId,
            target: NodeId,
            path: &mut Vec<String>,
        ) -> bool {
            if node == target {
                return true;
            }
            for child in tree[node].children() {
                path.push(tree[child].name().to_string());
                if walk(tree, child, target, path) {
                    return true;
                }
                path.pop();
            }
            false
        }

        let mut path = Vec::new();
        walk(self, self.root(), target, &mut path).then_some(path)
    }

    fn push(&mut self, node: CommandNode<S>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    fn attach(&mut self, parent: NodeId, name: String, child: NodeId) {
        let is_literal = self[child].is_literal();
        let parent = &mut self.nodes[parent.0];
        parent.children.insert(name.clone(), child);
        if is_literal {
            parent.literals.insert(name, child);
        } else {
            parent.arguments.push(child);
        }
    }

    /// Materialises `builder` under `parent` and returns the ids of the nodes
    /// it produced (one per alias).
    ///
    /// A literal that already exists under `parent` is merged: its command is
    /// replaced if the builder has one and the builder's children are added to
    /// it.
    ///
    /// # Panics
    ///
    /// Panics on a grammar that cannot be represented: merging children into a
    /// redirected node, redirecting a node that has children, a redirect to a
    /// node that does not exist, or building an option as a child.
    pub fn add(&mut self, parent: NodeId, builder: ArgumentBuilder<S>) -> Vec<NodeId> {
        let ArgumentBuilder {
            kind,
            children,
            options,
            command,
            requirement,
            permission,
            console,
            target,
            modifier,
            forks,
        } = builder;

        if let Some(target) = target {
            assert!(
                target.0 < self.nodes.len(),
                "Redirect target {target} does not exist"
            );
        }

        let (names, arg_type) = match kind {
            BuilderKind::Literal(name) => (vec![name], None),
            BuilderKind::Aliases(names) => (names, None),
            BuilderKind::Argument { name, arg_type } => (vec![name], Some(arg_type)),
            BuilderKind::Option { name, .. } => {
                panic!("Option '--{name}' must be attached with `with_option`, not `then`")
            }
        };

        let mut built: Vec<NodeId> = Vec::with_capacity(names.len());
        for name in names {
            let id = match self[parent].child(&name) {
                Some(existing) => {
                    debug!("Merging command node '{}' into {}", name, existing);
                    let node = &mut self.nodes[existing.0];
                    assert!(
                        node.redirect.is_none() || children.is_empty(),
                        "Cannot add children to redirected node '{name}'"
                    );
                    assert!(
                        target.is_none() || node.children.is_empty(),
                        "Cannot redirect node '{name}' which already has children"
                    );
                    if command.is_some() {
                        node.command = command.clone();
                    }
                    if target.is_some() {
                        node.redirect = target;
                        node.modifier = modifier.clone();
                        node.forks = forks;
                    }
                    existing
                }
                None => {
                    let kind = match &arg_type {
                        Some(arg_type) => NodeKind::Argument {
                            name: name.clone(),
                            arg_type: arg_type.clone(),
                        },
                        None => NodeKind::Literal(name.clone()),
                    };
                    let mut node = CommandNode::new(kind);
                    node.options = self[parent].options.clone();
                    node.command = command.clone();
                    node.requirement = requirement.clone();
                    node.permission = permission.clone();
                    node.console = console;
                    node.redirect = target;
                    node.modifier = modifier.clone();
                    node.forks = forks;
                    let id = self.push(node);
                    self.attach(parent, name, id);
                    id
                }
            };
            built.push(id);
        }

        let Some((&first, rest)) = built.split_first() else {
            return built;
        };

        for option in options {
            self.add_option(first, option);
        }
        for child in children {
            self.add(first, child);
        }

        // Aliases share the first node's children and options.
        let (children, literals, arguments, options) = {
            let node = &self[first];
            (
                node.children.clone(),
                node.literals.clone(),
                node.arguments.clone(),
                node.options.clone(),
            )
        };
        for &alias in rest {
            let node = &mut self.nodes[alias.0];
            node.children.extend(children.iter().map(|(k, v)| (k.clone(), *v)));
            node.literals.extend(literals.iter().map(|(k, v)| (k.clone(), *v)));
            node.arguments.extend(arguments.iter().copied());
            node.options.extend(options.iter().map(|(k, v)| (k.clone(), *v)));
        }

        built
    }

    /// Attaches an option to `node`. Nodes built below `node` afterwards
    /// inherit it.
    ///
    /// # Panics
    ///
    /// Panics if `builder` was not created with [`crate::builder::option`], or
    /// if it has children or a redirect.
    pub fn add_option(&mut self, node: NodeId, builder: ArgumentBuilder<S>) -> NodeId {
        let ArgumentBuilder {
            kind,
            children,
            requirement,
            permission,
            console,
            target,
            ..
        } = builder;
        let BuilderKind::Option { name, arg_type } = kind else {
            panic!("Only option builders can be attached as options");
        };
        assert!(
            children.is_empty() && target.is_none(),
            "Option '--{name}' cannot have children or a redirect"
        );
        let mut option = CommandNode::new(NodeKind::Option {
            name: name.clone(),
            arg_type,
        });
        option.requirement = requirement;
        option.permission = permission;
        option.console = console;
        let id = self.push(option);
        self.nodes[node.0].options.insert(name, id);
        id
    }
}

impl<S> Index<NodeId> for CommandTree<S> {
    type Output = CommandNode<S>;

    fn index(&self, id: NodeId) -> &CommandNode<S> {
        &self.nodes[id.0]
    }
}
