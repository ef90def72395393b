//! Fluent construction of command nodes.
//!
//! ```ignore
//! dispatcher.register(
//!     literal("ban")
//!         .requires_permission("ban")
//!         .then(
//!             argument("target", word())
//!                 .executes(ban_forever)
//!                 .then(argument("duration", int_range()).executes(ban_for)),
//!         ),
//! );
//! ```
//!
//! Builders are consumed when they are registered; the tree owns the nodes
//! from then on.

use crate::argument::{ArgumentType, ErasedArgumentType};
use crate::context::CommandContext;
use crate::error::CommandResult;
use crate::node::{Command, NodeId, RedirectModifier, Requirement};
use crate::source::ConsolePolicy;
use std::sync::Arc;

pub(crate) enum BuilderKind<S> {
    Literal(String),
    Aliases(Vec<String>),
    Argument {
        name: String,
        arg_type: Arc<dyn ErasedArgumentType<S>>,
    },
    Option {
        name: String,
        arg_type: Arc<dyn ErasedArgumentType<S>>,
    },
}

pub struct ArgumentBuilder<S> {
    pub(crate) kind: BuilderKind<S>,
    pub(crate) children: Vec<ArgumentBuilder<S>>,
    pub(crate) options: Vec<ArgumentBuilder<S>>,
    pub(crate) command: Option<Command<S>>,
    pub(crate) requirement: Option<Requirement<S>>,
    pub(crate) permission: Option<String>,
    pub(crate) console: ConsolePolicy,
    pub(crate) target: Option<NodeId>,
    pub(crate) modifier: Option<RedirectModifier<S>>,
    pub(crate) forks: bool,
}

pub fn literal<S>(name: impl Into<String>) -> ArgumentBuilder<S> {
    ArgumentBuilder::new(BuilderKind::Literal(name.into()))
}

/// A literal registered under several names. Every name gets its own node,
/// all of them sharing the command, gates and children.
///
/// # Panics
///
/// Panics if `names` is empty.
pub fn aliases<S, I>(names: I) -> ArgumentBuilder<S>
where
    I: IntoIterator,
    I::Item: Into<String>,
{
    let names: Vec<String> = names.into_iter().map(Into::into).collect();
    assert!(!names.is_empty(), "An alias literal needs at least one name");
    ArgumentBuilder::new(BuilderKind::Aliases(names))
}

pub fn argument<S, T>(name: impl Into<String>, arg_type: T) -> ArgumentBuilder<S>
where
    T: ArgumentType<S>,
{
    ArgumentBuilder::new(BuilderKind::Argument {
        name: name.into(),
        arg_type: Arc::new(arg_type),
    })
}

/// A named `--name <value>` option. Attach it with
/// [`ArgumentBuilder::with_option`]; it then applies to that node and every
/// node below it.
pub fn option<S, T>(name: impl Into<String>, arg_type: T) -> ArgumentBuilder<S>
where
    T: ArgumentType<S>,
{
    ArgumentBuilder::new(BuilderKind::Option {
        name: name.into(),
        arg_type: Arc::new(arg_type),
    })
}

impl<S> ArgumentBuilder<S> {
    fn new(kind: BuilderKind<S>) -> Self {
        Self {
            kind,
            children: Vec::new(),
            options: Vec::new(),
            command: None,
            requirement: None,
            permission: None,
            console: ConsolePolicy::Inherit,
            target: None,
            modifier: None,
            forks: false,
        }
    }

    /// # Panics
    ///
    /// Panics if this builder already redirects.
    pub fn then(mut self, child: ArgumentBuilder<S>) -> Self {
        assert!(
            self.target.is_none(),
            "Cannot add children to a redirected node"
        );
        self.children.push(child);
        self
    }

    /// # Panics
    ///
    /// Panics if `option` was not created with [`option`].
    pub fn with_option(mut self, option: ArgumentBuilder<S>) -> Self {
        assert!(
            matches!(option.kind, BuilderKind::Option { .. }),
            "with_option expects an option builder"
        );
        self.options.push(option);
        self
    }

    pub fn executes<F>(mut self, command: F) -> Self
    where
        F: Fn(&CommandContext<S>) -> CommandResult<()> + Send + Sync + 'static,
    {
        self.command = Some(Arc::new(command));
        self
    }

    pub fn requires<F>(mut self, requirement: F) -> Self
    where
        F: Fn(&S) -> bool + Send + Sync + 'static,
    {
        self.requirement = Some(Arc::new(requirement));
        self
    }

    pub fn requires_permission(mut self, permission: impl Into<String>) -> Self {
        self.permission = Some(permission.into());
        self
    }

    pub fn console(mut self, policy: ConsolePolicy) -> Self {
        self.console = policy;
        self
    }

    pub fn redirect(self, target: NodeId) -> Self {
        self.forward(target, None, false)
    }

    pub fn redirect_with<F>(self, target: NodeId, modifier: F) -> Self
    where
        F: Fn(&CommandContext<S>) -> CommandResult<Vec<S>> + Send + Sync + 'static,
    {
        self.forward(target, Some(Arc::new(modifier)), false)
    }

    /// Redirects to `target`, running the rest of the command once for every
    /// source `modifier` returns. Failures of individual runs are not
    /// propagated.
    pub fn fork<F>(self, target: NodeId, modifier: F) -> Self
    where
        F: Fn(&CommandContext<S>) -> CommandResult<Vec<S>> + Send + Sync + 'static,
    {
        self.forward(target, Some(Arc::new(modifier)), true)
    }

    /// # Panics
    ///
    /// Panics if this builder already has children.
    pub fn forward(
        mut self,
        target: NodeId,
        modifier: Option<RedirectModifier<S>>,
        fork: bool,
    ) -> Self {
        assert!(
            self.children.is_empty(),
            "Cannot forward a node with children"
        );
        self.target = Some(target);
        self.modifier = modifier;
        self.forks = fork;
        self
    }

    pub fn children(&self) -> &[ArgumentBuilder<S>] {
        &self.children
    }

    pub fn redirect_target(&self) -> Option<NodeId> {
        self.target
    }
}
