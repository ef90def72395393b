/// The actor a command line is parsed and executed for.
///
/// The engine only ever asks these two questions while walking the tree; the
/// permission backend behind them is up to the implementor.
pub trait CommandSource: Clone + 'static {
    fn has_permission(&self, permission: &str) -> bool;

    fn is_console(&self) -> bool;
}

/// Whether a node may be used by the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConsolePolicy {
    Allowed,
    Denied,
    /// Use whatever the closest ancestor on the parse path decided.
    #[default]
    Inherit,
}

impl ConsolePolicy {
    /// Resolves `self` against the policy in effect for the parent.
    pub fn resolve(self, inherited: ConsolePolicy) -> ConsolePolicy {
        match self {
            ConsolePolicy::Inherit => inherited,
            policy => policy,
        }
    }
}
