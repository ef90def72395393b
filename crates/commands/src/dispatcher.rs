use crate::builder::ArgumentBuilder;
use crate::node::{CommandTree, NodeId};
use rustc_hash::FxHashSet;
use tracing::debug;

/// Owns the command tree and is the entry point for parsing, executing and
/// completing command lines.
pub struct CommandDispatcher<S> {
    pub(crate) tree: CommandTree<S>,
    custom_aliases: Vec<(String, String)>,
}

/// Two sibling nodes that both accept the same input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ambiguity {
    pub parent: NodeId,
    pub child: NodeId,
    pub sibling: NodeId,
    pub inputs: Vec<String>,
}

impl<S> Default for CommandDispatcher<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> CommandDispatcher<S> {
    pub fn new() -> Self {
        Self {
            tree: CommandTree::new(),
            custom_aliases: Vec::new(),
        }
    }

    pub fn tree(&self) -> &CommandTree<S> {
        &self.tree
    }

    pub fn root(&self) -> NodeId {
        self.tree.root()
    }

    /// Adds a top level command and returns its node. For an alias builder
    /// this is the node of the first name.
    pub fn register(&mut self, command: ArgumentBuilder<S>) -> NodeId {
        let root = self.tree.root();
        let ids = self.tree.add(root, command);
        debug!(
            "Registered command {}",
            ids.iter()
                .map(|id| self.tree[*id].name())
                .collect::<Vec<_>>()
                .join("|")
        );
        ids[0]
    }

    /// Adds an option every command registered afterwards accepts.
    pub fn register_option(&mut self, option: ArgumentBuilder<S>) -> NodeId {
        let root = self.tree.root();
        self.tree.add_option(root, option)
    }

    pub fn find_node(&self, path: &[&str]) -> Option<NodeId> {
        self.tree.find_node(path)
    }

    pub fn path_of(&self, node: NodeId) -> Option<Vec<String>> {
        self.tree.path_of(node)
    }

    /// Registers a textual alias. A command line whose first word is `alias`
    /// is rewritten before parsing: if `replacement` contains `{}` the rest of
    /// the line is substituted there, otherwise it is appended.
    pub fn add_custom_alias(&mut self, alias: impl Into<String>, replacement: impl Into<String>) {
        self.custom_aliases.push((alias.into(), replacement.into()));
    }

    pub fn custom_aliases(&self) -> &[(String, String)] {
        &self.custom_aliases
    }

    pub fn expand_custom_aliases(&self, command_line: &str) -> String {
        for (alias, expansion) in &self.custom_aliases {
            let Some(rest) = command_line.strip_prefix(alias.as_str()) else {
                continue;
            };
            if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
                continue;
            }
            let rest = rest.trim_start();
            return if expansion.contains("{}") {
                expansion.replace("{}", rest)
            } else if rest.is_empty() {
                expansion.clone()
            } else {
                format!("{expansion} {rest}")
            };
        }

        command_line.to_string()
    }

    /// Finds sibling nodes where an example input of one is also accepted by
    /// the other.
    pub fn find_ambiguities(&self) -> Vec<Ambiguity> {
        let mut result = Vec::new();
        let mut visited = FxHashSet::default();
        self.collect_ambiguities(self.root(), &mut visited, &mut result);
        result
    }

    fn collect_ambiguities(
        &self,
        node: NodeId,
        visited: &mut FxHashSet<NodeId>,
        result: &mut Vec<Ambiguity>,
    ) {
        if !visited.insert(node) {
            return;
        }
        let children: Vec<NodeId> = self.tree[node].children().collect();
        for &child in &children {
            for &sibling in &children {
                if child == sibling {
                    continue;
                }
                let inputs: Vec<String> = self.tree[child]
                    .examples()
                    .into_iter()
                    .filter(|input| self.tree[sibling].is_valid_input(input))
                    .collect();
                if !inputs.is_empty() {
                    result.push(Ambiguity {
                        parent: node,
                        child,
                        sibling,
                        inputs,
                    });
                }
            }
            self.collect_ambiguities(child, visited, result);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arguments::{integer, word};
    use crate::builder::{argument, literal};

    #[test]
    fn custom_alias_appends_rest() {
        let mut dispatcher = CommandDispatcher::<()>::new();
        dispatcher.add_custom_alias("gmc", "gamemode creative");
        dispatcher.add_custom_alias("tpx", "teleport {} 0 0");
        assert_eq!(dispatcher.expand_custom_aliases("gmc"), "gamemode creative");
        assert_eq!(
            dispatcher.expand_custom_aliases("gmc Steve"),
            "gamemode creative Steve"
        );
        assert_eq!(dispatcher.expand_custom_aliases("tpx Alex"), "teleport Alex 0 0");
        assert_eq!(dispatcher.expand_custom_aliases("gmcx"), "gmcx");
    }

    #[test]
    fn register_returns_node() {
        let mut dispatcher = CommandDispatcher::<()>::new();
        let ban = dispatcher.register(literal("ban").then(argument("target", word())));
        assert_eq!(dispatcher.find_node(&["ban"]), Some(ban));
        assert_eq!(dispatcher.path_of(ban), Some(vec!["ban".to_string()]));
    }

    #[test]
    fn finds_ambiguous_siblings() {
        let mut dispatcher = CommandDispatcher::<()>::new();
        dispatcher.register(
            literal("a")
                .then(argument("word", word()))
                .then(argument("number", integer())),
        );
        dispatcher.register(literal("b").then(literal("0")).then(argument("x", integer())));

        let ambiguities = dispatcher.find_ambiguities();
        let a = dispatcher.find_node(&["a"]).unwrap();
        let b = dispatcher.find_node(&["b"]).unwrap();
        assert!(ambiguities.iter().any(|ambiguity| ambiguity.parent == a
            && ambiguity.child == dispatcher.find_node(&["a", "number"]).unwrap()
            && ambiguity.inputs.contains(&"123".to_string())));
        assert!(ambiguities
            .iter()
            .any(|ambiguity| ambiguity.parent == b && ambiguity.inputs == vec!["0".to_string()]));
    }
}
