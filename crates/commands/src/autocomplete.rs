//! Completion suggestions and the exported view of the tree clients use to
//! complete locally.

use crate::context::SuggestionTarget;
use crate::dispatcher::CommandDispatcher;
use crate::node::{NodeId, NodeKind};
use crate::parser::ParseResults;
use crate::source::{CommandSource, ConsolePolicy};
use crate::suggestion::{SuggestionFuture, Suggestions, SuggestionsBuilder};
use bitflags::bitflags;
use futures::future::{self, FutureExt};
use rustc_hash::FxHashMap;
use serde::Serialize;
use tracing::{debug, warn};

bitflags! {
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    pub struct CommandFlags: u8 {
        const ROOT = 0x0;
        const LITERAL = 0x1;
        const ARGUMENT = 0x2;
        const EXECUTABLE = 0x4;
        const REDIRECT = 0x8;
        const OPTION = 0x10;
    }
}

/// A node of the exported tree. Nodes refer to each other by their index in
/// the exported list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeclaredNode {
    pub flags: u8,
    pub children: Vec<usize>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parser: Option<&'static str>,
}

impl DeclaredNode {
    pub fn flags(&self) -> CommandFlags {
        CommandFlags::from_bits_truncate(self.flags)
    }
}

impl<S: CommandSource> CommandDispatcher<S> {
    pub fn completion_suggestions(&self, parse: &ParseResults<S>) -> SuggestionFuture {
        self.completion_suggestions_at(parse, parse.reader().total_length())
    }

    /// Suggestions for the token under `cursor`. Only branches the source may
    /// use are consulted.
    pub fn completion_suggestions_at(
        &self,
        parse: &ParseResults<S>,
        cursor: usize,
    ) -> SuggestionFuture {
        let full_input = parse.reader().string();
        let mut cursor = cursor.min(full_input.len());
        while !full_input.is_char_boundary(cursor) {
            cursor -= 1;
        }
        let truncated = &full_input[..cursor];
        let truncated_lowercase = truncated.to_lowercase();

        let context = parse.context();
        let source = context.source();
        let built = context.build(truncated);
        let builder = |start: usize| {
            SuggestionsBuilder::with_lowercase(
                truncated.to_string(),
                truncated_lowercase.clone(),
                start,
            )
        };

        let mut futures = Vec::new();
        match context.find_suggestion_context(cursor, full_input) {
            SuggestionTarget::OptionValue { option, start } => {
                futures.push(self.tree[option].list_suggestions(&built, builder(start)));
            }
            SuggestionTarget::Children {
                parent,
                console,
                start,
            } => {
                if let Some((option, value_start)) =
                    self.pending_option(parent, truncated, start, source, console)
                {
                    futures.push(self.tree[option].list_suggestions(&built, builder(value_start)));
                    return Self::merge_future(truncated, futures);
                }

                let node = &self.tree[parent];
                for child in node.children() {
                    let child = &self.tree[child];
                    if !child.can_use(source, console) {
                        continue;
                    }
                    futures.push(child.list_suggestions(&built, builder(start)));
                }

                let mut options = builder(start);
                if options.remaining().starts_with('-') {
                    for (name, option) in node.options() {
                        let used = context
                            .last_child()
                            .options()
                            .iter()
                            .any(|parsed| parsed.name() == name);
                        if !used && self.tree[option].can_use(source, console) {
                            options.suggest_matching([format!("--{name}")]);
                        }
                    }
                }
                futures.push(options.build_future());
            }
        }

        Self::merge_future(truncated, futures)
    }

    fn merge_future(input: &str, futures: Vec<SuggestionFuture>) -> SuggestionFuture {
        let command = input.to_string();
        async move {
            let results = future::join_all(futures).await;
            Suggestions::merge(&command, &results)
        }
        .boxed()
    }

    /// Detects an option name followed by whitespace at `start` whose value
    /// did not parse, so completion can offer values for it.
    fn pending_option(
        &self,
        parent: NodeId,
        input: &str,
        start: usize,
        source: &S,
        console: ConsolePolicy,
    ) -> Option<(NodeId, usize)> {
        let rest = input.get(start..)?;
        let name_end = rest.find(char::is_whitespace)?;
        let name = rest[..name_end].strip_prefix("--")?;
        let option = self.tree[parent].options.get(name).copied()?;
        if !self.tree[option].can_use(source, console) {
            return None;
        }
        let value = rest[name_end..].trim_start();
        if value.contains(char::is_whitespace) {
            return None;
        }
        Some((option, input.len() - value.len()))
    }

    /// Exports the part of the tree `source` may use, including custom
    /// aliases as redirecting literals. The root is always the first node.
    pub fn declare(&self, source: &S) -> Vec<DeclaredNode> {
        let mut nodes = Vec::new();
        let mut node_map = FxHashMap::default();
        let root_index =
            self.declare_node(&mut nodes, &mut node_map, self.root(), source, ConsolePolicy::Inherit);

        for (alias, replacement) in self.custom_aliases() {
            let replacement = match replacement.find("{}") {
                Some(pos) => replacement[..pos].trim(),
                None => replacement.as_str(),
            };
            let Some(target) = self.alias_target(replacement, source) else {
                warn!(
                    "Custom alias replacement '{}' did not match any command",
                    replacement
                );
                continue;
            };
            let Some(&target_index) = node_map.get(&target) else {
                continue;
            };
            let alias_index = nodes.len();
            nodes.push(DeclaredNode {
                flags: (CommandFlags::LITERAL | CommandFlags::REDIRECT).bits(),
                children: Vec::new(),
                options: Vec::new(),
                redirect: Some(target_index),
                name: Some(alias.clone()),
                parser: None,
            });
            nodes[root_index].children.push(alias_index);
        }

        nodes
    }

    fn alias_target(&self, replacement: &str, source: &S) -> Option<NodeId> {
        let parse = self.parse(replacement, source.clone());
        let last = parse.context().last_child();
        match last.nodes().last() {
            Some(node) => {
                debug!(
                    "Custom alias replacement '{}' resolved to {}",
                    replacement,
                    node.node()
                );
                Some(node.node())
            }
            None if last.root() != self.root() => Some(last.root()),
            None => None,
        }
    }

    fn declare_node(
        &self,
        nodes: &mut Vec<DeclaredNode>,
        node_map: &mut FxHashMap<NodeId, usize>,
        id: NodeId,
        source: &S,
        inherited: ConsolePolicy,
    ) -> usize {
        if let Some(&index) = node_map.get(&id) {
            return index;
        }

        let node = &self.tree[id];
        let console = node.console_policy().resolve(inherited);
        let mut flags = match node.kind() {
            NodeKind::Root => CommandFlags::ROOT,
            NodeKind::Literal(_) => CommandFlags::LITERAL,
            NodeKind::Argument { .. } => CommandFlags::ARGUMENT,
            NodeKind::Option { .. } => CommandFlags::OPTION,
        };
        if node.has_command() {
            flags |= CommandFlags::EXECUTABLE;
        }
        if node.redirect().is_some() {
            flags |= CommandFlags::REDIRECT;
        }

        let index = nodes.len();
        node_map.insert(id, index);
        nodes.push(DeclaredNode {
            flags: flags.bits(),
            children: Vec::new(),
            options: Vec::new(),
            redirect: None,
            name: (!matches!(node.kind(), NodeKind::Root)).then(|| node.name().to_string()),
            parser: node.arg_type().map(|arg_type| arg_type.parser_name()),
        });

        let mut children = Vec::new();
        for child in node.children() {
            if self.tree[child].can_use(source, console) {
                children.push(self.declare_node(nodes, node_map, child, source, console));
            }
        }
        let mut options = Vec::new();
        for (_, option) in node.options() {
            if self.tree[option].can_use(source, console) {
                options.push(self.declare_node(nodes, node_map, option, source, console));
            }
        }
        let redirect = node
            .redirect()
            .map(|target| self.declare_node(nodes, node_map, target, source, console));

        let declared = &mut nodes[index];
        declared.children = children;
        declared.options = options;
        declared.redirect = redirect;
        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arguments::{boolean, integer, word};
    use crate::suggestion::StringRange;
    use crate::builder::{argument, literal, option};
    use futures::executor::block_on;

    #[derive(Clone)]
    struct Source {
        admin: bool,
    }

    impl CommandSource for Source {
        fn has_permission(&self, _: &str) -> bool {
            self.admin
        }

        fn is_console(&self) -> bool {
            false
        }
    }

    fn dispatcher() -> CommandDispatcher<Source> {
        let mut dispatcher = CommandDispatcher::new();
        dispatcher.register(literal("foo").executes(|_| Ok(())));
        dispatcher.register(literal("foobar").requires_permission("admin"));
        dispatcher.register(
            literal("set")
                .with_option(option("force", boolean()))
                .then(argument("value", integer()).executes(|_| Ok(()))),
        );
        dispatcher.register(literal("toggle").then(argument("state", boolean())));
        let root = dispatcher.root();
        dispatcher.register(literal("run").redirect(root));
        dispatcher
    }

    fn suggest(dispatcher: &CommandDispatcher<Source>, input: &str, admin: bool) -> Suggestions {
        let parse = dispatcher.parse(input, Source { admin });
        block_on(dispatcher.completion_suggestions(&parse))
    }

    #[test]
    fn root_literals_filtered_by_permission() {
        let dispatcher = dispatcher();
        let texts: Vec<_> = suggest(&dispatcher, "fo", true).texts().map(str::to_string).collect();
        assert_eq!(texts, vec!["foo", "foobar"]);
        let texts: Vec<_> = suggest(&dispatcher, "fo", false).texts().map(str::to_string).collect();
        assert_eq!(texts, vec!["foo"]);
    }

    #[test]
    fn argument_suggestions_after_space() {
        let dispatcher = dispatcher();
        let suggestions = suggest(&dispatcher, "toggle ", true);
        assert_eq!(suggestions.range().start(), 7);
        let texts: Vec<_> = suggestions.texts().collect();
        assert_eq!(texts, vec!["false", "true"]);
    }

    #[test]
    fn suggests_through_redirect() {
        let dispatcher = dispatcher();
        let suggestions = suggest(&dispatcher, "run tog", true);
        assert_eq!(suggestions.range().start(), 4);
        assert_eq!(suggestions.texts().collect::<Vec<_>>(), vec!["toggle"]);

        let suggestions = suggest(&dispatcher, "run ", true);
        assert!(suggestions.texts().any(|text| text == "set"));
    }

    #[test]
    fn cursor_in_separator_after_redirect() {
        let dispatcher = dispatcher();
        let parse = dispatcher.parse("run  toggle", Source { admin: true });
        let suggestions = block_on(dispatcher.completion_suggestions_at(&parse, 4));
        assert_eq!(suggestions.range(), StringRange::at(4));
        assert_eq!(
            suggestions.texts().collect::<Vec<_>>(),
            vec!["foo", "foobar", "run", "set", "toggle"]
        );
    }

    #[test]
    fn option_names_and_values() {
        let dispatcher = dispatcher();
        let suggestions = suggest(&dispatcher, "set -", true);
        assert_eq!(suggestions.texts().collect::<Vec<_>>(), vec!["--force"]);

        let suggestions = suggest(&dispatcher, "set --force t", true);
        assert_eq!(suggestions.range().start(), 12);
        assert_eq!(suggestions.texts().collect::<Vec<_>>(), vec!["true"]);
    }

    #[test]
    fn declare_exports_usable_nodes() {
        let mut dispatcher = dispatcher();
        dispatcher.add_custom_alias("t", "toggle {}");
        let nodes = dispatcher.declare(&Source { admin: false });
        let root = &nodes[0];
        assert_eq!(root.flags(), CommandFlags::ROOT);
        let names: Vec<_> = root
            .children
            .iter()
            .filter_map(|&index| nodes[index].name.as_deref())
            .collect();
        assert_eq!(names, vec!["foo", "set", "toggle", "run", "t"]);

        let run = root
            .children
            .iter()
            .map(|&index| &nodes[index])
            .find(|node| node.name.as_deref() == Some("run"))
            .unwrap();
        assert_eq!(run.redirect, Some(0));
        assert!(run.flags().contains(CommandFlags::REDIRECT));

        let set = nodes.iter().find(|node| node.name.as_deref() == Some("set")).unwrap();
        assert_eq!(set.options.len(), 1);
        assert_eq!(nodes[set.options[0]].parser, Some("bool"));
        assert!(nodes[set.children[0]].flags().contains(CommandFlags::EXECUTABLE));
    }

    #[test]
    fn declared_tree_serializes() {
        let dispatcher = dispatcher();
        let nodes = dispatcher.declare(&Source { admin: true });
        let json = serde_json::to_value(&nodes).unwrap();
        assert_eq!(json[0]["flags"], 0);
        assert!(json[0].get("name").is_none());
    }
}
