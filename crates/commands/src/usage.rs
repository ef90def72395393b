use crate::dispatcher::CommandDispatcher;
use crate::node::NodeId;
use crate::source::{CommandSource, ConsolePolicy};
use indexmap::{IndexMap, IndexSet};
use itertools::Itertools;

const ARGUMENT_SEPARATOR: &str = " ";
const USAGE_OPTIONAL_OPEN: &str = "[";
const USAGE_OPTIONAL_CLOSE: &str = "]";
const USAGE_REQUIRED_OPEN: &str = "(";
const USAGE_REQUIRED_CLOSE: &str = ")";
const USAGE_OR: &str = "|";

impl<S: CommandSource> CommandDispatcher<S> {
    /// Every complete usage below `node`, one line per executable path.
    /// With `restricted` set, branches `source` may not use are left out.
    pub fn all_usage(&self, node: NodeId, source: &S, restricted: bool) -> Vec<String> {
        let mut result = Vec::new();
        self.collect_all_usage(
            node,
            source,
            &mut result,
            String::new(),
            restricted,
            self.console_policy_of(node),
        );
        result
    }

    fn collect_all_usage(
        &self,
        id: NodeId,
        source: &S,
        result: &mut Vec<String>,
        prefix: String,
        restricted: bool,
        inherited: ConsolePolicy,
    ) {
        let node = &self.tree[id];
        if restricted && !node.can_use(source, inherited) {
            return;
        }
        let console = node.console_policy().resolve(inherited);

        if node.has_command() {
            result.push(prefix.clone());
        }

        if let Some(target) = node.redirect() {
            let redirect = self.redirect_usage(target);
            if prefix.is_empty() {
                result.push(format!("{}{ARGUMENT_SEPARATOR}{redirect}", node.usage_text()));
            } else {
                result.push(format!("{prefix}{ARGUMENT_SEPARATOR}{redirect}"));
            }
        } else {
            for child in node.children() {
                let usage = self.tree[child].usage_text();
                let prefix = if prefix.is_empty() {
                    usage
                } else {
                    format!("{prefix}{ARGUMENT_SEPARATOR}{usage}")
                };
                self.collect_all_usage(child, source, result, prefix, restricted, console);
            }
        }
    }

    /// A compact usage string for every child of `node` the source may use,
    /// e.g. `ban <target> [<duration>]`.
    pub fn smart_usage(&self, node: NodeId, source: &S) -> IndexMap<NodeId, String> {
        let parent = &self.tree[node];
        let console = parent
            .console_policy()
            .resolve(self.console_policy_of(node));
        let optional = parent.has_command();
        parent
            .children()
            .filter_map(|child| {
                self.smart_usage_of(child, source, optional, false, console)
                    .map(|usage| (child, usage))
            })
            .collect()
    }

    fn smart_usage_of(
        &self,
        id: NodeId,
        source: &S,
        optional: bool,
        deep: bool,
        inherited: ConsolePolicy,
    ) -> Option<String> {
        let node = &self.tree[id];
        if !node.can_use(source, inherited) {
            return None;
        }
        let console = node.console_policy().resolve(inherited);

        let this = if optional {
            format!("{USAGE_OPTIONAL_OPEN}{}{USAGE_OPTIONAL_CLOSE}", node.usage_text())
        } else {
            node.usage_text()
        };
        if deep {
            return Some(this);
        }

        let child_optional = node.has_command();
        let (open, close) = if child_optional {
            (USAGE_OPTIONAL_OPEN, USAGE_OPTIONAL_CLOSE)
        } else {
            (USAGE_REQUIRED_OPEN, USAGE_REQUIRED_CLOSE)
        };

        if let Some(target) = node.redirect() {
            return Some(format!(
                "{this}{ARGUMENT_SEPARATOR}{}",
                self.redirect_usage(target)
            ));
        }

        let children: Vec<NodeId> = node
            .children()
            .filter(|&child| self.tree[child].can_use(source, console))
            .collect();
        match children.as_slice() {
            [] => {}
            [child] => {
                if let Some(usage) =
                    self.smart_usage_of(*child, source, child_optional, child_optional, console)
                {
                    return Some(format!("{this}{ARGUMENT_SEPARATOR}{usage}"));
                }
            }
            _ => {
                let child_usage: IndexSet<String> = children
                    .iter()
                    .filter_map(|&child| {
                        self.smart_usage_of(child, source, child_optional, true, console)
                    })
                    .collect();
                if child_usage.len() == 1 {
                    let usage = &child_usage[0];
                    let usage = if child_optional {
                        format!("{USAGE_OPTIONAL_OPEN}{usage}{USAGE_OPTIONAL_CLOSE}")
                    } else {
                        usage.clone()
                    };
                    return Some(format!("{this}{ARGUMENT_SEPARATOR}{usage}"));
                }
                if child_usage.len() > 1 {
                    let alternatives = children
                        .iter()
                        .map(|&child| self.tree[child].usage_text())
                        .join(USAGE_OR);
                    return Some(format!("{this}{ARGUMENT_SEPARATOR}{open}{alternatives}{close}"));
                }
            }
        }

        Some(this)
    }

    /// The options accepted at `node`, formatted for help output.
    pub fn option_usage(&self, node: NodeId, source: &S) -> Vec<String> {
        let console = self.tree[node]
            .console_policy()
            .resolve(self.console_policy_of(node));
        self.tree[node]
            .options()
            .filter(|(_, option)| self.tree[*option].can_use(source, console))
            .map(|(_, option)| format!("[{}]", self.tree[option].usage_text()))
            .sorted()
            .collect()
    }

    fn redirect_usage(&self, target: NodeId) -> String {
        if target == self.root() {
            "...".to_string()
        } else {
            format!("-> {}", self.tree[target].usage_text())
        }
    }

    /// The console policy inherited by `node` from its ancestors.
    fn console_policy_of(&self, node: NodeId) -> ConsolePolicy {
        let Some(path) = self.path_of(node) else {
            return ConsolePolicy::Inherit;
        };
        let mut current = self.root();
        let mut policy = ConsolePolicy::Inherit;
        for name in path.iter().take(path.len().saturating_sub(1)) {
            let Some(child) = self.tree[current].child(name) else {
                break;
            };
            policy = self.tree[child].console_policy().resolve(policy);
            current = child;
        }
        policy
    }
}

#[cfg(test)]
mod tests {
    use crate::arguments::{int_range, integer, word};
    use crate::builder::{argument, literal, option};
    use crate::dispatcher::CommandDispatcher;
    use crate::source::CommandSource;

    #[derive(Clone)]
    struct Source;

    impl CommandSource for Source {
        fn has_permission(&self, permission: &str) -> bool {
            permission != "hidden"
        }

        fn is_console(&self) -> bool {
            false
        }
    }

    fn dispatcher() -> CommandDispatcher<Source> {
        let mut dispatcher = CommandDispatcher::new();
        dispatcher.register(
            literal("ban").then(
                argument("target", word())
                    .executes(|_| Ok(()))
                    .then(argument("duration", int_range()).executes(|_| Ok(()))),
            ),
        );
        dispatcher.register(
            literal("give")
                .with_option(option("count", integer()))
                .then(literal("all").executes(|_| Ok(())))
                .then(literal("some").executes(|_| Ok(())))
                .then(literal("secret").requires_permission("hidden").executes(|_| Ok(()))),
        );
        let root = dispatcher.root();
        dispatcher.register(literal("run").redirect(root));
        dispatcher
    }

    #[test]
    fn all_usage_lists_every_path() {
        let dispatcher = dispatcher();
        let root = dispatcher.root();
        assert_eq!(
            dispatcher.all_usage(root, &Source, true),
            vec![
                "ban <target>",
                "ban <target> <duration>",
                "give all",
                "give some",
                "run ...",
            ]
        );
        assert_eq!(dispatcher.all_usage(root, &Source, false).len(), 6);
    }

    #[test]
    fn smart_usage_marks_optional_arguments() {
        let dispatcher = dispatcher();
        let root = dispatcher.root();
        let usage = dispatcher.smart_usage(root, &Source);
        let usage: Vec<&str> = usage.values().map(String::as_str).collect();
        assert_eq!(
            usage,
            vec!["ban <target> [<duration>]", "give (all|some)", "run ..."]
        );
    }

    #[test]
    fn option_usage_lists_options() {
        let dispatcher = dispatcher();
        let give = dispatcher.find_node(&["give"]).unwrap();
        assert_eq!(
            dispatcher.option_usage(give, &Source),
            vec!["[--count <count>]"]
        );
    }
}
