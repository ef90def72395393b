//! Permission nodes as configured per player.
//!
//! A node is a dotted path such as `mcadmin.ban`. A `*` segment matches the
//! rest of any path, and a node prefixed with `-` revokes instead of grants.
//! Nodes are checked in the order they were configured; the first match
//! decides.

#[derive(Debug, Clone, PartialEq, Eq)]
enum PathSegment {
    WildCard,
    Named(String),
}

#[derive(Debug, Clone)]
struct PermissionNode {
    path: Vec<PathSegment>,
    value: bool,
}

impl PermissionNode {
    fn matches(&self, str: &str) -> bool {
        let mut segments = str.split('.');
        for expected in &self.path {
            match (expected, segments.next()) {
                (PathSegment::WildCard, _) => return true,
                (PathSegment::Named(name), Some(segment)) if name == segment => {}
                _ => return false,
            }
        }
        segments.next().is_none()
    }
}

#[derive(Debug, Clone, Default)]
pub struct PlayerPermissionsCache {
    nodes: Vec<PermissionNode>,
}

impl PlayerPermissionsCache {
    pub fn from_nodes<I, T>(nodes: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let mut cache = Self::default();
        for node in nodes {
            let node = node.as_ref().trim();
            match node.strip_prefix('-') {
                Some(revoked) => cache.insert(revoked, false),
                None => cache.insert(node, true),
            }
        }
        cache
    }

    pub fn get_node_val(&self, name: &str) -> Option<bool> {
        self.nodes
            .iter()
            .find(|node| node.matches(name))
            .map(|node| node.value)
    }

    pub fn has(&self, name: &str) -> bool {
        self.get_node_val(name).unwrap_or(false)
    }

    fn insert(&mut self, name: &str, value: bool) {
        let path = name
            .split('.')
            .map(|s| match s {
                "*" => PathSegment::WildCard,
                s => PathSegment::Named(s.to_owned()),
            })
            .collect();
        self.nodes.push(PermissionNode { path, value });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_and_wildcard_nodes() {
        let cache = PlayerPermissionsCache::from_nodes(["mcadmin.kick", "worldedit.*"]);
        assert!(cache.has("mcadmin.kick"));
        assert!(!cache.has("mcadmin.kick.other"));
        assert!(!cache.has("mcadmin"));
        assert!(cache.has("worldedit.selection.pos1"));
        assert!(!cache.has("mcadmin.ban"));
    }

    #[test]
    fn first_match_decides() {
        let cache = PlayerPermissionsCache::from_nodes(["-mcadmin.stop", "mcadmin.*"]);
        assert_eq!(cache.get_node_val("mcadmin.stop"), Some(false));
        assert!(cache.has("mcadmin.ban"));
        assert_eq!(cache.get_node_val("other"), None);
    }
}
