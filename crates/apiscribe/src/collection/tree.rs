use crate::{config::DocsConfig, endpoint::Endpoint};
use indexmap::IndexMap;
use std::collections::BTreeSet;
use tracing::debug;

/// One folder of the request collection
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FolderNode {
    pub name: String,
    /// Child folders keyed by name, in first-seen order
    pub folders: IndexMap<String, FolderNode>,
    /// Leaf requests in display order
    pub requests: Vec<Endpoint>,
}

impl FolderNode {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Build the chain of nodes for `path`, the innermost one holding `requests`
    pub fn from_path(path: &[String], requests: Vec<Endpoint>) -> Self {
        match path.split_first() {
            None => Self {
                requests,
                ..Default::default()
            },
            Some((first, rest)) => {
                let mut node = Self::new(first);
                if rest.is_empty() {
                    node.requests = requests;
                } else {
                    let child = Self::from_path(rest, requests);
                    node.folders.insert(child.name.clone(), child);
                }
                node
            }
        }
    }

    /// Fold `other` into this node: same-named children are merged
    /// recursively and leaf lists concatenated.
    pub fn merge(&mut self, other: FolderNode) {
        self.requests.extend(other.requests);
        for (name, child) in other.folders {
            match self.folders.get_mut(&name) {
                Some(existing) => existing.merge(child),
                None => {
                    self.folders.insert(name, child);
                }
            }
        }
    }

    /// Node at `path` below this one
    pub fn find(&self, path: &[&str]) -> Option<&FolderNode> {
        match path.split_first() {
            None => Some(self),
            Some((first, rest)) => self.folders.get(*first)?.find(rest),
        }
    }

    /// Requests in this node and all descendants
    pub fn leaf_count(&self) -> usize {
        self.requests.len()
            + self
                .folders
                .values()
                .map(FolderNode::leaf_count)
                .sum::<usize>()
    }

    /// Remove repeated leaves (same name and identity key), first one wins
    pub fn dedupe_leaves(&mut self) {
        let mut seen = BTreeSet::new();
        self.requests
            .retain(|endpoint| seen.insert((endpoint.name.clone(), endpoint.identity_key())));
        for child in self.folders.values_mut() {
            child.dedupe_leaves();
        }
    }
}

/// Split a folder string into trimmed, non-empty segments
pub fn folder_path(folder: &str, config: &DocsConfig) -> Vec<String> {
    let segments: Vec<String> = folder
        .split(config.folder_separator.as_str())
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect();

    if segments.is_empty() {
        vec![config.default_folder.clone()]
    } else {
        segments
    }
}

/// Arrange endpoints into a folder tree.
///
/// Endpoints are grouped by folder string and stably sorted by `order`
/// within each group. Groups whose paths share prefixes end up in the same
/// nodes. Top-level folders are sorted by name.
pub fn build_tree(endpoints: &[Endpoint], config: &DocsConfig) -> FolderNode {
    let mut groups: IndexMap<&str, Vec<Endpoint>> = IndexMap::new();
    for endpoint in endpoints {
        groups
            .entry(endpoint.folder.as_str())
            .or_default()
            .push(endpoint.clone());
    }

    let mut root = FolderNode::default();
    for (folder, mut requests) in groups {
        requests.sort_by_key(|endpoint| endpoint.order);
        let path = folder_path(folder, config);
        root.merge(FolderNode::from_path(&path, requests));
    }

    if config.dedupe_leaves {
        root.dedupe_leaves();
    }
    root.folders.sort_keys();

    debug!(
        "Built collection tree with {} top-level folders and {} requests",
        root.folders.len(),
        root.leaf_count()
    );

    root
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_declared_endpoints, create_introspected_endpoints, create_test_config};

    fn names(node: &FolderNode) -> Vec<&str> {
        node.requests.iter().map(|e| e.name.as_str()).collect()
    }

    #[test]
    fn test_shared_paths_become_one_branch() {
        let config = create_test_config();
        let mut endpoints = create_declared_endpoints();
        endpoints.extend(create_introspected_endpoints());

        let tree = build_tree(&endpoints, &config);
        let auth = tree.find(&["Auth"]).unwrap();
        assert_eq!(auth.folders.len(), 1);
        assert!(auth.requests.is_empty());

        let otp = tree.find(&["Auth", "OTP"]).unwrap();
        assert_eq!(names(otp), vec!["Request OTP", "api.auth.otp.verify"]);
    }

    #[test]
    fn test_no_leaf_is_lost() {
        let config = create_test_config();
        let mut endpoints = create_declared_endpoints();
        endpoints.extend(create_introspected_endpoints());

        let tree = build_tree(&endpoints, &config);
        assert_eq!(tree.leaf_count(), endpoints.len());
    }

    #[test]
    fn test_top_level_folders_sorted() {
        let config = create_test_config();
        let endpoints = vec![
            Endpoint::new("z", "GET", "/z").with_folder("Zeta"),
            Endpoint::new("a", "GET", "/a").with_folder("Alpha / Later"),
            Endpoint::new("a2", "GET", "/a2").with_folder("Alpha / Earlier"),
            Endpoint::new("m", "GET", "/m").with_folder(" "),
        ];

        let tree = build_tree(&endpoints, &config);
        let top: Vec<&String> = tree.folders.keys().collect();
        assert_eq!(top, vec!["Alpha", "General", "Zeta"]);

        // nested folders keep first-seen order
        let nested: Vec<&String> = tree.folders["Alpha"].folders.keys().collect();
        assert_eq!(nested, vec!["Later", "Earlier"]);
    }

    #[test]
    fn test_stable_sort_by_order() {
        let config = create_test_config();
        let endpoints = vec![
            Endpoint::new("third", "GET", "/3").with_folder("Users").with_order(2),
            Endpoint::new("first", "GET", "/1").with_folder("Users").with_order(1),
            Endpoint::new("tie-a", "GET", "/a").with_folder("Users").with_order(5),
            Endpoint::new("tie-b", "GET", "/b").with_folder("Users").with_order(5),
            Endpoint::new("zero", "GET", "/0").with_folder("Users"),
        ];

        let tree = build_tree(&endpoints, &config);
        assert_eq!(
            names(&tree.folders["Users"]),
            vec!["zero", "first", "third", "tie-a", "tie-b"]
        );
    }

    #[test]
    fn test_custom_separator() {
        let config = create_test_config().with_folder_separator("::");
        let endpoints = vec![
            Endpoint::new("a", "GET", "/a").with_folder("Admin :: Users"),
            Endpoint::new("b", "GET", "/b").with_folder("Admin::Users"),
        ];

        let tree = build_tree(&endpoints, &config);
        assert_eq!(tree.find(&["Admin", "Users"]).map(|node| node.requests.len()), Some(2));
    }

    #[test]
    fn test_leaf_dedupe_is_opt_in() {
        let endpoints = vec![
            Endpoint::new("Ping", "GET", "/ping").with_folder("Misc"),
            Endpoint::new("Ping", "GET", "ping/").with_folder("Misc"),
            Endpoint::new("Ping", "POST", "/ping").with_folder("Misc"),
        ];

        let tree = build_tree(&endpoints, &create_test_config());
        assert_eq!(tree.leaf_count(), 3);

        let tree = build_tree(&endpoints, &create_test_config().with_dedupe_leaves(true));
        assert_eq!(tree.leaf_count(), 2);
    }

    #[test]
    fn test_merge_unions_children() {
        let mut left = FolderNode::from_path(
            &["Auth".to_string(), "OTP".to_string()],
            vec![Endpoint::new("a", "GET", "/a")],
        );
        let right = FolderNode::from_path(
            &["Auth".to_string(), "Login".to_string()],
            vec![Endpoint::new("b", "GET", "/b")],
        );

        let mut root = FolderNode::default();
        root.merge(std::mem::take(&mut left));
        root.merge(right);

        let auth = root.find(&["Auth"]).unwrap();
        let children: Vec<&String> = auth.folders.keys().collect();
        assert_eq!(children, vec!["OTP", "Login"]);
        assert_eq!(root.leaf_count(), 2);
    }
}
