//! Nested choice trees (taxonomy-style classification).
//!
//! A selection is a list of paths from a root choice down to a selected
//! node, e.g. `[["Header 1", "Option 1.1"]]`.

use serde::{Deserialize, Serialize};

/// A choice and the choices nested under it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChoiceNode {
    pub value: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ChoiceNode>,
}

impl ChoiceNode {
    pub fn leaf(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            children: Vec::new(),
        }
    }

    pub fn with_children(value: impl Into<String>, children: Vec<ChoiceNode>) -> Self {
        Self {
            value: value.into(),
            children,
        }
    }
}

/// The choice forest of one control.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChoiceTree<'a> {
    roots: &'a [ChoiceNode],
}

impl<'a> ChoiceTree<'a> {
    pub fn new(roots: &'a [ChoiceNode]) -> Self {
        Self { roots }
    }

    /// True if any choice has children.
    pub fn is_nested(&self) -> bool {
        self.roots.iter().any(|node| !node.children.is_empty())
    }

    /// Path to the first node (pre-order) whose value is `value`.
    pub fn path_of(&self, value: &str) -> Option<Vec<String>> {
        fn walk(nodes: &[ChoiceNode], value: &str, path: &mut Vec<String>) -> bool {
            for node in nodes {
                path.push(node.value.clone());
                if node.value == value || walk(&node.children, value, path) {
                    return true;
                }
                path.pop();
            }
            false
        }

        let mut path = Vec::new();
        walk(self.roots, value, &mut path).then_some(path)
    }

    /// Every path in the tree, pre-order.
    pub fn all_paths(&self) -> Vec<Vec<String>> {
        let mut out = Vec::new();
        collect_paths(self.roots, &mut Vec::new(), &mut out);
        out
    }

    /// Toggles the node named `value` in `selection`.
    ///
    /// Selecting a node selects it and all its descendants; deselecting a
    /// node also drops its descendants and its ancestors. The result is in
    /// tree order. Unknown values leave the selection unchanged.
    pub fn toggle(&self, selection: &[Vec<String>], value: &str) -> Vec<Vec<String>> {
        let Some(path) = self.path_of(value) else {
            return selection.to_vec();
        };

        let mut selected: Vec<Vec<String>> = selection.to_vec();
        if selected.contains(&path) {
            selected.retain(|candidate| {
                !(candidate.starts_with(&path) || path.starts_with(candidate))
            });
        } else {
            for candidate in self.all_paths() {
                if candidate.starts_with(&path) && !selected.contains(&candidate) {
                    selected.push(candidate);
                }
            }
        }

        let order = self.all_paths();
        let mut ordered: Vec<Vec<String>> = order
            .iter()
            .filter(|candidate| selected.contains(candidate))
            .cloned()
            .collect();
        // Paths from a previous config version are kept at the end.
        ordered.extend(selected.into_iter().filter(|p| !order.contains(p)));
        ordered
    }
}

fn collect_paths(nodes: &[ChoiceNode], prefix: &mut Vec<String>, out: &mut Vec<Vec<String>>) {
    for node in nodes {
        prefix.push(node.value.clone());
        out.push(prefix.clone());
        collect_paths(&node.children, prefix, out);
        prefix.pop();
    }
}

/// Toggles `value` in a flat (non-nested) choice list.
pub fn toggle_flat(selection: &[String], value: &str, multiple: bool) -> Vec<String> {
    if selection.iter().any(|v| v == value) {
        return selection.iter().filter(|v| *v != value).cloned().collect();
    }
    if multiple {
        let mut out = selection.to_vec();
        out.push(value.to_string());
        out
    } else {
        vec![value.to_string()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> Vec<ChoiceNode> {
        vec![
            ChoiceNode::with_children(
                "Header 1",
                vec![ChoiceNode::leaf("Option 1.1"), ChoiceNode::leaf("Option 1.2")],
            ),
            ChoiceNode::with_children("Header 2", vec![ChoiceNode::leaf("Option 2.1")]),
        ]
    }

    fn path(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_selecting_leaf_yields_full_path() {
        let roots = tree();
        let tree = ChoiceTree::new(&roots);
        let selection = tree.toggle(&[], "Option 1.1");
        assert_eq!(selection, vec![path(&["Header 1", "Option 1.1"])]);
    }

    #[test]
    fn test_selecting_parent_selects_children() {
        let roots = tree();
        let tree = ChoiceTree::new(&roots);
        let selection = tree.toggle(&[], "Header 1");
        assert_eq!(
            selection,
            vec![
                path(&["Header 1"]),
                path(&["Header 1", "Option 1.1"]),
                path(&["Header 1", "Option 1.2"]),
            ]
        );
    }

    #[test]
    fn test_deselecting_child_drops_parent() {
        let roots = tree();
        let tree = ChoiceTree::new(&roots);
        let selection = tree.toggle(&[], "Header 1");
        let selection = tree.toggle(&selection, "Option 1.2");
        assert_eq!(selection, vec![path(&["Header 1", "Option 1.1"])]);
    }

    #[test]
    fn test_unknown_value_is_ignored() {
        let roots = tree();
        let tree = ChoiceTree::new(&roots);
        let selection = vec![path(&["Header 2"])];
        assert_eq!(tree.toggle(&selection, "nope"), selection);
    }

    #[test]
    fn test_flat_single_and_multiple() {
        let single = toggle_flat(&["a".to_string()], "b", false);
        assert_eq!(single, vec!["b".to_string()]);
        let multi = toggle_flat(&["a".to_string()], "b", true);
        assert_eq!(multi, vec!["a".to_string(), "b".to_string()]);
        let off = toggle_flat(&multi, "a", true);
        assert_eq!(off, vec!["b".to_string()]);
    }
}
