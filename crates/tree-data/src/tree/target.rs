//! Target specifiers for selection and expansion APIs

use std::borrow::Cow;

use crate::tree::traits::{TraversalOrder, TreeWalker};
use crate::tree::Node;

/// A flexible reference to zero or more nodes
///
/// Selection-style APIs accept an id, a node, a list of either, or nothing at
/// all. [`resolve_targets`](crate::tree::ForestTraversal::resolve_targets)
/// turns any of these into the concrete nodes of a forest.
///
/// ```
/// use tree_data::tree::prelude::*;
///
/// let forest = vec![Node::new("a", "A"), Node::new("b", "B")];
/// let picked = forest.resolve_targets(vec!["b", "missing", "a"]);
/// let ids: Vec<_> = picked.iter().map(|node| node.id.as_str()).collect();
/// assert_eq!(ids, ["b", "a"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Target<'a> {
    /// Nothing targeted; resolves to an empty list
    #[default]
    None,
    /// A node id
    Id(Cow<'a, str>),
    /// A node value, matched by its id
    Node(&'a Node),
    /// Several targets, resolved element-wise in order
    Many(Vec<Target<'a>>),
}

impl<'a> Target<'a> {
    /// Build a [`Target::Many`] from any iterator of targets
    pub fn many<I, T>(targets: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Target<'a>>,
    {
        Target::Many(targets.into_iter().map(Into::into).collect())
    }

    /// Returns true for [`Target::None`]
    pub fn is_none(&self) -> bool {
        matches!(self, Target::None)
    }
}

impl<'a> From<&'a str> for Target<'a> {
    fn from(id: &'a str) -> Self {
        Target::Id(Cow::Borrowed(id))
    }
}

impl<'a> From<&'a String> for Target<'a> {
    fn from(id: &'a String) -> Self {
        Target::Id(Cow::Borrowed(id.as_str()))
    }
}

impl From<String> for Target<'_> {
    fn from(id: String) -> Self {
        Target::Id(Cow::Owned(id))
    }
}

impl<'a> From<&'a Node> for Target<'a> {
    fn from(node: &'a Node) -> Self {
        Target::Node(node)
    }
}

impl<'a, T: Into<Target<'a>>> From<Vec<T>> for Target<'a> {
    fn from(targets: Vec<T>) -> Self {
        Target::many(targets)
    }
}

impl<'a, T: Into<Target<'a>>> From<Option<T>> for Target<'a> {
    fn from(target: Option<T>) -> Self {
        target.map_or(Target::None, Into::into)
    }
}

/// Append the nodes named by `target` to `out`, skipping anything unresolved
///
/// A [`Target::Node`] resolves to the forest's own node with the same id, so
/// a stale copy held by the caller never leaks back out.
pub(crate) fn resolve_into<'n>(roots: &'n [Node], target: &Target<'_>, out: &mut Vec<&'n Node>) {
    match target {
        Target::None => {}
        Target::Id(id) => out.extend(find_by_id(roots, id)),
        Target::Node(node) => out.extend(find_by_id(roots, &node.id)),
        Target::Many(targets) => {
            for target in targets {
                resolve_into(roots, target, out);
            }
        }
    }
}

fn find_by_id<'n>(roots: &'n [Node], id: &str) -> Option<&'n Node> {
    TreeWalker::new(roots, TraversalOrder::PreOrder).find(|node| node.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversions() {
        assert!(Target::from(None::<&str>).is_none());
        assert_eq!(Target::from("a"), Target::Id(Cow::Borrowed("a")));
        assert_eq!(
            Target::from(vec!["a", "b"]),
            Target::Many(vec![Target::from("a"), Target::from("b")])
        );

        let node = Node::new("n", "N");
        assert_eq!(Target::from(Some(&node)), Target::Node(&node));
    }

    #[test]
    fn test_owned_ids() {
        let selection = vec!["x".to_string(), "y".to_string()];
        let target = Target::from(selection.clone());
        assert_eq!(
            target,
            Target::Many(vec![
                Target::Id(Cow::Owned("x".into())),
                Target::Id(Cow::Owned("y".into()))
            ])
        );
        assert_eq!(Target::many(&selection), target);
    }
}
