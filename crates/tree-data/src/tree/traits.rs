//! Forest traits and traversal

use derive_more::Display;
use log::trace;
use smallvec::SmallVec;
use std::collections::VecDeque;
use std::iter::FusedIterator;

use crate::tree::target::{self, Target};
use crate::tree::{Dataset, Node};

/// Positions from the root sequence down to a node
pub(crate) type IndexPath = SmallVec<[usize; 8]>;

/// An ordered sequence of root nodes
///
/// Implementations only expose the roots; every search, traversal and
/// removal operation comes from [`ForestTraversal`].
pub trait Forest {
    /// The root nodes, in order
    fn roots(&self) -> &[Node];

    /// Mutable access to the root sequence
    fn roots_mut(&mut self) -> &mut Vec<Node>;
}

impl Forest for Dataset {
    fn roots(&self) -> &[Node] {
        &self.nodes
    }

    fn roots_mut(&mut self) -> &mut Vec<Node> {
        &mut self.nodes
    }
}

impl Forest for Vec<Node> {
    fn roots(&self) -> &[Node] {
        self
    }

    fn roots_mut(&mut self) -> &mut Vec<Node> {
        self
    }
}

/// Traversal order for walking the forest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display)]
pub enum TraversalOrder {
    /// Visit parent before children (top-down)
    #[default]
    #[display(fmt = "pre-order")]
    PreOrder,
    /// Visit children before parent (bottom-up)
    #[display(fmt = "post-order")]
    PostOrder,
    /// Visit level by level (breadth-first)
    #[display(fmt = "breadth-first")]
    BreadthFirst,
}

/// A node detached from the forest by [`ForestTraversal::take`]
///
/// Carries enough of its old position for [`ForestTraversal::restore`] to put
/// it back.
#[derive(Debug, Clone, PartialEq)]
pub struct Detached {
    /// Id of the former parent; `None` for a former root
    pub parent_id: Option<String>,
    /// Index within the parent's children (or the root sequence)
    pub index: usize,
    /// The removed node with its whole subtree
    pub node: Node,
}

/// Extension trait providing search, traversal and removal over a forest
///
/// This trait is automatically implemented for all types that implement
/// [`Forest`]. Lookups never fail loudly: a miss is `None` or an empty `Vec`.
pub trait ForestTraversal: Forest {
    /// Returns true if the forest has at least one root
    fn exists(&self) -> bool {
        !self.roots().is_empty()
    }

    /// Lazy depth-first pre-order stream over every node
    ///
    /// The walker is single-pass; call again for a second pass.
    fn to_stream(&self) -> TreeWalker<'_> {
        TreeWalker::new(self.roots(), TraversalOrder::PreOrder)
    }

    /// Walk every node in the given order
    fn walk(&self, order: TraversalOrder) -> TreeWalker<'_> {
        TreeWalker::new(self.roots(), order)
    }

    /// Lazy pre-order walk that only descends into nodes accepted by `is_visible`
    fn walk_visible<'a, F>(&'a self, is_visible: F) -> TreeWalker<'a>
    where
        F: FnMut(&Node) -> bool + 'a,
    {
        TreeWalker::new(self.roots(), TraversalOrder::PreOrder).descend_if(is_visible)
    }

    /// First node in pre-order matching `predicate`
    fn find<F>(&self, mut predicate: F) -> Option<&Node>
    where
        F: FnMut(&Node) -> bool,
    {
        self.to_stream().find(|node| predicate(*node))
    }

    /// Every node matching `predicate`, flattened in pre-order
    fn filter<F>(&self, mut predicate: F) -> Vec<&Node>
    where
        F: FnMut(&Node) -> bool,
    {
        self.to_stream().filter(|node| predicate(*node)).collect()
    }

    /// Pre-order nodes, pruning the subtree of any node `is_visible` rejects
    ///
    /// A rejected node is still yielded; only its descendants are skipped.
    fn traverse_visible<F>(&self, mut is_visible: F) -> Vec<&Node>
    where
        F: FnMut(&Node) -> bool,
    {
        let mut out = Vec::new();
        collect_visible(self.roots(), &mut is_visible, &mut out);
        out
    }

    /// First node in pre-order with the given id
    fn find_by_id(&self, id: &str) -> Option<&Node> {
        self.find(|node| node.id == id)
    }

    /// Mutable access to the first node in pre-order matching `predicate`
    fn find_mut<F>(&mut self, mut predicate: F) -> Option<&mut Node>
    where
        F: FnMut(&Node) -> bool,
    {
        let path = locate(self.roots(), &mut predicate)?;
        node_at_mut(self.roots_mut(), &path)
    }

    /// The node whose children contain a node with `child_id`
    ///
    /// Returns `None` for roots and unknown ids.
    fn get_parent(&self, child_id: &str) -> Option<&Node> {
        self.find(|node| node.children().iter().any(|child| child.id == child_id))
    }

    /// Ancestors of the node with `id`, from parent to root
    ///
    /// Returns an empty vector for roots and unknown ids.
    fn ancestors(&self, id: &str) -> Vec<&Node> {
        let mut chain = self.path_nodes(id);
        chain.pop();
        chain.reverse();
        chain
    }

    /// Depth of the node with `id` (roots are at depth 0)
    fn depth(&self, id: &str) -> Option<usize> {
        let path = locate(self.roots(), &mut |node: &Node| node.id == id)?;
        Some(path.len() - 1)
    }

    /// Ids from the root down to the node with `id`, inclusive
    ///
    /// Returns an empty vector if the id is unknown.
    fn path(&self, id: &str) -> Vec<&str> {
        self.path_nodes(id)
            .into_iter()
            .map(|node| node.id.as_str())
            .collect()
    }

    #[doc(hidden)]
    fn path_nodes(&self, id: &str) -> Vec<&Node> {
        let Some(path) = locate(self.roots(), &mut |node: &Node| node.id == id) else {
            return Vec::new();
        };
        let mut chain = Vec::with_capacity(path.len());
        let mut level = self.roots();
        for &index in &path {
            let node = &level[index];
            chain.push(node);
            level = node.children();
        }
        chain
    }

    /// Check if the node `ancestor` is an ancestor of the node `descendant`
    fn is_ancestor_of(&self, ancestor: &str, descendant: &str) -> bool {
        self.ancestors(descendant)
            .iter()
            .any(|node| node.id == ancestor)
    }

    /// Count every node in the forest
    fn node_count(&self) -> usize {
        self.to_stream().count()
    }

    /// All leaf nodes in pre-order
    fn leaves(&self) -> Vec<&Node> {
        self.filter(Node::is_leaf)
    }

    /// All branch nodes in pre-order
    fn branches(&self) -> Vec<&Node> {
        self.filter(Node::is_branch)
    }

    /// Every id in pre-order
    fn ids(&self) -> Vec<&str> {
        self.to_stream().map(|node| node.id.as_str()).collect()
    }

    /// Ids that occur more than once, each reported once in order of first repeat
    fn duplicate_ids(&self) -> Vec<&str> {
        let mut seen = std::collections::HashSet::new();
        let mut reported = std::collections::HashSet::new();
        self.to_stream()
            .map(|node| node.id.as_str())
            .filter(|id| !seen.insert(*id) && reported.insert(*id))
            .collect()
    }

    /// Normalize a target specifier into the nodes it names
    ///
    /// See [`Target`] for the accepted forms.
    fn resolve_targets<'t>(&self, target: impl Into<Target<'t>>) -> Vec<&Node> {
        let mut out = Vec::new();
        target::resolve_into(self.roots(), &target.into(), &mut out);
        out
    }

    /// Detach the first node in pre-order with `id`
    ///
    /// An emptied parent keeps an empty `children` sequence so it stays a
    /// branch.
    fn take(&mut self, id: &str) -> Option<Detached> {
        let path = locate(self.roots(), &mut |node: &Node| node.id == id)?;
        let (&index, parent_path) = path.split_last()?;

        let (parent_id, siblings) = if parent_path.is_empty() {
            (None, self.roots_mut())
        } else {
            let parent = node_at_mut(self.roots_mut(), parent_path)?;
            (Some(parent.id.clone()), parent.children.as_mut()?)
        };
        let node = siblings.remove(index);

        trace!(
            "Detached node {:?} from {:?} at index {}",
            node.id,
            parent_id,
            index
        );
        Some(Detached {
            parent_id,
            index,
            node,
        })
    }

    /// Remove the node with `id` from wherever it lives
    ///
    /// Returns false if no node has that id. Selection state held elsewhere is
    /// not touched.
    fn pop(&mut self, id: &str) -> bool {
        self.take(id).is_some()
    }

    /// Re-insert a detached node at its former position
    ///
    /// The index is clamped to the current sibling count. Returns false if the
    /// former parent no longer exists.
    fn restore(&mut self, detached: Detached) -> bool {
        let Detached {
            parent_id,
            index,
            node,
        } = detached;

        let siblings = match &parent_id {
            None => self.roots_mut(),
            Some(parent_id) => match self.find_mut(|node| node.id == *parent_id) {
                Some(parent) => parent.children.get_or_insert_with(Vec::new),
                None => return false,
            },
        };
        let index = index.min(siblings.len());
        trace!("Restoring node {:?} under {:?} at index {}", node.id, parent_id, index);
        siblings.insert(index, node);
        true
    }
}

// Blanket implementation for all Forest types
impl<T: Forest + ?Sized> ForestTraversal for T {}

fn collect_visible<'a, F>(nodes: &'a [Node], is_visible: &mut F, out: &mut Vec<&'a Node>)
where
    F: FnMut(&Node) -> bool,
{
    for node in nodes {
        out.push(node);
        if is_visible(node) {
            collect_visible(node.children(), is_visible, out);
        }
    }
}

/// Index path to the first node in pre-order matching `predicate`
pub(crate) fn locate<F>(roots: &[Node], predicate: &mut F) -> Option<IndexPath>
where
    F: FnMut(&Node) -> bool,
{
    fn search<F>(nodes: &[Node], predicate: &mut F, path: &mut IndexPath) -> bool
    where
        F: FnMut(&Node) -> bool,
    {
        for (index, node) in nodes.iter().enumerate() {
            path.push(index);
            if predicate(node) || search(node.children(), predicate, path) {
                return true;
            }
            path.pop();
        }
        false
    }

    let mut path = IndexPath::new();
    search(roots, predicate, &mut path).then_some(path)
}

pub(crate) fn node_at_mut<'a>(roots: &'a mut [Node], path: &[usize]) -> Option<&'a mut Node> {
    let (&first, rest) = path.split_first()?;
    let mut node = roots.get_mut(first)?;
    for &index in rest {
        node = node.children.as_mut()?.get_mut(index)?;
    }
    Some(node)
}

/// Lazy iterator over the nodes of a forest
///
/// Borrows the forest for its whole lifetime and yields each node once. An
/// optional gate decides whether a node's children are walked.
pub struct TreeWalker<'a> {
    order: TraversalOrder,
    /// Stack for depth-first orders, queue for breadth-first.
    /// The flag marks post-order entries whose children are already pushed.
    pending: VecDeque<(&'a Node, bool)>,
    gate: Option<Box<dyn FnMut(&Node) -> bool + 'a>>,
}

impl<'a> TreeWalker<'a> {
    /// Create a new walker over the given roots
    pub fn new(roots: &'a [Node], order: TraversalOrder) -> Self {
        let pending: VecDeque<_> = match order {
            // Depth-first orders pop from the back
            TraversalOrder::PreOrder | TraversalOrder::PostOrder => {
                roots.iter().rev().map(|node| (node, false)).collect()
            }
            TraversalOrder::BreadthFirst => roots.iter().map(|node| (node, false)).collect(),
        };

        Self {
            order,
            pending,
            gate: None,
        }
    }

    /// Only walk the children of nodes accepted by `gate`
    pub fn descend_if<F>(mut self, gate: F) -> Self
    where
        F: FnMut(&Node) -> bool + 'a,
    {
        self.gate = Some(Box::new(gate));
        self
    }

    /// The order this walker yields nodes in
    pub fn order(&self) -> TraversalOrder {
        self.order
    }

    fn should_descend(&mut self, node: &Node) -> bool {
        match self.gate.as_mut() {
            Some(gate) => gate(node),
            None => true,
        }
    }

    fn next_preorder(&mut self) -> Option<&'a Node> {
        let (current, _) = self.pending.pop_back()?;

        // Add children in reverse order so they're popped in correct order
        if self.should_descend(current) {
            for child in current.children().iter().rev() {
                self.pending.push_back((child, false));
            }
        }

        Some(current)
    }

    fn next_postorder(&mut self) -> Option<&'a Node> {
        while let Some((current, expanded)) = self.pending.pop_back() {
            if expanded {
                return Some(current);
            }

            self.pending.push_back((current, true));
            if self.should_descend(current) {
                for child in current.children().iter().rev() {
                    self.pending.push_back((child, false));
                }
            }
        }
        None
    }

    fn next_breadthfirst(&mut self) -> Option<&'a Node> {
        let (current, _) = self.pending.pop_front()?;

        if self.should_descend(current) {
            for child in current.children() {
                self.pending.push_back((child, false));
            }
        }

        Some(current)
    }
}

impl<'a> Iterator for TreeWalker<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        match self.order {
            TraversalOrder::PreOrder => self.next_preorder(),
            TraversalOrder::PostOrder => self.next_postorder(),
            TraversalOrder::BreadthFirst => self.next_breadthfirst(),
        }
    }
}

impl FusedIterator for TreeWalker<'_> {}
