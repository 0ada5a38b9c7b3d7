//! Install graphs
//!
//! An [`InstallGraph`] is a rooted directed acyclic graph held in a petgraph
//! arena. Nodes are addressed by [`NodeId`]; a node may be the child of
//! several parents, and children keep the order they were added in.
//!
//! Traversal is depth-first pre-order and visits every reachable node once,
//! however many paths lead to it. The visitor receives the graph mutably,
//! so it may add children while the walk is in progress; children are read
//! after the visitor returns, so additions below the current node are
//! walked too.

use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::HashSet;
use std::convert::Infallible;
use std::ops::{Index, IndexMut};

/// Handle of a node in an [`InstallGraph`]
pub type NodeId = NodeIndex;

/// Rooted DAG of install nodes
#[derive(Debug, Clone)]
pub struct InstallGraph<T> {
    graph: StableDiGraph<T, ()>,
    root: NodeId,
}

impl<T> InstallGraph<T> {
    /// Create a graph holding only `root`
    #[must_use]
    pub fn new(root: T) -> Self {
        let mut graph = StableDiGraph::new();
        let root = graph.add_node(root);
        Self { graph, root }
    }

    /// Root node
    #[inline]
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Add a node with no parent
    ///
    /// It stays unreachable from the root until linked with
    /// [`InstallGraph::add_child`].
    pub fn add_node(&mut self, value: T) -> NodeId {
        self.graph.add_node(value)
    }

    /// Make `child` the last child of `parent`
    ///
    /// Linking the same pair twice is a no-op. The caller keeps the graph
    /// acyclic; see [`InstallGraph::is_acyclic`].
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) {
        if self.graph.find_edge(parent, child).is_none() {
            self.graph.add_edge(parent, child, ());
        }
    }

    /// Add `value` as a new last child of `parent`
    pub fn add_child_value(&mut self, parent: NodeId, value: T) -> NodeId {
        let child = self.graph.add_node(value);
        self.graph.add_edge(parent, child, ());
        child
    }

    /// Value at `id`
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&T> {
        self.graph.node_weight(id)
    }

    /// Mutable value at `id`
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut T> {
        self.graph.node_weight_mut(id)
    }

    /// Whether `id` names a node of this graph
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.graph.contains_node(id)
    }

    /// Children of `id` in insertion order
    #[must_use]
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.neighbors(id, Direction::Outgoing)
    }

    /// Parents of `id` in linking order
    #[must_use]
    pub fn parents(&self, id: NodeId) -> Vec<NodeId> {
        self.neighbors(id, Direction::Incoming)
    }

    fn neighbors(&self, id: NodeId, direction: Direction) -> Vec<NodeId> {
        let mut edges: Vec<_> = self
            .graph
            .edges_directed(id, direction)
            .map(|edge| {
                let other = match direction {
                    Direction::Outgoing => edge.target(),
                    Direction::Incoming => edge.source(),
                };
                (edge.id(), other)
            })
            .collect();
        edges.sort_by_key(|(edge, _)| *edge);
        edges.into_iter().map(|(_, node)| node).collect()
    }

    /// Number of nodes, reachable or not
    #[inline]
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Whether the graph has no cycle
    #[must_use]
    pub fn is_acyclic(&self) -> bool {
        !petgraph::algo::is_cyclic_directed(&self.graph)
    }

    /// Depth-first walk from `from`, visiting each reachable node once
    ///
    /// The visitor returns whether to descend into the node's children.
    pub fn visit<F>(&mut self, from: NodeId, mut visitor: F)
    where
        F: FnMut(&mut Self, NodeId) -> bool,
    {
        let outcome: Result<(), Infallible> = self.try_visit(from, |graph, id| Ok(visitor(graph, id)));
        match outcome {
            Ok(()) => {}
            Err(never) => match never {},
        }
    }

    /// Fallible form of [`InstallGraph::visit`]
    ///
    /// # Errors
    /// Stops at and returns the first error raised by the visitor.
    pub fn try_visit<E, F>(&mut self, from: NodeId, mut visitor: F) -> Result<(), E>
    where
        F: FnMut(&mut Self, NodeId) -> Result<bool, E>,
    {
        let mut visited = HashSet::new();
        let mut stack = vec![from];

        while let Some(id) = stack.pop() {
            if !self.graph.contains_node(id) || !visited.insert(id) {
                continue;
            }
            if visitor(self, id)? {
                stack.extend(self.children(id).into_iter().rev());
            }
        }
        Ok(())
    }

    /// Read-only walk; same order and once-only rule as [`InstallGraph::visit`]
    pub fn walk<F>(&self, from: NodeId, mut visitor: F)
    where
        F: FnMut(NodeId, &T) -> bool,
    {
        let mut visited = HashSet::new();
        let mut stack = vec![from];

        while let Some(id) = stack.pop() {
            let Some(value) = self.graph.node_weight(id) else {
                continue;
            };
            if !visited.insert(id) {
                continue;
            }
            if visitor(id, value) {
                stack.extend(self.children(id).into_iter().rev());
            }
        }
    }

    /// `from` and every node beneath it, in walk order
    #[must_use]
    pub fn descendants(&self, from: NodeId) -> Vec<NodeId> {
        let mut nodes = Vec::new();
        self.walk(from, |id, _| {
            nodes.push(id);
            true
        });
        nodes
    }
}

impl<T> Index<NodeId> for InstallGraph<T> {
    type Output = T;

    fn index(&self, id: NodeId) -> &T {
        &self.graph[id]
    }
}

impl<T> IndexMut<NodeId> for InstallGraph<T> {
    fn index_mut(&mut self, id: NodeId) -> &mut T {
        &mut self.graph[id]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diamond() -> (InstallGraph<&'static str>, [NodeId; 4]) {
        let mut graph = InstallGraph::new("a");
        let a = graph.root();
        let b = graph.add_child_value(a, "b");
        let c = graph.add_child_value(a, "c");
        let d = graph.add_child_value(b, "d");
        graph.add_child(c, d);
        (graph, [a, b, c, d])
    }

    #[test]
    fn test_shared_child_visited_once() {
        let (mut graph, [a, ..]) = diamond();
        let mut seen = Vec::new();
        graph.visit(a, |g, id| {
            seen.push(g[id]);
            true
        });
        assert_eq!(seen, vec!["a", "b", "d", "c"]);
    }

    #[test]
    fn test_parents_and_children_keep_order() {
        let (graph, [a, b, c, d]) = diamond();
        assert_eq!(graph.children(a), vec![b, c]);
        assert_eq!(graph.parents(d), vec![b, c]);
        assert!(graph.is_acyclic());
    }

    #[test]
    fn test_duplicate_link_ignored() {
        let (mut graph, [a, b, ..]) = diamond();
        graph.add_child(a, b);
        assert_eq!(graph.children(a).len(), 2);
    }

    #[test]
    fn test_pruned_branch_not_descended() {
        let (mut graph, [a, ..]) = diamond();
        let mut seen = Vec::new();
        graph.visit(a, |g, id| {
            seen.push(g[id]);
            g[id] != "b"
        });
        // d is still reached through c
        assert_eq!(seen, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_child_added_during_visit_is_walked() {
        let (mut graph, [a, b, ..]) = diamond();
        let mut seen = Vec::new();
        graph.visit(a, |g, id| {
            if id == b {
                g.add_child_value(b, "late");
            }
            seen.push(g[id]);
            true
        });
        assert_eq!(seen, vec!["a", "b", "d", "late", "c"]);
    }

    #[test]
    fn test_try_visit_stops_on_error() {
        let (mut graph, [a, ..]) = diamond();
        let mut seen = Vec::new();
        let result = graph.try_visit(a, |g, id| {
            seen.push(g[id]);
            if g[id] == "d" {
                Err("boom")
            } else {
                Ok(true)
            }
        });
        assert_eq!(result, Err("boom"));
        assert_eq!(seen, vec!["a", "b", "d"]);
    }

    #[test]
    fn test_cycle_detected() {
        let (mut graph, [a, _, _, d]) = diamond();
        graph.add_child(d, a);
        assert!(!graph.is_acyclic());
    }
}
