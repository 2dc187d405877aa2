//! A directed graph of entry-points; an edge `a -> b` means "a depends on b".

use crate::ngtsc::file_system::AbsoluteFsPath;
use indexmap::{IndexMap, IndexSet};
use std::collections::HashSet;

type Edges = IndexMap<AbsoluteFsPath, IndexSet<AbsoluteFsPath>>;

/// Adjacency-map graph that remembers insertion order of nodes and edges.
///
/// All traversals are iterative and every ordering is a function of insertion order only.
#[derive(Debug, Clone)]
pub struct DepGraph<T> {
    nodes: IndexMap<AbsoluteFsPath, T>,
    outgoing: Edges,
    incoming: Edges,
}

impl<T> Default for DepGraph<T> {
    fn default() -> Self {
        Self {
            nodes: IndexMap::new(),
            outgoing: IndexMap::new(),
            incoming: IndexMap::new(),
        }
    }
}

impl<T> DepGraph<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node, replacing the data of an existing node with the same key.
    pub fn add_node(&mut self, key: AbsoluteFsPath, data: T) {
        self.outgoing.entry(key.clone()).or_default();
        self.incoming.entry(key.clone()).or_default();
        self.nodes.insert(key, data);
    }

    pub fn has_node(&self, key: &AbsoluteFsPath) -> bool {
        self.nodes.contains_key(key)
    }

    pub fn get_node_data(&self, key: &AbsoluteFsPath) -> Option<&T> {
        self.nodes.get(key)
    }

    /// Remove a node and every edge touching it, returning its data.
    pub fn remove_node(&mut self, key: &AbsoluteFsPath) -> Option<T> {
        let data = self.nodes.shift_remove(key)?;
        if let Some(targets) = self.outgoing.shift_remove(key) {
            for target in targets {
                if let Some(sources) = self.incoming.get_mut(&target) {
                    sources.shift_remove(key);
                }
            }
        }
        if let Some(sources) = self.incoming.shift_remove(key) {
            for source in sources {
                if let Some(targets) = self.outgoing.get_mut(&source) {
                    targets.shift_remove(key);
                }
            }
        }
        Some(data)
    }

    /// Record that `from` depends on `to`. Returns `false` if either node is unknown.
    pub fn add_dependency(&mut self, from: &AbsoluteFsPath, to: &AbsoluteFsPath) -> bool {
        if !self.has_node(from) || !self.has_node(to) {
            return false;
        }
        self.outgoing[from].insert(to.clone());
        self.incoming[to].insert(from.clone());
        true
    }

    pub fn size(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &AbsoluteFsPath> {
        self.nodes.keys()
    }

    pub fn direct_dependencies_of(&self, key: &AbsoluteFsPath) -> Vec<AbsoluteFsPath> {
        self.outgoing
            .get(key)
            .map(|targets| targets.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn direct_dependants_of(&self, key: &AbsoluteFsPath) -> Vec<AbsoluteFsPath> {
        self.incoming
            .get(key)
            .map(|sources| sources.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Every node `key` transitively depends on, dependencies before dependants.
    pub fn dependencies_of(&self, key: &AbsoluteFsPath) -> Vec<AbsoluteFsPath> {
        self.reachable_from(key, &self.outgoing)
    }

    /// Every node that transitively depends on `key`.
    pub fn dependants_of(&self, key: &AbsoluteFsPath) -> Vec<AbsoluteFsPath> {
        self.reachable_from(key, &self.incoming)
    }

    /// Topological order of all nodes: every node comes after all of its dependencies.
    ///
    /// Depth-first post-order, starting from the nodes nobody depends on in insertion order.
    /// Nodes only reachable through a cycle are started from afterwards, so each node is
    /// emitted exactly once even if the graph is cyclic.
    pub fn overall_order(&self) -> Vec<AbsoluteFsPath> {
        let mut visited = HashSet::new();
        let mut order = Vec::with_capacity(self.nodes.len());

        let roots = self
            .nodes
            .keys()
            .filter(|key| self.incoming.get(*key).map_or(true, |s| s.is_empty()));
        for root in roots {
            post_order(root, &self.outgoing, &mut visited, &mut order);
        }
        for key in self.nodes.keys() {
            post_order(key, &self.outgoing, &mut visited, &mut order);
        }
        order
    }

    fn reachable_from(&self, key: &AbsoluteFsPath, edges: &Edges) -> Vec<AbsoluteFsPath> {
        if !self.has_node(key) {
            return Vec::new();
        }
        let mut visited = HashSet::new();
        let mut order = Vec::new();
        post_order(key, edges, &mut visited, &mut order);
        order.retain(|node| node != key);
        order
    }
}

fn post_order(
    start: &AbsoluteFsPath,
    edges: &Edges,
    visited: &mut HashSet<AbsoluteFsPath>,
    order: &mut Vec<AbsoluteFsPath>,
) {
    if !visited.insert(start.clone()) {
        return;
    }
    let mut stack: Vec<(AbsoluteFsPath, usize)> = vec![(start.clone(), 0)];

    while let Some((node, next_child)) = stack.last_mut() {
        let child = edges
            .get(node)
            .and_then(|children| children.get_index(*next_child))
            .cloned();
        match child {
            Some(child) => {
                *next_child += 1;
                if visited.insert(child.clone()) {
                    stack.push((child, 0));
                }
            }
            None => {
                order.push(node.clone());
                stack.pop();
            }
        }
    }
}
