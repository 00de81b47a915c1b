//! Workflow graph construction and dependency analysis.

use std::collections::{HashMap, HashSet, VecDeque};

use super::{Edge, Node, NodeId};
use crate::TRACING_TARGET;
use crate::error::{WorkflowError, WorkflowResult};

/// A workflow graph of nodes and edges.
///
/// Nodes keep their input order, which breaks all ordering ties
/// deterministically. Edges referencing unknown node ids are dropped at
/// construction; a dangling connection is not a reason to refuse a run.
#[derive(Debug, Clone, Default)]
pub struct WorkflowGraph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    index: HashMap<NodeId, usize>,
}

impl WorkflowGraph {
    /// Builds a graph from the caller's node and edge arrays.
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        let mut index = HashMap::with_capacity(nodes.len());
        let mut unique = Vec::with_capacity(nodes.len());
        for node in nodes {
            if index.contains_key(node.id()) {
                tracing::warn!(
                    target: TRACING_TARGET,
                    node_id = %node.id(),
                    "Duplicate node id dropped"
                );
                continue;
            }
            index.insert(node.id().clone(), unique.len());
            unique.push(node);
        }

        let edges = edges
            .into_iter()
            .filter(|edge| {
                let keep = index.contains_key(&edge.source) && index.contains_key(&edge.target);
                if !keep {
                    tracing::debug!(
                        target: TRACING_TARGET,
                        source = %edge.source,
                        target = %edge.target,
                        "Dangling edge dropped"
                    );
                }
                keep
            })
            .collect();

        Self {
            nodes: unique,
            edges,
            index,
        }
    }

    /// Returns the number of nodes in the graph.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the number of edges in the graph.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Returns whether the graph is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns an iterator over all nodes in input order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    /// Returns a reference to a node by id.
    pub fn get_node(&self, id: &NodeId) -> Option<&Node> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    /// Returns whether a node exists.
    pub fn contains_node(&self, id: &NodeId) -> bool {
        self.index.contains_key(id)
    }

    /// Returns an iterator over all edges.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter()
    }

    /// Returns edges targeting a node, in input order.
    pub fn incoming_edges<'a>(&'a self, id: &'a NodeId) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| &e.target == id)
    }

    /// Returns edges originating from a node, in input order.
    pub fn outgoing_edges<'a>(&'a self, id: &'a NodeId) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| &e.source == id)
    }

    /// Map of node id to its dependency ids (target depends on source).
    fn dependencies(&self) -> HashMap<NodeId, Vec<NodeId>> {
        let mut graph: HashMap<NodeId, Vec<NodeId>> = self
            .nodes
            .iter()
            .map(|node| (node.id().clone(), Vec::new()))
            .collect();
        for edge in &self.edges {
            if let Some(deps) = graph.get_mut(&edge.target) {
                deps.push(edge.source.clone());
            }
        }
        graph
    }

    /// Validates that the graph is free of dependency cycles.
    pub fn validate(&self) -> WorkflowResult<()> {
        #[derive(Clone, Copy, PartialEq, Eq)]
        enum State {
            Unvisited,
            Visiting,
            Visited,
        }

        let deps = self.dependencies();
        let mut states: HashMap<NodeId, State> = self
            .nodes
            .iter()
            .map(|node| (node.id().clone(), State::Unvisited))
            .collect();

        fn dfs(
            deps: &HashMap<NodeId, Vec<NodeId>>,
            node: &NodeId,
            states: &mut HashMap<NodeId, State>,
        ) -> WorkflowResult<()> {
            states.insert(node.clone(), State::Visiting);

            for dep in deps.get(node).map(Vec::as_slice).unwrap_or_default() {
                match states.get(dep) {
                    Some(State::Visiting) => return Err(WorkflowError::CyclicDependency),
                    Some(State::Unvisited) => dfs(deps, dep, states)?,
                    _ => {}
                }
            }

            states.insert(node.clone(), State::Visited);
            Ok(())
        }

        for node in &self.nodes {
            if states.get(node.id()) == Some(&State::Unvisited) {
                dfs(&deps, node.id(), &mut states)?;
            }
        }

        Ok(())
    }

    /// Returns node ids in dependency order.
    ///
    /// Kahn's algorithm, with ties broken by node input order so repeated
    /// calls produce identical output. When a cycle survives (validation
    /// bypassed or a residual cycle), the untouched nodes are appended in
    /// input order: the engine always gets a complete order to work with
    /// instead of stalling, at the cost of running the cyclic subgraph in
    /// input-order sequence.
    pub fn topological_order(&self) -> Vec<NodeId> {
        let mut in_degree: HashMap<NodeId, usize> = self
            .nodes
            .iter()
            .map(|node| (node.id().clone(), 0))
            .collect();
        for edge in &self.edges {
            if let Some(degree) = in_degree.get_mut(&edge.target) {
                *degree += 1;
            }
        }

        let mut queue: VecDeque<NodeId> = self
            .nodes
            .iter()
            .filter(|node| in_degree[node.id()] == 0)
            .map(|node| node.id().clone())
            .collect();
        let mut order = Vec::with_capacity(self.nodes.len());

        while let Some(id) = queue.pop_front() {
            for edge in self.outgoing_edges(&id) {
                let Some(degree) = in_degree.get_mut(&edge.target) else {
                    continue;
                };
                *degree -= 1;
                if *degree == 0 {
                    queue.push_back(edge.target.clone());
                }
            }
            order.push(id);
        }

        if order.len() < self.nodes.len() {
            tracing::warn!(
                target: TRACING_TARGET,
                ordered = order.len(),
                total = self.nodes.len(),
                "Topological order incomplete, appending remaining nodes in input order"
            );
            let placed: HashSet<NodeId> = order.iter().cloned().collect();
            for node in &self.nodes {
                if !placed.contains(node.id()) {
                    order.push(node.id().clone());
                }
            }
        }

        order
    }

    /// Groups nodes into batches whose dependencies are fully satisfied by
    /// earlier batches; nodes within one batch are mutually independent.
    ///
    /// Stops early when no progress is possible (a cycle); the remaining
    /// nodes stay unbatched, and the caller must treat incomplete coverage
    /// as a validation failure.
    pub fn parallel_batches(&self) -> Vec<Vec<NodeId>> {
        let deps = self.dependencies();
        let mut completed: HashSet<NodeId> = HashSet::new();
        let mut batches = Vec::new();

        while completed.len() < self.nodes.len() {
            let batch: Vec<NodeId> = self
                .nodes
                .iter()
                .filter(|node| !completed.contains(node.id()))
                .filter(|node| {
                    deps.get(node.id())
                        .map(Vec::as_slice)
                        .unwrap_or_default()
                        .iter()
                        .all(|dep| completed.contains(dep))
                })
                .map(|node| node.id().clone())
                .collect();

            if batch.is_empty() {
                break;
            }

            completed.extend(batch.iter().cloned());
            batches.push(batch);
        }

        batches
    }
}
