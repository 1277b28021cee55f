//! Dependency graph construction and validation for pipeline runs.
//!
//! Builds a directed graph from node dependencies and provides cycle
//! detection and topological ordering, so node execution order is derived
//! from declared dependencies rather than hard-coded.

use petgraph::algo::{is_cyclic_directed, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;
use thiserror::Error;

/// Errors that can occur during graph operations.
#[derive(Debug, Error)]
pub enum GraphError {
    /// Circular dependency detected.
    #[error("circular dependency detected involving: {0}")]
    CycleDetected(String),

    /// Dependency reference not found.
    #[error("dependency node not found: {0}")]
    DependencyNotFound(String),

    /// Duplicate node identifier.
    #[error("duplicate node id: {0}")]
    DuplicateNode(String),
}

/// A node declaration: an identifier plus the nodes it depends on.
#[derive(Debug, Clone)]
pub struct NodeSpec {
    pub id: String,
    pub depends_on: Vec<String>,
}

impl NodeSpec {
    /// A node with no dependencies.
    pub fn root(id: &str) -> Self {
        Self { id: id.to_string(), depends_on: Vec::new() }
    }

    /// A node gated on a single upstream node.
    pub fn after(id: &str, upstream: &str) -> Self {
        Self { id: id.to_string(), depends_on: vec![upstream.to_string()] }
    }
}

/// Validated dependency graph over pipeline nodes.
#[derive(Debug, Clone)]
pub struct PipelineGraph {
    graph: DiGraph<String, ()>,
    node_map: HashMap<String, NodeIndex>,
}

impl PipelineGraph {
    /// Builds and validates the graph.
    ///
    /// # Errors
    /// Returns an error if a node id repeats, a dependency reference does not
    /// exist, or the dependencies form a cycle.
    pub fn new(nodes: &[NodeSpec]) -> Result<Self, GraphError> {
        let mut graph = DiGraph::new();
        let mut node_map = HashMap::new();

        for node in nodes {
            if node_map.contains_key(&node.id) {
                return Err(GraphError::DuplicateNode(node.id.clone()));
            }
            let idx = graph.add_node(node.id.clone());
            node_map.insert(node.id.clone(), idx);
        }

        for node in nodes {
            let to = node_map[&node.id];
            for dep in &node.depends_on {
                let from = node_map
                    .get(dep)
                    .ok_or_else(|| GraphError::DependencyNotFound(dep.clone()))?;
                // Edge runs dependency -> dependent: upstream completes first.
                graph.add_edge(*from, to, ());
            }
        }

        if is_cyclic_directed(&graph) {
            let id = nodes.first().map_or_else(String::new, |n| n.id.clone());
            return Err(GraphError::CycleDetected(id));
        }

        Ok(Self { graph, node_map })
    }

    /// Node ids in an order where every dependency precedes its dependents.
    pub fn execution_order(&self) -> Result<Vec<String>, GraphError> {
        let sorted = toposort(&self.graph, None).map_err(|cycle| {
            GraphError::CycleDetected(self.graph[cycle.node_id()].clone())
        })?;
        Ok(sorted.into_iter().map(|idx| self.graph[idx].clone()).collect())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.node_map.contains_key(id)
    }
}
