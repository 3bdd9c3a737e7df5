// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Computation graph: operation nodes connected by data and control edges.
//!
//! # Type-State Pattern
//!
//! ```text
//! ComputationGraph<Loaded>     — nodes parsed, references unresolved.
//!       │  .validate()
//!       ▼
//! ComputationGraph<Validated>  — names unique, inputs resolved to indices,
//!                                nodes in topological order.
//! ```
//!
//! Evaluators only ever see a `Validated` graph, so they can rely on
//! `inputs_of(i)` pointing at indices strictly smaller than `i`.

use crate::{GraphError, InputRef, OpNode};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

// ── Type-state markers ─────────────────────────────────────────────

/// Marker: graph has been parsed but not validated.
#[derive(Debug, Clone)]
pub struct Loaded;

/// Marker: graph has been validated and topologically ordered.
#[derive(Debug, Clone)]
pub struct Validated;

/// Sealed trait for graph states.
pub trait GraphState: fmt::Debug + Clone {}
impl GraphState for Loaded {}
impl GraphState for Validated {}

// ── Edge ───────────────────────────────────────────────────────────

/// A resolved input of a validated node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Edge {
    /// Index of the producing node.
    pub producer: usize,
    /// Output slot of the producer.
    pub output: usize,
    /// `true` for control dependencies (no tensor is transferred).
    pub control: bool,
}

// ── ComputationGraph ───────────────────────────────────────────────

/// A dataflow graph of [`OpNode`]s.
#[derive(Debug, Clone)]
pub struct ComputationGraph<S: GraphState = Loaded> {
    /// Graph name, usually the dataset folder it was loaded from.
    pub name: String,
    nodes: Vec<OpNode>,
    index: BTreeMap<String, usize>,
    edges: Vec<Vec<Edge>>,
    consumers: Vec<Vec<usize>>,
    _state: std::marker::PhantomData<S>,
}

// ── Loaded state ───────────────────────────────────────────────────

impl ComputationGraph<Loaded> {
    /// Creates a graph in the `Loaded` state from nodes in any order.
    pub fn new(name: impl Into<String>, nodes: Vec<OpNode>) -> Self {
        Self {
            name: name.into(),
            nodes,
            index: BTreeMap::new(),
            edges: Vec::new(),
            consumers: Vec::new(),
            _state: std::marker::PhantomData,
        }
    }

    /// Returns the nodes in declaration order.
    pub fn nodes(&self) -> &[OpNode] {
        &self.nodes
    }

    /// Validates the graph and transitions to the `Validated` state.
    ///
    /// # Checks
    /// - The graph is non-empty.
    /// - Node names are non-empty and unique.
    /// - Every input names an existing node.
    /// - The graph is acyclic.
    ///
    /// Nodes are reordered so every producer precedes its consumers. Among
    /// nodes that are ready at the same time, declaration order is kept.
    pub fn validate(self) -> Result<ComputationGraph<Validated>, GraphError> {
        if self.nodes.is_empty() {
            return Err(GraphError::InvalidGraph(format!(
                "graph '{}' contains no nodes",
                self.name
            )));
        }

        let mut declared: BTreeMap<&str, usize> = BTreeMap::new();
        for (i, node) in self.nodes.iter().enumerate() {
            if node.name.is_empty() {
                return Err(GraphError::InvalidNode {
                    node: format!("#{i}"),
                    detail: "node has an empty name".into(),
                });
            }
            if declared.insert(node.name.as_str(), i).is_some() {
                return Err(GraphError::InvalidGraph(format!(
                    "duplicate node name '{}'",
                    node.name
                )));
            }
        }

        // Producer indices per node, in declaration numbering.
        let mut raw_edges: Vec<Vec<(usize, &InputRef)>> = Vec::with_capacity(self.nodes.len());
        for node in &self.nodes {
            let mut resolved = Vec::with_capacity(node.inputs.len());
            for input in &node.inputs {
                let producer = *declared.get(input.node.as_str()).ok_or_else(|| {
                    GraphError::UnknownInput {
                        node: node.name.clone(),
                        input: input.to_string(),
                    }
                })?;
                resolved.push((producer, input));
            }
            raw_edges.push(resolved);
        }

        let order = topological_order(&raw_edges).ok_or_else(|| {
            GraphError::InvalidGraph(format!("graph '{}' contains a cycle", self.name))
        })?;

        let mut position = vec![0usize; self.nodes.len()];
        for (new, &old) in order.iter().enumerate() {
            position[old] = new;
        }

        let edges: Vec<Vec<Edge>> = order
            .iter()
            .map(|&old| {
                raw_edges[old]
                    .iter()
                    .map(|&(producer, input)| Edge {
                        producer: position[producer],
                        output: input.output,
                        control: input.control,
                    })
                    .collect()
            })
            .collect();

        let mut consumers = vec![Vec::new(); order.len()];
        for (consumer, inputs) in edges.iter().enumerate() {
            for edge in inputs {
                if !consumers[edge.producer].contains(&consumer) {
                    consumers[edge.producer].push(consumer);
                }
            }
        }

        let mut slots: Vec<Option<OpNode>> = self.nodes.into_iter().map(Some).collect();
        let nodes: Vec<OpNode> = order.iter().filter_map(|&old| slots[old].take()).collect();
        let index = nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.name.clone(), i))
            .collect();

        tracing::debug!(
            graph = %self.name,
            nodes = nodes.len(),
            edges = edges.iter().map(Vec::len).sum::<usize>(),
            "computation graph validated"
        );

        Ok(ComputationGraph {
            name: self.name,
            nodes,
            index,
            edges,
            consumers,
            _state: std::marker::PhantomData,
        })
    }
}

/// Kahn's algorithm, picking the lowest declared index among ready nodes.
/// Returns `None` if the graph has a cycle.
fn topological_order(inputs: &[Vec<(usize, &InputRef)>]) -> Option<Vec<usize>> {
    let n = inputs.len();
    let mut pending = vec![0usize; n];
    let mut consumers: Vec<Vec<usize>> = vec![Vec::new(); n];
    for (consumer, producers) in inputs.iter().enumerate() {
        for &(producer, _) in producers {
            pending[consumer] += 1;
            consumers[producer].push(consumer);
        }
    }

    let mut ready: BTreeSet<usize> = (0..n).filter(|&i| pending[i] == 0).collect();
    let mut order = Vec::with_capacity(n);
    while let Some(next) = ready.pop_first() {
        order.push(next);
        for &c in &consumers[next] {
            pending[c] -= 1;
            if pending[c] == 0 {
                ready.insert(c);
            }
        }
    }

    (order.len() == n).then_some(order)
}

// ── Validated state ────────────────────────────────────────────────

impl ComputationGraph<Validated> {
    /// Returns the number of nodes.
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the number of edges (data and control).
    pub fn num_edges(&self) -> usize {
        self.edges.iter().map(Vec::len).sum()
    }

    /// Returns a node by topological index.
    pub fn node(&self, index: usize) -> Option<&OpNode> {
        self.nodes.get(index)
    }

    /// Returns a node by name.
    pub fn node_by_name(&self, name: &str) -> Option<&OpNode> {
        self.index_of(name).map(|i| &self.nodes[i])
    }

    /// Returns the topological index of a node.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Returns `true` if a node with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Iterates over nodes in topological order.
    pub fn iter_nodes(&self) -> impl Iterator<Item = &OpNode> {
        self.nodes.iter()
    }

    /// Returns the resolved inputs of node `index`.
    pub fn inputs_of(&self, index: usize) -> &[Edge] {
        self.edges.get(index).map_or(&[], Vec::as_slice)
    }

    /// Returns the distinct consumers of node `index`.
    pub fn consumers_of(&self, index: usize) -> &[usize] {
        self.consumers.get(index).map_or(&[], Vec::as_slice)
    }

    /// Marks every node that `roots` (transitively) depend on, roots
    /// included. Out-of-range roots are ignored.
    pub fn ancestors_of(&self, roots: &[usize]) -> Vec<bool> {
        let mut keep = vec![false; self.nodes.len()];
        let mut stack: Vec<usize> = roots.iter().copied().filter(|&r| r < keep.len()).collect();
        while let Some(i) = stack.pop() {
            if keep[i] {
                continue;
            }
            keep[i] = true;
            stack.extend(self.edges[i].iter().map(|e| e.producer).filter(|&p| !keep[p]));
        }
        keep
    }

    /// Returns the size of the tensor an edge carries (0 for control edges).
    pub fn edge_bytes(&self, edge: &Edge) -> u64 {
        if edge.control {
            return 0;
        }
        self.nodes[edge.producer].output_bytes(edge.output)
    }

    /// Counts nodes per op type.
    pub fn op_histogram(&self) -> BTreeMap<&str, usize> {
        let mut hist = BTreeMap::new();
        for node in &self.nodes {
            *hist.entry(node.op.as_str()).or_insert(0) += 1;
        }
        hist
    }

    /// Returns a summary string describing the graph.
    pub fn summary(&self) -> String {
        let total_mb = self
            .nodes
            .iter()
            .map(|n| n.output_bytes(0))
            .sum::<u64>() as f64
            / (1024.0 * 1024.0);
        format!(
            "Graph '{}': {} nodes, {} edges, {} op types, {:.1} MB primary outputs",
            self.name,
            self.num_nodes(),
            self.num_edges(),
            self.op_histogram().len(),
            total_mb,
        )
    }
}

// ── Shared implementations ─────────────────────────────────────────

impl<S: GraphState> fmt::Display for ComputationGraph<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ComputationGraph '{}' ({} nodes):", self.name, self.nodes.len())?;
        for node in &self.nodes {
            writeln!(f, "  {}", node.summary())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Helper: a -> b -> c with a control edge a -> c.
    fn make_chain() -> Vec<OpNode> {
        vec![
            OpNode::new("a", "Const").with_output_shape(vec![8]),
            OpNode::new("b", "Relu").with_input("a").with_output_shape(vec![8]),
            OpNode::new("c", "Identity")
                .with_input("b")
                .with_control_input("a"),
        ]
    }

    #[test]
    fn test_validate_ok() {
        let g = ComputationGraph::new("chain", make_chain()).validate().unwrap();
        assert_eq!(g.num_nodes(), 3);
        assert_eq!(g.num_edges(), 3);
        assert_eq!(g.index_of("c"), Some(2));
    }

    #[test]
    fn test_validate_empty() {
        assert!(ComputationGraph::new("empty", vec![]).validate().is_err());
    }

    #[test]
    fn test_validate_duplicate_name() {
        let mut nodes = make_chain();
        nodes.push(OpNode::new("a", "Const"));
        let err = ComputationGraph::new("dup", nodes).validate().unwrap_err();
        assert!(matches!(err, GraphError::InvalidGraph(_)));
    }

    #[test]
    fn test_validate_unknown_input() {
        let nodes = vec![OpNode::new("a", "Relu").with_input("missing")];
        let err = ComputationGraph::new("bad", nodes).validate().unwrap_err();
        assert!(matches!(err, GraphError::UnknownInput { .. }));
    }

    #[test]
    fn test_validate_cycle() {
        let nodes = vec![
            OpNode::new("a", "Add").with_input("b"),
            OpNode::new("b", "Add").with_input("a"),
        ];
        let err = ComputationGraph::new("cycle", nodes).validate().unwrap_err();
        assert!(matches!(err, GraphError::InvalidGraph(_)));
    }

    #[test]
    fn test_topological_reorder() {
        let mut nodes = make_chain();
        nodes.reverse();
        let g = ComputationGraph::new("rev", nodes).validate().unwrap();
        let names: Vec<_> = g.iter_nodes().map(|n| n.name.as_str()).collect();
        assert_eq!(names, ["a", "b", "c"]);
        for i in 0..g.num_nodes() {
            assert!(g.inputs_of(i).iter().all(|e| e.producer < i));
        }
    }

    #[test]
    fn test_stable_order_for_independent_nodes() {
        let nodes = vec![
            OpNode::new("z", "Const"),
            OpNode::new("y", "Const"),
            OpNode::new("x", "Const"),
        ];
        let g = ComputationGraph::new("flat", nodes).validate().unwrap();
        let names: Vec<_> = g.iter_nodes().map(|n| n.name.as_str()).collect();
        assert_eq!(names, ["z", "y", "x"]);
    }

    #[test]
    fn test_consumers_and_ancestors() {
        let mut nodes = make_chain();
        nodes.push(OpNode::new("d", "Const"));
        let g = ComputationGraph::new("chain", nodes).validate().unwrap();
        let a = g.index_of("a").unwrap();
        let c = g.index_of("c").unwrap();
        let d = g.index_of("d").unwrap();
        assert_eq!(g.consumers_of(a).len(), 2);

        let keep = g.ancestors_of(&[c]);
        assert!(keep[a] && keep[c]);
        assert!(!keep[d]);
    }

    #[test]
    fn test_edge_bytes() {
        let g = ComputationGraph::new("chain", make_chain()).validate().unwrap();
        let c = g.index_of("c").unwrap();
        let bytes: Vec<u64> = g.inputs_of(c).iter().map(|e| g.edge_bytes(e)).collect();
        assert_eq!(bytes, vec![32, 0]);
    }

    #[test]
    fn test_op_histogram_and_summary() {
        let g = ComputationGraph::new("chain", make_chain()).validate().unwrap();
        assert_eq!(g.op_histogram().get("Relu"), Some(&1));
        let s = g.summary();
        assert!(s.contains("chain"));
        assert!(s.contains("3 nodes"));
    }

    #[test]
    fn test_display() {
        let g = ComputationGraph::new("chain", make_chain());
        let display = format!("{g}");
        assert!(display.contains("Relu"));
        assert!(display.contains("Identity"));
    }

    #[test]
    fn test_clone_is_independent() {
        let g = ComputationGraph::new("chain", make_chain()).validate().unwrap();
        let mut copy = g.clone();
        copy.name.push_str("-copy");
        assert_eq!(g.name, "chain");
        assert_eq!(copy.num_nodes(), g.num_nodes());
    }
}
