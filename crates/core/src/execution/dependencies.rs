//! Task dependency management
//!
//! This module orders a task sequence so that every task runs after the
//! prerequisites it declares, keeping the declared order wherever the
//! prerequisites leave a choice.

use std::collections::HashMap;
use std::hash::Hash;

use petgraph::algo::is_cyclic_directed;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;

use crate::tasks::TaskKind;
use crate::types::{ArestorError, ArestorResult};

/// Order `tasks` so that prerequisites come first
pub fn order_tasks(tasks: &[TaskKind]) -> ArestorResult<Vec<TaskKind>> {
    order_by_prerequisites(tasks, |task| task.prerequisites().to_vec())
}

/// Stable topological order of `items`.
///
/// Prerequisites that are not part of `items` are ignored and duplicates keep
/// their first position. A cycle is an error.
pub fn order_by_prerequisites<T, F>(items: &[T], prerequisites: F) -> ArestorResult<Vec<T>>
where
    T: Copy + Eq + Hash + std::fmt::Debug,
    F: Fn(&T) -> Vec<T>,
{
    let mut graph: DiGraph<T, ()> = DiGraph::new();
    let mut nodes: HashMap<T, NodeIndex> = HashMap::new();
    for item in items {
        if !nodes.contains_key(item) {
            nodes.insert(*item, graph.add_node(*item));
        }
    }

    for (item, &node) in &nodes {
        for prerequisite in prerequisites(item) {
            if let Some(&before) = nodes.get(&prerequisite) {
                graph.add_edge(before, node, ());
            }
        }
    }

    if is_cyclic_directed(&graph) {
        return Err(ArestorError::Task(format!(
            "Circular prerequisites between {:?}",
            items
        )));
    }

    // Kahn's algorithm, always picking the earliest declared ready node.
    // Node indices follow declaration order.
    let mut in_degree: Vec<usize> = graph
        .node_indices()
        .map(|node| graph.neighbors_directed(node, Direction::Incoming).count())
        .collect();
    let mut ordered = Vec::with_capacity(graph.node_count());

    while ordered.len() < graph.node_count() {
        let next = graph
            .node_indices()
            .find(|node| in_degree[node.index()] == 0)
            .ok_or_else(|| ArestorError::Task("Unresolvable task order".to_string()))?;

        in_degree[next.index()] = usize::MAX;
        for dependent in graph.neighbors_directed(next, Direction::Outgoing) {
            in_degree[dependent.index()] -= 1;
        }
        ordered.push(graph[next]);
    }

    Ok(ordered)
}
