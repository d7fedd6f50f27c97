//! Synchronization order of resource types.
//!
//! Parents must be committed before any child referencing them is
//! resolved, so types are processed in a topological order of the
//! dependency graph declared in the resource descriptors. The order is
//! computed once, when the engine is built.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::hash::Hash;
use sync_types::ResourceType;
use thiserror::Error;

/// Errors computing a synchronization order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    /// A node depends on something that is not part of the graph.
    #[error("`{node}` depends on `{dependency}`, which is not enabled")]
    UnknownDependency {
        /// Dependent node.
        node: String,
        /// Missing dependency.
        dependency: String,
    },

    /// The declared dependencies contain a cycle.
    #[error("dependency cycle between: {}", .nodes.join(", "))]
    Cycle {
        /// Nodes that could not be ordered.
        nodes: Vec<String>,
    },
}

/// Order `nodes` so every dependency comes before its dependents.
///
/// Each entry is `(node, dependencies)`. Uses Kahn's algorithm; ties are
/// broken by input order, so the same input always yields the same order.
pub fn topological_order<T>(nodes: &[(T, Vec<T>)]) -> Result<Vec<T>, OrderError>
where
    T: Copy + Eq + Hash + fmt::Display,
{
    let index: HashMap<T, usize> = nodes
        .iter()
        .enumerate()
        .map(|(i, (node, _))| (*node, i))
        .collect();

    let mut in_degree = vec![0usize; nodes.len()];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];

    for (i, (node, deps)) in nodes.iter().enumerate() {
        for dep in deps {
            let &d = index.get(dep).ok_or_else(|| OrderError::UnknownDependency {
                node: node.to_string(),
                dependency: dep.to_string(),
            })?;
            dependents[d].push(i);
            in_degree[i] += 1;
        }
    }

    let mut queue: VecDeque<usize> = (0..nodes.len()).filter(|&i| in_degree[i] == 0).collect();
    let mut result = Vec::with_capacity(nodes.len());

    while let Some(i) = queue.pop_front() {
        result.push(nodes[i].0);
        for &child in &dependents[i] {
            in_degree[child] -= 1;
            if in_degree[child] == 0 {
                queue.push_back(child);
            }
        }
    }

    if result.len() != nodes.len() {
        let nodes = nodes
            .iter()
            .enumerate()
            .filter(|&(i, _)| in_degree[i] > 0)
            .map(|(_, (node, _))| node.to_string())
            .collect();
        return Err(OrderError::Cycle { nodes });
    }

    Ok(result)
}

/// Synchronization order for the enabled resource types.
///
/// Every parent of an enabled type must itself be enabled; otherwise its
/// children could never resolve. Duplicates in `enabled` are ignored.
pub fn resource_order(enabled: &[ResourceType]) -> Result<Vec<ResourceType>, OrderError> {
    let nodes: Vec<(ResourceType, Vec<ResourceType>)> = ResourceType::ALL
        .iter()
        .filter(|t| enabled.contains(t))
        .map(|t| (*t, t.parents().collect()))
        .collect();
    topological_order(&nodes)
}
