// src/dag/graph.rs

use std::collections::{HashMap, HashSet};

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::errors::{Result, SchedulerError};
use crate::types::TaskId;

/// Reverse adjacency of the dependency graph: for each dependency id, the
/// tasks that list it.
///
/// Keys may name ids that were never registered (or not yet registered);
/// those edges are kept so that a later registration still sees its
/// dependents, and so cancellation can follow them.
#[derive(Debug, Clone, Default)]
pub struct DependencyIndex {
    dependents: HashMap<TaskId, Vec<TaskId>>,
}

impl DependencyIndex {
    /// Record edges `dep -> task` for each (deduplicated) dependency.
    pub fn insert(&mut self, task: TaskId, deps: &[TaskId]) {
        let mut seen = HashSet::new();
        for dep in deps {
            if seen.insert(*dep) {
                self.dependents.entry(*dep).or_default().push(task);
            }
        }
    }

    /// Immediate dependents of a task, in registration order.
    pub fn dependents_of(&self, id: TaskId) -> &[TaskId] {
        self.dependents
            .get(&id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }
}

/// Check that every dependency refers to a registered task and that the
/// graph is acyclic.
///
/// `nodes` yields each registered task with its dependency list.
pub fn validate_dependencies<'a, I>(nodes: I) -> Result<()>
where
    I: IntoIterator<Item = (TaskId, &'a [TaskId])>,
{
    let nodes: Vec<(TaskId, &[TaskId])> = nodes.into_iter().collect();
    let known: HashSet<TaskId> = nodes.iter().map(|(id, _)| *id).collect();

    // Edge direction: dep -> task, so a topological order is a valid run order.
    let mut graph: DiGraphMap<TaskId, ()> = DiGraphMap::new();

    for (id, _) in nodes.iter() {
        graph.add_node(*id);
    }

    for (id, deps) in nodes.iter() {
        for dep in deps.iter() {
            if !known.contains(dep) {
                return Err(SchedulerError::UnknownDependency {
                    task: *id,
                    dependency: *dep,
                });
            }
            graph.add_edge(*dep, *id, ());
        }
    }

    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => Err(SchedulerError::DependencyCycle(format!(
            "cycle detected in task dependencies involving {}",
            cycle.node_id()
        ))),
    }
}
