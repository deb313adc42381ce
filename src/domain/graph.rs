//! Dependency graph for tasks
//!
//! Tasks with an `id` tag are nodes. A `+token` on a task adds an edge from
//! the task whose id is `token` to the declaring task, so edges point from a
//! dependency to its dependents. Tasks without an id take no part in cycle
//! detection. Node weights are positions in the task slice the graph was
//! built from.

use std::collections::{HashMap, HashSet};

use petgraph::algo::is_cyclic_directed;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;

use super::task::Task;

/// A dependency graph over a slice of tasks
#[derive(Debug, Default)]
pub struct DependencyGraph {
    /// Edges run dependency -> dependent; weights are task positions
    graph: DiGraph<usize, ()>,

    /// Map from task id to node index
    node_map: HashMap<String, NodeIndex>,
}

/// One level of the depth-first traversal
struct Frame {
    node: NodeIndex,
    successors: Vec<NodeIndex>,
    next: usize,
}

impl DependencyGraph {
    /// Builds the graph; when several tasks share an id the first one owns it
    pub fn from_tasks(tasks: &[Task]) -> Self {
        let mut graph = Self::default();

        for (index, task) in tasks.iter().enumerate() {
            if let Some(id) = &task.id {
                if !graph.node_map.contains_key(id) {
                    let node = graph.graph.add_node(index);
                    graph.node_map.insert(id.clone(), node);
                }
            }
        }

        for task in tasks {
            let Some(task_node) = task.id.as_ref().and_then(|id| graph.node_map.get(id)) else {
                continue;
            };
            let task_node = *task_node;
            for dependency in &task.dependencies {
                if let Some(dep_node) = graph.node_map.get(dependency) {
                    graph.graph.update_edge(*dep_node, task_node, ());
                }
            }
        }

        graph
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Returns true if any dependency chain loops back on itself
    pub fn has_cycles(&self) -> bool {
        is_cyclic_directed(&self.graph)
    }

    /// Successors in the order their edges were added
    fn successors(&self, node: NodeIndex) -> Vec<NodeIndex> {
        let mut successors: Vec<_> = self
            .graph
            .neighbors_directed(node, Direction::Outgoing)
            .collect();
        successors.reverse();
        successors
    }

    /// Finds dependency cycles as lists of task positions
    ///
    /// Depth-first from every unvisited node in task order. Reaching a node
    /// that is on the current path reports the path from that node onward.
    pub fn cycles(&self) -> Vec<Vec<usize>> {
        if !self.has_cycles() {
            return Vec::new();
        }

        let count = self.graph.node_count();
        let mut visited = vec![false; count];
        let mut on_path = vec![false; count];
        let mut path: Vec<NodeIndex> = Vec::new();
        let mut frames: Vec<Frame> = Vec::new();
        let mut cycles = Vec::new();

        for root in self.graph.node_indices() {
            if visited[root.index()] {
                continue;
            }
            visited[root.index()] = true;
            on_path[root.index()] = true;
            path.push(root);
            frames.push(Frame {
                node: root,
                successors: self.successors(root),
                next: 0,
            });

            while let Some(frame) = frames.last_mut() {
                let Some(&successor) = frame.successors.get(frame.next) else {
                    on_path[frame.node.index()] = false;
                    path.pop();
                    frames.pop();
                    continue;
                };
                frame.next += 1;

                if on_path[successor.index()] {
                    if let Some(start) = path.iter().position(|&n| n == successor) {
                        cycles.push(path[start..].iter().map(|&n| self.graph[n]).collect());
                    }
                } else if !visited[successor.index()] {
                    visited[successor.index()] = true;
                    on_path[successor.index()] = true;
                    path.push(successor);
                    frames.push(Frame {
                        node: successor,
                        successors: self.successors(successor),
                        next: 0,
                    });
                }
            }
        }

        cycles
    }
}

/// Dependencies that name no task id, as `(task position, dependency)`
pub fn orphan_dependencies(tasks: &[Task]) -> Vec<(usize, &str)> {
    let ids: HashSet<&str> = tasks.iter().filter_map(|t| t.id.as_deref()).collect();

    tasks
        .iter()
        .enumerate()
        .flat_map(|(index, task)| {
            task.dependencies
                .iter()
                .filter(|dependency| !ids.contains(dependency.as_str()))
                .map(move |dependency| (index, dependency.as_str()))
        })
        .collect()
}
