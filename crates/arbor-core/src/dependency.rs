//! Dependency/impact engine over the graph store's call lists
//!
//! Nodes are unit names, or identifiers for anonymous units. An edge
//! `a -> b` exists when a record named `a` calls something that resolves to
//! a known unit named `b`. Calls that do not resolve stay on the record but
//! never become edges, so they cannot take part in impact sets or cycles.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use petgraph::Direction;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;

use crate::model::GraphRecord;

/// Names conventionally used for program or module entry.
const ENTRY_MARKERS: &[&str] = &["main", "init", "start"];

/// Forward (depends-on) and reverse (depended-on-by) maps, rebuilt from
/// scratch whenever they are needed.
pub struct DependencyGraph {
    inner: DiGraph<String, ()>,
    index: HashMap<String, NodeIndex>,
}

impl std::fmt::Debug for DependencyGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DependencyGraph")
            .field("node_count", &self.inner.node_count())
            .field("edge_count", &self.inner.edge_count())
            .finish()
    }
}

/// Result of an impact query, grouped by hop distance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImpactReport {
    pub target: String,
    pub max_depth: usize,
    pub affected: BTreeSet<String>,
    /// `by_depth[0]` holds direct callers, `by_depth[1]` their callers, ...
    pub by_depth: Vec<Vec<String>>,
}

impl DependencyGraph {
    pub fn build(records: &[GraphRecord]) -> Self {
        let mut inner = DiGraph::new();
        let mut index = HashMap::new();

        for record in records {
            let name = record.node_name();
            if !index.contains_key(name) {
                let idx = inner.add_node(name.to_string());
                index.insert(name.to_string(), idx);
            }
        }

        for record in records {
            let source = index[record.node_name()];
            for call in &record.calls {
                if let Some(&target) = resolve_call(&index, call) {
                    inner.update_edge(source, target, ());
                }
            }
        }

        tracing::debug!(
            "Built dependency graph: {} units, {} edges",
            inner.node_count(),
            inner.edge_count()
        );
        DependencyGraph { inner, index }
    }

    pub fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Known units that `name` calls.
    pub fn dependencies(&self, name: &str) -> Vec<&str> {
        self.neighbors(name, Direction::Outgoing)
    }

    /// Known units that call `name`.
    pub fn dependents(&self, name: &str) -> Vec<&str> {
        self.neighbors(name, Direction::Incoming)
    }

    /// Every unit reachable over `dependents` within `max_depth` hops,
    /// excluding `name` itself.
    pub fn impact_set(&self, name: &str, max_depth: usize) -> BTreeSet<String> {
        self.impact_report(name, max_depth).affected
    }

    pub fn impact_report(&self, name: &str, max_depth: usize) -> ImpactReport {
        let mut report = ImpactReport {
            target: name.to_string(),
            max_depth,
            affected: BTreeSet::new(),
            by_depth: Vec::new(),
        };
        let Some(&start) = self.index.get(name) else {
            return report;
        };

        let mut visited = HashSet::from([start]);
        let mut queue = VecDeque::from([(start, 0usize)]);

        while let Some((node, depth)) = queue.pop_front() {
            if depth >= max_depth {
                continue;
            }
            for caller in self.ordered_neighbors(node, Direction::Incoming) {
                if !visited.insert(caller) {
                    continue;
                }
                let caller_name = self.inner[caller].clone();
                if report.by_depth.len() <= depth {
                    report.by_depth.push(Vec::new());
                }
                report.by_depth[depth].push(caller_name.clone());
                report.affected.insert(caller_name);
                queue.push_back((caller, depth + 1));
            }
        }

        report
    }

    /// Units with at most `max_callers` callers, or whose name marks an
    /// entry. A heuristic, not a reachability proof.
    pub fn find_entry_points(&self, max_callers: usize) -> Vec<String> {
        self.inner
            .node_indices()
            .filter(|&idx| {
                let name = self.inner[idx].as_str();
                ENTRY_MARKERS.contains(&name)
                    || self
                        .inner
                        .neighbors_directed(idx, Direction::Incoming)
                        .count()
                        <= max_callers
            })
            .map(|idx| self.inner[idx].clone())
            .collect()
    }

    /// Units that call nothing known to the graph.
    pub fn find_leaves(&self) -> Vec<String> {
        self.inner
            .node_indices()
            .filter(|&idx| {
                self.inner
                    .neighbors_directed(idx, Direction::Outgoing)
                    .next()
                    .is_none()
            })
            .map(|idx| self.inner[idx].clone())
            .collect()
    }

    /// Depth-first search over `dependencies` with an explicit stack. Each
    /// back edge to a node still on the path yields one cycle, reported from
    /// that node's first occurrence and closed by repeating it.
    pub fn detect_cycles(&self) -> Vec<Vec<String>> {
        let mut cycles = Vec::new();
        let mut visited: HashSet<NodeIndex> = HashSet::new();

        for root in self.inner.node_indices() {
            if visited.contains(&root) {
                continue;
            }

            let mut path: Vec<NodeIndex> = Vec::new();
            let mut on_path: HashSet<NodeIndex> = HashSet::new();
            // Each frame is a node and the successors it has left to visit.
            let mut stack: Vec<(NodeIndex, std::vec::IntoIter<NodeIndex>)> = Vec::new();

            visited.insert(root);
            path.push(root);
            on_path.insert(root);
            stack.push((root, self.ordered_neighbors(root, Direction::Outgoing).into_iter()));

            while let Some((node, successors)) = stack.last_mut() {
                let node = *node;
                match successors.next() {
                    Some(next) if on_path.contains(&next) => {
                        let start = path.iter().position(|&n| n == next).unwrap_or(0);
                        let mut cycle: Vec<String> =
                            path[start..].iter().map(|&n| self.inner[n].clone()).collect();
                        cycle.push(self.inner[next].clone());
                        cycles.push(cycle);
                    }
                    Some(next) => {
                        if visited.insert(next) {
                            path.push(next);
                            on_path.insert(next);
                            stack.push((
                                next,
                                self.ordered_neighbors(next, Direction::Outgoing).into_iter(),
                            ));
                        }
                    }
                    None => {
                        stack.pop();
                        path.pop();
                        on_path.remove(&node);
                    }
                }
            }
        }

        cycles
    }

    /// Strongly connected components with more than one member, or a single
    /// self-recursive member. Names within a component are sorted.
    pub fn strongly_connected(&self) -> Vec<Vec<String>> {
        let mut components: Vec<Vec<String>> = tarjan_scc(&self.inner)
            .into_iter()
            .filter(|component| {
                component.len() > 1
                    || self.inner.contains_edge(component[0], component[0])
            })
            .map(|component| {
                let mut names: Vec<String> =
                    component.into_iter().map(|idx| self.inner[idx].clone()).collect();
                names.sort();
                names
            })
            .collect();
        components.sort();
        components
    }

    fn neighbors(&self, name: &str, direction: Direction) -> Vec<&str> {
        let Some(&idx) = self.index.get(name) else {
            return Vec::new();
        };
        self.ordered_neighbors(idx, direction)
            .into_iter()
            .map(|n| self.inner[n].as_str())
            .collect()
    }

    /// Neighbors in edge insertion order; petgraph yields newest first.
    fn ordered_neighbors(&self, idx: NodeIndex, direction: Direction) -> Vec<NodeIndex> {
        let mut neighbors: Vec<NodeIndex> = self.inner.neighbors_directed(idx, direction).collect();
        neighbors.reverse();
        neighbors
    }
}

/// Resolve a called name to a known unit: exact match first, then the last
/// path segment (`a.b`, `a::b`, `a->b` all resolve to `b`).
fn resolve_call<'a>(index: &'a HashMap<String, NodeIndex>, call: &str) -> Option<&'a NodeIndex> {
    if let Some(idx) = index.get(call) {
        return Some(idx);
    }
    let last = call.rsplit(['.', ':', '>']).next()?;
    if last.is_empty() || last == call {
        return None;
    }
    index.get(last)
}
