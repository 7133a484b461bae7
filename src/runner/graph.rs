//! Dependency graph for check execution ordering.

use std::collections::{BTreeSet, HashMap};

use crate::checkup::{Check, CheckDependency, Platform};
use crate::error::{CheckupError, Result};
use crate::registry::CheckRegistry;

/// A platform-applicable check with its resolved dependencies.
pub struct GraphNode<'r> {
    check: &'r dyn Check,
    dependencies: Vec<CheckDependency>,
    resolved: Vec<String>,
}

impl<'r> GraphNode<'r> {
    pub fn check(&self) -> &'r dyn Check {
        self.check
    }

    /// Dependencies as declared by the check.
    pub fn dependencies(&self) -> &[CheckDependency] {
        &self.dependencies
    }

    /// Registered ids matched by the declared dependencies.
    pub fn resolved_dependencies(&self) -> &[String] {
        &self.resolved
    }
}

/// Checks in an order that satisfies every dependency edge.
///
/// Built with Kahn's algorithm over the platform-supported checks. Among
/// checks whose dependencies are all emitted, the first registered is
/// emitted first.
pub struct CheckupGraph<'r> {
    nodes: Vec<GraphNode<'r>>,
}

impl<'r> CheckupGraph<'r> {
    /// Sort the registry's checks supported on `platform`.
    ///
    /// Returns [`CheckupError::CyclicDependency`] when the dependency edges
    /// form a cycle; no order is produced in that case.
    pub fn build(registry: &'r CheckRegistry, platform: Platform) -> Result<Self> {
        let checks: Vec<&'r dyn Check> = registry
            .checks()
            .filter(|c| c.is_platform_supported(platform))
            .collect();
        let ids: Vec<String> = checks.iter().map(|c| c.id().to_string()).collect();

        // edges[i] holds the indices node i waits for
        let mut edges: Vec<BTreeSet<usize>> = Vec::with_capacity(checks.len());
        let mut declared: Vec<Vec<CheckDependency>> = Vec::with_capacity(checks.len());
        for (i, check) in checks.iter().enumerate() {
            let deps = check.dependencies(&ids);
            let waits_for: BTreeSet<usize> = ids
                .iter()
                .enumerate()
                .filter(|(j, id)| *j != i && deps.iter().any(|d| d.matches(id)))
                .map(|(j, _)| j)
                .collect();
            edges.push(waits_for);
            declared.push(deps);
        }

        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); checks.len()];
        for (i, waits_for) in edges.iter().enumerate() {
            for &j in waits_for {
                dependents[j].push(i);
            }
        }

        let mut in_degree: Vec<usize> = edges.iter().map(BTreeSet::len).collect();
        let mut ready: BTreeSet<usize> = in_degree
            .iter()
            .enumerate()
            .filter(|(_, &d)| d == 0)
            .map(|(i, _)| i)
            .collect();

        let mut order = Vec::with_capacity(checks.len());
        while let Some(i) = ready.pop_first() {
            order.push(i);
            for &dependent in &dependents[i] {
                in_degree[dependent] -= 1;
                if in_degree[dependent] == 0 {
                    ready.insert(dependent);
                }
            }
        }

        if order.len() != checks.len() {
            let remaining: Vec<usize> = (0..checks.len()).filter(|i| in_degree[*i] > 0).collect();
            let cycle = find_cycle(&edges, &remaining)
                .map(|path| path.iter().map(|&i| ids[i].as_str()).collect::<Vec<_>>())
                .unwrap_or_else(|| remaining.iter().map(|&i| ids[i].as_str()).collect());
            return Err(CheckupError::CyclicDependency {
                cycle: cycle.join(" -> "),
            });
        }

        let mut declared: Vec<Option<Vec<CheckDependency>>> =
            declared.into_iter().map(Some).collect();
        let nodes = order
            .into_iter()
            .map(|i| GraphNode {
                check: checks[i],
                dependencies: declared[i].take().unwrap_or_default(),
                resolved: edges[i].iter().map(|&j| ids[j].clone()).collect(),
            })
            .collect();

        Ok(Self { nodes })
    }

    /// Nodes in execution order.
    pub fn nodes(&self) -> &[GraphNode<'r>] {
        &self.nodes
    }

    /// Check ids in execution order.
    pub fn order(&self) -> Vec<&str> {
        self.nodes.iter().map(|n| n.check.id()).collect()
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode<'r>> {
        self.nodes
            .iter()
            .find(|n| n.check.id().eq_ignore_ascii_case(id))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Find a cycle among `candidates`, returning the path with the start repeated at the end.
fn find_cycle(edges: &[BTreeSet<usize>], candidates: &[usize]) -> Option<Vec<usize>> {
    #[derive(Clone, Copy, PartialEq)]
    enum State {
        Unvisited,
        Visiting,
        Visited,
    }

    fn dfs(
        node: usize,
        edges: &[BTreeSet<usize>],
        state: &mut HashMap<usize, State>,
        path: &mut Vec<usize>,
    ) -> Option<Vec<usize>> {
        state.insert(node, State::Visiting);
        path.push(node);

        for &dep in &edges[node] {
            match state.get(&dep).copied() {
                Some(State::Visiting) => {
                    let start = path.iter().position(|&n| n == dep)?;
                    let mut cycle = path[start..].to_vec();
                    cycle.push(dep);
                    return Some(cycle);
                }
                Some(State::Unvisited) => {
                    if let Some(cycle) = dfs(dep, edges, state, path) {
                        return Some(cycle);
                    }
                }
                Some(State::Visited) | None => {}
            }
        }

        path.pop();
        state.insert(node, State::Visited);
        None
    }

    let mut state: HashMap<usize, State> =
        candidates.iter().map(|&n| (n, State::Unvisited)).collect();
    let mut path = Vec::new();

    for &node in candidates {
        if state.get(&node) == Some(&State::Unvisited) {
            if let Some(cycle) = dfs(node, edges, &mut state, &mut path) {
                return Some(cycle);
            }
        }
    }
    None
}
