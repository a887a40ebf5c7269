//! Dependency ordering for components.
//!
//! [`DependencyResolver::sort`] runs three steps, each assuming the previous
//! one passed:
//!
//! 1. every dependency must name a known component
//! 2. the dependency relation must be acyclic (the first cycle found is
//!    reported as a path such as `A -> B -> C -> A`)
//! 3. components are emitted Kahn-style; when several are ready at once the
//!    [`TieBreak`] policy picks the order
//!
//! With [`TieBreak::Popularity`] the ready queue is kept sorted by how often
//! each name appears in other components' dependency lists, lowest first, and
//! equal weights stay in queue order.
//!
//! ```
//! use skeleto_core::resolver::DependencyResolver;
//!
//! let order = DependencyResolver::new()
//!     .node("A", Vec::<String>::new())
//!     .node("B", ["A"])
//!     .node("C", ["A"])
//!     .sort()
//!     .unwrap();
//!
//! assert_eq!(order, vec!["A", "B", "C"]);
//! ```

use crate::logging::{debug, trace};
use crate::options::TieBreak;
use crate::{ComponentDescriptor, Error, Result};
use std::collections::{HashMap, HashSet};

/// A name and the names it depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub name: String,
    pub dependencies: Vec<String>,
}

/// Topological sorter with cycle and missing-dependency detection.
#[derive(Debug, Clone, Default)]
pub struct DependencyResolver {
    nodes: Vec<Node>,
    tie_break: TieBreak,
}

impl DependencyResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolver over the dependency lists of the given descriptors.
    ///
    /// The lists are copied; the descriptors are left untouched.
    pub fn from_descriptors<'a, I>(descriptors: I) -> Self
    where
        I: IntoIterator<Item = &'a ComponentDescriptor>,
    {
        descriptors
            .into_iter()
            .fold(Self::new(), |resolver, d| resolver.node(d.name.clone(), d.dependencies.clone()))
    }

    pub fn node<N, I, S>(mut self, name: N, dependencies: I) -> Self
    where
        N: Into<String>,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.nodes.push(Node {
            name: name.into(),
            dependencies: dependencies.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn tie_break(mut self, tie_break: TieBreak) -> Self {
        self.tie_break = tie_break;
        self
    }

    /// Produce a total order in which every name follows its dependencies.
    pub fn sort(self) -> Result<Vec<String>> {
        self.check_missing()?;

        if let Some(path) = self.find_cycle() {
            return Err(Error::CircularDependency { path });
        }

        let order = self.order();
        if order.len() != self.nodes.len() {
            return Err(Error::Internal(format!(
                "ordered {} of {} components",
                order.len(),
                self.nodes.len()
            )));
        }

        debug!(order = ?order, "Resolved component order");
        Ok(order)
    }

    fn check_missing(&self) -> Result<()> {
        let known: HashSet<&str> = self.nodes.iter().map(|n| n.name.as_str()).collect();

        for node in &self.nodes {
            if let Some(missing) = node.dependencies.iter().find(|d| !known.contains(d.as_str())) {
                return Err(Error::UnresolvedDependency {
                    owner: node.name.clone(),
                    missing: missing.clone(),
                });
            }
        }

        Ok(())
    }

    fn find_cycle(&self) -> Option<Vec<String>> {
        let edges: HashMap<&str, &[String]> = self
            .nodes
            .iter()
            .map(|n| (n.name.as_str(), n.dependencies.as_slice()))
            .collect();

        let mut search = CycleSearch::new(&edges);

        self.nodes.iter().find_map(|n| search.visit(&n.name))
    }

    fn order(&self) -> Vec<String> {
        let weights = self.reference_counts();
        let weight = |i: &usize| weights.get(self.nodes[*i].name.as_str()).copied().unwrap_or(0);

        // name -> indices of the nodes listing it, once per occurrence
        let mut dependents: HashMap<&str, Vec<usize>> = HashMap::new();
        for (i, node) in self.nodes.iter().enumerate() {
            for dep in &node.dependencies {
                dependents.entry(dep.as_str()).or_default().push(i);
            }
        }

        let mut remaining: Vec<usize> = self.nodes.iter().map(|n| n.dependencies.len()).collect();
        let mut queue: Vec<usize> = (0..self.nodes.len()).filter(|i| remaining[*i] == 0).collect();
        self.arrange(&mut queue, &weight);

        let mut emitted: HashSet<&str> = HashSet::new();
        let mut order = Vec::with_capacity(self.nodes.len());
        while !queue.is_empty() {
            let current = queue.remove(0);
            let name = self.nodes[current].name.as_str();
            trace!(component = name, "Emitting component");
            order.push(name.to_string());
            if !emitted.insert(name) {
                continue;
            }

            let mut ready = Vec::new();
            for &i in dependents.get(name).map(Vec::as_slice).unwrap_or_default() {
                remaining[i] -= 1;
                if remaining[i] == 0 {
                    ready.push(i);
                }
            }
            // newly ready nodes join in scan order before the re-sort
            ready.sort_unstable();
            queue.extend(ready);
            self.arrange(&mut queue, &weight);
        }

        order
    }

    fn arrange(&self, queue: &mut [usize], weight: &impl Fn(&usize) -> usize) {
        match self.tie_break {
            TieBreak::Popularity => queue.sort_by_key(|i| weight(i)),
            TieBreak::ScanOrder => queue.sort_unstable(),
        }
    }

    /// How often each name appears in any dependency list.
    fn reference_counts(&self) -> HashMap<&str, usize> {
        let mut counts: HashMap<&str, usize> =
            self.nodes.iter().map(|n| (n.name.as_str(), 0)).collect();
        for dep in self.nodes.iter().flat_map(|n| &n.dependencies) {
            *counts.entry(dep.as_str()).or_insert(0) += 1;
        }
        counts
    }
}

struct Frame<'a> {
    node: &'a str,
    next: usize,
}

/// Depth-first search on an explicit stack; `path` holds the current chain.
struct CycleSearch<'a> {
    edges: &'a HashMap<&'a str, &'a [String]>,
    visited: HashSet<&'a str>,
    on_path: HashSet<&'a str>,
    path: Vec<Frame<'a>>,
}

impl<'a> CycleSearch<'a> {
    fn new(edges: &'a HashMap<&'a str, &'a [String]>) -> Self {
        Self {
            edges,
            visited: HashSet::new(),
            on_path: HashSet::new(),
            path: Vec::new(),
        }
    }

    fn visit(&mut self, root: &'a str) -> Option<Vec<String>> {
        if !self.visited.insert(root) {
            return None;
        }
        self.enter(root);

        let edges = self.edges;
        while let Some(frame) = self.path.last_mut() {
            let node = frame.node;
            let neighbors = edges.get(node).copied().unwrap_or_default();

            match neighbors.get(frame.next) {
                None => {
                    self.path.pop();
                    self.on_path.remove(node);
                }
                Some(neighbor) => {
                    frame.next += 1;
                    let neighbor = neighbor.as_str();
                    if self.on_path.contains(neighbor) {
                        return Some(self.cycle_through(neighbor));
                    }
                    if self.visited.insert(neighbor) {
                        self.enter(neighbor);
                    }
                }
            }
        }

        None
    }

    fn enter(&mut self, node: &'a str) {
        self.on_path.insert(node);
        self.path.push(Frame { node, next: 0 });
    }

    /// Current chain from `node` onward, closed by `node` again.
    fn cycle_through(&self, node: &str) -> Vec<String> {
        let start = self.path.iter().position(|f| f.node == node).unwrap_or(0);
        let mut cycle: Vec<String> = self.path[start..].iter().map(|f| f.node.to_string()).collect();
        cycle.push(node.to_string());
        cycle
    }
}

/// Order the given descriptors with the default tie-break.
pub fn resolve_order(descriptors: &[ComponentDescriptor]) -> Result<Vec<String>> {
    DependencyResolver::from_descriptors(descriptors).sort()
}
