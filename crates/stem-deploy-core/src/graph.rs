//! Link dependency graph and deployment ordering.
//!
//! Units are nodes of a directed acyclic graph. An edge `A → B` means "B
//! links against A": A must be deployed, and its address known, before B is
//! linked.
//!
//! Ordering uses Kahn's algorithm. Among units that become ready at the same
//! time, the one declared first is taken first, so identical input always
//! yields the identical order.

use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap, HashMap, HashSet, VecDeque};

use crate::error::{GraphError, GraphResult};
use crate::unit::{LinkEdge, Unit};

/// Validated link graph over declared [`Unit`]s.
///
/// Units are stored in declaration order and addressed internally by index.
/// Explicit [`LinkEdge`]s are folded into each unit's `depends_on` list on
/// construction, so the stored units carry their complete dependency set.
#[derive(Debug, Clone)]
pub struct LinkGraph {
    units: Vec<Unit>,
    index: HashMap<String, usize>,
    /// `unit → {dependency, ...}`
    upstream: Vec<BTreeSet<usize>>,
    /// `dependency → {dependent, ...}`
    downstream: Vec<BTreeSet<usize>>,
}

impl LinkGraph {
    /// Build a graph from units and any additional explicit edges.
    ///
    /// Fails with [`GraphError::DuplicateUnit`] when a name is declared twice
    /// and [`GraphError::UnknownDependency`] when a dependency names an
    /// undeclared unit. An edge whose dependent is undeclared fails with
    /// [`GraphError::UnitNotFound`]. Cycles are not rejected here; they surface from
    /// [`LinkGraph::resolve_order`].
    pub fn new(units: Vec<Unit>, edges: &[LinkEdge]) -> GraphResult<Self> {
        let mut index = HashMap::with_capacity(units.len());
        for (i, unit) in units.iter().enumerate() {
            if index.insert(unit.name.clone(), i).is_some() {
                return Err(GraphError::DuplicateUnit {
                    unit: unit.name.clone(),
                });
            }
        }

        let mut units = units;
        for edge in edges {
            let Some(&i) = index.get(&edge.dependent) else {
                return Err(GraphError::UnitNotFound {
                    unit: edge.dependent.clone(),
                });
            };
            if !units[i].depends_on.contains(&edge.dependency) {
                units[i].depends_on.push(edge.dependency.clone());
            }
        }

        let mut upstream = vec![BTreeSet::new(); units.len()];
        let mut downstream = vec![BTreeSet::new(); units.len()];
        for (i, unit) in units.iter().enumerate() {
            for dependency in &unit.depends_on {
                let &j = index
                    .get(dependency)
                    .ok_or_else(|| GraphError::UnknownDependency {
                        unit: unit.name.clone(),
                        dependency: dependency.clone(),
                    })?;
                upstream[i].insert(j);
                downstream[j].insert(i);
            }
        }

        Ok(Self {
            units,
            index,
            upstream,
            downstream,
        })
    }

    /// Units in declaration order.
    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    pub fn unit(&self, name: &str) -> Option<&Unit> {
        self.index.get(name).map(|&i| &self.units[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Deployment order: every dependency precedes its dependents.
    ///
    /// Returns [`GraphError::CyclicDependency`] naming the members of one
    /// cycle when the graph cannot be ordered.
    pub fn resolve_order(&self) -> GraphResult<Vec<&Unit>> {
        let mut in_degree: Vec<usize> = self.upstream.iter().map(BTreeSet::len).collect();

        let mut ready: BinaryHeap<Reverse<usize>> = in_degree
            .iter()
            .enumerate()
            .filter(|(_, &deg)| deg == 0)
            .map(|(i, _)| Reverse(i))
            .collect();

        let mut sorted = Vec::with_capacity(self.units.len());
        while let Some(Reverse(i)) = ready.pop() {
            sorted.push(&self.units[i]);
            for &dependent in &self.downstream[i] {
                in_degree[dependent] -= 1;
                if in_degree[dependent] == 0 {
                    ready.push(Reverse(dependent));
                }
            }
        }

        if sorted.len() != self.units.len() {
            let remaining: BTreeSet<usize> = in_degree
                .iter()
                .enumerate()
                .filter(|(_, &deg)| deg > 0)
                .map(|(i, _)| i)
                .collect();
            return Err(GraphError::CyclicDependency {
                units: self.find_cycle(&remaining),
            });
        }

        Ok(sorted)
    }

    /// Group units into levels: level 0 has no dependencies, level `n` units
    /// depend only on units from lower levels. Units within a level are
    /// independent of each other and listed in declaration order.
    pub fn levels(&self) -> GraphResult<Vec<Vec<&Unit>>> {
        let order = self.resolve_order()?;
        let mut level_of: HashMap<&str, usize> = HashMap::with_capacity(order.len());
        let mut levels: Vec<Vec<&Unit>> = Vec::new();

        for unit in order {
            let level = unit
                .depends_on
                .iter()
                .filter_map(|dep| level_of.get(dep.as_str()))
                .map(|l| l + 1)
                .max()
                .unwrap_or(0);
            level_of.insert(unit.name.as_str(), level);
            if levels.len() <= level {
                levels.resize_with(level + 1, Vec::new);
            }
            levels[level].push(unit);
        }

        for level in &mut levels {
            level.sort_by_key(|u| self.index[&u.name]);
        }
        Ok(levels)
    }

    /// Direct dependencies of `name`, in declaration order.
    pub fn dependencies_of(&self, name: &str) -> GraphResult<Vec<&Unit>> {
        let i = self.position(name)?;
        Ok(self.upstream[i].iter().map(|&j| &self.units[j]).collect())
    }

    /// Direct dependents of `name`, in declaration order.
    pub fn dependents_of(&self, name: &str) -> GraphResult<Vec<&Unit>> {
        let i = self.position(name)?;
        Ok(self.downstream[i].iter().map(|&j| &self.units[j]).collect())
    }

    /// All transitive dependents of `name` (BFS over downstream edges), in
    /// declaration order.
    pub fn transitive_dependents_of(&self, name: &str) -> GraphResult<Vec<&Unit>> {
        let start = self.position(name)?;
        let mut visited = BTreeSet::new();
        let mut queue = VecDeque::from([start]);

        while let Some(current) = queue.pop_front() {
            for &dependent in &self.downstream[current] {
                if visited.insert(dependent) {
                    queue.push_back(dependent);
                }
            }
        }

        Ok(visited.into_iter().map(|i| &self.units[i]).collect())
    }

    fn position(&self, name: &str) -> GraphResult<usize> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| GraphError::UnitNotFound {
                unit: name.to_string(),
            })
    }

    /// Walk upstream from the earliest-declared unresolved unit until a unit
    /// repeats. Every unresolved unit has at least one unresolved dependency,
    /// so the walk always closes a cycle.
    fn find_cycle(&self, remaining: &BTreeSet<usize>) -> Vec<String> {
        let Some(&start) = remaining.first() else {
            return Vec::new();
        };

        let mut path: Vec<usize> = Vec::new();
        let mut seen: HashSet<usize> = HashSet::new();
        let mut current = start;

        while seen.insert(current) {
            path.push(current);
            match self.upstream[current]
                .iter()
                .find(|&&dep| remaining.contains(&dep))
            {
                Some(&next) => current = next,
                None => break,
            }
        }

        let from = path.iter().position(|&i| i == current).unwrap_or(0);
        let mut cycle: Vec<String> = path[from..]
            .iter()
            .map(|&i| self.units[i].name.clone())
            .collect();
        // Walked dependent → dependency; report dependency first.
        cycle.reverse();
        cycle
    }
}

/// Resolve a deployment order for `units` plus explicit `edges`.
///
/// Convenience wrapper over [`LinkGraph::new`] and
/// [`LinkGraph::resolve_order`] returning owned units.
pub fn resolve_order(units: Vec<Unit>, edges: &[LinkEdge]) -> GraphResult<Vec<Unit>> {
    let graph = LinkGraph::new(units, edges)?;
    let order = graph.resolve_order()?;
    Ok(order.into_iter().cloned().collect())
}
