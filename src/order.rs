//! Class compile order.
//!
//! A class compiles after its parent, its `within` class, the interfaces it
//! implements and every `DependsOn` class. The dependencies form a graph
//! whose cycles are rejected before any class starts compiling.

use std::collections::{BTreeMap, BTreeSet};

use petgraph::Direction;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use rustc_hash::FxHashMap;
use unrealscript_compiler::ClassHeader;
use unrealscript_core::{BuildError, Name};

/// The result of ordering a batch of class headers.
#[derive(Debug)]
pub struct BuildOrder {
    /// Indices into the header list, dependencies first.
    pub order: Vec<usize>,
    /// Classes that cannot be compiled, by index.
    pub rejected: BTreeMap<usize, BuildError>,
}

/// Order `headers` for compilation. `is_known` reports classes that exist
/// outside the batch.
pub fn build_order(headers: &[ClassHeader], is_known: impl Fn(&Name) -> bool) -> BuildOrder {
    let mut graph: DiGraph<usize, ()> = DiGraph::with_capacity(headers.len(), headers.len());
    let nodes: Vec<NodeIndex> = (0..headers.len()).map(|i| graph.add_node(i)).collect();
    let index: FxHashMap<&Name, usize> = headers
        .iter()
        .enumerate()
        .map(|(i, header)| (&header.name, i))
        .collect();
    let mut rejected = BTreeMap::new();

    for (i, header) in headers.iter().enumerate() {
        for dependency in header.dependencies() {
            if *dependency == header.name {
                continue;
            }
            match index.get(dependency) {
                Some(&j) => {
                    graph.update_edge(nodes[j], nodes[i], ());
                }
                None if is_known(dependency) => {}
                None if header.super_name.as_ref() == Some(dependency) => {
                    rejected.entry(i).or_insert_with(|| BuildError::MissingSuper {
                        class: header.name.to_string(),
                        super_name: dependency.to_string(),
                    });
                }
                None => {
                    rejected.entry(i).or_insert_with(|| BuildError::UnresolvedDependency {
                        class: header.name.to_string(),
                        dependency: dependency.to_string(),
                    });
                }
            }
        }
    }

    for component in tarjan_scc(&graph) {
        if component.len() < 2 {
            continue;
        }
        let mut classes: Vec<String> = component
            .iter()
            .map(|&node| headers[graph[node]].name.to_string())
            .collect();
        classes.sort_by_key(|name| name.to_ascii_lowercase());
        for &node in &component {
            rejected.insert(
                graph[node],
                BuildError::CircularDependency {
                    classes: classes.clone(),
                },
            );
        }
    }

    // Kahn's algorithm, always taking the earliest ready class so the order
    // follows the package list and file names.
    let mut waiting: Vec<usize> = nodes
        .iter()
        .map(|&node| graph.neighbors_directed(node, Direction::Incoming).count())
        .collect();
    let mut ready: BTreeSet<usize> = (0..headers.len()).filter(|&i| waiting[i] == 0).collect();
    let mut order = Vec::with_capacity(headers.len());
    while let Some(i) = ready.pop_first() {
        order.push(i);
        for next in graph.neighbors_directed(nodes[i], Direction::Outgoing) {
            let j = graph[next];
            waiting[j] -= 1;
            if waiting[j] == 0 {
                ready.insert(j);
            }
        }
    }

    // Whatever never became ready sits behind a cycle.
    let placed: BTreeSet<usize> = order.iter().copied().collect();
    for i in 0..headers.len() {
        if placed.contains(&i) || rejected.contains_key(&i) {
            continue;
        }
        let blocker = graph
            .neighbors_directed(nodes[i], Direction::Incoming)
            .map(|node| graph[node])
            .find(|j| !placed.contains(j))
            .map(|j| headers[j].name.to_string())
            .unwrap_or_default();
        rejected.insert(
            i,
            BuildError::DependencyFailed {
                class: headers[i].name.to_string(),
                dependency: blocker,
            },
        );
    }
    order.retain(|i| !rejected.contains_key(i));
    BuildOrder { order, rejected }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(name: &str, super_name: Option<&str>, depends_on: &[&str]) -> ClassHeader {
        ClassHeader {
            name: Name::new(name),
            is_interface: false,
            super_name: super_name.map(Name::new),
            within: None,
            depends_on: depends_on.iter().map(|d| Name::new(d)).collect(),
            implements: Vec::new(),
            native: false,
        }
    }

    fn names(headers: &[ClassHeader], order: &[usize]) -> Vec<String> {
        order.iter().map(|&i| headers[i].name.to_string()).collect()
    }

    #[test]
    fn parents_and_dependencies_come_first() {
        let headers = vec![
            header("Pawn", Some("Actor"), &["Weapon"]),
            header("Actor", Some("Object"), &[]),
            header("Object", None, &[]),
            header("Weapon", Some("Actor"), &[]),
        ];
        let built = build_order(&headers, |_| false);
        assert!(built.rejected.is_empty());
        assert_eq!(names(&headers, &built.order), ["Object", "Actor", "Weapon", "Pawn"]);
    }

    #[test]
    fn circular_depends_on_rejects_both_classes() {
        let headers = vec![
            header("Object", None, &[]),
            header("A", Some("Object"), &["B"]),
            header("B", Some("Object"), &["A"]),
            header("C", Some("A"), &[]),
        ];
        let built = build_order(&headers, |_| false);
        assert_eq!(names(&headers, &built.order), ["Object"]);
        for i in [1, 2] {
            match &built.rejected[&i] {
                BuildError::CircularDependency { classes } => assert_eq!(classes, &["A", "B"]),
                other => panic!("unexpected {:?}", other),
            }
        }
        assert!(matches!(
            &built.rejected[&3],
            BuildError::DependencyFailed { dependency, .. } if dependency == "A"
        ));
    }

    #[test]
    fn unknown_names_are_rejected() {
        let headers = vec![
            header("Object", None, &[]),
            header("Pawn", Some("Actor"), &[]),
            header("Brain", Some("Object"), &["Mind"]),
            header("Hud", Some("Canvas"), &[]),
        ];
        let built = build_order(&headers, |name| name.matches("Canvas"));
        assert_eq!(names(&headers, &built.order), ["Object", "Hud"]);
        assert!(matches!(built.rejected[&1], BuildError::MissingSuper { .. }));
        assert!(matches!(built.rejected[&2], BuildError::UnresolvedDependency { .. }));
    }
}
