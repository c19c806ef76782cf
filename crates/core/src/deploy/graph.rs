use petgraph::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::configs::manifest::DependencyKind;

/// Package folders reached during resolution, indexed by canonical path.
///
/// A folder is present at most once; membership doubles as the visited set
/// of the traversal.
#[derive(Debug, Default)]
pub struct PackageGraph {
    graph: DiGraph<PathBuf, DependencyKind>,
    index: HashMap<PathBuf, NodeIndex>,
}

impl PackageGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a folder, returning its node and whether it was newly added
    pub fn insert(&mut self, folder: &Path) -> (NodeIndex, bool) {
        if let Some(&node) = self.index.get(folder) {
            return (node, false);
        }
        let node = self.graph.add_node(folder.to_path_buf());
        self.index.insert(folder.to_path_buf(), node);
        (node, true)
    }

    pub fn add_edge(&mut self, from: NodeIndex, to: NodeIndex, kind: DependencyKind) {
        if from != to && !self.graph.contains_edge(from, to) {
            self.graph.add_edge(from, to, kind);
        }
    }

    pub fn contains(&self, folder: &Path) -> bool {
        self.index.contains_key(folder)
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// All folders in sorted order, the order in which they are copied
    pub fn sorted_folders(&self) -> Vec<PathBuf> {
        let mut folders: Vec<PathBuf> = self.graph.node_weights().cloned().collect();
        folders.sort();
        folders
    }

    /// Dependency edges as `(dependent, dependency, kind)`, sorted
    pub fn edges(&self) -> Vec<(PathBuf, PathBuf, DependencyKind)> {
        let mut edges: Vec<_> = self
            .graph
            .edge_references()
            .map(|edge| {
                (
                    self.graph[edge.source()].clone(),
                    self.graph[edge.target()].clone(),
                    *edge.weight(),
                )
            })
            .collect();
        edges.sort_by(|a, b| (&a.0, &a.1).cmp(&(&b.0, &b.1)));
        edges
    }
}
