use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::configs::scenario::ScenarioConfig;
use crate::deploy::graph::PackageGraph;
use crate::deploy::links::LinkRecorder;
use crate::types::{DeployError, DeployResult};

/// Per-subdeployment resolution and copy state.
///
/// One value is created for each subdeployment and threaded through the
/// resolve, copy and link phases. It is never shared between subdeployments.
#[derive(Debug)]
pub struct DeployState {
    pub source_root: PathBuf,
    pub target_folder: PathBuf,
    pub include_dev_dependencies: bool,
    pub include_npm_ignore_files: bool,
    /// Registered project folders; only these get the publish filter
    pub workspace_projects: HashSet<PathBuf>,
    pub folders: PackageGraph,
    pub link_recorder: LinkRecorder,
}

impl DeployState {
    pub fn new(source_root: &Path, target_folder: &Path, scenario: &ScenarioConfig) -> Self {
        Self {
            source_root: source_root.to_path_buf(),
            target_folder: target_folder.to_path_buf(),
            include_dev_dependencies: scenario.include_dev_dependencies,
            include_npm_ignore_files: scenario.include_npm_ignore_files,
            workspace_projects: HashSet::new(),
            folders: PackageGraph::new(),
            link_recorder: LinkRecorder::new(source_root),
        }
    }

    pub fn with_workspace_projects(mut self, folders: impl IntoIterator<Item = PathBuf>) -> Self {
        self.workspace_projects.extend(folders);
        self
    }

    /// Whether `folder` is copied as its published file list rather than as-is
    pub fn uses_publish_filter(&self, folder: &Path) -> bool {
        !self.include_npm_ignore_files && self.workspace_projects.contains(folder)
    }

    pub fn remap(&self, path: &Path) -> DeployResult<PathBuf> {
        remap_path(&self.source_root, &self.target_folder, path)
    }

    /// Path relative to the source root, which is also its path relative to the target folder
    pub fn relative(&self, path: &Path) -> DeployResult<PathBuf> {
        relative_to_root(&self.source_root, path)
    }
}

/// `target_root + relative(source_root, path)`
pub fn remap_path(source_root: &Path, target_root: &Path, path: &Path) -> DeployResult<PathBuf> {
    Ok(target_root.join(relative_to_root(source_root, path)?))
}

fn relative_to_root(source_root: &Path, path: &Path) -> DeployResult<PathBuf> {
    path.strip_prefix(source_root)
        .map(Path::to_path_buf)
        .map_err(|_| DeployError::PathOutsideRoot {
            path: path.to_path_buf(),
            root: source_root.to_path_buf(),
        })
}
