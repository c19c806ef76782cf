//! Result types for deployment operations
//!
//! Returned by [`DeployManager`](crate::deploy_manager::DeployManager) so the
//! command layer can present outcomes without reaching into the pipeline.

use std::path::PathBuf;

use serde::Serialize;

use crate::configs::manifest::DependencyKind;
use crate::configs::scenario::SymlinkCreation;
use crate::deploy::links::LinkDescriptor;

/// Outcome of a completed deployment
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployReport {
    pub target_folder: PathBuf,
    pub symlink_creation: SymlinkCreation,
    pub subdeployments: Vec<SubdeploymentReport>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubdeploymentReport {
    pub folder_name: Option<String>,
    pub target_folder: PathBuf,
    pub projects: Vec<String>,
    pub folders_copied: usize,
    pub files_copied: usize,
    pub links_recorded: usize,
    pub links_created: usize,
}

impl DeployReport {
    pub fn total_folders(&self) -> usize {
        self.subdeployments.iter().map(|s| s.folders_copied).sum()
    }

    pub fn total_files(&self) -> usize {
        self.subdeployments.iter().map(|s| s.files_copied).sum()
    }

    pub fn total_links(&self) -> usize {
        self.subdeployments.iter().map(|s| s.links_created).sum()
    }
}

/// Outcome of resolving a scenario without touching the target
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanResult {
    pub scenario_file: PathBuf,
    pub subdeployments: Vec<SubdeploymentPlan>,
}

/// Resolved closure of one subdeployment. Paths are relative to the workspace root.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubdeploymentPlan {
    pub folder_name: Option<String>,
    pub projects: Vec<String>,
    pub folders: Vec<PathBuf>,
    pub dependencies: Vec<DependencyEdge>,
    pub links: Vec<LinkDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyEdge {
    pub dependent: PathBuf,
    pub dependency: PathBuf,
    pub kind: DependencyKind,
}

/// A registered project as shown by `list`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectInfo {
    pub name: String,
    pub project_folder: PathBuf,
}
