//! High-level deployment interface
//!
//! [`DeployManager`] is the entry point for the command layer. It owns the
//! project registry and the platform link mechanism and drives a scenario
//! through its phases:
//!
//! ```text
//! load scenario -> plan subdeployments -> prepare target
//!     -> for each subdeployment: resolve -> copy folders -> create links
//! ```
//!
//! Every configuration problem is reported before the target folder is
//! touched. A failure in a later phase aborts the whole run and may leave the
//! target partially populated.
//!
//! ## Example
//!
//! ```rust,no_run
//! use monodeploy_core::deploy_manager::{DeployManager, DeployManagerConfig, DeployOptions};
//! use std::path::PathBuf;
//!
//! # fn example() -> monodeploy_core::types::DeployResult<()> {
//! let manager = DeployManager::new(DeployManagerConfig {
//!     workspace_root: PathBuf::from("."),
//! })?;
//!
//! let report = manager.deploy_scenario(&DeployOptions {
//!     scenario_name: Some("prod".to_string()),
//!     overwrite_existing: true,
//!     target_folder: None,
//! })?;
//! println!("Copied {} files", report.total_files());
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};

use crate::configs::scenario::{scenario_file_path, ScenarioConfig, SymlinkCreation};
use crate::deploy::copy::copy_folder;
use crate::deploy::linker::{check_link_targets, LinkMaterializer};
use crate::deploy::links::LinkDescriptor;
use crate::deploy::metadata::DeployMetadata;
use crate::deploy::planner::{plan_subdeployments, Subdeployment};
use crate::deploy::resolver::resolve;
use crate::deploy::state::DeployState;
use crate::platform::{native_link_creator, LinkCreator};
use crate::results::{
    DependencyEdge, DeployReport, PlanResult, ProjectInfo, SubdeploymentPlan, SubdeploymentReport,
};
use crate::types::{DeployError, DeployResult};
use crate::workspace::ProjectRegistry;

const DEFAULT_TARGET_FOLDER_NAME: &str = "deploy";

/// High-level manager that runs deployment scenarios for one workspace
pub struct DeployManager {
    pub registry: ProjectRegistry,
    link_creator: Box<dyn LinkCreator>,
}

/// Configuration for initializing a deploy manager
pub struct DeployManagerConfig {
    pub workspace_root: PathBuf,
}

/// Parameters of a single `deploy_scenario` run
#[derive(Debug, Clone, Default)]
pub struct DeployOptions {
    /// `None` selects `deploy.json`, `Some(name)` selects `deploy-<name>.json`
    pub scenario_name: Option<String>,
    /// Recursively delete the contents of a non-empty target folder
    pub overwrite_existing: bool,
    /// Explicit target folder; it must already exist
    pub target_folder: Option<PathBuf>,
}

impl DeployManager {
    /// Load the registry of the workspace at `config.workspace_root`
    pub fn new(config: DeployManagerConfig) -> DeployResult<Self> {
        let registry = ProjectRegistry::load(&config.workspace_root)?;
        Ok(Self::with_registry(registry))
    }

    pub fn with_registry(registry: ProjectRegistry) -> Self {
        Self {
            registry,
            link_creator: native_link_creator(),
        }
    }

    /// Replace the host link mechanism
    pub fn with_link_creator(mut self, link_creator: Box<dyn LinkCreator>) -> Self {
        self.link_creator = link_creator;
        self
    }

    pub fn list_projects(&self) -> Vec<ProjectInfo> {
        let mut projects: Vec<ProjectInfo> = self
            .registry
            .projects()
            .iter()
            .map(|project| ProjectInfo {
                name: project.name.clone(),
                project_folder: project
                    .project_folder
                    .strip_prefix(self.registry.root())
                    .unwrap_or(&project.project_folder)
                    .to_path_buf(),
            })
            .collect();
        projects.sort_by(|a, b| a.name.cmp(&b.name));
        projects
    }

    /// Read and validate the scenario file for `scenario_name`
    pub fn load_scenario(&self, scenario_name: Option<&str>) -> DeployResult<(PathBuf, ScenarioConfig)> {
        let path = scenario_file_path(self.registry.common_folder(), scenario_name)?;
        if !path.is_file() {
            return Err(DeployError::Config(format!(
                "The scenario config file {} does not exist",
                path.display()
            )));
        }

        let scenario = ScenarioConfig::load(&path, &self.registry)?;
        tracing::info!(scenario = %path.display(), "Loaded deploy scenario");
        Ok((path, scenario))
    }

    /// Run a scenario end to end
    pub fn deploy_scenario(&self, options: &DeployOptions) -> DeployResult<DeployReport> {
        let (_, scenario) = self.load_scenario(options.scenario_name.as_deref())?;
        let plan = plan_subdeployments(&scenario)?;

        let target_folder =
            self.prepare_target(options.target_folder.as_deref(), options.overwrite_existing)?;

        let mut subdeployments = Vec::with_capacity(plan.len());
        for subdeployment in &plan {
            let report = self.deploy_subdeployment(
                &scenario,
                subdeployment,
                &target_folder,
                options.scenario_name.as_deref(),
            )?;
            subdeployments.push(report);
        }

        tracing::info!(target = %target_folder.display(), "Deployment completed");
        Ok(DeployReport {
            target_folder,
            symlink_creation: scenario.symlink_creation,
            subdeployments,
        })
    }

    /// Resolve every subdeployment of a scenario without writing anything
    pub fn plan_scenario(&self, scenario_name: Option<&str>) -> DeployResult<PlanResult> {
        let (scenario_file, scenario) = self.load_scenario(scenario_name)?;
        let plan = plan_subdeployments(&scenario)?;
        let target_root = self.default_target_folder();

        let mut subdeployments = Vec::with_capacity(plan.len());
        for subdeployment in &plan {
            let target_folder = subdeployment_folder(&target_root, subdeployment);
            let state = self.resolve_subdeployment(&scenario, subdeployment, &target_folder)?;

            let folders = state
                .folders
                .sorted_folders()
                .iter()
                .map(|folder| state.relative(folder))
                .collect::<DeployResult<Vec<_>>>()?;

            let dependencies = state
                .folders
                .edges()
                .into_iter()
                .map(|(dependent, dependency, kind)| {
                    Ok(DependencyEdge {
                        dependent: state.relative(&dependent)?,
                        dependency: state.relative(&dependency)?,
                        kind,
                    })
                })
                .collect::<DeployResult<Vec<_>>>()?;

            subdeployments.push(SubdeploymentPlan {
                folder_name: subdeployment.folder_name.clone(),
                projects: subdeployment.project_names.clone(),
                folders,
                dependencies,
                links: relative_links(&state, &state.link_recorder.descriptors())?,
            });
        }

        Ok(PlanResult {
            scenario_file,
            subdeployments,
        })
    }

    pub fn default_target_folder(&self) -> PathBuf {
        self.registry
            .common_folder()
            .join(DEFAULT_TARGET_FOLDER_NAME)
    }

    /// Resolve the target root and make sure it is empty.
    ///
    /// An explicit folder must already exist; the default folder is created on demand.
    pub fn prepare_target(&self, target_folder: Option<&Path>, overwrite_existing: bool) -> DeployResult<PathBuf> {
        let target = match target_folder {
            Some(folder) => {
                if !folder.is_dir() {
                    return Err(DeployError::Target(format!(
                        "The specified target folder does not exist: {}",
                        folder.display()
                    )));
                }
                folder.to_path_buf()
            }
            None => {
                let folder = self.default_target_folder();
                std::fs::create_dir_all(&folder)?;
                folder
            }
        };
        let target = dunce::canonicalize(&target)?;

        if self.registry.root().starts_with(&target) {
            return Err(DeployError::Target(format!(
                "The target folder {} must not contain the workspace root",
                target.display()
            )));
        }

        let entries = std::fs::read_dir(&target)?.collect::<Result<Vec<_>, _>>()?;
        if !entries.is_empty() {
            if !overwrite_existing {
                return Err(DeployError::Target(format!(
                    "The deploy target folder is not empty: {}. You can specify --overwrite to recursively delete all folder contents.",
                    target.display()
                )));
            }

            tracing::info!(target = %target.display(), "Deleting target folder contents");
            for entry in entries {
                let path = entry.path();
                if entry.file_type()?.is_dir() {
                    std::fs::remove_dir_all(&path)?;
                } else {
                    std::fs::remove_file(&path)?;
                }
            }
        }

        Ok(target)
    }

    fn resolve_subdeployment(
        &self,
        scenario: &ScenarioConfig,
        subdeployment: &Subdeployment,
        target_folder: &Path,
    ) -> DeployResult<DeployState> {
        let mut state = DeployState::new(self.registry.root(), target_folder, scenario)
            .with_workspace_projects(
                self.registry
                    .projects()
                    .iter()
                    .map(|project| project.project_folder.clone()),
            );

        for project_name in &subdeployment.project_names {
            let project = self
                .registry
                .get_project_by_name(project_name)
                .ok_or_else(|| {
                    DeployError::Config(format!(
                        "The project '{}' is not registered in this workspace",
                        project_name
                    ))
                })?;
            tracing::info!(project = %project_name, "Analyzing project");
            resolve(&project.manifest_path(), &mut state)?;
        }

        Ok(state)
    }

    fn deploy_subdeployment(
        &self,
        scenario: &ScenarioConfig,
        subdeployment: &Subdeployment,
        target_root: &Path,
        scenario_name: Option<&str>,
    ) -> DeployResult<SubdeploymentReport> {
        let target_folder = subdeployment_folder(target_root, subdeployment);
        if let Some(name) = &subdeployment.folder_name {
            tracing::info!(subdeployment = %name, "Preparing subdeployment");
        }

        let mut state = self.resolve_subdeployment(scenario, subdeployment, &target_folder)?;
        let folders = state.folders.sorted_folders();
        std::fs::create_dir_all(&target_folder)?;

        tracing::info!(folders = folders.len(), target = %target_folder.display(), "Copying folders");
        let mut files_copied = 0;
        for folder in &folders {
            files_copied += copy_folder(folder, &mut state)?;
        }

        let links = state.link_recorder.descriptors();
        let links_created = match scenario.symlink_creation {
            SymlinkCreation::Default => {
                tracing::info!(links = links.len(), "Creating links");
                LinkMaterializer::new(self.registry.root(), &target_folder, self.link_creator.as_ref())
                    .deploy_all(&links)?
            }
            SymlinkCreation::Script => {
                check_link_targets(self.registry.root(), &target_folder, &links)?;
                let project_folders = subdeployment
                    .project_names
                    .iter()
                    .filter_map(|name| self.registry.get_project_by_name(name))
                    .map(|project| state.relative(&project.project_folder))
                    .collect::<DeployResult<Vec<_>>>()?;

                DeployMetadata {
                    scenario_name: scenario_name.map(str::to_string),
                    subdeployment_folder_name: subdeployment.folder_name.clone(),
                    project_folders,
                    links: relative_links(&state, &links)?,
                }
                .write(&target_folder)?;
                0
            }
            SymlinkCreation::None => {
                tracing::info!(links = links.len(), "Skipping link creation");
                0
            }
        };

        Ok(SubdeploymentReport {
            folder_name: subdeployment.folder_name.clone(),
            target_folder,
            projects: subdeployment.project_names.clone(),
            folders_copied: folders.len(),
            files_copied,
            links_recorded: links.len(),
            links_created,
        })
    }
}

fn subdeployment_folder(target_root: &Path, subdeployment: &Subdeployment) -> PathBuf {
    match &subdeployment.folder_name {
        Some(name) => target_root.join(name),
        None => target_root.to_path_buf(),
    }
}

fn relative_links(state: &DeployState, links: &[LinkDescriptor]) -> DeployResult<Vec<LinkDescriptor>> {
    links
        .iter()
        .map(|link| {
            Ok(LinkDescriptor {
                kind: link.kind,
                link_path: state.relative(&link.link_path)?,
                target_path: state.relative(&link.target_path)?,
            })
        })
        .collect()
}
