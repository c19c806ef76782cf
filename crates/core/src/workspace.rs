//! Project registry
//!
//! The registry maps package names to project folders. It is loaded from
//! `.monodeploy/workspace.yml` at the workspace root and can additionally
//! discover projects by walking the workspace for `package.json` files that
//! match the configured include globs.

use globset::{Glob, GlobSet, GlobSetBuilder};
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};

use crate::configs::manifest::{PackageManifest, MANIFEST_FILE_NAME};
use crate::configs::workspace::{parse_workspace_config, WorkspaceConfig};
use crate::types::{DeployError, DeployResult};

pub const CONFIG_FOLDER_NAME: &str = ".monodeploy";
pub const CONFIG_FILE_NAME: &str = "workspace.yml";
const DEFAULT_COMMON_FOLDER: &str = "common";

const DEFAULT_EXCLUDE_GLOBS: &[&str] = &[
    "**/.git/**",
    "**/target/**",
    "**/node_modules/**",
    "**/.monodeploy/**",
];

/// A project registered in the workspace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub name: String,
    /// Canonical absolute path of the folder holding the project's package.json
    pub project_folder: PathBuf,
}

impl Project {
    pub fn manifest_path(&self) -> PathBuf {
        self.project_folder.join(MANIFEST_FILE_NAME)
    }
}

#[derive(Debug)]
pub struct ProjectRegistry {
    name: Option<String>,
    root: PathBuf,
    common_folder: PathBuf,
    projects: Vec<Project>,
    by_name: HashMap<String, usize>,
}

impl ProjectRegistry {
    /// Load the registry from `<workspace_root>/.monodeploy/workspace.yml`
    pub fn load(workspace_root: &Path) -> DeployResult<Self> {
        let config_path = workspace_root.join(CONFIG_FOLDER_NAME).join(CONFIG_FILE_NAME);
        let content = std::fs::read_to_string(&config_path).map_err(|e| {
            DeployError::Config(format!(
                "Failed to read workspace config {}: {}",
                config_path.display(),
                e
            ))
        })?;

        let config = parse_workspace_config(&content).map_err(|e| {
            DeployError::Config(format!(
                "Failed to parse workspace config {}: {}",
                config_path.display(),
                e
            ))
        })?;

        Self::from_config(workspace_root, &config)
    }

    pub fn from_config(workspace_root: &Path, config: &WorkspaceConfig) -> DeployResult<Self> {
        let root = dunce::canonicalize(workspace_root).map_err(|e| {
            DeployError::Config(format!(
                "Workspace root {} is not accessible: {}",
                workspace_root.display(),
                e
            ))
        })?;

        let common_folder = root.join(
            config
                .common_folder
                .as_deref()
                .unwrap_or(DEFAULT_COMMON_FOLDER),
        );

        let mut registry = Self {
            name: config.name.clone(),
            root,
            common_folder,
            projects: Vec::new(),
            by_name: HashMap::new(),
        };

        for entry in &config.projects {
            let folder = registry.root.join(&entry.project_folder);
            if !folder.join(MANIFEST_FILE_NAME).is_file() {
                return Err(DeployError::Config(format!(
                    "Project '{}' has no {} in {}",
                    entry.package_name,
                    MANIFEST_FILE_NAME,
                    folder.display()
                )));
            }
            let project_folder = dunce::canonicalize(&folder)?;
            registry.register(Project {
                name: entry.package_name.clone(),
                project_folder,
            })?;
        }

        if let Some(includes) = &config.includes {
            let excludes = config.excludes.clone().unwrap_or_default();
            for project in discover_projects(&registry.root, includes, &excludes)? {
                let already_registered = registry
                    .projects
                    .iter()
                    .any(|p| p.project_folder == project.project_folder);
                if !already_registered {
                    registry.register(project)?;
                }
            }
        }

        tracing::debug!(
            root = %registry.root.display(),
            projects = registry.projects.len(),
            "Loaded project registry"
        );

        Ok(registry)
    }

    fn register(&mut self, project: Project) -> DeployResult<()> {
        if self.by_name.contains_key(&project.name) {
            return Err(DeployError::Config(format!(
                "The project name '{}' is registered more than once",
                project.name
            )));
        }
        self.by_name.insert(project.name.clone(), self.projects.len());
        self.projects.push(project);
        Ok(())
    }

    pub fn get_project_by_name(&self, name: &str) -> Option<&Project> {
        self.by_name.get(name).map(|&index| &self.projects[index])
    }

    /// Display name from workspace.yml
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    /// Canonical workspace root; every deployed path is remapped relative to it
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn common_folder(&self) -> &Path {
        &self.common_folder
    }
}

/// Strip the `@scope/` prefix from a package name
pub fn unscoped_name(package_name: &str) -> &str {
    match package_name.strip_prefix('@') {
        Some(scoped) => scoped.split_once('/').map_or(package_name, |(_, name)| name),
        None => package_name,
    }
}

fn build_glob_set(patterns: &[String]) -> DeployResult<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| {
            DeployError::Config(format!("Invalid glob pattern '{}': {}", pattern, e))
        })?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| DeployError::Config(format!("Failed to build glob set: {}", e)))
}

/// Walk the workspace breadth-first and register every matching package.json
fn discover_projects(
    root: &Path,
    includes: &[String],
    excludes: &[String],
) -> DeployResult<Vec<Project>> {
    let include_set = build_glob_set(includes)?;

    let mut exclude_patterns = DEFAULT_EXCLUDE_GLOBS
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>();
    exclude_patterns.extend(excludes.iter().cloned());
    let exclude_set = build_glob_set(&exclude_patterns)?;

    let mut projects = Vec::new();
    let mut queue = VecDeque::new();
    queue.push_back(root.to_path_buf());

    while let Some(current_dir) = queue.pop_front() {
        let Ok(entries) = std::fs::read_dir(&current_dir) else {
            continue;
        };

        let mut entries: Vec<_> = entries.flatten().collect();
        entries.sort_by_key(|entry| entry.file_name());

        for entry in entries {
            let path = entry.path();
            let relative_path = path.strip_prefix(root).unwrap_or(&path);

            if exclude_set.is_match(relative_path) {
                continue;
            }

            let Ok(file_type) = entry.file_type() else {
                continue;
            };

            if file_type.is_dir() {
                queue.push_back(path);
            } else if file_type.is_file()
                && entry.file_name() == MANIFEST_FILE_NAME
                && include_set.is_match(relative_path)
            {
                let manifest = PackageManifest::load(&path)?;
                let project_folder = current_dir.clone();
                let name = match manifest.name {
                    Some(name) => name,
                    None => project_folder
                        .file_name()
                        .and_then(|n| n.to_str())
                        .map(|s| s.to_string())
                        .ok_or_else(|| {
                            DeployError::Config(format!(
                                "Cannot derive a project name for {}",
                                path.display()
                            ))
                        })?,
                };
                projects.push(Project {
                    name,
                    project_folder,
                });
            }
        }
    }

    Ok(projects)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configs::workspace::ProjectEntry;

    fn write_package(root: &Path, folder: &str, name: Option<&str>) {
        let dir = root.join(folder);
        std::fs::create_dir_all(&dir).unwrap();
        let manifest = match name {
            Some(name) => format!(r#"{{ "name": "{}", "version": "1.0.0" }}"#, name),
            None => r#"{ "version": "1.0.0" }"#.to_string(),
        };
        std::fs::write(dir.join(MANIFEST_FILE_NAME), manifest).unwrap();
    }

    fn entry(name: &str, folder: &str) -> ProjectEntry {
        ProjectEntry {
            package_name: name.to_string(),
            project_folder: folder.to_string(),
        }
    }

    #[test]
    fn unscoped_names() {
        assert_eq!(unscoped_name("@acme/web"), "web");
        assert_eq!(unscoped_name("web"), "web");
        assert_eq!(unscoped_name("@broken"), "@broken");
    }

    #[test]
    fn registers_explicit_projects() {
        let temp = tempfile::tempdir().unwrap();
        write_package(temp.path(), "apps/web", Some("@acme/web"));

        let config = WorkspaceConfig {
            name: Some("acme".to_string()),
            projects: vec![entry("@acme/web", "apps/web")],
            ..Default::default()
        };
        let registry = ProjectRegistry::from_config(temp.path(), &config).unwrap();

        assert_eq!(registry.name(), Some("acme"));
        let project = registry.get_project_by_name("@acme/web").unwrap();
        assert!(project.project_folder.ends_with("apps/web"));
        assert_eq!(registry.common_folder(), registry.root().join("common"));
        assert!(registry.get_project_by_name("web").is_none());
    }

    #[test]
    fn rejects_project_without_manifest() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(temp.path().join("apps/web")).unwrap();

        let config = WorkspaceConfig {
            projects: vec![entry("web", "apps/web")],
            ..Default::default()
        };
        let err = ProjectRegistry::from_config(temp.path(), &config).unwrap_err();
        assert!(matches!(err, DeployError::Config(_)));
    }

    #[test]
    fn rejects_duplicate_names() {
        let temp = tempfile::tempdir().unwrap();
        write_package(temp.path(), "a", Some("dup"));
        write_package(temp.path(), "b", Some("dup"));

        let config = WorkspaceConfig {
            projects: vec![entry("dup", "a"), entry("dup", "b")],
            ..Default::default()
        };
        let err = ProjectRegistry::from_config(temp.path(), &config).unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn discovers_projects_by_glob() {
        let temp = tempfile::tempdir().unwrap();
        write_package(temp.path(), "libs/util", Some("@acme/util"));
        write_package(temp.path(), "libs/unnamed", None);
        write_package(temp.path(), "libs/util/node_modules/dep", Some("dep"));
        write_package(temp.path(), "tools/cli", Some("cli"));

        let config = WorkspaceConfig {
            includes: Some(vec!["libs/**/package.json".to_string()]),
            ..Default::default()
        };
        let registry = ProjectRegistry::from_config(temp.path(), &config).unwrap();

        let names: Vec<_> = registry.projects().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["unnamed", "@acme/util"]);
    }

    #[test]
    fn load_reads_config_file() {
        let temp = tempfile::tempdir().unwrap();
        write_package(temp.path(), "apps/api", Some("api"));
        let config_dir = temp.path().join(CONFIG_FOLDER_NAME);
        std::fs::create_dir_all(&config_dir).unwrap();
        std::fs::write(
            config_dir.join(CONFIG_FILE_NAME),
            "projects:\n  - packageName: api\n    projectFolder: apps/api\n",
        )
        .unwrap();

        let registry = ProjectRegistry::load(temp.path()).unwrap();
        assert!(registry.get_project_by_name("api").is_some());
    }
}
