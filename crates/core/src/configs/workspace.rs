use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::types::DeployResult;

#[derive(Debug, Deserialize, Serialize, JsonSchema, Clone, Default)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct WorkspaceConfig {
    pub name: Option<String>,
    /// Folder holding shared configuration and the default deploy target, relative to the workspace root.
    pub common_folder: Option<String>,
    #[serde(default)]
    pub projects: Vec<ProjectEntry>,
    /// Glob patterns for package.json files to register as projects. Discovery is off when not specified.
    pub includes: Option<Vec<String>>,
    /// Glob patterns for paths to exclude from discovery.
    pub excludes: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema, Clone)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProjectEntry {
    pub package_name: String,
    pub project_folder: String,
}

pub fn parse_workspace_config(yaml_str: &str) -> DeployResult<WorkspaceConfig> {
    let config: WorkspaceConfig = serde_yaml::from_str(yaml_str)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_projects_and_discovery_globs() {
        let config = parse_workspace_config(
            r#"
name: demo
commonFolder: shared
projects:
  - packageName: "@acme/web"
    projectFolder: apps/web
includes:
  - "libs/**/package.json"
"#,
        )
        .unwrap();

        assert_eq!(config.name.as_deref(), Some("demo"));
        assert_eq!(config.common_folder.as_deref(), Some("shared"));
        assert_eq!(config.projects.len(), 1);
        assert_eq!(config.projects[0].package_name, "@acme/web");
        assert_eq!(config.projects[0].project_folder, "apps/web");
        assert_eq!(config.includes.unwrap(), vec!["libs/**/package.json"]);
    }

    #[test]
    fn rejects_unknown_keys() {
        assert!(parse_workspace_config("plugins: []\n").is_err());
    }
}
