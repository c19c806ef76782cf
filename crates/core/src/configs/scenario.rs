use std::collections::HashSet;
use std::path::{Path, PathBuf};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::types::{DeployError, DeployResult};
use crate::workspace::ProjectRegistry;

#[derive(Debug, Deserialize, Serialize, JsonSchema, Clone, Default)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ScenarioConfig {
    #[serde(rename = "$schema", skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    /// Follow devDependencies in addition to dependencies, peerDependencies and optionalDependencies.
    #[serde(default)]
    pub include_dev_dependencies: bool,
    /// Copy every file of a package instead of only the files `npm pack` would publish.
    #[serde(default)]
    pub include_npm_ignore_files: bool,
    #[serde(default)]
    pub symlink_creation: SymlinkCreation,
    #[serde(default)]
    pub project_settings: Vec<ProjectOverride>,
    pub subdeployments: Option<SubdeploymentConfig>,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SymlinkCreation {
    /// Re-create links with the native mechanism of the current platform.
    #[default]
    Default,
    /// Write deploy-metadata.json so links can be created later with `monodeploy links create`.
    Script,
    /// Do not create links.
    None,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema, Clone)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProjectOverride {
    pub project_name: String,
    pub subdeployment_folder_name: Option<String>,
    #[serde(default)]
    pub additional_projects_to_include: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema, Clone, Default)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SubdeploymentConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub subdeployment_projects: Vec<String>,
}

pub fn parse_scenario_config(json_str: &str) -> DeployResult<ScenarioConfig> {
    let config: ScenarioConfig = serde_json::from_str(json_str)?;
    Ok(config)
}

impl ScenarioConfig {
    /// Read and validate a scenario file against the registry
    pub fn load(path: &Path, registry: &ProjectRegistry) -> DeployResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            DeployError::Config(format!(
                "Failed to read deploy scenario {}: {}",
                path.display(),
                e
            ))
        })?;

        let config = parse_scenario_config(&content).map_err(|e| {
            DeployError::Config(format!(
                "Failed to parse deploy scenario {}: {}",
                path.display(),
                e
            ))
        })?;

        config.validate(registry)?;
        Ok(config)
    }

    /// Check that every project the scenario mentions is registered
    pub fn validate(&self, registry: &ProjectRegistry) -> DeployResult<()> {
        let mut seen = HashSet::new();
        for settings in &self.project_settings {
            require_project(registry, &settings.project_name, "projectSettings")?;
            if !seen.insert(settings.project_name.as_str()) {
                return Err(DeployError::Config(format!(
                    "The project '{}' appears more than once in projectSettings",
                    settings.project_name
                )));
            }
            for additional in &settings.additional_projects_to_include {
                require_project(registry, additional, "additionalProjectsToInclude")?;
            }
        }

        if let Some(subdeployments) = &self.subdeployments {
            for name in &subdeployments.subdeployment_projects {
                require_project(registry, name, "subdeploymentProjects")?;
            }
        }

        Ok(())
    }

    pub fn project_settings_for(&self, project_name: &str) -> Option<&ProjectOverride> {
        self.project_settings
            .iter()
            .find(|settings| settings.project_name == project_name)
    }
}

fn require_project(registry: &ProjectRegistry, name: &str, field: &str) -> DeployResult<()> {
    if registry.get_project_by_name(name).is_none() {
        return Err(DeployError::Config(format!(
            "The {} setting refers to '{}', which is not a project in this workspace",
            field, name
        )));
    }
    Ok(())
}

/// Location of the scenario file under `<common>/config`.
///
/// `deploy.json` is used when no scenario name is given, `deploy-<name>.json` otherwise.
pub fn scenario_file_path(common_folder: &Path, scenario_name: Option<&str>) -> DeployResult<PathBuf> {
    let file_name = match scenario_name {
        None => "deploy.json".to_string(),
        Some(name) => {
            validate_scenario_name(name)?;
            format!("deploy-{}.json", name)
        }
    };
    Ok(common_folder.join("config").join(file_name))
}

/// Scenario names are lowercase words joined by single dashes
pub fn validate_scenario_name(name: &str) -> DeployResult<()> {
    let valid = !name.is_empty()
        && name.split('-').all(|word| {
            !word.is_empty()
                && word
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        });

    if valid {
        Ok(())
    } else {
        Err(DeployError::Config(format!(
            "Invalid scenario name '{}': use lowercase letters and digits separated by single dashes",
            name
        )))
    }
}

/// JSON Schema of the scenario file, for editor completion via `$schema`
pub fn scenario_json_schema() -> DeployResult<String> {
    let schema = schemars::schema_for!(ScenarioConfig);
    Ok(serde_json::to_string_pretty(&schema)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn applies_defaults() {
        let config = parse_scenario_config(r#"{ "projectSettings": [ { "projectName": "web" } ] }"#)
            .unwrap();

        assert!(!config.include_dev_dependencies);
        assert!(!config.include_npm_ignore_files);
        assert_eq!(config.symlink_creation, SymlinkCreation::Default);
        assert!(config.subdeployments.is_none());
        assert!(config.project_settings[0]
            .additional_projects_to_include
            .is_empty());
    }

    #[test]
    fn parses_full_scenario() {
        let config = parse_scenario_config(
            r#"{
                "$schema": "https://example.com/deploy.schema.json",
                "includeDevDependencies": true,
                "includeNpmIgnoreFiles": true,
                "symlinkCreation": "script",
                "projectSettings": [
                    {
                        "projectName": "@acme/api",
                        "subdeploymentFolderName": "api-server",
                        "additionalProjectsToInclude": ["@acme/tools"]
                    }
                ],
                "subdeployments": {
                    "enabled": true,
                    "subdeploymentProjects": ["@acme/api"]
                }
            }"#,
        )
        .unwrap();

        assert!(config.include_dev_dependencies);
        assert_eq!(config.symlink_creation, SymlinkCreation::Script);
        let settings = config.project_settings_for("@acme/api").unwrap();
        assert_eq!(settings.subdeployment_folder_name.as_deref(), Some("api-server"));
        assert_eq!(settings.additional_projects_to_include, vec!["@acme/tools"]);
        let subdeployments = config.subdeployments.unwrap();
        assert!(subdeployments.enabled);
        assert_eq!(subdeployments.subdeployment_projects, vec!["@acme/api"]);
    }

    #[test]
    fn rejects_unknown_symlink_mode() {
        assert!(parse_scenario_config(r#"{ "symlinkCreation": "copy" }"#).is_err());
    }

    #[test]
    fn scenario_paths() {
        let common = Path::new("/repo/common");
        assert_eq!(
            scenario_file_path(common, None).unwrap(),
            PathBuf::from("/repo/common/config/deploy.json")
        );
        assert_eq!(
            scenario_file_path(common, Some("prod-2")).unwrap(),
            PathBuf::from("/repo/common/config/deploy-prod-2.json")
        );
    }

    #[test]
    fn rejects_bad_scenario_names() {
        for name in ["", "Prod", "prod--x", "-prod", "prod_x", "../x"] {
            assert!(validate_scenario_name(name).is_err(), "{name} should be rejected");
        }
    }

    #[test]
    fn schema_lists_scenario_keys() {
        let schema = scenario_json_schema().unwrap();
        assert!(schema.contains("includeDevDependencies"));
        assert!(schema.contains("subdeploymentProjects"));
    }
}
