use std::collections::HashSet;

use crate::configs::scenario::ScenarioConfig;
use crate::types::{DeployError, DeployResult};
use crate::workspace::unscoped_name;

/// One independently rooted output tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subdeployment {
    /// Folder under the target root, or `None` to deploy into the root itself
    pub folder_name: Option<String>,
    /// Declared projects followed by their additional projects, without duplicates
    pub project_names: Vec<String>,
}

/// Split a scenario into subdeployments
pub fn plan_subdeployments(scenario: &ScenarioConfig) -> DeployResult<Vec<Subdeployment>> {
    match &scenario.subdeployments {
        Some(config) if config.enabled => {
            if config.subdeployment_projects.is_empty() {
                return Err(DeployError::Config(
                    "Subdeployments are enabled but subdeploymentProjects is empty".to_string(),
                ));
            }

            let mut used_names = HashSet::new();
            let mut plan = Vec::new();
            for project_name in &config.subdeployment_projects {
                let folder_name = scenario
                    .project_settings_for(project_name)
                    .and_then(|settings| settings.subdeployment_folder_name.clone())
                    .unwrap_or_else(|| unscoped_name(project_name).to_string());

                validate_folder_name(&folder_name, project_name)?;
                if !used_names.insert(folder_name.clone()) {
                    return Err(DeployError::Config(format!(
                        "The subdeployment folder name \"{}\" is not unique. Use the \"subdeploymentFolderName\" setting to specify a different name.",
                        folder_name
                    )));
                }

                plan.push(Subdeployment {
                    folder_name: Some(folder_name),
                    project_names: project_closure(scenario, std::slice::from_ref(project_name)),
                });
            }
            Ok(plan)
        }
        _ => {
            if scenario.project_settings.is_empty() {
                return Err(DeployError::Config(
                    "The scenario does not list any projects in projectSettings".to_string(),
                ));
            }

            let declared: Vec<String> = scenario
                .project_settings
                .iter()
                .map(|settings| settings.project_name.clone())
                .collect();

            Ok(vec![Subdeployment {
                folder_name: None,
                project_names: project_closure(scenario, &declared),
            }])
        }
    }
}

/// Declared projects plus the additional projects each one asks for
fn project_closure(scenario: &ScenarioConfig, declared: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut names = Vec::new();

    for project_name in declared {
        let additional = scenario
            .project_settings_for(project_name)
            .map(|settings| settings.additional_projects_to_include.as_slice())
            .unwrap_or_default();

        for name in std::iter::once(project_name).chain(additional) {
            if seen.insert(name.as_str()) {
                names.push(name.clone());
            }
        }
    }

    names
}

fn validate_folder_name(folder_name: &str, project_name: &str) -> DeployResult<()> {
    let invalid = folder_name.is_empty()
        || folder_name == "."
        || folder_name == ".."
        || folder_name.contains(['/', '\\']);
    if invalid {
        return Err(DeployError::Config(format!(
            "Invalid subdeployment folder name \"{}\" for project '{}'",
            folder_name, project_name
        )));
    }
    Ok(())
}
