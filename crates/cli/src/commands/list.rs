use anyhow::Result;
use colored::*;
use monodeploy_core::deploy_manager::DeployManager;

pub fn execute(manager: &DeployManager) -> Result<()> {
    let projects = manager.list_projects();

    let heading = match manager.registry.name() {
        Some(name) => format!("Projects in {}", name),
        None => "Projects".to_string(),
    };
    println!("{}", heading.bold().underline());

    if projects.is_empty() {
        println!("  {}", "No projects found".dimmed());
        return Ok(());
    }

    for project in projects {
        println!(
            "{} {}",
            project.name.blue().bold(),
            project.project_folder.display().to_string().dimmed()
        );
    }

    Ok(())
}
