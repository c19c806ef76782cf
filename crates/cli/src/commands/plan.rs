use anyhow::Result;
use colored::*;
use monodeploy_core::deploy_manager::DeployManager;

pub fn execute(manager: &DeployManager, scenario_name: Option<&str>, json: bool) -> Result<()> {
    let plan = manager
        .plan_scenario(scenario_name)
        .map_err(|e| anyhow::anyhow!("Failed to resolve scenario: {}", e))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    println!(
        "{} {}",
        "Deployment plan for".bold(),
        plan.scenario_file.display().to_string().cyan()
    );

    for subdeployment in &plan.subdeployments {
        println!();
        let heading = subdeployment.folder_name.as_deref().unwrap_or("(root)");
        println!("{}", heading.blue().bold().underline());
        println!("  {} {}", "projects:".dimmed(), subdeployment.projects.join(", "));

        println!("\n  {}:", "Folders".bold());
        for (i, folder) in subdeployment.folders.iter().enumerate() {
            println!("    {}. {}", i + 1, folder.display());
        }

        if !subdeployment.dependencies.is_empty() {
            println!("\n  {}:", "Dependencies".bold());
            for edge in &subdeployment.dependencies {
                println!(
                    "    {} {} {}",
                    edge.dependent.display(),
                    "->".dimmed(),
                    edge.dependency.display()
                );
            }
        }

        if !subdeployment.links.is_empty() {
            println!("\n  {}:", "Links".bold());
            for link in &subdeployment.links {
                println!(
                    "    {} {} {}",
                    link.link_path.display(),
                    "=>".dimmed(),
                    link.target_path.display()
                );
            }
        }
    }

    Ok(())
}
