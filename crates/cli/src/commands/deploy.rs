use std::path::PathBuf;

use anyhow::Result;
use colored::*;
use monodeploy_core::configs::scenario::SymlinkCreation;
use monodeploy_core::deploy::metadata::DEPLOY_METADATA_FILE_NAME;
use monodeploy_core::deploy_manager::{DeployManager, DeployOptions};

pub fn execute(
    manager: &DeployManager,
    scenario_name: Option<String>,
    overwrite_existing: bool,
    target_folder: Option<PathBuf>,
) -> Result<()> {
    let label = scenario_name.as_deref().unwrap_or("default");
    println!("{} {}", "Deploying scenario".bold(), label.cyan());
    println!();

    let report = manager
        .deploy_scenario(&DeployOptions {
            scenario_name,
            overwrite_existing,
            target_folder,
        })
        .map_err(|e| anyhow::anyhow!("Deployment failed: {}", e))?;

    for subdeployment in &report.subdeployments {
        let heading = subdeployment.folder_name.as_deref().unwrap_or("(root)");
        println!("{}", heading.blue().bold());
        println!("  {} {}", "projects:".dimmed(), subdeployment.projects.join(", "));
        println!(
            "  {} {} folders, {} files",
            "copied:".dimmed(),
            subdeployment.folders_copied,
            subdeployment.files_copied
        );
        match report.symlink_creation {
            SymlinkCreation::Default => println!(
                "  {} {} of {}",
                "links created:".dimmed(),
                subdeployment.links_created,
                subdeployment.links_recorded
            ),
            SymlinkCreation::Script => println!(
                "  {} {} links written to {}",
                "deferred:".dimmed(),
                subdeployment.links_recorded,
                subdeployment.target_folder.join(DEPLOY_METADATA_FILE_NAME).display()
            ),
            SymlinkCreation::None => println!(
                "  {} {} links skipped",
                "links:".dimmed(),
                subdeployment.links_recorded
            ),
        }
    }

    println!();
    println!(
        "{} {} {}",
        "✓".green().bold(),
        "Deployed to".green().bold(),
        report.target_folder.display()
    );

    Ok(())
}
