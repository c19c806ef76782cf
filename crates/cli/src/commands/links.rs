use anyhow::{Context, Result};
use colored::*;
use monodeploy_core::deploy::metadata::{create_links, remove_links};
use monodeploy_core::platform::native_link_creator;

use crate::LinksCommands;

pub fn execute(command: LinksCommands) -> Result<()> {
    match command {
        LinksCommands::Create { folder } => {
            let creator = native_link_creator();
            let created = create_links(&folder, creator.as_ref())
                .with_context(|| format!("Failed to create links in {}", folder.display()))?;
            println!(
                "{} Created {} links using {}",
                "✓".green().bold(),
                created,
                creator.name()
            );
        }
        LinksCommands::Remove { folder } => {
            let removed = remove_links(&folder)
                .with_context(|| format!("Failed to remove links in {}", folder.display()))?;
            println!("{} Removed {} links", "✓".green().bold(), removed);
        }
    }

    Ok(())
}
