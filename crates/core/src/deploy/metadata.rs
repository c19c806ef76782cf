//! Deployment metadata for deferred link creation
//!
//! With `symlinkCreation: "script"` no links are created during deployment.
//! Instead `deploy-metadata.json` is written at the subdeployment root and
//! the links are created later, typically on the machine that runs the
//! deployed code, with [`create_links`].

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::deploy::linker::LinkMaterializer;
use crate::deploy::links::{LinkDescriptor, LinkKind};
use crate::platform::LinkCreator;
use crate::types::{DeployError, DeployResult};

pub const DEPLOY_METADATA_FILE_NAME: &str = "deploy-metadata.json";

/// Contents of `deploy-metadata.json`. All paths are relative to the folder holding the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployMetadata {
    pub scenario_name: Option<String>,
    pub subdeployment_folder_name: Option<String>,
    pub project_folders: Vec<PathBuf>,
    pub links: Vec<LinkDescriptor>,
}

impl DeployMetadata {
    pub fn write(&self, deploy_folder: &Path) -> DeployResult<()> {
        let path = deploy_folder.join(DEPLOY_METADATA_FILE_NAME);
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, content)?;
        tracing::debug!(path = %path.display(), links = self.links.len(), "Wrote deploy metadata");
        Ok(())
    }

    pub fn read(deploy_folder: &Path) -> DeployResult<Self> {
        let path = deploy_folder.join(DEPLOY_METADATA_FILE_NAME);
        let content = std::fs::read_to_string(&path).map_err(|e| {
            DeployError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&content)
            .map_err(|e| DeployError::Config(format!("Failed to parse {}: {}", path.display(), e)))
    }

    fn absolute_links(&self, root: &Path) -> DeployResult<Vec<LinkDescriptor>> {
        self.links
            .iter()
            .map(|link| {
                if link.link_path.is_absolute() || link.target_path.is_absolute() {
                    return Err(DeployError::Config(format!(
                        "{} must only contain relative link paths",
                        DEPLOY_METADATA_FILE_NAME
                    )));
                }
                Ok(LinkDescriptor {
                    kind: link.kind,
                    link_path: root.join(&link.link_path),
                    target_path: root.join(&link.target_path),
                })
            })
            .collect()
    }
}

/// Create the links listed in a deployed folder's metadata
pub fn create_links(deploy_folder: &Path, creator: &dyn LinkCreator) -> DeployResult<usize> {
    let root = dunce::canonicalize(deploy_folder)?;
    let metadata = DeployMetadata::read(&root)?;
    let links = metadata.absolute_links(&root)?;
    LinkMaterializer::new(&root, &root, creator).deploy_all(&links)
}

/// Remove the links listed in a deployed folder's metadata. Missing links are ignored.
pub fn remove_links(deploy_folder: &Path) -> DeployResult<usize> {
    let root = dunce::canonicalize(deploy_folder)?;
    let metadata = DeployMetadata::read(&root)?;
    let mut removed = 0;

    for link in metadata.absolute_links(&root)? {
        let Ok(meta) = std::fs::symlink_metadata(&link.link_path) else {
            continue;
        };
        // Junctions and folder symlinks on Windows are removed as directories
        if cfg!(windows) && link.kind == LinkKind::FolderLink && !meta.is_file() {
            std::fs::remove_dir(&link.link_path)?;
        } else {
            std::fs::remove_file(&link.link_path)?;
        }
        removed += 1;
    }

    Ok(removed)
}
