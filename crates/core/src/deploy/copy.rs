//! Folder materialization
//!
//! Copies one resolved package folder into the target tree. The package's
//! own `node_modules` folder is skipped because every dependency inside it is
//! a separate resolved folder. Links are recorded rather than copied.
//! Workspace projects are copied as their published file list; installed
//! packages are already published and are copied whole.

use std::path::Path;

use walkdir::WalkDir;

use crate::deploy::packlist::PublishFilter;
use crate::deploy::state::DeployState;
use crate::types::{DeployError, DeployResult};

const DEPENDENCY_STORE: &str = "node_modules";

/// Copy `source_folder` under `state.target_folder`, returning the number of files written
pub fn copy_folder(source_folder: &Path, state: &mut DeployState) -> DeployResult<usize> {
    let target_folder = state.remap(source_folder)?;
    let filter = if state.uses_publish_filter(source_folder) {
        Some(PublishFilter::load(source_folder)?)
    } else {
        None
    };

    tracing::debug!(
        source = %source_folder.display(),
        target = %target_folder.display(),
        "Copying folder"
    );

    std::fs::create_dir_all(&target_folder)?;

    let walker = WalkDir::new(source_folder)
        .follow_links(false)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            if entry.depth() == 1 && entry.file_name() == DEPENDENCY_STORE {
                return false;
            }
            let Some(filter) = &filter else {
                return true;
            };
            let Ok(relative) = entry.path().strip_prefix(source_folder) else {
                return false;
            };
            if entry.file_type().is_dir() {
                filter.allows_dir(relative)
            } else {
                filter.allows_file(relative)
            }
        });

    let mut files_copied = 0;
    for entry in walker {
        let entry = entry.map_err(|e| {
            DeployError::Materialize(format!(
                "Failed to read directory entry under {}: {}",
                source_folder.display(),
                e
            ))
        })?;

        let file_type = entry.file_type();
        if file_type.is_symlink() {
            state.link_recorder.record(entry.path())?;
            continue;
        }

        let destination = state.remap(entry.path())?;

        if file_type.is_dir() {
            // Filtered copies only create folders that end up holding files
            if filter.is_none() {
                std::fs::create_dir_all(&destination)?;
            }
            continue;
        }

        if std::fs::symlink_metadata(&destination).is_ok() {
            return Err(DeployError::Materialize(format!(
                "Refusing to overwrite {} while copying {}",
                destination.display(),
                entry.path().display()
            )));
        }

        if let Some(parent) = destination.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::copy(entry.path(), &destination)?;
        files_copied += 1;
    }

    Ok(files_copied)
}
