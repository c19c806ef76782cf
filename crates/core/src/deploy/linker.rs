//! Link materialization
//!
//! Runs after every folder of a subdeployment has been copied. A link is only
//! created once its remapped target exists on disk.

use std::path::Path;

use crate::deploy::links::{LinkDescriptor, LinkKind};
use crate::deploy::state::remap_path;
use crate::platform::LinkCreator;
use crate::types::{DeployError, DeployResult};

pub struct LinkMaterializer<'a> {
    source_root: &'a Path,
    target_root: &'a Path,
    creator: &'a dyn LinkCreator,
}

impl<'a> LinkMaterializer<'a> {
    pub fn new(source_root: &'a Path, target_root: &'a Path, creator: &'a dyn LinkCreator) -> Self {
        Self {
            source_root,
            target_root,
            creator,
        }
    }

    /// Create one link. Returns `false` without touching the disk when the
    /// remapped target does not exist yet.
    pub fn deploy_link(&self, link: &LinkDescriptor) -> DeployResult<bool> {
        let link_path = remap_path(self.source_root, self.target_root, &link.link_path)?;
        let target_path = remap_path(self.source_root, self.target_root, &link.target_path)?;

        if std::fs::metadata(&target_path).is_err() {
            return Ok(false);
        }

        if let Some(parent) = link_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let created = match link.kind {
            LinkKind::FolderLink => self.creator.create_folder_link(&link_path, &target_path),
            LinkKind::FileLink => self.creator.create_file_link(&link_path, &target_path),
        };
        created.map_err(|e| {
            DeployError::Materialize(format!(
                "Failed to create link {} -> {} using {}: {}",
                link_path.display(),
                target_path.display(),
                self.creator.name(),
                e
            ))
        })?;

        tracing::debug!(
            link = %link_path.display(),
            target = %target_path.display(),
            "Created link"
        );
        Ok(true)
    }

    /// Create every link, retrying in passes so that links whose target is
    /// another link can wait for it. A pass without progress is fatal.
    pub fn deploy_all(&self, links: &[LinkDescriptor]) -> DeployResult<usize> {
        let mut pending: Vec<&LinkDescriptor> = links.iter().collect();
        let mut created = 0;

        while !pending.is_empty() {
            let mut deferred = Vec::new();
            for link in &pending {
                if self.deploy_link(link)? {
                    created += 1;
                } else {
                    deferred.push(*link);
                }
            }

            if deferred.len() == pending.len() {
                let link = deferred[0];
                return Err(DeployError::Materialize(format!(
                    "Target does not exist for link {} -> {}; the target is not part of the deployment",
                    link.link_path.display(),
                    link.target_path.display()
                )));
            }
            pending = deferred;
        }

        Ok(created)
    }
}

/// Check that every link could be created once the folders are copied.
///
/// A link resolves when its remapped target exists under `target_root` or
/// lies at or below another link that resolves. Used when links are written
/// to deploy metadata instead of being created.
pub fn check_link_targets(
    source_root: &Path,
    target_root: &Path,
    links: &[LinkDescriptor],
) -> DeployResult<()> {
    let mut resolved: Vec<&Path> = Vec::new();
    let mut pending: Vec<&LinkDescriptor> = links.iter().collect();

    while !pending.is_empty() {
        let mut deferred = Vec::new();
        for link in pending.iter().copied() {
            let target_path = remap_path(source_root, target_root, &link.target_path)?;
            let reachable = std::fs::metadata(&target_path).is_ok()
                || resolved
                    .iter()
                    .any(|path| link.target_path.starts_with(path));
            if reachable {
                resolved.push(&link.link_path);
            } else {
                deferred.push(link);
            }
        }

        if deferred.len() == pending.len() {
            let link = deferred[0];
            return Err(DeployError::Materialize(format!(
                "Target does not exist for link {} -> {}; the target is not part of the deployment",
                link.link_path.display(),
                link.target_path.display()
            )));
        }
        pending = deferred;
    }

    Ok(())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::platform::PosixLinks;
    use std::path::PathBuf;

    fn roots() -> (tempfile::TempDir, PathBuf, PathBuf) {
        let temp = tempfile::tempdir().unwrap();
        let base = dunce::canonicalize(temp.path()).unwrap();
        let source = base.join("repo");
        let target = base.join("out");
        std::fs::create_dir_all(&source).unwrap();
        std::fs::create_dir_all(&target).unwrap();
        (temp, source, target)
    }

    fn folder_link(source: &Path, link: &str, target: &str) -> LinkDescriptor {
        LinkDescriptor {
            kind: LinkKind::FolderLink,
            link_path: source.join(link),
            target_path: source.join(target),
        }
    }

    #[test]
    fn missing_target_returns_false_without_side_effects() {
        let (_temp, source, target) = roots();
        let materializer = LinkMaterializer::new(&source, &target, &PosixLinks);

        let created = materializer
            .deploy_link(&folder_link(&source, "app/node_modules/lib", "libs/lib"))
            .unwrap();

        assert!(!created);
        assert!(!target.join("app").exists());
    }

    #[test]
    fn creates_link_and_parent_folder() {
        let (_temp, source, target) = roots();
        std::fs::create_dir_all(target.join("libs/lib")).unwrap();
        let materializer = LinkMaterializer::new(&source, &target, &PosixLinks);

        let created = materializer
            .deploy_link(&folder_link(&source, "app/node_modules/lib", "libs/lib"))
            .unwrap();

        assert!(created);
        let link = target.join("app/node_modules/lib");
        assert_eq!(std::fs::read_link(&link).unwrap(), PathBuf::from("../../libs/lib"));
    }

    #[test]
    fn chained_links_succeed_in_later_passes() {
        let (_temp, source, target) = roots();
        std::fs::create_dir_all(target.join("real")).unwrap();
        let materializer = LinkMaterializer::new(&source, &target, &PosixLinks);
        // "a" points at "b", which is only created after "a" is first attempted
        let links = vec![
            folder_link(&source, "a", "b"),
            folder_link(&source, "b", "real"),
        ];

        assert_eq!(materializer.deploy_all(&links).unwrap(), 2);
        assert!(target.join("a").is_dir());
    }

    #[test]
    fn link_outside_closure_is_fatal() {
        let (_temp, source, target) = roots();
        let materializer = LinkMaterializer::new(&source, &target, &PosixLinks);
        let links = vec![folder_link(&source, "app/node_modules/x", "not-copied")];

        let err = materializer.deploy_all(&links).unwrap_err();
        assert!(err.to_string().contains("Target does not exist"));
    }

    #[test]
    fn target_outside_source_root_is_fatal() {
        let (_temp, source, target) = roots();
        let materializer = LinkMaterializer::new(&source, &target, &PosixLinks);
        let link = LinkDescriptor {
            kind: LinkKind::FileLink,
            link_path: source.join("bin/tool"),
            target_path: PathBuf::from("/usr/bin/env"),
        };

        let err = materializer.deploy_link(&link).unwrap_err();
        assert!(matches!(err, DeployError::PathOutsideRoot { .. }));
    }

    #[test]
    fn link_targets_are_checked_without_creating_links() {
        let (_temp, source, target) = roots();
        std::fs::create_dir_all(target.join("libs/lib")).unwrap();
        // "app/node_modules/alias" points through a link that is never created
        let links = vec![
            folder_link(&source, "app/node_modules/alias", "app/node_modules/lib/dist"),
            folder_link(&source, "app/node_modules/lib", "libs/lib"),
        ];

        check_link_targets(&source, &target, &links).unwrap();
        assert!(!target.join("app").exists());
    }

    #[test]
    fn unchecked_link_target_outside_deployment_is_fatal() {
        let (_temp, source, target) = roots();
        std::fs::create_dir_all(target.join("apps/a")).unwrap();
        let links = vec![folder_link(&source, "apps/a/data", "shared/data")];

        let err = check_link_targets(&source, &target, &links).unwrap_err();
        assert!(matches!(err, DeployError::Materialize(_)));
        assert!(err.to_string().contains("apps/a/data"));
    }
}
