//! Symbolic link discovery
//!
//! The [`LinkRecorder`] is fed every path the resolver and the folder copy
//! touch. It walks each path one component at a time, so a link anywhere
//! along the way is noticed, recorded once and then followed through its
//! target. Links are never treated as regular folders.

use std::collections::BTreeMap;
use std::collections::VecDeque;
use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::types::{DeployError, DeployResult};

/// Upper bound on links followed while resolving a single path
const MAX_LINK_HOPS: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LinkKind {
    FileLink,
    FolderLink,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkDescriptor {
    pub kind: LinkKind,
    pub link_path: PathBuf,
    /// Immediate target of the link, which may itself be another link
    pub target_path: PathBuf,
}

/// Records the links found inside a source root
#[derive(Debug)]
pub struct LinkRecorder {
    source_root: PathBuf,
    links: BTreeMap<PathBuf, LinkDescriptor>,
}

impl LinkRecorder {
    pub fn new(source_root: impl Into<PathBuf>) -> Self {
        Self {
            source_root: source_root.into(),
            links: BTreeMap::new(),
        }
    }

    /// Walk `path`, record every link inside the source root and return the
    /// fully resolved path.
    pub fn record(&mut self, path: &Path) -> DeployResult<PathBuf> {
        if !path.is_absolute() {
            return Err(DeployError::Materialize(format!(
                "Cannot analyze relative path {}",
                path.display()
            )));
        }

        let mut pending: VecDeque<OsString> = component_queue(path);
        let mut resolved = PathBuf::new();
        let mut hops = 0;

        while let Some(part) = pending.pop_front() {
            // `resolved` never contains a link, so `..` can be applied lexically
            if part == ".." {
                resolved.pop();
                continue;
            }

            let candidate = resolved.join(&part);
            // Roots and prefixes have no parent; nothing to inspect yet
            if candidate.parent().is_none() {
                resolved = candidate;
                continue;
            }

            let metadata = std::fs::symlink_metadata(&candidate)?;
            if !metadata.file_type().is_symlink() {
                resolved = candidate;
                continue;
            }

            hops += 1;
            if hops > MAX_LINK_HOPS {
                return Err(DeployError::Materialize(format!(
                    "Too many levels of symbolic links while resolving {}",
                    path.display()
                )));
            }

            let raw_target = std::fs::read_link(&candidate)?;
            let target = normalize(&resolved.join(raw_target));

            if candidate.starts_with(&self.source_root) && !self.links.contains_key(&candidate) {
                let kind = match std::fs::metadata(&candidate) {
                    Ok(meta) if meta.is_dir() => LinkKind::FolderLink,
                    Ok(_) => LinkKind::FileLink,
                    Err(e) => {
                        return Err(DeployError::Materialize(format!(
                            "Symbolic link {} points to {}, which cannot be read: {}",
                            candidate.display(),
                            target.display(),
                            e
                        )))
                    }
                };
                tracing::debug!(
                    link = %candidate.display(),
                    target = %target.display(),
                    ?kind,
                    "Recorded link"
                );
                self.links.insert(
                    candidate.clone(),
                    LinkDescriptor {
                        kind,
                        link_path: candidate,
                        target_path: target.clone(),
                    },
                );
            }

            let mut rest = component_queue(&target);
            rest.extend(pending);
            pending = rest;
            resolved = PathBuf::new();
        }

        Ok(resolved)
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Descriptors sorted by link path
    pub fn descriptors(&self) -> Vec<LinkDescriptor> {
        self.links.values().cloned().collect()
    }

    pub fn finish(self) -> Vec<LinkDescriptor> {
        self.links.into_values().collect()
    }
}

fn component_queue(path: &Path) -> VecDeque<OsString> {
    let mut queue = VecDeque::new();
    let mut head = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => head.push(component),
            Component::CurDir => {}
            other => {
                if !head.as_os_str().is_empty() {
                    queue.push_back(std::mem::take(&mut head).into_os_string());
                }
                queue.push_back(other.as_os_str().to_os_string());
            }
        }
    }
    if !head.as_os_str().is_empty() {
        queue.push_back(head.into_os_string());
    }
    queue
}

/// Lexically collapse `.` and `..` components
pub(crate) fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_parent_components() {
        assert_eq!(
            normalize(Path::new("/repo/a/node_modules/../../b/./c")),
            PathBuf::from("/repo/b/c")
        );
    }

    #[test]
    fn plain_paths_record_nothing() {
        let temp = tempfile::tempdir().unwrap();
        let root = dunce::canonicalize(temp.path()).unwrap();
        std::fs::create_dir_all(root.join("a/b")).unwrap();

        let mut recorder = LinkRecorder::new(&root);
        let resolved = recorder.record(&root.join("a/b")).unwrap();

        assert_eq!(resolved, root.join("a/b"));
        assert!(recorder.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn records_links_along_the_path() {
        let temp = tempfile::tempdir().unwrap();
        let root = dunce::canonicalize(temp.path()).unwrap();
        let store = root.join("store/pkg@1/node_modules/pkg");
        std::fs::create_dir_all(&store).unwrap();
        std::fs::write(store.join("package.json"), "{}").unwrap();
        std::fs::create_dir_all(root.join("app/node_modules")).unwrap();
        std::os::unix::fs::symlink(
            "../../store/pkg@1/node_modules/pkg",
            root.join("app/node_modules/pkg"),
        )
        .unwrap();

        let mut recorder = LinkRecorder::new(&root);
        let resolved = recorder
            .record(&root.join("app/node_modules/pkg/package.json"))
            .unwrap();

        assert_eq!(resolved, store.join("package.json"));
        let links = recorder.finish();
        assert_eq!(
            links,
            vec![LinkDescriptor {
                kind: LinkKind::FolderLink,
                link_path: root.join("app/node_modules/pkg"),
                target_path: store,
            }]
        );
    }

    #[cfg(unix)]
    #[test]
    fn records_chained_links_once() {
        let temp = tempfile::tempdir().unwrap();
        let root = dunce::canonicalize(temp.path()).unwrap();
        std::fs::create_dir_all(root.join("real")).unwrap();
        std::fs::write(root.join("real/file.txt"), "x").unwrap();
        std::os::unix::fs::symlink(root.join("real"), root.join("first")).unwrap();
        std::os::unix::fs::symlink("first/file.txt", root.join("second")).unwrap();

        let mut recorder = LinkRecorder::new(&root);
        let resolved = recorder.record(&root.join("second")).unwrap();
        recorder.record(&root.join("second")).unwrap();

        assert_eq!(resolved, root.join("real/file.txt"));
        let links = recorder.finish();
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].link_path, root.join("first"));
        assert_eq!(links[0].kind, LinkKind::FolderLink);
        assert_eq!(links[1].link_path, root.join("second"));
        assert_eq!(links[1].kind, LinkKind::FileLink);
        assert_eq!(links[1].target_path, root.join("first/file.txt"));
    }

    #[cfg(unix)]
    #[test]
    fn links_outside_the_root_are_followed_but_not_recorded() {
        let outside = tempfile::tempdir().unwrap();
        let inside = tempfile::tempdir().unwrap();
        let outside_root = dunce::canonicalize(outside.path()).unwrap();
        let root = dunce::canonicalize(inside.path()).unwrap();
        std::fs::create_dir_all(outside_root.join("target")).unwrap();
        std::os::unix::fs::symlink(root.join("real"), outside_root.join("link")).unwrap();
        std::fs::create_dir_all(root.join("real")).unwrap();

        let mut recorder = LinkRecorder::new(&root);
        let resolved = recorder.record(&outside_root.join("link")).unwrap();

        assert_eq!(resolved, root.join("real"));
        assert!(recorder.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn dangling_links_are_fatal() {
        let temp = tempfile::tempdir().unwrap();
        let root = dunce::canonicalize(temp.path()).unwrap();
        std::os::unix::fs::symlink(root.join("missing"), root.join("broken")).unwrap();

        let mut recorder = LinkRecorder::new(&root);
        let err = recorder.record(&root.join("broken")).unwrap_err();
        assert!(matches!(err, DeployError::Materialize(_)));
    }
}
