//! Dependency closure resolution
//!
//! Starting from a project's package.json, every runtime dependency is
//! located the way Node's module loader would find it: by probing
//! `node_modules/<name>` in the requiring folder and each of its ancestors.
//! Links met on the way are handed to the [`LinkRecorder`] and resolution
//! continues through their real targets, so the collected folders are always
//! real package roots.
//!
//! [`LinkRecorder`]: crate::deploy::links::LinkRecorder

use std::path::{Path, PathBuf};

use petgraph::graph::NodeIndex;

use crate::configs::manifest::{DependencyKind, PackageManifest, MANIFEST_FILE_NAME};
use crate::deploy::links::LinkRecorder;
use crate::deploy::state::DeployState;
use crate::types::{DeployError, DeployResult};

const DEPENDENCY_STORE: &str = "node_modules";
const FALLBACK_ENTRY_POINT: &str = "index.js";

struct PendingManifest {
    manifest_path: PathBuf,
    dependent: Option<(NodeIndex, DependencyKind)>,
}

/// Add the folder of `manifest_path` and the folders of everything it
/// transitively requires to `state.folders`.
pub fn resolve(manifest_path: &Path, state: &mut DeployState) -> DeployResult<()> {
    let mut stack = vec![PendingManifest {
        manifest_path: manifest_path.to_path_buf(),
        dependent: None,
    }];

    while let Some(pending) = stack.pop() {
        let folder = pending
            .manifest_path
            .parent()
            .ok_or_else(|| DeployError::ManifestNotFound(pending.manifest_path.clone()))?;

        let (node, added) = state.folders.insert(folder);
        if let Some((dependent, kind)) = pending.dependent {
            state.folders.add_edge(dependent, node, kind);
        }
        if !added {
            continue;
        }

        tracing::debug!(folder = %folder.display(), "Collecting package folder");

        let manifest = PackageManifest::load(&pending.manifest_path)?;
        let mut next = Vec::new();

        for name in manifest.required_dependency_names(state.include_dev_dependencies) {
            let kind = manifest.classify(&name);
            match find_package_folder(&name, folder, &mut state.link_recorder)? {
                Some(dependency_folder) => next.push(PendingManifest {
                    manifest_path: dependency_folder.join(MANIFEST_FILE_NAME),
                    dependent: Some((node, kind)),
                }),
                None if kind.is_lenient() => {
                    tracing::debug!(
                        dependency = %name,
                        manifest = %pending.manifest_path.display(),
                        ?kind,
                        "Skipping unresolved dependency"
                    );
                }
                None => {
                    return Err(DeployError::Resolution {
                        dependency: name,
                        manifest: pending.manifest_path.clone(),
                    })
                }
            }
        }

        // Reversed so that dependencies are visited in declaration order
        stack.extend(next.into_iter().rev());
    }

    Ok(())
}

/// Locate the real package folder that `require(name)` would load from `base_folder`.
///
/// Returns `Ok(None)` when no ancestor `node_modules` folder provides the package.
pub fn find_package_folder(
    name: &str,
    base_folder: &Path,
    link_recorder: &mut LinkRecorder,
) -> DeployResult<Option<PathBuf>> {
    for folder in base_folder.ancestors() {
        if folder.file_name().is_some_and(|n| n == DEPENDENCY_STORE) {
            continue;
        }

        let candidate = folder.join(DEPENDENCY_STORE).join(name);
        let entry_file = [MANIFEST_FILE_NAME, FALLBACK_ENTRY_POINT]
            .iter()
            .map(|file| candidate.join(file))
            .find(|path| path.is_file());

        if let Some(entry_file) = entry_file {
            let real_path = link_recorder.record(&entry_file)?;
            return nearest_manifest_folder(&real_path).map(Some);
        }
    }

    Ok(None)
}

fn nearest_manifest_folder(resolved_file: &Path) -> DeployResult<PathBuf> {
    resolved_file
        .ancestors()
        .skip(1)
        .find(|folder| folder.join(MANIFEST_FILE_NAME).is_file())
        .map(Path::to_path_buf)
        .ok_or_else(|| DeployError::ManifestNotFound(resolved_file.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configs::scenario::ScenarioConfig;

    struct Fixture {
        _temp: tempfile::TempDir,
        root: PathBuf,
    }

    impl Fixture {
        fn new() -> Self {
            let temp = tempfile::tempdir().unwrap();
            let root = dunce::canonicalize(temp.path()).unwrap();
            Self { _temp: temp, root }
        }

        fn package(&self, folder: &str, manifest: &str) -> PathBuf {
            let dir = self.root.join(folder);
            std::fs::create_dir_all(&dir).unwrap();
            std::fs::write(dir.join(MANIFEST_FILE_NAME), manifest).unwrap();
            dir
        }

        fn state(&self, include_dev_dependencies: bool) -> DeployState {
            let scenario = ScenarioConfig {
                include_dev_dependencies,
                ..Default::default()
            };
            DeployState::new(&self.root, &self.root.join("out"), &scenario)
        }
    }

    #[test]
    fn collects_runtime_closure_and_skips_missing_peers() {
        let fx = Fixture::new();
        let a = fx.package(
            "a",
            r#"{
                "name": "a",
                "dependencies": { "b": "1.0.0" },
                "devDependencies": { "c": "1.0.0" },
                "peerDependencies": { "d": "1.0.0" }
            }"#,
        );
        let b = fx.package("a/node_modules/b", r#"{ "name": "b" }"#);
        fx.package("a/node_modules/c", r#"{ "name": "c" }"#);

        let mut state = fx.state(false);
        resolve(&a.join(MANIFEST_FILE_NAME), &mut state).unwrap();

        assert_eq!(state.folders.sorted_folders(), vec![a, b]);
    }

    #[test]
    fn dev_dependencies_follow_policy() {
        let fx = Fixture::new();
        let a = fx.package("a", r#"{ "devDependencies": { "c": "1.0.0" } }"#);
        let c = fx.package("a/node_modules/c", r#"{ "name": "c" }"#);

        let mut state = fx.state(true);
        resolve(&a.join(MANIFEST_FILE_NAME), &mut state).unwrap();

        assert_eq!(state.folders.sorted_folders(), vec![a, c]);
    }

    #[test]
    fn missing_regular_dependency_is_fatal() {
        let fx = Fixture::new();
        let a = fx.package("a", r#"{ "dependencies": { "ghost": "1.0.0" } }"#);

        let mut state = fx.state(false);
        let err = resolve(&a.join(MANIFEST_FILE_NAME), &mut state).unwrap_err();

        match err {
            DeployError::Resolution {
                dependency,
                manifest,
            } => {
                assert_eq!(dependency, "ghost");
                assert_eq!(manifest, a.join(MANIFEST_FILE_NAME));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_optional_dependency_is_skipped() {
        let fx = Fixture::new();
        let a = fx.package("a", r#"{ "optionalDependencies": { "fsevents": "2" } }"#);

        let mut state = fx.state(false);
        resolve(&a.join(MANIFEST_FILE_NAME), &mut state).unwrap();

        assert_eq!(state.folders.len(), 1);
    }

    #[test]
    fn dependencies_are_found_in_ancestor_stores() {
        let fx = Fixture::new();
        let a = fx.package("apps/a", r#"{ "dependencies": { "@scope/shared": "1" } }"#);
        let shared = fx.package("node_modules/@scope/shared", r#"{ "name": "@scope/shared" }"#);

        let mut state = fx.state(false);
        resolve(&a.join(MANIFEST_FILE_NAME), &mut state).unwrap();

        assert_eq!(state.folders.sorted_folders(), vec![a, shared]);
    }

    #[test]
    fn cycles_terminate_with_each_folder_once() {
        let fx = Fixture::new();
        let a = fx.package("a", r#"{ "dependencies": { "b": "1" } }"#);
        let b = fx.package("node_modules/b", r#"{ "dependencies": { "c": "1" } }"#);
        let c = fx.package("node_modules/c", r#"{ "dependencies": { "b": "1" } }"#);

        let mut state = fx.state(false);
        resolve(&a.join(MANIFEST_FILE_NAME), &mut state).unwrap();

        assert_eq!(state.folders.sorted_folders(), vec![a, b, c]);
        assert_eq!(state.folders.edges().len(), 3);
    }

    #[test]
    fn package_without_manifest_resolves_to_nearest_manifest_folder() {
        let fx = Fixture::new();
        let a = fx.package("a", r#"{ "dependencies": { "loose": "1" } }"#);
        std::fs::create_dir_all(a.join("node_modules/loose")).unwrap();
        std::fs::write(a.join("node_modules/loose/index.js"), "").unwrap();

        let mut state = fx.state(false);
        resolve(&a.join(MANIFEST_FILE_NAME), &mut state).unwrap();

        assert_eq!(state.folders.sorted_folders(), vec![a]);
    }

    #[test]
    fn entry_point_without_any_manifest_is_reported() {
        let temp = tempfile::tempdir().unwrap();
        let root = dunce::canonicalize(temp.path()).unwrap();
        std::fs::create_dir_all(root.join("node_modules/loose")).unwrap();
        std::fs::write(root.join("node_modules/loose/index.js"), "").unwrap();

        let mut recorder = LinkRecorder::new(&root);
        let err = find_package_folder("loose", &root, &mut recorder).unwrap_err();
        assert!(matches!(err, DeployError::ManifestNotFound(_)));
    }

    #[cfg(unix)]
    #[test]
    fn linked_dependencies_resolve_to_real_folders() {
        let fx = Fixture::new();
        let app = fx.package("apps/app", r#"{ "dependencies": { "lib": "workspace:*" } }"#);
        let lib = fx.package("libs/lib", r#"{ "name": "lib" }"#);
        std::fs::create_dir_all(app.join("node_modules")).unwrap();
        std::os::unix::fs::symlink("../../../libs/lib", app.join("node_modules/lib")).unwrap();

        let mut state = fx.state(false);
        resolve(&app.join(MANIFEST_FILE_NAME), &mut state).unwrap();

        assert_eq!(state.folders.sorted_folders(), vec![app.clone(), lib.clone()]);
        let links = state.link_recorder.finish();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].link_path, app.join("node_modules/lib"));
        assert_eq!(links[0].target_path, lib);
    }
}
