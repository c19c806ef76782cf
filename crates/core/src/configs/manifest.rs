use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::types::{DeployError, DeployResult};

pub const MANIFEST_FILE_NAME: &str = "package.json";

/// The parts of a package.json that deployment cares about
#[derive(Debug, Deserialize, Default, Clone)]
pub struct PackageManifest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub main: Option<String>,
    #[serde(default)]
    pub files: Option<Vec<String>>,
    /// Either a single path or a map of command name to path
    #[serde(default)]
    pub bin: Option<serde_json::Value>,
    #[serde(default)]
    pub dependencies: serde_json::Map<String, serde_json::Value>,
    #[serde(default, rename = "devDependencies")]
    pub dev_dependencies: serde_json::Map<String, serde_json::Value>,
    #[serde(default, rename = "peerDependencies")]
    pub peer_dependencies: serde_json::Map<String, serde_json::Value>,
    #[serde(default, rename = "optionalDependencies")]
    pub optional_dependencies: serde_json::Map<String, serde_json::Value>,
}

impl PackageManifest {
    pub fn load(path: &Path) -> DeployResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => DeployError::ManifestNotFound(path.to_path_buf()),
            _ => DeployError::Io(e),
        })?;

        serde_json::from_str(&content).map_err(|e| {
            DeployError::Config(format!("Failed to parse {}: {}", path.display(), e))
        })
    }

    /// Paths of the executables declared under `bin`
    pub fn bin_paths(&self) -> Vec<String> {
        match &self.bin {
            Some(serde_json::Value::String(path)) => vec![path.clone()],
            Some(serde_json::Value::Object(commands)) => commands
                .values()
                .filter_map(|path| path.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Names the package needs at runtime, in declaration-kind order without duplicates.
    pub fn required_dependency_names(&self, include_dev_dependencies: bool) -> Vec<String> {
        let mut maps = vec![&self.dependencies];
        if include_dev_dependencies {
            maps.push(&self.dev_dependencies);
        }
        maps.push(&self.peer_dependencies);
        maps.push(&self.optional_dependencies);

        let mut seen = HashSet::new();
        maps.into_iter()
            .flat_map(|map| map.keys())
            .filter(|name| seen.insert(*name))
            .cloned()
            .collect()
    }

    /// Classify a dependency name. Peer and optional declarations win over a
    /// duplicate entry under `dependencies` so that broken peer declarations
    /// stay tolerable.
    pub fn classify(&self, name: &str) -> DependencyKind {
        if self.peer_dependencies.contains_key(name) {
            DependencyKind::Peer
        } else if self.optional_dependencies.contains_key(name) {
            DependencyKind::Optional
        } else if self.dependencies.contains_key(name) {
            DependencyKind::Regular
        } else {
            DependencyKind::Dev
        }
    }
}

/// How a dependency edge was declared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DependencyKind {
    Regular,
    Dev,
    Peer,
    Optional,
}

impl DependencyKind {
    /// Lenient dependencies are skipped when they cannot be resolved
    pub fn is_lenient(self) -> bool {
        matches!(self, DependencyKind::Peer | DependencyKind::Optional)
    }
}
