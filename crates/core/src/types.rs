use std::path::PathBuf;

use thiserror::Error;

/// The main error type for deployment operations
#[derive(Debug, Error)]
pub enum DeployError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Target folder error: {0}")]
    Target(String),

    #[error("Unable to resolve dependency '{dependency}' required by {}", manifest.display())]
    Resolution {
        dependency: String,
        manifest: PathBuf,
    },

    #[error("Unable to find package.json for resolved path {}", .0.display())]
    ManifestNotFound(PathBuf),

    #[error("Materialization error: {0}")]
    Materialize(String),

    #[error("Path {} is not under the source root {}", path.display(), root.display())]
    PathOutsideRoot { path: PathBuf, root: PathBuf },
}

/// Result type alias for deployment operations
pub type DeployResult<T> = Result<T, DeployError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolution_error_names_dependency_and_manifest() {
        let err = DeployError::Resolution {
            dependency: "left-pad".to_string(),
            manifest: PathBuf::from("/repo/apps/web/package.json"),
        };
        let message = err.to_string();
        assert!(message.contains("'left-pad'"));
        assert!(message.contains("/repo/apps/web/package.json"));
    }

    #[test]
    fn io_errors_convert() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: DeployError = io_err.into();
        assert!(matches!(err, DeployError::Io(_)));
    }
}
