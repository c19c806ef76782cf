//! Monodeploy Core Library
//!
//! This is the core library for the monodeploy tool. It resolves the runtime
//! dependency closure of selected workspace projects and materializes it into
//! a self-contained folder tree, re-creating the links found in the source
//! workspace.
//!
//! ## Architecture
//!
//! The core library is organized into several modules:
//!
//! - [`deploy_manager`] - High-level interface that runs deployment scenarios
//! - [`deploy`] - Resolution, folder copy and link materialization
//! - [`workspace`] - Project registry and discovery
//! - [`configs`] - Configuration parsing for the registry, scenarios and manifests
//! - [`platform`] - Host specific link creation
//! - [`results`] - Result types for deployment operations
//! - [`types`] - Common error types and type aliases
//!
//! ## Usage
//!
//! ```rust,no_run
//! use monodeploy_core::deploy_manager::{DeployManager, DeployManagerConfig};
//! use std::path::PathBuf;
//!
//! # fn example() -> monodeploy_core::types::DeployResult<()> {
//! let manager = DeployManager::new(DeployManagerConfig {
//!     workspace_root: PathBuf::from("."),
//! })?;
//!
//! let plan = manager.plan_scenario(None)?;
//! # Ok(())
//! # }
//! ```

pub mod configs;
pub mod deploy;
pub mod deploy_manager;
pub mod platform;
pub mod results;
pub mod types;
pub mod workspace;

// Re-export the main types for easier usage
pub use deploy_manager::{DeployManager, DeployManagerConfig, DeployOptions};
pub use types::{DeployError, DeployResult};
