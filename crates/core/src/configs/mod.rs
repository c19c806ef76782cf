//! Configuration parsing for the workspace registry, deploy scenarios and package manifests

pub mod manifest;
pub mod scenario;
pub mod workspace;
