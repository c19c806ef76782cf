//! Deployment pipeline
//!
//! A subdeployment goes through three phases, each owned by one module:
//!
//! 1. [`resolver`] collects the dependency closure into a [`state::DeployState`]
//! 2. [`copy`] materializes every collected folder under the target
//! 3. [`linker`] re-creates recorded links, or [`metadata`] defers them

pub mod copy;
pub mod graph;
pub mod linker;
pub mod links;
pub mod metadata;
pub mod packlist;
pub mod planner;
pub mod resolver;
pub mod state;
