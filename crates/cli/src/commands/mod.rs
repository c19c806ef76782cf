pub mod deploy;
pub mod links;
pub mod list;
pub mod plan;
pub mod schema;
