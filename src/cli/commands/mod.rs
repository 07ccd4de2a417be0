//! CLI command implementations

pub mod auth;
pub mod completions;
pub mod dashboard;
pub mod material;
pub mod product;
pub mod user;
