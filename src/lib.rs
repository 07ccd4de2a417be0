//! DRX: product lifecycle client
//!
//! A command-line client for a product lifecycle backend: products and their
//! bills of materials, the material catalog, user roles, lifecycle stage
//! changes and a small analytics dashboard.

pub mod cli;
pub mod core;
pub mod entities;
