// src/config/mod.rs

//! Recipe loading and validation.
//!
//! - [`model`] is the TOML-backed data model.
//! - [`loader`] reads a recipe from disk.
//! - [`validate`] checks it (non-empty, no self-dependencies, acyclic).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path};
pub use model::{ConfigFile, ConfigSection, DefaultSection, RawConfigFile, TaskConfig};
pub use validate::validate_config;
