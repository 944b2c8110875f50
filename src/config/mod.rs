// src/config/mod.rs

//! Configuration loading and validation.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate graph invariants before anything runs (`validate.rs`).
//! - Turn a validated config into a runnable task registry (`build.rs`).

pub mod build;
pub mod loader;
pub mod model;
pub mod validate;

pub use build::build_registry;
pub use loader::{load_and_validate, load_from_path};
pub use model::{ConfigFile, ConfigSection, DefaultSection, ExtraWatch, TaskConfig};
pub use validate::validate_config;
