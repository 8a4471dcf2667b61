// src/config/mod.rs

//! Shell configuration: TOML model, loading and validation.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path, parse_and_validate};
pub use model::{RawShellConfig, ShellConfig, ShellSection};
