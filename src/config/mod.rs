//! Configuration management.
//!
//! Provides XDG-compliant paths and the application settings file.

mod settings;

pub use settings::{AppSettings, BackendKind, Paths};
