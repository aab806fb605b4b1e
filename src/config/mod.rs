//! Configuration module for Pyro
//!
//! - Data directory resolution
//! - User settings persistence

pub mod paths;
pub mod settings;

pub use paths::PyroPaths;
pub use settings::Settings;
