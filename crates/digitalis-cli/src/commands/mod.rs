//! CLI command implementations.

pub mod common;
pub mod measure;
pub mod params;
pub mod presets;
pub mod process;
pub mod variants;
