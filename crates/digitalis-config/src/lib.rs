//! Presets and persisted state for digitalis engines.
//!
//! # Features
//!
//! - **Factory Presets**: ten programs per variant, embedded at compile time
//! - **Preset Banks**: load and save a variant's presets as TOML
//! - **Engine State**: capture and restore a parameter surface as JSON or TOML
//!
//! # Example
//!
//! ```rust
//! use digitalis_config::{EngineState, factory_preset};
//! use digitalis_engine::{Engine, EngineConfig, VariantKind};
//!
//! let kind = VariantKind::MelodicSkip;
//! let engine = Engine::new(EngineConfig::for_variant(kind));
//! let store = engine.create_param_store();
//!
//! factory_preset(kind, 2).unwrap().apply(kind, &store).unwrap();
//!
//! let saved = EngineState::capture(kind, 2, &store).to_json().unwrap();
//! let restored = EngineState::from_json(&saved).unwrap();
//! assert_eq!(restored.program, 2);
//! ```

mod error;
mod preset;
mod state;

/// Factory preset banks bundled with the library.
pub mod factory_presets;

pub use error::ConfigError;
pub use factory_presets::{
    factory_bank, factory_bank_toml, factory_preset, factory_preset_names, find_factory_preset,
};
pub use preset::{Preset, PresetBank};
pub use state::{EngineState, STATE_VERSION};
