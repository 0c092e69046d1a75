//! Digitalis Engine - ten real-time audio degradation variants
//!
//! One engine instance runs exactly one variant, chosen at construction,
//! followed by a shared post chain and a dry/wet mix:
//!
//! ```text
//! host block ──► variant ──► DC block ──► auto-level × trim ──► limiter ──► mix ──► host block
//!      │                                                                     ▲
//!      └──────────────────────────── dry ────────────────────────────────────┘
//! ```
//!
//! # Variants
//!
//! | # | Variant | Module |
//! |---|---------|--------|
//! | 1 | Floating-Point Collapse | [`variants::float_collapse`] |
//! | 2 | Nyquist Destroyer | [`variants::nyquist`] |
//! | 3 | Buffer Glitch Engine | [`variants::buffer_glitch`] |
//! | 4 | Automation Quantiser | [`variants::automation_quantiser`] |
//! | 5 | Streaming Artifact Generator | [`variants::streaming_artifact`] |
//! | 6 | Spectral Brutalist | [`variants::spectral_brutalist`] |
//! | 7 | Overclock Failure Emulator | [`variants::overclock`] |
//! | 8 | Deterministic State Machine | [`variants::state_machine`] |
//! | 9 | Classic Buffer Stutter | [`variants::stutter`] |
//! | 10 | Melodic Skip Engine | [`variants::melodic_skip`] |
//!
//! # Core Abstractions
//!
//! - [`Engine`] - Prepare, then process host blocks in place
//! - [`EngineConfig`] - Variant, theme, subtitle and control layout of an instance
//! - [`Variant`] / [`Algorithm`] - Per-variant processing behind one enum
//! - [`ParamReader`] - Clamped, default-substituting parameter access
//! - [`PostChain`] / [`DryWetMixer`] - Shared finishing stages
//!
//! # no_std Support
//!
//! Disable the default `std` feature; everything except
//! [`Engine::new`]'s entropy seeding is available with `alloc` only.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

pub mod block;
pub mod config;
pub mod engine;
pub mod error;
pub mod measurement;
pub mod mixer;
pub mod params;
pub mod post;
pub mod process_spec;
pub mod variant;
pub mod variants;

pub use block::Block;
pub use config::{ControlLayout, ControlSlot, EngineConfig, Rgb, Theme, subtitle};
pub use engine::Engine;
pub use error::EngineError;
pub use measurement::{MeasureReport, Stimulus, measure};
pub use mixer::DryWetMixer;
pub use params::{ParamReader, param_descriptors, universal, universal_params};
pub use post::{AutoLevel, PostChain, PostParams, SafetyLimiter};
pub use process_spec::ProcessSpec;
pub use variant::{Algorithm, Variant, VariantKind};
