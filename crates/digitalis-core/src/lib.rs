//! Digitalis Core - DSP primitives for the degradation engine
//!
//! This crate holds the building blocks shared by every digitalis variant.
//! Nothing here allocates after construction, so all of it is usable from a
//! real-time callback.
//!
//! # Core Abstractions
//!
//! ## Parameters
//!
//! - [`ParamDescriptor`] - Range, default, unit and stable ids of one parameter
//! - [`ParamStore`] - Lock-free value store shared between control and audio threads
//! - [`ParamSource`] - Read side of a parameter snapshot, as seen by the engine
//!
//! ## Randomness
//!
//! - [`RandomSource`] - Injectable pseudo-random stream for glitch decisions
//! - [`FastRng`] - Seeded LCG implementation
//!
//! ## Buffers and Filters
//!
//! - [`RingBuffer`] - Fixed-capacity circular buffer
//! - [`DcBlocker`] - First-order DC removal
//!
//! ## Utilities
//!
//! - Math: [`db_to_linear`], [`lerp`], [`quantise`], [`wet_dry_mix`], etc.
//! - IEEE-754 damage: [`truncate_mantissa`], [`quantise_exponent`], [`step_toward`]
//!
//! # no_std Support
//!
//! Disable the default `std` feature to build for embedded targets:
//!
//! ```toml
//! [dependencies]
//! digitalis-core = { version = "0.1", default-features = false }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

pub mod dc_blocker;
pub mod float_bits;
pub mod math;
pub mod param_info;
pub mod param_store;
pub mod ring_buffer;
pub mod rng;

pub use dc_blocker::DcBlocker;
pub use float_bits::{frexp, ldexp, quantise_exponent, step_toward, truncate_mantissa};
pub use math::{
    db_to_linear, flush_denormal, hard_clip, lerp, linear_to_db, quantise, rms, sign_or_positive,
    soft_clip, wet_dry_mix,
};
pub use param_info::{ParamDescriptor, ParamFlags, ParamId, ParamScale, ParamUnit, ParameterInfo};
pub use param_store::{ParamSource, ParamStore};
pub use ring_buffer::RingBuffer;
pub use rng::{FastRng, RandomSource};
