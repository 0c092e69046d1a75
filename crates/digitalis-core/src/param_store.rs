//! Lock-free parameter storage shared between control and audio threads.
//!
//! [`ParamStore`] keeps one `AtomicU32` per parameter holding the bits of an
//! `f32`. The control thread writes with [`ParamStore::set`], the audio thread
//! reads through the [`ParamSource`] trait. Neither side ever blocks; the audio
//! thread sees each value either before or after a concurrent write, and every
//! stored value has already been clamped into its descriptor range.
//!
//! `Relaxed` ordering is sufficient: values are independent, and no invariant
//! spans more than one parameter.

use alloc::vec::Vec;
use core::sync::atomic::{AtomicU32, Ordering};

use crate::param_info::{ParamDescriptor, ParameterInfo};

/// Read-only view of a parameter snapshot, as consumed by the engine.
///
/// Returns `None` for indices the source does not hold. The engine substitutes
/// the descriptor default in that case.
pub trait ParamSource {
    /// Raw value of the parameter at `index`.
    fn param(&self, index: usize) -> Option<f32>;
}

impl ParamSource for [f32] {
    #[inline]
    fn param(&self, index: usize) -> Option<f32> {
        self.get(index).copied()
    }
}

impl ParamSource for Vec<f32> {
    #[inline]
    fn param(&self, index: usize) -> Option<f32> {
        self.get(index).copied()
    }
}

impl<const N: usize> ParamSource for [f32; N] {
    #[inline]
    fn param(&self, index: usize) -> Option<f32> {
        self.get(index).copied()
    }
}

impl<T: ParamSource + ?Sized> ParamSource for &T {
    #[inline]
    fn param(&self, index: usize) -> Option<f32> {
        (**self).param(index)
    }
}

/// Atomic parameter values plus the descriptors that bound them.
///
/// # Example
///
/// ```rust
/// use digitalis_core::{ParamDescriptor, ParamId, ParamSource, ParamStore};
///
/// let store = ParamStore::new(vec![
///     ParamDescriptor::percent("Amount", "Amount", 54.0).with_id(ParamId(900), "amount"),
///     ParamDescriptor::mix().with_id(ParamId(4), "mix"),
/// ]);
///
/// assert_eq!(store.get(0), 54.0);
/// store.set_by_id("mix", 140.0);
/// assert_eq!(store.param(1), Some(100.0));
/// ```
#[derive(Debug)]
pub struct ParamStore {
    descriptors: Vec<ParamDescriptor>,
    values: Vec<AtomicU32>,
}

impl ParamStore {
    /// Create a store with every value at its descriptor default.
    pub fn new(descriptors: Vec<ParamDescriptor>) -> Self {
        let values = descriptors
            .iter()
            .map(|d| AtomicU32::new(d.default.to_bits()))
            .collect();
        #[cfg(feature = "tracing")]
        tracing::debug!("param_store: {} parameters", descriptors.len());
        Self {
            descriptors,
            values,
        }
    }

    /// Number of parameters.
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// `true` if the store holds no parameters.
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// All descriptors in index order.
    pub fn descriptors(&self) -> &[ParamDescriptor] {
        &self.descriptors
    }

    /// Descriptor at `index`.
    pub fn descriptor(&self, index: usize) -> Option<&ParamDescriptor> {
        self.descriptors.get(index)
    }

    /// Index of the parameter with the given string id.
    pub fn index_of(&self, string_id: &str) -> Option<usize> {
        self.descriptors.iter().position(|d| d.string_id == string_id)
    }

    /// Current value at `index`, `0.0` if out of range.
    #[inline]
    pub fn get(&self, index: usize) -> f32 {
        self.values
            .get(index)
            .map_or(0.0, |v| f32::from_bits(v.load(Ordering::Relaxed)))
    }

    /// Current value of the parameter named `string_id`.
    pub fn get_by_id(&self, string_id: &str) -> Option<f32> {
        self.index_of(string_id).map(|i| self.get(i))
    }

    /// Store a value, clamped to the descriptor range.
    ///
    /// Non-finite values and out-of-range indices are ignored. Returns `true`
    /// when a value was written.
    pub fn set(&self, index: usize, value: f32) -> bool {
        if !value.is_finite() {
            return false;
        }
        match (self.descriptors.get(index), self.values.get(index)) {
            (Some(desc), Some(slot)) => {
                slot.store(desc.clamp(value).to_bits(), Ordering::Relaxed);
                true
            }
            _ => false,
        }
    }

    /// Store a value by string id. Returns `false` for unknown ids.
    pub fn set_by_id(&self, string_id: &str, value: f32) -> bool {
        self.index_of(string_id)
            .is_some_and(|index| self.set(index, value))
    }

    /// Put every parameter back to its default.
    pub fn reset_to_defaults(&self) {
        for (desc, slot) in self.descriptors.iter().zip(&self.values) {
            slot.store(desc.default.to_bits(), Ordering::Relaxed);
        }
    }

    /// Copy of all current values in index order.
    pub fn snapshot(&self) -> Vec<f32> {
        (0..self.len()).map(|i| self.get(i)).collect()
    }

    /// Iterate `(descriptor, value)` pairs in index order.
    pub fn iter(&self) -> impl Iterator<Item = (&ParamDescriptor, f32)> + '_ {
        self.descriptors
            .iter()
            .enumerate()
            .map(|(i, d)| (d, self.get(i)))
    }
}

impl ParamSource for ParamStore {
    #[inline]
    fn param(&self, index: usize) -> Option<f32> {
        self.values
            .get(index)
            .map(|v| f32::from_bits(v.load(Ordering::Relaxed)))
    }
}

impl ParameterInfo for ParamStore {
    fn param_count(&self) -> usize {
        self.len()
    }

    fn param_info(&self, index: usize) -> Option<ParamDescriptor> {
        self.descriptors.get(index).copied()
    }

    fn get_param(&self, index: usize) -> f32 {
        self.get(index)
    }

    fn set_param(&mut self, index: usize, value: f32) {
        self.set(index, value);
    }
}
