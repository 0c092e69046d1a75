//! Point-of-use parameter access and the universal post-chain parameters.
//!
//! Hosts hand the engine a raw [`ParamSource`] every block. Nothing about that
//! source is trusted: [`ParamReader`] substitutes the descriptor default for
//! missing or non-finite values and clamps everything else into range before
//! a variant sees it.

use digitalis_core::{ParamDescriptor, ParamId, ParamSource, ParamUnit};

use crate::VariantKind;

/// Offsets of the universal parameters, relative to the end of the variant's
/// own parameter list.
pub mod universal {
    /// Auto-level blend amount.
    pub const AUTOLEVEL: usize = 0;
    /// Safety limiter amount.
    pub const SAFETY: usize = 1;
    /// Output trim in dB.
    pub const OUTPUT: usize = 2;
    /// Dry/wet mix.
    pub const MIX: usize = 3;
    /// Number of universal parameters.
    pub const COUNT: usize = 4;
}

/// The four universal descriptors with the defaults of `kind`.
pub fn universal_params(kind: VariantKind) -> [ParamDescriptor; universal::COUNT] {
    [
        ParamDescriptor::percent("Auto Level", "AutoLvl", kind.default_autolevel())
            .with_id(ParamId(1), "autolevel")
            .with_group("post"),
        ParamDescriptor::percent("Safety", "Safety", kind.default_safety())
            .with_id(ParamId(2), "safety")
            .with_group("post"),
        ParamDescriptor::gain_db("Output", "Out", -24.0, 24.0, kind.default_output_db())
            .with_id(ParamId(3), "output")
            .with_group("post"),
        ParamDescriptor::mix()
            .with_id(ParamId(4), "mix")
            .with_group("post"),
    ]
}

/// Full descriptor list of `kind`: variant parameters, then the universal four.
pub fn param_descriptors(kind: VariantKind) -> alloc::vec::Vec<ParamDescriptor> {
    let mut all = alloc::vec::Vec::with_capacity(kind.variant_params().len() + universal::COUNT);
    all.extend_from_slice(kind.variant_params());
    all.extend_from_slice(&universal_params(kind));
    all
}

/// Clamped view of a raw parameter source.
///
/// Indices are relative to `base`, so a variant reads its own parameters from
/// 0 and the post chain reads the universal ones from 0 after
/// [`offset`](Self::offset).
#[derive(Clone, Copy)]
pub struct ParamReader<'a> {
    source: &'a dyn ParamSource,
    descriptors: &'a [ParamDescriptor],
    base: usize,
}

impl<'a> ParamReader<'a> {
    /// Reader over `source`, laid out as `descriptors`.
    pub fn new(source: &'a dyn ParamSource, descriptors: &'a [ParamDescriptor]) -> Self {
        Self {
            source,
            descriptors,
            base: 0,
        }
    }

    /// Reader whose index 0 is `base` of this one.
    pub fn offset(&self, base: usize) -> Self {
        Self {
            base: self.base + base,
            ..*self
        }
    }

    /// Descriptor at relative `index`.
    #[inline]
    pub fn descriptor(&self, index: usize) -> Option<&'a ParamDescriptor> {
        self.descriptors.get(self.base + index)
    }

    /// Clamped plain value. Missing or non-finite input yields the default;
    /// an index with no descriptor yields 0.
    #[inline]
    pub fn value(&self, index: usize) -> f32 {
        let Some(desc) = self.descriptor(index) else {
            return 0.0;
        };
        match self.source.param(self.base + index) {
            Some(v) if v.is_finite() => desc.clamp(v),
            _ => desc.default,
        }
    }

    /// Percentage parameter scaled to 0..1 (`value / 100`).
    ///
    /// Parameters whose unit is not percent are returned unscaled.
    #[inline]
    pub fn percent(&self, index: usize) -> f32 {
        let v = self.value(index);
        match self.descriptor(index) {
            Some(d) if d.unit == ParamUnit::Percent => v * 0.01,
            _ => v,
        }
    }

    /// Zero-based option index of a choice parameter.
    #[inline]
    pub fn choice(&self, index: usize) -> usize {
        self.descriptor(index)
            .map_or(0, |d| d.choice_index(self.value(index)))
    }

    /// Integer parameter, rounded to nearest.
    #[inline]
    pub fn int(&self, index: usize) -> i32 {
        libm::roundf(self.value(index)) as i32
    }
}

impl core::fmt::Debug for ParamReader<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ParamReader")
            .field("params", &self.descriptors.len())
            .field("base", &self.base)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    fn descriptors() -> Vec<ParamDescriptor> {
        param_descriptors(VariantKind::BufferStutter)
    }

    #[test]
    fn test_missing_and_non_finite_fall_back_to_default() {
        let descs = descriptors();
        let raw: [f32; 2] = [f32::NAN, f32::INFINITY];
        let reader = ParamReader::new(&raw, &descs);
        assert_eq!(reader.value(0), descs[0].default);
        assert_eq!(reader.value(1), descs[1].default);
        assert_eq!(reader.value(5), descs[5].default);
        assert_eq!(reader.value(500), 0.0);
    }

    #[test]
    fn test_clamps_and_scales() {
        let descs = descriptors();
        let mut raw: Vec<f32> = descs.iter().map(|d| d.default).collect();
        raw[0] = 400.0;
        raw[3] = 3.6;
        let reader = ParamReader::new(&raw, &descs);
        assert_eq!(reader.percent(0), 1.0);
        assert_eq!(reader.int(3), 4);
        // rate in Hz is not a percentage
        assert_eq!(reader.percent(1), descs[1].default);
    }

    #[test]
    fn test_offset_reads_universal_block() {
        let kind = VariantKind::MelodicSkip;
        let descs = param_descriptors(kind);
        let raw: Vec<f32> = descs.iter().map(|d| d.default).collect();
        let post = ParamReader::new(&raw, &descs).offset(kind.variant_params().len());
        assert!((post.percent(universal::AUTOLEVEL) - 0.47).abs() < 1e-6);
        assert_eq!(post.value(universal::OUTPUT), -10.7);
        assert_eq!(post.percent(universal::MIX), 1.0);
    }

    #[test]
    fn test_choice_index_clamped() {
        let kind = VariantKind::FloatingPointCollapse;
        let descs = param_descriptors(kind);
        let mut raw: Vec<f32> = descs.iter().map(|d| d.default).collect();
        raw[3] = 42.0;
        let reader = ParamReader::new(&raw, &descs);
        assert_eq!(reader.choice(3), 7);
        assert_eq!(reader.choice(500), 0);
        let empty: [f32; 0] = [];
        let reader = ParamReader::new(&empty, &descs);
        assert_eq!(reader.choice(4), 4);
    }

    #[test]
    fn test_universal_ids_and_order() {
        let descs = param_descriptors(VariantKind::NyquistDestroyer);
        let tail: Vec<&str> = descs[descs.len() - 4..].iter().map(|d| d.string_id).collect();
        assert_eq!(tail, ["autolevel", "safety", "output", "mix"]);
        assert!(descs.iter().all(|d| !d.string_id.is_empty()));
    }
}
