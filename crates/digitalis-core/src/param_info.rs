//! Parameter metadata for discoverable engine parameters.
//!
//! Every variant publishes a fixed list of [`ParamDescriptor`]s. The same list
//! drives the [`ParamStore`](crate::ParamStore) layout, point-of-use clamping in
//! the engine, preset validation and the CLI listings.
//!
//! # Design
//!
//! Parameters are addressed by zero-based index on the audio path and by
//! string id everywhere else. Each descriptor carries:
//!
//! - [`ParamId`] - stable numeric ID for automation and persistence
//! - `string_id` - stable snake_case ID used in preset and state files
//! - [`ParamScale`] - normalisation curve (linear, logarithmic, power)
//! - [`ParamFlags`] - capability flags (automatable, stepped, ...)
//! - `labels` - option names for choice parameters, empty otherwise
//!
//! Choice parameters store the zero-based option index as their value.
//!
//! # Example
//!
//! ```rust
//! use digitalis_core::{ParamDescriptor, ParamId};
//!
//! static CURVES: [&str; 3] = ["Uniform", "Log", "MuLaw"];
//!
//! let curve = ParamDescriptor::choice("Quant Curve", "Curve", &CURVES, 2)
//!     .with_id(ParamId(105), "quant_curve");
//! assert_eq!(curve.max, 2.0);
//! assert_eq!(curve.choice_index(7.0), 2);
//! assert_eq!(curve.label(1.0), Some("Log"));
//! ```

/// Scaling curve for parameter normalisation.
///
/// Determines how a parameter's plain value maps to normalised \[0.0, 1.0\] space.
///
/// # Normalisation Formulas
///
/// - **Linear**: `normalized = (value - min) / (max - min)`
/// - **Logarithmic**: `normalized = ln(value/min) / ln(max/min)`
/// - **Power(exp)**: `normalized = ((value - min) / (max - min)).powf(1.0 / exp)`
///
/// A skew factor `s` as used by JUCE `NormalisableRange` corresponds to
/// `Power(1.0 / s)`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ParamScale {
    /// Linear mapping (default).
    #[default]
    Linear,
    /// Logarithmic mapping. Requires `min > 0.0`.
    Logarithmic,
    /// Power curve: exponent > 1.0 gives more resolution at the low end.
    Power(f32),
}

/// Stable parameter identifier that survives reordering.
///
/// # Convention
///
/// Universal parameters use 1–4. Variant `k` (1-based) numbers its own
/// parameters `100 * k + i`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParamId(pub u32);

/// Parameter capability flags.
///
/// # Example
///
/// ```rust
/// use digitalis_core::ParamFlags;
///
/// let flags = ParamFlags::AUTOMATABLE.union(ParamFlags::STEPPED);
/// assert!(flags.contains(ParamFlags::STEPPED));
/// assert!(!ParamFlags::NONE.contains(ParamFlags::AUTOMATABLE));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamFlags(u8);

impl ParamFlags {
    /// No flags set.
    pub const NONE: Self = Self(0);
    /// Host can automate this parameter.
    pub const AUTOMATABLE: Self = Self(1 << 0);
    /// Parameter has discrete steps (integer or choice values).
    pub const STEPPED: Self = Self(1 << 1);

    /// Returns `true` if all bits in `other` are set in `self`.
    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns the union of two flag sets.
    #[inline]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

impl Default for ParamFlags {
    fn default() -> Self {
        Self::AUTOMATABLE
    }
}

/// Trait for types that expose introspectable parameters.
///
/// Implemented by [`ParamStore`](crate::ParamStore) so generic tooling can walk
/// and edit any engine instance.
pub trait ParameterInfo {
    /// Returns the number of parameters. Valid indices are `0..param_count()`.
    fn param_count(&self) -> usize;

    /// Returns the descriptor for `index`, or `None` if out of range.
    fn param_info(&self, index: usize) -> Option<ParamDescriptor>;

    /// Current value of the parameter, `0.0` if out of range.
    fn get_param(&self, index: usize) -> f32;

    /// Set the parameter, clamping to its range. Out-of-range indices are ignored.
    fn set_param(&mut self, index: usize, value: f32);

    /// Find a parameter index by name or short name (case-insensitive).
    fn find_param_by_name(&self, name: &str) -> Option<usize> {
        (0..self.param_count()).find(|&i| {
            self.param_info(i).is_some_and(|desc| {
                desc.name.eq_ignore_ascii_case(name) || desc.short_name.eq_ignore_ascii_case(name)
            })
        })
    }

    /// Finds a parameter index by its stable [`ParamId`].
    ///
    /// Scans all parameters (O(n)), suitable for setup paths, not audio.
    fn param_index_by_id(&self, id: ParamId) -> Option<usize> {
        (0..self.param_count()).find(|&i| self.param_info(i).is_some_and(|d| d.id == id))
    }
}

/// Describes a single parameter's metadata for display and validation.
///
/// # Short Name
///
/// `short_name` should be 8 characters or less so it fits compact displays.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamDescriptor {
    /// Full parameter name for display (e.g., "Mantissa Bits").
    pub name: &'static str,

    /// Short name, max 8 characters (e.g., "Mant").
    pub short_name: &'static str,

    /// Unit type for formatting the parameter value.
    pub unit: ParamUnit,

    /// Minimum allowed value.
    pub min: f32,

    /// Maximum allowed value.
    pub max: f32,

    /// Value when the engine is initialised or a preset omits the parameter.
    pub default: f32,

    /// Recommended step increment. `1.0` for integer and choice parameters.
    pub step: f32,

    /// Stable numeric ID. Default: `ParamId(0)` (unassigned).
    pub id: ParamId,

    /// Stable snake_case ID used by presets and persisted state.
    pub string_id: &'static str,

    /// Normalisation curve. Default: [`ParamScale::Linear`].
    pub scale: ParamScale,

    /// Capability flags. Default: [`ParamFlags::AUTOMATABLE`].
    pub flags: ParamFlags,

    /// Parameter group (e.g., `"post"`). Empty string means top-level.
    pub group: &'static str,

    /// Option names for choice parameters; empty for numeric parameters.
    pub labels: &'static [&'static str],
}

impl ParamDescriptor {
    const fn base(
        name: &'static str,
        short_name: &'static str,
        unit: ParamUnit,
        min: f32,
        max: f32,
        default: f32,
        step: f32,
    ) -> Self {
        Self {
            name,
            short_name,
            unit,
            min,
            max,
            default,
            step,
            id: ParamId(0),
            string_id: "",
            scale: ParamScale::Linear,
            flags: ParamFlags::AUTOMATABLE,
            group: "",
            labels: &[],
        }
    }

    /// Wet/dry mix (0–100%, default 100%).
    pub const fn mix() -> Self {
        Self::base("Mix", "Mix", ParamUnit::Percent, 0.0, 100.0, 100.0, 0.01)
    }

    /// Percentage parameter (0–100%) with custom name and default.
    pub const fn percent(name: &'static str, short_name: &'static str, default: f32) -> Self {
        Self::base(name, short_name, ParamUnit::Percent, 0.0, 100.0, default, 0.01)
    }

    /// Percentage parameter with a custom range.
    pub const fn percent_range(
        name: &'static str,
        short_name: &'static str,
        min: f32,
        max: f32,
        default: f32,
    ) -> Self {
        Self::base(name, short_name, ParamUnit::Percent, min, max, default, 0.01)
    }

    /// Gain parameter in decibels.
    pub const fn gain_db(
        name: &'static str,
        short_name: &'static str,
        min: f32,
        max: f32,
        default: f32,
    ) -> Self {
        Self::base(name, short_name, ParamUnit::Decibels, min, max, default, 0.01)
    }

    /// Time parameter in milliseconds.
    pub const fn time_ms(
        name: &'static str,
        short_name: &'static str,
        min: f32,
        max: f32,
        default: f32,
    ) -> Self {
        Self::base(name, short_name, ParamUnit::Milliseconds, min, max, default, 1.0)
    }

    /// Frequency or rate parameter in Hz.
    pub const fn hertz(
        name: &'static str,
        short_name: &'static str,
        min: f32,
        max: f32,
        default: f32,
    ) -> Self {
        Self::base(name, short_name, ParamUnit::Hertz, min, max, default, 1.0)
    }

    /// Integer-valued parameter (step 1, [`ParamFlags::STEPPED`]).
    pub const fn stepped(
        name: &'static str,
        short_name: &'static str,
        min: f32,
        max: f32,
        default: f32,
    ) -> Self {
        Self::base(name, short_name, ParamUnit::None, min, max, default, 1.0)
            .with_flags(ParamFlags::AUTOMATABLE.union(ParamFlags::STEPPED))
    }

    /// Choice parameter over `labels`; the value is the option index.
    pub const fn choice(
        name: &'static str,
        short_name: &'static str,
        labels: &'static [&'static str],
        default_index: usize,
    ) -> Self {
        let max = if labels.is_empty() { 0.0 } else { (labels.len() - 1) as f32 };
        let mut desc = Self::stepped(name, short_name, 0.0, max, default_index as f32);
        desc.labels = labels;
        desc
    }

    /// Sets the stable parameter ID and string ID.
    ///
    /// # Example
    ///
    /// ```rust
    /// use digitalis_core::{ParamDescriptor, ParamId};
    ///
    /// let desc = ParamDescriptor::mix().with_id(ParamId(4), "mix");
    /// assert_eq!(desc.id, ParamId(4));
    /// assert_eq!(desc.string_id, "mix");
    /// ```
    pub const fn with_id(mut self, id: ParamId, string_id: &'static str) -> Self {
        self.id = id;
        self.string_id = string_id;
        self
    }

    /// Sets the normalisation scale.
    pub const fn with_scale(mut self, scale: ParamScale) -> Self {
        self.scale = scale;
        self
    }

    /// Sets the parameter flags.
    pub const fn with_flags(mut self, flags: ParamFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Sets the parameter group.
    pub const fn with_group(mut self, group: &'static str) -> Self {
        self.group = group;
        self
    }

    /// Sets the step increment.
    pub const fn with_step(mut self, step: f32) -> Self {
        self.step = step;
        self
    }

    /// Sets the display unit.
    pub const fn with_unit(mut self, unit: ParamUnit) -> Self {
        self.unit = unit;
        self
    }

    /// `true` for choice parameters.
    #[inline]
    pub fn is_choice(&self) -> bool {
        !self.labels.is_empty()
    }

    /// Clamps a value to this parameter's valid range.
    ///
    /// NaN maps to the default.
    ///
    /// # Example
    ///
    /// ```rust
    /// use digitalis_core::ParamDescriptor;
    ///
    /// let desc = ParamDescriptor::gain_db("Output", "Out", -24.0, 24.0, 0.0);
    /// assert_eq!(desc.clamp(-100.0), -24.0);
    /// assert_eq!(desc.clamp(f32::NAN), 0.0);
    /// ```
    #[inline]
    pub fn clamp(&self, value: f32) -> f32 {
        if value.is_nan() {
            self.default
        } else if value < self.min {
            self.min
        } else if value > self.max {
            self.max
        } else {
            value
        }
    }

    /// Option index for a choice value: rounded, then clamped to the label range.
    #[inline]
    pub fn choice_index(&self, value: f32) -> usize {
        let rounded = libm::roundf(self.clamp(value));
        if rounded <= 0.0 { 0 } else { rounded as usize }
    }

    /// Label for a choice value, `None` for numeric parameters.
    pub fn label(&self, value: f32) -> Option<&'static str> {
        self.labels.get(self.choice_index(value)).copied()
    }

    /// Converts a plain value to normalised range (0.0 to 1.0).
    ///
    /// # Example
    ///
    /// ```rust
    /// use digitalis_core::ParamDescriptor;
    ///
    /// let desc = ParamDescriptor::mix();
    /// assert_eq!(desc.normalize(50.0), 0.5);
    /// ```
    #[inline]
    pub fn normalize(&self, value: f32) -> f32 {
        let range = self.max - self.min;
        if range == 0.0 {
            return 0.0;
        }
        match self.scale {
            ParamScale::Linear => (value - self.min) / range,
            ParamScale::Logarithmic => {
                if self.min <= 0.0 || value <= 0.0 {
                    return 0.0;
                }
                libm::logf(value / self.min) / libm::logf(self.max / self.min)
            }
            ParamScale::Power(exp) => {
                let linear = ((value - self.min) / range).max(0.0);
                libm::powf(linear, 1.0 / exp)
            }
        }
    }

    /// Converts a normalised value (0.0 to 1.0) back to the plain range.
    #[inline]
    pub fn denormalize(&self, normalized: f32) -> f32 {
        match self.scale {
            ParamScale::Linear => self.min + normalized * (self.max - self.min),
            ParamScale::Logarithmic => {
                if self.min <= 0.0 {
                    return self.min;
                }
                self.min * libm::powf(self.max / self.min, normalized)
            }
            ParamScale::Power(exp) => {
                let curved = libm::powf(normalized.max(0.0), exp);
                self.min + curved * (self.max - self.min)
            }
        }
    }
}

/// Unit type for parameter display and formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamUnit {
    /// Decibels (dB).
    Decibels,
    /// Hertz (Hz).
    Hertz,
    /// Milliseconds (ms).
    Milliseconds,
    /// Percentage (%).
    Percent,
    /// Kilobits per second.
    Kbps,
    /// No unit.
    None,
}

impl ParamUnit {
    /// Returns the unit suffix string for display.
    ///
    /// # Example
    ///
    /// ```rust
    /// use digitalis_core::ParamUnit;
    ///
    /// assert_eq!(ParamUnit::Decibels.suffix(), " dB");
    /// assert_eq!(ParamUnit::None.suffix(), "");
    /// ```
    pub const fn suffix(&self) -> &'static str {
        match self {
            ParamUnit::Decibels => " dB",
            ParamUnit::Hertz => " Hz",
            ParamUnit::Milliseconds => " ms",
            ParamUnit::Percent => "%",
            ParamUnit::Kbps => " kbps",
            ParamUnit::None => "",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static MODES: [&str; 3] = ["Block", "Samples", "Beat"];

    #[test]
    fn test_percent_factory() {
        let desc = ParamDescriptor::percent("Collapse", "Collapse", 55.0);
        assert_eq!(desc.unit, ParamUnit::Percent);
        assert_eq!(desc.min, 0.0);
        assert_eq!(desc.max, 100.0);
        assert_eq!(desc.default, 55.0);
        assert!(!desc.is_choice());
    }

    #[test]
    fn test_choice_factory() {
        let desc = ParamDescriptor::choice("Grid Mode", "Grid", &MODES, 1);
        assert!(desc.is_choice());
        assert!(desc.flags.contains(ParamFlags::STEPPED));
        assert_eq!(desc.max, 2.0);
        assert_eq!(desc.default, 1.0);
        assert_eq!(desc.choice_index(1.4), 1);
        assert_eq!(desc.choice_index(1.6), 2);
        assert_eq!(desc.choice_index(-3.0), 0);
        assert_eq!(desc.choice_index(99.0), 2);
        assert_eq!(desc.label(0.0), Some("Block"));
    }

    #[test]
    fn test_flags_by_factory() {
        let percent = ParamDescriptor::percent("Collapse", "Collapse", 55.0);
        assert_eq!(percent.flags, ParamFlags::AUTOMATABLE);
        assert!(!percent.flags.contains(ParamFlags::STEPPED));
        let choice = ParamDescriptor::choice("Grid Mode", "Grid", &MODES, 1);
        assert!(choice.flags.contains(ParamFlags::AUTOMATABLE.union(ParamFlags::STEPPED)));
    }

    #[test]
    fn test_numeric_has_no_label() {
        assert_eq!(ParamDescriptor::mix().label(50.0), None);
    }

    #[test]
    fn test_clamp() {
        let desc = ParamDescriptor::mix();
        assert_eq!(desc.clamp(50.0), 50.0);
        assert_eq!(desc.clamp(-10.0), 0.0);
        assert_eq!(desc.clamp(200.0), 100.0);
        assert_eq!(desc.clamp(f32::NAN), 100.0);
        assert_eq!(desc.clamp(f32::INFINITY), 100.0);
    }

    #[test]
    fn test_normalize_linear_roundtrip() {
        let desc = ParamDescriptor::time_ms("Switch", "Switch", 40.0, 1200.0, 220.0);
        let rt = desc.denormalize(desc.normalize(600.0));
        assert!((rt - 600.0).abs() < 1e-3);
    }

    #[test]
    fn test_normalize_power_skew() {
        // JUCE skew 0.4 -> exponent 2.5
        let desc = ParamDescriptor::time_ms("Slice", "Slice", 10.0, 250.0, 52.0)
            .with_scale(ParamScale::Power(2.5));
        assert_eq!(desc.normalize(10.0), 0.0);
        assert!((desc.normalize(250.0) - 1.0).abs() < 1e-6);
        let mid = desc.denormalize(0.5);
        assert!(mid < 130.0, "skew should favour the low end, got {mid}");
        let rt = desc.denormalize(desc.normalize(52.0));
        assert!((rt - 52.0).abs() < 0.01);
    }

    #[test]
    fn test_normalize_logarithmic() {
        let desc = ParamDescriptor::hertz("Rate", "Rate", 1.0, 100.0, 10.0)
            .with_scale(ParamScale::Logarithmic);
        assert!((desc.normalize(10.0) - 0.5).abs() < 1e-5);
        assert!((desc.denormalize(0.5) - 10.0).abs() < 1e-3);
    }

    #[test]
    fn test_normalize_zero_range() {
        let desc = ParamDescriptor::gain_db("Fixed", "Fixed", 3.0, 3.0, 3.0);
        assert_eq!(desc.normalize(3.0), 0.0);
    }

    #[test]
    fn test_builders() {
        let desc = ParamDescriptor::percent("Feedback", "Fdbk", 24.0)
            .with_id(ParamId(207), "feedback")
            .with_group("tone")
            .with_step(0.5)
            .with_unit(ParamUnit::None);
        assert_eq!(desc.id, ParamId(207));
        assert_eq!(desc.string_id, "feedback");
        assert_eq!(desc.group, "tone");
        assert_eq!(desc.step, 0.5);
        assert_eq!(desc.unit, ParamUnit::None);
    }

    #[test]
    fn test_param_unit_suffix() {
        assert_eq!(ParamUnit::Hertz.suffix(), " Hz");
        assert_eq!(ParamUnit::Milliseconds.suffix(), " ms");
        assert_eq!(ParamUnit::Percent.suffix(), "%");
        assert_eq!(ParamUnit::Kbps.suffix(), " kbps");
    }
}
