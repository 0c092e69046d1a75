//! The ten degradation variants and their common interface.
//!
//! [`VariantKind`] names a variant and carries its static metadata: display
//! name, slug, parameter list, post-chain defaults and loudness target.
//! [`Variant`] is the processing interface each implementation provides, and
//! [`Algorithm`] is the closed set of implementations behind one enum so the
//! engine dispatches with a `match` instead of a vtable.

use digitalis_core::{ParamDescriptor, RandomSource};

use crate::variants::{
    AutomationQuantiser, BufferGlitch, BufferStutter, DeterministicMachine, FloatCollapse,
    MelodicSkip, NyquistDestroyer, OverclockFailure, SpectralBrutalist, StreamingArtifact,
    automation_quantiser, buffer_glitch, float_collapse, melodic_skip, nyquist, overclock,
    spectral_brutalist, state_machine, streaming_artifact, stutter,
};
use crate::{Block, ParamReader, ProcessSpec};

/// Identifies one of the ten variants.
///
/// # Example
///
/// ```rust
/// use digitalis_engine::VariantKind;
///
/// let kind = VariantKind::from_slug("buffer_stutter").unwrap();
/// assert_eq!(kind.number(), 9);
/// assert_eq!(VariantKind::from_number(9), Some(kind));
/// assert_eq!(kind.name(), "Classic Buffer Stutter");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VariantKind {
    /// IEEE-754 mantissa/exponent damage.
    FloatingPointCollapse,
    /// Modulated sample-and-hold resampling with aliasing feedback.
    NyquistDestroyer,
    /// Host-buffer failure: jittered chunks, seams, drops, reordering.
    BufferGlitch,
    /// Stair-stepped automation gain with zipper noise.
    AutomationQuantiser,
    /// Lossy codec artifacts, packet loss and pre-echo.
    StreamingArtifact,
    /// Per-sample spectral-style heuristics: hold, freeze, phase steps.
    SpectralBrutalist,
    /// Overdriven processor: delay-line latency, dropouts, thermal drift.
    OverclockFailure,
    /// Hash-driven state machine over a captured loop.
    DeterministicMachine,
    /// Timed slice capture and repetition.
    BufferStutter,
    /// Pitched jumps through a recorded memory.
    MelodicSkip,
}

impl VariantKind {
    /// Every variant in numbering order.
    pub const ALL: [Self; 10] = [
        Self::FloatingPointCollapse,
        Self::NyquistDestroyer,
        Self::BufferGlitch,
        Self::AutomationQuantiser,
        Self::StreamingArtifact,
        Self::SpectralBrutalist,
        Self::OverclockFailure,
        Self::DeterministicMachine,
        Self::BufferStutter,
        Self::MelodicSkip,
    ];

    /// One-based variant number.
    pub const fn number(self) -> u8 {
        match self {
            Self::FloatingPointCollapse => 1,
            Self::NyquistDestroyer => 2,
            Self::BufferGlitch => 3,
            Self::AutomationQuantiser => 4,
            Self::StreamingArtifact => 5,
            Self::SpectralBrutalist => 6,
            Self::OverclockFailure => 7,
            Self::DeterministicMachine => 8,
            Self::BufferStutter => 9,
            Self::MelodicSkip => 10,
        }
    }

    /// Variant for a one-based number, `None` outside 1..=10.
    pub fn from_number(number: u8) -> Option<Self> {
        Self::ALL.get(usize::from(number).checked_sub(1)?).copied()
    }

    /// Display name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::FloatingPointCollapse => "Floating-Point Collapse",
            Self::NyquistDestroyer => "Nyquist Destroyer",
            Self::BufferGlitch => "Buffer Glitch Engine",
            Self::AutomationQuantiser => "Automation Quantiser",
            Self::StreamingArtifact => "Streaming Artifact Generator",
            Self::SpectralBrutalist => "Spectral Brutalist",
            Self::OverclockFailure => "Overclock Failure Emulator",
            Self::DeterministicMachine => "Deterministic State Machine",
            Self::BufferStutter => "Classic Buffer Stutter",
            Self::MelodicSkip => "Melodic Skip Engine",
        }
    }

    /// Stable snake_case identifier used in preset and state files.
    pub const fn slug(self) -> &'static str {
        match self {
            Self::FloatingPointCollapse => "floating_point_collapse",
            Self::NyquistDestroyer => "nyquist_destroyer",
            Self::BufferGlitch => "buffer_glitch",
            Self::AutomationQuantiser => "automation_quantiser",
            Self::StreamingArtifact => "streaming_artifact",
            Self::SpectralBrutalist => "spectral_brutalist",
            Self::OverclockFailure => "overclock_failure",
            Self::DeterministicMachine => "deterministic_machine",
            Self::BufferStutter => "buffer_stutter",
            Self::MelodicSkip => "melodic_skip",
        }
    }

    /// Variant for a slug (exact match).
    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.slug() == slug)
    }

    /// Loudness the auto-level stage steers towards (linear RMS).
    pub const fn target_rms(self) -> f32 {
        match self {
            Self::FloatingPointCollapse => 0.170,
            Self::NyquistDestroyer => 0.180,
            Self::BufferGlitch => 0.160,
            Self::AutomationQuantiser => 0.180,
            Self::StreamingArtifact => 0.150,
            Self::SpectralBrutalist => 0.145,
            Self::OverclockFailure => 0.155,
            Self::DeterministicMachine => 0.165,
            Self::BufferStutter => 0.170,
            Self::MelodicSkip => 0.170,
        }
    }

    /// Default auto-level amount in percent.
    pub const fn default_autolevel(self) -> f32 {
        match self {
            Self::FloatingPointCollapse => 58.0,
            Self::NyquistDestroyer => 46.0,
            Self::BufferGlitch => 52.0,
            Self::AutomationQuantiser => 54.0,
            Self::StreamingArtifact => 42.0,
            Self::SpectralBrutalist => 36.0,
            Self::OverclockFailure => 50.0,
            Self::DeterministicMachine => 48.0,
            Self::BufferStutter => 50.0,
            Self::MelodicSkip => 47.0,
        }
    }

    /// Default safety amount in percent.
    pub const fn default_safety(self) -> f32 {
        match self {
            Self::FloatingPointCollapse => 66.0,
            Self::NyquistDestroyer => 61.0,
            Self::BufferGlitch => 70.0,
            Self::AutomationQuantiser => 58.0,
            Self::StreamingArtifact => 72.0,
            Self::SpectralBrutalist => 76.0,
            Self::OverclockFailure => 74.0,
            Self::DeterministicMachine => 63.0,
            Self::BufferStutter => 66.0,
            Self::MelodicSkip => 68.0,
        }
    }

    /// Default output trim in dB, calibrated so the measurement stimulus
    /// leaves at roughly the level it entered.
    pub const fn default_output_db(self) -> f32 {
        match self {
            Self::FloatingPointCollapse => -10.1,
            Self::NyquistDestroyer => -9.6,
            Self::BufferGlitch => -9.7,
            Self::AutomationQuantiser => -10.4,
            Self::StreamingArtifact => -8.4,
            Self::SpectralBrutalist => -10.0,
            Self::OverclockFailure => -10.0,
            Self::DeterministicMachine => -16.1,
            Self::BufferStutter => -10.0,
            Self::MelodicSkip => -10.7,
        }
    }

    /// Parameters specific to this variant, in index order.
    pub fn variant_params(self) -> &'static [ParamDescriptor] {
        match self {
            Self::FloatingPointCollapse => &float_collapse::PARAMS,
            Self::NyquistDestroyer => &nyquist::PARAMS,
            Self::BufferGlitch => &buffer_glitch::PARAMS,
            Self::AutomationQuantiser => &automation_quantiser::PARAMS,
            Self::StreamingArtifact => &streaming_artifact::PARAMS,
            Self::SpectralBrutalist => &spectral_brutalist::PARAMS,
            Self::OverclockFailure => &overclock::PARAMS,
            Self::DeterministicMachine => &state_machine::PARAMS,
            Self::BufferStutter => &stutter::PARAMS,
            Self::MelodicSkip => &melodic_skip::PARAMS,
        }
    }
}

impl core::fmt::Display for VariantKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// Processing interface of a single variant.
///
/// `prepare` is the only place allowed to allocate. `process` rewrites the
/// block in place, reads its parameters through `params` (indices relative to
/// the variant's own list) and takes every random decision from `rng`.
pub trait Variant {
    /// Size state for `spec` and reset it.
    fn prepare(&mut self, spec: &ProcessSpec);

    /// Return all state to its just-prepared value without reallocating.
    fn reset(&mut self);

    /// Transform `block` in place.
    fn process<R: RandomSource>(
        &mut self,
        block: &mut Block<'_>,
        params: &ParamReader<'_>,
        rng: &mut R,
    );
}

/// One of the ten variant implementations.
#[derive(Debug, Clone)]
pub enum Algorithm {
    /// See [`FloatCollapse`].
    FloatingPointCollapse(FloatCollapse),
    /// See [`NyquistDestroyer`].
    NyquistDestroyer(NyquistDestroyer),
    /// See [`BufferGlitch`].
    BufferGlitch(BufferGlitch),
    /// See [`AutomationQuantiser`].
    AutomationQuantiser(AutomationQuantiser),
    /// See [`StreamingArtifact`].
    StreamingArtifact(StreamingArtifact),
    /// See [`SpectralBrutalist`].
    SpectralBrutalist(SpectralBrutalist),
    /// See [`OverclockFailure`].
    OverclockFailure(OverclockFailure),
    /// See [`DeterministicMachine`].
    DeterministicMachine(DeterministicMachine),
    /// See [`BufferStutter`].
    BufferStutter(BufferStutter),
    /// See [`MelodicSkip`].
    MelodicSkip(MelodicSkip),
}

impl Algorithm {
    /// Unprepared implementation of `kind`.
    pub fn new(kind: VariantKind) -> Self {
        match kind {
            VariantKind::FloatingPointCollapse => Self::FloatingPointCollapse(FloatCollapse::new()),
            VariantKind::NyquistDestroyer => Self::NyquistDestroyer(NyquistDestroyer::new()),
            VariantKind::BufferGlitch => Self::BufferGlitch(BufferGlitch::new()),
            VariantKind::AutomationQuantiser => {
                Self::AutomationQuantiser(AutomationQuantiser::new())
            }
            VariantKind::StreamingArtifact => Self::StreamingArtifact(StreamingArtifact::new()),
            VariantKind::SpectralBrutalist => Self::SpectralBrutalist(SpectralBrutalist::new()),
            VariantKind::OverclockFailure => Self::OverclockFailure(OverclockFailure::new()),
            VariantKind::DeterministicMachine => {
                Self::DeterministicMachine(DeterministicMachine::new())
            }
            VariantKind::BufferStutter => Self::BufferStutter(BufferStutter::new()),
            VariantKind::MelodicSkip => Self::MelodicSkip(MelodicSkip::new()),
        }
    }

    /// Which variant this is.
    pub fn kind(&self) -> VariantKind {
        match self {
            Self::FloatingPointCollapse(_) => VariantKind::FloatingPointCollapse,
            Self::NyquistDestroyer(_) => VariantKind::NyquistDestroyer,
            Self::BufferGlitch(_) => VariantKind::BufferGlitch,
            Self::AutomationQuantiser(_) => VariantKind::AutomationQuantiser,
            Self::StreamingArtifact(_) => VariantKind::StreamingArtifact,
            Self::SpectralBrutalist(_) => VariantKind::SpectralBrutalist,
            Self::OverclockFailure(_) => VariantKind::OverclockFailure,
            Self::DeterministicMachine(_) => VariantKind::DeterministicMachine,
            Self::BufferStutter(_) => VariantKind::BufferStutter,
            Self::MelodicSkip(_) => VariantKind::MelodicSkip,
        }
    }
}

macro_rules! dispatch {
    ($self:ident, $v:ident => $body:expr) => {
        match $self {
            Algorithm::FloatingPointCollapse($v) => $body,
            Algorithm::NyquistDestroyer($v) => $body,
            Algorithm::BufferGlitch($v) => $body,
            Algorithm::AutomationQuantiser($v) => $body,
            Algorithm::StreamingArtifact($v) => $body,
            Algorithm::SpectralBrutalist($v) => $body,
            Algorithm::OverclockFailure($v) => $body,
            Algorithm::DeterministicMachine($v) => $body,
            Algorithm::BufferStutter($v) => $body,
            Algorithm::MelodicSkip($v) => $body,
        }
    };
}

impl Variant for Algorithm {
    fn prepare(&mut self, spec: &ProcessSpec) {
        dispatch!(self, v => v.prepare(spec));
    }

    fn reset(&mut self) {
        dispatch!(self, v => v.reset());
    }

    #[inline]
    fn process<R: RandomSource>(
        &mut self,
        block: &mut Block<'_>,
        params: &ParamReader<'_>,
        rng: &mut R,
    ) {
        dispatch!(self, v => v.process(block, params, rng));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::collections::BTreeSet;

    #[test]
    fn test_numbering_round_trips() {
        for (i, kind) in VariantKind::ALL.iter().enumerate() {
            assert_eq!(usize::from(kind.number()), i + 1);
            assert_eq!(VariantKind::from_number(kind.number()), Some(*kind));
            assert_eq!(VariantKind::from_slug(kind.slug()), Some(*kind));
            assert_eq!(Algorithm::new(*kind).kind(), *kind);
        }
        assert_eq!(VariantKind::from_number(0), None);
        assert_eq!(VariantKind::from_number(11), None);
        assert_eq!(VariantKind::from_slug("digital"), None);
    }

    #[test]
    fn test_param_ids_unique_and_numbered() {
        for kind in VariantKind::ALL {
            let params = kind.variant_params();
            assert!(!params.is_empty(), "{kind} has no parameters");
            let ids: BTreeSet<u32> = params.iter().map(|d| d.id.0).collect();
            assert_eq!(ids.len(), params.len(), "{kind} has duplicate ids");
            let base = 100 * u32::from(kind.number());
            for (i, desc) in params.iter().enumerate() {
                assert_eq!(desc.id.0, base + i as u32, "{}", desc.string_id);
                assert!(desc.min <= desc.default && desc.default <= desc.max);
            }
            let names: BTreeSet<&str> = params.iter().map(|d| d.string_id).collect();
            assert_eq!(names.len(), params.len());
        }
    }

    #[test]
    fn test_targets_and_defaults_in_range() {
        for kind in VariantKind::ALL {
            assert!((0.1..0.2).contains(&kind.target_rms()));
            assert!((0.0..=100.0).contains(&kind.default_autolevel()));
            assert!((0.0..=100.0).contains(&kind.default_safety()));
            assert!((-24.0..=24.0).contains(&kind.default_output_db()));
        }
    }
}
