//! The block engine: variant, post chain and dry/wet mix behind one call.
//!
//! [`Engine`] owns everything an instance needs: the [`Algorithm`] chosen by
//! its [`EngineConfig`], one working buffer per prepared channel, the
//! [`PostChain`] and the random stream. Host sample memory is only read
//! until the final mix, so the host buffer doubles as the dry signal.
//!
//! # Real-time contract
//!
//! [`prepare`](Engine::prepare) allocates. [`process`](Engine::process)
//! does not allocate, lock, or fail: parameters are clamped at the point of
//! use, blocks longer than the prepared maximum are split, extra host
//! channels are left untouched, and an unprepared engine leaves the input
//! as it is.
//!
//! ```rust
//! use digitalis_core::FastRng;
//! use digitalis_engine::{Engine, EngineConfig, ProcessSpec, VariantKind};
//!
//! let config = EngineConfig::for_variant(VariantKind::BufferStutter);
//! let mut engine = Engine::with_rng(config, FastRng::new(1));
//! engine.prepare(ProcessSpec::stereo(48_000.0, 256)).unwrap();
//!
//! let params = engine.create_param_store();
//! let mut left = vec![0.25_f32; 512];
//! let mut right = vec![-0.25_f32; 512];
//! engine.process(&mut [&mut left[..], &mut right[..]], &params);
//! assert!(left.iter().chain(&right).all(|x| x.is_finite() && x.abs() <= 1.0));
//! ```

use alloc::vec;
use alloc::vec::Vec;

use digitalis_core::{FastRng, ParamDescriptor, ParamSource, ParamStore, RandomSource};

use crate::post::{PostChain, PostParams};
use crate::{
    Algorithm, Block, DryWetMixer, EngineConfig, EngineError, ParamReader, ProcessSpec, Variant,
    VariantKind, param_descriptors, universal,
};

/// One degradation instance.
#[derive(Debug, Clone)]
pub struct Engine<R: RandomSource = FastRng> {
    config: EngineConfig,
    descriptors: Vec<ParamDescriptor>,
    algorithm: Algorithm,
    post: PostChain,
    work: Vec<Vec<f32>>,
    spec: Option<ProcessSpec>,
    rng: R,
}

impl Engine<FastRng> {
    /// Engine for `config` with a random stream seeded from entropy.
    #[cfg(feature = "std")]
    pub fn new(config: EngineConfig) -> Self {
        Self::with_rng(config, FastRng::from_entropy())
    }

    /// Engine for `config` with the default-seeded random stream.
    #[cfg(not(feature = "std"))]
    pub fn new(config: EngineConfig) -> Self {
        Self::with_rng(config, FastRng::default())
    }
}

impl<R: RandomSource> Engine<R> {
    /// Engine for `config` drawing from `rng`.
    pub fn with_rng(config: EngineConfig, rng: R) -> Self {
        let kind = config.variant;
        Self {
            config,
            descriptors: param_descriptors(kind),
            algorithm: Algorithm::new(kind),
            post: PostChain::new(0, kind.target_rms()),
            work: Vec::new(),
            spec: None,
            rng,
        }
    }

    /// The configuration this engine was built with.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Variant this engine runs.
    pub fn kind(&self) -> VariantKind {
        self.config.variant
    }

    /// Parameter layout: variant parameters, then `autolevel`, `safety`,
    /// `output`, `mix`.
    pub fn descriptors(&self) -> &[ParamDescriptor] {
        &self.descriptors
    }

    /// Fresh store holding every parameter at its default.
    pub fn create_param_store(&self) -> ParamStore {
        ParamStore::new(self.descriptors.clone())
    }

    /// The spec passed to the last successful [`prepare`](Self::prepare).
    pub fn spec(&self) -> Option<ProcessSpec> {
        self.spec
    }

    /// Processing delay the engine reports to a host. Always 0.
    pub fn latency_samples(&self) -> usize {
        0
    }

    /// Current auto-level compensation gain.
    pub fn auto_gain(&self) -> f32 {
        self.post.auto_gain()
    }

    /// Allocate all state for `spec` and return every counter, envelope and
    /// position to its initial value.
    ///
    /// Calling it again with the same spec is a full reset.
    ///
    /// # Errors
    ///
    /// Returns the [`ProcessSpec::validate`] or [`EngineConfig::validate`]
    /// error; the engine keeps its previous preparation in that case.
    pub fn prepare(&mut self, spec: ProcessSpec) -> Result<(), EngineError> {
        spec.validate()?;
        self.config.validate()?;
        self.algorithm.prepare(&spec);
        self.post = PostChain::new(spec.channels, self.config.variant.target_rms());
        self.work = vec![vec![0.0; spec.max_block_size]; spec.channels];
        self.rng.reset();
        self.spec = Some(spec);

        #[cfg(feature = "tracing")]
        tracing::debug!(
            variant = self.config.variant.slug(),
            sample_rate = spec.sample_rate,
            max_block = spec.max_block_size,
            channels = spec.channels,
            "engine prepared"
        );
        Ok(())
    }

    /// Reinitialise state without reallocating.
    pub fn reset(&mut self) {
        self.algorithm.reset();
        self.post.reset();
        self.rng.reset();
        for buf in &mut self.work {
            buf.fill(0.0);
        }
    }

    /// Process host channels in place.
    ///
    /// Only the first `spec.channels` channels are touched, over the length
    /// of the shortest of them.
    pub fn process<P: ParamSource + ?Sized>(&mut self, channels: &mut [&mut [f32]], params: &P) {
        let Some(spec) = self.spec else {
            return;
        };
        let count = channels.len().min(spec.channels);
        if count == 0 {
            return;
        }
        let frames = channels[..count].iter().map(|c| c.len()).min().unwrap_or(0);

        let source: &P = params;
        let reader = ParamReader::new(&source, &self.descriptors);
        let post_reader = reader.offset(self.config.variant.variant_params().len());
        let post = PostParams {
            autolevel: post_reader.percent(universal::AUTOLEVEL),
            safety: post_reader.percent(universal::SAFETY),
            output_db: post_reader.value(universal::OUTPUT),
        };
        let mixer = DryWetMixer::new(post_reader.percent(universal::MIX));

        let mut start = 0;
        while start < frames {
            let len = (frames - start).min(spec.max_block_size);
            for (work, host) in self.work.iter_mut().zip(channels.iter()) {
                // non-finite input would latch into variant state
                for (w, &x) in work[..len].iter_mut().zip(&host[start..start + len]) {
                    *w = if x.is_finite() { x } else { 0.0 };
                }
            }

            let mut block = Block::new(&mut self.work[..count], len);
            self.algorithm.process(&mut block, &reader, &mut self.rng);
            self.post.process(&mut block, post);

            for (host, work) in channels.iter_mut().zip(&self.work[..count]) {
                mixer.apply(&mut host[start..start + len], &work[..len]);
            }
            start += len;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    fn engine(kind: VariantKind) -> Engine {
        let mut e = Engine::with_rng(EngineConfig::for_variant(kind), FastRng::new(7));
        e.prepare(ProcessSpec::stereo(48_000.0, 128)).unwrap();
        e
    }

    fn tone(n: usize, f: f32) -> Vec<f32> {
        (0..n)
            .map(|i| 0.3 * libm::sinf(core::f32::consts::TAU * f * i as f32 / 48_000.0))
            .collect()
    }

    #[test]
    fn test_unprepared_is_noop() {
        let mut e = Engine::with_rng(
            EngineConfig::for_variant(VariantKind::NyquistDestroyer),
            FastRng::new(1),
        );
        let params = e.create_param_store();
        let mut l = tone(64, 440.0);
        let before = l.clone();
        e.process(&mut [&mut l[..]], &params);
        assert_eq!(l, before);
        assert_eq!(e.spec(), None);
    }

    #[test]
    fn test_prepare_rejects_bad_spec_and_keeps_old() {
        let mut e = engine(VariantKind::FloatingPointCollapse);
        let err = e.prepare(ProcessSpec::stereo(0.0, 128)).unwrap_err();
        assert_eq!(err, EngineError::InvalidSampleRate(0.0));
        assert_eq!(e.spec(), Some(ProcessSpec::stereo(48_000.0, 128)));
        assert_eq!(e.latency_samples(), 0);
    }

    #[test]
    fn test_descriptor_layout() {
        let e = engine(VariantKind::MelodicSkip);
        let ids: Vec<&str> = e.descriptors().iter().map(|d| d.string_id).collect();
        assert_eq!(ids.len(), 12);
        assert_eq!(&ids[8..], ["autolevel", "safety", "output", "mix"]);
        let store = e.create_param_store();
        assert_eq!(store.get_by_id("output"), Some(-10.7));
        assert_eq!(store.get_by_id("mix"), Some(100.0));
    }

    #[test]
    fn test_zero_mix_bit_exact() {
        for kind in VariantKind::ALL {
            let mut e = engine(kind);
            let params = e.create_param_store();
            params.set_by_id("mix", 0.0);
            let mut l = tone(300, 220.0);
            let mut r = tone(300, 331.0);
            let (l0, r0) = (l.clone(), r.clone());
            e.process(&mut [&mut l[..], &mut r[..]], &params);
            assert_eq!(l, l0, "{kind}");
            assert_eq!(r, r0, "{kind}");
        }
    }

    #[test]
    fn test_long_blocks_split_like_short_ones() {
        let kind = VariantKind::StreamingArtifact;
        let mut whole = engine(kind);
        let mut parts = engine(kind);
        let params: Vec<f32> = whole.descriptors().iter().map(|d| d.default).collect();

        let mut a = tone(512, 300.0);
        whole.process(&mut [&mut a[..]], &params[..]);

        let mut b = tone(512, 300.0);
        for chunk in b.chunks_mut(128) {
            parts.process(&mut [chunk], &params[..]);
        }
        assert_eq!(a, b);
    }

    #[test]
    fn test_extra_channels_untouched() {
        let mut e = Engine::with_rng(
            EngineConfig::for_variant(VariantKind::OverclockFailure),
            FastRng::new(3),
        );
        e.prepare(ProcessSpec {
            channels: 1,
            ..ProcessSpec::stereo(48_000.0, 64)
        })
        .unwrap();
        let params = e.create_param_store();
        let mut l = tone(64, 220.0);
        let mut r = tone(64, 220.0);
        let r0 = r.clone();
        e.process(&mut [&mut l[..], &mut r[..]], &params);
        assert_eq!(r, r0);
        assert_ne!(l, r0);
    }

    #[test]
    fn test_reprepare_resets_state() {
        let kind = VariantKind::DeterministicMachine;
        let mut e = engine(kind);
        let params = e.create_param_store();
        let render = |e: &mut Engine| {
            let mut l = tone(1024, 97.0);
            let mut r = tone(1024, 1880.0);
            e.process(&mut [&mut l[..], &mut r[..]], &params);
            (l, r)
        };
        let first = render(&mut e);
        render(&mut e);
        e.prepare(ProcessSpec::stereo(48_000.0, 128)).unwrap();
        assert_eq!(render(&mut e), first);
        render(&mut e);
        e.reset();
        assert_eq!(render(&mut e), first);
    }

    #[test]
    fn test_non_finite_params_fall_back() {
        let mut e = engine(VariantKind::AutomationQuantiser);
        let mut reference = engine(VariantKind::AutomationQuantiser);
        let defaults: Vec<f32> = e.descriptors().iter().map(|d| d.default).collect();
        let garbage = vec![f32::NAN; defaults.len()];
        let mut a = tone(256, 500.0);
        let mut b = a.clone();
        e.process(&mut [&mut a[..]], &garbage[..]);
        reference.process(&mut [&mut b[..]], &defaults[..]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_non_finite_input_does_not_latch() {
        let mut e = engine(VariantKind::OverclockFailure);
        let params = e.create_param_store();
        let mut l = tone(256, 300.0);
        l[10] = f32::NAN;
        l[11] = f32::INFINITY;
        e.process(&mut [&mut l[..]], &params);
        assert!(l.iter().all(|x| x.is_finite()));
        let mut l = tone(256, 300.0);
        e.process(&mut [&mut l[..]], &params);
        assert!(l.iter().all(|x| x.is_finite()));
    }

    #[test]
    fn test_partial_mix_keeps_bad_host_samples_out() {
        let mut e = engine(VariantKind::NyquistDestroyer);
        let params = e.create_param_store();
        params.set_by_id("mix", 50.0);
        let mut l = tone(256, 300.0);
        l[5] = f32::NAN;
        l[6] = f32::INFINITY;
        l[7] = 3.0;
        l[8] = -3.0;
        let mut r = l.clone();
        e.process(&mut [&mut l[..], &mut r[..]], &params);
        for (i, y) in l.iter().chain(&r).enumerate() {
            assert!(y.is_finite() && y.abs() <= 1.0, "sample {i} = {y}");
        }
    }

    #[test]
    fn test_prepare_rejects_unresolved_layout() {
        let mut config = EngineConfig::for_variant(VariantKind::BufferStutter);
        config.layout.macros[0].param = "collapse";
        let mut e = Engine::with_rng(config, FastRng::new(1));
        assert!(matches!(
            e.prepare(ProcessSpec::default()),
            Err(EngineError::UnknownLayoutParam { param: "collapse", .. })
        ));
        assert_eq!(e.spec(), None);
    }
}
