//! Output quality rules checked against every variant.
//!
//! - Peak ceiling: output never exceeds the safety limiter ceiling
//! - DC rejection: a constant offset on the input is removed by every variant
//! - Auto-level: the compensation gain settles on target / input RMS, both on
//!   the bare post chain and through the engine after a loud start
//! - Output trim: lowering the trim lowers the level

use digitalis_core::{FastRng, ParamStore, lerp, rms};
use digitalis_engine::post::{AutoLevel, PostChain, PostParams};
use digitalis_engine::{
    Algorithm, Block, Engine, EngineConfig, ParamReader, ProcessSpec, Variant, VariantKind,
};

const SAMPLE_RATE: f32 = 48000.0;
const BLOCK: usize = 256;
const SEED: u32 = 5;

fn generate_sine(freq_hz: f32, amplitude: f32, duration_s: f32) -> Vec<f32> {
    let num_samples = (SAMPLE_RATE * duration_s) as usize;
    (0..num_samples)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE;
            amplitude * (2.0 * std::f32::consts::PI * freq_hz * t).sin()
        })
        .collect()
}

fn peak(signal: &[f32]) -> f32 {
    signal.iter().copied().map(f32::abs).fold(0.0f32, f32::max)
}

fn mean(signal: &[f32]) -> f32 {
    signal.iter().sum::<f32>() / signal.len().max(1) as f32
}

fn engine(kind: VariantKind) -> Engine {
    let mut e = Engine::with_rng(EngineConfig::for_variant(kind), FastRng::new(SEED));
    e.prepare(ProcessSpec::stereo(SAMPLE_RATE, BLOCK)).unwrap();
    e
}

/// Run a mono signal through both channels in host blocks of `BLOCK`.
fn process_signal(e: &mut Engine, params: &ParamStore, input: &[f32]) -> (Vec<f32>, Vec<f32>) {
    let mut l = input.to_vec();
    let mut r = input.to_vec();
    for (a, b) in l.chunks_mut(BLOCK).zip(r.chunks_mut(BLOCK)) {
        e.process(&mut [a, b], params);
    }
    (l, r)
}

#[test]
fn peak_stays_under_limiter_ceiling() {
    let input = generate_sine(1000.0, 1.0, 1.0);
    for kind in VariantKind::ALL {
        let mut e = engine(kind);
        let params = e.create_param_store();
        let ceiling = lerp(0.995, 0.8, kind.default_safety() / 100.0);
        let (l, r) = process_signal(&mut e, &params, &input);
        let p = peak(&l).max(peak(&r));
        assert!(
            p <= ceiling + 1e-6,
            "{}: peak {p} over ceiling {ceiling}",
            kind.name()
        );
    }
}

#[test]
fn full_safety_lowers_ceiling() {
    let input = generate_sine(220.0, 1.0, 0.5);
    for kind in VariantKind::ALL {
        let mut e = engine(kind);
        let params = e.create_param_store();
        params.set_by_id("safety", 100.0);
        params.set_by_id("output", 24.0);
        let (l, r) = process_signal(&mut e, &params, &input);
        assert!(peak(&l).max(peak(&r)) <= 0.8 + 1e-6, "{}", kind.name());
    }
}

#[test]
fn dc_offset_rejected() {
    let input: Vec<f32> = generate_sine(440.0, 0.1, 3.0)
        .into_iter()
        .map(|x| x + 0.25)
        .collect();
    let tail = input.len() - (SAMPLE_RATE * 1.5) as usize;

    for kind in VariantKind::ALL {
        let mut e = engine(kind);
        let params = e.create_param_store();
        params.set_by_id("autolevel", 0.0);
        params.set_by_id("safety", 0.0);
        params.set_by_id("output", 0.0);
        let (l, r) = process_signal(&mut e, &params, &input);
        for (ch, out) in [l, r].iter().enumerate() {
            let dc = mean(&out[tail..]).abs();
            assert!(dc < 0.03, "{} ch{ch}: residual DC {dc}", kind.name());
        }
    }
}

#[test]
fn auto_level_converges_on_target() {
    let target = VariantKind::BufferStutter.target_rms();
    let mut chain = PostChain::new(2, target);
    // two whole periods per block, so every block has the same RMS
    let tone: Vec<f32> = generate_sine(375.0, 0.1, 0.01)[..BLOCK].to_vec();
    let input_rms = rms(&tone);
    let params = PostParams {
        autolevel: 1.0,
        safety: 0.0,
        output_db: 0.0,
    };

    for _ in 0..2000 {
        let mut buf = vec![tone.clone(), tone.clone()];
        chain.process(&mut Block::new(&mut buf, tone.len()), params);
    }
    let expected = target / input_rms;
    assert!(
        (chain.auto_gain() - expected).abs() / expected < 0.01,
        "gain {} expected {expected}",
        chain.auto_gain()
    );
}

/// Engine compensation gain after priming with a loud tone and settling on
/// a quiet one, next to the mean target / RMS ratio the variant output
/// asked for over the settled blocks.
fn settled_gain(kind: VariantKind) -> (f32, f32, f32) {
    let loud: Vec<f32> = generate_sine(375.0, 0.8, 0.01)[..BLOCK].to_vec();
    let quiet: Vec<f32> = generate_sine(375.0, 0.1, 0.01)[..BLOCK].to_vec();

    let mut e = engine(kind);
    let params = e.create_param_store();
    params.set_by_id("autolevel", 100.0);
    params.set_by_id("safety", 0.0);
    params.set_by_id("output", 0.0);
    let values = params.snapshot();

    let descriptors = e.descriptors().to_vec();
    let reader = ParamReader::new(&values, &descriptors);
    let mut reference = Algorithm::new(kind);
    reference.prepare(&ProcessSpec::stereo(SAMPLE_RATE, BLOCK));
    let mut rng = FastRng::new(SEED);

    let target = kind.target_rms();
    let mut primed = 0.0;
    let mut ratios = Vec::new();
    for n in 0..1200 {
        let tone = if n < 200 { &loud } else { &quiet };
        let mut buf = vec![tone.clone(), tone.clone()];
        reference.process(&mut Block::new(&mut buf, BLOCK), &reader, &mut rng);
        let ratio = (target / (Block::new(&mut buf, BLOCK).rms() + 1.0e-6))
            .clamp(AutoLevel::MIN_RATIO, AutoLevel::MAX_RATIO);
        if n >= 1000 {
            ratios.push(ratio);
        }

        let (mut l, mut r) = (tone.clone(), tone.clone());
        e.process(&mut [&mut l[..], &mut r[..]], &values[..]);
        if n == 199 {
            primed = e.auto_gain();
        }
    }
    let expected = ratios.iter().sum::<f32>() / ratios.len() as f32;
    (primed, e.auto_gain(), expected)
}

#[test]
fn engine_auto_level_settles_from_any_start() {
    for kind in [
        VariantKind::FloatingPointCollapse,
        VariantKind::NyquistDestroyer,
        VariantKind::AutomationQuantiser,
    ] {
        let (primed, settled, expected) = settled_gain(kind);
        assert!(
            (settled - expected).abs() / expected < 0.05,
            "{}: gain {settled} expected {expected}",
            kind.name()
        );
        assert!(
            primed < settled,
            "{}: loud priming {primed} should sit below quiet gain {settled}",
            kind.name()
        );
    }
}

#[test]
fn output_trim_lowers_level() {
    let input = generate_sine(330.0, 0.5, 1.0);
    for kind in VariantKind::ALL {
        let mut loud = engine(kind);
        let mut quiet = engine(kind);
        let loud_params = loud.create_param_store();
        let quiet_params = quiet.create_param_store();
        for p in [&loud_params, &quiet_params] {
            p.set_by_id("autolevel", 0.0);
        }
        loud_params.set_by_id("output", 0.0);
        quiet_params.set_by_id("output", -24.0);
        let (l_loud, _) = process_signal(&mut loud, &loud_params, &input);
        let (l_quiet, _) = process_signal(&mut quiet, &quiet_params, &input);
        assert!(
            rms(&l_quiet) < rms(&l_loud),
            "{}: {} vs {}",
            kind.name(),
            rms(&l_quiet),
            rms(&l_loud)
        );
    }
}
