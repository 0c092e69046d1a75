//! Argument parsing shared by several commands.

use anyhow::{Context, bail};
use digitalis_config::{EngineState, Preset, factory_bank, factory_preset};
use digitalis_core::{FastRng, ParamStore};
use digitalis_engine::{Engine, EngineConfig, VariantKind};
use std::path::Path;

/// Resolve a variant from its slug, its number (1-10) or its display name.
pub fn parse_variant(s: &str) -> Result<VariantKind, String> {
    let s = s.trim();
    if let Ok(number) = s.parse::<u8>() {
        return VariantKind::from_number(number)
            .ok_or_else(|| format!("variant number must be 1-10, got {number}"));
    }
    let slug = s.to_ascii_lowercase().replace(['-', ' '], "_");
    VariantKind::from_slug(&slug)
        .or_else(|| {
            VariantKind::ALL
                .into_iter()
                .find(|k| k.name().eq_ignore_ascii_case(s))
        })
        .ok_or_else(|| format!("unknown variant '{s}' (see `digitalis variants`)"))
}

/// Parse `id=value` into a parameter id and number.
pub fn parse_param(s: &str) -> Result<(String, f32), String> {
    let Some((key, value)) = s.split_once('=') else {
        return Err(format!("invalid parameter format: '{s}' (expected id=value)"));
    };
    let value: f32 = value
        .trim()
        .parse()
        .map_err(|_| format!("invalid value for '{key}': '{value}'"))?;
    Ok((key.trim().to_string(), value))
}

/// Factory preset and its program index, selected by index or name.
pub fn resolve_preset(kind: VariantKind, selector: &str) -> anyhow::Result<(usize, Preset)> {
    if let Ok(index) = selector.parse::<usize>() {
        let preset = factory_preset(kind, index)
            .with_context(|| format!("no preset #{index} for {}", kind.name()))?;
        return Ok((index, preset));
    }
    let bank = factory_bank(kind)?;
    bank.position(selector)
        .and_then(|index| bank.get(index).map(|p| (index, p.clone())))
        .with_context(|| format!("no preset '{selector}' for {}", kind.name()))
}

/// Engine for `kind`, seeded if a seed is given.
pub fn build_engine(kind: VariantKind, seed: Option<u32>) -> Engine {
    let config = EngineConfig::for_variant(kind);
    match seed {
        Some(seed) => Engine::with_rng(config, FastRng::new(seed)),
        None => Engine::new(config),
    }
}

/// Fill `store` from an optional preset or state file, then apply overrides.
///
/// Returns the program number of the preset or restored state, if any.
pub fn configure_params(
    kind: VariantKind,
    store: &ParamStore,
    preset: Option<&str>,
    state: Option<&Path>,
    overrides: &[(String, f32)],
) -> anyhow::Result<Option<usize>> {
    let mut program = None;
    if let Some(selector) = preset {
        let (index, preset) = resolve_preset(kind, selector)?;
        preset.apply(kind, store)?;
        tracing::info!(preset = %preset.name, program = index, "applied preset");
        program = Some(index);
    }
    if let Some(path) = state {
        let state = EngineState::load(path)
            .with_context(|| format!("failed to load state {}", path.display()))?;
        let skipped = state.restore(kind, store)?;
        tracing::info!(
            path = %path.display(),
            program = state.program,
            skipped,
            "restored state"
        );
        program = Some(state.program);
    }
    for (id, value) in overrides {
        let Some(index) = store.index_of(id) else {
            bail!("{} has no parameter '{id}'", kind.name());
        };
        if !store.set(index, *value) {
            bail!("parameter '{id}' rejected value {value}");
        }
    }
    Ok(program)
}

/// RMS of all samples in dB.
pub fn rms_db<'a>(samples: impl Iterator<Item = &'a f32>) -> f32 {
    let (sum, count) = samples.fold((0.0_f64, 0_usize), |(s, n), &x| {
        (s + f64::from(x) * f64::from(x), n + 1)
    });
    if count == 0 {
        return digitalis_core::linear_to_db(0.0);
    }
    digitalis_core::linear_to_db((sum / count as f64).sqrt() as f32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_variant_forms() {
        assert_eq!(parse_variant("9"), Ok(VariantKind::BufferStutter));
        assert_eq!(parse_variant("melodic_skip"), Ok(VariantKind::MelodicSkip));
        assert_eq!(parse_variant("Melodic-Skip"), Ok(VariantKind::MelodicSkip));
        assert_eq!(
            parse_variant("Nyquist Destroyer"),
            Ok(VariantKind::NyquistDestroyer)
        );
        assert!(parse_variant("0").is_err());
        assert!(parse_variant("granular").is_err());
    }

    #[test]
    fn test_parse_param() {
        assert_eq!(parse_param("mix=35"), Ok(("mix".to_string(), 35.0)));
        assert_eq!(parse_param(" skip = 1.5"), Ok(("skip".to_string(), 1.5)));
        assert!(parse_param("mix").is_err());
        assert!(parse_param("mix=loud").is_err());
    }

    #[test]
    fn test_configure_overrides_after_preset() {
        let kind = VariantKind::BufferGlitch;
        let store = build_engine(kind, Some(1)).create_param_store();
        let overrides = vec![("stress".to_string(), 12.0)];
        let program = configure_params(kind, &store, Some("Init"), None, &overrides).unwrap();
        assert_eq!(program, Some(0));
        assert_eq!(store.get_by_id("stress"), Some(12.0));
        assert_eq!(configure_params(kind, &store, None, None, &[]).unwrap(), None);

        let bad = vec![("drive".to_string(), 1.0)];
        assert!(configure_params(kind, &store, None, None, &bad).is_err());
    }

    #[test]
    fn test_resolve_preset_by_index_and_name() {
        let kind = VariantKind::OverclockFailure;
        let (index, preset) = resolve_preset(kind, "0").unwrap();
        assert_eq!((index, preset.name.as_str()), (0, "Init"));
        let (index, preset) = resolve_preset(kind, "safe mix").unwrap();
        assert_eq!((index, preset.name.as_str()), (1, "Safe Mix"));
        assert!(resolve_preset(kind, "42").is_err());
    }

    #[test]
    fn test_rms_db() {
        let ones = [1.0_f32; 8];
        assert!(rms_db(ones.iter()).abs() < 1e-4);
        assert!(rms_db(std::iter::empty()) < -150.0);
    }
}
