//! Factory preset banks bundled with the library.
//!
//! One bank per variant, embedded at compile time from `presets/*.toml`.
//! Each bank holds ten programs in the same order: Init, Safe Mix, two
//! Subtle, two Medium, two Extreme and two Rhythmic presets.

use digitalis_engine::VariantKind;

use crate::{ConfigError, Preset, PresetBank};

/// TOML content of every factory bank, in variant order.
static FACTORY_BANKS_TOML: [(VariantKind, &str); 10] = [
    (
        VariantKind::FloatingPointCollapse,
        include_str!("../presets/floating_point_collapse.toml"),
    ),
    (
        VariantKind::NyquistDestroyer,
        include_str!("../presets/nyquist_destroyer.toml"),
    ),
    (
        VariantKind::BufferGlitch,
        include_str!("../presets/buffer_glitch.toml"),
    ),
    (
        VariantKind::AutomationQuantiser,
        include_str!("../presets/automation_quantiser.toml"),
    ),
    (
        VariantKind::StreamingArtifact,
        include_str!("../presets/streaming_artifact.toml"),
    ),
    (
        VariantKind::SpectralBrutalist,
        include_str!("../presets/spectral_brutalist.toml"),
    ),
    (
        VariantKind::OverclockFailure,
        include_str!("../presets/overclock_failure.toml"),
    ),
    (
        VariantKind::DeterministicMachine,
        include_str!("../presets/deterministic_machine.toml"),
    ),
    (
        VariantKind::BufferStutter,
        include_str!("../presets/buffer_stutter.toml"),
    ),
    (
        VariantKind::MelodicSkip,
        include_str!("../presets/melodic_skip.toml"),
    ),
];

/// Raw TOML of the factory bank for `kind`.
pub fn factory_bank_toml(kind: VariantKind) -> &'static str {
    FACTORY_BANKS_TOML
        .iter()
        .find(|(k, _)| *k == kind)
        .map_or("", |(_, toml)| toml)
}

/// Parse the factory bank for `kind`.
pub fn factory_bank(kind: VariantKind) -> Result<PresetBank, ConfigError> {
    let bank = PresetBank::from_toml(factory_bank_toml(kind))?;
    let found = bank.variant_kind()?;
    if found != kind {
        return Err(ConfigError::VariantMismatch {
            expected: kind.slug().to_string(),
            found: found.slug().to_string(),
        });
    }
    Ok(bank)
}

/// Factory preset at program `index`.
///
/// # Errors
///
/// [`ConfigError::PresetNotFound`] when `index` is past the end of the bank.
pub fn factory_preset(kind: VariantKind, index: usize) -> Result<Preset, ConfigError> {
    let bank = factory_bank(kind)?;
    bank.get(index).cloned().ok_or_else(|| {
        ConfigError::PresetNotFound(format!("{} #{index}", kind.slug()))
    })
}

/// Factory preset named `name` (ASCII case-insensitive).
pub fn find_factory_preset(kind: VariantKind, name: &str) -> Result<Preset, ConfigError> {
    let bank = factory_bank(kind)?;
    bank.find(name)
        .cloned()
        .ok_or_else(|| ConfigError::PresetNotFound(name.to_string()))
}

/// Program names of the factory bank for `kind`.
pub fn factory_preset_names(kind: VariantKind) -> Result<Vec<String>, ConfigError> {
    Ok(factory_bank(kind)?
        .presets
        .into_iter()
        .map(|p| p.name)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use digitalis_core::ParamStore;
    use digitalis_engine::param_descriptors;

    #[test]
    fn test_every_bank_parses_with_ten_programs() {
        for kind in VariantKind::ALL {
            let bank = factory_bank(kind).unwrap();
            assert_eq!(bank.len(), 10, "{}", kind.slug());
            assert_eq!(bank.get(0).unwrap().name, "Init");
            assert_eq!(bank.get(1).unwrap().name, "Safe Mix");
        }
    }

    #[test]
    fn test_every_preset_applies() {
        for kind in VariantKind::ALL {
            let store = ParamStore::new(param_descriptors(kind));
            for preset in factory_bank(kind).unwrap().iter() {
                preset
                    .apply(kind, &store)
                    .unwrap_or_else(|e| panic!("{} / {}: {e}", kind.slug(), preset.name));
            }
        }
    }

    #[test]
    fn test_presets_cover_every_parameter() {
        for kind in VariantKind::ALL {
            let descriptors = param_descriptors(kind);
            for preset in factory_bank(kind).unwrap().iter() {
                for d in &descriptors {
                    assert!(
                        preset.get(d.string_id).is_some(),
                        "{} / {} lacks {}",
                        kind.slug(),
                        preset.name,
                        d.string_id
                    );
                }
            }
        }
    }

    #[test]
    fn test_selection_is_repeatable() {
        let kind = VariantKind::SpectralBrutalist;
        let a = ParamStore::new(param_descriptors(kind));
        let b = ParamStore::new(param_descriptors(kind));
        for index in 0..10 {
            factory_preset(kind, index).unwrap().apply(kind, &a).unwrap();
            factory_preset(kind, 9 - index).unwrap().apply(kind, &b).unwrap();
            factory_preset(kind, index).unwrap().apply(kind, &b).unwrap();
            let bits = |s: &ParamStore| -> Vec<u32> {
                s.snapshot().iter().map(|v| v.to_bits()).collect()
            };
            assert_eq!(bits(&a), bits(&b));
        }
    }

    #[test]
    fn test_out_of_range_index() {
        let err = factory_preset(VariantKind::MelodicSkip, 10).unwrap_err();
        assert!(matches!(err, ConfigError::PresetNotFound(_)));
    }

    #[test]
    fn test_find_by_name() {
        let preset = find_factory_preset(VariantKind::MelodicSkip, "safe mix").unwrap();
        assert_eq!(preset.name, "Safe Mix");
        assert_eq!(preset.get("mix"), Some(30.0));
        assert!(matches!(
            find_factory_preset(VariantKind::MelodicSkip, "nope"),
            Err(ConfigError::PresetNotFound(_))
        ));
    }

    #[test]
    fn test_names_in_program_order() {
        let names = factory_preset_names(VariantKind::BufferStutter).unwrap();
        assert_eq!(names.len(), 10);
        assert_eq!(names[0], "Init");
    }
}
