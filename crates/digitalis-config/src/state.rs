//! Persisted engine state.
//!
//! A host saves an [`EngineState`] with its session and restores it on
//! reload. Only parameter values and the selected program are kept; internal
//! DSP state is not, so the engine must be reset after a restore.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use digitalis_core::ParamStore;
use digitalis_engine::VariantKind;

use crate::error::ConfigError;

/// Current state format version.
pub const STATE_VERSION: u32 = 1;

/// Snapshot of one engine's parameter surface.
///
/// # JSON Format
///
/// ```json
/// {
///   "version": 1,
///   "variant": "melodic_skip",
///   "program": 3,
///   "params": { "skip": 58.0, "mix": 100.0 }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineState {
    /// Format version the state was written with.
    #[serde(default = "default_version")]
    pub version: u32,

    /// Slug of the variant the values belong to.
    pub variant: String,

    /// Selected factory program.
    #[serde(default)]
    pub program: usize,

    /// Parameter values by string id.
    #[serde(default)]
    pub params: BTreeMap<String, f32>,
}

fn default_version() -> u32 {
    STATE_VERSION
}

impl EngineState {
    /// Capture every value of `store` for `kind`.
    pub fn capture(kind: VariantKind, program: usize, store: &ParamStore) -> Self {
        Self {
            version: STATE_VERSION,
            variant: kind.slug().to_string(),
            program,
            params: store
                .iter()
                .map(|(desc, value)| (desc.string_id.to_string(), value))
                .collect(),
        }
    }

    /// The variant named by [`variant`](Self::variant).
    pub fn variant_kind(&self) -> Result<VariantKind, ConfigError> {
        VariantKind::from_slug(&self.variant)
            .ok_or_else(|| ConfigError::UnknownVariant(self.variant.clone()))
    }

    /// Write the saved values into `store`.
    ///
    /// The store is reset to defaults first, so ids absent from the state
    /// keep their defaults. Ids the store does not know and non-finite
    /// values are skipped; the number skipped is returned.
    ///
    /// # Errors
    ///
    /// [`ConfigError::VariantMismatch`] when the state was captured from a
    /// different variant; the store is not touched in that case.
    pub fn restore(&self, kind: VariantKind, store: &ParamStore) -> Result<usize, ConfigError> {
        if self.variant != kind.slug() {
            return Err(ConfigError::VariantMismatch {
                expected: kind.slug().to_string(),
                found: self.variant.clone(),
            });
        }

        store.reset_to_defaults();
        let skipped = self
            .params
            .iter()
            .filter(|&(id, &value)| !store.set_by_id(id, value))
            .count();

        #[cfg(feature = "tracing")]
        if skipped > 0 {
            tracing::warn!(variant = kind.slug(), skipped, "ignored saved parameters");
        }

        Ok(skipped)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Parse from TOML.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Load a state file. `.json` files are read as JSON, anything else as TOML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        if is_json(path) {
            Self::from_json(&content)
        } else {
            Self::from_toml(&content)
        }
    }

    /// Save a state file, choosing the format from the extension like [`load`](Self::load).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }

        let content = if is_json(path) {
            self.to_json()?
        } else {
            self.to_toml()?
        };
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        Ok(())
    }
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use digitalis_engine::param_descriptors;

    fn store(kind: VariantKind) -> ParamStore {
        ParamStore::new(param_descriptors(kind))
    }

    #[test]
    fn test_capture_restore() {
        let kind = VariantKind::OverclockFailure;
        let a = store(kind);
        a.set_by_id("thermal", 91.0);
        a.set_by_id("output", -3.0);
        let state = EngineState::capture(kind, 4, &a);
        assert_eq!(state.version, STATE_VERSION);
        assert_eq!(state.program, 4);

        let b = store(kind);
        assert_eq!(state.restore(kind, &b).unwrap(), 0);
        assert_eq!(b.snapshot(), a.snapshot());
    }

    #[test]
    fn test_restore_rejects_other_variant() {
        let state = EngineState::capture(
            VariantKind::BufferStutter,
            0,
            &store(VariantKind::BufferStutter),
        );
        let target = store(VariantKind::MelodicSkip);
        target.set_by_id("skip", 3.0);
        let err = state.restore(VariantKind::MelodicSkip, &target).unwrap_err();
        assert!(matches!(err, ConfigError::VariantMismatch { .. }));
        assert_eq!(target.get_by_id("skip"), Some(3.0));
    }

    #[test]
    fn test_restore_skips_unknown_and_keeps_defaults() {
        let json = r#"{
            "version": 1,
            "variant": "melodic_skip",
            "program": 2,
            "params": { "skip": 12.0, "legacy_knob": 5.0 }
        }"#;
        let state = EngineState::from_json(json).unwrap();
        let s = store(VariantKind::MelodicSkip);
        s.set_by_id("blur", 90.0);
        assert_eq!(state.restore(VariantKind::MelodicSkip, &s).unwrap(), 1);
        assert_eq!(s.get_by_id("skip"), Some(12.0));
        assert_eq!(s.get_by_id("blur"), Some(24.0));
    }

    #[test]
    fn test_missing_fields_default() {
        let state = EngineState::from_json(r#"{ "variant": "buffer_glitch" }"#).unwrap();
        assert_eq!(state.version, STATE_VERSION);
        assert_eq!(state.program, 0);
        assert!(state.params.is_empty());
        assert_eq!(state.variant_kind().unwrap(), VariantKind::BufferGlitch);
    }

    #[test]
    fn test_json_and_toml_forms_agree() {
        let kind = VariantKind::StreamingArtifact;
        let state = EngineState::capture(kind, 7, &store(kind));
        let from_json = EngineState::from_json(&state.to_json().unwrap()).unwrap();
        let from_toml = EngineState::from_toml(&state.to_toml().unwrap()).unwrap();
        assert_eq!(from_json, state);
        assert_eq!(from_toml, state);
    }

    #[test]
    fn test_bad_json() {
        assert!(matches!(
            EngineState::from_json("{ nope"),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn test_extension_detection() {
        assert!(is_json(Path::new("a/b.json")));
        assert!(is_json(Path::new("b.JSON")));
        assert!(!is_json(Path::new("b.toml")));
        assert!(!is_json(Path::new("state")));
    }
}
