//! Preset file format and operations.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use digitalis_core::ParamStore;
use digitalis_engine::VariantKind;

use crate::error::ConfigError;

/// A named set of parameter values for one variant.
///
/// Values are keyed by parameter string id. Ids missing from the map keep
/// their descriptor default when the preset is applied.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Preset {
    /// Name of the preset.
    pub name: String,

    /// Optional description of the preset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Parameter values by string id.
    #[serde(default)]
    pub params: BTreeMap<String, f32>,
}

impl Preset {
    /// Create a new empty preset.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            params: BTreeMap::new(),
        }
    }

    /// Create a preset with a description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Add or replace one parameter value.
    pub fn with_param(mut self, id: impl Into<String>, value: f32) -> Self {
        self.params.insert(id.into(), value);
        self
    }

    /// Capture every current value of `store`.
    pub fn capture(name: impl Into<String>, store: &ParamStore) -> Self {
        Self {
            name: name.into(),
            description: None,
            params: store
                .iter()
                .map(|(desc, value)| (desc.string_id.to_string(), value))
                .collect(),
        }
    }

    /// Check that every id is a parameter of `store` and every value is finite.
    pub fn validate(&self, kind: VariantKind, store: &ParamStore) -> Result<(), ConfigError> {
        for (id, value) in &self.params {
            let reason = if store.index_of(id).is_none() {
                "unknown parameter"
            } else if !value.is_finite() {
                "value is not finite"
            } else {
                continue;
            };
            return Err(ConfigError::InvalidParameter {
                variant: kind.slug().to_string(),
                param: id.clone(),
                reason: reason.to_string(),
            });
        }
        Ok(())
    }

    /// Reset `store` to defaults, then write every value of the preset.
    ///
    /// The preset is validated first, so on error the store is left as it
    /// was. Values outside a descriptor range are clamped by the store.
    pub fn apply(&self, kind: VariantKind, store: &ParamStore) -> Result<(), ConfigError> {
        self.validate(kind, store)?;
        store.reset_to_defaults();
        for (id, &value) in &self.params {
            store.set_by_id(id, value);
        }
        Ok(())
    }

    /// Number of stored values.
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// `true` if the preset stores no values.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Value stored for `id`.
    pub fn get(&self, id: &str) -> Option<f32> {
        self.params.get(id).copied()
    }
}

/// The presets of one variant, as stored in a bank file.
///
/// # TOML Format
///
/// ```toml
/// variant = "buffer_stutter"
///
/// [[presets]]
/// name = "Init"
/// [presets.params]
/// amount = 54.0
/// rate_hz = 6.0
/// mix = 100.0
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PresetBank {
    /// Slug of the variant every preset targets.
    pub variant: String,

    /// Presets in program order.
    #[serde(default)]
    pub presets: Vec<Preset>,
}

impl PresetBank {
    /// Empty bank for `kind`.
    pub fn new(kind: VariantKind) -> Self {
        Self {
            variant: kind.slug().to_string(),
            presets: Vec::new(),
        }
    }

    /// Add a preset to the end of the bank.
    pub fn with_preset(mut self, preset: Preset) -> Self {
        self.presets.push(preset);
        self
    }

    /// The variant named by [`variant`](Self::variant).
    pub fn variant_kind(&self) -> Result<VariantKind, ConfigError> {
        VariantKind::from_slug(&self.variant)
            .ok_or_else(|| ConfigError::UnknownVariant(self.variant.clone()))
    }

    /// Load a bank from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        Self::from_toml(&content)
    }

    /// Load a bank from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Save the bank to a TOML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }

        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        Ok(())
    }

    /// Convert the bank to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Number of presets.
    pub fn len(&self) -> usize {
        self.presets.len()
    }

    /// `true` if the bank holds no presets.
    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }

    /// Preset at program `index`.
    pub fn get(&self, index: usize) -> Option<&Preset> {
        self.presets.get(index)
    }

    /// Preset whose name matches `name`, ignoring ASCII case.
    pub fn find(&self, name: &str) -> Option<&Preset> {
        self.position(name).and_then(|i| self.presets.get(i))
    }

    /// Program index of the preset named `name`, ignoring ASCII case.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.presets
            .iter()
            .position(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// Iterate over presets.
    pub fn iter(&self) -> impl Iterator<Item = &Preset> {
        self.presets.iter()
    }

    /// Preset names in program order.
    pub fn names(&self) -> Vec<&str> {
        self.presets.iter().map(|p| p.name.as_str()).collect()
    }
}
