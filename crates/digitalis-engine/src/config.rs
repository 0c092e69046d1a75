//! Per-instance identity: which variant runs, how it looks, which controls
//! it surfaces.
//!
//! An [`EngineConfig`] is built once and handed to
//! [`Engine::new`](crate::Engine::new). Nothing in the engine consults a
//! global; theme, subtitle and layout are plain data for whatever front end
//! sits on top.

use crate::{EngineError, VariantKind, universal_params};

/// 8-bit RGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    /// Red.
    pub r: u8,
    /// Green.
    pub g: u8,
    /// Blue.
    pub b: u8,
}

impl Rgb {
    /// Colour from a `0xRRGGBB` literal.
    pub const fn from_hex(rgb: u32) -> Self {
        Self {
            r: ((rgb >> 16) & 0xff) as u8,
            g: ((rgb >> 8) & 0xff) as u8,
            b: (rgb & 0xff) as u8,
        }
    }

    /// Back to `0xRRGGBB`.
    pub const fn to_hex(self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }
}

impl core::fmt::Display for Rgb {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// Six-colour palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    /// Background gradient, top.
    pub bg_top: Rgb,
    /// Background gradient, bottom.
    pub bg_bottom: Rgb,
    /// Control panel fill.
    pub panel: Rgb,
    /// Accent for active elements.
    pub accent: Rgb,
    /// Primary text.
    pub text: Rgb,
    /// Secondary text.
    pub muted: Rgb,
}

impl Theme {
    const fn hex(colours: [u32; 6]) -> Self {
        Self {
            bg_top: Rgb::from_hex(colours[0]),
            bg_bottom: Rgb::from_hex(colours[1]),
            panel: Rgb::from_hex(colours[2]),
            accent: Rgb::from_hex(colours[3]),
            text: Rgb::from_hex(colours[4]),
            muted: Rgb::from_hex(colours[5]),
        }
    }

    /// Factory palette of `kind`.
    pub const fn for_variant(kind: VariantKind) -> Self {
        match kind {
            VariantKind::FloatingPointCollapse => {
                Self::hex([0x1A1D29, 0x0B0F1E, 0x12172A, 0x41D3BD, 0xEAF5FF, 0xA9BBCA])
            }
            VariantKind::NyquistDestroyer => {
                Self::hex([0x241612, 0x120B0A, 0x221310, 0xFF8552, 0xFFEFE7, 0xCCAD9C])
            }
            VariantKind::BufferGlitch => {
                Self::hex([0x201928, 0x100C14, 0x1B1322, 0xFF6FA8, 0xFFF0F7, 0xCCB2BF])
            }
            VariantKind::AutomationQuantiser => {
                Self::hex([0x102522, 0x081411, 0x10201D, 0x5EE38F, 0xECFFF2, 0xAAC9B6])
            }
            VariantKind::StreamingArtifact => {
                Self::hex([0x252214, 0x131108, 0x1F1A10, 0xFFC94B, 0xFFF9E6, 0xD2C7A6])
            }
            VariantKind::SpectralBrutalist => {
                Self::hex([0x141A2C, 0x090D18, 0x12172A, 0x7FA6FF, 0xEDF3FF, 0xAAB9D8])
            }
            VariantKind::OverclockFailure => {
                Self::hex([0x2A1616, 0x140A0A, 0x241212, 0xFF5B5B, 0xFFEDED, 0xD5AFAF])
            }
            VariantKind::DeterministicMachine => {
                Self::hex([0x1B2316, 0x0F140B, 0x192214, 0x9FDF5A, 0xF4FFE7, 0xB9CEA7])
            }
            VariantKind::BufferStutter => {
                Self::hex([0x22191A, 0x120D0E, 0x1D1415, 0xFF7A6A, 0xFFF1EE, 0xD4B1AB])
            }
            VariantKind::MelodicSkip => {
                Self::hex([0x181E29, 0x0D121A, 0x141B25, 0x79C7FF, 0xECF7FF, 0xA8C2D6])
            }
        }
    }
}

/// One surfaced control: a parameter string id and its caption.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlSlot {
    /// String id of the parameter.
    pub param: &'static str,
    /// Caption shown next to the control.
    pub label: &'static str,
}

const fn slot(param: &'static str, label: &'static str) -> ControlSlot {
    ControlSlot { param, label }
}

/// Eight main controls plus four on the advanced page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlLayout {
    /// Main macro grid.
    pub macros: [ControlSlot; 8],
    /// Advanced page.
    pub advanced: [ControlSlot; 4],
}

impl ControlLayout {
    /// Every slot, macros first.
    pub fn slots(&self) -> impl Iterator<Item = &ControlSlot> {
        self.macros.iter().chain(self.advanced.iter())
    }

    /// Factory layout of `kind`.
    pub const fn for_variant(kind: VariantKind) -> Self {
        let finishing = [
            slot("mix", "Mix"),
            slot("autolevel", "Auto Level"),
            slot("safety", "Safety"),
            slot("output", "Output"),
        ];
        match kind {
            VariantKind::FloatingPointCollapse => Self {
                macros: [
                    slot("collapse", "Collapse"),
                    slot("mantissa_bits", "Mantissa Bits"),
                    slot("exponent_step", "Exponent Step"),
                    slot("temporal_hold", "Temporal Hold"),
                    slot("block_size", "Block Size"),
                    slot("quant_curve", "Quant Curve"),
                    slot("rounding", "Rounding Chaos"),
                    slot("denormal", "Denormal Burst"),
                ],
                advanced: finishing,
            },
            VariantKind::NyquistDestroyer => Self {
                macros: [
                    slot("destroy", "Destroy"),
                    slot("min_sr", "Min SR"),
                    slot("max_sr", "Max SR"),
                    slot("mod_depth", "SR Mod Depth"),
                    slot("mod_rate", "SR Mod Rate"),
                    slot("interp_err", "Interp Error"),
                    slot("transient", "Transient Drop"),
                    slot("feedback", "Alias Feedback"),
                ],
                advanced: [
                    slot("fb_tone", "Feedback Tone"),
                    slot("mix", "Mix"),
                    slot("autolevel", "Auto Level"),
                    slot("output", "Output"),
                ],
            },
            VariantKind::BufferGlitch => Self {
                macros: [
                    slot("stress", "Engine Stress"),
                    slot("base_block", "Base Block"),
                    slot("block_jitter", "Block Jitter"),
                    slot("seam", "Seam Error"),
                    slot("tail_drop", "Tail Drop"),
                    slot("reorder", "Reorder"),
                    slot("look_fail", "Lookahead Fail"),
                    slot("mix", "Mix Macro"),
                ],
                advanced: finishing,
            },
            VariantKind::AutomationQuantiser => Self {
                macros: [
                    slot("brutal", "Brutalism"),
                    slot("grid_mode", "Grid Mode"),
                    slot("step_div", "Step Division"),
                    slot("zipper", "Zipper Tone"),
                    slot("levels", "Env Levels"),
                    slot("phase_lock", "Phase Lock"),
                    slot("jitter", "Human Error"),
                    slot("mix", "Mix Macro"),
                ],
                advanced: finishing,
            },
            VariantKind::StreamingArtifact => Self {
                macros: [
                    slot("artifact", "Artifact"),
                    slot("bitrate", "Bitrate"),
                    slot("masking", "Masking"),
                    slot("smear", "Smear"),
                    slot("codec_mode", "Codec Mode"),
                    slot("switch_ms", "Switch Rate"),
                    slot("packet_loss", "Packet Loss"),
                    slot("burst", "Burstiness"),
                ],
                advanced: [
                    slot("preecho", "Pre Echo"),
                    slot("mix", "Mix"),
                    slot("autolevel", "Auto Level"),
                    slot("output", "Output"),
                ],
            },
            VariantKind::SpectralBrutalist => Self {
                macros: [
                    slot("brutalism", "Brutalism"),
                    slot("bin_density", "Bin Density"),
                    slot("cluster", "Cluster"),
                    slot("freeze_rate", "Freeze Rate"),
                    slot("freeze_len", "Freeze Length"),
                    slot("phase_scramble", "Phase Scramble"),
                    slot("phase_steps", "Phase Steps"),
                    slot("sort_amount", "Sort Amount"),
                ],
                advanced: [
                    slot("jitter", "Spectral Jitter"),
                    slot("mix", "Mix"),
                    slot("autolevel", "Auto Level"),
                    slot("output", "Output"),
                ],
            },
            VariantKind::OverclockFailure => Self {
                macros: [
                    slot("overclock", "Overclock"),
                    slot("sensitivity", "Sensitivity"),
                    slot("failure_rate", "Failure Rate"),
                    slot("latency_spike", "Latency Spike"),
                    slot("desync", "L/R Desync"),
                    slot("thermal", "Thermal Drift"),
                    slot("recovery", "Recovery"),
                    slot("mix", "Mix Macro"),
                ],
                advanced: finishing,
            },
            VariantKind::DeterministicMachine => Self {
                macros: [
                    slot("determinism", "Determinism"),
                    slot("state_count", "State Count"),
                    slot("state_dwell", "State Dwell"),
                    slot("loop_ms", "Loop Length"),
                    slot("hash_window", "Hash Window"),
                    slot("jump_rule", "Jump Rule"),
                    slot("memory", "Memory"),
                    slot("mix", "Mix Macro"),
                ],
                advanced: finishing,
            },
            VariantKind::BufferStutter => Self {
                macros: [
                    slot("amount", "Amount"),
                    slot("rate_hz", "Rate"),
                    slot("slice_ms", "Slice Length"),
                    slot("repeats", "Repeats"),
                    slot("reverse", "Reverse Chance"),
                    slot("timing_jitter", "Timing Jitter"),
                    slot("duck", "Dry Duck"),
                    slot("mix", "Mix Macro"),
                ],
                advanced: finishing,
            },
            VariantKind::MelodicSkip => Self {
                macros: [
                    slot("skip", "Skip Amount"),
                    slot("jump_rate", "Jump Rate"),
                    slot("seg_ms", "Segment Length"),
                    slot("melody", "Melody"),
                    slot("spread", "Pitch Spread"),
                    slot("reverse", "Reverse Chance"),
                    slot("flutter", "Flutter"),
                    slot("blur", "Blur"),
                ],
                advanced: finishing,
            },
        }
    }
}

/// Factory one-line description of `kind`.
pub const fn subtitle(kind: VariantKind) -> &'static str {
    match kind {
        VariantKind::FloatingPointCollapse => "Numerical precision collapse workstation",
        VariantKind::NyquistDestroyer => "Alias-first spectral destruction engine",
        VariantKind::BufferGlitch => "Buffer seams, reorder, and DAW-core failure",
        VariantKind::AutomationQuantiser => "Grid-locked control-rate brutalism",
        VariantKind::StreamingArtifact => "Streaming codec artifact synthesizer",
        VariantKind::SpectralBrutalist => "FFT-domain machine hearing vandalism",
        VariantKind::OverclockFailure => "CPU stress and thermal drift simulation",
        VariantKind::DeterministicMachine => "Finite-state microloop deterministic machine",
        VariantKind::BufferStutter => "Classic repeat-buffer stutter workstation",
        VariantKind::MelodicSkip => "Diskont-era melodic skip and jump composer",
    }
}

/// Everything that distinguishes one engine instance from another.
///
/// ## Example
///
/// ```rust
/// use digitalis_engine::{EngineConfig, VariantKind};
///
/// let config = EngineConfig::for_variant(VariantKind::OverclockFailure);
/// assert!(config.validate().is_ok());
/// assert_eq!(config.layout.macros[4].label, "L/R Desync");
/// assert_eq!(config.theme.accent.to_string(), "#FF5B5B");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Which algorithm runs.
    pub variant: VariantKind,
    /// Palette for a front end.
    pub theme: Theme,
    /// One-line description.
    pub subtitle: &'static str,
    /// Surfaced controls.
    pub layout: ControlLayout,
}

impl EngineConfig {
    /// Factory configuration of `kind`.
    pub const fn for_variant(kind: VariantKind) -> Self {
        Self {
            variant: kind,
            theme: Theme::for_variant(kind),
            subtitle: subtitle(kind),
            layout: ControlLayout::for_variant(kind),
        }
    }

    /// Check that every layout slot names a parameter of the variant.
    pub fn validate(&self) -> Result<(), EngineError> {
        let universal = universal_params(self.variant);
        let exposes = |id: &str| {
            self.variant
                .variant_params()
                .iter()
                .chain(universal.iter())
                .any(|d| d.string_id == id)
        };
        match self.layout.slots().find(|s| !exposes(s.param)) {
            Some(bad) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(
                    variant = self.variant.slug(),
                    param = bad.param,
                    "layout slot does not resolve"
                );
                Err(EngineError::UnknownLayoutParam {
                    variant: self.variant,
                    param: bad.param,
                })
            }
            None => Ok(()),
        }
    }
}

impl From<VariantKind> for EngineConfig {
    fn from(kind: VariantKind) -> Self {
        Self::for_variant(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_factory_layout_resolves() {
        for kind in VariantKind::ALL {
            let config = EngineConfig::for_variant(kind);
            assert_eq!(config.validate(), Ok(()), "{kind}");
            assert!(!config.subtitle.is_empty());
        }
    }

    #[test]
    fn test_bad_slot_rejected() {
        let mut config = EngineConfig::for_variant(VariantKind::MelodicSkip);
        config.layout.advanced[0] = slot("fb_tone", "Feedback Tone");
        assert_eq!(
            config.validate(),
            Err(EngineError::UnknownLayoutParam {
                variant: VariantKind::MelodicSkip,
                param: "fb_tone",
            })
        );
    }

    #[test]
    fn test_advanced_pages() {
        let nd = ControlLayout::for_variant(VariantKind::NyquistDestroyer);
        assert_eq!(nd.advanced[0].param, "fb_tone");
        let sag = ControlLayout::for_variant(VariantKind::StreamingArtifact);
        assert_eq!(sag.advanced[0].param, "preecho");
        let fpc = ControlLayout::for_variant(VariantKind::FloatingPointCollapse);
        assert_eq!(fpc.advanced.map(|s| s.param), ["mix", "autolevel", "safety", "output"]);
        assert_eq!(fpc.slots().count(), 12);
    }

    #[test]
    fn test_hex_round_trip() {
        let c = Rgb::from_hex(0x41D3BD);
        assert_eq!((c.r, c.g, c.b), (0x41, 0xD3, 0xBD));
        assert_eq!(c.to_hex(), 0x41D3BD);
        let theme = Theme::for_variant(VariantKind::FloatingPointCollapse);
        assert_eq!(theme.accent, c);
    }
}
