//! Configuration errors reported before audio starts.

use crate::VariantKind;

/// Errors from [`Engine::prepare`](crate::Engine::prepare) and
/// [`EngineConfig::validate`](crate::EngineConfig::validate).
///
/// The audio path never returns errors. Everything that can go wrong there
/// is clamped instead.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    /// Sample rate is zero, negative or not finite.
    InvalidSampleRate(f32),
    /// Maximum block size of zero.
    InvalidBlockSize(usize),
    /// Channel count of zero.
    InvalidChannelCount(usize),
    /// A control layout slot names a parameter the variant does not expose.
    UnknownLayoutParam {
        /// Variant whose layout was checked.
        variant: VariantKind,
        /// Offending string id.
        param: &'static str,
    },
}

impl core::fmt::Display for EngineError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InvalidSampleRate(sr) => write!(f, "invalid sample rate {sr}"),
            Self::InvalidBlockSize(n) => write!(f, "invalid maximum block size {n}"),
            Self::InvalidChannelCount(n) => write!(f, "invalid channel count {n}"),
            Self::UnknownLayoutParam { variant, param } => write!(
                f,
                "layout for {} references unknown parameter '{param}'",
                variant.name()
            ),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for EngineError {}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn test_display_messages() {
        assert_eq!(
            EngineError::InvalidSampleRate(0.0).to_string(),
            "invalid sample rate 0"
        );
        assert_eq!(
            EngineError::InvalidBlockSize(0).to_string(),
            "invalid maximum block size 0"
        );
        let err = EngineError::UnknownLayoutParam {
            variant: VariantKind::BufferStutter,
            param: "warp",
        };
        assert_eq!(
            err.to_string(),
            "layout for Classic Buffer Stutter references unknown parameter 'warp'"
        );
    }
}
