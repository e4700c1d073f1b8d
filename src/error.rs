//! Error handling for the codec library
//!
//! Per the codec's error model, only construction can fail: a validly
//! created encoder or decoder is a total function of its inputs and state
//! for every subsequent call (see the crate-level docs for the rationale).

use thiserror::Error;

/// Result type alias for codec operations
pub type Result<T> = std::result::Result<T, CodecError>;

/// Errors that can occur while configuring or constructing a codec instance.
#[derive(Error, Debug)]
pub enum CodecError {
    /// The requested mode is not compiled into this build (see the
    /// `mode-*` Cargo features).
    #[error("unsupported mode: {mode}")]
    UnsupportedMode { mode: String },

    /// The requested sample rate does not match any mode's fixed rate.
    #[error("unsupported sample rate: {rate}Hz (supported: {supported:?})")]
    UnsupportedSampleRate { rate: u32, supported: Vec<u32> },

    /// A caller-supplied PCM or bitstream buffer did not match the size
    /// the configured mode requires.
    #[error("invalid frame size: expected {expected}, got {actual}")]
    InvalidFrameSize { expected: usize, actual: usize },

    /// A `ber_est` hint outside the legal `[0, 1]` range was supplied to
    /// `decode_ber`.
    #[error("invalid bit error rate estimate: {value} (must be in [0, 1])")]
    InvalidBitErrorRate { value: f32 },

    /// The operation is not defined for this mode, independent of any
    /// buffer size (e.g. constructing an encoder in `Mode450Pwb`).
    #[error("unsupported operation: {details}")]
    UnsupportedOperation { details: String },

    /// Resource exhaustion or other low-level failure at construction.
    #[error("codec initialization failed: {reason}")]
    InitializationFailed { reason: String },
}

impl CodecError {
    /// Construct an [`CodecError::UnsupportedMode`].
    pub fn unsupported_mode(mode: impl Into<String>) -> Self {
        Self::UnsupportedMode { mode: mode.into() }
    }

    /// Construct an [`CodecError::UnsupportedSampleRate`].
    pub fn unsupported_sample_rate(rate: u32, supported: Vec<u32>) -> Self {
        Self::UnsupportedSampleRate { rate, supported }
    }

    /// Construct an [`CodecError::UnsupportedOperation`].
    pub fn unsupported_operation(details: impl Into<String>) -> Self {
        Self::UnsupportedOperation {
            details: details.into(),
        }
    }

    /// Construct an [`CodecError::InitializationFailed`].
    pub fn initialization_failed(reason: impl Into<String>) -> Self {
        Self::InitializationFailed {
            reason: reason.into(),
        }
    }

    /// Whether a caller could plausibly retry after adjusting inputs,
    /// as opposed to a fixed property of the build or mode.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::InvalidFrameSize { .. } | Self::InvalidBitErrorRate { .. }
        )
    }

    /// Coarse category, mirroring the codec's error-handling design: only
    /// configuration-time failures exist, never a runtime category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::UnsupportedMode { .. }
            | Self::UnsupportedSampleRate { .. }
            | Self::UnsupportedOperation { .. }
            | Self::InitializationFailed { .. } => ErrorCategory::Configuration,

            Self::InvalidFrameSize { .. } | Self::InvalidBitErrorRate { .. } => {
                ErrorCategory::Input
            }
        }
    }
}

/// Error category for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Unsupported mode/rate, or construction-time resource failure.
    Configuration,
    /// A caller-supplied buffer or hint was out of range.
    Input,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Configuration => write!(f, "Configuration"),
            Self::Input => write!(f, "Input"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_mode_is_configuration_and_unrecoverable() {
        let err = CodecError::unsupported_mode("450pwb-encode");
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert!(!err.is_recoverable());
    }

    #[test]
    fn invalid_frame_size_is_input_and_recoverable() {
        let err = CodecError::InvalidFrameSize {
            expected: 320,
            actual: 160,
        };
        assert_eq!(err.category(), ErrorCategory::Input);
        assert!(err.is_recoverable());
        assert!(format!("{err}").contains("expected 320"));
    }

    #[test]
    fn invalid_ber_display() {
        let err = CodecError::InvalidBitErrorRate { value: 1.5 };
        assert!(format!("{err}").contains("1.5"));
    }
}
