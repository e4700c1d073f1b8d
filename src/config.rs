//! Codec configuration builder (§10.4).

use crate::error::{CodecError, Result};
use crate::types::Mode;

/// LPC post-filter parameters (§4.4): sharpens formants by evaluating
/// `H(z/gamma) / H(z/beta)` in the magnitude domain.
#[derive(Debug, Clone, Copy)]
pub struct LpcPostFilter {
    pub enable: bool,
    pub bass_boost: bool,
    pub beta: f32,
    pub gamma: f32,
}

impl Default for LpcPostFilter {
    fn default() -> Self {
        Self { enable: true, bass_boost: true, beta: 0.2, gamma: 0.5 }
    }
}

/// Configuration for a single encoder or decoder instance.
///
/// Built with the usual `with_*` chain, then validated once via
/// [`CodecConfig::validate`] before any buffers are allocated.
#[derive(Debug, Clone)]
pub struct CodecConfig {
    mode: Mode,
    lpc_post_filter: LpcPostFilter,
    newamp1_equalizer: bool,
    newamp1_post_filter: bool,
    gray: bool,
    softdec: bool,
    for_encode: bool,
}

impl CodecConfig {
    /// Start a config for `mode`, with the mode's own default Gray flag
    /// (§4.5) and the LPC post-filter on.
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            lpc_post_filter: LpcPostFilter::default(),
            newamp1_equalizer: false,
            newamp1_post_filter: false,
            gray: mode.default_gray(),
            softdec: false,
            for_encode: true,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn with_lpc_post_filter(mut self, enable: bool, bass_boost: bool, beta: f32, gamma: f32) -> Self {
        self.lpc_post_filter = LpcPostFilter { enable, bass_boost, beta, gamma };
        self
    }

    pub fn lpc_post_filter(&self) -> LpcPostFilter {
        self.lpc_post_filter
    }

    /// Toggle the 700C rate-K equaliser of §4.6.1.
    pub fn with_newamp1_equalizer(mut self, enable: bool) -> Self {
        self.newamp1_equalizer = enable;
        self
    }

    pub fn newamp1_equalizer(&self) -> bool {
        self.newamp1_equalizer
    }

    /// Toggle the 700C/450 formant-raising rate-K post-filter.
    pub fn with_newamp1_post_filter(mut self, enable: bool) -> Self {
        self.newamp1_post_filter = enable;
        self
    }

    pub fn newamp1_post_filter(&self) -> bool {
        self.newamp1_post_filter
    }

    /// Override natural/Gray coding of Wo/energy indexes.
    pub fn with_natural_or_gray(mut self, gray: bool) -> Self {
        self.gray = gray;
        self
    }

    pub fn gray(&self) -> bool {
        self.gray
    }

    /// Enable the optional soft-decision-bit buffer of §6 on the decode
    /// path (used alongside `ber_est` bit-error mitigation).
    pub fn with_softdec(mut self, enable: bool) -> Self {
        self.softdec = enable;
        self
    }

    pub fn softdec(&self) -> bool {
        self.softdec
    }

    /// Mark this config as intended for an encoder rather than a
    /// decoder; `validate` uses this to reject `Mode450Pwb`.
    pub fn for_encode(mut self, for_encode: bool) -> Self {
        self.for_encode = for_encode;
        self
    }

    /// Reject combinations forbidden by §4.7/§9 before any buffers are
    /// allocated: constructing an encoder in `Mode450Pwb`.
    pub fn validate(&self) -> Result<()> {
        if self.for_encode && !self.mode.supports_encode() {
            return Err(CodecError::unsupported_operation(format!(
                "mode {} is decode-only",
                self.mode
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates_for_normal_modes() {
        let cfg = CodecConfig::new(Mode::Mode3200);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn encoder_config_rejects_450pwb() {
        let cfg = CodecConfig::new(Mode::Mode450Pwb).for_encode(true);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn decoder_config_accepts_450pwb() {
        let cfg = CodecConfig::new(Mode::Mode450Pwb).for_encode(false);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn mode_1300_defaults_to_gray() {
        assert!(CodecConfig::new(Mode::Mode1300).gray());
        assert!(!CodecConfig::new(Mode::Mode3200).gray());
    }
}
