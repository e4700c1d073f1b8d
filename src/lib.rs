//! # codec2: a very-low-bitrate sinusoidal speech codec
//!
//! A pure-Rust implementation of a harmonic-sinusoidal speech codec
//! spanning nine fixed bitrate points, from 3200 down to 450 bit/s.
//! Frames are analysed and resynthesised as a fundamental frequency,
//! a voicing decision, and a set of harmonic amplitudes/phases (§2-3),
//! quantised per mode (§4-5) and packed into a fixed-size bitstream
//! (§6).
//!
//! ## Quick start
//!
//! ```rust
//! use codec2::{CodecConfig, Decoder, Encoder, Mode};
//!
//! let mode = Mode::Mode3200;
//! let mut enc = Encoder::new(CodecConfig::new(mode)).unwrap();
//! let mut dec = Decoder::new(CodecConfig::new(mode)).unwrap();
//!
//! let samples = vec![0i16; enc.samples_per_frame()];
//! let mut bits = vec![0u8; mode.bytes_per_frame()];
//! enc.encode(&mut bits, &samples).unwrap();
//!
//! let mut out = vec![0i16; dec.samples_per_frame()];
//! dec.decode(&mut out, &bits).unwrap();
//! ```
//!
//! ## Error handling
//!
//! Per [`error::CodecError`], only *construction* can fail (an
//! unsupported mode, an encoder requested for a decode-only mode). A
//! validly constructed [`Encoder`]/[`Decoder`] cannot fail at
//! `encode`/`decode` time given a correctly sized buffer; the one
//! exception is [`Decoder::decode_ber`], which validates its
//! `ber_est` hint is in `[0, 1]`.
//!
//! ## Modules
//!
//! - [`types`] / [`consts`]: the [`Mode`] enum, frame geometry
//!   ([`types::C2Const`]), the sinusoidal [`types::Model`].
//! - [`window`] / [`fft`]: analysis/synthesis windows, the shared FFT.
//! - [`nlp`] / [`voicing`] / [`analyser`]: pitch estimation, the MBE
//!   voicing decision, and the per-frame analysis entry point.
//! - [`lpc`] / [`lsp`]: LPC↔LSP conversion and bandwidth expansion.
//! - [`phase`] / [`synth`]: harmonic phase reconstruction, the
//!   post-filter, and OLA synthesis.
//! - [`quantize`]: scalar/delta-scalar/VQ quantisers for Wo, energy,
//!   and LSPs.
//! - [`newamp1`] / [`newamp2`]: the rate-K mel-surface pipelines
//!   behind the 700C and 450/450PWB modes.
//! - [`modes`]: per-mode bitstream layouts.
//! - [`rng`]: the deterministic per-instance LCG used for unvoiced
//!   excitation and post-filter phase randomisation.
//! - [`config`]: the [`CodecConfig`] builder.
//! - [`codec`]: [`Encoder`]/[`Decoder`], tying every module above
//!   together per mode.

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod analyser;
pub mod bits;
pub mod codec;
pub mod config;
pub mod consts;
pub mod error;
pub mod fft;
pub mod lpc;
pub mod lsp;
pub mod modes;
pub mod newamp1;
pub mod newamp2;
pub mod nlp;
pub mod phase;
pub mod quantize;
pub mod rng;
pub mod synth;
pub mod tables;
pub mod types;
pub mod voicing;
pub mod window;

pub use codec::{Decoder, Encoder};
pub use config::{CodecConfig, LpcPostFilter};
pub use error::{CodecError, Result};
pub use types::{C2Const, Mode, Model};

/// Version of this codec library.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialise process-wide logging.
///
/// Call once at program startup. Safe to call more than once; only the
/// first call installs the global subscriber. Per-instance codec state
/// (the LCG, background-noise estimate, predictor history) is owned by
/// each [`Encoder`]/[`Decoder`] and is unaffected by this call.
pub fn init() {
    let _ = tracing_subscriber::fmt::try_init();
    tracing::info!("codec2 v{} initialized", VERSION);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        init();
        init();
    }

    #[test]
    fn quick_start_round_trips_without_panicking() {
        let mode = Mode::Mode3200;
        let mut enc = Encoder::new(CodecConfig::new(mode)).unwrap();
        let mut dec = Decoder::new(CodecConfig::new(mode)).unwrap();

        let samples = vec![0i16; enc.samples_per_frame()];
        let mut bits = vec![0u8; mode.bytes_per_frame()];
        enc.encode(&mut bits, &samples).unwrap();

        let mut out = vec![0i16; dec.samples_per_frame()];
        dec.decode(&mut out, &bits).unwrap();
        assert_eq!(out.len(), samples.len());
    }
}
