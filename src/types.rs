//! Core value types: the mode enumeration, frame geometry, and the
//! sinusoidal model record.

use std::f32::consts::PI;

use crate::error::{CodecError, Result};

/// Order of the LPC analysis filter used by every classical (non-newamp)
/// mode.
pub const LPC_ORD: usize = 10;

/// Maximum number of harmonics a [`Model`] can carry.
pub const MAX_AMP: usize = 80;

/// One of the nine standardised bitrate points this codec implements.
///
/// The original implementation dispatches per-mode behaviour through a
/// tagged union of function pointers; per the design notes this crate
/// instead uses a closed enum plus a dispatch `match` (see `codec.rs`),
/// since the set of modes is fixed at compile time and virtual dispatch
/// would hide that from the type system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// 3200 bit/s: scalar Wo/E, delta-scalar LSPs.
    Mode3200,
    /// 2400 bit/s: joint Wo/E VQ, scalar LSPs.
    Mode2400,
    /// 1600 bit/s: scalar Wo/E twice per 40 ms, scalar LSPs.
    Mode1600,
    /// 1400 bit/s: joint Wo/E VQ twice per 40 ms, scalar LSPs.
    Mode1400,
    /// 1300 bit/s: Gray-coded scalar Wo/E once per 40 ms, scalar LSPs.
    Mode1300,
    /// 1200 bit/s: joint Wo/E VQ twice per 40 ms, predictive-VQ LSPs.
    Mode1200,
    /// 700C bit/s: rate-K=20 two-stage VQ ("newamp1").
    Mode700C,
    /// 450 bit/s at 8 kHz: rate-K=29 single-stage VQ ("newamp2").
    Mode450,
    /// 450 bit/s decoded at 16 kHz ("450PWB"). Decode-only, see
    /// [`Mode::supports_encode`].
    Mode450Pwb,
}

impl Mode {
    /// Sample rate this mode operates at.
    pub fn sample_rate(self) -> u32 {
        match self {
            Self::Mode450Pwb => 16000,
            _ => 8000,
        }
    }

    /// Number of 10 ms analysis sub-frames packed into one transmitted
    /// frame.
    pub fn sub_frames(self) -> usize {
        match self {
            Self::Mode3200 | Self::Mode2400 => 2,
            _ => 4,
        }
    }

    /// PCM samples consumed/produced per call to encode/decode.
    pub fn samples_per_frame(self) -> usize {
        let n_samp = (self.sample_rate() as f32 * 0.01).round() as usize;
        n_samp * self.sub_frames()
    }

    /// Bits in one packed frame.
    pub fn bits_per_frame(self) -> usize {
        match self {
            Self::Mode3200 => 64,
            Self::Mode2400 => 48,
            Self::Mode1600 => 64,
            Self::Mode1400 => 56,
            Self::Mode1300 => 52,
            Self::Mode1200 => 48,
            Self::Mode700C => 28,
            Self::Mode450 | Self::Mode450Pwb => 18,
        }
    }

    /// Bytes in one packed frame, padded with zero bits.
    pub fn bytes_per_frame(self) -> usize {
        self.bits_per_frame().div_ceil(8)
    }

    /// Whether this mode may be used to *construct an encoder*. Per the
    /// resolved open question on the 450/450PWB pair, analysing speech at
    /// 16 kHz and packing it as if it were an 8 kHz 450 frame is
    /// undefined, so encoding in `Mode450Pwb` is rejected outright.
    pub fn supports_encode(self) -> bool {
        !matches!(self, Self::Mode450Pwb)
    }

    /// Whether 1300-bit/s-style bit-error-rate soft-mute applies to this
    /// mode's decode path.
    pub fn supports_ber_softmute(self) -> bool {
        matches!(self, Self::Mode1300)
    }

    /// Bit range of the unused "spare" bits in this mode's layout, if any
    /// (see `SPEC_FULL.md` §10.3). 2400 carries two spare bits (bits 46-47
    /// of its 48-bit frame); 1200 carries one (bit 47 of its 48-bit
    /// frame).
    pub fn spare_bit_range(self) -> Option<std::ops::Range<usize>> {
        match self {
            Self::Mode2400 => Some(46..48),
            Self::Mode1200 => Some(47..48),
            _ => None,
        }
    }

    /// Natural-binary or Gray coding of Wo/energy indexes. Gray coding is
    /// only used at 1300 bit/s, so that an isolated bit error lands on an
    /// adjacent codeword rather than a distant one.
    pub fn default_gray(self) -> bool {
        matches!(self, Self::Mode1300)
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Mode3200 => "3200",
            Self::Mode2400 => "2400",
            Self::Mode1600 => "1600",
            Self::Mode1400 => "1400",
            Self::Mode1300 => "1300",
            Self::Mode1200 => "1200",
            Self::Mode700C => "700C",
            Self::Mode450 => "450",
            Self::Mode450Pwb => "450PWB",
        };
        write!(f, "{name}")
    }
}

/// Frame geometry derived from sample rate and sub-frame length, immutable
/// once constructed. Named `C2Const` after the original's `C2CONST`.
#[derive(Debug, Clone, Copy)]
pub struct C2Const {
    /// Sample rate in Hz (8000 or 16000).
    pub fs: u32,
    /// Samples per 10 ms sub-frame.
    pub n_samp: usize,
    /// Width of the analysis window, in samples (covers two pitch
    /// periods at the lowest supported pitch).
    pub m_pitch: usize,
    /// Minimum representable pitch period, in samples.
    pub p_min: usize,
    /// Maximum representable pitch period, in samples.
    pub p_max: usize,
    /// Minimum fundamental angular frequency, `2*pi/p_max`.
    pub wo_min: f32,
    /// Maximum fundamental angular frequency, `2*pi/p_min`.
    pub wo_max: f32,
    /// Analysis window half-width used by the Hamming window builder.
    pub nw: usize,
    /// Trapezoid rise/fall width of the synthesis window, in samples.
    pub tw: usize,
}

impl C2Const {
    /// Derive frame geometry for a sample rate and sub-frame length.
    ///
    /// Test vector (§8 of the specification): `new(8000, 0.01)` yields
    /// `n_samp=80, m_pitch=320, p_min=20, p_max=160, nw=279,
    /// wo_min=2*pi/160`.
    pub fn new(fs: u32, frame_length_s: f32) -> Self {
        let n_samp = (fs as f32 * frame_length_s).round() as usize;
        let m_pitch = (fs as f32 * 0.0400) as usize;
        let (p_min, p_max, nw) = if fs == 16000 {
            (40, 320, 511)
        } else {
            (20, 160, 279)
        };
        let tw = n_samp / 4;
        Self {
            fs,
            n_samp,
            m_pitch,
            p_min,
            p_max,
            wo_min: 2.0 * PI / p_max as f32,
            wo_max: 2.0 * PI / p_min as f32,
            nw,
            tw,
        }
    }

    /// Build the geometry for a given mode.
    pub fn for_mode(mode: Mode) -> Self {
        Self::new(mode.sample_rate(), 0.01)
    }
}

/// One 10 ms frame of sinusoidal model parameters.
///
/// Invariant: `0 < wo < pi`, `1 <= l <= MAX_AMP`, `wo * l as f32 < pi`.
#[derive(Debug, Clone)]
pub struct Model {
    /// Fundamental angular frequency, radians/sample.
    pub wo: f32,
    /// Number of harmonics, `floor(pi / wo)`.
    pub l: usize,
    /// Harmonic magnitudes, `a[0]` is the fundamental. Always
    /// non-negative.
    pub a: Vec<f32>,
    /// Harmonic phases in `(-pi, pi]`.
    pub phi: Vec<f32>,
    /// Voicing decision for this sub-frame.
    pub voiced: bool,
}

impl Model {
    /// Construct a silent, unvoiced model with the given fundamental.
    pub fn new(wo: f32) -> Self {
        let l = Self::harmonics_for(wo);
        Self {
            wo,
            l,
            a: vec![0.0; l + 1],
            phi: vec![0.0; l + 1],
            voiced: false,
        }
    }

    /// Number of harmonics fitting under `pi` for a given fundamental,
    /// clamped to `MAX_AMP`.
    pub fn harmonics_for(wo: f32) -> usize {
        let l = (PI / wo).floor() as usize;
        l.clamp(1, MAX_AMP)
    }

    /// Clamp `wo` into `[wo_min, wo_max]` and recompute `l`, shrinking it
    /// (never growing the amplitude/phase buffers) so that `wo * l < pi`
    /// always holds, per the codec's invariant-violation policy of a
    /// deterministic clamp rather than a fault.
    pub fn clamp_to(&mut self, c2const: &C2Const) {
        self.wo = self.wo.clamp(c2const.wo_min, c2const.wo_max);
        let mut l = Self::harmonics_for(self.wo);
        while self.wo * l as f32 >= PI && l > 1 {
            l -= 1;
        }
        self.l = l;
        self.a.resize(l + 1, 0.0);
        self.phi.resize(l + 1, 0.0);
    }
}

/// Validate that a buffer matches the mode's required size, in samples or
/// bytes as indicated by `expected`.
pub fn check_len(expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(CodecError::InvalidFrameSize { expected, actual });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn c2const_8khz_matches_test_vector() {
        let c = C2Const::new(8000, 0.01);
        assert_eq!(c.n_samp, 80);
        assert_eq!(c.m_pitch, 320);
        assert_eq!(c.p_min, 20);
        assert_eq!(c.p_max, 160);
        assert_eq!(c.nw, 279);
        assert!((c.wo_min - 2.0 * PI / 160.0).abs() < 1e-6);
    }

    #[test]
    fn mode_table_matches_spec() {
        assert_eq!(Mode::Mode3200.bits_per_frame(), 64);
        assert_eq!(Mode::Mode3200.samples_per_frame(), 160);
        assert_eq!(Mode::Mode700C.bits_per_frame(), 28);
        assert_eq!(Mode::Mode700C.samples_per_frame(), 320);
        assert_eq!(Mode::Mode450Pwb.samples_per_frame(), 640);
        assert_eq!(Mode::Mode450Pwb.bits_per_frame(), 18);
    }

    #[test]
    fn nominal_bitrate_matches_mode_name() {
        for (mode, rate) in [
            (Mode::Mode3200, 3200.0),
            (Mode::Mode2400, 2400.0),
            (Mode::Mode1600, 1600.0),
            (Mode::Mode1400, 1400.0),
            (Mode::Mode1300, 1300.0),
            (Mode::Mode1200, 1200.0),
        ] {
            let computed = mode.bits_per_frame() as f32 * mode.sample_rate() as f32
                / mode.samples_per_frame() as f32;
            assert!((computed - rate).abs() < 1e-3, "{mode}: {computed}");
        }
    }

    #[test]
    fn mode_450pwb_rejects_encode() {
        assert!(!Mode::Mode450Pwb.supports_encode());
        assert!(Mode::Mode450.supports_encode());
    }

    #[test]
    fn model_clamp_preserves_invariant() {
        let c2const = C2Const::for_mode(Mode::Mode3200);
        let mut model = Model::new(0.001);
        model.clamp_to(&c2const);
        assert!(model.wo > 0.0 && model.wo < PI);
        assert!(model.wo * model.l as f32 < PI);
    }
}
