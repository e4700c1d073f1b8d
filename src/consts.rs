//! Bit-width and table-size constants shared across quantisers.
//!
//! These mirror the `#define`s of the original implementation's
//! `defines.h`/`quantise.h`, kept here as a single place so per-mode
//! modules don't redeclare magic numbers.

/// Bits used to scalar-code Wo on its own (modes 3200, 1600).
pub const WO_BITS: u32 = 7;
/// Bits used to scalar-code energy on its own (modes 3200, 1600).
pub const E_BITS: u32 = 5;
/// Bits used to jointly VQ-code (Wo, energy) (modes 2400, 1400, 1200).
pub const WO_E_BITS: u32 = 8;
/// Size of the joint Wo/energy codebook, `2^WO_E_BITS`.
pub const WO_E_LEVELS: usize = 1 << WO_E_BITS;

/// Per-LSP-index scalar quantiser bit widths, summing to 36 (used by
/// 2400/1600/1400/1300).
pub const LSP_SCALAR_BITS: [u32; crate::types::LPC_ORD] = [4, 4, 4, 4, 4, 4, 4, 3, 3, 2];
/// Per-LSP-index delta-scalar quantiser bit widths, summing to 50 (used
/// by 3200).
pub const LSPD_SCALAR_BITS: [u32; crate::types::LPC_ORD] = [5, 5, 5, 5, 5, 5, 5, 5, 5, 5];

/// Bits in the first (coarse) stage of the two-stage predictive LSP VQ
/// used by 1200 bit/s (`LSP_VQ_STAGE0_BITS + LSP_VQ_STAGE1_BITS == 27`,
/// matching its bit-layout total in §6).
pub const LSP_VQ_STAGE0_BITS: u32 = 13;
/// Bits in the second (residual) stage of the same quantiser.
pub const LSP_VQ_STAGE1_BITS: u32 = 14;

/// Rate-K vector length for newamp1 (700C).
pub const NEWAMP1_K: usize = 20;
/// Lowest mel-mapped frequency sampled by newamp1, Hz.
pub const NEWAMP1_K_ST_HZ: f32 = 200.0;
/// Highest mel-mapped frequency sampled by newamp1, Hz.
pub const NEWAMP1_K_END_HZ: f32 = 3700.0;
/// FFT size used by newamp1's minimum-phase reconstruction.
pub const NEWAMP1_PHASE_NFFT: usize = 128;
/// Bits in each of newamp1's two VQ stages.
pub const NEWAMP1_VQ_STAGE_BITS: u32 = 9;
/// Bits in newamp1's joint mean/energy index.
pub const NEWAMP1_ENERGY_BITS: u32 = 4;
/// Bits in newamp1's joint Wo/voicing index (0 = unvoiced).
pub const NEWAMP1_WO_BITS: u32 = 6;

/// Rate-K vector length for newamp2 (450) at 8 kHz.
pub const NEWAMP2_K: usize = 29;
/// Rate-K vector length for newamp2 (450PWB) at 16 kHz.
pub const NEWAMP2_K_16K: usize = 29;
/// Lowest mel-mapped frequency sampled by newamp2, Hz.
pub const NEWAMP2_K_ST_HZ: f32 = 200.0;
/// Highest mel-mapped frequency sampled by newamp2 at 8 kHz, Hz.
pub const NEWAMP2_K_END_HZ: f32 = 3700.0;
/// Highest mel-mapped frequency sampled by newamp2 at 16 kHz, Hz.
pub const NEWAMP2_K_END_HZ_16K: f32 = 7600.0;
/// Bits in newamp2's single VQ stage.
pub const NEWAMP2_VQ_STAGE_BITS: u32 = 9;
/// Bits in newamp2's energy index.
pub const NEWAMP2_ENERGY_BITS: u32 = 3;
/// Bits in newamp2's joint Wo/voicing/plosive index. 0 = unvoiced,
/// `2^bits - 1` = plosive.
pub const NEWAMP2_WO_BITS: u32 = 6;

/// Voicing SNR threshold, dB (§4.3).
pub const V_THRESH: f32 = 6.0;
/// Background-noise-estimator threshold, dB (§4.8 `postfilter`).
pub const BG_THRESH: f32 = 40.0;
/// Background-noise-estimator IIR leak coefficient (§4.8 `postfilter`).
pub const BG_BETA: f32 = 0.1;
/// Background-noise-estimator margin above the estimate, dB (§4.8
/// `postfilter`).
pub const BG_MARGIN: f32 = 6.0;

/// Equaliser leak coefficient for the 700C long-term mean-subtraction
/// equaliser (`SPEC_FULL.md` §4.6.1 — a resolved open question, not a
/// transcription of unseen reference code).
pub const EQ_MEAN_LEAK: f32 = 0.025;

/// Bit-error-rate threshold above which 1300 bit/s decode soft-mutes
/// (§7).
pub const BER_SOFTMUTE_THRESH: f32 = 0.15;
/// LSP bandwidth expansion applied on both sides, Hz, during soft-mute.
pub const BER_SOFTMUTE_BW_EXPAND_HZ: f32 = 200.0;

/// Forward encoder analysis FFT size.
pub const FFT_ENC: usize = 512;
/// Inverse decoder synthesis FFT size.
pub const FFT_DEC: usize = 512;

/// `CODEC2_RAND_MAX`: the LCG's output range is `[0, CODEC2_RAND_MAX]`.
pub const CODEC2_RAND_MAX: i32 = 32767;
