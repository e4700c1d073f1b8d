//! Newamp2 (450 / 450PWB): rate-K=29 single-stage VQ pipeline (§4.7).
//!
//! Structurally identical to [`crate::newamp1`] but with a wider rate-K
//! vector, a single VQ stage, and a joint Wo/voicing/plosive index whose
//! top code signals a plosive onset instead of a voicing state.

use std::f32::consts::PI;

use crate::consts::{NEWAMP2_K, NEWAMP2_K_END_HZ, NEWAMP2_K_END_HZ_16K, NEWAMP2_K_ST_HZ, NEWAMP2_WO_BITS};
use crate::newamp1::{interpolate_rate_k, model_to_rate_k as model_to_rate_k_generic, rate_k_to_model as rate_k_to_model_generic};
use crate::tables::{nearest, NEWAMP2_ENERGY_VQ, NEWAMP2_VQ};
use crate::types::{C2Const, Model};

fn hz_to_mel(hz: f32) -> f32 {
    2595.0 * (1.0 + hz / 700.0).log10()
}

fn mel_to_hz(mel: f32) -> f32 {
    700.0 * (10f32.powf(mel / 2595.0) - 1.0)
}

/// The K mel-uniform sample frequencies, widened for 16 kHz (450PWB)
/// decode per §4.7.
pub fn rate_k_sample_freqs_hz(wideband: bool) -> [f32; NEWAMP2_K] {
    let end_hz = if wideband { NEWAMP2_K_END_HZ_16K } else { NEWAMP2_K_END_HZ };
    let mel_st = hz_to_mel(NEWAMP2_K_ST_HZ);
    let mel_end = hz_to_mel(end_hz);
    let mut out = [0.0f32; NEWAMP2_K];
    for (k, slot) in out.iter_mut().enumerate() {
        let mel = mel_st + (mel_end - mel_st) * k as f32 / (NEWAMP2_K as f32 - 1.0);
        *slot = mel_to_hz(mel);
    }
    out
}

/// Resample a sinusoidal model's rate-L envelope onto the rate-K
/// frequencies, in dB. Shares its interpolation with newamp1's K=20
/// variant; only the sample grid differs.
pub fn model_to_rate_k(model: &Model, fs: u32, freqs: &[f32]) -> Vec<f32> {
    model_to_rate_k_generic(model, fs, freqs)
}

/// Resample a rate-K dB envelope back onto `model`'s current harmonics.
pub fn rate_k_to_model(rate_k_vec_db: &[f32], freqs: &[f32], model: &mut Model, fs: u32) {
    rate_k_to_model_generic(rate_k_vec_db, freqs, model, fs)
}

/// Subtract the vector mean, returning `(rate_k_vec_no_mean, mean)`.
pub fn remove_mean(rate_k_vec: &[f32]) -> (Vec<f32>, f32) {
    let mean = rate_k_vec.iter().sum::<f32>() / rate_k_vec.len() as f32;
    (rate_k_vec.iter().map(|v| v - mean).collect(), mean)
}

/// Single-stage 9-bit VQ of the mean-removed rate-K vector.
pub fn encode_vq(rate_k_vec_no_mean: &[f32]) -> u32 {
    nearest(&NEWAMP2_VQ, rate_k_vec_no_mean).0 as u32
}

/// Invert [`encode_vq`].
pub fn decode_vq(index: u32) -> Vec<f32> {
    NEWAMP2_VQ[index as usize % NEWAMP2_VQ.len()].clone()
}

/// 3-bit mean (energy) codebook index.
pub fn encode_mean(mean: f32) -> u32 {
    nearest(&NEWAMP2_ENERGY_VQ, &[mean]).0 as u32
}

/// Invert [`encode_mean`].
pub fn decode_mean(index: u32) -> f32 {
    NEWAMP2_ENERGY_VQ[index as usize % NEWAMP2_ENERGY_VQ.len()][0]
}

/// Joint Wo/voicing/plosive index: 0 = unvoiced, `2^bits - 1` = plosive,
/// everything else log-spaces Wo over the voiced range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WoVoicing {
    Unvoiced,
    Voiced(u32),
    Plosive,
}

const PLOSIVE_INDEX: u32 = (1u32 << NEWAMP2_WO_BITS) - 1;

/// Encode `(wo, voiced, plosive)` into the 6-bit joint index.
pub fn encode_wo_voicing(c2const: &C2Const, wo: f32, voiced: bool, plosive: bool) -> u32 {
    if plosive {
        return PLOSIVE_INDEX;
    }
    if !voiced {
        return 0;
    }
    let levels = PLOSIVE_INDEX - 1;
    let norm = ((wo.max(c2const.wo_min).ln() - c2const.wo_min.ln())
        / (c2const.wo_max.ln() - c2const.wo_min.ln()))
    .clamp(0.0, 1.0);
    (1 + (norm * (levels as f32 - 1.0)).round() as u32).min(levels)
}

/// Invert [`encode_wo_voicing`].
pub fn decode_wo_voicing(c2const: &C2Const, index: u32) -> (f32, WoVoicing) {
    if index == 0 {
        return (c2const.wo_min, WoVoicing::Unvoiced);
    }
    if index == PLOSIVE_INDEX {
        return (c2const.wo_min, WoVoicing::Plosive);
    }
    let levels = PLOSIVE_INDEX - 1;
    let norm = (index - 1) as f32 / (levels as f32 - 1.0);
    let wo = (c2const.wo_min.ln() + norm * (c2const.wo_max.ln() - c2const.wo_min.ln())).exp();
    (wo, WoVoicing::Voiced(index))
}

/// Plosive detector (§4.7): flags a sub-frame whose mean log-magnitude
/// above 300 Hz rises by at least 15 dB over its predecessor, with the
/// predecessor itself below 15 dB, examined over a run of per-sub-frame
/// rate-K vectors (already restricted to bins above 300 Hz by the
/// caller).
pub fn detect_plosive(mean_log_mag_above_300hz: &[f32]) -> Option<usize> {
    for i in 1..mean_log_mag_above_300hz.len() {
        let prev = mean_log_mag_above_300hz[i - 1];
        let cur = mean_log_mag_above_300hz[i];
        if prev < 15.0 && cur - prev >= 15.0 {
            return Some(i);
        }
    }
    None
}

pub use interpolate_rate_k as interpolate;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Mode;

    #[test]
    fn sample_freqs_8khz_and_16khz_differ() {
        let narrow = rate_k_sample_freqs_hz(false);
        let wide = rate_k_sample_freqs_hz(true);
        assert!(wide[NEWAMP2_K - 1] > narrow[NEWAMP2_K - 1]);
    }

    #[test]
    fn vq_round_trip_has_finite_output() {
        let freqs = rate_k_sample_freqs_hz(false);
        let c2const = C2Const::for_mode(Mode::Mode450);
        let mut model = Model::new(2.0 * PI / 80.0);
        for m in 1..=model.l {
            model.a[m] = 100.0 / m as f32;
        }
        let rate_k = model_to_rate_k(&model, c2const.fs, &freqs);
        let (no_mean, mean) = remove_mean(&rate_k);
        let idx = encode_vq(&no_mean);
        let decoded: Vec<f32> = decode_vq(idx).iter().map(|v| v + mean).collect();
        for v in decoded {
            assert!(v.is_finite());
        }
    }

    #[test]
    fn wo_voicing_plosive_is_distinct_from_unvoiced() {
        let c2const = C2Const::for_mode(Mode::Mode450);
        let plosive_idx = encode_wo_voicing(&c2const, c2const.wo_min, false, true);
        assert_eq!(plosive_idx, PLOSIVE_INDEX);
        let (_, state) = decode_wo_voicing(&c2const, plosive_idx);
        assert_eq!(state, WoVoicing::Plosive);

        let uv_idx = encode_wo_voicing(&c2const, c2const.wo_min, false, false);
        assert_eq!(uv_idx, 0);
    }

    #[test]
    fn plosive_detector_finds_onset() {
        let trace = [5.0, 6.0, 25.0, 24.0];
        assert_eq!(detect_plosive(&trace), Some(2));
        let flat = [10.0, 11.0, 12.0];
        assert_eq!(detect_plosive(&flat), None);
    }
}
