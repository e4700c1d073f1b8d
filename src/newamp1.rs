//! Newamp1 (700C): rate-K=20 mel-spaced amplitude VQ pipeline (§4.6).
//!
//! Replaces per-harmonic (rate-L) scalar/VQ quantisation with a single
//! fixed-length (rate-K) spectral envelope sampled on a mel-uniform grid,
//! VQ'd in two stages, and linearly interpolated across the M=4
//! sub-frames of a 40 ms packed frame.

use std::f32::consts::PI;

use num_complex::Complex32;

use crate::consts::{
    EQ_MEAN_LEAK, NEWAMP1_K, NEWAMP1_K_END_HZ, NEWAMP1_K_ST_HZ, NEWAMP1_WO_BITS,
};
use crate::fft::FftPair;
use crate::tables::{nearest, NEWAMP1_ENERGY_VQ, NEWAMP1_VQ_STAGE0, NEWAMP1_VQ_STAGE1};
use crate::types::{C2Const, Model};

fn hz_to_mel(hz: f32) -> f32 {
    2595.0 * (1.0 + hz / 700.0).log10()
}

fn mel_to_hz(mel: f32) -> f32 {
    700.0 * (10f32.powf(mel / 2595.0) - 1.0)
}

/// The K mel-uniform sample frequencies between `NEWAMP1_K_ST_HZ` and
/// `NEWAMP1_K_END_HZ`.
pub fn rate_k_sample_freqs_hz() -> [f32; NEWAMP1_K] {
    let mel_st = hz_to_mel(NEWAMP1_K_ST_HZ);
    let mel_end = hz_to_mel(NEWAMP1_K_END_HZ);
    let mut out = [0.0f32; NEWAMP1_K];
    for (k, slot) in out.iter_mut().enumerate() {
        let mel = mel_st + (mel_end - mel_st) * k as f32 / (NEWAMP1_K as f32 - 1.0);
        *slot = mel_to_hz(mel);
    }
    out
}

fn interp_at(freqs: &[f32], values: &[f32], f: f32) -> f32 {
    if f <= freqs[0] {
        return values[0];
    }
    if f >= *freqs.last().unwrap() {
        return *values.last().unwrap();
    }
    let mut i = 0;
    while i + 1 < freqs.len() && freqs[i + 1] < f {
        i += 1;
    }
    let t = (f - freqs[i]) / (freqs[i + 1] - freqs[i]);
    values[i] + t * (values[i + 1] - values[i])
}

/// Resample a sinusoidal model's rate-L log-magnitude envelope onto the
/// rate-K frequencies, in dB.
pub fn model_to_rate_k(model: &Model, fs: u32, freqs: &[f32]) -> Vec<f32> {
    if model.l == 0 {
        return vec![-40.0; freqs.len()];
    }
    let harmonic_hz: Vec<f32> = (1..=model.l)
        .map(|m| m as f32 * model.wo * fs as f32 / (2.0 * PI))
        .collect();
    let harmonic_db: Vec<f32> = (1..=model.l)
        .map(|m| 20.0 * model.a.get(m).copied().unwrap_or(1e-6).max(1e-6).log10())
        .collect();
    freqs.iter().map(|&f| interp_at(&harmonic_hz, &harmonic_db, f)).collect()
}

/// Resample a rate-K dB envelope back onto `model`'s current harmonics.
pub fn rate_k_to_model(rate_k_vec_db: &[f32], freqs: &[f32], model: &mut Model, fs: u32) {
    for m in 1..=model.l {
        let f = m as f32 * model.wo * fs as f32 / (2.0 * PI);
        let db = interp_at(freqs, rate_k_vec_db, f);
        model.a[m] = 10f32.powf(db / 20.0);
    }
}

/// Subtract the vector mean, returning `(rate_k_vec_no_mean, mean)`.
pub fn remove_mean(rate_k_vec: &[f32]) -> (Vec<f32>, f32) {
    let mean = rate_k_vec.iter().sum::<f32>() / rate_k_vec.len() as f32;
    (rate_k_vec.iter().map(|v| v - mean).collect(), mean)
}

/// Long-term mean-subtraction equaliser (§4.6.1), off by default.
#[derive(Debug, Clone)]
pub struct Equalizer {
    eq: [f32; NEWAMP1_K],
    pub enabled: bool,
}

impl Default for Equalizer {
    fn default() -> Self {
        Self { eq: [0.0; NEWAMP1_K], enabled: false }
    }
}

impl Equalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply the leaky-mean equaliser in place, updating its state
    /// regardless of whether it is currently enabled (so toggling it on
    /// mid-stream starts from a warmed-up estimate).
    pub fn apply(&mut self, rate_k_vec_no_mean: &mut [f32]) {
        for (k, v) in rate_k_vec_no_mean.iter_mut().enumerate() {
            self.eq[k] += EQ_MEAN_LEAK * (*v - self.eq[k]);
            if self.enabled {
                *v -= self.eq[k];
            }
        }
    }
}

/// Two-stage VQ of the mean-removed rate-K vector.
pub fn encode_vq(rate_k_vec_no_mean: &[f32]) -> (u32, u32) {
    let (i0, _) = nearest(&NEWAMP1_VQ_STAGE0, rate_k_vec_no_mean);
    let residual: Vec<f32> = rate_k_vec_no_mean
        .iter()
        .zip(NEWAMP1_VQ_STAGE0[i0].iter())
        .map(|(v, c)| v - c)
        .collect();
    let (i1, _) = nearest(&NEWAMP1_VQ_STAGE1, &residual);
    (i0 as u32, i1 as u32)
}

/// Invert [`encode_vq`].
pub fn decode_vq(i0: u32, i1: u32) -> Vec<f32> {
    let s0 = &NEWAMP1_VQ_STAGE0[i0 as usize % NEWAMP1_VQ_STAGE0.len()];
    let s1 = &NEWAMP1_VQ_STAGE1[i1 as usize % NEWAMP1_VQ_STAGE1.len()];
    s0.iter().zip(s1.iter()).map(|(a, b)| a + b).collect()
}

/// 4-bit mean (energy) codebook index.
pub fn encode_mean(mean: f32) -> u32 {
    nearest(&NEWAMP1_ENERGY_VQ, &[mean]).0 as u32
}

/// Invert [`encode_mean`].
pub fn decode_mean(index: u32) -> f32 {
    NEWAMP1_ENERGY_VQ[index as usize % NEWAMP1_ENERGY_VQ.len()][0]
}

/// 6-bit joint Wo/voicing index: 0 means unvoiced, 1..63 log-spaces Wo.
pub fn encode_wo_voicing(c2const: &C2Const, wo: f32, voiced: bool) -> u32 {
    if !voiced {
        return 0;
    }
    let levels = (1u32 << NEWAMP1_WO_BITS) - 1;
    let norm = ((wo.max(c2const.wo_min).ln() - c2const.wo_min.ln())
        / (c2const.wo_max.ln() - c2const.wo_min.ln()))
    .clamp(0.0, 1.0);
    1 + (norm * (levels as f32 - 1.0)).round() as u32
}

/// Invert [`encode_wo_voicing`].
pub fn decode_wo_voicing(c2const: &C2Const, index: u32) -> (f32, bool) {
    if index == 0 {
        return (c2const.wo_min, false);
    }
    let levels = (1u32 << NEWAMP1_WO_BITS) - 1;
    let norm = (index - 1) as f32 / (levels as f32 - 1.0);
    let wo = (c2const.wo_min.ln() + norm * (c2const.wo_max.ln() - c2const.wo_min.ln())).exp();
    (wo, true)
}

/// Linearly interpolate two rate-K vectors at `frac` in `[0, 1]`.
pub fn interpolate_rate_k(prev: &[f32], cur: &[f32], frac: f32) -> Vec<f32> {
    prev.iter().zip(cur.iter()).map(|(p, c)| p + (c - p) * frac).collect()
}

/// Interpolate Wo/voicing across a sub-frame boundary (§4.6 decode).
pub fn interpolate_wo_voicing(
    c2const: &C2Const,
    left: (f32, bool),
    right: (f32, bool),
    frac: f32,
) -> (f32, bool) {
    match (left.1, right.1) {
        (true, true) => ((left.0.ln() + (right.0.ln() - left.0.ln()) * frac).exp(), true),
        (true, false) => {
            if frac < 0.5 {
                (left.0, true)
            } else {
                (c2const.wo_min, false)
            }
        }
        (false, true) => {
            if frac >= 0.5 {
                (right.0, true)
            } else {
                (c2const.wo_min, false)
            }
        }
        (false, false) => (c2const.wo_min, false),
    }
}

/// Raise formant peaks on the rate-K surface by a fixed power law before
/// phase synthesis (the optional newamp1 post-filter, §4.6).
pub fn postfilter_rate_k(rate_k_vec_db: &mut [f32], gain: f32) {
    let mean = rate_k_vec_db.iter().sum::<f32>() / rate_k_vec_db.len() as f32;
    for v in rate_k_vec_db.iter_mut() {
        *v = mean + (*v - mean) * gain;
    }
}

/// Minimum-phase harmonic response via a real cepstrum built from the
/// rate-K log-magnitude envelope: log-magnitude → complex cepstrum →
/// fold to minimum phase → exponentiate → sample at each harmonic.
pub fn minimum_phase_response(
    rate_k_vec_db: &[f32],
    freqs: &[f32],
    model: &Model,
    fs: u32,
    fft: &FftPair,
) -> Vec<Complex32> {
    let n = fft.size();
    let mut log_mag = vec![0.0f32; n];
    for (bin, slot) in log_mag.iter_mut().enumerate().take(n / 2 + 1) {
        let f = bin as f32 * fs as f32 / n as f32;
        let db = interp_at(freqs, rate_k_vec_db, f);
        *slot = db * std::f32::consts::LN_10 / 20.0;
    }
    for bin in (n / 2 + 1)..n {
        log_mag[bin] = log_mag[n - bin];
    }

    let spectrum: Vec<Complex32> = log_mag.iter().map(|&v| Complex32::new(v, 0.0)).collect();
    let cepstrum = fft.inverse_normalized(&spectrum);

    let mut mp_cepstrum = vec![Complex32::new(0.0, 0.0); n];
    mp_cepstrum[0] = cepstrum[0];
    for c in mp_cepstrum.iter_mut().take(n / 2).skip(1) {
        *c = Complex32::new(0.0, 0.0);
    }
    for i in 1..n / 2 {
        mp_cepstrum[i] = cepstrum[i] * 2.0;
    }
    mp_cepstrum[n / 2] = cepstrum[n / 2];

    let real_cep: Vec<f32> = mp_cepstrum.iter().map(|c| c.re).collect();
    let log_h = fft.forward_real(&real_cep);
    let h: Vec<Complex32> = log_h.iter().map(|c| c.exp()).collect();

    (1..=model.l)
        .map(|m| {
            let f = m as f32 * model.wo * fs as f32 / (2.0 * PI);
            let bin = ((f / fs as f32) * n as f32).round() as usize;
            h.get(bin.min(n / 2)).copied().unwrap_or(Complex32::new(1.0, 0.0))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::NEWAMP1_PHASE_NFFT;
    use crate::types::Mode;

    #[test]
    fn sample_freqs_span_expected_range() {
        let freqs = rate_k_sample_freqs_hz();
        assert_eq!(freqs.len(), NEWAMP1_K);
        assert!((freqs[0] - NEWAMP1_K_ST_HZ).abs() < 1.0);
        assert!((freqs[NEWAMP1_K - 1] - NEWAMP1_K_END_HZ).abs() < 1.0);
        for w in freqs.windows(2) {
            assert!(w[1] > w[0]);
        }
    }

    #[test]
    fn vq_round_trip_has_finite_output() {
        let freqs = rate_k_sample_freqs_hz();
        let c2const = C2Const::for_mode(Mode::Mode700C);
        let mut model = Model::new(2.0 * PI / 80.0);
        for m in 1..=model.l {
            model.a[m] = 100.0 / m as f32;
        }
        let rate_k = model_to_rate_k(&model, c2const.fs, &freqs);
        let (no_mean, mean) = remove_mean(&rate_k);
        let (i0, i1) = encode_vq(&no_mean);
        let decoded_no_mean = decode_vq(i0, i1);
        let decoded: Vec<f32> = decoded_no_mean.iter().map(|v| v + mean).collect();
        for v in decoded {
            assert!(v.is_finite());
        }
    }

    #[test]
    fn wo_voicing_round_trip() {
        let c2const = C2Const::for_mode(Mode::Mode700C);
        let wo = 2.0 * PI / 100.0;
        let idx = encode_wo_voicing(&c2const, wo, true);
        assert!(idx >= 1);
        let (back, voiced) = decode_wo_voicing(&c2const, idx);
        assert!(voiced);
        assert!((back - wo).abs() / wo < 0.1);

        let idx_uv = encode_wo_voicing(&c2const, wo, false);
        assert_eq!(idx_uv, 0);
        assert!(!decode_wo_voicing(&c2const, idx_uv).1);
    }

    #[test]
    fn minimum_phase_response_is_finite() {
        let freqs = rate_k_sample_freqs_hz();
        let c2const = C2Const::for_mode(Mode::Mode700C);
        let mut model = Model::new(2.0 * PI / 80.0);
        for m in 1..=model.l {
            model.a[m] = 100.0 / m as f32;
        }
        let rate_k = model_to_rate_k(&model, c2const.fs, &freqs);
        let fft = FftPair::new(NEWAMP1_PHASE_NFFT);
        let h = minimum_phase_response(&rate_k, &freqs, &model, c2const.fs, &fft);
        for c in h {
            assert!(c.re.is_finite() && c.im.is_finite());
        }
    }
}
