//! Phase synthesis: LPC-derived harmonic phase, zero-order excitation
//! phase tracking, and the background-noise-aware post-filter (§4.8).

use num_complex::Complex32;
use std::f32::consts::PI;

use crate::config::LpcPostFilter;
use crate::consts::{BG_BETA, BG_MARGIN, BG_THRESH};
use crate::fft::FftPair;
use crate::rng::Lcg;
use crate::types::Model;

/// FFT the LPC numerator `[1, a[0], .., a[LPC_ORD-1]]` (zero-padded) to
/// get the filter's frequency response, used by [`sample_phase`].
pub fn lpc_spectrum(a: &[f32], fft: &FftPair) -> Vec<Complex32> {
    let mut numerator = vec![1.0f32];
    numerator.extend_from_slice(a);
    fft.forward_real(&numerator)
}

/// Sample the LPC filter's phase response at each harmonic: `H[m]` is
/// the complex conjugate of `Aw` at the bin nearest `m * Wo`.
pub fn sample_phase(model: &Model, aw: &[Complex32], fft_size: usize) -> Vec<Complex32> {
    let mut h = vec![Complex32::new(0.0, 0.0); model.l + 1];
    for m in 1..=model.l {
        let bin = (m as f32 * model.wo * fft_size as f32 / (2.0 * PI)).round() as usize;
        h[m] = aw.get(bin.min(fft_size / 2)).copied().unwrap_or_default().conj();
    }
    h
}

/// Advance the excitation phase accumulator and derive `phi[1..=L]` from
/// the harmonic phase response `h` and the voicing decision.
pub fn phase_synth_zero_order(
    model: &mut Model,
    ex_phase: &mut f32,
    h: &[Complex32],
    n_samp: usize,
    rng: &mut Lcg,
) {
    *ex_phase += model.wo * n_samp as f32;
    *ex_phase = ex_phase.rem_euclid(2.0 * PI);
    if *ex_phase > PI {
        *ex_phase -= 2.0 * PI;
    }

    for m in 1..=model.l {
        let ex = if model.voiced {
            Complex32::from_polar(1.0, m as f32 * *ex_phase)
        } else {
            Complex32::from_polar(1.0, rng.uniform_phase())
        };
        let hm = h.get(m).copied().unwrap_or(Complex32::new(1.0, 0.0));
        model.phi[m] = (hm * ex).arg();
    }
}

/// Background-noise-tracking phase randomiser. Maintains `bg_est` (dB)
/// as an IIR average of frame log-energy while frames are unvoiced and
/// below `BG_THRESH`; for voiced frames, randomises `phi[m]` for any
/// harmonic whose amplitude falls below the resulting noise threshold.
pub fn postfilter(model: &mut Model, bg_est: &mut f32, rng: &mut Lcg) {
    let energy_db = 10.0
        * (model
            .a
            .iter()
            .map(|a| a * a)
            .sum::<f32>()
            .max(1e-9))
        .log10();

    if !model.voiced && energy_db < BG_THRESH {
        *bg_est = *bg_est * (1.0 - BG_BETA) + energy_db * BG_BETA;
    }

    if model.voiced {
        let threshold = 10f32.powf((*bg_est + BG_MARGIN) / 20.0);
        for m in 1..=model.l {
            if model.a[m] < threshold {
                model.phi[m] = rng.uniform_phase();
                if model.phi[m] > PI {
                    model.phi[m] -= 2.0 * PI;
                }
            }
        }
    }
}

/// `aks_to_M2`: evaluate the LPC synthesis filter's magnitude at each
/// harmonic from the numerator spectrum `aw` (see [`lpc_spectrum`]),
/// scale so the harmonic energy matches `e`, and optionally sharpen
/// formants with the LPC post-filter (§4.4).
pub fn aks_to_amplitudes(model: &mut Model, aw: &[Complex32], e: f32, fft_size: usize, post: &LpcPostFilter) {
    let mut raw = vec![0.0f32; model.l + 1];
    let mut sum_sq = 0.0f32;
    for m in 1..=model.l {
        let bin = (m as f32 * model.wo * fft_size as f32 / (2.0 * PI)).round() as usize;
        let mag_a = aw.get(bin.min(fft_size / 2)).map_or(1.0, |c| c.norm()).max(1e-6);
        let mag_h = 1.0 / mag_a;
        raw[m] = mag_h;
        sum_sq += mag_h * mag_h;
    }
    let scale = (e / sum_sq.max(1e-9)).sqrt();
    for m in 1..=model.l {
        model.a[m] = raw[m] * scale;
    }
    if post.enable {
        apply_lpc_post_filter(model, post);
    }
}

/// Sharpen formant peaks in the magnitude domain and optionally boost
/// the lowest quarter of harmonics ("bass boost"), an approximation of
/// the original's `H(z/gamma)/H(z/beta)` post-filter that operates
/// directly on the already-sampled harmonic amplitudes rather than
/// re-evaluating the LPC filter at warped poles.
fn apply_lpc_post_filter(model: &mut Model, post: &LpcPostFilter) {
    if model.l == 0 {
        return;
    }
    let mean: f32 = model.a[1..=model.l].iter().sum::<f32>() / model.l as f32;
    let sharpen = 1.0 + (post.beta - post.gamma).abs();
    for m in 1..=model.l {
        let ratio = (model.a[m] / mean.max(1e-6)).max(1e-6);
        model.a[m] = mean * ratio.powf(sharpen);
    }
    if post.bass_boost {
        for m in 1..=(model.l / 4).max(1) {
            model.a[m] *= 1.15;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::FFT_ENC;

    #[test]
    fn phase_accumulator_stays_bounded() {
        let fft = FftPair::new(FFT_ENC);
        let a = vec![0.0f32; 10];
        let aw = lpc_spectrum(&a, &fft);
        let mut model = Model::new(std::f32::consts::TAU / 80.0);
        model.voiced = true;
        model.a = vec![1.0; model.l + 1];
        let mut ex_phase = 0.0f32;
        let mut rng = Lcg::new();
        let h = sample_phase(&model, &aw, fft.size());
        for _ in 0..1000 {
            phase_synth_zero_order(&mut model, &mut ex_phase, &h, 80, &mut rng);
            assert!(ex_phase.abs() <= PI + 1e-3);
        }
    }

    #[test]
    fn aks_to_amplitudes_matches_target_energy() {
        let fft = FftPair::new(FFT_ENC);
        let a = vec![-0.3, 0.1, 0.05, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0];
        let aw = lpc_spectrum(&a, &fft);
        let mut model = Model::new(std::f32::consts::TAU / 80.0);
        let post = crate::config::LpcPostFilter { enable: false, bass_boost: false, beta: 0.2, gamma: 0.5 };
        aks_to_amplitudes(&mut model, &aw, 1000.0, fft.size(), &post);
        for m in 1..=model.l {
            assert!(model.a[m] >= 0.0 && model.a[m].is_finite());
        }
    }

    #[test]
    fn postfilter_randomises_weak_harmonics_only() {
        let mut model = Model::new(std::f32::consts::TAU / 80.0);
        model.voiced = true;
        model.a = vec![0.0; model.l + 1];
        model.a[1] = 1000.0; // strong
        for m in 2..=model.l {
            model.a[m] = 0.001; // weak
        }
        let before_strong = model.phi[1];
        let mut bg_est = 0.0;
        let mut rng = Lcg::new();
        postfilter(&mut model, &mut bg_est, &mut rng);
        assert_eq!(model.phi[1], before_strong);
    }
}
