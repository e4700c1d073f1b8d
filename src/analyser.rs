//! Sinusoidal analyser: turns a windowed speech frame into a [`Model`].

use num_complex::Complex32;

use crate::fft::FftPair;
use crate::nlp::{coarse_pitch, two_stage_pitch_refinement};
use crate::types::{C2Const, Model};
use crate::voicing::est_voicing_mbe;

/// Window `sn` with `w` and compute its `FFT_ENC`-point spectrum `Sw`.
pub fn dft_speech(sn: &[f32], w: &[f32], fft: &FftPair) -> Vec<Complex32> {
    let windowed: Vec<f32> = sn.iter().zip(w.iter()).map(|(s, wv)| s * wv).collect();
    fft.forward_real(&windowed)
}

/// Estimate harmonic magnitudes `A[1..=L]` from the frame spectrum: each
/// harmonic's amplitude is the square root of the energy summed over its
/// bin range `[am, bm)`.
pub fn estimate_amplitudes(model: &mut Model, sw: &[Complex32], fft_size: usize) {
    for m in 1..=model.l {
        let centre = m as f32 - 0.5;
        let am = ((centre * model.wo * fft_size as f32 / (2.0 * std::f32::consts::PI)) + 0.5)
            .floor() as isize;
        let centre_hi = m as f32 + 0.5;
        let bm = ((centre_hi * model.wo * fft_size as f32 / (2.0 * std::f32::consts::PI)) + 0.5)
            .floor() as isize;
        let am = am.max(0) as usize;
        let bm = (bm.max(am as isize + 1) as usize).min(fft_size / 2);
        let mut energy = 0.0f32;
        for bin in am..bm {
            if let Some(c) = sw.get(bin) {
                energy += c.norm_sqr();
            }
        }
        model.a[m] = energy.sqrt();
    }
}

/// Estimate harmonic phases as the argument of the nearest spectral bin,
/// used only when the caller wants a phase without full LPC phase
/// synthesis (§4.2's "optionally estimates phi[m]").
pub fn estimate_phases(model: &mut Model, sw: &[Complex32], fft_size: usize) {
    for m in 1..=model.l {
        let bin = (m as f32 * model.wo * fft_size as f32 / (2.0 * std::f32::consts::PI)).round()
            as usize;
        model.phi[m] = sw.get(bin.min(fft_size / 2)).map_or(0.0, |c| c.arg());
    }
}

/// Analyse one 10 ms sub-frame: `sn` is the `m_pitch`-sample sliding
/// analysis buffer after the newest `n_samp` samples have been shifted
/// in.
pub fn analyse_one_frame(
    c2const: &C2Const,
    sn: &[f32],
    w: &[f32],
    big_w: &[Complex32],
    fft: &FftPair,
) -> Model {
    let sw = dft_speech(sn, w, fft);

    let pitch = coarse_pitch(c2const, sn) as f32;
    let wo = two_stage_pitch_refinement(c2const, pitch, &sw, fft.size());

    let mut model = Model::new(wo);
    model.clamp_to(c2const);
    estimate_amplitudes(&mut model, &sw, fft.size());
    model.voiced = est_voicing_mbe(c2const, &model, &sw, big_w, fft.size());
    model
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::FFT_ENC;
    use crate::types::Mode;
    use crate::window::analysis_window;

    #[test]
    fn analyse_one_frame_satisfies_model_invariants() {
        let c2const = C2Const::for_mode(Mode::Mode3200);
        let fft = FftPair::new(FFT_ENC);
        let (w, big_w) = analysis_window(&c2const, &fft);

        let period = 80.0f32;
        let sn: Vec<f32> = (0..c2const.m_pitch)
            .map(|i| (std::f32::consts::TAU * i as f32 / period).sin() * 1000.0)
            .collect();

        let model = analyse_one_frame(&c2const, &sn, &w, &big_w, &fft);
        assert!(model.wo > 0.0 && model.wo < std::f32::consts::PI);
        assert!(model.l >= 1 && model.l <= crate::types::MAX_AMP);
        assert!(model.wo * model.l as f32 < std::f32::consts::PI);
        for &a in &model.a {
            assert!(a >= 0.0);
        }
        for &phi in &model.phi {
            assert!(phi.abs() <= std::f32::consts::PI);
        }
    }
}
