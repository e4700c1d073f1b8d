//! Harmonic synthesis, overlap-add, and the ear-protection limiter
//! (§4.9).

use num_complex::Complex32;

use crate::fft::FftPair;
use crate::types::Model;

/// Build the harmonic line spectrum, inverse-FFT it, and overlap-add the
/// result into the running synthesis buffer `sn_` (length `2*n_samp`,
/// the most recent `n_samp` samples are the usable output of this call).
///
/// `pn` is the Parzen-style synthesis window from [`crate::window`].
pub fn synthesise(model: &Model, sn_: &mut [f32], pn: &[f32], n_samp: usize, fft: &FftPair) {
    let fft_size = fft.size();
    let mut sw_ = vec![Complex32::new(0.0, 0.0); fft_size];
    for l in 1..=model.l {
        let bin = (l as f32 * model.wo * fft_size as f32 / (2.0 * std::f32::consts::PI)).round()
            as usize;
        let bin = bin.min(fft_size / 2 - 1);
        sw_[bin] = Complex32::from_polar(model.a[l], model.phi[l]);
        // Mirror into the upper half so the inverse transform is real.
        if bin > 0 && fft_size - bin < fft_size {
            sw_[fft_size - bin] = sw_[bin].conj();
        }
    }

    let sw_time = fft.inverse_normalized(&sw_);

    // Shift the buffer left by n_samp, making room for the new frame at
    // the tail.
    sn_.copy_within(n_samp.., 0);
    for v in sn_.iter_mut().skip(sn_.len() - n_samp) {
        *v = 0.0;
    }

    for i in 0..n_samp.min(sw_time.len()) {
        let sample = sw_time[i].re * pn.get(n_samp + i).copied().unwrap_or(1.0);
        if let Some(slot) = sn_.get_mut(n_samp + i) {
            *slot += sample;
        }
    }
}

/// Convert the synthesis tail's leading `n_samp` samples to clipped
/// `i16` PCM.
pub fn to_pcm(sn_: &[f32], n_samp: usize) -> Vec<i16> {
    sn_[..n_samp]
        .iter()
        .map(|&s| s.clamp(i16::MIN as f32, i16::MAX as f32) as i16)
        .collect()
}

/// Attenuate loud bursts (typical of undetected bit errors) more than
/// proportionally: if the frame's peak sample exceeds 30000, scale the
/// whole frame by `1 / (peak/30000)^2`.
pub fn ear_protection(samples: &mut [f32]) {
    let peak = samples.iter().fold(0.0f32, |m, &v| m.max(v));
    if peak > 30000.0 {
        let ratio = peak / 30000.0;
        let scale = 1.0 / (ratio * ratio);
        for s in samples.iter_mut() {
            *s *= scale;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::FFT_DEC;

    #[test]
    fn ear_protection_is_idempotent_below_threshold() {
        let mut samples = vec![1000.0, -2000.0, 29999.0, 0.0];
        let before = samples.clone();
        ear_protection(&mut samples);
        assert_eq!(samples, before);
    }

    #[test]
    fn ear_protection_attenuates_loud_peak() {
        let mut samples = vec![60000.0, 10000.0];
        ear_protection(&mut samples);
        assert!(samples[0] < 60000.0);
    }

    #[test]
    fn synthesise_produces_finite_output() {
        let fft = FftPair::new(FFT_DEC);
        let mut model = Model::new(std::f32::consts::TAU / 80.0);
        model.voiced = true;
        for l in 1..=model.l {
            model.a[l] = 100.0 / l as f32;
        }
        let n_samp = 80;
        let mut sn_ = vec![0.0f32; 2 * n_samp];
        let pn = vec![1.0f32; 2 * n_samp];
        synthesise(&model, &mut sn_, &pn, n_samp, &fft);
        for v in &sn_ {
            assert!(v.is_finite());
        }
    }
}
