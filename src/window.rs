//! Analysis and synthesis window builders.
//!
//! `analysis_window` builds the centred Hamming window used before the
//! pitch/spectral DFT (`make_analysis_window`), plus its own DFT `big_w`
//! used by the voicing-decision projection (§4.3). `synthesis_window`
//! builds the trapezoidal (Parzen-like) overlap-add window
//! (`make_synthesis_window`).

use num_complex::Complex32;

use crate::fft::FftPair;
use crate::types::C2Const;

/// Centred Hamming analysis window of width `m_pitch`, and its DFT of
/// size `FFT_ENC` (`W` in the original), used by the voicing projection.
pub fn analysis_window(c2const: &C2Const, fft: &FftPair) -> (Vec<f32>, Vec<Complex32>) {
    let m = c2const.m_pitch;
    let nw = c2const.nw;
    let mut w = vec![0.0f32; m];

    // Hamming window occupying the centre `nw` samples of the `m`-wide
    // buffer, matching the original's placement before the DFT that
    // forms `W`.
    let start = m / 2 - nw / 2;
    let mut wsum = 0.0f32;
    for i in 0..nw {
        let hamming = 0.5 - 0.5 * ((2.0 * std::f32::consts::PI * i as f32) / (nw as f32 - 1.0)).cos();
        w[start + i] = hamming;
        wsum += hamming * hamming;
    }
    let norm = 1.0 / wsum.sqrt();
    for v in w.iter_mut() {
        *v *= norm;
    }

    // W = DFT(w), zero-padded/centred into FFT_ENC as the original does
    // (shifted so that bin 0 corresponds to the window's centre, giving
    // a zero-phase reference for the harmonic amplitude/phase estimator).
    let mut padded = vec![0.0f32; fft.size()];
    let half = m / 2;
    for i in 0..half {
        padded[i] = w[half + i];
    }
    for i in 0..m - half {
        padded[fft.size() - (m - half) + i] = w[i];
    }
    let big_w = fft.forward_real(&padded);

    (w, big_w)
}

/// Trapezoidal (Parzen-style) synthesis window spanning `2*n_samp`
/// samples: a linear rise over `tw` samples, a flat unity plateau, and a
/// linear fall over `tw` samples.
pub fn synthesis_window(c2const: &C2Const) -> Vec<f32> {
    let n = 2 * c2const.n_samp;
    let tw = c2const.tw.max(1);
    let mut pn = vec![1.0f32; n];
    for i in 0..tw {
        let ramp = (i as f32 + 0.5) / tw as f32;
        pn[i] = ramp;
        pn[n - 1 - i] = ramp;
    }
    pn
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::FFT_ENC;
    use crate::types::Mode;

    #[test]
    fn analysis_window_is_energy_normalized() {
        let c2const = C2Const::for_mode(Mode::Mode3200);
        let fft = FftPair::new(FFT_ENC);
        let (w, big_w) = analysis_window(&c2const, &fft);
        let energy: f32 = w.iter().map(|v| v * v).sum();
        assert!((energy - 1.0).abs() < 1e-3);
        assert_eq!(big_w.len(), FFT_ENC);
    }

    #[test]
    fn synthesis_window_has_unity_plateau() {
        let c2const = C2Const::for_mode(Mode::Mode3200);
        let pn = synthesis_window(&c2const);
        assert_eq!(pn.len(), 160);
        assert!((pn[80] - 1.0).abs() < 1e-6);
        assert!(pn[0] < pn[c2const.tw]);
    }
}
