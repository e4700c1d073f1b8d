//! Thin facade over `rustfft`'s complex FFT, sized for the fixed
//! transform lengths the analyser and synthesiser use.
//!
//! The codec never needs a dynamically-sized transform: analysis is
//! always `FFT_ENC`, synthesis `FFT_DEC`, and newamp1's minimum-phase
//! reconstruction `NEWAMP1_PHASE_NFFT`. Wrapping a cached planner per
//! size keeps call sites free of `rustfft::FftPlanner` bookkeeping.

use num_complex::Complex32;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;

/// A forward+inverse FFT pair of a fixed size, with pre-built plans.
pub struct FftPair {
    size: usize,
    forward: Arc<dyn Fft<f32>>,
    inverse: Arc<dyn Fft<f32>>,
}

impl FftPair {
    /// Build forward and inverse plans for `size`.
    pub fn new(size: usize) -> Self {
        let mut planner = FftPlanner::<f32>::new();
        Self {
            size,
            forward: planner.plan_fft_forward(size),
            inverse: planner.plan_fft_inverse(size),
        }
    }

    /// Transform size this pair was built for.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Forward transform of a real signal, zero-padded or truncated to
    /// this pair's size, returning the full complex spectrum
    /// (unnormalised, matching `rustfft`'s convention).
    pub fn forward_real(&self, signal: &[f32]) -> Vec<Complex32> {
        let mut buf: Vec<Complex32> = (0..self.size)
            .map(|i| Complex32::new(signal.get(i).copied().unwrap_or(0.0), 0.0))
            .collect();
        self.forward.process(&mut buf);
        buf
    }

    /// Inverse transform, normalising by `1/size` so that
    /// `inverse(forward(x)) == x`.
    pub fn inverse_normalized(&self, spectrum: &[Complex32]) -> Vec<Complex32> {
        let mut buf = spectrum.to_vec();
        buf.resize(self.size, Complex32::new(0.0, 0.0));
        self.inverse.process(&mut buf);
        let scale = 1.0 / self.size as f32;
        buf.iter().map(|c| c * scale).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_recovers_signal() {
        let pair = FftPair::new(16);
        let signal: Vec<f32> = (0..16).map(|i| (i as f32 * 0.3).sin()).collect();
        let spectrum = pair.forward_real(&signal);
        let back = pair.inverse_normalized(&spectrum);
        for (a, b) in signal.iter().zip(back.iter()) {
            assert!((a - b.re).abs() < 1e-4);
            assert!(b.im.abs() < 1e-4);
        }
    }

    #[test]
    fn dc_signal_lands_entirely_in_bin_zero() {
        let pair = FftPair::new(8);
        let signal = [1.0; 8];
        let spectrum = pair.forward_real(&signal);
        assert!((spectrum[0].re - 8.0).abs() < 1e-4);
        for bin in &spectrum[1..] {
            assert!(bin.norm() < 1e-4);
        }
    }
}
