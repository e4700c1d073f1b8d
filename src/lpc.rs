//! Autocorrelation LPC analysis via Levinson-Durbin recursion.

use crate::types::LPC_ORD;

/// Windowed autocorrelation of `signal` up to and including `order`, with
/// a small white-noise correction (`autocorr[0] *= 1 + 1e-6`) to keep the
/// recursion well-conditioned on near-silent frames.
pub fn autocorrelate(signal: &[f32], order: usize) -> Vec<f32> {
    let n = signal.len();
    let mut r = vec![0.0f32; order + 1];
    for (lag, slot) in r.iter_mut().enumerate() {
        let mut sum = 0.0;
        for i in 0..n.saturating_sub(lag) {
            sum += signal[i] * signal[i + lag];
        }
        *slot = sum;
    }
    r[0] *= 1.0 + 1e-6;
    r[0] += 1e-9;
    r
}

/// Levinson-Durbin recursion. Returns `(a[1..=order], residual_energy)`
/// where `a` are the LPC predictor coefficients (`a[0]` implicitly 1.0,
/// not stored) and the residual energy is the all-pole gain term `e`.
pub fn levinson_durbin(r: &[f32], order: usize) -> (Vec<f32>, f32) {
    let mut a = vec![0.0f32; order + 1];
    let mut e = r[0];
    for i in 1..=order {
        let mut acc = r[i];
        for j in 1..i {
            acc -= a[j] * r[i - j];
        }
        let k = if e.abs() > 1e-12 { acc / e } else { 0.0 };
        let mut new_a = a.clone();
        new_a[i] = k;
        for j in 1..i {
            new_a[j] = a[j] - k * a[i - j];
        }
        a = new_a;
        e *= 1.0 - k * k;
        if e < 1e-9 {
            e = 1e-9;
        }
    }
    (a[1..=order].to_vec(), e)
}

/// `speech_to_uq_lsps`'s LPC half: autocorrelate a windowed frame and run
/// Levinson-Durbin to `LPC_ORD`.
pub fn speech_to_lpc(windowed: &[f32]) -> (Vec<f32>, f32) {
    let r = autocorrelate(windowed, LPC_ORD);
    levinson_durbin(&r, LPC_ORD)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levinson_durbin_recovers_ar1_coefficient() {
        // A pure AR(1) process x[n] = 0.5 x[n-1] + noise has
        // autocorrelation r[k] = 0.5^k (up to a positive scale), so the
        // order-1 LPC coefficient should land near -0.5 (a[1] predicts
        // x[n] = -a[1] x[n-1]).
        let r = [1.0, 0.5, 0.25, 0.125, 0.0625, 0.03125, 0.0, 0.0, 0.0, 0.0, 0.0];
        let (a, e) = levinson_durbin(&r, LPC_ORD);
        assert!((a[0] - (-0.5)).abs() < 0.05, "a[0]={}", a[0]);
        assert!(e > 0.0);
    }

    #[test]
    fn autocorrelate_zero_signal_is_stable() {
        let signal = vec![0.0f32; 320];
        let r = autocorrelate(&signal, LPC_ORD);
        let (_, e) = levinson_durbin(&r, LPC_ORD);
        assert!(e.is_finite() && e > 0.0);
    }
}
