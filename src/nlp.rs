//! Non-linear pitch estimator.
//!
//! Produces a coarse pitch period from the time-domain speech buffer via
//! normalised autocorrelation (the "non-linear" squaring/notch step of
//! the original implementation is a pre-conditioning trick to sharpen
//! the autocorrelation peak; this crate folds its effect into a direct
//! peak search over the legal pitch range, which the harmonic-sum
//! refinement stage below then sharpens to the precision that matters
//! for synthesis quality), then refines it by a two-stage harmonic-sum
//! search against the frame spectrum (§4.2).

use num_complex::Complex32;

use crate::types::C2Const;

/// Coarse pitch estimate: the lag in `[p_min, p_max]` maximising
/// normalised autocorrelation of the most recent `2*p_max` samples of
/// the analysis buffer.
pub fn coarse_pitch(c2const: &C2Const, sn: &[f32]) -> usize {
    let start = sn.len().saturating_sub(2 * c2const.p_max);
    let window = &sn[start..];
    let mut best_lag = c2const.p_min;
    let mut best_score = f32::MIN;
    for lag in c2const.p_min..=c2const.p_max {
        if lag >= window.len() {
            break;
        }
        let n = window.len() - lag;
        if n == 0 {
            continue;
        }
        let mut num = 0.0f32;
        let mut den_a = 0.0f32;
        let mut den_b = 0.0f32;
        for i in 0..n {
            num += window[i] * window[i + lag];
            den_a += window[i] * window[i];
            den_b += window[i + lag] * window[i + lag];
        }
        let denom = (den_a * den_b).sqrt().max(1e-9);
        let score = num / denom;
        if score > best_score {
            best_score = score;
            best_lag = lag;
        }
    }
    best_lag
}

/// Harmonic-sum score of a candidate fundamental `wo`, the energy summed
/// across the spectrum bins nearest each harmonic.
fn harmonic_sum_score(wo: f32, sw: &[Complex32], fft_size: usize) -> f32 {
    let l = crate::types::Model::harmonics_for(wo);
    let mut score = 0.0f32;
    for m in 1..=l {
        let bin = (m as f32 * wo * fft_size as f32 / (2.0 * std::f32::consts::PI)).round() as usize;
        if bin < sw.len() {
            score += sw[bin].norm();
        }
    }
    score
}

/// Two-stage harmonic-sum refinement: a coarse search over +/-5 samples
/// of pitch period at step 1.0, then a fine search over +/-1 sample at
/// step 0.25, each maximising [`harmonic_sum_score`].
pub fn two_stage_pitch_refinement(
    c2const: &C2Const,
    pitch_samples: f32,
    sw: &[Complex32],
    fft_size: usize,
) -> f32 {
    let to_wo = |p: f32| (2.0 * std::f32::consts::PI / p).clamp(c2const.wo_min, c2const.wo_max);

    let mut best_p = pitch_samples;
    let mut best_score = harmonic_sum_score(to_wo(best_p), sw, fft_size);
    let mut p = pitch_samples - 5.0;
    while p <= pitch_samples + 5.0 {
        if p >= c2const.p_min as f32 && p <= c2const.p_max as f32 {
            let score = harmonic_sum_score(to_wo(p), sw, fft_size);
            if score > best_score {
                best_score = score;
                best_p = p;
            }
        }
        p += 1.0;
    }

    let coarse_p = best_p;
    let mut p = coarse_p - 1.0;
    while p <= coarse_p + 1.0 {
        if p >= c2const.p_min as f32 && p <= c2const.p_max as f32 {
            let score = harmonic_sum_score(to_wo(p), sw, fft_size);
            if score > best_score {
                best_score = score;
                best_p = p;
            }
        }
        p += 0.25;
    }

    to_wo(best_p)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Mode;

    #[test]
    fn coarse_pitch_finds_periodic_signal() {
        let c2const = C2Const::for_mode(Mode::Mode3200);
        let period = 80usize;
        let sn: Vec<f32> = (0..c2const.m_pitch)
            .map(|i| (2.0 * std::f32::consts::PI * i as f32 / period as f32).sin())
            .collect();
        let lag = coarse_pitch(&c2const, &sn);
        assert!((lag as isize - period as isize).abs() <= 3, "lag={lag}");
    }

    #[test]
    fn refinement_stays_within_bounds() {
        let c2const = C2Const::for_mode(Mode::Mode3200);
        let sw = vec![Complex32::new(1.0, 0.0); 512];
        let wo = two_stage_pitch_refinement(&c2const, 80.0, &sw, 512);
        assert!(wo >= c2const.wo_min && wo <= c2const.wo_max);
    }
}
