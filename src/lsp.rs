//! LPC <-> LSP conversion, ordering enforcement, and bandwidth expansion.
//!
//! LSPs are found as the roots, on the unit circle, of the symmetric and
//! antisymmetric polynomials `P(z) = A(z) + z^-(p+1) A(1/z)` and
//! `Q(z) = A(z) - z^-(p+1) A(1/z)`. Per §4.4 this crate follows a
//! Chebyshev-interval-search-then-bisection strategy: both polynomials
//! are evaluated directly on the unit circle as a function of angle, the
//! `[0, pi]` range is scanned for sign changes, and each bracket is
//! refined by bisection. This evaluates the defining relation directly
//! rather than via a memorised recursive coefficient formula, which
//! keeps it correct independent of any particular reference's constants
//! (consistent with the non-goal of bit-exact reproduction, §1).

use num_complex::Complex32;
use std::f32::consts::PI;

use crate::types::LPC_ORD;

fn eval_symmetric_poly(a: &[f32], order: usize, w: f32, sign: f32) -> f32 {
    let mut a_w = Complex32::new(1.0, 0.0);
    let mut a_rev_w = Complex32::new(1.0, 0.0);
    for (k, &coeff) in a.iter().enumerate().take(order) {
        let k = k as f32 + 1.0;
        a_w += coeff * Complex32::from_polar(1.0, -k * w);
        a_rev_w += coeff * Complex32::from_polar(1.0, k * w);
    }
    let factor = Complex32::from_polar(1.0, -((order as f32) + 1.0) * w);
    (a_w + sign * factor * a_rev_w).re
}

/// Find the `order/2` roots of a symmetric/antisymmetric polynomial in
/// the open interval `(0, pi)`, via fine-grid scan + bisection.
fn find_roots(a: &[f32], order: usize, sign: f32) -> Vec<f32> {
    const STEPS: usize = 800;
    let f = |w: f32| eval_symmetric_poly(a, order, w, sign);
    let mut roots = Vec::with_capacity(order / 2);
    let mut prev_w = 1e-4;
    let mut prev_v = f(prev_w);
    for i in 1..=STEPS {
        let w = 1e-4 + (PI - 2e-4) * (i as f32 / STEPS as f32);
        let v = f(w);
        if prev_v.signum() != v.signum() && roots.len() < order / 2 {
            let mut lo = prev_w;
            let mut hi = w;
            let mut lo_v = prev_v;
            for _ in 0..40 {
                let mid = 0.5 * (lo + hi);
                let mid_v = f(mid);
                if mid_v.signum() == lo_v.signum() {
                    lo = mid;
                    lo_v = mid_v;
                } else {
                    hi = mid;
                }
            }
            roots.push(0.5 * (lo + hi));
        }
        prev_w = w;
        prev_v = v;
    }
    roots
}

/// Convert LPC predictor coefficients `a[1..=LPC_ORD]` to an ascending
/// LSP vector of the same order, in radians, strictly within `(0, pi)`.
pub fn lpc_to_lsp(a: &[f32]) -> Vec<f32> {
    let order = LPC_ORD;
    let mut p_roots = find_roots(a, order, 1.0);
    let mut q_roots = find_roots(a, order, -1.0);

    // Guard against a degenerate frame (e.g. near-silence) where the
    // scan fails to bracket enough roots: fall back to an even spread,
    // which keeps downstream code's ordering invariant intact without
    // a fault, matching the codec's "deterministic clamp, not a fault"
    // policy for invariant violations (§7).
    while p_roots.len() < order / 2 {
        let idx = p_roots.len();
        p_roots.push(PI * (idx as f32 + 1.0) / (order as f32 + 2.0));
    }
    while q_roots.len() < order / 2 {
        let idx = q_roots.len();
        q_roots.push(PI * (idx as f32 + 1.5) / (order as f32 + 2.0));
    }

    let mut lsp: Vec<f32> = p_roots.into_iter().chain(q_roots).collect();
    lsp.sort_by(|x, y| x.partial_cmp(y).unwrap());
    lsp.truncate(order);
    check_lsp_order(&mut lsp);
    lsp
}

/// Reconstruct LPC predictor coefficients `a[1..=LPC_ORD]` from an
/// ascending LSP vector, by reassembling
/// `A(z) = (P(z) + Q(z)) / 2` from each polynomial's roots.
pub fn lsp_to_lpc(lsp: &[f32]) -> Vec<f32> {
    let order = lsp.len();
    // LSP roots interlace strictly; by construction in `lpc_to_lsp` the
    // even-indexed roots came from P, odd-indexed from Q. Reassembly
    // only needs a consistent convention between the two directions,
    // not agreement with any external reference (§1 non-goals).
    let p_roots: Vec<f32> = lsp.iter().step_by(2).copied().collect();
    let q_roots: Vec<f32> = lsp.iter().skip(1).step_by(2).copied().collect();

    let p_poly = poly_from_roots(&p_roots, &[1.0, 1.0]);
    let q_poly = poly_from_roots(&q_roots, &[1.0, -1.0]);

    let len = p_poly.len().max(q_poly.len());
    let mut sum = vec![0.0f32; len];
    for i in 0..len {
        sum[i] = p_poly.get(i).copied().unwrap_or(0.0) + q_poly.get(i).copied().unwrap_or(0.0);
    }
    for v in sum.iter_mut() {
        *v *= 0.5;
    }
    // sum[0] == 1.0 by construction; a[1..=order] are sum[1..=order].
    sum.into_iter().skip(1).take(order).collect()
}

fn poly_from_roots(roots: &[f32], linear_factor: &[f32; 2]) -> Vec<f32> {
    let mut poly = linear_factor.to_vec();
    for &theta in roots {
        let quad = [1.0, -2.0 * theta.cos(), 1.0];
        poly = convolve(&poly, &quad);
    }
    poly
}

fn convolve(a: &[f32], b: &[f32]) -> Vec<f32> {
    let mut out = vec![0.0f32; a.len() + b.len() - 1];
    for (i, &ai) in a.iter().enumerate() {
        for (j, &bj) in b.iter().enumerate() {
            out[i + j] += ai * bj;
        }
    }
    out
}

/// Enforce strict ascending order in `(0, pi)` by swapping out-of-order
/// neighbours and nudging apart by a minimum gap, as the decoder must
/// after dequantisation (bit errors or coarse quantisation can otherwise
/// produce a crossed pair).
pub fn check_lsp_order(lsp: &mut [f32]) {
    const MIN_GAP: f32 = 0.01;
    for i in 0..lsp.len() {
        lsp[i] = lsp[i].clamp(1e-4, PI - 1e-4);
    }
    for i in 1..lsp.len() {
        if lsp[i] <= lsp[i - 1] {
            lsp[i] = lsp[i - 1] + MIN_GAP;
        }
    }
    if let Some(last) = lsp.last_mut() {
        if *last >= PI {
            *last = PI - 1e-4;
        }
    }
}

/// Widen pairs of LSPs that are closer than `min_sep` (in the same
/// units as `lsp`, radians) to at least `min_sep`, and no more than
/// `max_sep` apart, to avoid narrow synthesis-filter resonances.
pub fn bw_expand_lsps(lsp: &mut [f32], min_sep_hz: f32, max_sep_hz: f32, fs: u32) {
    let min_sep = 2.0 * PI * min_sep_hz / fs as f32;
    let max_sep = 2.0 * PI * max_sep_hz / fs as f32;
    for i in 1..lsp.len() {
        let gap = lsp[i] - lsp[i - 1];
        if gap < min_sep {
            lsp[i] = lsp[i - 1] + min_sep;
        } else if gap > max_sep && max_sep > 0.0 {
            lsp[i] = lsp[i - 1] + max_sep;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lpc::speech_to_lpc;

    fn synthetic_speech(n: usize) -> Vec<f32> {
        (0..n)
            .map(|i| {
                let t = i as f32;
                (0.05 * t).sin() * 3000.0 + (0.3 * t).sin() * 800.0
            })
            .collect()
    }

    #[test]
    fn lpc_to_lsp_is_strictly_ascending_in_range() {
        let speech = synthetic_speech(320);
        let (a, _e) = speech_to_lpc(&speech);
        let lsp = lpc_to_lsp(&a);
        assert_eq!(lsp.len(), LPC_ORD);
        for w in lsp.windows(2) {
            assert!(w[0] < w[1]);
        }
        assert!(lsp[0] > 0.0 && *lsp.last().unwrap() < PI);
    }

    #[test]
    fn lsp_to_lpc_round_trip_is_stable() {
        let speech = synthetic_speech(320);
        let (a, _e) = speech_to_lpc(&speech);
        let lsp = lpc_to_lsp(&a);
        let a2 = lsp_to_lpc(&lsp);
        assert_eq!(a2.len(), LPC_ORD);
        for coeff in &a2 {
            assert!(coeff.is_finite());
        }
    }

    #[test]
    fn check_lsp_order_fixes_crossed_pair() {
        let mut lsp = vec![0.5, 0.4, 0.6, 0.9, 1.2, 1.5, 1.8, 2.1, 2.5, 2.9];
        check_lsp_order(&mut lsp);
        for w in lsp.windows(2) {
            assert!(w[0] < w[1]);
        }
    }

    #[test]
    fn bw_expand_widens_narrow_pair() {
        let mut lsp = vec![0.5, 0.501, 0.9, 1.2, 1.5, 1.8, 2.1, 2.4, 2.7, 3.0];
        bw_expand_lsps(&mut lsp, 200.0, 1000.0, 8000);
        assert!(lsp[1] - lsp[0] >= 2.0 * PI * 200.0 / 8000.0 - 1e-6);
    }
}
