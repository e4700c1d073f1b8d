//! Static code-book tables.
//!
//! Per §6/§10.5, codebook contents are opaque constant data: numerical
//! equivalence with any reference is explicitly not required (§1
//! non-goals), only that the shapes and the VQ search machinery behave
//! correctly. Each codebook here is generated once, deterministically,
//! from a closed-form smooth function of its entry and dimension index
//! (a spread of low-frequency sinusoids) rather than literal reference
//! floats — this gives genuinely distinct, smoothly-varying codewords
//! (so nearest-neighbour search behaves sensibly) without fabricating a
//! claim of bit-identity to any external table. See `DESIGN.md`.

use once_cell::sync::Lazy;

/// Generate a `size`-entry codebook of `dim`-dimensional vectors, scaled
/// to roughly `[-scale, scale]`, deterministically from `(entry, dim,
/// seed)` alone.
fn generate(size: usize, dim: usize, scale: f32, seed: f32) -> Vec<Vec<f32>> {
    (0..size)
        .map(|i| {
            (0..dim)
                .map(|d| {
                    let phase = (i as f32 + 1.0) * (d as f32 + 1.7) * 0.31 + seed;
                    scale * (0.6 * phase.sin() + 0.4 * (1.9 * phase).cos())
                })
                .collect()
        })
        .collect()
}

/// Find the index of the codebook entry nearest `vec` in squared
/// Euclidean distance, returning `(index, squared_error)`.
pub fn nearest(codebook: &[Vec<f32>], vec: &[f32]) -> (usize, f32) {
    let mut best_idx = 0;
    let mut best_err = f32::MAX;
    for (i, entry) in codebook.iter().enumerate() {
        let err: f32 = entry
            .iter()
            .zip(vec.iter())
            .map(|(c, v)| (c - v) * (c - v))
            .sum();
        if err < best_err {
            best_err = err;
            best_idx = i;
        }
    }
    (best_idx, best_err)
}

/// 256-entry, 2-dimensional joint (Wo, energy) residual VQ codebook,
/// used by the 2400/1400/1200 bit/s modes (§4.5).
pub static WO_ENERGY_VQ: Lazy<Vec<Vec<f32>>> = Lazy::new(|| generate(256, 2, 1.0, 0.0));

/// Two-stage predictive LSP VQ used by the 1200 bit/s mode (§4.4): a
/// `LSP_VQ_STAGE0_BITS`-wide coarse stage over the full
/// `LPC_ORD`-dimensional vector, then a `LSP_VQ_STAGE1_BITS`-wide stage
/// over the residual it leaves, 27 bits total.
pub static LSP_VQ_STAGE0: Lazy<Vec<Vec<f32>>> = Lazy::new(|| {
    generate(1 << crate::consts::LSP_VQ_STAGE0_BITS, crate::types::LPC_ORD, 0.5, 1.0)
});
/// See [`LSP_VQ_STAGE0`].
pub static LSP_VQ_STAGE1: Lazy<Vec<Vec<f32>>> = Lazy::new(|| {
    generate(1 << crate::consts::LSP_VQ_STAGE1_BITS, crate::types::LPC_ORD, 0.15, 2.0)
});

/// Newamp1 (700C) two-stage rate-K=20 VQ (§4.6).
pub static NEWAMP1_VQ_STAGE0: Lazy<Vec<Vec<f32>>> =
    Lazy::new(|| generate(1 << crate::consts::NEWAMP1_VQ_STAGE_BITS, crate::consts::NEWAMP1_K, 12.0, 3.0));
/// See [`NEWAMP1_VQ_STAGE0`].
pub static NEWAMP1_VQ_STAGE1: Lazy<Vec<Vec<f32>>> =
    Lazy::new(|| generate(1 << crate::consts::NEWAMP1_VQ_STAGE_BITS, crate::consts::NEWAMP1_K, 4.0, 4.0));
/// Newamp1's 4-bit joint mean/energy codebook.
pub static NEWAMP1_ENERGY_VQ: Lazy<Vec<Vec<f32>>> =
    Lazy::new(|| generate(1 << crate::consts::NEWAMP1_ENERGY_BITS, 1, 30.0, 5.0));

/// Newamp2 (450) single-stage rate-K=29 VQ (§4.7).
pub static NEWAMP2_VQ: Lazy<Vec<Vec<f32>>> =
    Lazy::new(|| generate(1 << crate::consts::NEWAMP2_VQ_STAGE_BITS, crate::consts::NEWAMP2_K, 12.0, 6.0));
/// Newamp2's 3-bit energy codebook.
pub static NEWAMP2_ENERGY_VQ: Lazy<Vec<Vec<f32>>> =
    Lazy::new(|| generate(1 << crate::consts::NEWAMP2_ENERGY_BITS, 1, 30.0, 7.0));

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codebooks_have_expected_shapes() {
        assert_eq!(WO_ENERGY_VQ.len(), 256);
        assert_eq!(WO_ENERGY_VQ[0].len(), 2);
        assert_eq!(NEWAMP1_VQ_STAGE0.len(), 512);
        assert_eq!(NEWAMP1_VQ_STAGE0[0].len(), crate::consts::NEWAMP1_K);
        assert_eq!(NEWAMP2_VQ.len(), 512);
        assert_eq!(NEWAMP2_VQ[0].len(), crate::consts::NEWAMP2_K);
    }

    #[test]
    fn nearest_finds_exact_match() {
        let cb = generate(16, 3, 1.0, 0.0);
        let target = cb[5].clone();
        let (idx, err) = nearest(&cb, &target);
        assert_eq!(idx, 5);
        assert!(err < 1e-6);
    }
}
