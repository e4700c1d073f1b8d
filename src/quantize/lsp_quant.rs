//! LSP scalar, delta-scalar, and predictive-VQ quantisers (§4.4).

use std::f32::consts::PI;

use crate::consts::{LSPD_SCALAR_BITS, LSP_SCALAR_BITS};
use crate::tables::{nearest, LSP_VQ_STAGE0, LSP_VQ_STAGE1};
use crate::types::LPC_ORD;

fn uniform_encode(value: f32, lo: f32, hi: f32, bits: u32) -> u32 {
    let levels = (1u32 << bits) as f32;
    let norm = ((value - lo) / (hi - lo)).clamp(0.0, 1.0);
    (norm * (levels - 1.0)).round() as u32
}

fn uniform_decode(index: u32, lo: f32, hi: f32, bits: u32) -> f32 {
    let levels = (1u32 << bits) as f32;
    lo + (index as f32 / (levels - 1.0)) * (hi - lo)
}

/// Per-coefficient scalar LSP quantiser, `LSP_SCALAR_BITS` wide each,
/// used by 2400/1600/1400/1300.
pub fn encode_lsps_scalar(lsp: &[f32]) -> [u32; LPC_ORD] {
    let mut out = [0u32; LPC_ORD];
    for i in 0..LPC_ORD {
        let band = PI / LPC_ORD as f32;
        let lo = (i as f32 * band - band).max(0.0);
        let hi = ((i + 1) as f32 * band + band).min(PI);
        out[i] = uniform_encode(lsp[i], lo, hi, LSP_SCALAR_BITS[i]);
    }
    out
}

/// Invert [`encode_lsps_scalar`].
pub fn decode_lsps_scalar(indices: &[u32; LPC_ORD]) -> Vec<f32> {
    let mut out = vec![0.0; LPC_ORD];
    for i in 0..LPC_ORD {
        let band = PI / LPC_ORD as f32;
        let lo = (i as f32 * band - band).max(0.0);
        let hi = ((i + 1) as f32 * band + band).min(PI);
        out[i] = uniform_decode(indices[i], lo, hi, LSP_SCALAR_BITS[i]);
    }
    out
}

/// Delta-scalar ("LSPD") quantiser used by 3200: `lsp[0]` directly, then
/// each successive gap `lsp[i] - lsp[i-1]`, `LSPD_SCALAR_BITS` wide each.
pub fn encode_lspd_scalar(lsp: &[f32]) -> [u32; LPC_ORD] {
    let mut out = [0u32; LPC_ORD];
    out[0] = uniform_encode(lsp[0], 0.0, PI, LSPD_SCALAR_BITS[0]);
    for i in 1..LPC_ORD {
        let gap = lsp[i] - lsp[i - 1];
        out[i] = uniform_encode(gap, 0.0, PI / 4.0, LSPD_SCALAR_BITS[i]);
    }
    out
}

/// Invert [`encode_lspd_scalar`].
pub fn decode_lspd_scalar(indices: &[u32; LPC_ORD]) -> Vec<f32> {
    let mut out = vec![0.0; LPC_ORD];
    out[0] = uniform_decode(indices[0], 0.0, PI, LSPD_SCALAR_BITS[0]);
    for i in 1..LPC_ORD {
        let gap = uniform_decode(indices[i], 0.0, PI / 4.0, LSPD_SCALAR_BITS[i]);
        out[i] = out[i - 1] + gap;
    }
    out
}

/// Two-stage predictive VQ used by 1200 (13+14 = 27 bits, §6): the
/// second stage VQs the residual left by the first.
pub fn encode_lsps_vq(lsp: &[f32]) -> (u32, u32) {
    let (i0, _) = nearest(&LSP_VQ_STAGE0, lsp);
    let res0: Vec<f32> = lsp.iter().zip(LSP_VQ_STAGE0[i0].iter()).map(|(v, c)| v - c).collect();
    let (i1, _) = nearest(&LSP_VQ_STAGE1, &res0);
    (i0 as u32, i1 as u32)
}

/// Invert [`encode_lsps_vq`].
pub fn decode_lsps_vq(i0: u32, i1: u32) -> Vec<f32> {
    let stage0 = &LSP_VQ_STAGE0[i0 as usize % LSP_VQ_STAGE0.len()];
    let stage1 = &LSP_VQ_STAGE1[i1 as usize % LSP_VQ_STAGE1.len()];
    stage0.iter().zip(stage1.iter()).map(|(a, b)| a + b).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lsp::check_lsp_order;

    fn sample_lsp() -> Vec<f32> {
        let mut lsp: Vec<f32> = (1..=LPC_ORD).map(|i| i as f32 * PI / (LPC_ORD as f32 + 2.0)).collect();
        check_lsp_order(&mut lsp);
        lsp
    }

    #[test]
    fn scalar_round_trip_is_close() {
        let lsp = sample_lsp();
        let idx = encode_lsps_scalar(&lsp);
        let back = decode_lsps_scalar(&idx);
        for (a, b) in lsp.iter().zip(back.iter()) {
            assert!((a - b).abs() < 0.3, "{a} vs {b}");
        }
    }

    #[test]
    fn delta_scalar_preserves_ascending_order() {
        let lsp = sample_lsp();
        let idx = encode_lspd_scalar(&lsp);
        let back = decode_lspd_scalar(&idx);
        for w in back.windows(2) {
            assert!(w[0] <= w[1]);
        }
    }

    #[test]
    fn vq_round_trip_has_bounded_vectors() {
        let lsp = sample_lsp();
        let (i0, i1) = encode_lsps_vq(&lsp);
        let back = decode_lsps_vq(i0, i1);
        assert_eq!(back.len(), LPC_ORD);
        for v in back {
            assert!(v.is_finite());
        }
    }
}
