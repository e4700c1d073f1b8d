//! Bit layouts for the six classical (non-newamp) modes (§6).

use crate::bits::{pack_natural_or_gray, unpack_natural_or_gray, BitPacker, BitUnpacker};
use crate::consts::{E_BITS, LSPD_SCALAR_BITS, LSP_SCALAR_BITS, WO_BITS, WO_E_BITS};
use crate::types::LPC_ORD;

fn push_lsp_scalar(packer: &mut BitPacker, idx: &[u32; LPC_ORD]) {
    for i in 0..LPC_ORD {
        packer.push(idx[i], LSP_SCALAR_BITS[i]);
    }
}

fn pull_lsp_scalar(unpacker: &mut BitUnpacker) -> [u32; LPC_ORD] {
    let mut out = [0u32; LPC_ORD];
    for (i, slot) in out.iter_mut().enumerate() {
        *slot = unpacker.pull(LSP_SCALAR_BITS[i]);
    }
    out
}

/// 3200 bit/s: `v0 v1 Wo(7) E(5) LSPd(50)`.
#[derive(Debug, Clone)]
pub struct Frame3200 {
    pub voiced: [bool; 2],
    pub wo_idx: u32,
    pub e_idx: u32,
    pub lspd_idx: [u32; LPC_ORD],
}

impl Frame3200 {
    pub fn pack(&self) -> Vec<u8> {
        let mut p = BitPacker::new(64);
        p.push(self.voiced[0] as u32, 1);
        p.push(self.voiced[1] as u32, 1);
        p.push(self.wo_idx, WO_BITS);
        p.push(self.e_idx, E_BITS);
        for i in 0..LPC_ORD {
            p.push(self.lspd_idx[i], LSPD_SCALAR_BITS[i]);
        }
        p.finish()
    }

    pub fn unpack(bytes: &[u8]) -> Self {
        let mut u = BitUnpacker::new(bytes);
        let v0 = u.pull(1) != 0;
        let v1 = u.pull(1) != 0;
        let wo_idx = u.pull(WO_BITS);
        let e_idx = u.pull(E_BITS);
        let mut lspd_idx = [0u32; LPC_ORD];
        for (i, slot) in lspd_idx.iter_mut().enumerate() {
            *slot = u.pull(LSPD_SCALAR_BITS[i]);
        }
        Self { voiced: [v0, v1], wo_idx, e_idx, lspd_idx }
    }
}

/// 2400 bit/s: `v0 v1 WoE(8) LSP(36) spare(2)`.
#[derive(Debug, Clone)]
pub struct Frame2400 {
    pub voiced: [bool; 2],
    pub woe_idx: u32,
    pub lsp_idx: [u32; LPC_ORD],
    pub spare: u32,
}

impl Frame2400 {
    pub fn pack(&self) -> Vec<u8> {
        let mut p = BitPacker::new(48);
        p.push(self.voiced[0] as u32, 1);
        p.push(self.voiced[1] as u32, 1);
        p.push(self.woe_idx, WO_E_BITS);
        push_lsp_scalar(&mut p, &self.lsp_idx);
        p.push(self.spare, 2);
        p.finish()
    }

    pub fn unpack(bytes: &[u8]) -> Self {
        let mut u = BitUnpacker::new(bytes);
        let v0 = u.pull(1) != 0;
        let v1 = u.pull(1) != 0;
        let woe_idx = u.pull(WO_E_BITS);
        let lsp_idx = pull_lsp_scalar(&mut u);
        let spare = u.pull(2);
        Self { voiced: [v0, v1], woe_idx, lsp_idx, spare }
    }
}

/// 1600 bit/s: `v0 (Wo0(7) E0(5)) v1 (Wo1(7) E1(5))` then `v2 (Wo2 E2) v3 (Wo3 E3)` is
/// not used — the mode sends Wo/E once per *sub-frame pair*: `v0 Wo0(7) E0(5) v1 Wo1(7) E1(5) LSP(36)`.
#[derive(Debug, Clone)]
pub struct Frame1600 {
    pub voiced: [bool; 2],
    pub wo_idx: [u32; 2],
    pub e_idx: [u32; 2],
    pub lsp_idx: [u32; LPC_ORD],
}

impl Frame1600 {
    pub fn pack(&self) -> Vec<u8> {
        let mut p = BitPacker::new(64);
        p.push(self.voiced[0] as u32, 1);
        p.push(self.wo_idx[0], WO_BITS);
        p.push(self.e_idx[0], E_BITS);
        p.push(self.voiced[1] as u32, 1);
        p.push(self.wo_idx[1], WO_BITS);
        p.push(self.e_idx[1], E_BITS);
        push_lsp_scalar(&mut p, &self.lsp_idx);
        p.finish()
    }

    pub fn unpack(bytes: &[u8]) -> Self {
        let mut u = BitUnpacker::new(bytes);
        let v0 = u.pull(1) != 0;
        let wo0 = u.pull(WO_BITS);
        let e0 = u.pull(E_BITS);
        let v1 = u.pull(1) != 0;
        let wo1 = u.pull(WO_BITS);
        let e1 = u.pull(E_BITS);
        let lsp_idx = pull_lsp_scalar(&mut u);
        Self { voiced: [v0, v1], wo_idx: [wo0, wo1], e_idx: [e0, e1], lsp_idx }
    }
}

/// 1400 bit/s: `v0 WoE0(8) v1 WoE1(8) LSP(36) spare(1)`.
#[derive(Debug, Clone)]
pub struct Frame1400 {
    pub voiced: [bool; 2],
    pub woe_idx: [u32; 2],
    pub lsp_idx: [u32; LPC_ORD],
    pub spare: u32,
}

impl Frame1400 {
    pub fn pack(&self) -> Vec<u8> {
        let mut p = BitPacker::new(56);
        p.push(self.voiced[0] as u32, 1);
        p.push(self.woe_idx[0], WO_E_BITS);
        p.push(self.voiced[1] as u32, 1);
        p.push(self.woe_idx[1], WO_E_BITS);
        push_lsp_scalar(&mut p, &self.lsp_idx);
        p.push(self.spare, 1);
        p.finish()
    }

    pub fn unpack(bytes: &[u8]) -> Self {
        let mut u = BitUnpacker::new(bytes);
        let v0 = u.pull(1) != 0;
        let woe0 = u.pull(WO_E_BITS);
        let v1 = u.pull(1) != 0;
        let woe1 = u.pull(WO_E_BITS);
        let lsp_idx = pull_lsp_scalar(&mut u);
        let spare = u.pull(1);
        Self { voiced: [v0, v1], woe_idx: [woe0, woe1], lsp_idx, spare }
    }
}

/// 1300 bit/s, Gray-coded: `v0 v1 v2 v3 Wo(7) E(5) LSP(36)`, one Wo/E pair
/// covering all four 10 ms sub-frames.
#[derive(Debug, Clone)]
pub struct Frame1300 {
    pub voiced: [bool; 4],
    pub wo_idx: u32,
    pub e_idx: u32,
    pub lsp_idx: [u32; LPC_ORD],
}

impl Frame1300 {
    pub fn pack(&self, gray: bool) -> Vec<u8> {
        let mut p = BitPacker::new(52);
        for v in self.voiced {
            p.push(v as u32, 1);
        }
        p.push(pack_natural_or_gray(self.wo_idx, gray), WO_BITS);
        p.push(pack_natural_or_gray(self.e_idx, gray), E_BITS);
        push_lsp_scalar(&mut p, &self.lsp_idx);
        p.finish()
    }

    pub fn unpack(bytes: &[u8], gray: bool) -> Self {
        let mut u = BitUnpacker::new(bytes);
        let mut voiced = [false; 4];
        for v in voiced.iter_mut() {
            *v = u.pull(1) != 0;
        }
        let wo_idx = unpack_natural_or_gray(u.pull(WO_BITS), gray);
        let e_idx = unpack_natural_or_gray(u.pull(E_BITS), gray);
        let lsp_idx = pull_lsp_scalar(&mut u);
        Self { voiced, wo_idx, e_idx, lsp_idx }
    }
}

/// 1200 bit/s: `v0 WoE0(8) v1 WoE1(8) LSP-PVQ(27) spare(1)`.
#[derive(Debug, Clone)]
pub struct Frame1200 {
    pub voiced: [bool; 2],
    pub woe_idx: [u32; 2],
    pub lsp_vq_idx: (u32, u32),
    pub spare: u32,
}

impl Frame1200 {
    pub fn pack(&self) -> Vec<u8> {
        let mut p = BitPacker::new(48);
        p.push(self.voiced[0] as u32, 1);
        p.push(self.woe_idx[0], WO_E_BITS);
        p.push(self.voiced[1] as u32, 1);
        p.push(self.woe_idx[1], WO_E_BITS);
        p.push(self.lsp_vq_idx.0, crate::consts::LSP_VQ_STAGE0_BITS);
        p.push(self.lsp_vq_idx.1, crate::consts::LSP_VQ_STAGE1_BITS);
        p.push(self.spare, 1);
        p.finish()
    }

    pub fn unpack(bytes: &[u8]) -> Self {
        let mut u = BitUnpacker::new(bytes);
        let v0 = u.pull(1) != 0;
        let woe0 = u.pull(WO_E_BITS);
        let v1 = u.pull(1) != 0;
        let woe1 = u.pull(WO_E_BITS);
        let i0 = u.pull(crate::consts::LSP_VQ_STAGE0_BITS);
        let i1 = u.pull(crate::consts::LSP_VQ_STAGE1_BITS);
        let spare = u.pull(1);
        Self { voiced: [v0, v1], woe_idx: [woe0, woe1], lsp_vq_idx: (i0, i1), spare }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_3200_round_trips() {
        let f = Frame3200 {
            voiced: [true, false],
            wo_idx: 64,
            e_idx: 17,
            lspd_idx: [1, 2, 3, 4, 5, 6, 7, 8, 9, 10],
        };
        let bytes = f.pack();
        assert_eq!(bytes.len(), 8);
        let back = Frame3200::unpack(&bytes);
        assert_eq!(back.voiced, f.voiced);
        assert_eq!(back.wo_idx, f.wo_idx);
        assert_eq!(back.e_idx, f.e_idx);
        assert_eq!(back.lspd_idx, f.lspd_idx);
    }

    #[test]
    fn frame_2400_round_trips_with_spare() {
        let f = Frame2400 {
            voiced: [true, true],
            woe_idx: 200,
            lsp_idx: [0, 1, 2, 3, 4, 5, 6, 5, 4, 2],
            spare: 0b11,
        };
        let bytes = f.pack();
        assert_eq!(bytes.len(), 6);
        let back = Frame2400::unpack(&bytes);
        assert_eq!(back.woe_idx, f.woe_idx);
        assert_eq!(back.lsp_idx, f.lsp_idx);
        assert_eq!(back.spare, 0b11);
    }

    #[test]
    fn frame_1300_gray_round_trips() {
        let f = Frame1300 {
            voiced: [true, false, true, false],
            wo_idx: 99,
            e_idx: 20,
            lsp_idx: [1, 1, 1, 1, 1, 1, 1, 1, 1, 1],
        };
        let bytes = f.pack(true);
        let back = Frame1300::unpack(&bytes, true);
        assert_eq!(back.voiced, f.voiced);
        assert_eq!(back.wo_idx, f.wo_idx);
        assert_eq!(back.e_idx, f.e_idx);
    }

    #[test]
    fn frame_1200_round_trips() {
        let f = Frame1200 {
            voiced: [true, false],
            woe_idx: [10, 200],
            lsp_vq_idx: (5, 300),
            spare: 1,
        };
        let bytes = f.pack();
        assert_eq!(bytes.len(), 6);
        let back = Frame1200::unpack(&bytes);
        assert_eq!(back.lsp_vq_idx, f.lsp_vq_idx);
        assert_eq!(back.spare, 1);
    }
}
