//! 700C bit layout: `VQ1(9) VQ2(9) E(4) WoV(6)` (§6).

use crate::bits::{BitPacker, BitUnpacker};
use crate::consts::{NEWAMP1_ENERGY_BITS, NEWAMP1_VQ_STAGE_BITS, NEWAMP1_WO_BITS};

#[derive(Debug, Clone)]
pub struct Frame700C {
    pub vq_idx: (u32, u32),
    pub mean_idx: u32,
    pub wov_idx: u32,
}

impl Frame700C {
    pub fn pack(&self) -> Vec<u8> {
        let mut p = BitPacker::new(28);
        p.push(self.vq_idx.0, NEWAMP1_VQ_STAGE_BITS);
        p.push(self.vq_idx.1, NEWAMP1_VQ_STAGE_BITS);
        p.push(self.mean_idx, NEWAMP1_ENERGY_BITS);
        p.push(self.wov_idx, NEWAMP1_WO_BITS);
        p.finish()
    }

    pub fn unpack(bytes: &[u8]) -> Self {
        let mut u = BitUnpacker::new(bytes);
        let i0 = u.pull(NEWAMP1_VQ_STAGE_BITS);
        let i1 = u.pull(NEWAMP1_VQ_STAGE_BITS);
        let mean_idx = u.pull(NEWAMP1_ENERGY_BITS);
        let wov_idx = u.pull(NEWAMP1_WO_BITS);
        Self { vq_idx: (i0, i1), mean_idx, wov_idx }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_700c_round_trips() {
        let f = Frame700C { vq_idx: (100, 511), mean_idx: 9, wov_idx: 40 };
        let bytes = f.pack();
        assert_eq!(bytes.len(), 4);
        let back = Frame700C::unpack(&bytes);
        assert_eq!(back.vq_idx, f.vq_idx);
        assert_eq!(back.mean_idx, f.mean_idx);
        assert_eq!(back.wov_idx, f.wov_idx);
    }
}
