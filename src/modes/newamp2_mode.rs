//! 450 / 450PWB bit layout: `VQ1(9) E(3) WoVP(6)` (§6). 450PWB shares this
//! exact layout — it differs only in how the decoder interprets it
//! (wider rate-K spacing, doubled synthesis rate).

use crate::bits::{BitPacker, BitUnpacker};
use crate::consts::{NEWAMP2_ENERGY_BITS, NEWAMP2_VQ_STAGE_BITS, NEWAMP2_WO_BITS};

#[derive(Debug, Clone)]
pub struct Frame450 {
    pub vq_idx: u32,
    pub mean_idx: u32,
    pub wovp_idx: u32,
}

impl Frame450 {
    pub fn pack(&self) -> Vec<u8> {
        let mut p = BitPacker::new(18);
        p.push(self.vq_idx, NEWAMP2_VQ_STAGE_BITS);
        p.push(self.mean_idx, NEWAMP2_ENERGY_BITS);
        p.push(self.wovp_idx, NEWAMP2_WO_BITS);
        p.finish()
    }

    pub fn unpack(bytes: &[u8]) -> Self {
        let mut u = BitUnpacker::new(bytes);
        let vq_idx = u.pull(NEWAMP2_VQ_STAGE_BITS);
        let mean_idx = u.pull(NEWAMP2_ENERGY_BITS);
        let wovp_idx = u.pull(NEWAMP2_WO_BITS);
        Self { vq_idx, mean_idx, wovp_idx }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_450_round_trips() {
        let f = Frame450 { vq_idx: 300, mean_idx: 5, wovp_idx: 63 };
        let bytes = f.pack();
        assert_eq!(bytes.len(), 3);
        let back = Frame450::unpack(&bytes);
        assert_eq!(back.vq_idx, f.vq_idx);
        assert_eq!(back.mean_idx, f.mean_idx);
        assert_eq!(back.wovp_idx, f.wovp_idx);
    }
}
