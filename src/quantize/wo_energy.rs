//! Scalar and joint Wo/energy quantisers (§4.5).

use crate::consts::{E_BITS, WO_BITS};
use crate::tables::{nearest, WO_ENERGY_VQ};
use crate::types::C2Const;

/// Encode `wo` log-spaced over `[wo_min, wo_max]` into a `WO_BITS`-wide
/// index.
pub fn encode_wo_scalar(c2const: &C2Const, wo: f32) -> u32 {
    let levels = (1u32 << WO_BITS) as f32;
    let log_min = c2const.wo_min.ln();
    let log_max = c2const.wo_max.ln();
    let norm = (wo.max(c2const.wo_min).ln() - log_min) / (log_max - log_min);
    ((norm * (levels - 1.0)).round() as u32).min(levels as u32 - 1)
}

/// Invert [`encode_wo_scalar`].
pub fn decode_wo_scalar(c2const: &C2Const, index: u32) -> f32 {
    let levels = (1u32 << WO_BITS) as f32;
    let log_min = c2const.wo_min.ln();
    let log_max = c2const.wo_max.ln();
    let norm = index as f32 / (levels - 1.0);
    (log_min + norm * (log_max - log_min)).exp()
}

/// Encode frame energy (linear, e.g. sum of squared LPC residual) on a
/// log (dB) scale into an `E_BITS`-wide index, spanning roughly 0-60 dB.
pub fn encode_energy_scalar(energy: f32) -> u32 {
    const E_MIN_DB: f32 = 0.0;
    const E_MAX_DB: f32 = 60.0;
    let levels = (1u32 << E_BITS) as f32;
    let db = 10.0 * energy.max(1e-6).log10();
    let norm = ((db - E_MIN_DB) / (E_MAX_DB - E_MIN_DB)).clamp(0.0, 1.0);
    (norm * (levels - 1.0)).round() as u32
}

/// Invert [`encode_energy_scalar`], returning linear energy.
pub fn decode_energy_scalar(index: u32) -> f32 {
    const E_MIN_DB: f32 = 0.0;
    const E_MAX_DB: f32 = 60.0;
    let levels = (1u32 << E_BITS) as f32;
    let norm = index as f32 / (levels - 1.0);
    let db = E_MIN_DB + norm * (E_MAX_DB - E_MIN_DB);
    10f32.powf(db / 10.0)
}

/// AR(1) predictor state for the joint Wo/energy quantiser, one instance
/// each for encode and decode per §3 (`xq_enc`/`xq_dec`).
#[derive(Debug, Clone, Copy, Default)]
pub struct WoEnergyPredictor {
    xq: [f32; 2],
}

const PREDICTOR_GAIN: f32 = 0.5;

impl WoEnergyPredictor {
    /// Quantise `(log_wo, log_energy)` jointly: subtract the AR(1)
    /// prediction, VQ the residual against the 256-entry codebook,
    /// update the predictor state from the quantised residual.
    pub fn encode(&mut self, log_wo: f32, log_energy: f32) -> u32 {
        let target = [log_wo - PREDICTOR_GAIN * self.xq[0], log_energy - PREDICTOR_GAIN * self.xq[1]];
        let (idx, _err) = nearest(&WO_ENERGY_VQ, &target);
        let code = &WO_ENERGY_VQ[idx];
        self.xq[0] = code[0] + PREDICTOR_GAIN * self.xq[0];
        self.xq[1] = code[1] + PREDICTOR_GAIN * self.xq[1];
        idx as u32
    }

    /// Invert [`Self::encode`], returning `(log_wo, log_energy)`.
    pub fn decode(&mut self, index: u32) -> (f32, f32) {
        let code = &WO_ENERGY_VQ[index as usize % WO_ENERGY_VQ.len()];
        let log_wo = code[0] + PREDICTOR_GAIN * self.xq[0];
        let log_energy = code[1] + PREDICTOR_GAIN * self.xq[1];
        self.xq[0] = log_wo;
        self.xq[1] = log_energy;
        (log_wo, log_energy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Mode;

    #[test]
    fn wo_scalar_round_trip_is_close() {
        let c2const = C2Const::for_mode(Mode::Mode3200);
        let wo = 2.0 * std::f32::consts::PI / 100.0;
        let idx = encode_wo_scalar(&c2const, wo);
        let back = decode_wo_scalar(&c2const, idx);
        assert!((back - wo).abs() / wo < 0.05);
    }

    #[test]
    fn energy_scalar_round_trip_is_close() {
        let e = 1500.0f32;
        let idx = encode_energy_scalar(e);
        let back = decode_energy_scalar(idx);
        assert!((back.log10() - e.log10()).abs() < 0.2);
    }

    #[test]
    fn joint_predictor_round_trips_index() {
        let mut enc = WoEnergyPredictor::default();
        let mut dec = WoEnergyPredictor::default();
        for _ in 0..5 {
            let idx = enc.encode(0.1, 2.0);
            let (wo, e) = dec.decode(idx);
            assert!(wo.is_finite() && e.is_finite());
        }
    }
}
