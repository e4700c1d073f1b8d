//! MBE-style voicing decision (§4.3).

use num_complex::Complex32;

use crate::consts::V_THRESH;
use crate::types::{C2Const, Model};

/// Decide voicing for `model` given its harmonic estimate and the frame
/// spectrum `sw` / analysis-window spectrum `big_w` used for the
/// per-harmonic best-fit projection.
pub fn est_voicing_mbe(
    c2const: &C2Const,
    model: &Model,
    sw: &[Complex32],
    big_w: &[Complex32],
    fft_size: usize,
) -> bool {
    let l1k = (model.l as f32 * 1000.0 / (c2const.fs as f32 / 2.0)).round() as usize;
    let l1k = l1k.clamp(1, model.l);
    let l2k = (model.l as f32 * 2000.0 / (c2const.fs as f32 / 2.0)).round() as usize;
    let l4k = (model.l as f32 * 4000.0 / (c2const.fs as f32 / 2.0))
        .round()
        .min(model.l as f32) as usize;

    let mut sig = 0.0f32;
    let mut error = 0.0f32;

    for m in 1..=model.l {
        let am = model.a.get(m).copied().unwrap_or(0.0);
        if m <= l1k {
            sig += am * am;
        }

        let bin_centre = m as f32 * model.wo * fft_size as f32 / (2.0 * std::f32::consts::PI);
        let am_idx = (bin_centre - 0.5) as isize;
        let bm_idx = (bin_centre + 0.5) as isize;
        let am_idx = am_idx.max(0) as usize;
        let bm_idx = (bm_idx as usize).min(fft_size / 2).max(am_idx + 1);

        // Best single complex amplitude Am minimising ||Sw - W*Am||^2:
        // Am = sum(conj(W) * Sw) / sum(|W|^2), summed over this
        // harmonic's bin range, with W taken as the analysis-window
        // spectrum centred on the harmonic.
        let mut num = Complex32::new(0.0, 0.0);
        let mut den = 0.0f32;
        for (offset, bin) in (am_idx..bm_idx).enumerate() {
            let w_idx = offset.min(big_w.len() - 1);
            let w = big_w[w_idx];
            let s = sw.get(bin).copied().unwrap_or(Complex32::new(0.0, 0.0));
            num += w.conj() * s;
            den += w.norm_sqr();
        }
        let best_am = if den > 1e-12 {
            num / den
        } else {
            Complex32::new(0.0, 0.0)
        };

        for (offset, bin) in (am_idx..bm_idx).enumerate() {
            let w_idx = offset.min(big_w.len() - 1);
            let w = big_w[w_idx];
            let s = sw.get(bin).copied().unwrap_or(Complex32::new(0.0, 0.0));
            let diff = s - w * best_am;
            error += diff.norm_sqr();
        }
    }

    if error < 1e-9 {
        error = 1e-9;
    }
    let snr = 10.0 * (sig / error).log10();
    let mut voiced = snr > V_THRESH;

    let elow: f32 = (1..=l2k.min(model.l)).map(|m| model.a[m] * model.a[m]).sum();
    let ehigh: f32 = ((l2k.min(model.l) + 1)..=l4k.max(l2k).min(model.l))
        .map(|m| model.a[m] * model.a[m])
        .sum();
    let eratio = 10.0 * ((elow + 1e-9) / (ehigh + 1e-9)).log10();

    if !voiced && eratio > 10.0 {
        voiced = true;
    } else if voiced && eratio < -10.0 {
        voiced = false;
    } else if voiced && eratio < -4.0 && model.wo <= 60.0 * 2.0 * std::f32::consts::PI / c2const.fs as f32
    {
        voiced = false;
    }

    voiced
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fft::FftPair;
    use crate::types::Mode;

    #[test]
    fn silence_is_never_voiced() {
        let c2const = C2Const::for_mode(Mode::Mode3200);
        let mut model = Model::new(2.0 * std::f32::consts::PI / 100.0);
        model.a.iter_mut().for_each(|a| *a = 0.0);
        let fft = FftPair::new(512);
        let sw = vec![Complex32::new(0.0, 0.0); 512];
        let big_w = vec![Complex32::new(0.0, 0.0); 512];
        let voiced = est_voicing_mbe(&c2const, &model, &sw, &big_w, fft.size());
        assert!(!voiced);
    }
}
