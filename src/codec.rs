//! Public `Encoder`/`Decoder` types and per-mode dispatch (§3, §5, §6).
//!
//! Per the design notes, mode-specific behaviour is a `match` over the
//! closed [`Mode`] enum rather than a trait object — the set of modes is
//! fixed at compile time.

use num_complex::Complex32;
use tracing::{debug, trace, warn};

use crate::analyser::analyse_one_frame;
use crate::bits::BitUnpacker;
use crate::config::CodecConfig;
use crate::consts::{BER_SOFTMUTE_BW_EXPAND_HZ, BER_SOFTMUTE_THRESH, NEWAMP1_PHASE_NFFT};
use crate::error::{CodecError, Result};
use crate::fft::FftPair;
use crate::lpc::speech_to_lpc;
use crate::lsp::{bw_expand_lsps, check_lsp_order, lpc_to_lsp, lsp_to_lpc};
use crate::modes::classical::{Frame1200, Frame1300, Frame1400, Frame1600, Frame2400, Frame3200};
use crate::modes::newamp1_mode::Frame700C;
use crate::modes::newamp2_mode::Frame450;
use crate::newamp1;
use crate::newamp2;
use crate::phase::{aks_to_amplitudes, lpc_spectrum, phase_synth_zero_order, postfilter, sample_phase};
use crate::quantize::{
    decode_energy_scalar, decode_lspd_scalar, decode_lsps_scalar, decode_lsps_vq, decode_wo_scalar,
    encode_energy_scalar, encode_lspd_scalar, encode_lsps_scalar, encode_lsps_vq, encode_wo_scalar,
    WoEnergyPredictor,
};
use crate::rng::Lcg;
use crate::synth::{ear_protection, synthesise, to_pcm};
use crate::types::{check_len, C2Const, Mode, Model};
use crate::window::{analysis_window, synthesis_window};

/// Bit position of a mode's spare bit, if any (§10.3). Pass-through slot
/// the core never reads itself.
pub fn spare_bit_index(mode: Mode) -> Option<usize> {
    mode.spare_bit_range().map(|r| r.start)
}

/// Overwrite a mode's spare bit (if any) in an already-packed frame.
pub fn rebuild_spare_bit(mode: Mode, bytes: &mut [u8], value: bool) {
    let Some(pos) = spare_bit_index(mode) else { return };
    let byte = pos / 8;
    let shift = 7 - (pos % 8);
    if byte >= bytes.len() {
        return;
    }
    if value {
        bytes[byte] |= 1 << shift;
    } else {
        bytes[byte] &= !(1 << shift);
    }
}

/// Which sub-frame indices within a packed frame carry an explicit
/// Wo/energy instant, and how many sub-frames' voicing bits are
/// transmitted independently. See `codec.rs` module docs / `DESIGN.md`
/// for the resolved interpolation convention this implies.
struct ClassicalLayout {
    instants: &'static [usize],
    voiced_bits: usize,
}

fn classical_layout(mode: Mode) -> ClassicalLayout {
    match mode {
        Mode::Mode3200 => ClassicalLayout { instants: &[1], voiced_bits: 2 },
        Mode::Mode2400 => ClassicalLayout { instants: &[1], voiced_bits: 2 },
        Mode::Mode1600 => ClassicalLayout { instants: &[1, 3], voiced_bits: 2 },
        Mode::Mode1400 => ClassicalLayout { instants: &[1, 3], voiced_bits: 2 },
        Mode::Mode1300 => ClassicalLayout { instants: &[3], voiced_bits: 4 },
        Mode::Mode1200 => ClassicalLayout { instants: &[1, 3], voiced_bits: 2 },
        _ => unreachable!("classical_layout called for a non-classical mode"),
    }
}

/// Map each analysed sub-frame to the explicit instant that speaks for
/// it: the first half of the sub-frames takes `instants[0]`, the second
/// half (if any) takes `instants[1]`.
fn instant_for_subframe(sf: usize, m: usize, num_instants: usize) -> usize {
    if num_instants == 1 {
        0
    } else {
        (sf * num_instants) / m
    }
}

/// Shared per-instance analysis/synthesis machinery built once at
/// construction and reused every call.
struct Geometry {
    c2const: C2Const,
    fft_enc: FftPair,
    fft_dec: FftPair,
    w: Vec<f32>,
    big_w: Vec<Complex32>,
    pn: Vec<f32>,
}

impl Geometry {
    fn new(mode: Mode) -> Self {
        let c2const = C2Const::for_mode(mode);
        let fft_enc = FftPair::new(crate::consts::FFT_ENC);
        let fft_dec = FftPair::new(crate::consts::FFT_DEC);
        let (w, big_w) = analysis_window(&c2const, &fft_enc);
        let pn = synthesis_window(&c2const);
        Self { c2const, fft_enc, fft_dec, w, big_w, pn }
    }
}

/// Encodes PCM into packed codec2 frames. Owns all its buffers
/// exclusively; safe to use concurrently with a separate `Decoder`
/// instance but is not itself `Sync` (§5).
pub struct Encoder {
    config: CodecConfig,
    geometry: Geometry,
    sn: Vec<f32>,
    woe_predictor: WoEnergyPredictor,
    newamp1_eq: newamp1::Equalizer,
    rate_k1_freqs: [f32; crate::consts::NEWAMP1_K],
    rate_k2_freqs: [f32; crate::consts::NEWAMP2_K],
    var_sum: f64,
    var_count: u64,
}

impl Encoder {
    /// Construct an encoder for `config.mode()`. Fails only at
    /// construction (§7); every later call is total.
    pub fn new(config: CodecConfig) -> Result<Self> {
        let config = config.for_encode(true);
        config.validate()?;
        let mode = config.mode();
        debug!(mode = %mode, "encoder created");
        Ok(Self {
            geometry: Geometry::new(mode),
            sn: vec![0.0; C2Const::for_mode(mode).m_pitch],
            woe_predictor: WoEnergyPredictor::default(),
            newamp1_eq: newamp1::Equalizer::new(),
            rate_k1_freqs: newamp1::rate_k_sample_freqs_hz(),
            rate_k2_freqs: newamp2::rate_k_sample_freqs_hz(false),
            var_sum: 0.0,
            var_count: 0,
            config,
        })
    }

    pub fn mode(&self) -> Mode {
        self.config.mode()
    }

    pub fn samples_per_frame(&self) -> usize {
        self.mode().samples_per_frame()
    }

    pub fn bits_per_frame(&self) -> usize {
        self.mode().bits_per_frame()
    }

    /// Mean squared newamp1 VQ quantisation error since the last reset
    /// (§6 `get_var`); zero, and meaningless, for non-newamp1 modes.
    pub fn get_var(&self) -> f32 {
        if self.var_count == 0 {
            0.0
        } else {
            (self.var_sum / self.var_count as f64) as f32
        }
    }

    /// Bit position of this mode's spare bit, if any (§10.3).
    pub fn get_spare_bit_index(&self) -> Option<usize> {
        spare_bit_index(self.mode())
    }

    /// Overwrite this mode's spare bit in an already-packed frame.
    pub fn rebuild_spare_bit(&self, frame_bytes: &mut [u8], value: bool) {
        rebuild_spare_bit(self.mode(), frame_bytes, value);
    }

    fn analyse_subframes(&mut self, pcm: &[i16]) -> Vec<Model> {
        let c2const = self.geometry.c2const;
        let n_samp = c2const.n_samp;
        let m = self.mode().sub_frames();
        let mut models = Vec::with_capacity(m);
        for sf in 0..m {
            let chunk = &pcm[sf * n_samp..(sf + 1) * n_samp];
            self.sn.copy_within(n_samp.., 0);
            let tail = self.sn.len() - n_samp;
            for (slot, &s) in self.sn[tail..].iter_mut().zip(chunk.iter()) {
                *slot = s as f32;
            }
            let model = analyse_one_frame(
                &c2const,
                &self.sn,
                &self.geometry.w,
                &self.geometry.big_w,
                &self.geometry.fft_enc,
            );
            models.push(model);
        }
        models
    }

    /// Encode exactly `samples_per_frame()` PCM samples into
    /// `frame_bytes` (`bytes_per_frame()` long).
    pub fn encode(&mut self, frame_bytes: &mut [u8], pcm: &[i16]) -> Result<()> {
        check_len(self.samples_per_frame(), pcm.len())?;
        check_len(self.mode().bytes_per_frame(), frame_bytes.len())?;
        trace!(samples = pcm.len(), "encode: entry");

        let models = self.analyse_subframes(pcm);

        let bytes = match self.mode() {
            Mode::Mode700C => self.encode_newamp1(&models),
            Mode::Mode450 => self.encode_newamp2(&models),
            Mode::Mode450Pwb => unreachable!("rejected at construction"),
            _ => self.encode_classical(&models),
        };

        frame_bytes.copy_from_slice(&bytes);
        trace!(bytes = frame_bytes.len(), "encode: exit");
        Ok(())
    }

    fn encode_classical(&mut self, models: &[Model]) -> Vec<u8> {
        let mode = self.mode();
        let layout = classical_layout(mode);
        let m = models.len();

        let windowed: Vec<f32> =
            self.sn.iter().zip(self.geometry.w.iter()).map(|(s, wv)| s * wv).collect();
        let (a, e) = speech_to_lpc(&windowed);
        let lsp = lpc_to_lsp(&a);

        let voiced: Vec<bool> = if layout.voiced_bits == m {
            models.iter().map(|mm| mm.voiced).collect()
        } else {
            layout
                .instants
                .iter()
                .map(|&i| models[i.min(m - 1)].voiced)
                .collect()
        };

        let woe_values: Vec<(f32, f32)> = layout
            .instants
            .iter()
            .map(|&i| {
                let wo = models[i.min(m - 1)].wo;
                (wo, e)
            })
            .collect();

        match mode {
            Mode::Mode3200 => {
                let (wo, en) = woe_values[0];
                let f = Frame3200 {
                    voiced: [voiced[0], voiced[1]],
                    wo_idx: encode_wo_scalar(&self.geometry.c2const, wo),
                    e_idx: encode_energy_scalar(en),
                    lspd_idx: encode_lspd_scalar(&lsp),
                };
                f.pack()
            }
            Mode::Mode2400 => {
                let (wo, en) = woe_values[0];
                let idx = self.woe_predictor.encode(wo.ln(), en.ln());
                let f = Frame2400 {
                    voiced: [voiced[0], voiced[1]],
                    woe_idx: idx,
                    lsp_idx: encode_lsps_scalar(&lsp),
                    spare: 0,
                };
                f.pack()
            }
            Mode::Mode1600 => {
                let f = Frame1600 {
                    voiced: [voiced[0], voiced[1]],
                    wo_idx: [
                        encode_wo_scalar(&self.geometry.c2const, woe_values[0].0),
                        encode_wo_scalar(&self.geometry.c2const, woe_values[1].0),
                    ],
                    e_idx: [encode_energy_scalar(woe_values[0].1), encode_energy_scalar(woe_values[1].1)],
                    lsp_idx: encode_lsps_scalar(&lsp),
                };
                f.pack()
            }
            Mode::Mode1400 => {
                let i0 = self.woe_predictor.encode(woe_values[0].0.ln(), woe_values[0].1.ln());
                let i1 = self.woe_predictor.encode(woe_values[1].0.ln(), woe_values[1].1.ln());
                let f = Frame1400 {
                    voiced: [voiced[0], voiced[1]],
                    woe_idx: [i0, i1],
                    lsp_idx: encode_lsps_scalar(&lsp),
                    spare: 0,
                };
                f.pack()
            }
            Mode::Mode1300 => {
                let (wo, en) = woe_values[0];
                let f = Frame1300 {
                    voiced: [voiced[0], voiced[1], voiced[2], voiced[3]],
                    wo_idx: encode_wo_scalar(&self.geometry.c2const, wo),
                    e_idx: encode_energy_scalar(en),
                    lsp_idx: encode_lsps_scalar(&lsp),
                };
                f.pack(self.config.gray())
            }
            Mode::Mode1200 => {
                let i0 = self.woe_predictor.encode(woe_values[0].0.ln(), woe_values[0].1.ln());
                let i1 = self.woe_predictor.encode(woe_values[1].0.ln(), woe_values[1].1.ln());
                let f = Frame1200 {
                    voiced: [voiced[0], voiced[1]],
                    woe_idx: [i0, i1],
                    lsp_vq_idx: encode_lsps_vq(&lsp),
                    spare: 0,
                };
                f.pack()
            }
            _ => unreachable!(),
        }
    }

    fn encode_newamp1(&mut self, models: &[Model]) -> Vec<u8> {
        let c2const = self.geometry.c2const;
        let last = models.last().expect("newamp1 always analyses >=1 sub-frame");
        let rate_k = newamp1::model_to_rate_k(last, c2const.fs, &self.rate_k1_freqs);
        let (mut no_mean, mean) = newamp1::remove_mean(&rate_k);
        self.newamp1_eq.enabled = self.config.newamp1_equalizer();
        self.newamp1_eq.apply(&mut no_mean);

        let (i0, i1) = newamp1::encode_vq(&no_mean);
        let decoded_no_mean = newamp1::decode_vq(i0, i1);
        let err: f32 =
            no_mean.iter().zip(decoded_no_mean.iter()).map(|(a, b)| (a - b) * (a - b)).sum();
        self.var_sum += (err / no_mean.len() as f32) as f64;
        self.var_count += 1;

        let mean_idx = newamp1::encode_mean(mean);
        let wov_idx = newamp1::encode_wo_voicing(&c2const, last.wo, last.voiced);

        let f = Frame700C { vq_idx: (i0, i1), mean_idx, wov_idx };
        f.pack()
    }

    fn encode_newamp2(&mut self, models: &[Model]) -> Vec<u8> {
        let c2const = self.geometry.c2const;
        let last = models.last().expect("newamp2 always analyses >=1 sub-frame");

        let per_subframe_hf: Vec<f32> = models
            .iter()
            .map(|m| {
                let rk = newamp2::model_to_rate_k(m, c2const.fs, &self.rate_k2_freqs);
                let (hf, n) =
                    rk.iter().zip(self.rate_k2_freqs.iter()).filter(|(_, &f)| f > 300.0).fold(
                        (0.0f32, 0u32),
                        |(s, n), (v, _)| (s + v, n + 1),
                    );
                if n > 0 {
                    hf / n as f32
                } else {
                    0.0
                }
            })
            .collect();
        let plosive_at = newamp2::detect_plosive(&per_subframe_hf);

        let representative = plosive_at.map_or(last, |i| &models[i]);
        let rate_k = newamp2::model_to_rate_k(representative, c2const.fs, &self.rate_k2_freqs);
        let (no_mean, mean) = newamp2::remove_mean(&rate_k);
        let vq_idx = newamp2::encode_vq(&no_mean);
        let mean_idx = newamp2::encode_mean(mean);
        let wovp_idx = newamp2::encode_wo_voicing(
            &c2const,
            representative.wo,
            representative.voiced,
            plosive_at.is_some(),
        );

        let f = Frame450 { vq_idx, mean_idx, wovp_idx };
        f.pack()
    }
}

/// Decodes packed codec2 frames back into PCM. Owns all its buffers
/// exclusively; see [`Encoder`] for the concurrency model.
pub struct Decoder {
    config: CodecConfig,
    geometry: Geometry,
    sn_: Vec<f32>,
    woe_predictor: WoEnergyPredictor,
    ex_phase: f32,
    bg_est: f32,
    rng: Lcg,
    newamp1_phase_fft: FftPair,
    prev_rate_k1: Vec<f32>,
    prev_wo_voiced1: (f32, bool),
    prev_rate_k2: Vec<f32>,
    prev_wo_voiced2: (f32, bool),
    rate_k1_freqs: [f32; crate::consts::NEWAMP1_K],
    rate_k2_freqs: [f32; crate::consts::NEWAMP2_K],
}

impl Decoder {
    /// Construct a decoder for `config.mode()`. Unlike [`Encoder::new`],
    /// `Mode450Pwb` is legal here (§4.7/§9).
    pub fn new(config: CodecConfig) -> Result<Self> {
        let config = config.for_encode(false);
        config.validate()?;
        let mode = config.mode();
        debug!(mode = %mode, "decoder created");
        let c2const = C2Const::for_mode(mode);
        let wideband = matches!(mode, Mode::Mode450Pwb);
        Ok(Self {
            geometry: Geometry::new(mode),
            sn_: vec![0.0; 2 * c2const.n_samp],
            woe_predictor: WoEnergyPredictor::default(),
            ex_phase: 0.0,
            bg_est: 0.0,
            rng: Lcg::new(),
            newamp1_phase_fft: FftPair::new(NEWAMP1_PHASE_NFFT),
            prev_rate_k1: vec![0.0; crate::consts::NEWAMP1_K],
            prev_wo_voiced1: (c2const.wo_min, false),
            prev_rate_k2: vec![0.0; crate::consts::NEWAMP2_K],
            prev_wo_voiced2: (c2const.wo_min, false),
            rate_k1_freqs: newamp1::rate_k_sample_freqs_hz(),
            rate_k2_freqs: newamp2::rate_k_sample_freqs_hz(wideband),
            config,
        })
    }

    pub fn mode(&self) -> Mode {
        self.config.mode()
    }

    pub fn samples_per_frame(&self) -> usize {
        self.mode().samples_per_frame()
    }

    pub fn bits_per_frame(&self) -> usize {
        self.mode().bits_per_frame()
    }

    pub fn set_natural_or_gray(&mut self, gray: bool) {
        self.config = self.config.clone().with_natural_or_gray(gray);
    }

    /// Enable/disable the optional soft-decision-bit buffer (§6).
    pub fn set_softdec(&mut self, enable: bool) {
        self.config = self.config.clone().with_softdec(enable);
    }

    /// Override the LPC post-filter parameters used by classical-mode
    /// decode (§4.4/§6 `set_lpc_post_filter`).
    pub fn set_lpc_post_filter(&mut self, enable: bool, bass_boost: bool, beta: f32, gamma: f32) {
        self.config = self.config.clone().with_lpc_post_filter(enable, bass_boost, beta, gamma);
    }

    /// Toggle the 700C rate-K equaliser (§6).
    pub fn set_newamp1_equalizer(&mut self, enable: bool) {
        self.config = self.config.clone().with_newamp1_equalizer(enable);
    }

    /// Toggle the 700C/450 rate-K post-filter (§6).
    pub fn set_newamp1_post_filter(&mut self, enable: bool) {
        self.config = self.config.clone().with_newamp1_post_filter(enable);
    }

    /// Extract decoded frame energy without running full synthesis
    /// (§6 `get_energy`). Returns 0 for modes without a direct energy
    /// field in their smallest coded instant.
    pub fn get_energy(&mut self, frame_bytes: &[u8]) -> f32 {
        match self.mode() {
            Mode::Mode3200 => {
                let f = Frame3200::unpack(frame_bytes);
                decode_energy_scalar(f.e_idx)
            }
            Mode::Mode2400 => {
                let f = Frame2400::unpack(frame_bytes);
                let (_, log_e) = self.woe_predictor.decode(f.woe_idx);
                log_e.exp()
            }
            Mode::Mode1600 => {
                let f = Frame1600::unpack(frame_bytes);
                decode_energy_scalar(f.e_idx[1])
            }
            Mode::Mode1300 => {
                let f = Frame1300::unpack(frame_bytes, self.config.gray());
                decode_energy_scalar(f.e_idx)
            }
            _ => 0.0,
        }
    }

    /// Bit position of this mode's spare bit, if any (§10.3).
    pub fn get_spare_bit_index(&self) -> Option<usize> {
        spare_bit_index(self.mode())
    }

    /// Overwrite this mode's spare bit in an already-packed frame.
    pub fn rebuild_spare_bit(&self, frame_bytes: &mut [u8], value: bool) {
        rebuild_spare_bit(self.mode(), frame_bytes, value);
    }

    /// Decode one frame with no bit-error hint.
    pub fn decode(&mut self, pcm: &mut [i16], frame_bytes: &[u8]) -> Result<()> {
        self.decode_ber(pcm, frame_bytes, 0.0)
    }

    /// Decode one frame, applying the soft-mute mitigation of §7 when
    /// `ber_est` exceeds the mode's threshold.
    pub fn decode_ber(&mut self, pcm: &mut [i16], frame_bytes: &[u8], ber_est: f32) -> Result<()> {
        check_len(self.samples_per_frame(), pcm.len())?;
        trace!(bytes = frame_bytes.len(), "decode: entry");

        let models = self.finalize_models(frame_bytes, ber_est)?;
        let n_samp = self.geometry.c2const.n_samp;
        let mut out = Vec::with_capacity(pcm.len());
        for model in models {
            synthesise(&model, &mut self.sn_, &self.geometry.pn, n_samp, &self.geometry.fft_dec);
            let mut pcm_f: Vec<f32> = self.sn_[..n_samp].to_vec();
            let peak_before = pcm_f.iter().fold(0.0f32, |m, &v| m.max(v.abs()));
            ear_protection(&mut pcm_f);
            if peak_before > 30000.0 {
                warn!(peak_before, "ear protection attenuated a frame");
            }
            out.extend(to_pcm(&pcm_f, n_samp));
        }
        pcm.copy_from_slice(&out);
        trace!(samples = pcm.len(), "decode: exit");
        Ok(())
    }

    /// Mode-dispatch, soft-mute forcing, and phase/post-filter stages of
    /// decode, stopping short of OLA synthesis — the shared core behind
    /// [`Decoder::decode_ber`], split out so tests can inspect the final
    /// per-sub-frame voicing/amplitude state directly.
    fn finalize_models(&mut self, frame_bytes: &[u8], ber_est: f32) -> Result<Vec<Model>> {
        if !(0.0..=1.0).contains(&ber_est) {
            return Err(CodecError::InvalidBitErrorRate { value: ber_est });
        }
        check_len(self.mode().bytes_per_frame(), frame_bytes.len())?;

        let soft_mute = self.mode().supports_ber_softmute() && ber_est > BER_SOFTMUTE_THRESH;
        if soft_mute {
            warn!(ber_est, "bit-error-rate soft-mute triggered");
        }

        let models = match self.mode() {
            Mode::Mode700C => self.decode_newamp1(frame_bytes),
            Mode::Mode450 | Mode::Mode450Pwb => self.decode_newamp2(frame_bytes),
            _ => self.decode_classical(frame_bytes, soft_mute),
        };

        let n_samp = self.geometry.c2const.n_samp;
        let mut out = Vec::with_capacity(models.len());
        for (mut model, h) in models {
            if soft_mute {
                model.voiced = false;
                model.a.iter_mut().for_each(|a| *a *= 0.1);
            }

            phase_synth_zero_order(&mut model, &mut self.ex_phase, &h, n_samp, &mut self.rng);
            postfilter(&mut model, &mut self.bg_est, &mut self.rng);
            out.push(model);
        }
        Ok(out)
    }

    fn decode_classical(&mut self, frame_bytes: &[u8], soft_mute: bool) -> Vec<(Model, Vec<Complex32>)> {
        let mode = self.mode();
        let layout = classical_layout(mode);
        let c2const = self.geometry.c2const;
        let m = mode.sub_frames();

        let (voiced, wo_e, mut lsp): (Vec<bool>, Vec<(f32, f32)>, Vec<f32>) = match mode {
            Mode::Mode3200 => {
                let f = Frame3200::unpack(frame_bytes);
                let wo = decode_wo_scalar(&c2const, f.wo_idx);
                let e = decode_energy_scalar(f.e_idx);
                (f.voiced.to_vec(), vec![(wo, e)], decode_lspd_scalar(&f.lspd_idx))
            }
            Mode::Mode2400 => {
                let f = Frame2400::unpack(frame_bytes);
                let (log_wo, log_e) = self.woe_predictor.decode(f.woe_idx);
                (f.voiced.to_vec(), vec![(log_wo.exp(), log_e.exp())], decode_lsps_scalar(&f.lsp_idx))
            }
            Mode::Mode1600 => {
                let f = Frame1600::unpack(frame_bytes);
                let wo_e = vec![
                    (decode_wo_scalar(&c2const, f.wo_idx[0]), decode_energy_scalar(f.e_idx[0])),
                    (decode_wo_scalar(&c2const, f.wo_idx[1]), decode_energy_scalar(f.e_idx[1])),
                ];
                (f.voiced.to_vec(), wo_e, decode_lsps_scalar(&f.lsp_idx))
            }
            Mode::Mode1400 => {
                let f = Frame1400::unpack(frame_bytes);
                let (lw0, le0) = self.woe_predictor.decode(f.woe_idx[0]);
                let (lw1, le1) = self.woe_predictor.decode(f.woe_idx[1]);
                (
                    f.voiced.to_vec(),
                    vec![(lw0.exp(), le0.exp()), (lw1.exp(), le1.exp())],
                    decode_lsps_scalar(&f.lsp_idx),
                )
            }
            Mode::Mode1300 => {
                let f = Frame1300::unpack(frame_bytes, self.config.gray());
                let wo = decode_wo_scalar(&c2const, f.wo_idx);
                let e = decode_energy_scalar(f.e_idx);
                (f.voiced.to_vec(), vec![(wo, e)], decode_lsps_scalar(&f.lsp_idx))
            }
            Mode::Mode1200 => {
                let f = Frame1200::unpack(frame_bytes);
                let (lw0, le0) = self.woe_predictor.decode(f.woe_idx[0]);
                let (lw1, le1) = self.woe_predictor.decode(f.woe_idx[1]);
                let (i0, i1) = f.lsp_vq_idx;
                (
                    f.voiced.to_vec(),
                    vec![(lw0.exp(), le0.exp()), (lw1.exp(), le1.exp())],
                    decode_lsps_vq(i0, i1),
                )
            }
            _ => unreachable!(),
        };

        check_lsp_order(&mut lsp);
        if soft_mute {
            bw_expand_lsps(&mut lsp, BER_SOFTMUTE_BW_EXPAND_HZ, BER_SOFTMUTE_BW_EXPAND_HZ, c2const.fs);
        }

        let post = self.config.lpc_post_filter();
        let a = lsp_to_lpc(&lsp);
        let aw = lpc_spectrum(&a, &self.geometry.fft_enc);

        (0..m)
            .map(|sf| {
                let instant = instant_for_subframe(sf, m, layout.instants.len());
                let (wo, e) = wo_e[instant];
                let mut model = Model::new(wo);
                model.clamp_to(&c2const);
                model.voiced = voiced[if layout.voiced_bits == m { sf } else { instant }];
                aks_to_amplitudes(&mut model, &aw, e, self.geometry.fft_enc.size(), &post);
                let h = sample_phase(&model, &aw, self.geometry.fft_enc.size());
                (model, h)
            })
            .collect()
    }

    fn decode_newamp1(&mut self, frame_bytes: &[u8]) -> Vec<(Model, Vec<Complex32>)> {
        let f = Frame700C::unpack(frame_bytes);
        let c2const = self.geometry.c2const;
        let no_mean = newamp1::decode_vq(f.vq_idx.0, f.vq_idx.1);
        let mean = newamp1::decode_mean(f.mean_idx);
        let rate_k: Vec<f32> = no_mean.iter().map(|v| v + mean).collect();
        let (wo, voiced) = newamp1::decode_wo_voicing(&c2const, f.wov_idx);

        let m = self.mode().sub_frames();
        let mut out = Vec::with_capacity(m);
        for sf in 0..m {
            let frac = (sf + 1) as f32 / m as f32;
            let mut rk = newamp1::interpolate_rate_k(&self.prev_rate_k1, &rate_k, frac);
            if self.config.newamp1_post_filter() {
                newamp1::postfilter_rate_k(&mut rk, 1.2);
            }
            let (sf_wo, sf_voiced) =
                newamp1::interpolate_wo_voicing(&c2const, self.prev_wo_voiced1, (wo, voiced), frac);

            let mut model = Model::new(sf_wo);
            model.clamp_to(&c2const);
            model.voiced = sf_voiced;
            newamp1::rate_k_to_model(&rk, &self.rate_k1_freqs, &mut model, c2const.fs);

            let h = newamp1::minimum_phase_response(&rk, &self.rate_k1_freqs, &model, c2const.fs, &self.newamp1_phase_fft);
            out.push((model, h));
        }
        self.prev_rate_k1 = rate_k;
        self.prev_wo_voiced1 = (wo, voiced);
        out
    }

    fn decode_newamp2(&mut self, frame_bytes: &[u8]) -> Vec<(Model, Vec<Complex32>)> {
        let f = Frame450::unpack(frame_bytes);
        let c2const = self.geometry.c2const;
        let no_mean = newamp2::decode_vq(f.vq_idx);
        let mean = newamp2::decode_mean(f.mean_idx);
        let rate_k: Vec<f32> = no_mean.iter().map(|v| v + mean).collect();
        let (wo, state) = newamp2::decode_wo_voicing(&c2const, f.wovp_idx);
        let (voiced, reset) = match state {
            newamp2::WoVoicing::Unvoiced => (false, false),
            newamp2::WoVoicing::Voiced(_) => (true, false),
            newamp2::WoVoicing::Plosive => (true, true),
        };
        if reset {
            self.prev_wo_voiced2 = (c2const.wo_min, false);
        }

        let m = self.mode().sub_frames();
        let mut out = Vec::with_capacity(m);
        for sf in 0..m {
            let frac = (sf + 1) as f32 / m as f32;
            let rk = newamp2::interpolate(&self.prev_rate_k2, &rate_k, frac);
            let (sf_wo, sf_voiced) =
                newamp1::interpolate_wo_voicing(&c2const, self.prev_wo_voiced2, (wo, voiced), frac);

            let mut model = Model::new(sf_wo);
            model.clamp_to(&c2const);
            model.voiced = sf_voiced;
            newamp2::rate_k_to_model(&rk, &self.rate_k2_freqs, &mut model, c2const.fs);
            let h = newamp1::minimum_phase_response(&rk, &self.rate_k2_freqs, &model, c2const.fs, &self.newamp1_phase_fft);
            out.push((model, h));
        }
        self.prev_rate_k2 = rate_k;
        self.prev_wo_voiced2 = (wo, voiced);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Mode;

    fn silence(mode: Mode) -> Vec<i16> {
        vec![0i16; mode.samples_per_frame()]
    }

    #[test]
    fn round_trip_silence_is_bounded_for_every_mode() {
        for mode in [
            Mode::Mode3200,
            Mode::Mode2400,
            Mode::Mode1600,
            Mode::Mode1400,
            Mode::Mode1300,
            Mode::Mode1200,
            Mode::Mode700C,
            Mode::Mode450,
        ] {
            let mut enc = Encoder::new(CodecConfig::new(mode)).unwrap();
            let mut dec = Decoder::new(CodecConfig::new(mode)).unwrap();
            let mut bytes = vec![0u8; mode.bytes_per_frame()];
            let mut pcm_out = vec![0i16; mode.samples_per_frame()];

            for _ in 0..4 {
                let pcm_in = silence(mode);
                enc.encode(&mut bytes, &pcm_in).unwrap();
                dec.decode(&mut pcm_out, &bytes).unwrap();
            }

            for &s in &pcm_out {
                assert!((s as f32).abs() < 4000.0, "mode {mode}: sample {s}");
            }
        }
    }

    #[test]
    fn mode_450pwb_rejects_encoder_construction() {
        let result = Encoder::new(CodecConfig::new(Mode::Mode450Pwb));
        assert!(result.is_err());
    }

    #[test]
    fn mode_450pwb_allows_decoder_construction() {
        let result = Decoder::new(CodecConfig::new(Mode::Mode450Pwb));
        assert!(result.is_ok());
    }

    #[test]
    fn soft_mute_lowers_rms_and_clears_voicing() {
        let mode = Mode::Mode1300;
        let mut enc = Encoder::new(CodecConfig::new(mode)).unwrap();
        let mut dec_clean = Decoder::new(CodecConfig::new(mode)).unwrap();
        let mut dec_noisy = Decoder::new(CodecConfig::new(mode)).unwrap();

        let mut bytes = vec![0u8; mode.bytes_per_frame()];
        let period = 50i16;
        let pcm_in: Vec<i16> = (0..mode.samples_per_frame())
            .map(|i| ((i as f32 * std::f32::consts::TAU / period as f32).sin() * 8000.0) as i16)
            .collect();
        enc.encode(&mut bytes, &pcm_in).unwrap();

        let mut clean = vec![0i16; mode.samples_per_frame()];
        let mut noisy = vec![0i16; mode.samples_per_frame()];
        dec_clean.decode_ber(&mut clean, &bytes, 0.0).unwrap();
        dec_noisy.decode_ber(&mut noisy, &bytes, 0.5).unwrap();

        let rms = |s: &[i16]| {
            (s.iter().map(|&v| (v as f64) * (v as f64)).sum::<f64>() / s.len() as f64).sqrt()
        };
        assert!(rms(&noisy) < rms(&clean), "noisy rms {} vs clean rms {}", rms(&noisy), rms(&clean));

        let mut dec_voicing = Decoder::new(CodecConfig::new(mode)).unwrap();
        let models = dec_voicing.finalize_models(&bytes, 0.5).unwrap();
        assert!(models.iter().all(|m| !m.voiced), "soft-mute must clear every sub-frame's voicing");
    }

    #[test]
    fn constant_pitch_vowel_wo_estimate_is_within_5_percent() {
        let target_wo = std::f32::consts::TAU / 50.0;
        for mode in [
            Mode::Mode3200,
            Mode::Mode2400,
            Mode::Mode1600,
            Mode::Mode1400,
            Mode::Mode1300,
            Mode::Mode1200,
            Mode::Mode700C,
            Mode::Mode450,
        ] {
            let mut enc = Encoder::new(CodecConfig::new(mode)).unwrap();
            let mut dec = Decoder::new(CodecConfig::new(mode)).unwrap();
            let mut bytes = vec![0u8; mode.bytes_per_frame()];
            let samples_per_frame = mode.samples_per_frame();

            let mut t0 = 0.0f32;
            let mut models = Vec::new();
            for _ in 0..6 {
                let pcm: Vec<i16> = (0..samples_per_frame)
                    .map(|n| {
                        let t = t0 + n as f32;
                        let sample: f32 =
                            (1..=20).map(|m| (1.0 / m as f32) * (m as f32 * target_wo * t).cos()).sum();
                        (sample * 2000.0) as i16
                    })
                    .collect();
                t0 += samples_per_frame as f32;

                enc.encode(&mut bytes, &pcm).unwrap();
                models = dec.finalize_models(&bytes, 0.0).unwrap();
            }

            for model in &models {
                let rel_err = (model.wo - target_wo).abs() / target_wo;
                assert!(
                    rel_err < 0.05,
                    "mode {mode}: estimated wo={}, target={target_wo}, rel_err={rel_err}",
                    model.wo
                );
            }
        }
    }

    #[test]
    fn invalid_ber_is_rejected() {
        let mode = Mode::Mode1300;
        let mut dec = Decoder::new(CodecConfig::new(mode)).unwrap();
        let bytes = vec![0u8; mode.bytes_per_frame()];
        let mut pcm = vec![0i16; mode.samples_per_frame()];
        assert!(dec.decode_ber(&mut pcm, &bytes, 1.5).is_err());
    }

    #[test]
    fn spare_bit_round_trips_through_rebuild() {
        let mode = Mode::Mode2400;
        let mut bytes = vec![0u8; mode.bytes_per_frame()];
        rebuild_spare_bit(mode, &mut bytes, true);
        let idx = spare_bit_index(mode).unwrap();
        let mut u = BitUnpacker::new(&bytes);
        for _ in 0..idx {
            u.pull(1);
        }
        assert_eq!(u.pull(1), 1);
    }
}
