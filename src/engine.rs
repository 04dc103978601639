//! End-to-end Fourier analysis.
//!
//! One call to [`analyze`] validates the spectrum, resolves the frequency
//! variables, expands the configured components, measures them in order,
//! ranks the worst-other tones, and aggregates the scalar figures of
//! merit. The call is pure: identical inputs produce bit-identical
//! results.

use std::collections::BTreeSet;

use num::complex::Complex64;
use tracing::{debug, debug_span};

use crate::component::Component;
use crate::config::AnalysisConfig;
use crate::enums::{AxisType, CompTag, CompType};
use crate::error::{Error, Result};
use crate::expression::{Expression, VarMap};
use crate::measure::{self, band_mask, MaskSet};
use crate::results::{db10_ratio, AnalysisResults, ResultKind, ToneResult, ToneResultKind};

/// Analyzes a spectrum against `cfg`.
///
/// `in_data` is either mean-square magnitudes (`nfft` values for a complex
/// analysis, `nfft/2 + 1` for a real one) or interleaved Re/Im FFT values
/// of twice that length, in which case phase results become available.
pub fn analyze(
    cfg: &AnalysisConfig,
    in_data: &[f64],
    nfft: usize,
    axis_type: AxisType,
) -> Result<AnalysisResults> {
    let span = debug_span!("analyze", nfft, size = in_data.len());
    let _guard = span.enter();
    if nfft == 0 || in_data.is_empty() {
        return Err(Error::Dimension {
            reason: "nfft and data size must be positive".to_string(),
        });
    }
    let msq_owned: Vec<f64>;
    let msq: &[f64];
    let fft_data: Option<Vec<Complex64>>;
    if in_data.len() == nfft || in_data.len() == nfft / 2 + 1 {
        msq = in_data;
        fft_data = None;
    } else if in_data.len() == 2 * nfft || in_data.len() == 2 * (nfft / 2 + 1) {
        let bins: Vec<Complex64> = in_data
            .chunks_exact(2)
            .map(|pair| Complex64::new(pair[0], pair[1]))
            .collect();
        msq_owned = bins.iter().map(Complex64::norm_sqr).collect();
        msq = &msq_owned;
        fft_data = Some(bins);
    } else {
        return Err(Error::Dimension {
            reason: format!(
                "data size {} inconsistent with nfft {nfft}",
                in_data.len()
            ),
        });
    }
    for (i, &x) in msq.iter().enumerate() {
        if !x.is_finite() || x < 0.0 {
            return Err(Error::BadSpectrum {
                reason: format!("magnitude {x} at bin {i}"),
            });
        }
    }
    let cplx = msq.len() == nfft;

    // Variable resolution: fs first, then fdata (fs in scope), then fbin
    // and fshift.
    let mut vars = initialize_vars(cfg, nfft)?;
    let fbin = vars["fbin"];
    let fdata = vars["fdata"];
    let fsample = vars["fs"];
    let fshift = vars["fshift"];

    // Analysis band
    let mut masks = MaskSet::new(cplx, msq.len());
    let ab_center = Expression::parse(cfg.ab_center())?.evaluate(&vars)?;
    let ab_width = Expression::parse(cfg.ab_width())?.evaluate(&vars)?;
    masks.ab = band_mask(cplx, msq.len(), nfft, ab_center, ab_width, fbin, fdata)?;

    // Component expansion. CLK and ILOS fractions may coincide; ILOS owns
    // the tag and `ilos_clk_keys` tells us which ranges to mirror into
    // the CLK mask.
    let comp_set = cfg.generate_comps(cplx)?;

    // Main component loop, up to the first worst-other
    let mut results = AnalysisResults::default();
    let mut carrier: Option<(usize, f64)> = None;
    let mut maxspur: Option<(usize, f64)> = None;
    let mut key_index = 0;
    while key_index < comp_set.keys.len() {
        let key = &comp_set.keys[key_index];
        let comp = &comp_set.comps[key];
        if comp.comp_type() == CompType::WOTone {
            break;
        }
        let tone = match comp {
            Component::Dc { ssb } => {
                let r = measure::measure_dc(*ssb, msq, nfft, fbin, &mut masks)?;
                if r.inband && cfg.dc_as_dist {
                    update_maxspur(key_index, &r, cfg.dc_as_dist, &masks, &mut maxspur)?;
                }
                r
            }
            Component::FixedTone { tag, freq, ssb } => {
                let r = measure::measure_fixed_tone(
                    *tag, freq, *ssb, msq, nfft, &mut masks, &vars,
                )?;
                discover_var(&mut vars, key, *tag, &r)?;
                tone_updates(
                    key,
                    key_index,
                    *tag,
                    &r,
                    cfg.dc_as_dist,
                    &mut masks,
                    &comp_set.ilos_clk_keys,
                    &mut carrier,
                    &mut maxspur,
                )?;
                r
            }
            Component::MaxTone {
                tag,
                center,
                width,
                ssb,
            } => {
                let r = measure::measure_max_tone(
                    *tag, center, width, *ssb, msq, nfft, &mut masks, &vars,
                )?;
                discover_var(&mut vars, key, *tag, &r)?;
                tone_updates(
                    key,
                    key_index,
                    *tag,
                    &r,
                    cfg.dc_as_dist,
                    &mut masks,
                    &comp_set.ilos_clk_keys,
                    &mut carrier,
                    &mut maxspur,
                )?;
                r
            }
            Component::WoTone { .. } => {
                return Err(Error::Internal {
                    reason: "worst-other reached through the main loop".to_string(),
                })
            }
        };
        results.add_tone(key, tone);
        key_index += 1;
    }

    // Worst others, measured then re-keyed in descending magnitude so
    // `wo1` is always the strongest
    let mut wo_search = masks.ab.clone();
    wo_search.subtract(&masks.comp)?;
    masks.wo = wo_search;
    let first_wo_index = key_index;
    let mut wo_tones: Vec<(f64, ToneResult)> = Vec::new();
    for key in &comp_set.keys[first_wo_index..] {
        let comp = &comp_set.comps[key];
        let Component::WoTone { ssb } = comp else {
            return Err(Error::Internal {
                reason: "non-worst-other after the first worst-other".to_string(),
            });
        };
        let r = measure::measure_wo_tone(*ssb, msq, nfft, fbin, fshift, &mut masks)?;
        wo_tones.push((r.get(ToneResultKind::Mag)?, r));
    }
    wo_tones.sort_by(|a, b| b.0.total_cmp(&a.0));
    for (wo_num, (_, r)) in wo_tones.into_iter().enumerate() {
        let new_key = if cfg.wo() == 1 {
            "wo".to_string()
        } else {
            format!("wo{}", wo_num + 1)
        };
        if wo_num == 0 {
            update_maxspur(first_wo_index, &r, cfg.dc_as_dist, &masks, &mut maxspur)?;
        }
        results.add_tone(&new_key, r);
    }

    // Second pass: order index, dBc against the carrier, phase
    let carrier_ms = carrier.map_or(0.0, |(_, ms)| ms);
    let carrier_phase = match carrier {
        Some((ci, _)) => {
            let ckey = &comp_set.keys[ci];
            tone_phase(results.tone(ckey)?, fft_data.as_deref(), cplx, fdata, fshift)?
        }
        None => 0.0,
    };
    for (i, key) in comp_set.keys.iter().enumerate() {
        let phase = tone_phase(results.tone(key)?, fft_data.as_deref(), cplx, fdata, fshift)?;
        let tone = results.tone_mut(key)?;
        let mag = tone.get(ToneResultKind::Mag)?;
        tone.set(ToneResultKind::OrderIndex, i as f64);
        tone.set(ToneResultKind::MagDbc, db10_ratio(mag * mag, carrier_ms));
        tone.set(ToneResultKind::Phase, phase);
        tone.set(ToneResultKind::PhaseC, phase - carrier_phase);
    }

    // A DC-centered axis presents the upper half of the axis as negative
    // frequencies
    if cplx && axis_type == AxisType::DcCenter {
        for key in comp_set.keys.iter() {
            let tone = results.tone_mut(key)?;
            let ffinal = tone.get(ToneResultKind::FFinal)?;
            if fdata <= 2.0 * ffinal {
                tone.set(ToneResultKind::FFinal, ffinal - fdata);
            }
        }
    }

    // Composite masks and scalar aggregation
    finalize_masks(cfg, &mut masks)?;
    let (ab_i1, ab_i2, ab_nbins) = masks.ab.indexes()?;
    let ab_nbins = ab_nbins as f64;
    let ab_width_hz = if cplx {
        ab_nbins * fbin
    } else {
        (fdata / 2.0).min(ab_nbins * fbin)
    };
    let nad_ss = masks.nad.sum(msq)?;
    let noise_ss = masks.noise.sum(msq)?;
    let noise_nbins = masks.noise.count() as f64;
    let signal_ss = masks.tag(CompTag::Signal).sum(msq)?;
    debug!(nad_ss, noise_ss, signal_ss, "aggregating");
    results.set(ResultKind::SignalType, if cplx { 1.0 } else { 0.0 });
    results.set(ResultKind::Nfft, nfft as f64);
    results.set(ResultKind::DataSize, msq.len() as f64);
    results.set(ResultKind::FBin, fbin);
    results.set(ResultKind::FData, fdata);
    results.set(ResultKind::FSample, fsample);
    results.set(ResultKind::FShift, fshift);
    results.set(ResultKind::Fsnr, db10_ratio(1.0, noise_ss));
    results.set(ResultKind::Snr, db10_ratio(signal_ss, noise_ss));
    results.set(ResultKind::Sinad, db10_ratio(signal_ss, nad_ss));
    results.set(
        ResultKind::Sfdr,
        db10_ratio(carrier_ms, maxspur.map_or(0.0, |(_, ms)| ms)),
    );
    results.set(
        ResultKind::Abn,
        db10_ratio(noise_ss / noise_nbins.max(1.0), 1.0),
    );
    results.set(ResultKind::Nsd, db10_ratio(noise_ss / ab_width_hz, 1.0));
    results.set(
        ResultKind::CarrierIndex,
        carrier.map_or(-1.0, |(i, _)| i as f64),
    );
    results.set(
        ResultKind::MaxSpurIndex,
        maxspur.map_or(-1.0, |(i, _)| i as f64),
    );
    results.set(ResultKind::AbWidth, ab_width_hz);
    results.set(ResultKind::AbI1, ab_i1 as f64);
    results.set(ResultKind::AbI2, ab_i2 as f64);
    results.set(ResultKind::AbNBins, ab_nbins);
    results.set(ResultKind::AbRss, masks.ab.root_sum(msq)?);
    results.set(
        ResultKind::SignalNBins,
        masks.tag(CompTag::Signal).count() as f64,
    );
    results.set(ResultKind::SignalRss, signal_ss.sqrt());
    results.set(ResultKind::ClkNBins, masks.tag(CompTag::CLK).count() as f64);
    results.set(ResultKind::ClkRss, masks.tag(CompTag::CLK).root_sum(msq)?);
    results.set(ResultKind::HdNBins, masks.tag(CompTag::HD).count() as f64);
    results.set(ResultKind::HdRss, masks.tag(CompTag::HD).root_sum(msq)?);
    results.set(
        ResultKind::IlosNBins,
        masks.tag(CompTag::ILOS).count() as f64,
    );
    results.set(ResultKind::IlosRss, masks.tag(CompTag::ILOS).root_sum(msq)?);
    results.set(
        ResultKind::IlgtNBins,
        masks.tag(CompTag::ILGT).count() as f64,
    );
    results.set(ResultKind::IlgtRss, masks.tag(CompTag::ILGT).root_sum(msq)?);
    results.set(ResultKind::ImdNBins, masks.tag(CompTag::IMD).count() as f64);
    results.set(ResultKind::ImdRss, masks.tag(CompTag::IMD).root_sum(msq)?);
    results.set(
        ResultKind::UserDistNBins,
        masks.tag(CompTag::UserDist).count() as f64,
    );
    results.set(
        ResultKind::UserDistRss,
        masks.tag(CompTag::UserDist).root_sum(msq)?,
    );
    results.set(ResultKind::ThdNBins, masks.thd.count() as f64);
    results.set(ResultKind::ThdRss, masks.thd.root_sum(msq)?);
    results.set(ResultKind::IlvNBins, masks.ilv.count() as f64);
    results.set(ResultKind::IlvRss, masks.ilv.root_sum(msq)?);
    results.set(ResultKind::DistNBins, masks.dist.count() as f64);
    results.set(ResultKind::DistRss, masks.dist.root_sum(msq)?);
    results.set(ResultKind::NoiseNBins, noise_nbins);
    results.set(ResultKind::NoiseRss, noise_ss.sqrt());
    results.set(ResultKind::NadNBins, masks.nad.count() as f64);
    results.set(ResultKind::NadRss, nad_ss.sqrt());
    Ok(results)
}

/// Resolves `fs`, `fdata`, `fbin` and `fshift` on top of the user
/// variables, in dependency order.
fn initialize_vars(cfg: &AnalysisConfig, nfft: usize) -> Result<VarMap> {
    let mut vars: VarMap = cfg.user_vars().clone();
    let fsample = Expression::parse(cfg.fsample())?.evaluate(&vars)?;
    if !(fsample > 0.0) {
        return Err(Error::Eval {
            reason: "fs <= 0".to_string(),
        });
    }
    vars.insert("fs".to_string(), fsample);
    let fdata = Expression::parse(cfg.fdata())?.evaluate(&vars)?;
    if !(fdata > 0.0) {
        return Err(Error::Eval {
            reason: "fdata <= 0".to_string(),
        });
    }
    vars.insert("fdata".to_string(), fdata);
    vars.insert("fbin".to_string(), fdata / nfft as f64);
    let fshift = Expression::parse(cfg.fshift())?.evaluate(&vars)?;
    vars.insert("fshift".to_string(), fshift);
    Ok(vars)
}

/// After a measurement, later components may reference this tone's
/// frequency by key.
fn discover_var(vars: &mut VarMap, key: &str, tag: CompTag, r: &ToneResult) -> Result<()> {
    if matches!(
        tag,
        CompTag::Signal | CompTag::HD | CompTag::IMD | CompTag::UserDist
    ) {
        vars.insert(key.to_string(), r.get(ToneResultKind::Freq)?);
    }
    Ok(())
}

/// Carrier and max-spur bookkeeping shared by fixed and max tones.
#[allow(clippy::too_many_arguments)]
fn tone_updates(
    key: &str,
    key_index: usize,
    tag: CompTag,
    r: &ToneResult,
    dc_as_dist: bool,
    masks: &mut MaskSet,
    ilos_clk_keys: &BTreeSet<String>,
    carrier: &mut Option<(usize, f64)>,
    maxspur: &mut Option<(usize, f64)>,
) -> Result<()> {
    if ilos_clk_keys.contains(key) && r.i1 >= 0 {
        // mirror the ILOS window into the CLK mask; a wrapped window
        // (i1 > i2) splits inside set_range
        masks.tag_mut(CompTag::CLK).set_range(r.i1, r.i2)?;
    }
    if r.inband {
        if tag == CompTag::Signal {
            let mag = r.get(ToneResultKind::Mag)?;
            let ms = mag * mag;
            if carrier.map_or(true, |(_, best)| best < ms) {
                *carrier = Some((key_index, ms));
            }
        } else {
            update_maxspur(key_index, r, dc_as_dist, masks, maxspur)?;
        }
    }
    Ok(())
}

/// A tone is a max-spur candidate when it is in-band and non-Signal
/// (callers ensure this), it is not DC unless DC counts as distortion,
/// and its window does not overlap any Signal window.
fn update_maxspur(
    key_index: usize,
    r: &ToneResult,
    dc_as_dist: bool,
    masks: &MaskSet,
    maxspur: &mut Option<(usize, f64)>,
) -> Result<()> {
    if r.get(ToneResultKind::FFinal)? != 0.0 || dc_as_dist {
        let overlaps_signal = r.i1 >= 0
            && masks
                .tag(CompTag::Signal)
                .overlaps(r.i1 as usize, r.i2 as usize);
        if !overlaps_signal {
            let mag = r.get(ToneResultKind::Mag)?;
            let ms = mag * mag;
            if maxspur.map_or(true, |(_, best)| best < ms) {
                *maxspur = Some((key_index, ms));
            }
        }
    }
    Ok(())
}

/// Phase of a single-bin tone when complex FFT data is available. Real
/// spectra invert the phase when the pre-fold alias lands in the second
/// Nyquist zone.
fn tone_phase(
    r: &ToneResult,
    fft_data: Option<&[Complex64]>,
    cplx: bool,
    fdata: f64,
    fshift: f64,
) -> Result<f64> {
    let Some(fft_data) = fft_data else {
        return Ok(0.0);
    };
    if r.nbins != 1 || r.i1 < 0 || r.i1 as usize >= fft_data.len() {
        return Ok(0.0);
    }
    let mut phase = fft_data[r.i1 as usize].arg();
    if !cplx {
        let f = r.get(ToneResultKind::Freq)? + fshift;
        let f = f - (f / fdata).floor() * fdata;
        if fdata <= 2.0 * f {
            phase = -phase;
        }
    }
    Ok(phase)
}

/// Composite-mask construction. Order matters: the Signal mask restricts
/// to the band first, the NAD mask excludes DC and Signal from the band,
/// every other tag restricts to NAD, and the distortion/noise split
/// follows the `*_as_noise` flags.
fn finalize_masks(cfg: &AnalysisConfig, masks: &mut MaskSet) -> Result<()> {
    let ab = masks.ab.clone();
    masks.tag_mut(CompTag::Signal).intersect_with(&ab)?;
    let sig = masks.tag(CompTag::Signal).clone();
    let mut nad = ab;
    if !cfg.dc_as_dist {
        nad.subtract(masks.tag(CompTag::DC))?;
    }
    nad.subtract(&sig)?;
    for tag in CompTag::ALL {
        if tag != CompTag::Signal {
            masks.tag_mut(tag).intersect_with(&nad)?;
        }
    }
    masks.nad = nad;
    let mut thd = masks.tag(CompTag::HD).clone();
    thd.union_with(masks.tag(CompTag::IMD))?;
    let mut ilv = masks.tag(CompTag::ILOS).clone();
    ilv.union_with(masks.tag(CompTag::ILGT))?;
    let mut dist = thd.clone();
    dist.union_with(masks.tag(CompTag::UserDist))?;
    if cfg.dc_as_dist {
        dist.union_with(masks.tag(CompTag::DC))?;
    }
    if !cfg.clk_as_noise {
        dist.union_with(masks.tag(CompTag::CLK))?;
    }
    if !cfg.ilv_as_noise {
        dist.union_with(&ilv)?;
    }
    let mut noise = masks.nad.clone();
    noise.subtract(&dist)?;
    masks.thd = thd;
    masks.ilv = ilv;
    masks.dist = dist;
    masks.noise = noise;
    Ok(())
}
