//! Per-component measurement over the mean-square spectrum.
//!
//! Each measurement resolves a tone window to bin indexes, sums the
//! mean-square magnitudes inside it, and marks the window in the component
//! and per-tag masks so later searches exclude it. Measurement order
//! therefore matters; the engine drives it.

use tracing::trace;

use crate::constants::{MAX_SSB, MIN_SSB};
use crate::enums::CompTag;
use crate::error::{Error, Result};
use crate::expression::{Expression, VarMap};
use crate::mask::BinMask;
use crate::results::{ToneResult, ToneResultKind};

/// The masks accumulated over one analysis call: the analysis band, the
/// union of all measured components, the worst-other search mask, the
/// composite masks filled in during finalization, and one mask per tag.
pub(crate) struct MaskSet {
    pub ab: BinMask,
    pub comp: BinMask,
    pub wo: BinMask,
    pub nad: BinMask,
    pub thd: BinMask,
    pub ilv: BinMask,
    pub dist: BinMask,
    pub noise: BinMask,
    tags: Vec<BinMask>, // indexed by CompTag discriminant
}

impl MaskSet {
    pub fn new(cplx: bool, size: usize) -> MaskSet {
        let blank = BinMask::for_spectrum(cplx, size);
        MaskSet {
            ab: blank.clone(),
            comp: blank.clone(),
            wo: blank.clone(),
            nad: blank.clone(),
            thd: blank.clone(),
            ilv: blank.clone(),
            dist: blank.clone(),
            noise: blank.clone(),
            tags: vec![blank; CompTag::ALL.len()],
        }
    }

    pub fn tag(&self, tag: CompTag) -> &BinMask {
        &self.tags[tag as usize]
    }

    pub fn tag_mut(&mut self, tag: CompTag) -> &mut BinMask {
        &mut self.tags[tag as usize]
    }
}

/// Reduces `freq` into [0, fs), then folds into [0, fs/2] when `fold`.
/// Folding is strict at fs/2 so the Nyquist frequency maps to itself.
pub(crate) fn alias_fold(freq: f64, fs: f64, fold: bool) -> f64 {
    let freq = freq - (freq / fs).floor() * fs;
    if fold && fs < 2.0 * freq {
        fs - freq
    } else {
        freq
    }
}

/// Resolves a tone window: center in cycles (`ffinal / fbin`) and a
/// single-side-bin count give inclusive left/right bins plus the resolved
/// center, in cycles.
///
/// With `ssb > 0` the center snaps to the nearest half cycle and a
/// half-integer center shrinks the half width by 0.5; with `ssb = 0` it
/// snaps to the nearest whole cycle. The snapped center is re-aliased so
/// windows near the axis edges resolve consistently, and `ssb` is clamped
/// so the window never exceeds the FFT length.
pub(crate) fn lr_bins(nfft: usize, cplx: bool, cycles: f64, ssb: i32) -> (i64, i64, f64) {
    let mut nearest_half_cycle = cycles;
    let mut on_half_cycle = false;
    if ssb > 0 {
        nearest_half_cycle = (nearest_half_cycle * 2.0).round();
        on_half_cycle = (nearest_half_cycle as i64) % 2 != 0;
        nearest_half_cycle *= 0.5;
    } else {
        nearest_half_cycle = nearest_half_cycle.round();
    }
    nearest_half_cycle = alias_fold(nearest_half_cycle, nfft as f64, !cplx);
    let mut max_ssb = (nfft / 2).min(MAX_SSB as usize) as i32;
    if nfft % 2 == 0 && !on_half_cycle {
        // A whole-cycle center with ssb = nfft/2 would cover nfft+1 bins.
        max_ssb -= 1;
    }
    let ssb = ssb.clamp(MIN_SSB, max_ssb);
    let mut half_width = ssb as f64;
    if on_half_cycle {
        half_width -= 0.5;
    }
    let lbin = (nearest_half_cycle - half_width) as i64;
    let rbin = (nearest_half_cycle + half_width) as i64;
    (lbin, rbin, nearest_half_cycle)
}

/// Builds the mask of a band given center and width in Hz: width clamps to
/// [fbin, fdata] and rounds to whole bins; the center aliases onto the
/// axis and snaps to the nearest half bin.
pub(crate) fn band_mask(
    cplx: bool,
    size: usize,
    nfft: usize,
    center_hz: f64,
    width_hz: f64,
    fbin: f64,
    fdata: f64,
) -> Result<BinMask> {
    let mut mask = BinMask::for_spectrum(cplx, size);
    let width = width_hz.clamp(fbin, fdata);
    let width = (width / fbin).round(); // [1, nfft]
    if width as usize == size {
        mask.set_all();
        return Ok(mask);
    }
    let center = alias_fold(center_hz, fdata, !cplx);
    let center = (2.0 * center / fbin).round() / 2.0; // nearest half bin
    let center = alias_fold(center, nfft as f64, !cplx);
    let lbin = (center - width / 2.0).ceil() as i64;
    let rbin = (center + width / 2.0).floor() as i64;
    mask.set_range(lbin, rbin)?;
    Ok(mask)
}

fn scope_var(vars: &VarMap, name: &str) -> Result<f64> {
    vars.get(name).copied().ok_or_else(|| Error::Internal {
        reason: format!("variable '{name}' missing from scope"),
    })
}

/// Magnitude-weighted average frequency over the window, falling back to
/// the window center when the window holds no energy. For a wrapped
/// window the low-side indexes are unwrapped before averaging.
fn weighted_freq(m: &BinMask, msq: &[f64], fbin: f64, center_cycles: f64) -> f64 {
    let size = m.size();
    let ranges: Vec<(usize, usize)> = m.ranges().collect();
    let wrapped = ranges.len() == 2 && ranges[0].0 == 0 && ranges[1].1 == size;
    let mut sum = 0.0;
    let mut weighted = 0.0;
    for &(l, r) in &ranges {
        let offset = if wrapped && l == 0 { size as f64 } else { 0.0 };
        for (i, &x) in msq[l..r].iter().enumerate() {
            sum += x;
            weighted += x * ((l + i) as f64 + offset);
        }
    }
    if sum > 0.0 {
        let mut cycles = weighted / sum;
        if cycles >= size as f64 {
            cycles -= size as f64;
        }
        cycles * fbin
    } else {
        center_cycles * fbin
    }
}

fn fill_tone(
    tag: CompTag,
    freq: f64,
    ffinal: f64,
    fwavg: f64,
    inband: bool,
    indexes: (usize, usize, usize),
    ms: f64,
) -> ToneResult {
    let (i1, i2, nbins) = indexes;
    let mut r = ToneResult::default();
    r.set(ToneResultKind::Tag, tag as i32 as f64);
    r.set(ToneResultKind::Freq, freq);
    r.set(ToneResultKind::FFinal, ffinal);
    r.set(ToneResultKind::FWAvg, fwavg);
    r.set(ToneResultKind::InBand, if inband { 1.0 } else { 0.0 });
    r.set(ToneResultKind::I1, i1 as f64);
    r.set(ToneResultKind::I2, i2 as f64);
    r.set(ToneResultKind::NBins, nbins as f64);
    r.set_mag_ms(ms);
    r
}

/// Measures the DC component: a window centered on bin 0.
pub(crate) fn measure_dc(
    ssb: i32,
    msq: &[f64],
    nfft: usize,
    fbin: f64,
    masks: &mut MaskSet,
) -> Result<ToneResult> {
    let cplx = msq.len() == nfft;
    let (lbin, rbin, center) = lr_bins(nfft, cplx, 0.0, ssb);
    let mut m = BinMask::for_spectrum(cplx, msq.len());
    m.set_range(lbin, rbin)?;
    *masks.tag_mut(CompTag::DC) = m.clone();
    masks.comp.union_with(&m)?;
    let indexes = m.indexes()?;
    let fwavg = weighted_freq(&m, msq, fbin, center);
    let inband = masks.ab.overlaps(indexes.0, indexes.1);
    let ms = m.sum(msq)?;
    Ok(fill_tone(CompTag::DC, 0.0, 0.0, fwavg, inband, indexes, ms))
}

/// Measures a tone at a symbolically specified frequency.
pub(crate) fn measure_fixed_tone(
    tag: CompTag,
    freq_expr: &str,
    ssb: i32,
    msq: &[f64],
    nfft: usize,
    masks: &mut MaskSet,
    vars: &VarMap,
) -> Result<ToneResult> {
    let cplx = msq.len() == nfft;
    let fbin = scope_var(vars, "fbin")?;
    let fdata = scope_var(vars, "fdata")?;
    let fshift = scope_var(vars, "fshift")?;
    let freq = Expression::parse(freq_expr)?.evaluate(vars)?;
    let ffinal = alias_fold(freq + fshift, fdata, !cplx);
    let (lbin, rbin, center) = lr_bins(nfft, cplx, ffinal / fbin, ssb);
    trace!(freq, ffinal, lbin, rbin, "fixed tone window");
    let mut m = BinMask::for_spectrum(cplx, msq.len());
    m.set_range(lbin, rbin)?;
    masks.tag_mut(tag).union_with(&m)?;
    masks.comp.union_with(&m)?;
    let indexes = m.indexes()?;
    let fwavg = weighted_freq(&m, msq, fbin, center);
    let inband = masks.ab.overlaps(indexes.0, indexes.1);
    let ms = m.sum(msq)?;
    Ok(fill_tone(tag, freq, ffinal, fwavg, inband, indexes, ms))
}

/// Measures the largest tone remaining in the analysis band, restricted
/// to the component's own search band.
pub(crate) fn measure_max_tone(
    tag: CompTag,
    center_expr: &str,
    width_expr: &str,
    ssb: i32,
    msq: &[f64],
    nfft: usize,
    masks: &mut MaskSet,
    vars: &VarMap,
) -> Result<ToneResult> {
    let cplx = msq.len() == nfft;
    let fbin = scope_var(vars, "fbin")?;
    let fdata = scope_var(vars, "fdata")?;
    let fshift = scope_var(vars, "fshift")?;
    let center_hz = Expression::parse(center_expr)?.evaluate(vars)?;
    let width_hz = Expression::parse(width_expr)?.evaluate(vars)?;
    let mut search = masks.ab.clone();
    search.subtract(&masks.comp)?;
    let band = band_mask(cplx, msq.len(), nfft, center_hz, width_hz, fbin, fdata)?;
    search.intersect_with(&band)?;
    let found = search.find_max(msq)?;
    let (max_index, lower, upper) = match found {
        Some(hit) => hit,
        None => return Ok(ToneResult::null(tag)),
    };
    let ffinal = max_index as f64 * fbin;
    let freq = ffinal - fshift; // best guess at the pre-shift frequency
    let (lbin, rbin, center) = lr_bins(nfft, cplx, max_index as f64, ssb);
    // A max tone stops when it runs into another component. DC is always
    // measured first at bin 0, so the window never needs to wrap.
    let lbin = lbin.max(lower as i64);
    let rbin = rbin.min(upper as i64);
    trace!(max_index, lbin, rbin, "max tone window");
    let mut m = BinMask::for_spectrum(cplx, msq.len());
    m.set_range(lbin, rbin)?;
    masks.comp.union_with(&m)?;
    masks.tag_mut(tag).union_with(&m)?;
    let indexes = m.indexes()?;
    let fwavg = weighted_freq(&m, msq, fbin, center);
    let inband = masks.ab.overlaps(indexes.0, indexes.1);
    let ms = m.sum(msq)?;
    Ok(fill_tone(tag, freq, ffinal, fwavg, inband, indexes, ms))
}

/// Measures one worst-other tone from the dedicated search mask, removing
/// the window it claims.
pub(crate) fn measure_wo_tone(
    ssb: i32,
    msq: &[f64],
    nfft: usize,
    fbin: f64,
    fshift: f64,
    masks: &mut MaskSet,
) -> Result<ToneResult> {
    let cplx = msq.len() == nfft;
    let found = masks.wo.find_max(msq)?;
    let (max_index, lower, upper) = match found {
        Some(hit) => hit,
        None => return Ok(ToneResult::null(CompTag::Noise)),
    };
    let ffinal = max_index as f64 * fbin;
    let freq = ffinal - fshift;
    let (lbin, rbin, center) = lr_bins(nfft, cplx, max_index as f64, ssb);
    let lbin = lbin.max(lower as i64);
    let rbin = rbin.min(upper as i64);
    let mut m = BinMask::for_spectrum(cplx, msq.len());
    m.set_range(lbin, rbin)?;
    masks.comp.union_with(&m)?;
    masks.wo.subtract(&m)?;
    let indexes = m.indexes()?;
    let fwavg = weighted_freq(&m, msq, fbin, center);
    let ms = m.sum(msq)?;
    // in-band by construction: the search mask never leaves the band
    Ok(fill_tone(CompTag::Noise, freq, ffinal, fwavg, true, indexes, ms))
}
