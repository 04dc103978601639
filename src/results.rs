//! Analysis result containers and dB conversions.
//!
//! Results are two strongly typed maps: scalar metrics keyed by
//! [`ResultKind`] and per-tone records keyed by component key in
//! measurement order. The tone fields most often consulted while masking
//! (`i1`, `i2`, `nbins`, `inband`) are shadowed as typed fields on
//! [`ToneResult`].

use std::collections::BTreeMap;

use num::complex::Complex64;

use crate::constants::{MAX_MS, MAX_RMS, MIN_MS, MIN_RMS};
use crate::error::{Error, Result};

/// `10·log10` of a mean-square value, clipped into the representable
/// window first.
pub fn bounded_db10(ms: f64) -> f64 {
    10.0 * ms.clamp(MIN_MS, MAX_MS).log10()
}

/// `20·log10` of an RMS value, clipped into the representable window
/// first.
pub fn bounded_db20(rms: f64) -> f64 {
    20.0 * rms.clamp(MIN_RMS, MAX_RMS).log10()
}

/// dB magnitude of a complex FFT bin.
pub fn bounded_db(z: Complex64) -> f64 {
    bounded_db10(z.norm_sqr())
}

/// Ratio of two mean-square values in dB, saturating on degenerate
/// numerators/denominators instead of dividing by zero.
pub(crate) fn db10_ratio(msq_num: f64, msq_den: f64) -> f64 {
    use crate::constants::{ABS_MAX_DB, ABS_MIN_DB};
    if msq_num <= 0.0 && msq_den <= 0.0 {
        0.0
    } else if msq_num <= 0.0 {
        ABS_MIN_DB
    } else if msq_den <= 0.0 {
        ABS_MAX_DB
    } else {
        bounded_db10(msq_num / msq_den)
    }
}

/// Keys of the per-tone result map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ToneResultKind {
    OrderIndex,
    Tag,
    Freq,
    FFinal,
    FWAvg,
    I1,
    I2,
    NBins,
    InBand,
    Mag,
    MagDbfs,
    MagDbc,
    Phase,
    PhaseC,
}

impl ToneResultKind {
    pub const ALL: [ToneResultKind; 14] = [
        ToneResultKind::OrderIndex,
        ToneResultKind::Tag,
        ToneResultKind::Freq,
        ToneResultKind::FFinal,
        ToneResultKind::FWAvg,
        ToneResultKind::I1,
        ToneResultKind::I2,
        ToneResultKind::NBins,
        ToneResultKind::InBand,
        ToneResultKind::Mag,
        ToneResultKind::MagDbfs,
        ToneResultKind::MagDbc,
        ToneResultKind::Phase,
        ToneResultKind::PhaseC,
    ];

    /// Field name used in flat `"<tone_key>:<field_name>"` keys.
    pub fn field_name(self) -> &'static str {
        match self {
            ToneResultKind::OrderIndex => "order_index",
            ToneResultKind::Tag => "tag",
            ToneResultKind::Freq => "freq",
            ToneResultKind::FFinal => "ffinal",
            ToneResultKind::FWAvg => "fwavg",
            ToneResultKind::I1 => "i1",
            ToneResultKind::I2 => "i2",
            ToneResultKind::NBins => "nbins",
            ToneResultKind::InBand => "in_band",
            ToneResultKind::Mag => "mag",
            ToneResultKind::MagDbfs => "mag_dbfs",
            ToneResultKind::MagDbc => "mag_dbc",
            ToneResultKind::Phase => "phase",
            ToneResultKind::PhaseC => "phase_c",
        }
    }

    pub fn from_field_name(name: &str) -> Option<ToneResultKind> {
        ToneResultKind::ALL
            .into_iter()
            .find(|k| k.field_name() == name)
    }
}

/// Per-tone measurement record.
#[derive(Debug, Clone, Default)]
pub struct ToneResult {
    values: BTreeMap<ToneResultKind, f64>,
    /// First covered bin (−1 for a null tone).
    pub i1: i64,
    /// Last covered bin (−1 for a null tone).
    pub i2: i64,
    /// Number of covered bins.
    pub nbins: usize,
    /// True when the tone window touches the analysis band.
    pub inband: bool,
}

impl ToneResult {
    pub fn get(&self, kind: ToneResultKind) -> Result<f64> {
        self.values.get(&kind).copied().ok_or_else(|| Error::Key {
            key: kind.field_name().to_string(),
            reason: "not found in tone results".to_string(),
        })
    }

    pub(crate) fn set(&mut self, kind: ToneResultKind, value: f64) {
        self.values.insert(kind, value);
        match kind {
            ToneResultKind::I1 => self.i1 = value as i64,
            ToneResultKind::I2 => self.i2 = value as i64,
            ToneResultKind::NBins => self.nbins = value as usize,
            ToneResultKind::InBand => self.inband = value != 0.0,
            _ => {}
        }
    }

    /// Stores `Mag` (RMS) and `MagDbfs` from a mean-square value.
    pub(crate) fn set_mag_ms(&mut self, ms: f64) {
        self.values.insert(ToneResultKind::Mag, ms.sqrt());
        self.values.insert(ToneResultKind::MagDbfs, bounded_db10(ms));
    }

    /// Record for a tone whose search found nothing.
    pub(crate) fn null(tag: crate::enums::CompTag) -> ToneResult {
        let mut r = ToneResult::default();
        r.set(ToneResultKind::Tag, tag as i32 as f64);
        r.set(ToneResultKind::Freq, 0.0);
        r.set(ToneResultKind::FFinal, 0.0);
        r.set(ToneResultKind::FWAvg, 0.0);
        r.set(ToneResultKind::InBand, 0.0);
        r.set(ToneResultKind::I1, -1.0);
        r.set(ToneResultKind::I2, -1.0);
        r.set(ToneResultKind::NBins, 0.0);
        r.set_mag_ms(0.0);
        r
    }
}

/// Keys of the scalar result map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ResultKind {
    // Metadata
    SignalType,
    Nfft,
    DataSize,
    FBin,
    FData,
    FSample,
    FShift,
    // Primary measurements
    Fsnr,
    Snr,
    Sinad,
    Sfdr,
    Abn,
    Nsd,
    // Carrier and max spur
    CarrierIndex,
    MaxSpurIndex,
    // Analysis band
    AbWidth,
    AbI1,
    AbI2,
    AbNBins,
    AbRss,
    // In-band tag aggregates
    SignalNBins,
    SignalRss,
    ClkNBins,
    ClkRss,
    HdNBins,
    HdRss,
    IlosNBins,
    IlosRss,
    IlgtNBins,
    IlgtRss,
    ImdNBins,
    ImdRss,
    UserDistNBins,
    UserDistRss,
    // In-band composite aggregates
    ThdNBins,
    ThdRss,
    IlvNBins,
    IlvRss,
    DistNBins,
    DistRss,
    NoiseNBins,
    NoiseRss,
    NadNBins,
    NadRss,
}

impl ResultKind {
    pub const ALL: [ResultKind; 44] = [
        ResultKind::SignalType,
        ResultKind::Nfft,
        ResultKind::DataSize,
        ResultKind::FBin,
        ResultKind::FData,
        ResultKind::FSample,
        ResultKind::FShift,
        ResultKind::Fsnr,
        ResultKind::Snr,
        ResultKind::Sinad,
        ResultKind::Sfdr,
        ResultKind::Abn,
        ResultKind::Nsd,
        ResultKind::CarrierIndex,
        ResultKind::MaxSpurIndex,
        ResultKind::AbWidth,
        ResultKind::AbI1,
        ResultKind::AbI2,
        ResultKind::AbNBins,
        ResultKind::AbRss,
        ResultKind::SignalNBins,
        ResultKind::SignalRss,
        ResultKind::ClkNBins,
        ResultKind::ClkRss,
        ResultKind::HdNBins,
        ResultKind::HdRss,
        ResultKind::IlosNBins,
        ResultKind::IlosRss,
        ResultKind::IlgtNBins,
        ResultKind::IlgtRss,
        ResultKind::ImdNBins,
        ResultKind::ImdRss,
        ResultKind::UserDistNBins,
        ResultKind::UserDistRss,
        ResultKind::ThdNBins,
        ResultKind::ThdRss,
        ResultKind::IlvNBins,
        ResultKind::IlvRss,
        ResultKind::DistNBins,
        ResultKind::DistRss,
        ResultKind::NoiseNBins,
        ResultKind::NoiseRss,
        ResultKind::NadNBins,
        ResultKind::NadRss,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ResultKind::SignalType => "signaltype",
            ResultKind::Nfft => "nfft",
            ResultKind::DataSize => "datasize",
            ResultKind::FBin => "fbin",
            ResultKind::FData => "fdata",
            ResultKind::FSample => "fsample",
            ResultKind::FShift => "fshift",
            ResultKind::Fsnr => "fsnr",
            ResultKind::Snr => "snr",
            ResultKind::Sinad => "sinad",
            ResultKind::Sfdr => "sfdr",
            ResultKind::Abn => "abn",
            ResultKind::Nsd => "nsd",
            ResultKind::CarrierIndex => "carrierindex",
            ResultKind::MaxSpurIndex => "maxspurindex",
            ResultKind::AbWidth => "ab_width",
            ResultKind::AbI1 => "ab_i1",
            ResultKind::AbI2 => "ab_i2",
            ResultKind::AbNBins => "ab_nbins",
            ResultKind::AbRss => "ab_rss",
            ResultKind::SignalNBins => "signal_nbins",
            ResultKind::SignalRss => "signal_rss",
            ResultKind::ClkNBins => "clk_nbins",
            ResultKind::ClkRss => "clk_rss",
            ResultKind::HdNBins => "hd_nbins",
            ResultKind::HdRss => "hd_rss",
            ResultKind::IlosNBins => "ilos_nbins",
            ResultKind::IlosRss => "ilos_rss",
            ResultKind::IlgtNBins => "ilgt_nbins",
            ResultKind::IlgtRss => "ilgt_rss",
            ResultKind::ImdNBins => "imd_nbins",
            ResultKind::ImdRss => "imd_rss",
            ResultKind::UserDistNBins => "userdist_nbins",
            ResultKind::UserDistRss => "userdist_rss",
            ResultKind::ThdNBins => "thd_nbins",
            ResultKind::ThdRss => "thd_rss",
            ResultKind::IlvNBins => "ilv_nbins",
            ResultKind::IlvRss => "ilv_rss",
            ResultKind::DistNBins => "dist_nbins",
            ResultKind::DistRss => "dist_rss",
            ResultKind::NoiseNBins => "noise_nbins",
            ResultKind::NoiseRss => "noise_rss",
            ResultKind::NadNBins => "nad_nbins",
            ResultKind::NadRss => "nad_rss",
        }
    }

    /// Unit label for the results table.
    pub fn units(self) -> &'static str {
        match self {
            ResultKind::Fsnr | ResultKind::Snr | ResultKind::Sinad | ResultKind::Sfdr => "dB",
            ResultKind::Abn => "dBFS",
            ResultKind::Nsd => "dBFS/Hz",
            ResultKind::FBin | ResultKind::FShift | ResultKind::AbWidth => "Hz",
            ResultKind::FData | ResultKind::FSample => "S/s",
            _ => "",
        }
    }
}

/// Separator of flat `"<tone_key>:<field_name>"` keys.
pub const FLAT_KEY_COUPLER: char = ':';

/// Builds the flat key addressing one field of one tone.
pub fn flat_tone_key(tone_key: &str, kind: ToneResultKind) -> String {
    format!("{tone_key}{FLAT_KEY_COUPLER}{}", kind.field_name())
}

/// Splits a flat key into tone key and optional field name.
pub fn split_key(key: &str) -> (&str, Option<&str>) {
    match key.split_once(FLAT_KEY_COUPLER) {
        Some((tone, field)) => (tone, Some(field)),
        None => (key, None),
    }
}

/// The complete output of one analysis call.
#[derive(Debug, Clone, Default)]
pub struct AnalysisResults {
    scalars: BTreeMap<ResultKind, f64>,
    tone_keys: Vec<String>,
    tones: BTreeMap<String, ToneResult>,
}

impl AnalysisResults {
    pub fn get(&self, kind: ResultKind) -> Result<f64> {
        self.scalars.get(&kind).copied().ok_or_else(|| Error::Key {
            key: kind.name().to_string(),
            reason: "not found in results".to_string(),
        })
    }

    /// Tone keys in measurement order.
    pub fn tone_keys(&self) -> &[String] {
        &self.tone_keys
    }

    pub fn contains_tone(&self, key: &str) -> bool {
        self.tones.contains_key(key)
    }

    pub fn tone(&self, key: &str) -> Result<&ToneResult> {
        self.tones.get(key).ok_or_else(|| Error::Key {
            key: key.to_string(),
            reason: "not found in tone results".to_string(),
        })
    }

    /// Looks up one field through its flat `"<tone_key>:<field_name>"`
    /// form.
    pub fn flat(&self, flat_key: &str) -> Result<f64> {
        let (tone_key, field) = split_key(flat_key);
        let field = field.ok_or_else(|| Error::Key {
            key: flat_key.to_string(),
            reason: "missing field name".to_string(),
        })?;
        let kind = ToneResultKind::from_field_name(field).ok_or_else(|| Error::Key {
            key: flat_key.to_string(),
            reason: "unknown tone result field".to_string(),
        })?;
        self.tone(tone_key)?.get(kind)
    }

    pub(crate) fn set(&mut self, kind: ResultKind, value: f64) {
        self.scalars.insert(kind, value);
    }

    pub(crate) fn add_tone(&mut self, key: &str, tone: ToneResult) {
        if !self.tones.contains_key(key) {
            self.tone_keys.push(key.to_string());
            self.tones.insert(key.to_string(), tone);
        }
    }

    pub(crate) fn tone_mut(&mut self, key: &str) -> Result<&mut ToneResult> {
        self.tones.get_mut(key).ok_or_else(|| Error::Key {
            key: key.to_string(),
            reason: "not found in tone results".to_string(),
        })
    }

    /// Name/value/units rows of the scalar metrics, for table rendering.
    pub fn result_data(&self) -> Vec<[String; 3]> {
        ResultKind::ALL
            .iter()
            .filter_map(|&kind| {
                self.scalars.get(&kind).map(|value| {
                    [
                        kind.name().to_string(),
                        crate::expression::fmt_real(*value),
                        kind.units().to_string(),
                    ]
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::CompTag;

    #[test]
    fn bounded_db_clips() {
        assert_eq!(bounded_db10(0.0), -3000.0);
        assert_eq!(bounded_db10(1.0), 0.0);
        assert!((bounded_db10(0.25) + 6.0206).abs() < 1e-3);
        assert_eq!(bounded_db20(0.0), -3000.0);
        assert_eq!(bounded_db(Complex64::new(0.0, 0.0)), -3000.0);
        assert!((bounded_db20(0.5) + 6.0206).abs() < 1e-3);
    }

    #[test]
    fn db10_ratio_saturates() {
        assert_eq!(db10_ratio(0.0, 0.0), 0.0);
        assert_eq!(db10_ratio(0.0, 1.0), -3000.0);
        assert_eq!(db10_ratio(1.0, 0.0), 3000.0);
        assert_eq!(db10_ratio(10.0, 1.0), 10.0);
    }

    #[test]
    fn shadows_track_set() {
        let mut t = ToneResult::default();
        t.set(ToneResultKind::I1, 4.0);
        t.set(ToneResultKind::I2, 6.0);
        t.set(ToneResultKind::NBins, 3.0);
        t.set(ToneResultKind::InBand, 1.0);
        assert_eq!((t.i1, t.i2, t.nbins, t.inband), (4, 6, 3, true));
        t.set_mag_ms(0.25);
        assert_eq!(t.get(ToneResultKind::Mag).unwrap(), 0.5);
    }

    #[test]
    fn null_tone_fields() {
        let t = ToneResult::null(CompTag::Noise);
        assert_eq!(t.i1, -1);
        assert_eq!(t.i2, -1);
        assert_eq!(t.nbins, 0);
        assert!(!t.inband);
        assert_eq!(t.get(ToneResultKind::Mag).unwrap(), 0.0);
    }

    #[test]
    fn flat_keys_round_trip() {
        let key = flat_tone_key("wo1", ToneResultKind::MagDbc);
        assert_eq!(key, "wo1:mag_dbc");
        assert_eq!(split_key(&key), ("wo1", Some("mag_dbc")));
        assert_eq!(split_key("dc"), ("dc", None));
    }

    #[test]
    fn missing_keys_error() {
        let r = AnalysisResults::default();
        assert!(r.get(ResultKind::Snr).is_err());
        assert!(r.tone("a").is_err());
        assert!(r.flat("a:mag").is_err());
        assert!(r.flat("a").is_err());
    }

    #[test]
    fn tone_order_preserved() {
        let mut r = AnalysisResults::default();
        r.add_tone("dc", ToneResult::null(CompTag::DC));
        r.add_tone("a", ToneResult::null(CompTag::Signal));
        r.add_tone("2a", ToneResult::null(CompTag::HD));
        assert_eq!(r.tone_keys(), ["dc", "a", "2a"]);
        // re-adding an existing key is ignored
        r.add_tone("a", ToneResult::null(CompTag::Noise));
        assert_eq!(r.tone_keys().len(), 3);
    }
}
