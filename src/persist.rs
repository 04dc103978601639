//! Saving and loading configurations.
//!
//! The document is a human-readable JSON map covering every configurable
//! field. Loading routes all values through the public setters so the
//! usual validation applies; integer parameters are additionally
//! range-checked so a hand-edited document fails loudly instead of being
//! silently clamped.

use std::io::{Read, Write};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::component::Component;
use crate::config::AnalysisConfig;
use crate::constants::{
    MAX_HD, MAX_IMD, MAX_SSB, MAX_WO, MIN_HD, MIN_IMD, MIN_WO,
};
use crate::enums::{CompTag, CompType, SsbGroup};
use crate::error::{Error, Result};

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct CompDoc {
    key: String,
    #[serde(rename = "type")]
    comp_type: String,
    tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    freq: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    center: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    width: Option<String>,
    ssb: i32,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigDoc {
    version: String,
    clk_as_noise: bool,
    dc_as_dist: bool,
    en_conv_offset: bool,
    en_fund_images: bool,
    en_quad_errors: bool,
    ilv_as_noise: bool,
    hd: i32,
    imd: i32,
    wo: i32,
    ssb_def: i32,
    ssb_dc: i32,
    ssb_sig: i32,
    ssb_wo: i32,
    ab_center: String,
    ab_width: String,
    fdata: String,
    fsample: String,
    fshift: String,
    clk: Vec<i32>,
    ilv: Vec<i32>,
    user_comps: Vec<CompDoc>,
    user_vars: std::collections::BTreeMap<String, f64>,
}

fn check_range(name: &str, value: i32, min: i32, max: i32) -> Result<()> {
    if value < min || max < value {
        return Err(Error::Range {
            name: name.to_string(),
            value: value as i64,
            min: min as i64,
            max: max as i64,
        });
    }
    Ok(())
}

fn to_doc(cfg: &AnalysisConfig) -> ConfigDoc {
    let user_comps = cfg
        .user_keys()
        .iter()
        .filter_map(|key| cfg.user_comp(key).map(|comp| (key, comp)))
        .map(|(key, comp)| {
            let mut doc = CompDoc {
                key: key.clone(),
                comp_type: comp.comp_type().to_string(),
                tag: comp.tag().to_string(),
                freq: None,
                center: None,
                width: None,
                ssb: comp.ssb(),
            };
            match comp {
                Component::FixedTone { freq, .. } => doc.freq = Some(freq.clone()),
                Component::MaxTone { center, width, .. } => {
                    doc.center = Some(center.clone());
                    doc.width = Some(width.clone());
                }
                _ => {}
            }
            doc
        })
        .collect();
    ConfigDoc {
        version: env!("CARGO_PKG_VERSION").to_string(),
        clk_as_noise: cfg.clk_as_noise,
        dc_as_dist: cfg.dc_as_dist,
        en_conv_offset: cfg.en_conv_offset,
        en_fund_images: cfg.en_fund_images,
        en_quad_errors: cfg.en_quad_errors,
        ilv_as_noise: cfg.ilv_as_noise,
        hd: cfg.hd(),
        imd: cfg.imd(),
        wo: cfg.wo(),
        ssb_def: cfg.ssb(SsbGroup::Default),
        ssb_dc: cfg.ssb(SsbGroup::DC),
        ssb_sig: cfg.ssb(SsbGroup::Signal),
        ssb_wo: cfg.ssb(SsbGroup::WO),
        ab_center: cfg.ab_center().to_string(),
        ab_width: cfg.ab_width().to_string(),
        fdata: cfg.fdata().to_string(),
        fsample: cfg.fsample().to_string(),
        fshift: cfg.fshift().to_string(),
        clk: cfg.clk().iter().copied().collect(),
        ilv: cfg.ilv().iter().copied().collect(),
        user_comps,
        user_vars: cfg.user_vars().clone(),
    }
}

fn from_doc(doc: ConfigDoc) -> Result<AnalysisConfig> {
    check_range("hd", doc.hd, MIN_HD, MAX_HD)?;
    check_range("imd", doc.imd, MIN_IMD, MAX_IMD)?;
    check_range("wo", doc.wo, MIN_WO, MAX_WO)?;
    check_range("ssb_def", doc.ssb_def, 0, MAX_SSB)?;
    check_range("ssb_dc", doc.ssb_dc, -1, MAX_SSB)?;
    check_range("ssb_sig", doc.ssb_sig, -1, MAX_SSB)?;
    check_range("ssb_wo", doc.ssb_wo, -1, MAX_SSB)?;
    let mut cfg = AnalysisConfig::new();
    cfg.clk_as_noise = doc.clk_as_noise;
    cfg.dc_as_dist = doc.dc_as_dist;
    cfg.en_conv_offset = doc.en_conv_offset;
    cfg.en_fund_images = doc.en_fund_images;
    cfg.en_quad_errors = doc.en_quad_errors;
    cfg.ilv_as_noise = doc.ilv_as_noise;
    cfg.set_hd(doc.hd);
    cfg.set_imd(doc.imd);
    cfg.set_wo(doc.wo);
    cfg.set_ssb(SsbGroup::Default, doc.ssb_def);
    cfg.set_ssb(SsbGroup::DC, doc.ssb_dc);
    cfg.set_ssb(SsbGroup::Signal, doc.ssb_sig);
    cfg.set_ssb(SsbGroup::WO, doc.ssb_wo);
    cfg.set_analysis_band(&doc.ab_center, &doc.ab_width)?;
    cfg.set_fdata(&doc.fdata)?;
    cfg.set_fsample(&doc.fsample)?;
    cfg.set_fshift(&doc.fshift)?;
    cfg.set_clk(doc.clk);
    cfg.set_ilv(doc.ilv);
    for comp in doc.user_comps {
        let tag = CompTag::from_str(&comp.tag)?;
        match CompType::from_str(&comp.comp_type)? {
            CompType::FixedTone => {
                let freq = comp.freq.ok_or_else(|| Error::Load {
                    reason: format!("fixed tone '{}' missing freq", comp.key),
                })?;
                cfg.add_fixed_tone(&comp.key, tag, &freq, comp.ssb)?;
            }
            CompType::MaxTone => {
                let center = comp.center.ok_or_else(|| Error::Load {
                    reason: format!("max tone '{}' missing center", comp.key),
                })?;
                let width = comp.width.ok_or_else(|| Error::Load {
                    reason: format!("max tone '{}' missing width", comp.key),
                })?;
                cfg.add_max_tone(&comp.key, tag, &center, &width, comp.ssb)?;
            }
            other => {
                return Err(Error::Load {
                    reason: format!("component '{}' has non-user type {other}", comp.key),
                })
            }
        }
    }
    for (key, value) in doc.user_vars {
        cfg.set_var(&key, value)?;
    }
    Ok(cfg)
}

impl AnalysisConfig {
    /// Writes the configuration as a pretty JSON document.
    pub fn save_to<W: Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer_pretty(writer, &to_doc(self)).map_err(|e| Error::Load {
            reason: format!("serialize failed: {e}"),
        })
    }

    /// Reads a configuration previously written by [`Self::save_to`].
    pub fn load_from<R: Read>(reader: R) -> Result<AnalysisConfig> {
        let doc: ConfigDoc = serde_json::from_reader(reader).map_err(|e| Error::Load {
            reason: format!("malformed document: {e}"),
        })?;
        from_doc(doc)
    }
}
