//! Analysis configuration: flags, clamped integer parameters, symbolic
//! frequency expressions, user components and variables, and the
//! component-expansion algorithm that turns them into the ordered list the
//! engine measures.

use std::collections::{BTreeMap, BTreeSet};

use lazy_static::lazy_static;
use num::integer::gcd;
use tracing::debug;

use crate::component::Component;
use crate::constants::{
    DEF_HD, DEF_IMD, DEF_SSB, DEF_WO, MAX_CLK, MAX_HD, MAX_ILV, MAX_IMD, MAX_SSB, MAX_WO,
    MIN_CLK, MIN_HD, MIN_ILV, MIN_IMD, MIN_SSB, MIN_WO,
};
use crate::enums::{CompTag, SsbGroup};
use crate::error::{Error, Result};
use crate::expression::Expression;
use crate::format;

lazy_static! {
    /// Keys that can never name a user component or variable.
    static ref RESERVED_KEYS: BTreeSet<&'static str> = {
        let mut s = BTreeSet::new();
        s.insert("co");     // comp/var : converter offset
        s.insert("dc");     // comp     : DC
        s.insert("fbin");   // var      : frequency bin size
        s.insert("fdata");  // var      : data rate
        s.insert("fs");     // var      : sample rate
        s.insert("fshift"); // var      : shift frequency
        s
    };
}

/// The expanded component list: keys in measurement order, the component
/// for each key, and the ILOS keys that double as clock components.
pub(crate) struct CompSet {
    pub keys: Vec<String>,
    pub comps: BTreeMap<String, Component>,
    pub ilos_clk_keys: BTreeSet<String>,
}

impl CompSet {
    fn new() -> CompSet {
        CompSet {
            keys: Vec::new(),
            comps: BTreeMap::new(),
            ilos_clk_keys: BTreeSet::new(),
        }
    }

    fn add(&mut self, key: &str, comp: Component) -> Result<()> {
        if self.comps.contains_key(key) {
            return Err(Error::Key {
                key: key.to_string(),
                reason: "already exists in generated components".to_string(),
            });
        }
        self.keys.push(key.to_string());
        self.comps.insert(key.to_string(), comp);
        Ok(())
    }
}

/// A reduced fraction of the sample rate, ordered by denominator first so
/// interleaving terms group by factor.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct Fraction {
    den: i32,
    num: i32,
}

impl Fraction {
    fn new(n: i32, d: i32) -> Fraction {
        let g = gcd(n, d);
        Fraction {
            den: d / g,
            num: n / g,
        }
    }

    /// Symbolic term, e.g. `fs/4` or `3fs/8`.
    fn term(&self) -> String {
        if self.num == 1 {
            format!("fs/{}", self.den)
        } else {
            format!("{}fs/{}", self.num, self.den)
        }
    }
}

fn negate(expr: &str, neg: bool) -> String {
    if neg {
        format!("-({expr})")
    } else {
        expr.to_string()
    }
}

fn is_even(n: i32) -> bool {
    n % 2 == 0
}

/// Configuration of one Fourier analysis.
///
/// Flags are plain public fields; everything with a validity constraint
/// goes through a setter. The configuration is a value: clone it freely,
/// compare it with `==`.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    /// Treat CLK components as noise.
    pub clk_as_noise: bool,
    /// Treat the DC component as distortion.
    pub dc_as_dist: bool,
    /// Enable the converter-offset component.
    pub en_conv_offset: bool,
    /// Enable fundamental image components (complex analysis).
    pub en_fund_images: bool,
    /// Enable quadrature-error tone components (complex analysis).
    pub en_quad_errors: bool,
    /// Treat interleaving components as noise.
    pub ilv_as_noise: bool,
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
    clk: BTreeSet<i32>,
    ilv: BTreeSet<i32>,
    user_keys: Vec<String>,
    user_comps: BTreeMap<String, Component>,
    user_vars: BTreeMap<String, f64>,
}

impl Default for AnalysisConfig {
    fn default() -> AnalysisConfig {
        AnalysisConfig {
            clk_as_noise: false,
            dc_as_dist: false,
            en_conv_offset: false,
            en_fund_images: true,
            en_quad_errors: false,
            ilv_as_noise: false,
            hd: DEF_HD,
            imd: DEF_IMD,
            wo: DEF_WO,
            ssb_def: DEF_SSB,
            ssb_dc: -1,
            ssb_sig: -1,
            ssb_wo: -1,
            ab_center: "0".to_string(),
            ab_width: "fdata".to_string(),
            fdata: "fs".to_string(),
            fsample: "1".to_string(),
            fshift: "0".to_string(),
            clk: BTreeSet::new(),
            ilv: BTreeSet::new(),
            user_keys: Vec::new(),
            user_comps: BTreeMap::new(),
            user_vars: BTreeMap::new(),
        }
    }
}

impl AnalysisConfig {
    pub fn new() -> AnalysisConfig {
        AnalysisConfig::default()
    }

    /// Restores every field to its default.
    pub fn reset(&mut self) {
        *self = AnalysisConfig::default();
    }

    // ---- key queries ----------------------------------------------------

    /// True for keys the engine claims for itself, including `wo`/`wo1`..
    /// `wo9`.
    pub fn is_reserved(key: &str) -> bool {
        if RESERVED_KEYS.contains(key) {
            return true;
        }
        // the worst-other pattern: "wo" with an optional digit 1-9
        match key.strip_prefix("wo") {
            Some("") => true,
            Some(rest) => rest.len() == 1 && rest.chars().all(|c| ('1'..='9').contains(&c)),
            None => false,
        }
    }

    /// True for identifiers of the form `[A-Za-z][A-Za-z0-9_]*`.
    pub fn is_valid_key(key: &str) -> bool {
        let mut chars = key.chars();
        match chars.next() {
            Some(c) if c.is_ascii_alphabetic() => {
                chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
            }
            _ => false,
        }
    }

    pub fn is_comp(&self, key: &str) -> bool {
        self.user_comps.contains_key(key)
    }

    pub fn is_var(&self, key: &str) -> bool {
        self.user_vars.contains_key(key)
    }

    pub fn is_available(&self, key: &str) -> bool {
        !Self::is_reserved(key) && !self.is_comp(key) && !self.is_var(key)
            && Self::is_valid_key(key)
    }

    fn check_available(&self, key: &str) -> Result<()> {
        if Self::is_reserved(key) {
            Err(Error::Key {
                key: key.to_string(),
                reason: "is reserved".to_string(),
            })
        } else if self.is_comp(key) || self.is_var(key) {
            Err(Error::Key {
                key: key.to_string(),
                reason: "already exists".to_string(),
            })
        } else if !Self::is_valid_key(key) {
            Err(Error::Key {
                key: key.to_string(),
                reason: "is not a valid identifier".to_string(),
            })
        } else {
            Ok(())
        }
    }

    // ---- component definition -------------------------------------------

    /// Declares a tone at a fixed symbolic frequency.
    pub fn add_fixed_tone(&mut self, key: &str, tag: CompTag, freq: &str, ssb: i32) -> Result<()> {
        self.check_available(key)?;
        let freq = Expression::parse(freq)?.to_string();
        let ssb = limit_ssb(ssb, -1);
        self.user_keys.push(key.to_string());
        self.user_comps
            .insert(key.to_string(), Component::FixedTone { tag, freq, ssb });
        Ok(())
    }

    /// Declares a max-search tone. Only `Signal`, `UserDist` and `Noise`
    /// tags make sense for a searched tone.
    pub fn add_max_tone(
        &mut self,
        key: &str,
        tag: CompTag,
        center: &str,
        width: &str,
        ssb: i32,
    ) -> Result<()> {
        if !matches!(tag, CompTag::Signal | CompTag::UserDist | CompTag::Noise) {
            return Err(Error::Key {
                key: key.to_string(),
                reason: "max tone tag must be one of {Signal, UserDist, Noise}".to_string(),
            });
        }
        self.check_available(key)?;
        let center = Expression::parse(center)?.to_string();
        let width = Expression::parse(width)?.to_string();
        let ssb = limit_ssb(ssb, -1);
        self.user_keys.push(key.to_string());
        self.user_comps.insert(
            key.to_string(),
            Component::MaxTone {
                tag,
                center,
                width,
                ssb,
            },
        );
        Ok(())
    }

    /// Removes a user component; no-op if absent.
    pub fn remove_comp(&mut self, key: &str) {
        if self.user_comps.remove(key).is_some() {
            self.user_keys.retain(|k| k != key);
        }
    }

    // ---- configuration getters ------------------------------------------

    pub fn ab_center(&self) -> &str {
        &self.ab_center
    }

    pub fn ab_width(&self) -> &str {
        &self.ab_width
    }

    pub fn fdata(&self) -> &str {
        &self.fdata
    }

    pub fn fsample(&self) -> &str {
        &self.fsample
    }

    pub fn fshift(&self) -> &str {
        &self.fshift
    }

    pub fn hd(&self) -> i32 {
        self.hd
    }

    pub fn imd(&self) -> i32 {
        self.imd
    }

    pub fn wo(&self) -> i32 {
        self.wo
    }

    pub fn clk(&self) -> &BTreeSet<i32> {
        &self.clk
    }

    pub fn ilv(&self) -> &BTreeSet<i32> {
        &self.ilv
    }

    pub fn ssb(&self, group: SsbGroup) -> i32 {
        match group {
            SsbGroup::Default => self.ssb_def,
            SsbGroup::DC => self.ssb_dc,
            SsbGroup::Signal => self.ssb_sig,
            SsbGroup::WO => self.ssb_wo,
        }
    }

    pub fn user_keys(&self) -> &[String] {
        &self.user_keys
    }

    pub fn user_comp(&self, key: &str) -> Option<&Component> {
        self.user_comps.get(key)
    }

    pub fn user_vars(&self) -> &BTreeMap<String, f64> {
        &self.user_vars
    }

    // ---- configuration setters ------------------------------------------

    /// Sets the analysis-band center and width expressions.
    pub fn set_analysis_band(&mut self, center: &str, width: &str) -> Result<()> {
        let center = checked_expr("ab_center", center, &[])?;
        let width = checked_expr("ab_width", width, &[])?;
        self.ab_center = center;
        self.ab_width = width;
        Ok(())
    }

    pub fn set_fdata(&mut self, expr: &str) -> Result<()> {
        self.fdata = checked_expr("fdata", expr, &["fbin", "fdata", "fshift"])?;
        Ok(())
    }

    pub fn set_fsample(&mut self, expr: &str) -> Result<()> {
        self.fsample = checked_expr("fsample", expr, &["fbin", "fdata", "fs", "fshift"])?;
        Ok(())
    }

    pub fn set_fshift(&mut self, expr: &str) -> Result<()> {
        self.fshift = checked_expr("fshift", expr, &["fshift"])?;
        Ok(())
    }

    /// Sets the harmonic-distortion order, clamped to [1, 99].
    pub fn set_hd(&mut self, n: i32) {
        self.hd = n.clamp(MIN_HD, MAX_HD);
    }

    /// Sets the intermodulation order, clamped to [1, 9].
    pub fn set_imd(&mut self, n: i32) {
        self.imd = n.clamp(MIN_IMD, MAX_IMD);
    }

    /// Sets the number of worst-other tones, clamped to [1, 9].
    pub fn set_wo(&mut self, n: i32) {
        self.wo = n.clamp(MIN_WO, MAX_WO);
    }

    /// Sets a group's single-side-bin count. The default group clamps at
    /// zero; the others accept −1 meaning "inherit the default".
    pub fn set_ssb(&mut self, group: SsbGroup, ssb: i32) {
        match group {
            SsbGroup::Default => self.ssb_def = limit_ssb(ssb, MIN_SSB),
            SsbGroup::DC => self.ssb_dc = limit_ssb(ssb, -1),
            SsbGroup::Signal => self.ssb_sig = limit_ssb(ssb, -1),
            SsbGroup::WO => self.ssb_wo = limit_ssb(ssb, -1),
        }
    }

    /// Replaces the clock divisor set, silently dropping values outside
    /// [2, 256].
    pub fn set_clk<I: IntoIterator<Item = i32>>(&mut self, clk: I) {
        self.clk = clk
            .into_iter()
            .filter(|&n| (MIN_CLK..=MAX_CLK).contains(&n))
            .collect();
    }

    /// Replaces the interleaving factor set, silently dropping values
    /// outside [2, 64].
    pub fn set_ilv<I: IntoIterator<Item = i32>>(&mut self, ilv: I) {
        self.ilv = ilv
            .into_iter()
            .filter(|&n| (MIN_ILV..=MAX_ILV).contains(&n))
            .collect();
    }

    /// Defines or updates a user variable.
    pub fn set_var(&mut self, key: &str, x: f64) -> Result<()> {
        if !self.is_var(key) {
            self.check_available(key)?;
        }
        if !x.is_finite() {
            return Err(Error::Eval {
                reason: format!("variable '{key}' set to non-finite value"),
            });
        }
        self.user_vars.insert(key.to_string(), x);
        Ok(())
    }

    // ---- component expansion --------------------------------------------

    /// Expands the configuration into the ordered component list for a
    /// complex or real analysis.
    pub(crate) fn generate_comps(&self, cplx: bool) -> Result<CompSet> {
        let find_fi = self.en_fund_images && cplx;
        let find_qe = self.en_quad_errors && cplx;
        let mut out = CompSet::new();

        // DC and converter offset
        let dc_ssb = if self.ssb_dc < 0 { self.ssb_def } else { self.ssb_dc };
        out.add("dc", Component::Dc { ssb: dc_ssb })?;
        if self.en_conv_offset {
            out.add(
                "co",
                Component::FixedTone {
                    tag: CompTag::UserDist,
                    freq: "0".to_string(),
                    ssb: dc_ssb,
                },
            )?;
        }

        // Interleaving offset and clock terms. CLK and ILOS fractions may
        // coincide; ILOS wins the tag and the key is recorded so the
        // engine can mirror its range into the CLK mask.
        let mut ilv_terms: BTreeSet<Fraction> = BTreeSet::new();
        let mut ilos_clk_terms: BTreeSet<Fraction> = BTreeSet::new();
        for &x in &self.ilv {
            for i in 1..=x / 2 {
                ilv_terms.insert(Fraction::new(i, x));
                ilos_clk_terms.insert(Fraction::new(i, x));
            }
        }
        let mut clk_terms: BTreeSet<Fraction> = BTreeSet::new();
        for &x in &self.clk {
            for i in 1..=x / 2 {
                if gcd(i, x) == 1 {
                    clk_terms.insert(Fraction::new(i, x));
                    ilos_clk_terms.insert(Fraction::new(i, x));
                }
            }
        }
        for f in &ilos_clk_terms {
            let key = f.term();
            if ilv_terms.contains(f) {
                let is_also_clk = clk_terms.contains(f);
                out.add(
                    &key,
                    Component::FixedTone {
                        tag: CompTag::ILOS,
                        freq: key.clone(),
                        ssb: self.ssb_def,
                    },
                )?;
                if is_also_clk {
                    out.ilos_clk_keys.insert(key.clone());
                }
                if cplx && key != "fs/2" {
                    let neg_key = format!("-{key}");
                    out.add(
                        &neg_key,
                        Component::FixedTone {
                            tag: CompTag::ILOS,
                            freq: neg_key.clone(),
                            ssb: self.ssb_def,
                        },
                    )?;
                    if is_also_clk {
                        out.ilos_clk_keys.insert(neg_key);
                    }
                }
            } else {
                out.add(
                    &key,
                    Component::FixedTone {
                        tag: CompTag::CLK,
                        freq: key.clone(),
                        ssb: self.ssb_def,
                    },
                )?;
                if cplx && key != "fs/2" {
                    let neg_key = format!("-{key}");
                    out.add(
                        &neg_key,
                        Component::FixedTone {
                            tag: CompTag::CLK,
                            freq: neg_key.clone(),
                            ssb: self.ssb_def,
                        },
                    )?;
                }
            }
        }

        // User components, each Signal followed by its derived tones
        let mut fund_keys: Vec<&str> = Vec::new();
        let def_sig_ssb = if self.ssb_sig < 0 { self.ssb_def } else { self.ssb_sig };
        for ukey in &self.user_keys {
            let comp = self.user_comps.get(ukey).ok_or_else(|| Error::Internal {
                reason: format!("declared key '{ukey}' has no component"),
            })?;
            let def_user_ssb = if comp.tag() == CompTag::Signal {
                def_sig_ssb
            } else {
                self.ssb_def
            };
            match comp {
                Component::FixedTone { tag, freq, ssb } => {
                    let ssb = if *ssb < 0 { def_user_ssb } else { *ssb };
                    out.add(
                        ukey,
                        Component::FixedTone {
                            tag: *tag,
                            freq: freq.clone(),
                            ssb,
                        },
                    )?;
                }
                Component::MaxTone {
                    tag,
                    center,
                    width,
                    ssb,
                } => {
                    let ssb = if *ssb < 0 { def_user_ssb } else { *ssb };
                    out.add(
                        ukey,
                        Component::MaxTone {
                            tag: *tag,
                            center: center.clone(),
                            width: width.clone(),
                            ssb,
                        },
                    )?;
                }
                _ => {
                    return Err(Error::Internal {
                        reason: format!("user component '{ukey}' has unsupported type"),
                    })
                }
            }
            if comp.tag() != CompTag::Signal {
                continue;
            }
            let ssb = self.ssb_def;
            // fundamental image
            if find_fi {
                let key = format!("-{ukey}");
                self.add_hd(&mut out, &key, ssb)?;
            }
            // harmonic distortion
            for i in 2..=self.hd {
                if is_even(i) {
                    let key = format!("{i}{ukey}");
                    self.add_hd(&mut out, &key, ssb)?;
                    if cplx {
                        self.add_hd(&mut out, &format!("-{key}"), ssb)?;
                    }
                } else {
                    // real data: +i
                    // cplx data: -i for orders 3, 7, 11..; +i for 5, 9, 13..
                    let j = if cplx && (i / 2) % 2 == 1 { -i } else { i };
                    self.add_hd(&mut out, &format!("{j}{ukey}"), ssb)?;
                    if find_qe {
                        self.add_hd(&mut out, &format!("{}{ukey}", -j), ssb)?;
                    }
                }
            }
            // interleaving gain/timing
            for f in &ilv_terms {
                let term = f.term();
                self.add_ilgt(&mut out, &format!("{ukey}+{term}"), ssb)?;
                if term != "fs/2" {
                    self.add_ilgt(&mut out, &format!("{ukey}-{term}"), ssb)?;
                }
                if find_qe {
                    self.add_ilgt(&mut out, &negate(&format!("{ukey}+{term}"), true), ssb)?;
                    if term != "fs/2" {
                        self.add_ilgt(&mut out, &negate(&format!("{ukey}-{term}"), true), ssb)?;
                    }
                }
            }
            // intermodulation against every earlier Signal
            for &ka in &fund_keys {
                let kb = ukey.as_str();
                self.add_imds(&mut out, ka, kb, cplx, find_qe, ssb)?;
            }
            fund_keys.push(ukey.as_str());
        }

        // worst others
        let wo_ssb = if self.ssb_wo < 0 { self.ssb_def } else { self.ssb_wo };
        if self.wo == 1 {
            out.add("wo", Component::WoTone { ssb: wo_ssb })?;
        } else {
            for i in 1..=self.wo {
                out.add(&format!("wo{i}"), Component::WoTone { ssb: wo_ssb })?;
            }
        }
        debug!(count = out.keys.len(), cplx, "expanded components");
        Ok(out)
    }

    fn add_hd(&self, out: &mut CompSet, key: &str, ssb: i32) -> Result<()> {
        out.add(
            key,
            Component::FixedTone {
                tag: CompTag::HD,
                freq: key.to_string(),
                ssb,
            },
        )
    }

    fn add_ilgt(&self, out: &mut CompSet, key: &str, ssb: i32) -> Result<()> {
        out.add(
            key,
            Component::FixedTone {
                tag: CompTag::ILGT,
                freq: key.to_string(),
                ssb,
            },
        )
    }

    fn add_imd(&self, out: &mut CompSet, key: &str, ssb: i32) -> Result<()> {
        out.add(
            key,
            Component::FixedTone {
                tag: CompTag::IMD,
                freq: key.to_string(),
                ssb,
            },
        )
    }

    /// Emits the intermodulation products of `ka` and `kb` for orders
    /// 2..=imd, enumerating difference terms (`p·x − q·y`) for every
    /// sign group below the order and sum terms (`p·x + q·y`) at the
    /// order itself.
    fn add_imds(
        &self,
        out: &mut CompSet,
        ka: &str,
        kb: &str,
        cplx: bool,
        find_qe: bool,
        ssb: i32,
    ) -> Result<()> {
        for order in 2..=self.imd {
            let mut group = if is_even(order) { 0 } else { 1 };
            while group <= order {
                if group < order {
                    // difference form: p*kx - q*ky
                    let pp = (order + group) / 2;
                    let qq = order - pp;
                    let p = if pp == 1 { String::new() } else { pp.to_string() };
                    let q = if qq == 1 { String::new() } else { qq.to_string() };
                    if group == 0 {
                        let key = format!("{p}{kb}-{q}{ka}");
                        self.add_imd(out, &key, ssb)?;
                        if cplx {
                            self.add_imd(out, &negate(&key, true), ssb)?;
                        }
                    } else if is_even(order) {
                        let key_ab = format!("{p}{ka}-{q}{kb}");
                        let key_ba = format!("{p}{kb}-{q}{ka}");
                        self.add_imd(out, &key_ab, ssb)?;
                        self.add_imd(out, &key_ba, ssb)?;
                        if cplx {
                            self.add_imd(out, &negate(&key_ab, true), ssb)?;
                            self.add_imd(out, &negate(&key_ba, true), ssb)?;
                        }
                    } else {
                        let neg = cplx && (group / 2) % 2 == 1;
                        let key_ab = format!("{p}{ka}-{q}{kb}");
                        let key_ba = format!("{p}{kb}-{q}{ka}");
                        self.add_imd(out, &negate(&key_ab, neg), ssb)?;
                        self.add_imd(out, &negate(&key_ba, neg), ssb)?;
                        if cplx {
                            self.add_imd(out, &negate(&key_ab, !neg), ssb)?;
                            self.add_imd(out, &negate(&key_ba, !neg), ssb)?;
                        }
                    }
                } else {
                    // sum form: p*kx + q*ky
                    if is_even(order) {
                        for qq in 1..group {
                            let pp = order - qq;
                            let p = if pp == 1 { String::new() } else { pp.to_string() };
                            let q = if qq == 1 { String::new() } else { qq.to_string() };
                            self.add_imd(out, &format!("{p}{ka}+{q}{kb}"), ssb)?;
                        }
                        if cplx {
                            for pp in 1..group {
                                let qq = order - pp;
                                let p = if pp == 1 { String::new() } else { pp.to_string() };
                                let q = if qq == 1 { String::new() } else { qq.to_string() };
                                self.add_imd(out, &negate(&format!("{p}{ka}+{q}{kb}"), true), ssb)?;
                            }
                        }
                    } else {
                        let neg = cplx && (group / 2) % 2 == 1;
                        for qq in 1..group {
                            let pp = order - qq;
                            let p = if pp == 1 { String::new() } else { pp.to_string() };
                            let q = if qq == 1 { String::new() } else { qq.to_string() };
                            self.add_imd(out, &negate(&format!("{p}{ka}+{q}{kb}"), neg), ssb)?;
                        }
                        if find_qe {
                            for pp in 1..group {
                                let qq = order - pp;
                                let p = if pp == 1 { String::new() } else { pp.to_string() };
                                let q = if qq == 1 { String::new() } else { qq.to_string() };
                                self.add_imd(
                                    out,
                                    &negate(&format!("{p}{ka}+{q}{kb}"), !neg),
                                    ssb,
                                )?;
                            }
                        }
                    }
                }
                group += 2;
            }
        }
        Ok(())
    }

    /// Renders the expanded component list as a table, one row per
    /// component: index, key, type, tag, spec.
    pub fn preview(&self, cplx: bool) -> Result<String> {
        let comp_set = self.generate_comps(cplx)?;
        let header = vec![vec![
            "Index".to_string(),
            "Key".to_string(),
            "Type".to_string(),
            "Tag".to_string(),
            "Spec".to_string(),
        ]];
        let mut data = Vec::with_capacity(comp_set.keys.len());
        for (i, key) in comp_set.keys.iter().enumerate() {
            let comp = &comp_set.comps[key];
            data.push(vec![
                i.to_string(),
                key.clone(),
                comp.comp_type().to_string(),
                comp.tag().to_string(),
                comp.spec(),
            ]);
        }
        Ok(format::table(&header, &data, 2, true, true))
    }
}

fn limit_ssb(ssb: i32, lower_limit: i32) -> i32 {
    let lower = if lower_limit < 0 { -1 } else { MIN_SSB };
    ssb.clamp(lower, MAX_SSB)
}

/// Parses and normalizes an expression, rejecting references to any
/// disallowed variable.
fn checked_expr(name: &str, expr: &str, disallowed: &[&str]) -> Result<String> {
    let e = Expression::parse(expr)?;
    if e.depends_on_any(disallowed.iter().copied()) {
        return Err(Error::Parse {
            reason: format!("{name} may not depend on any of {disallowed:?}"),
        });
    }
    Ok(e.to_string())
}
