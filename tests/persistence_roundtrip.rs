//! Round-trip tests: a saved configuration must load back equal and
//! analyze identically.

use spectralyze::{analyze, AnalysisConfig, AxisType, CompTag, ResultKind, SsbGroup};

fn configured() -> AnalysisConfig {
    let mut cfg = AnalysisConfig::new();
    cfg.en_conv_offset = true;
    cfg.clk_as_noise = true;
    cfg.set_fsample("1024").unwrap();
    cfg.set_hd(4);
    cfg.set_imd(2);
    cfg.set_wo(2);
    cfg.set_ssb(SsbGroup::Default, 1);
    cfg.set_clk([4]);
    cfg.set_ilv([2]);
    cfg.set_var("flo", 8.0).unwrap();
    cfg.add_fixed_tone("a", CompTag::Signal, "fs*100/1024", -1)
        .unwrap();
    cfg.add_fixed_tone("mix", CompTag::UserDist, "a - flo", -1)
        .unwrap();
    cfg.add_max_tone("hunt", CompTag::Noise, "fdata/4", "fdata/8", 0)
        .unwrap();
    cfg
}

#[test]
fn loaded_config_equals_saved() {
    let cfg = configured();
    let mut buf = Vec::new();
    cfg.save_to(&mut buf).unwrap();
    let loaded = AnalysisConfig::load_from(buf.as_slice()).unwrap();
    assert_eq!(loaded, cfg);
    // the document is human-readable JSON with the expected fields
    let text = String::from_utf8(buf).unwrap();
    for needle in ["\"hd\"", "\"user_comps\"", "\"user_vars\"", "\"fsample\"", "\"version\""] {
        assert!(text.contains(needle), "document missing {needle}");
    }
}

#[test]
fn loaded_config_analyzes_identically() {
    let nfft = 1024;
    let mut spectrum = vec![0.0; nfft];
    spectrum[100] = 0.25;
    spectrum[92] = 1e-6;
    spectrum[300] = 1e-5;
    let cfg = configured();
    let mut buf = Vec::new();
    cfg.save_to(&mut buf).unwrap();
    let loaded = AnalysisConfig::load_from(buf.as_slice()).unwrap();
    let a = analyze(&cfg, &spectrum, nfft, AxisType::DcLeft).unwrap();
    let b = analyze(&loaded, &spectrum, nfft, AxisType::DcLeft).unwrap();
    assert_eq!(a.tone_keys(), b.tone_keys());
    for kind in ResultKind::ALL {
        assert_eq!(
            a.get(kind).unwrap().to_bits(),
            b.get(kind).unwrap().to_bits(),
            "{kind:?} differs after reload"
        );
    }
}

#[test]
fn preview_matches_after_reload() {
    let cfg = configured();
    let mut buf = Vec::new();
    cfg.save_to(&mut buf).unwrap();
    let loaded = AnalysisConfig::load_from(buf.as_slice()).unwrap();
    assert_eq!(cfg.preview(true).unwrap(), loaded.preview(true).unwrap());
    assert_eq!(cfg.preview(false).unwrap(), loaded.preview(false).unwrap());
}
