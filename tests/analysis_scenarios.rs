//! Scenario tests for the analysis engine: single tones, DC-only spectra,
//! intermodulation pickup, band restriction, shifted axes, and the error
//! paths callers are expected to hit.

use approx::assert_relative_eq;
use spectralyze::{
    analyze, AnalysisConfig, AxisType, CompTag, Error, ResultKind, ToneResultKind,
};

fn msq_spectrum(size: usize, bins: &[(usize, f64)]) -> Vec<f64> {
    let mut spectrum = vec![0.0; size];
    for &(bin, ms) in bins {
        spectrum[bin] = ms;
    }
    spectrum
}

/// S1: one coherent tone in an otherwise empty complex spectrum.
#[test]
fn pure_tone_complex() {
    spectralyze::tracing_init::init_test_tracing();
    let nfft = 1024;
    let mut cfg = AnalysisConfig::new();
    cfg.set_fsample("1024").unwrap();
    cfg.set_hd(3);
    cfg.add_fixed_tone("a", CompTag::Signal, "fs*100/1024", -1)
        .unwrap();
    let spectrum = msq_spectrum(nfft, &[(100, 0.25)]);
    let results = analyze(&cfg, &spectrum, nfft, AxisType::DcLeft).unwrap();

    let a = results.tone("a").unwrap();
    assert_relative_eq!(a.get(ToneResultKind::Freq).unwrap(), 100.0);
    assert_relative_eq!(a.get(ToneResultKind::FFinal).unwrap(), 100.0);
    assert_relative_eq!(a.get(ToneResultKind::FWAvg).unwrap(), 100.0);
    assert_relative_eq!(a.get(ToneResultKind::Mag).unwrap(), 0.5);
    assert_relative_eq!(
        a.get(ToneResultKind::MagDbfs).unwrap(),
        -6.0206,
        epsilon = 1e-3
    );
    assert_relative_eq!(a.get(ToneResultKind::MagDbc).unwrap(), 0.0);
    assert_eq!((a.i1, a.i2, a.nbins), (100, 100, 1));
    assert!(a.inband);

    // the carrier is the user tone; every derived tone row exists, empty
    let carrier = results.get(ResultKind::CarrierIndex).unwrap();
    assert_eq!(results.tone_keys()[carrier as usize], "a");
    for key in ["dc", "-a", "2a", "-2a", "-3a", "wo"] {
        assert!(results.contains_tone(key), "missing tone row {key}");
        if key != "dc" {
            assert_eq!(
                results.tone(key).unwrap().get(ToneResultKind::Mag).unwrap(),
                0.0
            );
        }
    }

    // no spurs, no noise: the dB figures saturate high
    assert_eq!(results.get(ResultKind::Sfdr).unwrap(), 3000.0);
    assert_eq!(results.get(ResultKind::Fsnr).unwrap(), 3000.0);
    assert_eq!(results.get(ResultKind::Snr).unwrap(), 3000.0);
    assert_relative_eq!(results.get(ResultKind::SignalRss).unwrap(), 0.5);
    assert_eq!(results.get(ResultKind::SignalNBins).unwrap(), 1.0);
    assert_eq!(results.get(ResultKind::FBin).unwrap(), 1.0);
}

/// S2: energy only at DC.
#[test]
fn dc_only_real() {
    let nfft = 8;
    let spectrum = msq_spectrum(5, &[(0, 1.0)]);
    let cfg = AnalysisConfig::new();
    let results = analyze(&cfg, &spectrum, nfft, AxisType::Real).unwrap();
    let dc = results.tone("dc").unwrap();
    assert_relative_eq!(dc.get(ToneResultKind::Mag).unwrap(), 1.0);
    assert!(dc.inband);
    // DC is excluded from spur candidates, and there is no carrier
    assert_eq!(results.get(ResultKind::CarrierIndex).unwrap(), -1.0);
    assert_eq!(results.get(ResultKind::MaxSpurIndex).unwrap(), -1.0);
    assert_eq!(results.get(ResultKind::Sfdr).unwrap(), 0.0);
    assert_eq!(results.get(ResultKind::NoiseRss).unwrap(), 0.0);
    assert_eq!(results.get(ResultKind::Fsnr).unwrap(), 3000.0);

    // treating DC as distortion makes it the max spur
    let mut cfg = AnalysisConfig::new();
    cfg.dc_as_dist = true;
    let results = analyze(&cfg, &spectrum, nfft, AxisType::Real).unwrap();
    assert_eq!(results.get(ResultKind::MaxSpurIndex).unwrap(), 0.0);
    assert_eq!(results.get(ResultKind::Sfdr).unwrap(), -3000.0);
    assert_relative_eq!(results.get(ResultKind::DistRss).unwrap(), 1.0);
}

/// S3: two signals and the second-order difference product between them.
#[test]
fn two_signals_one_imd() {
    let nfft = 1024;
    let mut cfg = AnalysisConfig::new();
    cfg.set_fsample("1024").unwrap();
    cfg.set_imd(2);
    cfg.add_fixed_tone("a", CompTag::Signal, "fs*100/1024", -1)
        .unwrap();
    cfg.add_fixed_tone("b", CompTag::Signal, "fs*150/1024", -1)
        .unwrap();
    let spectrum = msq_spectrum(nfft, &[(100, 0.25), (150, 0.25), (50, 1e-6)]);
    let results = analyze(&cfg, &spectrum, nfft, AxisType::DcLeft).unwrap();

    let imd = results.tone("b-a").unwrap();
    assert_eq!((imd.i1, imd.i2), (50, 50));
    assert_relative_eq!(imd.get(ToneResultKind::Mag).unwrap(), 1e-3);

    // ties between equal signals resolve to the first declared
    let carrier = results.get(ResultKind::CarrierIndex).unwrap() as usize;
    assert_eq!(results.tone_keys()[carrier], "a");
    let maxspur = results.get(ResultKind::MaxSpurIndex).unwrap() as usize;
    assert_eq!(results.tone_keys()[maxspur], "b-a");
    let sfdr = results.get(ResultKind::Sfdr).unwrap();
    let a_dbfs = results.tone("a").unwrap().get(ToneResultKind::MagDbfs).unwrap();
    let imd_dbfs = imd.get(ToneResultKind::MagDbfs).unwrap();
    assert_relative_eq!(sfdr, a_dbfs - imd_dbfs, epsilon = 1e-9);
    assert_relative_eq!(sfdr, 53.9794, epsilon = 1e-3);
}

/// S4: the analysis band hides out-of-band energy from every metric.
#[test]
fn analysis_band_restricts() {
    let nfft = 1024;
    let mut cfg = AnalysisConfig::new();
    cfg.set_fsample("1024").unwrap();
    cfg.set_hd(3);
    cfg.set_analysis_band("0", "fs/4").unwrap();
    cfg.add_fixed_tone("a", CompTag::Signal, "fs*100/1024", -1)
        .unwrap();
    let spectrum = msq_spectrum(nfft, &[(100, 0.25), (400, 0.01)]);
    let results = analyze(&cfg, &spectrum, nfft, AxisType::DcLeft).unwrap();

    assert!(results.tone("a").unwrap().inband);
    // 2a sits at bin 200, outside the band around DC
    assert!(!results.tone("2a").unwrap().inband);
    // out-of-band energy at bin 400 reaches neither noise nor the spur
    // ranking
    assert_eq!(results.get(ResultKind::NoiseRss).unwrap(), 0.0);
    assert_eq!(results.get(ResultKind::Fsnr).unwrap(), 3000.0);
    let ab_nbins = results.get(ResultKind::AbNBins).unwrap();
    assert_eq!(ab_nbins, 257.0);
}

/// S6: fsample/fdata/fshift expressions place the tone after shifting.
#[test]
fn expression_aliasing() {
    let nfft = 64;
    let mut cfg = AnalysisConfig::new();
    cfg.set_fsample("1e9").unwrap();
    cfg.set_fdata("fs/2").unwrap();
    cfg.set_fshift("fs/8").unwrap();
    cfg.set_analysis_band("0", "fdata").unwrap();
    cfg.set_hd(1);
    cfg.add_fixed_tone("a", CompTag::Signal, "fs/16", -1).unwrap();
    // fbin = 5e8/64; tone lands at (fs/16 + fs/8) / fbin = 24 bins
    let spectrum = msq_spectrum(nfft, &[(24, 0.25)]);
    let results = analyze(&cfg, &spectrum, nfft, AxisType::DcLeft).unwrap();
    assert_relative_eq!(results.get(ResultKind::FBin).unwrap(), 5e8 / 64.0);
    let a = results.tone("a").unwrap();
    assert_eq!((a.i1, a.i2), (24, 24));
    assert_relative_eq!(a.get(ToneResultKind::Freq).unwrap(), 6.25e7);
    assert_relative_eq!(a.get(ToneResultKind::FFinal).unwrap(), 1.875e8);
    assert_relative_eq!(a.get(ToneResultKind::Mag).unwrap(), 0.5);
}

/// A DC-centered axis reports the upper half of the axis as negative.
#[test]
fn dc_center_normalizes_ffinal() {
    let nfft = 1024;
    let mut cfg = AnalysisConfig::new();
    cfg.set_fsample("1024").unwrap();
    cfg.set_hd(2);
    cfg.add_fixed_tone("a", CompTag::Signal, "fs*100/1024", -1)
        .unwrap();
    let spectrum = msq_spectrum(nfft, &[(100, 0.25)]);
    let results = analyze(&cfg, &spectrum, nfft, AxisType::DcCenter).unwrap();
    let image = results.tone("-a").unwrap();
    assert_relative_eq!(image.get(ToneResultKind::FFinal).unwrap(), -100.0);
    let a = results.tone("a").unwrap();
    assert_relative_eq!(a.get(ToneResultKind::FFinal).unwrap(), 100.0);
}

/// Interleaved Re/Im input enables single-bin phase results.
#[test]
fn phase_from_complex_data() {
    let nfft = 256;
    let mut cfg = AnalysisConfig::new();
    cfg.set_fsample("256").unwrap();
    cfg.set_hd(2);
    cfg.add_fixed_tone("a", CompTag::Signal, "fs*40/256", -1).unwrap();
    let mut interleaved = vec![0.0; 2 * nfft];
    // bin 40 = 0 + 0.5i: ms 0.25, phase pi/2
    interleaved[2 * 40 + 1] = 0.5;
    // bin 80 = -0.001: a small real-axis second harmonic
    interleaved[2 * 80] = -0.001;
    let results = analyze(&cfg, &interleaved, nfft, AxisType::DcLeft).unwrap();
    let a = results.tone("a").unwrap();
    assert_relative_eq!(a.get(ToneResultKind::Mag).unwrap(), 0.5);
    assert_relative_eq!(
        a.get(ToneResultKind::Phase).unwrap(),
        std::f64::consts::FRAC_PI_2
    );
    assert_relative_eq!(a.get(ToneResultKind::PhaseC).unwrap(), 0.0);
    let hd2 = results.tone("2a").unwrap();
    assert_relative_eq!(
        hd2.get(ToneResultKind::Phase).unwrap(),
        std::f64::consts::PI
    );
    assert_relative_eq!(
        hd2.get(ToneResultKind::PhaseC).unwrap(),
        std::f64::consts::FRAC_PI_2
    );
}

/// Worst-other tones are re-keyed strongest first and feed the spur
/// ranking.
#[test]
fn worst_others_ranked() {
    let nfft = 1024;
    let mut cfg = AnalysisConfig::new();
    cfg.set_fsample("1024").unwrap();
    cfg.set_hd(1);
    cfg.set_wo(3);
    cfg.add_fixed_tone("a", CompTag::Signal, "fs*100/1024", -1)
        .unwrap();
    let spectrum = msq_spectrum(nfft, &[(100, 0.25), (300, 1e-4), (500, 4e-4), (700, 1e-6)]);
    let results = analyze(&cfg, &spectrum, nfft, AxisType::DcLeft).unwrap();
    let wo1 = results.tone("wo1").unwrap();
    let wo2 = results.tone("wo2").unwrap();
    let wo3 = results.tone("wo3").unwrap();
    assert_eq!((wo1.i1, wo2.i1, wo3.i1), (500, 300, 700));
    assert!(wo1.get(ToneResultKind::Mag).unwrap() >= wo2.get(ToneResultKind::Mag).unwrap());
    assert!(wo2.get(ToneResultKind::Mag).unwrap() >= wo3.get(ToneResultKind::Mag).unwrap());
    // the strongest worst-other is the max spur
    let sfdr = results.get(ResultKind::Sfdr).unwrap();
    assert_relative_eq!(sfdr, 10.0 * (0.25f64 / 4e-4).log10(), epsilon = 1e-9);
}

/// A max tone claims the largest remaining in-band energy and publishes
/// its frequency to later expressions.
#[test]
fn max_tone_search() {
    let nfft = 1024;
    let mut cfg = AnalysisConfig::new();
    cfg.set_fsample("1024").unwrap();
    cfg.set_hd(2);
    cfg.add_max_tone("a", CompTag::Signal, "0", "fdata", -1).unwrap();
    let spectrum = msq_spectrum(nfft, &[(100, 0.25), (200, 1e-4)]);
    let results = analyze(&cfg, &spectrum, nfft, AxisType::DcLeft).unwrap();
    let a = results.tone("a").unwrap();
    assert_eq!((a.i1, a.i2), (100, 100));
    assert_relative_eq!(a.get(ToneResultKind::Freq).unwrap(), 100.0);
    // the derived harmonic follows the discovered frequency
    let hd2 = results.tone("2a").unwrap();
    assert_eq!((hd2.i1, hd2.i2), (200, 200));
    assert_relative_eq!(hd2.get(ToneResultKind::Mag).unwrap(), 0.01);
}

/// An empty search yields the null tone.
#[test]
fn empty_wo_search_yields_null_tone() {
    let nfft = 8;
    let mut cfg = AnalysisConfig::new();
    cfg.set_ssb(spectralyze::SsbGroup::Default, 4);
    // DC with ssb 4 swallows the whole 5-bin real spectrum
    let spectrum = msq_spectrum(5, &[(0, 1.0)]);
    let results = analyze(&cfg, &spectrum, nfft, AxisType::Real).unwrap();
    let wo = results.tone("wo").unwrap();
    assert_eq!(wo.get(ToneResultKind::Mag).unwrap(), 0.0);
    assert_eq!(wo.get(ToneResultKind::Freq).unwrap(), 0.0);
    assert_eq!((wo.i1, wo.i2, wo.nbins), (-1, -1, 0));
    assert!(!wo.inband);
}

/// Flat tone keys address individual fields.
#[test]
fn flat_key_projection() {
    let nfft = 64;
    let mut cfg = AnalysisConfig::new();
    cfg.set_fsample("64").unwrap();
    cfg.set_hd(1);
    cfg.add_fixed_tone("a", CompTag::Signal, "fs*10/64", -1).unwrap();
    let spectrum = msq_spectrum(nfft, &[(10, 0.25)]);
    let results = analyze(&cfg, &spectrum, nfft, AxisType::DcLeft).unwrap();
    assert_relative_eq!(results.flat("a:mag").unwrap(), 0.5);
    assert_relative_eq!(results.flat("a:freq").unwrap(), 10.0);
    assert_relative_eq!(results.flat("a:in_band").unwrap(), 1.0);
    assert!(results.flat("a:bogus").is_err());
    assert!(results.flat("missing:mag").is_err());
}

/// Determinism: identical inputs give identical ordered output.
#[test]
fn repeat_analysis_is_bit_identical() {
    let nfft = 512;
    let mut cfg = AnalysisConfig::new();
    cfg.set_fsample("512").unwrap();
    cfg.set_ilv([2, 4]);
    cfg.set_clk([4]);
    cfg.add_fixed_tone("a", CompTag::Signal, "fs*50/512", -1).unwrap();
    let spectrum: Vec<f64> = (0..nfft).map(|i| ((i * 37 % 101) as f64) * 1e-8).collect();
    let first = analyze(&cfg, &spectrum, nfft, AxisType::DcLeft).unwrap();
    let second = analyze(&cfg, &spectrum, nfft, AxisType::DcLeft).unwrap();
    assert_eq!(first.tone_keys(), second.tone_keys());
    for kind in ResultKind::ALL {
        assert_eq!(
            first.get(kind).unwrap().to_bits(),
            second.get(kind).unwrap().to_bits(),
            "{kind:?} differs"
        );
    }
}

#[test]
fn input_validation_errors() {
    let cfg = AnalysisConfig::new();
    // size inconsistent with nfft
    assert!(matches!(
        analyze(&cfg, &[0.0; 100], 64, AxisType::DcLeft),
        Err(Error::Dimension { .. })
    ));
    // negative magnitude
    let mut bad = vec![0.0; 64];
    bad[3] = -1.0;
    assert!(matches!(
        analyze(&cfg, &bad, 64, AxisType::DcLeft),
        Err(Error::BadSpectrum { .. })
    ));
    // non-finite magnitude
    bad[3] = f64::NAN;
    assert!(matches!(
        analyze(&cfg, &bad, 64, AxisType::DcLeft),
        Err(Error::BadSpectrum { .. })
    ));
    // non-positive sample rate
    let mut cfg = AnalysisConfig::new();
    cfg.set_fsample("0").unwrap();
    assert!(matches!(
        analyze(&cfg, &[0.0; 64], 64, AxisType::DcLeft),
        Err(Error::Eval { .. })
    ));
    // undefined variable in a tone expression
    let mut cfg = AnalysisConfig::new();
    cfg.add_fixed_tone("a", CompTag::Signal, "fknown*2", -1).unwrap();
    assert!(matches!(
        analyze(&cfg, &[0.0; 64], 64, AxisType::DcLeft),
        Err(Error::Eval { .. })
    ));
}

/// Later components may reference earlier ones by key; the reverse is an
/// evaluation error.
#[test]
fn component_cross_references() {
    let nfft = 1024;
    let mut cfg = AnalysisConfig::new();
    cfg.set_fsample("1024").unwrap();
    cfg.set_hd(1);
    cfg.add_fixed_tone("a", CompTag::Signal, "fs*100/1024", -1)
        .unwrap();
    cfg.add_fixed_tone("spur", CompTag::UserDist, "a/2", -1).unwrap();
    let spectrum = msq_spectrum(nfft, &[(100, 0.25), (50, 1e-6)]);
    let results = analyze(&cfg, &spectrum, nfft, AxisType::DcLeft).unwrap();
    let spur = results.tone("spur").unwrap();
    assert_eq!((spur.i1, spur.i2), (50, 50));
    assert_relative_eq!(spur.get(ToneResultKind::Mag).unwrap(), 1e-3);

    // forward references fail: the referenced tone is not yet measured
    let mut cfg = AnalysisConfig::new();
    cfg.set_fsample("1024").unwrap();
    cfg.add_fixed_tone("early", CompTag::UserDist, "late/2", -1)
        .unwrap();
    cfg.add_fixed_tone("late", CompTag::Signal, "fs/4", -1).unwrap();
    assert!(matches!(
        analyze(&cfg, &spectrum, nfft, AxisType::DcLeft),
        Err(Error::Eval { .. })
    ));
}
