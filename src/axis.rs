//! Frequency-axis helpers: aliasing, coherent-frequency snapping, and
//! annotation axes for plotting or tabulating spectra.

use crate::enums::{AxisType, FreqAxisFormat};
use crate::error::{Error, Result};

/// Reduces `freq` onto the axis described by `axis_type`:
/// `DcCenter` → [−fs/2, fs/2), `DcLeft` → [0, fs), `Real` → folded
/// [0, fs/2].
pub fn alias(fs: f64, freq: f64, axis_type: AxisType) -> Result<f64> {
    if !(fs > 0.0) {
        return Err(Error::Eval {
            reason: "fs <= 0".to_string(),
        });
    }
    let freq = freq - (freq / fs).floor() * fs; // freq in [0, fs)
    Ok(match axis_type {
        AxisType::DcCenter => {
            if fs <= 2.0 * freq {
                freq - fs
            } else {
                freq
            }
        }
        AxisType::Real => {
            if fs < 2.0 * freq {
                fs - freq
            } else {
                freq
            }
        }
        AxisType::DcLeft => freq,
    })
}

/// Snaps `freq` to a coherent bin frequency: a whole number of cycles over
/// `nfft` points, chosen odd when `nfft` is a power of two so repeated
/// captures do not land on common subharmonics.
pub fn coherent(nfft: usize, fs: f64, freq: f64) -> Result<f64> {
    if nfft == 0 {
        return Err(Error::Dimension {
            reason: "nfft must be positive".to_string(),
        });
    }
    if !(fs > 0.0) {
        return Err(Error::Eval {
            reason: "fs <= 0".to_string(),
        });
    }
    if nfft == 1 {
        return Ok(freq);
    }
    let fbin = fs / nfft as f64;
    let mut cycles = freq.abs() / fbin;
    if nfft.is_power_of_two() {
        cycles = cycles.floor();
        if cycles % 2.0 == 0.0 {
            cycles += 1.0;
        }
    } else {
        cycles = cycles.round();
    }
    Ok(cycles.copysign(freq) * fbin)
}

/// Number of axis points for a spectrum of length `nfft`.
pub fn freq_axis_size(nfft: usize, axis_type: AxisType) -> usize {
    if axis_type == AxisType::Real {
        nfft / 2 + 1
    } else {
        nfft
    }
}

/// Builds the annotation axis for a spectrum of length `nfft` in the
/// requested units.
pub fn freq_axis(
    nfft: usize,
    axis_type: AxisType,
    fs: f64,
    axis_format: FreqAxisFormat,
) -> Result<Vec<f64>> {
    if nfft == 0 {
        return Err(Error::Dimension {
            reason: "nfft must be positive".to_string(),
        });
    }
    let size = freq_axis_size(nfft, axis_type);
    let start = if axis_type == AxisType::DcCenter {
        -((nfft / 2) as f64)
    } else {
        0.0
    };
    let unit = match axis_format {
        FreqAxisFormat::Bins => 1.0,
        FreqAxisFormat::Freq => fs / nfft as f64,
        FreqAxisFormat::Norm => 1.0 / nfft as f64,
    };
    Ok((0..size).map(|i| (start + i as f64) * unit).collect())
}

/// Rotates spectrum data so that DC sits in the middle.
pub fn fftshift<T: Copy>(data: &mut [T]) {
    let mut offset = data.len() / 2;
    if data.len() % 2 == 1 {
        offset += 1;
    }
    data.rotate_left(offset);
}

/// Inverse of [`fftshift`].
pub fn ifftshift<T: Copy>(data: &mut [T]) {
    data.rotate_left(data.len() / 2);
}
