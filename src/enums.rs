//! Public enumerations of the analysis API.
//!
//! The string forms produced by [`std::fmt::Display`] are the ones used in
//! configuration previews and in the persistence document, so they are part
//! of the stable interface.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Classification of an expanded spectral component.
///
/// `Noise` means "not DC, not Signal, not distortion": the worst-other
/// search tones carry it, and everything left over in the analysis band is
/// aggregated under it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CompTag {
    /// DC component, always centered on bin 0.
    DC,
    /// Signal component.
    Signal,
    /// Harmonic distortion.
    HD,
    /// Intermodulation distortion.
    IMD,
    /// Interleaving offset component.
    ILOS,
    /// Interleaving gain/timing/bandwidth component.
    ILGT,
    /// Clock component.
    CLK,
    /// User-designated distortion.
    UserDist,
    /// Noise component (e.g. worst-other).
    Noise,
}

impl CompTag {
    pub const ALL: [CompTag; 9] = [
        CompTag::DC,
        CompTag::Signal,
        CompTag::HD,
        CompTag::IMD,
        CompTag::ILOS,
        CompTag::ILGT,
        CompTag::CLK,
        CompTag::UserDist,
        CompTag::Noise,
    ];

    pub fn name(self) -> &'static str {
        match self {
            CompTag::DC => "DC",
            CompTag::Signal => "Signal",
            CompTag::HD => "HD",
            CompTag::IMD => "IMD",
            CompTag::ILOS => "ILOS",
            CompTag::ILGT => "ILGT",
            CompTag::CLK => "CLK",
            CompTag::UserDist => "UserDist",
            CompTag::Noise => "Noise",
        }
    }
}

impl fmt::Display for CompTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CompTag {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CompTag::ALL
            .into_iter()
            .find(|tag| tag.name() == s)
            .ok_or_else(|| Error::Load {
                reason: format!("unknown component tag '{s}'"),
            })
    }
}

/// Structural kind of an expanded component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CompType {
    DC,
    FixedTone,
    MaxTone,
    WOTone,
}

impl CompType {
    pub fn name(self) -> &'static str {
        match self {
            CompType::DC => "DC",
            CompType::FixedTone => "FixedTone",
            CompType::MaxTone => "MaxTone",
            CompType::WOTone => "WOTone",
        }
    }
}

impl fmt::Display for CompType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CompType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [CompType::DC, CompType::FixedTone, CompType::MaxTone, CompType::WOTone]
            .into_iter()
            .find(|ty| ty.name() == s)
            .ok_or_else(|| Error::Load {
                reason: format!("unknown component type '{s}'"),
            })
    }
}

/// Single-side-bin configuration group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SsbGroup {
    /// Default SSB, applied to auto-generated tone components.
    Default,
    /// SSB for the DC component.
    DC,
    /// SSB for Signal components.
    Signal,
    /// SSB for worst-other components.
    WO,
}

/// Frequency-axis layout of the spectrum under analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AxisType {
    /// Complex spectrum presented over [-fs/2, fs/2).
    DcCenter,
    /// Complex spectrum presented over [0, fs).
    DcLeft,
    /// Real spectrum over [0, fs/2].
    Real,
}

/// Units for frequency-axis annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FreqAxisFormat {
    /// Bin indexes.
    Bins,
    /// Hertz.
    Freq,
    /// Cycles per sample.
    Norm,
}

/// Integer code format of quantized waveform data. A boundary concern of
/// the quantization stage; carried here for API compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodeFormat {
    OffsetBinary,
    TwosComplement,
}

/// Window applied before the FFT that produced the spectrum. A boundary
/// concern of the FFT stage; carried here for API compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Window {
    BlackmanHarris,
    Hann,
    NoWindow,
}
