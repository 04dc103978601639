//! Numeric limits shared across the analysis modules.
//!
//! Mean-square magnitudes are clipped into [`MIN_MS`, `MAX_MS`] before any
//! logarithm is taken, so dB figures saturate at `ABS_MIN_DB`/`ABS_MAX_DB`
//! instead of producing infinities.

/// Smallest mean-square value accepted by the dB converters.
pub const MIN_MS: f64 = 1e-300;

/// Largest mean-square value accepted by the dB converters.
pub const MAX_MS: f64 = 1e300;

/// Smallest RMS value accepted by the dB converters.
pub const MIN_RMS: f64 = 1e-150;

/// Largest RMS value accepted by the dB converters.
pub const MAX_RMS: f64 = 1e150;

/// dB floor corresponding to `MIN_MS`.
pub const ABS_MIN_DB: f64 = -3000.0;

/// dB ceiling corresponding to `MAX_MS`.
pub const ABS_MAX_DB: f64 = 3000.0;

/// Harmonic-distortion order limits and default.
pub const MIN_HD: i32 = 1;
pub const MAX_HD: i32 = 99;
pub const DEF_HD: i32 = 6;

/// Intermodulation-distortion order limits and default.
pub const MIN_IMD: i32 = 1;
pub const MAX_IMD: i32 = 9;
pub const DEF_IMD: i32 = 3;

/// Worst-other count limits and default.
pub const MIN_WO: i32 = 1;
pub const MAX_WO: i32 = 9;
pub const DEF_WO: i32 = 1;

/// Single-side-bin limits. `-1` in user input means "inherit the group
/// default" and is accepted by every group except `Default`.
pub const MIN_SSB: i32 = 0;
pub const MAX_SSB: i32 = 1 << 29;
pub const DEF_SSB: i32 = 0;

/// Clock sub-harmonic divisor domain.
pub const MIN_CLK: i32 = 2;
pub const MAX_CLK: i32 = 256;

/// Interleaving factor domain.
pub const MIN_ILV: i32 = 2;
pub const MAX_ILV: i32 = 64;
