//! Error type shared by every fallible operation in the crate.

use snafu::Snafu;

/// Analysis error.
///
/// Setters reject bad input immediately; [`crate::engine::analyze`]
/// validates its inputs before touching the results object, so a caller
/// never observes partial results.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    /// Expression string is syntactically invalid
    #[snafu(display("expression parse error: {reason}"))]
    Parse { reason: String },

    /// Expression could not be evaluated against the variable scope
    #[snafu(display("expression evaluation error: {reason}"))]
    Eval { reason: String },

    /// Component or variable key is reserved, duplicate, invalid, or missing
    #[snafu(display("key '{key}' {reason}"))]
    Key { key: String, reason: String },

    /// Integer parameter outside its legal range
    #[snafu(display("{name} = {value} is outside [{min}, {max}]"))]
    Range {
        name: String,
        value: i64,
        min: i64,
        max: i64,
    },

    /// Spectrum size inconsistent with NFFT, or mask sizes incompatible
    #[snafu(display("dimension error: {reason}"))]
    Dimension { reason: String },

    /// Spectrum contains a negative or non-finite magnitude
    #[snafu(display("bad spectrum: {reason}"))]
    BadSpectrum { reason: String },

    /// Persistence input is malformed
    #[snafu(display("load error: {reason}"))]
    Load { reason: String },

    /// Algorithm invariant violated; should be unreachable
    #[snafu(display("internal error: {reason}"))]
    Internal { reason: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
