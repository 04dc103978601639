
pub mod axis;
pub mod component;
pub mod config;
pub mod constants;
pub mod engine;
pub mod enums;
pub mod error;
pub mod expression;
pub mod format;
pub mod mask;
pub mod persist;
pub mod results;
pub mod tracing_init;

mod measure;

pub use component::Component;
pub use config::AnalysisConfig;
pub use engine::analyze;
pub use enums::{AxisType, CodeFormat, CompTag, CompType, FreqAxisFormat, SsbGroup, Window};
pub use error::{Error, Result};
pub use expression::Expression;
pub use mask::{BinMask, BoundaryMode};
pub use results::{AnalysisResults, ResultKind, ToneResult, ToneResultKind};
