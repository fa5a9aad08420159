pub mod convert;
pub mod dsp;
pub mod error;
pub mod processor;
pub mod session;
pub mod types;

pub use convert::*;
pub use dsp::{Compressor, GainComputer, Smoother};
pub use error::*;
pub use processor::*;
pub use session::*;
pub use types::*;

// Parameter model shared with hosts
pub use dynacomp_core::{ControlParams, ParamId, ParameterSource, ParameterStore};
