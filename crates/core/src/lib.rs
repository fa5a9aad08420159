pub mod dsp_settings;
pub mod error;
pub mod models;
pub mod store;
pub mod traits;

pub use dsp_settings::*;
pub use error::ConfigError;
pub use models::*;
pub use store::*;
pub use traits::*;
