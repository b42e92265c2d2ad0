pub mod config;
pub mod error;

pub use config::CfspyConfig;
pub use error::{CfspyError, Result};
