use thiserror::Error;

#[derive(Debug, Error)]
pub enum CfspyError {
    #[error("Configuration error: {0}")]
    Config(String),
}

impl CfspyError {
    /// Short error code string used in structured logs.
    pub fn code(&self) -> &'static str {
        match self {
            CfspyError::Config(_) => "CONFIG_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, CfspyError>;
