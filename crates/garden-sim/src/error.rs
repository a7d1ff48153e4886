use thiserror::Error;

/// Errors raised while setting up a garden.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimError {
    #[error("invalid canvas size {width}x{height}")]
    InvalidCanvas { width: f64, height: f64 },

    #[error("invalid planting parameter {name}: {reason}")]
    InvalidPlanting { name: &'static str, reason: String },
}

pub type SimResult<T> = Result<T, SimError>;
