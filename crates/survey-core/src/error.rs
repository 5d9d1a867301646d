//! Error types for the survey planning engine

use thiserror::Error;

/// Core error type for the survey planning engine
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Degenerate geometry: {0}")]
    GeometryDegenerate(String),

    #[error("Invalid configuration: {0}")]
    ConfigurationInvalid(String),

    #[error("Unknown camera preset: {0}")]
    UnknownCamera(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CoreError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn geometry_degenerate(msg: impl Into<String>) -> Self {
        Self::GeometryDegenerate(msg.into())
    }

    pub fn configuration_invalid(msg: impl Into<String>) -> Self {
        Self::ConfigurationInvalid(msg.into())
    }

    pub fn unknown_camera(name: impl Into<String>) -> Self {
        Self::UnknownCamera(name.into())
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
