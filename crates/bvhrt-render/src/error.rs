//! Error types for the render drivers.

use thiserror::Error;

/// Errors that can occur while configuring a render.
#[derive(Error, Debug)]
pub enum RenderError {
    /// Invalid render settings.
    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    /// Settings text is not valid TOML for [`crate::RenderSettings`].
    #[error("failed to parse settings: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Result type for render operations.
pub type Result<T> = std::result::Result<T, RenderError>;
