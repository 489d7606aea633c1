//! Error types

use thiserror::Error;

/// Errors surfaced by the cube engine
#[derive(Error, Debug)]
pub enum CubeError {
    /// Move token with an unknown face letter or suffix
    #[error("invalid move token: {0:?}")]
    InvalidMoveToken(String),
    /// Engine setting outside its allowed range
    #[error("invalid setting `{name}`: {reason}")]
    InvalidSetting { name: &'static str, reason: String },
    /// Settings JSON could not be parsed
    #[error("malformed settings: {0}")]
    SettingsFormat(#[from] serde_json::Error),
}
