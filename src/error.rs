//! Error types for world generation and persistence.

use thiserror::Error;

use crate::layers::LayerKind;

/// Errors raised by world construction, generation and save/load.
#[derive(Debug, Error)]
pub enum GenError {
    /// Invalid construction parameters (dimension, layer list).
    #[error("invalid configuration: {reason}")]
    Configuration { reason: String },

    /// A layer was asked to generate before one of its prerequisites.
    #[error("layer {layer:?} requires {missing:?}, which is absent or not yet generated")]
    Prerequisite { layer: LayerKind, missing: LayerKind },

    /// More features were requested than the cell format can hold.
    /// Generation keeps everything built so far.
    #[error("feature id space exhausted (limit {limit})")]
    Capacity { limit: u32 },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A save blob could not be encoded or decoded.
    #[error("codec error: {0}")]
    Codec(String),
}

impl GenError {
    pub(crate) fn config(reason: impl Into<String>) -> Self {
        GenError::Configuration { reason: reason.into() }
    }
}
