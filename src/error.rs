use thiserror::Error;

/// Failures surfaced by [`crate::convert`] and the decoding helpers.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// Input is not well-formed JSON.
    #[error("at JSON path {path} → {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// Input is JSON, but the root is not an object.
    #[error("could not interpret input as an object (found {found})")]
    Shape { found: &'static str },

    #[error("failed to read input: {0}")]
    Io(#[from] std::io::Error),
}

impl ConvertError {
    pub fn is_decode(&self) -> bool { matches!(self, Self::Decode { .. }) }
    pub fn is_shape(&self) -> bool { matches!(self, Self::Shape { .. }) }
}
