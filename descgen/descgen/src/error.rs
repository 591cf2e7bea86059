//! Error types for the generator facade.

use descgen_schema::SchemaError;

/// Errors produced by [`Generator`](crate::Generator).
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    /// The IDL file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The IDL could not be parsed, resolved or turned into plans.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Rendering text output failed.
    #[error("failed to render output")]
    Render(#[from] std::fmt::Error),
}
