/// Convenience result type used across thumbdate.
pub type ThumbResult<T> = Result<T, ThumbError>;

/// Error taxonomy shared by the pipeline stages.
#[derive(thiserror::Error, Debug)]
pub enum ThumbError {
    /// Malformed date or time in a batch request.
    #[error("parse error: {0}")]
    Parse(String),

    /// Date-format template that does not compile.
    #[error("template compile error: {0}")]
    Compile(String),

    /// External rasterizer failed to spawn, exited non-zero or timed out.
    #[error("renderer failure: {0}")]
    Renderer(String),

    /// Raster decode or re-encode failed.
    #[error("conversion failure: {0}")]
    Conversion(String),

    /// Temp-file or output-file IO failed.
    #[error("io error: {context}: {source}")]
    Io {
        /// What was being done, usually naming the path.
        context: String,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// Invalid settings or caller-provided data.
    #[error("validation error: {0}")]
    Validation(String),

    /// Wrapped lower-level error from dependencies.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ThumbError {
    /// Build a [`ThumbError::Parse`] value.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Build a [`ThumbError::Compile`] value.
    pub fn compile(msg: impl Into<String>) -> Self {
        Self::Compile(msg.into())
    }

    /// Build a [`ThumbError::Renderer`] value.
    pub fn renderer(msg: impl Into<String>) -> Self {
        Self::Renderer(msg.into())
    }

    /// Build a [`ThumbError::Conversion`] value.
    pub fn conversion(msg: impl Into<String>) -> Self {
        Self::Conversion(msg.into())
    }

    /// Build a [`ThumbError::Io`] value.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Build a [`ThumbError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

/// Attach context to `std::io` results, in the manner of `anyhow::Context`.
pub(crate) trait IoContext<T> {
    fn io_context<C, F>(self, context: F) -> ThumbResult<T>
    where
        C: Into<String>,
        F: FnOnce() -> C;
}

impl<T> IoContext<T> for std::io::Result<T> {
    fn io_context<C, F>(self, context: F) -> ThumbResult<T>
    where
        C: Into<String>,
        F: FnOnce() -> C,
    {
        self.map_err(|source| ThumbError::io(context(), source))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
