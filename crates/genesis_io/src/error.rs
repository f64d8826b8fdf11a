use thiserror::Error;

#[derive(Error, Debug)]
pub enum IoError {
    #[error("File system error: {0}")]
    FileSystem(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Compression error: {0}")]
    Compression(String),

    /// A record that parsed but breaks a world invariant.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Written by a newer schema than this build knows.
    #[error("Unsupported schema version {found} (newest known is {supported})")]
    Schema { found: u32, supported: u32 },

    #[error("Save not found: {0}")]
    NotFound(String),

    #[error("{context}: {source}")]
    Context {
        context: String,
        source: Box<IoError>,
    },
}

pub type Result<T> = std::result::Result<T, IoError>;

impl IoError {
    #[must_use]
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        Self::Validation(msg.into())
    }

    #[must_use]
    pub fn not_found<S: Into<String>>(what: S) -> Self {
        Self::NotFound(what.into())
    }

    #[must_use]
    pub fn compression<S: Into<String>>(msg: S) -> Self {
        Self::Compression(msg.into())
    }

    /// Names the save or directory an error happened on.
    #[must_use]
    pub fn with_context<S: Into<String>>(self, context: S) -> Self {
        Self::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_wraps_the_source() {
        let err = IoError::not_found("world-000001.json.gz").with_context("loading save");
        let text = err.to_string();
        assert!(text.starts_with("loading save: "));
        assert!(text.contains("world-000001.json.gz"));
    }

    #[test]
    fn test_schema_error_names_versions() {
        let err = IoError::Schema {
            found: 9,
            supported: 3,
        };
        assert_eq!(
            err.to_string(),
            "Unsupported schema version 9 (newest known is 3)"
        );
    }
}
