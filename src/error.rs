//! Error taxonomy for the index core.
//!
//! Every error carries a stable kind plus a message that is safe to
//! show to the uploader. Storage failures are logged with full detail
//! at the call site and surface here as an opaque database error.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ApiError>;

/// Errors produced by package ingestion and resolution.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Uploaded archive is larger than the configured limit.
    #[error("File size exceeds maximum allowed size")]
    SizeLimitExceeded,

    /// The archive opened fine but contains no `mod.json` entry.
    #[error("mod.json not found")]
    MissingManifest,

    /// A manifest field failed structural validation (id format,
    /// missing developer, bad link URL, ...). The message names the
    /// offending field.
    #[error("{0}")]
    BadRequest(String),

    /// A version or constraint string did not parse.
    #[error("Invalid semver {0}")]
    InvalidVersionString(String),

    /// A `.dylib` payload is neither a recognized fat archive nor a
    /// single-architecture Mach-O binary.
    #[error("Invalid MacOS binary")]
    UnknownBinaryFormat,

    /// The logo decoded but is not square.
    #[error("Mod logo must have 1:1 aspect ratio. Current size is {width}x{height}")]
    AspectRatio { width: u32, height: u32 },

    /// The logo bytes could not be decoded at all.
    #[error("Invalid logo.png: {0}")]
    InvalidLogo(String),

    /// Storage collaborator failed. Detail is retained as the source
    /// but never shown to the caller.
    #[error("Unknown database error")]
    Db(#[from] StoreError),

    /// A requested mod or version does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Anything unexpected; never exposes internal detail.
    #[error("Internal server error")]
    Internal,
}

impl ApiError {
    /// Stable machine-readable kind, independent of the display message.
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::SizeLimitExceeded => "SizeLimitExceeded",
            ApiError::MissingManifest => "MissingManifest",
            ApiError::BadRequest(_) => "BadRequest",
            ApiError::InvalidVersionString(_) => "InvalidVersionString",
            ApiError::UnknownBinaryFormat => "UnknownBinaryFormat",
            ApiError::AspectRatio { .. } => "AspectRatioError",
            ApiError::InvalidLogo(_) => "InvalidLogo",
            ApiError::Db(_) => "DbError",
            ApiError::NotFound(_) => "NotFound",
            ApiError::Internal => "InternalError",
        }
    }
}

/// Failures reported by the storage collaborator.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to acquire a connection: {0}")]
    Acquire(String),

    #[error("query failed: {0}")]
    Query(String),

    #[error("transaction failed: {0}")]
    Transaction(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn db_error_hides_internal_detail() {
        let err = ApiError::from(StoreError::Query("relation deps does not exist".into()));
        assert_eq!(err.to_string(), "Unknown database error");
        assert_eq!(err.kind(), "DbError");
    }

    #[test]
    fn aspect_ratio_message_names_dimensions() {
        let err = ApiError::AspectRatio {
            width: 300,
            height: 200,
        };
        assert_eq!(
            err.to_string(),
            "Mod logo must have 1:1 aspect ratio. Current size is 300x200"
        );
    }
}
