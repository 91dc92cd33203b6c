//! Error types for mesh decoding and 3MF packaging.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort the packaging of an artifact.
///
/// Plate overflow is deliberately not represented here; it is a warning
/// carried in [`crate::builder::BuiltPackage`] and never aborts a build.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or truncated binary mesh input.
    #[error("invalid mesh data: {0}")]
    Format(String),

    /// A material tag with no palette entry under strict lookup.
    #[error("unknown material tag {tag:?} for object {object:?}")]
    UnknownMaterial { tag: String, object: String },

    /// A settings profile name with no registered baseline.
    #[error("unknown settings profile {0:?}")]
    UnknownProfile(String),

    /// Structural invariant violated at serialize time. Detected before any
    /// bytes are written to the destination path.
    #[error("cannot serialize package: {0}")]
    Serialization(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("xml error: {0}")]
    Xml(#[from] quick_xml::SeError),

    #[error("xml writer error: {0}")]
    XmlWrite(#[from] quick_xml::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn format(msg: impl Into<String>) -> Self {
        Error::Format(msg.into())
    }

    pub fn serialization(msg: impl Into<String>) -> Self {
        Error::Serialization(msg.into())
    }
}
