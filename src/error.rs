use std::fmt;

use crate::backend::AttachmentId;
use crate::types::{PoolKey, TypeTag};

/// Unified error type for pool operations.
///
/// None of these are fatal to the registry: the public API catches them at
/// the backend seam, logs them, and degrades to a no-op result.
#[derive(Debug)]
pub enum Error {
    /// Caller-supplied type tag failed the backend's poolable predicate.
    InvalidTypeTag(TypeTag),

    /// The loader could not resolve a template for this key.
    TemplateNotFound(PoolKey),

    /// A custom-source key was used before a template was registered.
    CustomNotRegistered(PoolKey),

    /// A lifecycle hook raised an error.
    Hook {
        attachment: AttachmentId,
        message: String,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidTypeTag(tag) => write!(f, "type tag is not poolable: {}", tag),
            Error::TemplateNotFound(key) => write!(f, "template not found: {}", key),
            Error::CustomNotRegistered(key) => {
                write!(f, "custom pool has no registered template: {}", key)
            }
            Error::Hook {
                attachment,
                message,
            } => write!(f, "hook failed on attachment {}: {}", attachment, message),
        }
    }
}

impl std::error::Error for Error {}

/// Result type alias for pool operations.
pub type Result<T> = std::result::Result<T, Error>;
