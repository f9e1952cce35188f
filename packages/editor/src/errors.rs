//! Error types for the editor

use protoedit_common::CommonError;
use thiserror::Error;

use crate::record::RecordError;

/// Text that failed the codec parse of its field type
///
/// Local and recoverable: the stored value stays at its last valid value.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{text} is not a valid {expected}")]
pub struct InvalidFormat {
    pub text: String,
    pub expected: String,
}

impl InvalidFormat {
    pub fn new(text: impl Into<String>, expected: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            expected: expected.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum EditorError {
    #[error(transparent)]
    InvalidFormat(#[from] InvalidFormat),

    #[error("Field {field} has unsupported type {kind}")]
    UnsupportedFieldType { field: String, kind: String },

    #[error("Required fields of {message} cannot be completed: {reason}")]
    RequiredClosureUnsatisfiable { message: String, reason: String },

    #[error("Field {0} does not support bulk editing")]
    NotBulkEditable(String),

    #[error("Record error: {0}")]
    Record(#[from] RecordError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Collaborator(#[from] CommonError),

    #[error("Decode error: {0}")]
    Decode(#[from] prost::DecodeError),

    #[error("Malformed document: {0}")]
    Wire(String),

    #[error("Document is not file-backed")]
    NotFileBacked,
}

impl EditorError {
    /// Failures of the byte source, the file system or the document codec
    pub fn is_io_failure(&self) -> bool {
        matches!(
            self,
            EditorError::Io(_)
                | EditorError::Collaborator(_)
                | EditorError::Decode(_)
                | EditorError::Wire(_)
                | EditorError::NotFileBacked
        )
    }
}
