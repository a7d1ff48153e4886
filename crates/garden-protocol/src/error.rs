//! Error types for the serial protocol.

use thiserror::Error;

/// Errors that can occur when decoding a line from the sensor board.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// The line was empty after trimming.
    #[error("empty line")]
    EmptyLine,

    /// The line did not have the expected number of comma separated fields.
    #[error("expected {expected} fields, got {actual}")]
    FieldCount {
        /// Number of fields the message requires.
        expected: usize,
        /// Number of fields found on the line.
        actual: usize,
    },

    /// A field could not be parsed as an integer.
    #[error("field {index} is not an integer: {value:?}")]
    InvalidField {
        /// Zero-based field position.
        index: usize,
        /// The raw field text.
        value: String,
    },

    /// The line is not a message this dialect understands.
    #[error("unknown message: {0:?}")]
    UnknownMessage(String),
}

impl ProtocolError {
    /// Whether the error means the line itself was malformed.
    ///
    /// Malformed lines are discarded and the last good state is kept; unknown
    /// messages are ignored the same way but are reported separately.
    pub fn is_malformed(&self) -> bool {
        !matches!(self, ProtocolError::UnknownMessage(_))
    }
}

/// Result type alias for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;
