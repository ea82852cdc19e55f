//! Error types for mwaytree.

use thiserror::Error;

use crate::common::config::{MAX_ORDER, MIN_ORDER};

/// Convenient Result type alias.
///
/// Instead of writing `Result<T, Error>` everywhere, we can write `Result<T>`.
pub type Result<T> = std::result::Result<T, Error>;

/// All possible errors in mwaytree.
///
/// A key that is simply absent is not an error: searches report
/// `found == false` and deletions return `Ok(false)`.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error from file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Requested node position lies past the end of the file.
    #[error("node {0} not found")]
    NodeNotFound(u32),

    /// Position 0 holds the header and can never store a node.
    #[error("invalid node id: {0}")]
    InvalidNodeId(u32),

    /// The index file was built with a different order than requested.
    #[error("index built with order {stored} but order {requested} was requested")]
    ConfigMismatch { stored: usize, requested: usize },

    /// Order outside the supported range.
    #[error("invalid order {0}: must be within [{min}, {max}]", min = MIN_ORDER, max = MAX_ORDER)]
    InvalidOrder(usize),

    /// Malformed text input.
    #[error("format error on line {line}: {reason}")]
    Format { line: usize, reason: String },

    /// A block or record could not be decoded.
    #[error("corrupted block {id}: {reason}")]
    Corrupt { id: u32, reason: String },

    /// Record payload longer than the fixed payload field.
    #[error("payload of {len} bytes exceeds maximum of {max}")]
    PayloadTooLarge { len: usize, max: usize },
}

impl Error {
    pub(crate) fn format(line: usize, reason: impl Into<String>) -> Self {
        Error::Format {
            line,
            reason: reason.into(),
        }
    }

    pub(crate) fn corrupt(id: u32, reason: impl Into<String>) -> Self {
        Error::Corrupt {
            id,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::NodeNotFound(42);
        assert_eq!(format!("{}", err), "node 42 not found");

        let err = Error::ConfigMismatch {
            stored: 4,
            requested: 3,
        };
        assert_eq!(
            format!("{}", err),
            "index built with order 4 but order 3 was requested"
        );

        let err = Error::InvalidOrder(40);
        assert_eq!(
            format!("{}", err),
            "invalid order 40: must be within [3, 32]"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();

        match err {
            Error::Io(_) => {} // Success
            _ => panic!("Expected Io error"),
        }
    }

    #[test]
    fn test_format_helper() {
        let err = Error::format(3, "keys not increasing");
        assert_eq!(format!("{}", err), "format error on line 3: keys not increasing");
    }
}
