//! Error types for ntunnel.

use thiserror::Error;

use crate::protocol::errno;

/// The main error type for tunnel operations.
#[derive(Debug, Error)]
pub enum TunnelError {
    /// Opening or pinging the database failed.
    #[error("Connection error: {0}")]
    Connection(String),

    /// A statement failed to execute or its columns could not be read.
    #[error("Query error: {0}")]
    Query(String),

    /// A single row failed to decode while scanning a result set.
    #[error("Scan error: {0}")]
    Scan(String),

    /// A required request parameter is missing or malformed.
    #[error("invalid parameters")]
    InvalidParameters(String),

    /// The action code is not one of `C` or `Q`.
    #[error("invalid action")]
    InvalidAction(String),

    /// A tunnel response could not be decoded.
    #[error("Decode error at byte {offset}: {message}")]
    Decode { offset: usize, message: String },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TunnelError {
    /// Create a decode error at the given byte offset.
    pub fn decode(offset: usize, message: impl Into<String>) -> Self {
        Self::Decode {
            offset,
            message: message.into(),
        }
    }

    /// Wire error code reported to the client for this error.
    pub fn errno(&self) -> u32 {
        match self {
            Self::Connection(_) => errno::CONNECT,
            Self::InvalidParameters(_) | Self::InvalidAction(_) => errno::INVALID_PARAMETERS,
            _ => errno::QUERY,
        }
    }

    /// Text carried in the message Block of an error frame.
    ///
    /// Driver failures are passed through verbatim so the client shows the
    /// database's own wording.
    pub fn frame_message(&self) -> String {
        match self {
            Self::Connection(msg) | Self::Query(msg) | Self::Scan(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}

/// Result type alias for tunnel operations.
pub type TunnelResult<T> = Result<T, TunnelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TunnelError::decode(16, "truncated block");
        assert_eq!(err.to_string(), "Decode error at byte 16: truncated block");
    }

    #[test]
    fn test_errno_mapping() {
        assert_eq!(TunnelError::Connection("refused".into()).errno(), 2000);
        assert_eq!(TunnelError::Query("bad column".into()).errno(), 1000);
        assert_eq!(TunnelError::InvalidParameters("host".into()).errno(), 202);
        assert_eq!(TunnelError::InvalidAction("X".into()).errno(), 202);
    }

    #[test]
    fn test_frame_message_passes_driver_text_through() {
        let err = TunnelError::Connection("Access denied for user 'root'".into());
        assert_eq!(err.frame_message(), "Access denied for user 'root'");

        let err = TunnelError::InvalidAction("Z".into());
        assert_eq!(err.frame_message(), "invalid action");
    }
}
