//! Error types for jrot
//!
//! Two error types with different jobs:
//!
//! - [`Error`]: the library-level error enum used in `Result`s throughout
//!   the jrot crates (uses thiserror)
//! - [`ErrorData`]: the wire-format error object that appears in the
//!   `error` member of a JSON-RPC response
//!
//! # Standard error codes
//!
//! - `-32700`: parse error (malformed JSON)
//! - `-32600`: invalid request (well-formed JSON, wrong shape)
//! - `-32601`: method not found
//!
//! Procedures may signal any other application-defined code; it is passed
//! through to the wire unchanged.

use crate::parser::ParseError;
use crate::value::Value;
use thiserror::Error as ThisError;

/// Result type for jrot operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Library-level error for jrot operations.
#[derive(Debug, Clone, ThisError)]
pub enum Error {
    /// A JSON-RPC error already in wire shape, typically received from a
    /// peer's error response.
    #[error("JSON-RPC error: {0}")]
    Rpc(#[from] ErrorData),

    /// The input was not valid JSON.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Low-level I/O failure on a socket.
    #[error("IO error: {0}")]
    Io(String),

    /// A message that is well-formed JSON but not a valid request or
    /// response shape.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The requested method is not in the procedure table.
    #[error("method not found: {0}")]
    MethodNotFound(String),

    /// The connection is no longer usable.
    #[error("connection closed")]
    ConnectionClosed,
}

/// JSON-RPC wire-format error object: a numeric code plus a short message.
///
/// Appears as the `error` member of an error response. Use the standard
/// constructors for the reserved JSON-RPC codes and [`ErrorData::new`] for
/// application-defined ones.
///
/// # Examples
///
/// ```rust
/// use jrot_core::ErrorData;
///
/// let err = ErrorData::method_not_found();
/// assert_eq!(err.code, -32601);
///
/// let custom = ErrorData::new(-320, "tank pressure out of range");
/// assert_eq!(custom.to_string(), "[-320] tank pressure out of range");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorData {
    /// Numeric error code.
    pub code: i32,
    /// Human-readable error message.
    pub message: String,
}

impl ErrorData {
    /// Create an error with an application-defined code and message.
    pub fn new(code: i32, message: impl Into<String>) -> ErrorData {
        ErrorData {
            code,
            message: message.into(),
        }
    }

    /// Parse error (-32700): the peer sent malformed JSON.
    pub fn parse_error() -> ErrorData {
        ErrorData::new(-32700, "Parse error. Invalid JSON was received by the server.")
    }

    /// Invalid request (-32600): valid JSON, but not a request object.
    pub fn invalid_request() -> ErrorData {
        ErrorData::new(-32600, "The JSON sent is not a valid Request object.")
    }

    /// Method not found (-32601).
    pub fn method_not_found() -> ErrorData {
        ErrorData::new(-32601, "Method not found.")
    }

    /// Render as the wire-format object `{"code": ..., "message": ...}`.
    pub fn to_value(&self) -> Value {
        let mut obj = Value::object();
        obj.insert("code", self.code);
        obj.insert("message", self.message.as_str());
        obj
    }

    /// Read back from a wire-format object. Returns `None` when either
    /// member is missing or of the wrong kind.
    pub fn from_value(value: &Value) -> Option<ErrorData> {
        let code = value.member("code")?.as_i64()? as i32;
        let message = value.member("message")?.as_str()?.to_string();
        Some(ErrorData { code, message })
    }
}

impl std::fmt::Display for ErrorData {
    /// Formats as `[code] message` for readable logs.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for ErrorData {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_codes() {
        assert_eq!(ErrorData::parse_error().code, -32700);
        assert_eq!(ErrorData::invalid_request().code, -32600);
        assert_eq!(ErrorData::method_not_found().code, -32601);
    }

    #[test]
    fn test_display_format() {
        let err = ErrorData::method_not_found();
        assert_eq!(err.to_string(), "[-32601] Method not found.");
    }

    #[test]
    fn test_value_round_trip() {
        let err = ErrorData::new(-320, "custom failure");
        let restored = ErrorData::from_value(&err.to_value()).unwrap();
        assert_eq!(restored, err);
    }

    #[test]
    fn test_from_value_rejects_wrong_shapes() {
        assert!(ErrorData::from_value(&Value::Null).is_none());

        let mut missing_message = Value::object();
        missing_message.insert("code", -1);
        assert!(ErrorData::from_value(&missing_message).is_none());

        let mut wrong_kind = Value::object();
        wrong_kind.insert("code", "not a number");
        wrong_kind.insert("message", "m");
        assert!(ErrorData::from_value(&wrong_kind).is_none());
    }

    #[test]
    fn test_error_enum_display() {
        let err = Error::MethodNotFound("frobnicate".to_string());
        assert!(err.to_string().contains("frobnicate"));

        let err = Error::Rpc(ErrorData::parse_error());
        assert!(err.to_string().contains("-32700"));
    }
}
