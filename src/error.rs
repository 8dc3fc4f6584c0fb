use std::fmt;

use http::{Method, StatusCode};

use crate::format::SelectionMode;

/// Errors raised while dispatching a request or formatting its result.
///
/// Only [`RestError::UnsupportedMethod`] is turned into a response by
/// [`RestService`](crate::server::RestService). Handler failures and
/// configuration errors are returned to the serving runtime untouched.
#[derive(Debug)]
pub enum RestError {
    /// The controller has no handler for the request verb
    ///
    /// Surfaced as `403 Forbidden` with an empty body.
    UnsupportedMethod {
        /// The verb the client used
        method: Method,
    },
    /// No registered format matched the extension or headers
    NoFormatter {
        /// Which selection mode failed
        mode: SelectionMode,
        /// The extension or MIME type that was looked up
        hint: String,
    },
    /// A format's encoder or decoder rejected its input
    Format {
        /// Format identifier (`json`, `yaml`, ...)
        format: String,
        /// Underlying encoder/decoder message
        message: String,
    },
    /// Developer-error invariant violation, fatal at startup or first use
    ///
    /// Raised when an authentication hook does not complete its phase or when the
    /// configured authenticator id is unknown.
    Configuration {
        /// Human readable description of the violated contract
        message: String,
    },
    /// Error returned by a controller handler, propagated unchanged
    Handler(anyhow::Error),
}

impl RestError {
    /// Build a configuration error from any message
    pub fn configuration(message: impl Into<String>) -> Self {
        RestError::Configuration {
            message: message.into(),
        }
    }

    /// Build a format error for the given format id
    pub fn format(format: &str, message: impl fmt::Display) -> Self {
        RestError::Format {
            format: format.to_string(),
            message: message.to_string(),
        }
    }

    /// HTTP status a serving runtime should use for this error
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            RestError::UnsupportedMethod { .. } => StatusCode::FORBIDDEN,
            RestError::NoFormatter { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            RestError::Format { .. } => StatusCode::BAD_REQUEST,
            RestError::Configuration { .. } | RestError::Handler(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl fmt::Display for RestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RestError::UnsupportedMethod { method } => {
                write!(f, "Unsupported HTTP method: {}", method)
            }
            RestError::NoFormatter { mode, hint } => {
                write!(f, "No formatter available for {} ({})", hint, mode)
            }
            RestError::Format { format, message } => {
                write!(f, "Format '{}' failed: {}", format, message)
            }
            RestError::Configuration { message } => {
                write!(f, "Configuration error: {}", message)
            }
            RestError::Handler(err) => write!(f, "Handler error: {}", err),
        }
    }
}

impl std::error::Error for RestError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RestError::Handler(err) => Some(&**err),
            _ => None,
        }
    }
}

impl From<anyhow::Error> for RestError {
    fn from(err: anyhow::Error) -> Self {
        // A handler may bubble a RestError back up through anyhow (e.g. a failed
        // body decode); keep its original variant.
        match err.downcast::<RestError>() {
            Ok(rest) => rest,
            Err(other) => RestError::Handler(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let err = RestError::UnsupportedMethod {
            method: Method::PATCH,
        };
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            RestError::configuration("x").status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_anyhow_roundtrip_keeps_variant() {
        let original = RestError::format("json", "expected value at line 1");
        let wrapped: anyhow::Error = original.into();
        match RestError::from(wrapped) {
            RestError::Format { format, .. } => assert_eq!(format, "json"),
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn test_plain_anyhow_becomes_handler_error() {
        let err = RestError::from(anyhow::anyhow!("record locked"));
        assert!(matches!(err, RestError::Handler(_)));
        assert_eq!(err.to_string(), "Handler error: record locked");
    }
}
