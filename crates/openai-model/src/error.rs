use std::error::Error as StdError;
use std::fmt::{self, Display};

use hermitclaw_model::{ErrorKind, ModelProviderError};
use reqwest::StatusCode;
use serde_json::Value;

/// Error type for [`OpenAIProvider`](crate::OpenAIProvider).
#[derive(Debug)]
pub struct Error {
    message: String,
    kind: ErrorKind,
}

impl Error {
    pub(crate) fn new(message: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }

    #[inline]
    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Self::new(message, ErrorKind::MalformedResponse)
    }

    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        Self::new(format!("{err}"), ErrorKind::Transport)
    }

    /// Maps a non-success status to an error, preferring the message
    /// from an OpenAI style `{"error": {"message": ...}}` body.
    pub(crate) fn from_status(status: StatusCode, body: &str) -> Self {
        let kind = match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                ErrorKind::Unauthorized
            }
            StatusCode::TOO_MANY_REQUESTS => ErrorKind::RateLimitExceeded,
            _ => ErrorKind::Provider,
        };
        let detail = serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|v| error_message(&v).map(ToOwned::to_owned))
            .unwrap_or_else(|| body.trim().to_owned());
        let message = if detail.is_empty() {
            format!("HTTP {status}")
        } else {
            format!("HTTP {status}: {detail}")
        };
        Self::new(message, kind)
    }

    /// Returns the error message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

fn error_message(body: &Value) -> Option<&str> {
    let error = body.get("error")?;
    error
        .get("message")
        .and_then(Value::as_str)
        .or_else(|| error.as_str())
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl StdError for Error {}

impl ModelProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_kinds() {
        let err = Error::from_status(
            StatusCode::UNAUTHORIZED,
            r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error"}}"#,
        );
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
        assert_eq!(
            err.message(),
            "HTTP 401 Unauthorized: Incorrect API key provided"
        );

        let err = Error::from_status(StatusCode::TOO_MANY_REQUESTS, "");
        assert_eq!(err.kind(), ErrorKind::RateLimitExceeded);
        assert_eq!(err.message(), "HTTP 429 Too Many Requests");

        let err =
            Error::from_status(StatusCode::BAD_GATEWAY, "upstream is down\n");
        assert_eq!(err.kind(), ErrorKind::Provider);
        assert_eq!(err.message(), "HTTP 502 Bad Gateway: upstream is down");
    }
}
