use std::fmt::{self, Display, Formatter};

/// The kind of error that occurred.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The provider could not be reached, or the connection broke.
    Transport,
    /// The provider rejected the credentials.
    Unauthorized,
    /// The model provider is rate limited.
    RateLimitExceeded,
    /// The provider answered with any other non-success status.
    Provider,
    /// The response is missing fields every response must carry.
    MalformedResponse,
    /// Any other errors.
    Other,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Transport => write!(f, "Transport error"),
            ErrorKind::Unauthorized => write!(f, "Unauthorized"),
            ErrorKind::RateLimitExceeded => write!(f, "Rate limit exceeded"),
            ErrorKind::Provider => write!(f, "Provider error"),
            ErrorKind::MalformedResponse => write!(f, "Malformed response"),
            ErrorKind::Other => write!(f, "Other error"),
        }
    }
}
