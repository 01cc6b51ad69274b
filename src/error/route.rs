use std::fmt::{Display, Formatter};

/// Per-message failure, reported to the sender as an `error` envelope.
/// None of these end the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteError {
    InvalidJson,

    Unsupported,

    TooLong,

    Unnamed,
}

impl Display for RouteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        use RouteError::*;
        match self {
            InvalidJson => write!(f, "Invalid JSON"),
            Unsupported => write!(f, "Unsupported message format"),
            TooLong => write!(f, "Message too long (max 5000 characters)"),
            Unnamed => write!(f, "Set a name before sending messages"),
        }
    }
}

// use default impl
impl std::error::Error for RouteError {}
