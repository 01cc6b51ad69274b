use std::fmt::{Display, Formatter};

#[derive(Debug, PartialEq, Eq)]
pub enum FrameError {
    IllegalFin,

    IllegalOpCode,

    IllegalLength,

    IllegalControl,

    IllegalUtf8,

    UnexpectedContinuation,

    ExpectContinuation,

    FrameTooLarge,

    NotEnoughData,
}

impl FrameError {
    /// Status code carried by the close frame sent before
    /// dropping a peer that violated the protocol.
    ///
    /// [RFC-6455 Section 7.4.1](https://datatracker.ietf.org/doc/html/rfc6455#section-7.4.1)
    pub const fn close_code(&self) -> u16 {
        use FrameError::*;
        match self {
            IllegalUtf8 => 1007,
            FrameTooLarge => 1009,
            _ => 1002,
        }
    }
}

impl Display for FrameError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        use FrameError::*;
        match self {
            IllegalFin => write!(f, "Illegal fin value"),
            IllegalOpCode => write!(f, "Illegal opcode value"),
            IllegalLength => write!(f, "Illegal payload length"),
            IllegalControl => write!(f, "Fragmented or oversized control frame"),
            IllegalUtf8 => write!(f, "Text payload is not valid utf-8"),
            UnexpectedContinuation => write!(f, "Continuation frame without a message in progress"),
            ExpectContinuation => write!(f, "New data frame while a message is in progress"),
            FrameTooLarge => write!(f, "Payload exceeds the allowed size"),
            NotEnoughData => write!(f, "Not enough data to parse"),
        }
    }
}

// use default impl
impl std::error::Error for FrameError {}
