//! Websocket message reader.
//!
//! [`FrameReader`] owns the bytes received on one connection which have
//! not been consumed yet. Bytes left over after an incomplete frame stay
//! in the buffer until the next read completes them, and fragmented
//! messages are reassembled before they are handed out.

mod read;
mod state;

use state::ReadState;

/// A complete message, or a control frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Text(String),
    Binary(Vec<u8>),
    Ping(Vec<u8>),
    Pong(Vec<u8>),
    /// Status code, if the peer sent one.
    Close(Option<u16>),
}

/// Incremental frame reader.
pub struct FrameReader {
    buf: Vec<u8>,
    max_len: usize,
    read_state: ReadState,
}

impl std::fmt::Debug for FrameReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameReader")
            .field("buffered", &self.buf.len())
            .field("max_len", &self.max_len)
            .field("read_state", &self.read_state)
            .finish()
    }
}

impl FrameReader {
    /// Create an empty reader. Messages larger than
    /// `max_len` bytes are rejected.
    #[inline]
    pub const fn new(max_len: usize) -> Self {
        FrameReader {
            buf: Vec::new(),
            max_len,
            read_state: ReadState::new(),
        }
    }

    /// Number of buffered bytes not consumed yet.
    #[inline]
    pub fn buffered(&self) -> usize { self.buf.len() }

    /// Check if a fragmented message is partially read.
    #[inline]
    pub const fn is_read_partial(&self) -> bool {
        matches!(&self.read_state, ReadState::Fragmented { .. })
    }

    /// Check if a `Close` frame is received.
    #[inline]
    pub const fn is_read_close(&self) -> bool { matches!(&self.read_state, ReadState::Close) }
}
