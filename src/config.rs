//! Server settings.
//!
//! Nothing is read from the command line or the environment, the binary
//! always runs with [`ServerConfig::default`].

use crate::endpoint::MAX_HANDSHAKE_SIZE;

/// 0.0.0.0:4000
pub const DEFAULT_ADDR: &str = "0.0.0.0:4000";

/// 1 MiB, upper bound of a reassembled message.
pub const MAX_FRAME_SIZE: usize = 1 << 20;

/// Socket read buffer size.
pub const READ_BUF_SIZE: usize = 4096;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Listening address.
    pub addr: String,
    /// Messages larger than this close the connection with 1009.
    pub max_frame_size: usize,
    /// The upgrade request head must fit in this many bytes.
    pub max_handshake_size: usize,
    /// Reject chat messages from peers which have not set a name.
    pub require_name: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR.to_string(),
            max_frame_size: MAX_FRAME_SIZE,
            max_handshake_size: MAX_HANDSHAKE_SIZE,
            require_name: false,
        }
    }
}
