//! Markers.
//!
//! Markers decide how outgoing frames are masked. The chat server writes
//! as [`Server`]; test clients write as [`Client`] or [`StandardClient`].
//!
//! Only [`ServerRole`] types may accept a handshake.

use crate::frame::Mask;
use crate::frame::mask::new_rand_key;

/// Masking strategy of a writer.
pub trait RoleHelper {
    /// Mask used for the next outgoing frame.
    fn new_write_mask() -> Mask;
}

/// Server marker.
pub trait ServerRole: RoleHelper {}

/// Simple client using empty(fake) mask key.
///
/// With an empty mask key, the sender/receiver
/// does not need to mask/unmask the payload.
pub struct Client;

/// Standard server.
pub struct Server;

/// Standard client using random mask key.
pub struct StandardClient;

impl RoleHelper for Client {
    #[inline]
    fn new_write_mask() -> Mask { Mask::Skip }
}

impl RoleHelper for Server {
    /// Server should not mask the payload.
    #[inline]
    fn new_write_mask() -> Mask { Mask::None }
}

impl RoleHelper for StandardClient {
    #[inline]
    fn new_write_mask() -> Mask { Mask::Key(new_rand_key()) }
}

impl ServerRole for Server {}
