//! Lightweight websocket chat server.
//!
//! ## Features
//! - Hand-rolled RFC 6455 framing and opening handshake.
//! - Partial frames are buffered across reads, fragments are reassembled.
//! - Broadcast, private messages, typing indicators and presence.
//!
//! ## High-level API
//!
//! - [`server`]
//! - [`router`]
//! - [`registry`]
//!
//! ```ignore
//! {
//!     let server = ChatServer::bind(ServerConfig::default()).await?;
//!     server.run().await?;
//! }
//! ```
//!
//! ## Low-level API
//!
//! - [`frame`]
//! - [`handshake`]
//! - [`stream`]
//! - [`endpoint`]
//!
//! Frame:
//!
//! ```ignore
//! {
//!     // encode a frame
//!     let buf = encode_frame::<StandardClient>(Fin::Y, OpCode::Text, b"hello");
//!
//!     // decode a frame
//!     let (frame, offset) = Frame::decode(&buf, MAX_FRAME_SIZE).unwrap();
//! }
//! ```
//!
//! Handshake:
//!
//! ```ignore
//! {
//!     // parse a client upgrade request
//!     let (request, offset) = Request::decode(&buf)?;
//!
//!     // answer it
//!     let accept = derive_accept_key(request.sec_key.unwrap());
//!     Response::SwitchingProtocols { sec_accept: &accept }.encode(&mut out);
//! }
//! ```

pub mod role;
pub mod error;
pub mod frame;
pub mod stream;
pub mod endpoint;
pub mod handshake;

pub mod config;
pub mod envelope;
pub mod registry;
pub mod router;

cfg_if::cfg_if! {
    if #[cfg(feature = "tokio")] {
        pub mod server;
    }
}
