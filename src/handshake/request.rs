//! Client upgrade request.
//!
//! From [RFC-6455 Section 4.1](https://datatracker.ietf.org/doc/html/rfc6455#section-4.1):
//!
//! Once a connection to the server has been established (including a
//! connection via a proxy or over a TLS-encrypted tunnel), the client
//! MUST send an opening handshake to the server.  The handshake consists
//! of an HTTP Upgrade request, along with a list of required and
//! optional header fields.
//!
//! Example:
//!
//! ```text
//! GET /path HTTP/1.1
//! host: www.example.com
//! upgrade: websocket
//! connection: upgrade
//! sec-websocket-key: dGhlIHNhbXBsZSBub25jZQ==
//! sec-websocket-version: 13
//! ```
//!

use super::MAX_ALLOW_HEADERS;
use super::static_headers::*;

use crate::error::HandshakeError;

/// Http request presentation, borrowing from the read buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Request<'b> {
    /// `upgrade: websocket` is present.
    pub upgrade: bool,
    pub sec_key: Option<&'b [u8]>,
}

impl<'b> Request<'b> {
    /// Parse from a provided buffer, return the request and
    /// the number of bytes parsed.
    ///
    /// If the buffer does not contain a complete http request head,
    /// a [`HandshakeError::NotEnoughData`] error will be returned.
    /// Header names and the upgrade value are compared case insensitively.
    pub fn decode(buf: &'b [u8]) -> Result<(Self, usize), HandshakeError> {
        let mut headers = [httparse::EMPTY_HEADER; MAX_ALLOW_HEADERS];
        let mut request = httparse::Request::new(&mut headers);

        let decode_n = match request.parse(buf)? {
            httparse::Status::Complete(n) => n,
            httparse::Status::Partial => return Err(HandshakeError::NotEnoughData),
        };

        let mut upgrade = false;
        let mut sec_key = None;

        for hdr in request.headers.iter() {
            let name = hdr.name.as_bytes();
            if name.eq_ignore_ascii_case(HEADER_UPGRADE_NAME) {
                // header value here is case insensitive
                // ref: https://datatracker.ietf.org/doc/html/rfc6455#section-4.1
                upgrade = hdr.value.eq_ignore_ascii_case(HEADER_UPGRADE_VALUE);
            } else if name.eq_ignore_ascii_case(HEADER_SEC_WEBSOCKET_KEY_NAME)
                && !hdr.value.is_empty()
            {
                sec_key = Some(hdr.value);
            }
        }

        Ok((
            Request {
                upgrade,
                sec_key,
            },
            decode_n,
        ))
    }
}
