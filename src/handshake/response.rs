//! Server response.
//!
//! From [RFC-6455 Section 4.2](https://datatracker.ietf.org/doc/html/rfc6455#section-4.2):
//!
//! If the server chooses to accept the incoming connection, it MUST
//! reply with a valid HTTP response.
//!
//! Example:
//!
//! ```text
//! HTTP/1.1 101 Switching Protocols
//! Upgrade: websocket
//! Connection: Upgrade
//! Sec-WebSocket-Accept: s3pPLMBiTxaQ9kYGzzhZRbK+xOo=
//! ```
//!
//! Rejections carry `Connection: close`, the socket is dropped right after.

use super::write_header;
use super::{HTTP_LINE_BREAK, HTTP_HEADER_SP};
use super::static_headers::*;

/// Http response presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Response<'a> {
    /// 101, with the derived accept key.
    SwitchingProtocols { sec_accept: &'a str },
    /// 400, missing key or unparsable request.
    BadRequest,
    /// 404, any request which is not an upgrade.
    NotFound,
}

impl<'a> Response<'a> {
    #[inline]
    pub const fn status_line(&self) -> &'static [u8] {
        match self {
            Response::SwitchingProtocols { .. } => b"HTTP/1.1 101 Switching Protocols",
            Response::BadRequest => b"HTTP/1.1 400 Bad Request",
            Response::NotFound => b"HTTP/1.1 404 Not Found",
        }
    }

    /// Append to the provided buffer, return the number of written bytes.
    pub fn encode(&self, buf: &mut Vec<u8>) -> usize {
        let beg = buf.len();

        buf.extend_from_slice(self.status_line());
        buf.extend_from_slice(HTTP_LINE_BREAK);

        match self {
            Response::SwitchingProtocols { sec_accept } => {
                // Upgrade: websocket
                write_header!(buf, HEADER_UPGRADE_NAME, HEADER_UPGRADE_VALUE);

                // Connection: Upgrade
                write_header!(buf, HEADER_CONNECTION_NAME, HEADER_CONNECTION_VALUE);

                // Sec-WebSocket-Accept: {sec_accept}
                write_header!(buf, HEADER_SEC_WEBSOCKET_ACCEPT_NAME, sec_accept.as_bytes());
            }
            Response::BadRequest => {
                write_header!(buf, HEADER_CONNECTION_NAME, HEADER_CONNECTION_CLOSE_VALUE);
            }
            Response::NotFound => {
                write_header!(buf, HEADER_CONTENT_LENGTH_NAME, b"9");
                write_header!(buf, HEADER_CONNECTION_NAME, HEADER_CONNECTION_CLOSE_VALUE);
            }
        }

        // finish with CRLF
        buf.extend_from_slice(HTTP_LINE_BREAK);

        if let Response::NotFound = self {
            buf.extend_from_slice(b"Not Found");
        }

        buf.len() - beg
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const RESPONSE: &[u8] = b"\
        HTTP/1.1 101 Switching Protocols\r\n\
        Upgrade: websocket\r\n\
        Connection: Upgrade\r\n\
        Sec-WebSocket-Accept: s3pPLMBiTxaQ9kYGzzhZRbK+xOo=\r\n\r\n";

    #[test]
    fn server_handshake() {
        let mut buf = Vec::new();
        let n = Response::SwitchingProtocols {
            sec_accept: "s3pPLMBiTxaQ9kYGzzhZRbK+xOo=",
        }
        .encode(&mut buf);

        assert_eq!(n, RESPONSE.len());
        assert_eq!(buf, RESPONSE);

        // parses back as a valid http response
        let mut headers = [httparse::EMPTY_HEADER; 8];
        let mut response = httparse::Response::new(&mut headers);
        assert!(response.parse(&buf).unwrap().is_complete());
        assert_eq!(response.code, Some(101));
    }

    #[test]
    fn server_reject() {
        let mut buf = Vec::new();
        Response::BadRequest.encode(&mut buf);
        assert!(buf.starts_with(b"HTTP/1.1 400 Bad Request\r\n"));
        assert!(buf.ends_with(b"\r\n\r\n"));

        let mut buf = Vec::new();
        Response::NotFound.encode(&mut buf);
        assert!(buf.starts_with(b"HTTP/1.1 404 Not Found\r\n"));
        assert!(buf.ends_with(b"\r\n\r\nNot Found"));
    }
}
