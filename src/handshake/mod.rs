//! Websocket handshake.
//!
//! Only the key exchange is enforced. HTTP method, HTTP version and
//! `sec-websocket-version` are not checked, any client sending
//! `upgrade: websocket` with a `sec-websocket-key` is accepted.

pub mod key;
pub mod request;
pub mod response;

pub use request::Request;
pub use response::Response;
pub use key::{new_sec_key, derive_accept_key};

/// 32
pub const MAX_ALLOW_HEADERS: usize = 32;

/// 258EAFA5-E914-47DA-95CA-C5AB0DC85B11
pub const GUID: &[u8] = b"258EAFA5-E914-47DA-95CA-C5AB0DC85B11";

/// CRLF
pub const HTTP_LINE_BREAK: &[u8] = b"\r\n";

/// A colon + one SP is prefered
pub const HTTP_HEADER_SP: &[u8] = b": ";

macro_rules! write_header {
    ($w: expr, $name: expr, $value: expr) => {{
        $w.extend_from_slice($name);
        $w.extend_from_slice(HTTP_HEADER_SP);
        $w.extend_from_slice($value);
        $w.extend_from_slice(HTTP_LINE_BREAK);
    }};
}

pub(self) use write_header;

/// Static http headers
#[allow(unused)]
pub mod static_headers {
    macro_rules! header {
        (   $(
                $(#[$docs: meta])*
                ($hdr_name: ident => $name: expr);
            )+
        ) => {
            $(
                $(#[$docs])*
                pub const $hdr_name: &[u8] = $name;
            )+
        };
    }

    // header name
    header! {
        (HEADER_UPGRADE_NAME => b"Upgrade");

        (HEADER_CONNECTION_NAME => b"Connection");

        (HEADER_CONTENT_LENGTH_NAME => b"Content-Length");

        (HEADER_SEC_WEBSOCKET_KEY_NAME => b"Sec-WebSocket-Key");

        (HEADER_SEC_WEBSOCKET_ACCEPT_NAME => b"Sec-WebSocket-Accept");
    }

    // header value
    header! {
        (HEADER_UPGRADE_VALUE => b"websocket");

        (HEADER_CONNECTION_VALUE => b"Upgrade");

        (HEADER_CONNECTION_CLOSE_VALUE => b"close");
    }
}
