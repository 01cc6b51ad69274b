use crate::handshake::{Request, Response};
use crate::handshake::derive_accept_key;
use crate::error::HandshakeError;

/// Decode a (possibly partial) request head and encode the reply to `out`.
///
/// Returns the length of the request head once a `101` is encoded.
/// [`HandshakeError::NotEnoughData`] leaves `out` untouched, the caller
/// should read more. Any other error comes with a `400` or `404` in `out`.
pub fn accept(buf: &[u8], out: &mut Vec<u8>) -> Result<usize, HandshakeError> {
    let (request, decode_n) = match Request::decode(buf) {
        Ok(x) => x,
        Err(HandshakeError::NotEnoughData) => return Err(HandshakeError::NotEnoughData),
        Err(e) => {
            Response::BadRequest.encode(out);
            return Err(e);
        }
    };

    if !request.upgrade {
        Response::NotFound.encode(out);
        return Err(HandshakeError::Upgrade);
    }

    let sec_key = match request.sec_key {
        Some(k) => k,
        None => {
            Response::BadRequest.encode(out);
            return Err(HandshakeError::SecWebSocketKey);
        }
    };

    let sec_accept = derive_accept_key(sec_key);
    Response::SwitchingProtocols {
        sec_accept: &sec_accept,
    }
    .encode(out);

    Ok(decode_n)
}

/// Reply for a request head which does not fit in the buffer.
#[inline]
pub fn reject_oversized(out: &mut Vec<u8>) -> HandshakeError {
    Response::BadRequest.encode(out);
    HandshakeError::NotEnoughCapacity
}
