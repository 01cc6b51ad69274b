use std::io::{Read, Write};

use super::detail;
use super::{Endpoint, Upgraded};

use crate::role::ServerRole;
use crate::error::{Error, HandshakeError, Result};

impl<IO: Read + Write, Role: ServerRole> Endpoint<IO, Role> {
    /// Perform a websocket server handshake, return the upgraded connection.
    ///
    /// Request data are read into the provided buffer, which bounds the size
    /// of the request head. This function will block until the request head is
    /// complete, or an error occurs. On a rejected request the `400` or `404`
    /// reply has been written when the error is returned.
    pub fn accept_sync(mut io: IO, buf: &mut [u8]) -> Result<Upgraded<IO>> {
        let mut out = Vec::new();
        let mut offset = 0;

        loop {
            if offset == buf.len() {
                let e = detail::reject_oversized(&mut out);
                let _ = io.write_all(&out);
                return Err(e.into());
            }

            let n = io.read(&mut buf[offset..])?;

            // EOF, no more data
            if n == 0 {
                return Err(HandshakeError::NotEnoughData.into());
            }

            offset += n;

            match detail::accept(&buf[..offset], &mut out) {
                Ok(head_n) => {
                    io.write_all(&out)?;
                    return Ok(Upgraded {
                        io,
                        leftover: buf[head_n..offset].to_vec(),
                    });
                }
                Err(HandshakeError::NotEnoughData) => continue,
                Err(e) => {
                    // peer may already be gone
                    let _ = io.write_all(&out);
                    return Err(Error::Handshake(e));
                }
            }
        }
    }
}
