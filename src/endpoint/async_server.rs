use tokio::io::{AsyncRead, AsyncWrite, AsyncReadExt, AsyncWriteExt};

use super::detail;
use super::{Endpoint, Upgraded};

use crate::role::ServerRole;
use crate::error::{Error, HandshakeError, Result};

impl<IO: AsyncRead + AsyncWrite + Unpin, Role: ServerRole> Endpoint<IO, Role> {
    /// Async version of [`accept_sync`](Self::accept_sync).
    pub async fn accept_async(mut io: IO, buf: &mut [u8]) -> Result<Upgraded<IO>> {
        let mut out = Vec::new();
        let mut offset = 0;

        loop {
            if offset == buf.len() {
                let e = detail::reject_oversized(&mut out);
                let _ = io.write_all(&out).await;
                return Err(e.into());
            }

            let n = io.read(&mut buf[offset..]).await?;

            // EOF, no more data
            if n == 0 {
                return Err(HandshakeError::NotEnoughData.into());
            }

            offset += n;

            match detail::accept(&buf[..offset], &mut out) {
                Ok(head_n) => {
                    io.write_all(&out).await?;
                    return Ok(Upgraded {
                        io,
                        leftover: buf[head_n..offset].to_vec(),
                    });
                }
                Err(HandshakeError::NotEnoughData) => continue,
                Err(e) => {
                    // peer may already be gone
                    let _ = io.write_all(&out).await;
                    let _ = io.shutdown().await;
                    return Err(Error::Handshake(e));
                }
            }
        }
    }
}
