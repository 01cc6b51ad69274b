//! Tokio chat server.
//!
//! One task per connection reads and routes, a second one owns the write
//! half and drains the connection's outbox. Every frame meant for a peer,
//! including the server's own pongs and close replies, goes through that
//! outbox so writes on one socket never interleave.

use std::net::SocketAddr;
use std::sync::Arc;

use log::{debug, warn};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc::{self, UnboundedSender};

use crate::config::{ServerConfig, READ_BUF_SIZE};
use crate::endpoint::Endpoint;
use crate::error::Result;
use crate::frame::{encode_close, encode_frame, Fin, OpCode};
use crate::registry::Registry;
use crate::role;
use crate::router::Router;
use crate::stream::{FrameReader, Message};

/// Sending half of a connection's outbox.
pub type Outbox = UnboundedSender<Arc<[u8]>>;

/// A bound chat server.
#[derive(Debug)]
pub struct ChatServer {
    listener: TcpListener,
    router: Arc<Router<Outbox>>,
    config: Arc<ServerConfig>,
}

impl ChatServer {
    /// Bind to `config.addr`.
    pub async fn bind(config: ServerConfig) -> Result<Self> {
        let listener = TcpListener::bind(&config.addr).await?;
        let router = Router::new(Registry::new()).require_name(config.require_name);
        Ok(Self {
            listener,
            router: Arc::new(router),
            config: Arc::new(config),
        })
    }

    #[inline]
    pub fn local_addr(&self) -> Result<SocketAddr> { Ok(self.listener.local_addr()?) }

    /// Accept connections forever.
    pub async fn run(self) -> Result<()> {
        loop {
            let (stream, addr) = match self.listener.accept().await {
                Ok(x) => x,
                Err(e) => {
                    warn!("accept failed: {}", e);
                    continue;
                }
            };

            let router = self.router.clone();
            let config = self.config.clone();
            tokio::spawn(async move {
                if let Err(e) = serve(stream, router, config).await {
                    debug!("{}: {}", addr, e);
                }
            });
        }
    }
}

/// Drive one connection from handshake to disconnect.
async fn serve(
    stream: TcpStream,
    router: Arc<Router<Outbox>>,
    config: Arc<ServerConfig>,
) -> Result<()> {
    let mut buf = vec![0; config.max_handshake_size];
    let upgraded = Endpoint::<_, role::Server>::accept_async(stream, &mut buf).await?;
    let (rd, wr) = upgraded.io.into_split();
    session(rd, wr, &upgraded.leftover, &router, &config).await;
    Ok(())
}

/// Run an upgraded connection until either direction fails or closes.
///
/// The outbox is unbounded. A peer which stops reading without closing
/// blocks `write_all`, and its queue grows until the socket errors.
async fn session<R, W>(
    mut rd: R,
    mut wr: W,
    leftover: &[u8],
    router: &Router<Outbox>,
    config: &ServerConfig,
) where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<Arc<[u8]>>();
    let mut writer = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if let Err(e) = wr.write_all(&frame).await {
                debug!("write failed: {}", e);
                return;
            }
        }
        let _ = wr.shutdown().await;
    });
    let mut writer_done = false;

    let id = router.connect(tx.clone());

    let mut reader = FrameReader::new(config.max_frame_size);
    reader.extend(leftover);
    let mut buf = vec![0; READ_BUF_SIZE];

    'conn: loop {
        // the handshake leftover may already hold whole frames
        loop {
            match reader.next_message() {
                Ok(Some(msg)) => {
                    if !on_message(router, &tx, &id, msg) {
                        break 'conn;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    warn!("{}: {}, closing with {}", id, e, e.close_code());
                    let _ = tx.send(encode_close(Some(e.close_code())).into());
                    break 'conn;
                }
            }
        }

        // we hold a sender, so the writer only ends on a write error
        let read = tokio::select! {
            r = rd.read(&mut buf) => Some(r),
            _ = &mut writer => None,
        };

        match read {
            Some(Ok(0)) => {
                debug!("{}: eof", id);
                break;
            }
            Some(Ok(n)) => reader.extend(&buf[..n]),
            Some(Err(e)) => {
                debug!("{}: read failed: {}", id, e);
                break;
            }
            None => {
                debug!("{}: writer gone", id);
                writer_done = true;
                break;
            }
        }
    }

    router.disconnect(&id);
    drop(tx);
    if !writer_done {
        let _ = writer.await;
    }
}

/// Returns false once the connection should end.
fn on_message(router: &Router<Outbox>, tx: &Outbox, id: &str, msg: Message) -> bool {
    match msg {
        Message::Text(text) => router.handle_text(id, &text),
        Message::Binary(data) => debug!("{}: ignore {} bytes of binary", id, data.len()),
        Message::Ping(data) => {
            let pong = encode_frame::<role::Server>(Fin::Y, OpCode::Pong, &data);
            let _ = tx.send(pong.into());
        }
        Message::Pong(_) => {}
        Message::Close(code) => {
            debug!("{}: close {:?}", id, code);
            let _ = tx.send(encode_close(code).into());
            return false;
        }
    }
    true
}
