use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

use lightchat::config::ServerConfig;
use lightchat::frame::{encode_frame, Fin, OpCode};
use lightchat::handshake::{new_sec_key, derive_accept_key};
use lightchat::role::StandardClient;
use lightchat::server::ChatServer;
use lightchat::stream::{FrameReader, Message};

use log::debug;
use serde_json::{json, Value};

const WAIT: Duration = Duration::from_secs(5);

async fn spawn_server(require_name: bool) -> SocketAddr {
    let _ = env_logger::try_init();

    let config = ServerConfig {
        addr: "127.0.0.1:0".to_string(),
        require_name,
        ..ServerConfig::default()
    };
    let server = ChatServer::bind(config).await.unwrap();
    let addr = server.local_addr().unwrap();
    tokio::spawn(server.run());
    debug!("server: listening on {}", addr);
    addr
}

struct TestClient {
    id: String,
    tcp: TcpStream,
    reader: FrameReader,
}

impl TestClient {
    async fn connect(addr: SocketAddr) -> Self {
        let key = new_sec_key();
        let mut tcp = TcpStream::connect(addr).await.unwrap();
        let req = format!(
            "GET / HTTP/1.1\r\n\
            Host: {}\r\n\
            Upgrade: websocket\r\n\
            Connection: Upgrade\r\n\
            Sec-WebSocket-Key: {}\r\n\
            Sec-WebSocket-Version: 13\r\n\r\n",
            addr, key
        );
        tcp.write_all(req.as_bytes()).await.unwrap();

        let mut buf = vec![0u8; 4096];
        let mut offset = 0;
        let head_n = loop {
            if let Some(pos) = buf[..offset].windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
            let n = timeout(WAIT, tcp.read(&mut buf[offset..])).await.unwrap().unwrap();
            assert_ne!(n, 0);
            offset += n;
        };

        let head = std::str::from_utf8(&buf[..head_n]).unwrap();
        assert!(head.starts_with("HTTP/1.1 101 Switching Protocols\r\n"));
        let accept = derive_accept_key(key.as_bytes());
        assert!(head.contains(&format!("Sec-WebSocket-Accept: {}\r\n", accept)));

        let mut reader = FrameReader::new(1 << 20);
        reader.extend(&buf[head_n..offset]);

        let mut client = TestClient {
            id: String::new(),
            tcp,
            reader,
        };

        // the id always comes first
        let first = client.recv_json().await;
        assert_eq!(first["type"], json!("id"));
        client.id = first["id"].as_str().unwrap().to_string();
        debug!("client: connected as {}", client.id);
        client
    }

    async fn send(&mut self, opcode: OpCode, payload: &[u8]) {
        let frame = encode_frame::<StandardClient>(Fin::Y, opcode, payload);
        self.tcp.write_all(&frame).await.unwrap();
    }

    async fn send_json(&mut self, value: Value) {
        self.send(OpCode::Text, value.to_string().as_bytes()).await;
    }

    /// Next message, None on eof.
    async fn recv(&mut self) -> Option<Message> {
        let mut buf = vec![0u8; 4096];
        loop {
            if let Some(msg) = self.reader.next_message().unwrap() {
                return Some(msg);
            }
            let n = timeout(WAIT, self.tcp.read(&mut buf)).await.unwrap().unwrap();
            if n == 0 {
                return None;
            }
            self.reader.extend(&buf[..n]);
        }
    }

    async fn recv_json(&mut self) -> Value {
        match self.recv().await {
            Some(Message::Text(text)) => serde_json::from_str(&text).unwrap(),
            other => panic!("expect text, got {:?}", other),
        }
    }

    /// Skip envelopes until `pred` matches.
    async fn recv_until<F: Fn(&Value) -> bool>(&mut self, pred: F) -> Value {
        loop {
            let value = self.recv_json().await;
            if pred(&value) {
                return value;
            }
            debug!("client {}: skip {}", self.id, value);
        }
    }

    async fn recv_type(&mut self, ty: &str) -> Value { self.recv_until(|v| v["type"] == ty).await }
}

fn online(list: &Value) -> Vec<&str> {
    list["clients"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["id"].as_str().unwrap())
        .collect()
}

#[tokio::test]
async fn async_chat() {
    let addr = spawn_server(false).await;

    let mut alice = TestClient::connect(addr).await;
    let mut bob = TestClient::connect(addr).await;
    assert_ne!(alice.id, bob.id);

    let bob_id = bob.id.clone();
    let list = alice.recv_until(|v| v["type"] == "clientList" && online(v).len() == 2).await;
    assert!(online(&list).contains(&bob_id.as_str()));

    alice.send_json(json!({"type": "setName", "name": "  alice "})).await;
    let list = bob
        .recv_until(|v| v["type"] == "clientList" && v["clients"][0]["name"] == "alice")
        .await;
    assert_eq!(list["clients"][0]["id"], json!(alice.id));

    // broadcast reaches the sender too
    alice.send_json(json!({"msg": "hello everyone"})).await;
    for c in [&mut alice, &mut bob] {
        let msg = c.recv_type("message").await;
        assert_eq!(msg["msg"], json!("hello everyone"));
        assert_eq!(msg["fromName"], json!("alice"));
        assert_eq!(msg["isPrivate"], json!(false));
    }

    alice.send_json(json!({"msg": "just you", "to": bob_id})).await;
    let msg = bob.recv_type("message").await;
    assert_eq!(msg["isPrivate"], json!(true));
    assert_eq!(msg["msg"], json!("just you"));
    let ack = alice.recv_type("message").await;
    assert_eq!(ack["isSent"], json!(true));
    assert_eq!(ack["delivered"], json!(true));
    assert_eq!(ack["to"], json!(bob_id));

    bob.send_json(json!({"type": "typing", "to": alice.id})).await;
    let typing = alice.recv_type("typing").await;
    assert_eq!(typing["from"], json!(bob_id));

    alice.send(OpCode::Text, b"not json").await;
    let err = alice.recv_type("error").await;
    assert_eq!(err["msg"], json!("Invalid JSON"));

    // bob leaves without a close frame
    drop(bob);
    let list = alice.recv_until(|v| v["type"] == "clientList" && online(v).len() == 1).await;
    assert_eq!(online(&list), vec![alice.id.as_str()]);
}

#[tokio::test]
async fn async_split_frames() {
    let addr = spawn_server(false).await;
    let mut c = TestClient::connect(addr).await;

    let payload = json!({"msg": "x".repeat(300)}).to_string();
    let frame = encode_frame::<StandardClient>(Fin::Y, OpCode::Text, payload.as_bytes());

    // a frame spread over several writes
    for chunk in frame.chunks(7) {
        c.tcp.write_all(chunk).await.unwrap();
        c.tcp.flush().await.unwrap();
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    let msg = c.recv_type("message").await;
    assert_eq!(msg["msg"], json!("x".repeat(300)));

    // two frames in a single write
    let mut data = encode_frame::<StandardClient>(Fin::Y, OpCode::Text, br#"{"msg":"one"}"#);
    data.extend(encode_frame::<StandardClient>(Fin::Y, OpCode::Text, br#"{"msg":"two"}"#));
    c.tcp.write_all(&data).await.unwrap();
    assert_eq!(c.recv_type("message").await["msg"], json!("one"));
    assert_eq!(c.recv_type("message").await["msg"], json!("two"));

    // fragmented message
    let mut data = encode_frame::<StandardClient>(Fin::N, OpCode::Text, br#"{"msg":"#);
    data.extend(encode_frame::<StandardClient>(Fin::Y, OpCode::Continue, br#""frag"}"#));
    c.tcp.write_all(&data).await.unwrap();
    assert_eq!(c.recv_type("message").await["msg"], json!("frag"));
}

#[tokio::test]
async fn async_ping_close() {
    let addr = spawn_server(false).await;
    let mut c = TestClient::connect(addr).await;

    c.send(OpCode::Ping, b"are you there").await;
    loop {
        match c.recv().await {
            Some(Message::Pong(data)) => {
                assert_eq!(data, b"are you there");
                break;
            }
            Some(Message::Text(_)) => continue,
            other => panic!("expect pong, got {:?}", other),
        }
    }

    c.send(OpCode::Close, &1000u16.to_be_bytes()).await;
    loop {
        match c.recv().await {
            Some(Message::Close(code)) => {
                assert_eq!(code, Some(1000));
                break;
            }
            Some(Message::Text(_)) => continue,
            other => panic!("expect close, got {:?}", other),
        }
    }
}

#[tokio::test]
async fn async_protocol_error() {
    let addr = spawn_server(false).await;
    let mut c = TestClient::connect(addr).await;

    c.send(OpCode::Continue, b"orphan").await;
    loop {
        match c.recv().await {
            Some(Message::Close(code)) => {
                assert_eq!(code, Some(1002));
                break;
            }
            Some(Message::Text(_)) => continue,
            other => panic!("expect close, got {:?}", other),
        }
    }
}

#[tokio::test]
async fn async_require_name() {
    let addr = spawn_server(true).await;
    let mut c = TestClient::connect(addr).await;

    c.send_json(json!({"msg": "hi"})).await;
    let err = c.recv_type("error").await;
    assert_eq!(err["msg"], json!("Set a name before sending messages"));

    c.send_json(json!({"type": "setName", "name": "dave"})).await;
    c.send_json(json!({"msg": "hi"})).await;
    let msg = c.recv_type("message").await;
    assert_eq!(msg["fromName"], json!("dave"));
}

#[tokio::test]
async fn async_reject() {
    let addr = spawn_server(false).await;

    let cases: [(&[u8], &str); 2] = [
        (
            b"GET / HTTP/1.1\r\nHost: x\r\nUpgrade: websocket\r\nConnection: Upgrade\r\n\r\n",
            "HTTP/1.1 400 Bad Request\r\n",
        ),
        (b"GET /index.html HTTP/1.1\r\nHost: x\r\n\r\n", "HTTP/1.1 404 Not Found\r\n"),
    ];

    for (req, status) in cases {
        let mut tcp = TcpStream::connect(addr).await.unwrap();
        tcp.write_all(req).await.unwrap();
        let mut resp = String::new();
        timeout(WAIT, tcp.read_to_string(&mut resp)).await.unwrap().unwrap();
        assert!(resp.starts_with(status), "{}", resp);
    }
}
