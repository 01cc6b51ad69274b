//! Websocket data frame.
//!
//! [RFC-6455 Section5](https://datatracker.ietf.org/doc/html/rfc6455#section-5)
//!
//! ```text
//! 0                   1                   2                   3
//! 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-------+-+-------------+-------------------------------+
//! |F|R|R|R| opcode|M| Payload len |    Extended payload length    |
//! |I|S|S|S|  (4)  |A|     (7)     |             (16/64)           |
//! |N|V|V|V|       |S|             |   (if payload len==126/127)   |
//! | |1|2|3|       |K|             |                               |
//! +-+-+-+-+-------+-+-------------+ - - - - - - - - - - - - - - - +
//! |     Extended payload length continued, if payload len == 127  |
//! + - - - - - - - - - - - - - - - +-------------------------------+
//! |                               |Masking-key, if MASK set to 1  |
//! +-------------------------------+-------------------------------+
//! | Masking-key (continued)       |          Payload Data         |
//! +-------------------------------- - - - - - - - - - - - - - - - +
//! :                     Payload Data continued ...                :
//! + - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - +
//! |                     Payload Data continued ...                |
//! +---------------------------------------------------------------+
//! ```
//!
//! Decoding is a pure function from a byte buffer to a frame plus the
//! number of consumed bytes. A buffer ending mid-frame yields
//! [`FrameError::NotEnoughData`], which only means "read more".

pub mod flag;
pub mod length;
pub mod mask;

pub use flag::{Fin, OpCode};
pub use length::PayloadLen;
pub use mask::Mask;

use crate::error::FrameError;
use crate::role::{RoleHelper, Server};
use mask::apply_mask4;

/// Largest payload a control frame may carry.
pub const MAX_CONTROL_PAYLOAD: usize = 125;

/// Websocket frame head.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHead {
    pub fin: Fin,
    pub opcode: OpCode,
    pub mask: Mask,
    pub length: PayloadLen,
}

impl FrameHead {
    /// Constructor.
    #[inline]
    pub const fn new(fin: Fin, opcode: OpCode, mask: Mask, length: PayloadLen) -> Self {
        Self {
            fin,
            opcode,
            mask,
            length,
        }
    }

    /// Encoded size of this head.
    #[allow(clippy::len_without_is_empty)]
    #[inline]
    pub const fn len(&self) -> usize { 2 + self.length.extended_len() + self.mask.key_len() }

    /// Append the encoded head to `buf`, returns the count of written bytes.
    pub fn encode(&self, buf: &mut Vec<u8>) -> usize {
        // fin, opcode
        let b1 = self.fin as u8 | self.opcode as u8;

        // mask, payload length
        let b2 = self.mask.to_flag() | self.length.to_flag();

        buf.extend_from_slice(&[b1, b2]);

        // extended payload length
        match &self.length {
            PayloadLen::Standard(_) => {}
            PayloadLen::Extended1(v) => buf.extend_from_slice(&v.to_be_bytes()),
            PayloadLen::Extended2(v) => buf.extend_from_slice(&v.to_be_bytes()),
        };

        // mask key
        match &self.mask {
            Mask::Key(k) => buf.extend_from_slice(k),
            Mask::Skip => buf.extend_from_slice(&[0u8; 4]),
            Mask::None => {}
        };

        self.len()
    }

    /// Parse from provided buffer, returns [`FrameHead`] and the count of read bytes
    /// if the parse succeeds.
    /// If there is not enough data to parse, a [`FrameError::NotEnoughData`] error
    /// will be returned.
    pub fn decode(buf: &[u8]) -> Result<(Self, usize), FrameError> {
        if buf.len() < 2 {
            return Err(FrameError::NotEnoughData);
        }

        let mut n: usize = 2;

        // fin, opcode
        let b1 = buf[0];

        // mask, payload length
        let b2 = buf[1];

        let fin = Fin::from_flag(b1)?;
        let opcode = OpCode::from_flag(b1)?;

        let mut mask = Mask::from_flag(b2);
        let mut length = PayloadLen::from_flag(b2);

        let need = n + length.extended_len() + mask.key_len();
        if buf.len() < need {
            return Err(FrameError::NotEnoughData);
        }

        match length {
            PayloadLen::Standard(_) => {}
            PayloadLen::Extended1(_) => {
                length = PayloadLen::from_byte2([buf[2], buf[3]]);
                n += 2;
            }
            PayloadLen::Extended2(_) => {
                let mut b8 = [0u8; 8];
                b8.copy_from_slice(&buf[2..10]);
                length = PayloadLen::from_byte8(b8)?;
                n += 8;
            }
        };

        if mask != Mask::None {
            let mut key = [0u8; 4];
            key.copy_from_slice(&buf[n..n + 4]);
            mask = Mask::from_key(key);
            n += 4;
        }

        if opcode.is_control()
            && (!fin.is_final() || length.to_num() > MAX_CONTROL_PAYLOAD as u64)
        {
            return Err(FrameError::IllegalControl);
        }

        Ok((
            FrameHead {
                fin,
                opcode,
                mask,
                length,
            },
            n,
        ))
    }
}

/// A complete, unmasked frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub fin: Fin,
    pub opcode: OpCode,
    pub payload: Vec<u8>,
}

impl Frame {
    /// Decode one frame from the front of `buf`, returns the frame and the
    /// total count of consumed bytes (head + mask key + payload).
    ///
    /// A declared payload longer than `max_len` fails with
    /// [`FrameError::FrameTooLarge`] before waiting for the payload, so a
    /// peer can not make us buffer an arbitrary amount of data.
    pub fn decode(buf: &[u8], max_len: usize) -> Result<(Self, usize), FrameError> {
        let (head, head_n) = FrameHead::decode(buf)?;

        let len = head.length.to_num();
        if len > max_len as u64 {
            return Err(FrameError::FrameTooLarge);
        }
        // fits in usize since max_len does
        let len = len as usize;

        if buf.len() - head_n < len {
            return Err(FrameError::NotEnoughData);
        }

        let mut payload = buf[head_n..head_n + len].to_vec();

        // unmask if server receives data from client
        // this operation can be skipped if mask key is 0
        if let Mask::Key(key) = head.mask {
            apply_mask4(key, &mut payload);
        }

        Ok((
            Frame {
                fin: head.fin,
                opcode: head.opcode,
                payload,
            },
            head_n + len,
        ))
    }

    /// Payload as utf-8.
    #[inline]
    pub fn text(&self) -> Result<&str, FrameError> {
        std::str::from_utf8(&self.payload).map_err(|_| FrameError::IllegalUtf8)
    }
}

/// Build a complete frame, masked according to `Role`.
pub fn encode_frame<Role: RoleHelper>(fin: Fin, opcode: OpCode, payload: &[u8]) -> Vec<u8> {
    let head = FrameHead::new(
        fin,
        opcode,
        Role::new_write_mask(),
        PayloadLen::from_num(payload.len() as u64),
    );

    let mut buf = Vec::with_capacity(head.len() + payload.len());
    let head_n = head.encode(&mut buf);
    buf.extend_from_slice(payload);

    if let Mask::Key(key) = head.mask {
        apply_mask4(key, &mut buf[head_n..]);
    }

    buf
}

/// A single unfragmented, unmasked text frame, as sent by the server.
#[inline]
pub fn encode_text(payload: &str) -> Vec<u8> {
    encode_frame::<Server>(Fin::Y, OpCode::Text, payload.as_bytes())
}

/// Server close frame, carrying a status code if given.
#[inline]
pub fn encode_close(code: Option<u16>) -> Vec<u8> {
    let code = code.map(u16::to_be_bytes);
    let payload: &[u8] = match &code {
        Some(b) => b,
        None => &[],
    };
    encode_frame::<Server>(Fin::Y, OpCode::Close, payload)
}
