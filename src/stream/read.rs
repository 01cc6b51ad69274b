use super::{FrameReader, Message, ReadState};

use crate::frame::{Frame, OpCode};
use crate::error::FrameError;

impl FrameReader {
    /// Append freshly read bytes.
    #[inline]
    pub fn extend(&mut self, data: &[u8]) { self.buf.extend_from_slice(data); }

    /// Pop the next complete message.
    ///
    /// Returns `Ok(None)` if the buffered bytes do not hold a complete
    /// message yet; they are kept for the next call.
    /// Control frames are returned as soon as they are read, even in the
    /// middle of a fragmented message.
    ///
    /// Any read after receiving a `Close` frame returns `Ok(None)`,
    /// which could be checked via [`FrameReader::is_read_close`].
    pub fn next_message(&mut self) -> Result<Option<Message>, FrameError> {
        let mut offset = 0;

        let ret = loop {
            if self.is_read_close() {
                break Ok(None);
            }

            let (frame, n) = match Frame::decode(&self.buf[offset..], self.max_len) {
                Ok(x) => x,
                Err(FrameError::NotEnoughData) => break Ok(None),
                Err(e) => break Err(e),
            };
            offset += n;

            match self.on_frame(frame) {
                Ok(Some(msg)) => break Ok(Some(msg)),
                Ok(None) => continue,
                Err(e) => break Err(e),
            }
        };

        // discard consumed bytes only
        self.buf.drain(..offset);
        ret
    }

    fn on_frame(&mut self, frame: Frame) -> Result<Option<Message>, FrameError> {
        let Frame {
            fin,
            opcode,
            payload,
        } = frame;

        match opcode {
            OpCode::Ping => Ok(Some(Message::Ping(payload))),
            OpCode::Pong => Ok(Some(Message::Pong(payload))),
            OpCode::Close => {
                self.read_state = ReadState::Close;
                let code = match payload.as_slice() {
                    [a, b, ..] => Some(u16::from_be_bytes([*a, *b])),
                    _ => None,
                };
                Ok(Some(Message::Close(code)))
            }
            OpCode::Text | OpCode::Binary => {
                if self.is_read_partial() {
                    return Err(FrameError::ExpectContinuation);
                }
                if fin.is_final() {
                    return complete(opcode, payload).map(Some);
                }
                self.read_state = ReadState::Fragmented {
                    opcode,
                    data: payload,
                };
                Ok(None)
            }
            OpCode::Continue => {
                let (opcode, mut data) =
                    match std::mem::replace(&mut self.read_state, ReadState::new()) {
                        ReadState::Fragmented { opcode, data } => (opcode, data),
                        other => {
                            self.read_state = other;
                            return Err(FrameError::UnexpectedContinuation);
                        }
                    };
                if data.len() + payload.len() > self.max_len {
                    return Err(FrameError::FrameTooLarge);
                }
                data.extend_from_slice(&payload);

                if fin.is_final() {
                    return complete(opcode, data).map(Some);
                }
                self.read_state = ReadState::Fragmented { opcode, data };
                Ok(None)
            }
        }
    }
}

fn complete(opcode: OpCode, data: Vec<u8>) -> Result<Message, FrameError> {
    match opcode {
        OpCode::Text => String::from_utf8(data)
            .map(Message::Text)
            .map_err(|_| FrameError::IllegalUtf8),
        _ => Ok(Message::Binary(data)),
    }
}
