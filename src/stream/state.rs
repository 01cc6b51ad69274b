use crate::frame::OpCode;

/// Read state.
#[derive(Debug)]
pub(super) enum ReadState {
    /// Waiting for the first frame of a message.
    Idle,
    /// A fragmented message is in progress.
    Fragmented {
        opcode: OpCode,
        data: Vec<u8>,
    },
    /// A close frame has been read.
    Close,
}

impl ReadState {
    #[inline]
    pub const fn new() -> Self { ReadState::Idle }
}
