//! Length-prefixed codec for the detector stream
//!
//! Every event is framed as:
//! ```text
//! [ 4 bytes: length (u32, big-endian) ][ N bytes: protobuf ClassificationEvent ]
//! ```

use bytes::{Buf, BufMut, Bytes, BytesMut};
use prost::Message;
use thiserror::Error;

use crate::ClassificationEvent;

/// Maximum frame payload (64 KiB); an event is a few dozen bytes
pub const MAX_FRAME_SIZE: u32 = 64 * 1024;

const PREFIX_LEN: usize = 4;

/// Errors that can occur during encoding/decoding
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Frame too large: {0} bytes (max: {MAX_FRAME_SIZE})")]
    FrameTooLarge(usize),

    #[error("Invalid frame length prefix: {0}")]
    InvalidLength(u32),

    #[error("Protobuf decode error: {0}")]
    DecodeError(#[from] prost::DecodeError),

    #[error("Protobuf encode error: {0}")]
    EncodeError(#[from] prost::EncodeError),
}

/// Frame an event as `[len][payload]`
pub fn encode(event: &ClassificationEvent) -> Result<Bytes, CodecError> {
    let payload_len = event.encoded_len();
    if payload_len > MAX_FRAME_SIZE as usize {
        return Err(CodecError::FrameTooLarge(payload_len));
    }

    let mut frame = BytesMut::with_capacity(PREFIX_LEN + payload_len);
    frame.put_u32(payload_len as u32);
    event.encode(&mut frame)?;
    Ok(frame.freeze())
}

/// Payload length announced by the prefix at the head of `buf`, if complete
fn peek_len(buf: &[u8]) -> Option<u32> {
    let mut prefix = buf.get(..PREFIX_LEN)?;
    Some(prefix.get_u32())
}

/// Take one frame off the front of `buf`.
///
/// `Ok(None)` means the frame is still incomplete and nothing was consumed.
/// An oversized prefix is an error: the stream cannot be resynchronised.
pub fn decode(buf: &mut BytesMut) -> Result<Option<ClassificationEvent>, CodecError> {
    let payload_len = match peek_len(buf) {
        Some(len) if len > MAX_FRAME_SIZE => return Err(CodecError::InvalidLength(len)),
        Some(len) => len as usize,
        None => return Ok(None),
    };

    if buf.len() < PREFIX_LEN + payload_len {
        return Ok(None);
    }

    let mut frame = buf.split_to(PREFIX_LEN + payload_len);
    frame.advance(PREFIX_LEN);
    Ok(Some(ClassificationEvent::decode(frame)?))
}

/// Accumulates stream bytes and yields complete frames
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: BytesMut,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(4096),
        }
    }

    /// Add data to the decoder buffer
    pub fn extend(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Try to decode the next frame from the buffer
    ///
    /// Call this repeatedly until it returns `Ok(None)` to drain all complete frames
    pub fn decode_next(&mut self) -> Result<Option<ClassificationEvent>, CodecError> {
        decode(&mut self.buffer)
    }

    /// Drop any partial frame, e.g. after the connection was lost mid-frame
    pub fn reset(&mut self) {
        self.buffer.clear();
    }

    pub fn buffer_len(&self) -> usize {
        self.buffer.len()
    }
}
