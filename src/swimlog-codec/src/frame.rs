use std::fmt;

use prost::encoding::{decode_varint, encode_varint, encoded_len_varint};

use crate::{error::DecodeError, helpers::BufferReader};

/// One length-prefixed message pulled out of a log stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame<'a> {
    /// Position of this frame in the stream, starting at 0.
    pub index: usize,
    /// Byte offset of the length prefix.
    pub offset: usize,
    pub payload: &'a [u8],
}

/// Splits a `[varint length][payload]...` stream into frames.
///
/// Iteration is lazy and stops for good after the first error. Cloning the
/// reader, or calling [`FrameReader::reset`], restarts from an earlier point.
#[derive(Debug, Clone)]
pub struct FrameReader<'a> {
    data: &'a [u8],
    cursor: usize,
    index: usize,
    failed: bool,
}

impl<'a> FrameReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            cursor: 0,
            index: 0,
            failed: false,
        }
    }

    pub fn position(&self) -> usize {
        self.cursor
    }

    pub fn frames_read(&self) -> usize {
        self.index
    }

    pub fn reset(&mut self) {
        self.cursor = 0;
        self.index = 0;
        self.failed = false;
    }

    /// Decodes the frame starting at `cursor`, returning it together with the
    /// cursor position just past its payload.
    pub fn read_at(
        data: &'a [u8],
        cursor: usize,
        index: usize,
    ) -> Result<(Frame<'a>, usize), DecodeError> {
        let mut rest = data.get(cursor..).ok_or(DecodeError::InvalidIndex)?;
        let declared =
            decode_varint(&mut rest).map_err(|_| DecodeError::InvalidVarint { offset: cursor })?;
        let start = data.len() - rest.len();
        let remaining = rest.len();

        let payload = usize::try_from(declared)
            .ok()
            .and_then(|len| rest.read_slice(len).ok())
            .ok_or(DecodeError::TruncatedFrame {
                frame_index: index,
                offset: cursor,
                declared,
                remaining,
            })?;

        let frame = Frame {
            index,
            offset: cursor,
            payload,
        };
        Ok((frame, start + payload.len()))
    }
}

impl<'a> Iterator for FrameReader<'a> {
    type Item = Result<Frame<'a>, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.cursor >= self.data.len() {
            return None;
        }

        match Self::read_at(self.data, self.cursor, self.index) {
            Ok((frame, next)) => {
                trace!(
                    "frame {} at {}: {} bytes",
                    frame.index,
                    frame.offset,
                    frame.payload.len()
                );
                self.cursor = next;
                self.index += 1;
                Some(Ok(frame))
            }
            Err(error) => {
                self.failed = true;
                Some(Err(error))
            }
        }
    }
}

impl std::iter::FusedIterator for FrameReader<'_> {}

/// Prefixes `payload` with its varint length.
pub fn frame(payload: &[u8]) -> Vec<u8> {
    let len = payload.len() as u64;
    let mut framed = Vec::with_capacity(payload.len() + encoded_len_varint(len));
    encode_varint(len, &mut framed);
    framed.extend_from_slice(payload);
    framed
}

impl fmt::Display for Frame<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Frame {{\n\tIndex: {},\n\tOffset: {},\n\tPayload: {}\n}}",
            self.index,
            self.offset,
            hex::encode(self.payload)
        )
    }
}
