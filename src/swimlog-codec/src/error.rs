use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error(
        "frame {frame_index} at byte {offset} declares {declared} bytes but only {remaining} remain"
    )]
    TruncatedFrame {
        frame_index: usize,
        offset: usize,
        declared: u64,
        remaining: usize,
    },
    #[error("invalid varint at byte {offset}")]
    InvalidVarint { offset: usize },
    #[error("{sensor} window needs {required} bytes but buffer holds {available}")]
    BufferTooShort {
        sensor: String,
        required: usize,
        available: usize,
    },
    #[error("unknown sensor type tag {0}")]
    UnknownSensorType(u32),
    #[error("unsupported file extension `{0}`")]
    UnsupportedFileExtension(String),
    #[error("malformed envelope in frame {frame_index}: {reason}")]
    MalformedEnvelope { frame_index: usize, reason: String },
    #[error("read past end of buffer")]
    InvalidIndex,
}
