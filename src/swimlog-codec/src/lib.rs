#[macro_use]
extern crate log;

mod error;
pub use error::DecodeError;

pub mod constants;
pub use constants::{MessageType, SensorType};

mod helpers;
pub use helpers::{BufferReader, InvalidIndexError};

mod frame;
pub use frame::{Frame, FrameReader, frame};

mod envelope;
pub use envelope::{ActivityInfo, Envelope, HrLedInfo, SensorData};

pub mod registry;
pub use registry::{SensorDescriptor, SensorFamily, descriptor_for, descriptor_of};

mod unpack;
pub use unpack::{Sample, Samples, decode_record, unpack};

pub mod timestamp;
pub use timestamp::{Clock, WindowClock, assign_timestamps, tick_elapsed};

mod decoder;
pub use decoder::{
    DecodedWindow, DecoderEvent, DecoderOptions, DecoderState, DecoderStats, OutputRow,
    SensorLogDecoder,
};

pub mod legacy;
pub use legacy::{LegacyFormat, LegacyReader};

mod encode;
pub use encode::{legacy_to_stream, pack_samples};

mod format;
pub use format::InputFormat;
