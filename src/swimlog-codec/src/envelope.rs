use std::fmt;

use prost::Message;
use serde::Serialize;

use crate::{
    constants::{MessageType, SensorType},
    error::DecodeError,
    frame::Frame,
};

/// Decoded payload of one frame. Only the fields needed to route sensor data
/// and report side-channel info are modelled; anything else is skipped.
#[derive(Clone, PartialEq, Message)]
pub struct Envelope {
    #[prost(uint32, tag = "1")]
    pub message_type: u32,
    /// Milliseconds or device ticks, depending on the firmware build.
    #[prost(uint64, tag = "2")]
    pub timestamp: u64,
    #[prost(message, optional, tag = "3")]
    pub sensor_data: Option<SensorData>,
    #[prost(message, optional, tag = "4")]
    pub activity_info: Option<ActivityInfo>,
    #[prost(message, optional, tag = "5")]
    pub hr_led_info: Option<HrLedInfo>,
}

#[derive(Clone, PartialEq, Message)]
pub struct SensorData {
    #[prost(uint32, tag = "1")]
    pub tag: u32,
    /// Zero when the producer did not set it.
    #[prost(uint32, tag = "2")]
    pub sample_count: u32,
    #[prost(bytes = "vec", tag = "3")]
    pub buffer: Vec<u8>,
}

#[derive(Clone, Copy, PartialEq, Eq, Serialize, Message)]
pub struct ActivityInfo {
    #[prost(uint32, tag = "1")]
    pub swim_type: u32,
    #[prost(uint32, tag = "2")]
    pub pool_length: u32,
    #[prost(uint32, tag = "3")]
    pub goggles_orientation: u32,
    #[prost(uint32, tag = "4")]
    pub board_type: u32,
}

#[derive(Clone, Copy, PartialEq, Eq, Serialize, Message)]
pub struct HrLedInfo {
    #[prost(uint32, tag = "1")]
    pub sampling_rate: u32,
    #[prost(uint32, tag = "2")]
    pub led_current_green: u32,
    #[prost(uint32, tag = "3")]
    pub led_current_ir: u32,
    #[prost(uint32, tag = "4")]
    pub led_current_red: u32,
}

impl Envelope {
    pub fn from_frame(frame: &Frame<'_>) -> Result<Self, DecodeError> {
        Self::decode(frame.payload).map_err(|error| DecodeError::MalformedEnvelope {
            frame_index: frame.index,
            reason: error.to_string(),
        })
    }

    pub fn kind(&self) -> Result<MessageType, u32> {
        MessageType::from_u32(self.message_type).ok_or(self.message_type)
    }
}

impl SensorData {
    pub fn sensor_type(&self) -> Option<SensorType> {
        SensorType::from_u32(self.tag)
    }
}

impl fmt::Display for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            Ok(kind) => write!(f, "{kind} @ {}", self.timestamp)?,
            Err(raw) => write!(f, "message type {raw} @ {}", self.timestamp)?,
        }
        if let Some(data) = &self.sensor_data {
            match data.sensor_type() {
                Some(sensor) => write!(f, " [{sensor}")?,
                None => write!(f, " [tag {}", data.tag)?,
            }
            write!(f, " x{}, {} bytes]", data.sample_count, data.buffer.len())?;
        }
        Ok(())
    }
}
