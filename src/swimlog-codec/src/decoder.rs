use std::collections::HashMap;

use crate::{
    constants::{FIFO_INTERVAL_MS, MessageType, SensorType},
    envelope::{ActivityInfo, Envelope, HrLedInfo, SensorData},
    error::DecodeError,
    frame::{Frame, FrameReader},
    registry::{SensorDescriptor, descriptor_for},
    timestamp::{Clock, WindowClock},
    unpack::unpack,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecoderOptions {
    /// Overrides every sensor's nominal window interval when set. Converted
    /// to ticks when the clock counts ticks.
    pub nominal_interval_ms: Option<u64>,
    pub clock: Clock,
    /// Skip windows whose buffer is shorter than the declared sample count
    /// instead of stopping the decode.
    pub skip_short_windows: bool,
}

impl Default for DecoderOptions {
    fn default() -> Self {
        Self {
            nominal_interval_ms: None,
            clock: Clock::Monotonic,
            skip_short_windows: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderState {
    Scanning,
    Dispatched(SensorType),
    Done,
    Error,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecoderStats {
    pub frames: usize,
    pub windows: usize,
    pub rows: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutputRow {
    pub timestamp: i64,
    /// In the order of `descriptor.family.columns()`.
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecodedWindow {
    pub frame_index: usize,
    pub descriptor: &'static SensorDescriptor,
    pub end_timestamp: u64,
    pub rows: Vec<OutputRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DecoderEvent {
    Window(DecodedWindow),
    ActivityInfo {
        timestamp: u64,
        info: ActivityInfo,
    },
    HrInfo {
        timestamp: u64,
        info: HrLedInfo,
    },
    Marker {
        message_type: MessageType,
        timestamp: u64,
    },
    UnknownMessage {
        message_type: u32,
        timestamp: u64,
    },
    /// An envelope that was dropped without stopping the decode.
    Skipped {
        frame_index: usize,
        reason: DecodeError,
    },
}

/// Pulls frames from a `.bin_pb` stream and turns them into events.
///
/// Iteration ends after the stream is exhausted or after the first fatal
/// error is returned. Events yielded before the error remain valid.
pub struct SensorLogDecoder<'a> {
    frames: FrameReader<'a>,
    options: DecoderOptions,
    state: DecoderState,
    clocks: HashMap<SensorType, WindowClock>,
    stats: DecoderStats,
}

impl<'a> SensorLogDecoder<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_options(data, DecoderOptions::default())
    }

    pub fn with_options(data: &'a [u8], options: DecoderOptions) -> Self {
        Self {
            frames: FrameReader::new(data),
            options,
            state: DecoderState::Scanning,
            clocks: HashMap::new(),
            stats: DecoderStats::default(),
        }
    }

    pub fn state(&self) -> DecoderState {
        self.state
    }

    pub fn stats(&self) -> DecoderStats {
        self.stats
    }

    /// Byte offset of the next unread frame.
    pub fn position(&self) -> usize {
        self.frames.position()
    }

    fn fail(&mut self, error: DecodeError) -> Option<Result<DecoderEvent, DecodeError>> {
        error!("Decoding stopped: {}", error);
        self.state = DecoderState::Error;
        Some(Err(error))
    }

    fn skip(&mut self, frame: &Frame<'_>, reason: DecodeError) -> DecoderEvent {
        warn!("Skipping frame {} at byte {}: {}", frame.index, frame.offset, reason);
        self.stats.skipped += 1;
        DecoderEvent::Skipped {
            frame_index: frame.index,
            reason,
        }
    }

    fn dispatch(
        &mut self,
        frame: &Frame<'_>,
        envelope: Envelope,
    ) -> Result<DecoderEvent, DecodeError> {
        let timestamp = envelope.timestamp;
        let kind = match envelope.kind() {
            Ok(kind) => kind,
            Err(message_type) => {
                warn!("Unknown message type {} at frame {}", message_type, frame.index);
                return Ok(DecoderEvent::UnknownMessage {
                    message_type,
                    timestamp,
                });
            }
        };

        match kind {
            MessageType::SensorData => match envelope.sensor_data {
                Some(data) => self.decode_window(frame, timestamp, data),
                None => Ok(self.skip(
                    frame,
                    DecodeError::MalformedEnvelope {
                        frame_index: frame.index,
                        reason: "sensor data envelope without sensor data".to_owned(),
                    },
                )),
            },
            MessageType::ActivityInfo => {
                let info = envelope.activity_info.unwrap_or_default();
                info!(
                    "Swim activity type = {}, pool length = {}, orientation = {}, board = {}",
                    info.swim_type, info.pool_length, info.goggles_orientation, info.board_type
                );
                Ok(DecoderEvent::ActivityInfo { timestamp, info })
            }
            MessageType::HrInfo => {
                let info = envelope.hr_led_info.unwrap_or_default();
                info!(
                    "HR sampling freq = {}, LED current green/ir/red = {}/{}/{}",
                    info.sampling_rate,
                    info.led_current_green,
                    info.led_current_ir,
                    info.led_current_red
                );
                Ok(DecoderEvent::HrInfo { timestamp, info })
            }
            message_type => {
                debug!("{} at {}", message_type, timestamp);
                Ok(DecoderEvent::Marker {
                    message_type,
                    timestamp,
                })
            }
        }
    }

    fn decode_window(
        &mut self,
        frame: &Frame<'_>,
        end_timestamp: u64,
        data: SensorData,
    ) -> Result<DecoderEvent, DecodeError> {
        let Some(descriptor) = descriptor_for(data.tag) else {
            return Ok(self.skip(frame, DecodeError::UnknownSensorType(data.tag)));
        };
        self.state = DecoderState::Dispatched(descriptor.sensor);

        let count = match data.sample_count {
            0 => data.buffer.len() / descriptor.bytes_per_sample,
            declared => declared as usize,
        };

        let samples = match unpack(&data.buffer, descriptor, count) {
            Ok(samples) => samples,
            Err(error) if self.options.skip_short_windows => {
                return Ok(self.skip(frame, error));
            }
            Err(error) => return Err(error),
        };

        let clock = self.options.clock;
        let nominal = clock.interval_units(
            self.options
                .nominal_interval_ms
                .or(descriptor.nominal_interval_ms)
                .unwrap_or(FIFO_INTERVAL_MS),
        );
        let timestamps = self
            .clocks
            .entry(descriptor.sensor)
            .or_insert_with(|| WindowClock::new(nominal, clock))
            .timestamps(end_timestamp, count);

        let rows: Vec<OutputRow> = samples
            .zip(timestamps)
            .map(|(sample, timestamp)| OutputRow {
                timestamp,
                values: sample.to_columns(descriptor),
            })
            .collect();

        trace!(
            "frame {}: {} window of {} samples ending {}",
            frame.index, descriptor.sensor, count, end_timestamp
        );
        self.stats.windows += 1;
        self.stats.rows += rows.len();

        Ok(DecoderEvent::Window(DecodedWindow {
            frame_index: frame.index,
            descriptor,
            end_timestamp,
            rows,
        }))
    }
}

impl Iterator for SensorLogDecoder<'_> {
    type Item = Result<DecoderEvent, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if matches!(self.state, DecoderState::Done | DecoderState::Error) {
            return None;
        }
        self.state = DecoderState::Scanning;

        let frame = match self.frames.next() {
            None => {
                self.state = DecoderState::Done;
                return None;
            }
            Some(Err(error)) => return self.fail(error),
            Some(Ok(frame)) => frame,
        };
        self.stats.frames += 1;

        let envelope = match Envelope::from_frame(&frame) {
            Ok(envelope) => envelope,
            Err(error) => return self.fail(error),
        };

        match self.dispatch(&frame, envelope) {
            Ok(event) => {
                if matches!(self.state, DecoderState::Dispatched(_)) {
                    self.state = DecoderState::Scanning;
                }
                Some(Ok(event))
            }
            Err(error) => self.fail(error),
        }
    }
}

impl std::iter::FusedIterator for SensorLogDecoder<'_> {}
