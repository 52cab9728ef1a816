use std::{
    collections::BTreeMap,
    fmt,
    io::Write,
    path::{Path, PathBuf},
};

use chrono::{NaiveDateTime, TimeDelta};
use csv::{Terminator, WriterBuilder};
use serde::Serialize;
use swimlog_codec::{
    ActivityInfo, DecodeError, DecoderEvent, DecoderOptions, HrLedInfo, MessageType, SensorFamily,
    SensorLogDecoder,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SideChannel {
    ActivityInfo {
        timestamp: u64,
        #[serde(flatten)]
        info: ActivityInfo,
    },
    HrInfo {
        timestamp: u64,
        #[serde(flatten)]
        info: HrLedInfo,
    },
    Marker {
        message_type: String,
        /// Raw `message_type` value from the envelope.
        code: u32,
        timestamp: u64,
    },
}

/// What a framed log contains, without writing any rows.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StreamSummary {
    pub frames: usize,
    pub windows: usize,
    pub rows: usize,
    pub skipped: usize,
    pub families: Vec<SensorFamily>,
    /// Window count per sensor type.
    pub sensors: BTreeMap<String, usize>,
    pub events: Vec<SideChannel>,
    /// Timestamp of the last envelope read.
    pub last_timestamp: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<NaiveDateTime>,
    /// Fatal error that ended the scan early.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub fn summarize(
    data: &[u8],
    options: DecoderOptions,
    start_time: Option<NaiveDateTime>,
) -> (StreamSummary, Option<DecodeError>) {
    let mut summary = StreamSummary {
        start_time,
        ..Default::default()
    };
    let mut decoder = SensorLogDecoder::with_options(data, options);
    let mut failure = None;

    for event in decoder.by_ref() {
        match event {
            Ok(DecoderEvent::Window(window)) => {
                summary.last_timestamp = window.end_timestamp;
                let family = window.descriptor.family;
                if !summary.families.contains(&family) {
                    summary.families.push(family);
                }
                *summary
                    .sensors
                    .entry(window.descriptor.sensor.to_string())
                    .or_default() += 1;
            }
            Ok(DecoderEvent::ActivityInfo { timestamp, info }) => {
                summary.last_timestamp = timestamp;
                summary.events.push(SideChannel::ActivityInfo { timestamp, info })
            }
            Ok(DecoderEvent::HrInfo { timestamp, info }) => {
                summary.last_timestamp = timestamp;
                summary.events.push(SideChannel::HrInfo { timestamp, info })
            }
            Ok(DecoderEvent::Marker {
                message_type,
                timestamp,
            }) => {
                summary.last_timestamp = timestamp;
                summary.events.push(SideChannel::Marker {
                    message_type: message_type.to_string(),
                    code: message_type.as_u32(),
                    timestamp,
                })
            }
            Ok(DecoderEvent::UnknownMessage {
                message_type,
                timestamp,
            }) => {
                summary.last_timestamp = timestamp;
                summary.events.push(SideChannel::Marker {
                    message_type: message_type.to_string(),
                    code: message_type,
                    timestamp,
                })
            }
            Ok(DecoderEvent::Skipped { .. }) => {}
            Err(error) => {
                summary.error = Some(error.to_string());
                failure = Some(error);
            }
        }
    }

    let stats = decoder.stats();
    summary.frames = stats.frames;
    summary.windows = stats.windows;
    summary.rows = stats.rows;
    summary.skipped = stats.skipped;
    (summary, failure)
}

/// `<dir>/<stem>_protobuf_info.csv` next to the input file.
pub fn event_table_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|stem| stem.to_string_lossy())
        .unwrap_or_default();
    input.with_file_name(format!("{}_protobuf_info.csv", stem))
}

impl StreamSummary {
    fn wall_clock(&self, timestamp: u64) -> String {
        let at = self.start_time.and_then(|start| {
            let ms = i64::try_from(timestamp).ok()?;
            start.checked_add_signed(TimeDelta::try_milliseconds(ms)?)
        });
        match at {
            Some(at) => format!("{} ({})", timestamp, at.format("%H:%M:%S%.3f")),
            None => timestamp.to_string(),
        }
    }

    /// Writes one `epoch_time_ms,protobuf_event` row per side-channel value,
    /// closed by a row listing the sensor families seen.
    ///
    /// Activity info expands to pool length, orientation, swim type and board
    /// type rows; every other message is written as its raw type value.
    pub fn write_event_table<W: Write>(&self, out: W) -> anyhow::Result<()> {
        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .terminator(Terminator::Any(b'\n'))
            .from_writer(out);
        writer.write_record(["epoch_time_ms", "protobuf_event"])?;

        for event in &self.events {
            match event {
                SideChannel::ActivityInfo { timestamp, info } => {
                    for value in [
                        info.pool_length,
                        info.goggles_orientation,
                        info.swim_type,
                        info.board_type,
                    ] {
                        writer.serialize((timestamp, value))?;
                    }
                }
                SideChannel::HrInfo { timestamp, .. } => {
                    writer.serialize((timestamp, MessageType::HrInfo.as_u32()))?
                }
                SideChannel::Marker {
                    code, timestamp, ..
                } => writer.serialize((timestamp, code))?,
            }
        }

        let families: Vec<String> = self.families.iter().map(ToString::to_string).collect();
        writer.serialize((self.last_timestamp, families.join(" ")))?;
        writer.flush()?;
        Ok(())
    }
}

impl fmt::Display for StreamSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(start) = self.start_time {
            writeln!(f, "Recording start: {}", start)?;
        }
        writeln!(
            f,
            "Frames: {}, windows: {}, rows: {}, skipped: {}",
            self.frames, self.windows, self.rows, self.skipped
        )?;

        let families: Vec<String> = self.families.iter().map(ToString::to_string).collect();
        writeln!(f, "Families: {}", families.join(", "))?;
        for (sensor, windows) in &self.sensors {
            writeln!(f, "  {}: {} windows", sensor, windows)?;
        }

        for event in &self.events {
            match event {
                SideChannel::ActivityInfo { timestamp, info } => writeln!(
                    f,
                    "{}: swim type {}, pool length {}, orientation {}, board {}",
                    self.wall_clock(*timestamp),
                    info.swim_type,
                    info.pool_length,
                    info.goggles_orientation,
                    info.board_type
                )?,
                SideChannel::HrInfo { timestamp, info } => writeln!(
                    f,
                    "{}: HR sampling {}, LED green/ir/red {}/{}/{}",
                    self.wall_clock(*timestamp),
                    info.sampling_rate,
                    info.led_current_green,
                    info.led_current_ir,
                    info.led_current_red
                )?,
                SideChannel::Marker {
                    message_type,
                    timestamp,
                    ..
                } => writeln!(f, "{}: {}", self.wall_clock(*timestamp), message_type)?,
            }
        }

        if let Some(error) = &self.error {
            writeln!(f, "Stopped early: {}", error)?;
        }
        Ok(())
    }
}
