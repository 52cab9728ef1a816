//! Raw FIFO dumps written by older firmware, before the framed log format.
//!
//! All three layouts store whole 156-sample windows back to back with no
//! header. A trailing partial window is ignored.

use std::slice::ChunksExact;

use crate::{
    constants::{
        FIFO_INTERVAL_MS, FIFO_SAMPLE_COUNT, SensorType, TICK_COUNTER_MODULUS, TICK_PERIOD_US,
    },
    decoder::{DecodedWindow, OutputRow},
    helpers::BufferReader,
    registry::{SensorDescriptor, descriptor_of},
    timestamp::{spread, tick_elapsed},
    unpack::decode_record,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegacyFormat {
    /// 9 x i16 IMU, then a 24-bit tick counter in bytes 18, 19 and 21.
    Bin,
    /// 6 x i16 IMU only.
    Bin2,
    /// 9 x i16 IMU, then a u64 epoch timestamp in milliseconds.
    BinEpoch,
}

impl LegacyFormat {
    pub const fn record_size(self) -> usize {
        match self {
            Self::Bin => 24,
            Self::Bin2 => 12,
            Self::BinEpoch => 26,
        }
    }

    pub const fn window_size(self) -> usize {
        self.record_size() * FIFO_SAMPLE_COUNT
    }

    /// Layout of the IMU part at the start of each record.
    pub fn descriptor(self) -> &'static SensorDescriptor {
        match self {
            Self::Bin | Self::BinEpoch => descriptor_of(SensorType::GyrAccMag),
            Self::Bin2 => descriptor_of(SensorType::GyrAcc),
        }
    }
}

/// Tick counter of a `.bin` record: mid byte, MSB, pad, LSB.
pub fn record_tick(record: &[u8]) -> u64 {
    (u64::from(record[18]) << 8) | (u64::from(record[19]) << 16) | u64::from(record[21])
}

pub fn ticks_to_ms(ticks: u64) -> f64 {
    (ticks * TICK_PERIOD_US) as f64 / 1000.0
}

pub struct LegacyReader<'a> {
    data: &'a [u8],
    format: LegacyFormat,
    windows: ChunksExact<'a, u8>,
    index: usize,
    raw_ticks: bool,
    end_ms: f64,
    previous_tick: Option<u64>,
}

impl<'a> LegacyReader<'a> {
    pub fn new(data: &'a [u8], format: LegacyFormat) -> Self {
        Self {
            data,
            format,
            windows: data.chunks_exact(format.window_size()),
            index: 0,
            raw_ticks: false,
            end_ms: 0.0,
            previous_tick: None,
        }
    }

    /// Report the raw tick counter per sample instead of milliseconds.
    /// Only `.bin` carries ticks; other formats ignore this.
    pub fn with_raw_ticks(mut self, raw_ticks: bool) -> Self {
        self.raw_ticks = raw_ticks;
        self
    }

    pub fn format(&self) -> LegacyFormat {
        self.format
    }

    /// Complete windows as undecoded bytes.
    pub fn raw_windows(&self) -> ChunksExact<'a, u8> {
        self.data.chunks_exact(self.format.window_size())
    }

    /// Bytes after the last complete window.
    pub fn remainder(&self) -> usize {
        self.data.len() % self.format.window_size()
    }

    fn timestamps(&mut self, window: &[u8]) -> Vec<i64> {
        let records = window.chunks_exact(self.format.record_size());
        match self.format {
            LegacyFormat::Bin if self.raw_ticks => records.map(|r| record_tick(r) as i64).collect(),
            LegacyFormat::BinEpoch => records
                .map(|record| {
                    let mut tail = &record[18..];
                    tail.read_u64_le().unwrap_or_default() as i64
                })
                .collect(),
            LegacyFormat::Bin => {
                let last = window.len() - self.format.record_size();
                let end_tick = record_tick(&window[last..]);
                let interval = match self.previous_tick {
                    Some(previous) => {
                        match tick_elapsed(previous, end_tick, TICK_COUNTER_MODULUS) {
                            0 => FIFO_INTERVAL_MS as f64,
                            ticks => ticks_to_ms(ticks),
                        }
                    }
                    None => FIFO_INTERVAL_MS as f64,
                };
                self.previous_tick = Some(end_tick);
                self.end_ms += interval;
                spread(self.end_ms, interval, FIFO_SAMPLE_COUNT).collect()
            }
            LegacyFormat::Bin2 => {
                let interval = FIFO_INTERVAL_MS as f64;
                self.end_ms += interval;
                spread(self.end_ms, interval, FIFO_SAMPLE_COUNT).collect()
            }
        }
    }
}

impl Iterator for LegacyReader<'_> {
    type Item = DecodedWindow;

    fn next(&mut self) -> Option<Self::Item> {
        let window = self.windows.next()?;
        let descriptor = self.format.descriptor();
        let timestamps = self.timestamps(window);
        let rows: Vec<OutputRow> = window
            .chunks_exact(self.format.record_size())
            .zip(timestamps)
            .filter_map(|(record, timestamp)| {
                let sample = decode_record(record, descriptor).ok()?;
                Some(OutputRow {
                    timestamp,
                    values: sample.to_columns(descriptor),
                })
            })
            .collect();

        let index = self.index;
        self.index += 1;
        trace!("legacy window {}: {} rows", index, rows.len());
        Some(DecodedWindow {
            frame_index: index,
            descriptor,
            end_timestamp: rows.last().map_or(0, |row| row.timestamp.max(0) as u64),
            rows,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.windows.size_hint()
    }
}
