use chrono::NaiveDateTime;
use clap::ValueEnum;
use swimlog_codec::{Clock, DecoderOptions, InputFormat, constants::TICK_COUNTER_MODULUS};

const FILENAME_PREFIX: &str = "sensor_data-";
const FILENAME_TIME_FORMAT: &str = "%Y%m%d-%H%M%S";

/// How the first column of every output row is expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum TimestampMode {
    /// Milliseconds from the start of the recording
    #[default]
    Relative,
    /// Milliseconds since the Unix epoch, using the start time in the filename
    Epoch,
    /// Raw device tick counter
    Ticks,
}

impl TimestampMode {
    pub const fn header(self) -> &'static str {
        match self {
            Self::Relative => "time_ms",
            Self::Epoch => "epoch_time_ms",
            Self::Ticks => "ticktime",
        }
    }

    pub fn decoder_options(
        self,
        nominal_interval_ms: Option<u64>,
        skip_short_windows: bool,
    ) -> DecoderOptions {
        let clock = match self {
            Self::Ticks => Clock::Ticks {
                modulus: TICK_COUNTER_MODULUS,
            },
            Self::Relative | Self::Epoch => Clock::Monotonic,
        };
        DecoderOptions {
            nominal_interval_ms,
            clock,
            skip_short_windows,
        }
    }
}

/// Recording start encoded in names like `sensor_data-20240315-101500`.
pub fn start_time_from_filename(stem: &str) -> Option<NaiveDateTime> {
    let stamp = stem.strip_prefix(FILENAME_PREFIX)?.get(..15)?;
    NaiveDateTime::parse_from_str(stamp, FILENAME_TIME_FORMAT).ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rebase {
    Offset(i64),
    /// Subtract the first timestamp written.
    FromFirst(Option<i64>),
}

/// Maps decoded timestamps to the values written out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeBase {
    pub mode: TimestampMode,
    rebase: Rebase,
}

impl TimeBase {
    /// Logs that record timestamps already hold device time (framed) or epoch
    /// time (`.bin_epoch`); counted logs start at zero and only learn their
    /// wall-clock start from the filename.
    pub fn new(mode: TimestampMode, stem: &str, format: InputFormat) -> Self {
        let rebase = match (mode, format.records_timestamps()) {
            (TimestampMode::Ticks, _) | (TimestampMode::Epoch, true) => Rebase::Offset(0),
            (TimestampMode::Relative, true) => Rebase::FromFirst(None),
            (TimestampMode::Relative, false) => Rebase::Offset(0),
            (TimestampMode::Epoch, false) => match start_time_from_filename(stem) {
                Some(start) => {
                    info!("Sensor timestamp starts at {}", start);
                    Rebase::Offset(start.and_utc().timestamp_millis())
                }
                None => {
                    warn!("No start time in `{}`, counting from zero", stem);
                    Rebase::Offset(0)
                }
            },
        };
        Self { mode, rebase }
    }

    /// Timestamps written unchanged.
    pub fn absolute(mode: TimestampMode) -> Self {
        Self::with_offset(mode, 0)
    }

    pub fn with_offset(mode: TimestampMode, offset_ms: i64) -> Self {
        Self {
            mode,
            rebase: Rebase::Offset(offset_ms),
        }
    }

    pub fn apply(&mut self, timestamp: i64) -> i64 {
        match &mut self.rebase {
            Rebase::Offset(offset) => timestamp.saturating_add(*offset),
            Rebase::FromFirst(origin) => timestamp.saturating_sub(*origin.get_or_insert(timestamp)),
        }
    }
}
