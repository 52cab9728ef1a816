use std::path::Path;

use crate::{error::DecodeError, legacy::LegacyFormat};

/// Kind of sensor log, chosen from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    /// Length-prefixed envelope stream.
    Framed,
    Legacy(LegacyFormat),
}

impl InputFormat {
    pub fn from_extension(ext: &str) -> Result<Self, DecodeError> {
        match ext {
            "bin_pb" => Ok(Self::Framed),
            "bin" => Ok(Self::Legacy(LegacyFormat::Bin)),
            "bin2" => Ok(Self::Legacy(LegacyFormat::Bin2)),
            "bin_epoch" => Ok(Self::Legacy(LegacyFormat::BinEpoch)),
            other => Err(DecodeError::UnsupportedFileExtension(other.to_owned())),
        }
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, DecodeError> {
        let ext = path
            .as_ref()
            .extension()
            .map(|ext| ext.to_string_lossy())
            .unwrap_or_default();
        Self::from_extension(&ext)
    }

    pub const fn extension(self) -> &'static str {
        match self {
            Self::Framed => "bin_pb",
            Self::Legacy(LegacyFormat::Bin) => "bin",
            Self::Legacy(LegacyFormat::Bin2) => "bin2",
            Self::Legacy(LegacyFormat::BinEpoch) => "bin_epoch",
        }
    }

    /// Whether the log stores its own timestamps rather than only a sample
    /// cadence.
    pub const fn records_timestamps(self) -> bool {
        matches!(self, Self::Framed | Self::Legacy(LegacyFormat::BinEpoch))
    }

    /// Whether raw device ticks can be recovered from the log.
    pub const fn carries_ticks(self) -> bool {
        matches!(self, Self::Framed | Self::Legacy(LegacyFormat::Bin))
    }
}
