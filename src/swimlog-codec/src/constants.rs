use serde::Serialize;
use strum::{Display, EnumIter};

/// Tick counter period in microseconds per LSB.
pub const TICK_PERIOD_US: u64 = 25;
/// The device tick counter is 24 bits wide.
pub const TICK_COUNTER_MODULUS: u64 = 0x100_0000;

/// Samples per hardware FIFO drain (~1.5 s at 104 Hz).
pub const FIFO_SAMPLE_COUNT: usize = 156;
pub const FIFO_INTERVAL_MS: u64 = 1500;
/// Samples per real-time drain used while streaming over BLE.
pub const REALTIME_FIFO_SAMPLE_COUNT: usize = 13;
pub const REALTIME_FIFO_INTERVAL_MS: u64 = 125;

// MessageType enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, Serialize)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[repr(u32)]
pub enum MessageType {
    StartActivity = 0,
    Pause = 1,
    Resume = 2,
    StartOws = 3,
    StopOws = 4,
    SensorData = 5,
    ActivityInfo = 6,
    HrInfo = 7,
}

// SensorType enum, the `type` tag inside a SENSOR_DATA envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, Serialize)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[repr(u32)]
pub enum SensorType {
    GyrAcc = 0,
    GyrAccMag = 1,
    #[strum(serialize = "GYR_ACC_13_SAMPLES")]
    GyrAcc13Samples = 2,
    #[strum(serialize = "GYR_ACC_MAG_13_SAMPLES")]
    GyrAccMag13Samples = 3,
    #[strum(serialize = "GYR_ACC_MAG_26HZ")]
    GyrAccMag26Hz = 4,
    #[strum(serialize = "DIFF_ROLL_10HZ")]
    DiffRoll10Hz = 5,
    #[strum(serialize = "VERT_ACC_10HZ")]
    VertAcc10Hz = 6,
    HrLedGreen = 7,
    HrLedGreenIr = 8,
    HrLedGreenIrCycle = 9,
    HrLedGreenIrRed = 10,
    BarometerTemperature = 11,
}

impl MessageType {
    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            0 => Some(Self::StartActivity),
            1 => Some(Self::Pause),
            2 => Some(Self::Resume),
            3 => Some(Self::StartOws),
            4 => Some(Self::StopOws),
            5 => Some(Self::SensorData),
            6 => Some(Self::ActivityInfo),
            7 => Some(Self::HrInfo),
            _ => None,
        }
    }

    pub fn as_u32(self) -> u32 {
        self as u32
    }
}

impl SensorType {
    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            0 => Some(Self::GyrAcc),
            1 => Some(Self::GyrAccMag),
            2 => Some(Self::GyrAcc13Samples),
            3 => Some(Self::GyrAccMag13Samples),
            4 => Some(Self::GyrAccMag26Hz),
            5 => Some(Self::DiffRoll10Hz),
            6 => Some(Self::VertAcc10Hz),
            7 => Some(Self::HrLedGreen),
            8 => Some(Self::HrLedGreenIr),
            9 => Some(Self::HrLedGreenIrCycle),
            10 => Some(Self::HrLedGreenIrRed),
            11 => Some(Self::BarometerTemperature),
            _ => None,
        }
    }

    pub fn as_u32(self) -> u32 {
        self as u32
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn sensor_type_tags_roundtrip() {
        for sensor in SensorType::iter() {
            assert_eq!(SensorType::from_u32(sensor.as_u32()), Some(sensor));
        }
        assert_eq!(SensorType::from_u32(12), None);
    }

    #[test]
    fn message_type_tags_roundtrip() {
        for kind in MessageType::iter() {
            assert_eq!(MessageType::from_u32(kind.as_u32()), Some(kind));
        }
        assert_eq!(MessageType::from_u32(99), None);
    }

    #[test]
    fn display_uses_wire_names() {
        assert_eq!(SensorType::GyrAccMag26Hz.to_string(), "GYR_ACC_MAG_26HZ");
        assert_eq!(SensorType::HrLedGreenIrRed.to_string(), "HR_LED_GREEN_IR_RED");
        assert_eq!(MessageType::StartOws.to_string(), "START_OWS");
    }
}
