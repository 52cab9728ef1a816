use serde::Serialize;
use strum::{Display, EnumIter};

use crate::constants::{FIFO_INTERVAL_MS, REALTIME_FIFO_INTERVAL_MS, SensorType};

pub const GYRO_SCALE: f64 = 35.0; // mdps/LSB
pub const ACCEL_SCALE: f64 = 0.122; // mg/LSB
pub const MAG_SCALE: f64 = 1.5; // mgauss/LSB

/// Numeric encoding of one field inside a sample record. All little-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Encoding {
    I16,
    U32,
    F32,
}

impl Encoding {
    pub const fn width(self) -> usize {
        match self {
            Self::I16 => 2,
            Self::U32 | Self::F32 => 4,
        }
    }

    pub const fn is_integer(self) -> bool {
        !matches!(self, Self::F32)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FieldSpec {
    pub name: &'static str,
    pub encoding: Encoding,
    pub scale: f64,
    /// Index into the family's column list.
    pub column: usize,
}

/// Output table a sensor type is written to. Sensor types sharing a family
/// share one sink and one header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SensorFamily {
    Motion,
    HeartRate1,
    HeartRate2,
    HeartRate3,
    Barometer,
    Targeted,
}

impl SensorFamily {
    pub const fn columns(self) -> &'static [&'static str] {
        match self {
            Self::Motion => &[
                "acc_x_mg",
                "acc_y_mg",
                "acc_z_mg",
                "gyro_x_mdps",
                "gyro_y_mdps",
                "gyro_z_mdps",
                "mag_x_mgauss",
                "mag_y_mgauss",
                "mag_z_mgauss",
            ],
            Self::HeartRate1 => &["GREEN_LED"],
            Self::HeartRate2 => &["GREEN_LED", "IR_LED"],
            Self::HeartRate3 => &["GREEN_LED", "IR_LED", "RED_LED"],
            Self::Barometer => &["barometer", "temperature"],
            Self::Targeted => &["diff_roll", "vert_acc"],
        }
    }

    /// Appended to the input file stem when naming this family's output.
    pub const fn file_suffix(self) -> &'static str {
        match self {
            Self::Motion => "",
            Self::HeartRate1 => "_hr",
            Self::HeartRate2 => "_hr2",
            Self::HeartRate3 => "_hr3",
            Self::Barometer => "_baro",
            Self::Targeted => "_targeted",
        }
    }
}

#[derive(Debug, PartialEq, Serialize)]
pub struct SensorDescriptor {
    pub sensor: SensorType,
    pub family: SensorFamily,
    pub bytes_per_sample: usize,
    /// Fields in wire order.
    pub fields: &'static [FieldSpec],
    /// Window duration when no previous window is available.
    pub nominal_interval_ms: Option<u64>,
}

impl SensorDescriptor {
    /// Whether the given output column holds an integer-encoded field.
    /// Columns with no field behind them are written as integer zero.
    pub fn column_is_integer(&self, column: usize) -> bool {
        self.fields
            .iter()
            .find(|field| field.column == column)
            .is_none_or(|field| field.encoding.is_integer())
    }
}

const fn field(name: &'static str, encoding: Encoding, scale: f64, column: usize) -> FieldSpec {
    FieldSpec {
        name,
        encoding,
        scale,
        column,
    }
}

const GYR_ACC_FIELDS: &[FieldSpec] = &[
    field("gyro_x", Encoding::I16, GYRO_SCALE, 3),
    field("gyro_y", Encoding::I16, GYRO_SCALE, 4),
    field("gyro_z", Encoding::I16, GYRO_SCALE, 5),
    field("acc_x", Encoding::I16, ACCEL_SCALE, 0),
    field("acc_y", Encoding::I16, ACCEL_SCALE, 1),
    field("acc_z", Encoding::I16, ACCEL_SCALE, 2),
];

const GYR_ACC_MAG_FIELDS: &[FieldSpec] = &[
    field("gyro_x", Encoding::I16, GYRO_SCALE, 3),
    field("gyro_y", Encoding::I16, GYRO_SCALE, 4),
    field("gyro_z", Encoding::I16, GYRO_SCALE, 5),
    field("acc_x", Encoding::I16, ACCEL_SCALE, 0),
    field("acc_y", Encoding::I16, ACCEL_SCALE, 1),
    field("acc_z", Encoding::I16, ACCEL_SCALE, 2),
    field("mag_x", Encoding::I16, MAG_SCALE, 6),
    field("mag_y", Encoding::I16, MAG_SCALE, 7),
    field("mag_z", Encoding::I16, MAG_SCALE, 8),
];

const GYR_ACC_MAG_FLOAT_FIELDS: &[FieldSpec] = &[
    field("gyro_x", Encoding::F32, 1.0, 3),
    field("gyro_y", Encoding::F32, 1.0, 4),
    field("gyro_z", Encoding::F32, 1.0, 5),
    field("acc_x", Encoding::F32, 1.0, 0),
    field("acc_y", Encoding::F32, 1.0, 1),
    field("acc_z", Encoding::F32, 1.0, 2),
    field("mag_x", Encoding::F32, 1.0, 6),
    field("mag_y", Encoding::F32, 1.0, 7),
    field("mag_z", Encoding::F32, 1.0, 8),
];

const HR1_FIELDS: &[FieldSpec] = &[field("green_led", Encoding::U32, 1.0, 0)];

const HR2_FIELDS: &[FieldSpec] = &[
    field("green_led", Encoding::U32, 1.0, 0),
    field("ir_led", Encoding::U32, 1.0, 1),
];

const HR3_FIELDS: &[FieldSpec] = &[
    field("green_led", Encoding::U32, 1.0, 0),
    field("ir_led", Encoding::U32, 1.0, 1),
    field("red_led", Encoding::U32, 1.0, 2),
];

const BARO_FIELDS: &[FieldSpec] = &[
    field("pressure", Encoding::F32, 1.0, 0),
    field("temperature", Encoding::F32, 1.0, 1),
];

const DIFF_ROLL_FIELDS: &[FieldSpec] = &[field("diff_roll", Encoding::F32, 1.0, 0)];
const VERT_ACC_FIELDS: &[FieldSpec] = &[field("vert_acc", Encoding::F32, 1.0, 1)];

const fn descriptor(
    sensor: SensorType,
    family: SensorFamily,
    bytes_per_sample: usize,
    fields: &'static [FieldSpec],
    nominal_interval_ms: Option<u64>,
) -> SensorDescriptor {
    SensorDescriptor {
        sensor,
        family,
        bytes_per_sample,
        fields,
        nominal_interval_ms,
    }
}

static DESCRIPTORS: [SensorDescriptor; 12] = [
    descriptor(
        SensorType::GyrAcc,
        SensorFamily::Motion,
        12,
        GYR_ACC_FIELDS,
        Some(FIFO_INTERVAL_MS),
    ),
    descriptor(
        SensorType::GyrAccMag,
        SensorFamily::Motion,
        18,
        GYR_ACC_MAG_FIELDS,
        Some(FIFO_INTERVAL_MS),
    ),
    descriptor(
        SensorType::GyrAcc13Samples,
        SensorFamily::Motion,
        12,
        GYR_ACC_FIELDS,
        Some(REALTIME_FIFO_INTERVAL_MS),
    ),
    descriptor(
        SensorType::GyrAccMag13Samples,
        SensorFamily::Motion,
        18,
        GYR_ACC_MAG_FIELDS,
        Some(REALTIME_FIFO_INTERVAL_MS),
    ),
    descriptor(
        SensorType::GyrAccMag26Hz,
        SensorFamily::Motion,
        36,
        GYR_ACC_MAG_FLOAT_FIELDS,
        None,
    ),
    descriptor(
        SensorType::DiffRoll10Hz,
        SensorFamily::Targeted,
        4,
        DIFF_ROLL_FIELDS,
        None,
    ),
    descriptor(
        SensorType::VertAcc10Hz,
        SensorFamily::Targeted,
        4,
        VERT_ACC_FIELDS,
        None,
    ),
    descriptor(
        SensorType::HrLedGreen,
        SensorFamily::HeartRate1,
        4,
        HR1_FIELDS,
        None,
    ),
    descriptor(
        SensorType::HrLedGreenIr,
        SensorFamily::HeartRate2,
        8,
        HR2_FIELDS,
        None,
    ),
    descriptor(
        SensorType::HrLedGreenIrCycle,
        SensorFamily::HeartRate2,
        8,
        HR2_FIELDS,
        None,
    ),
    descriptor(
        SensorType::HrLedGreenIrRed,
        SensorFamily::HeartRate3,
        12,
        HR3_FIELDS,
        None,
    ),
    descriptor(
        SensorType::BarometerTemperature,
        SensorFamily::Barometer,
        8,
        BARO_FIELDS,
        None,
    ),
];

/// Layout for a raw sensor tag, or `None` if the tag is not known.
pub fn descriptor_for(tag: u32) -> Option<&'static SensorDescriptor> {
    SensorType::from_u32(tag).map(descriptor_of)
}

pub fn descriptor_of(sensor: SensorType) -> &'static SensorDescriptor {
    // Table is ordered by tag value.
    &DESCRIPTORS[sensor.as_u32() as usize]
}
