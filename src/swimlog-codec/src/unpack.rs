use std::slice::ChunksExact;

use crate::{
    error::DecodeError,
    helpers::{BufferReader, InvalidIndexError},
    registry::{Encoding, SensorDescriptor},
};

/// One decoded sample record, scaled to physical units, in wire field order.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub values: Vec<f64>,
}

impl Sample {
    /// Spreads the values into the descriptor family's column order, leaving
    /// columns the sensor does not provide at zero.
    pub fn to_columns(&self, descriptor: &SensorDescriptor) -> Vec<f64> {
        let mut columns = vec![0.0; descriptor.family.columns().len()];
        for (field, value) in descriptor.fields.iter().zip(&self.values) {
            columns[field.column] = *value;
        }
        columns
    }
}

/// Lazily decodes `count` records of `descriptor.bytes_per_sample` bytes.
///
/// Bytes past the last record are ignored. A buffer shorter than
/// `count * bytes_per_sample` is rejected before anything is decoded.
pub fn unpack<'a>(
    buffer: &'a [u8],
    descriptor: &'a SensorDescriptor,
    count: usize,
) -> Result<Samples<'a>, DecodeError> {
    let required = count
        .checked_mul(descriptor.bytes_per_sample)
        .filter(|required| *required <= buffer.len())
        .ok_or_else(|| DecodeError::BufferTooShort {
            sensor: descriptor.sensor.to_string(),
            required: count.saturating_mul(descriptor.bytes_per_sample),
            available: buffer.len(),
        })?;

    Ok(Samples {
        records: buffer[..required].chunks_exact(descriptor.bytes_per_sample),
        descriptor,
    })
}

pub struct Samples<'a> {
    records: ChunksExact<'a, u8>,
    descriptor: &'a SensorDescriptor,
}

impl Iterator for Samples<'_> {
    type Item = Sample;

    fn next(&mut self) -> Option<Self::Item> {
        let record = self.records.next()?;
        read_fields(record, self.descriptor).ok()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.records.size_hint()
    }
}

impl ExactSizeIterator for Samples<'_> {}

/// Decodes one record from the front of `record`; trailing bytes are ignored.
pub fn decode_record(record: &[u8], descriptor: &SensorDescriptor) -> Result<Sample, DecodeError> {
    read_fields(record, descriptor).map_err(|_| DecodeError::BufferTooShort {
        sensor: descriptor.sensor.to_string(),
        required: descriptor.bytes_per_sample,
        available: record.len(),
    })
}

fn read_fields(
    mut record: &[u8],
    descriptor: &SensorDescriptor,
) -> Result<Sample, InvalidIndexError> {
    let values = descriptor
        .fields
        .iter()
        .map(|field| -> Result<f64, InvalidIndexError> {
            let raw = match field.encoding {
                Encoding::I16 => f64::from(record.read_i16_le()?),
                Encoding::U32 => f64::from(record.read_u32_le()?),
                Encoding::F32 => f64::from(record.read_f32_le()?),
            };
            Ok(raw * field.scale)
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Sample { values })
}
