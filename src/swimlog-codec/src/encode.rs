use prost::Message;

use crate::{
    constants::{FIFO_INTERVAL_MS, MessageType, SensorType},
    envelope::{ActivityInfo, Envelope, HrLedInfo, SensorData},
    legacy::{LegacyFormat, LegacyReader},
    registry::{Encoding, SensorDescriptor},
};

impl Envelope {
    pub fn marker(message_type: MessageType, timestamp: u64) -> Self {
        Self {
            message_type: message_type.as_u32(),
            timestamp,
            ..Default::default()
        }
    }

    pub fn sensor_data(
        timestamp: u64,
        sensor: SensorType,
        sample_count: u32,
        buffer: &[u8],
    ) -> Self {
        Self::raw_sensor_data(timestamp, sensor.as_u32(), sample_count, buffer)
    }

    /// Sensor data envelope with an arbitrary, possibly unknown, type tag.
    pub fn raw_sensor_data(timestamp: u64, tag: u32, sample_count: u32, buffer: &[u8]) -> Self {
        Self {
            message_type: MessageType::SensorData.as_u32(),
            timestamp,
            sensor_data: Some(SensorData {
                tag,
                sample_count,
                buffer: buffer.to_vec(),
            }),
            ..Default::default()
        }
    }

    pub fn activity_info(timestamp: u64, info: ActivityInfo) -> Self {
        Self {
            message_type: MessageType::ActivityInfo.as_u32(),
            timestamp,
            activity_info: Some(info),
            ..Default::default()
        }
    }

    pub fn hr_info(timestamp: u64, info: HrLedInfo) -> Self {
        Self {
            message_type: MessageType::HrInfo.as_u32(),
            timestamp,
            hr_led_info: Some(info),
            ..Default::default()
        }
    }
}

/// Packs physical values back into a sample buffer.
///
/// Each sample holds one value per descriptor field, in wire order. Values
/// are divided by the field scale and rounded; out-of-range integers saturate.
pub fn pack_samples(descriptor: &SensorDescriptor, samples: &[Vec<f64>]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(samples.len() * descriptor.bytes_per_sample);
    for sample in samples {
        for (index, field) in descriptor.fields.iter().enumerate() {
            let value = sample.get(index).copied().unwrap_or_default();
            match field.encoding {
                Encoding::I16 => {
                    buf.extend_from_slice(&((value / field.scale).round() as i16).to_le_bytes())
                }
                Encoding::U32 => {
                    buf.extend_from_slice(&((value / field.scale).round() as u32).to_le_bytes())
                }
                Encoding::F32 => {
                    buf.extend_from_slice(&((value / field.scale) as f32).to_le_bytes())
                }
            }
        }
    }
    buf
}

/// Converts a legacy `.bin` dump into a framed `.bin_pb` stream.
///
/// The stream opens with START_ACTIVITY at 0 (or START_OWS at 1000 for open
/// water), carries one 9-axis SENSOR_DATA envelope per complete window at
/// 1500 ms steps, then PAUSE (or STOP_OWS) and a repeat of the last window.
pub fn legacy_to_stream(bin: &[u8], ows: bool) -> Vec<u8> {
    let mut timestamp = 0;
    let mut out = if ows {
        timestamp += 1000;
        Envelope::marker(MessageType::StartOws, timestamp).encode_length_delimited_to_vec()
    } else {
        Envelope::marker(MessageType::StartActivity, timestamp).encode_length_delimited_to_vec()
    };

    let format = LegacyFormat::Bin;
    let imu_bytes = format.descriptor().bytes_per_sample;
    let mut last_window = None;
    for window in LegacyReader::new(bin, format).raw_windows() {
        let buffer: Vec<u8> = window
            .chunks_exact(format.record_size())
            .flat_map(|record| &record[..imu_bytes])
            .copied()
            .collect();
        timestamp += FIFO_INTERVAL_MS;
        let count = (buffer.len() / imu_bytes) as u32;
        let framed = Envelope::sensor_data(timestamp, SensorType::GyrAccMag, count, &buffer)
            .encode_length_delimited_to_vec();
        out.extend_from_slice(&framed);
        last_window = Some(framed);
    }

    let closing = if ows {
        MessageType::StopOws
    } else {
        MessageType::Pause
    };
    out.extend(Envelope::marker(closing, timestamp).encode_length_delimited_to_vec());
    if let Some(framed) = last_window {
        out.extend(framed);
    }
    debug!("Packed {} legacy bytes into {} stream bytes", bin.len(), out.len());
    out
}

#[cfg(test)]
mod tests {
    use rand::Rng;

    use super::*;
    use crate::{
        constants::FIFO_SAMPLE_COUNT,
        frame::FrameReader,
        registry::descriptor_of,
        unpack::unpack,
    };

    #[test]
    fn empty_start_activity_encodes_to_nothing() {
        let envelope = Envelope::marker(MessageType::StartActivity, 0);
        assert!(envelope.encode_to_vec().is_empty());
        assert_eq!(envelope.encode_length_delimited_to_vec(), vec![0x00]);
    }

    #[test]
    fn sensor_data_matches_fixture() {
        let envelope = Envelope::sensor_data(3000, SensorType::GyrAccMag, 1, &[1, 2]);
        assert_eq!(hex::encode(envelope.encode_to_vec()), "080510b8171a08080110011a020102");
    }

    #[test]
    fn encoded_envelopes_parse_back() {
        let info = ActivityInfo {
            swim_type: 3,
            pool_length: 50,
            goggles_orientation: 1,
            board_type: 7,
        };
        let hr = HrLedInfo {
            sampling_rate: 100,
            led_current_green: 12,
            led_current_ir: 0,
            led_current_red: 300,
        };
        let buffer = [0xAA; 8];
        let envelopes = [
            Envelope::activity_info(5, info),
            Envelope::hr_info(6, hr),
            Envelope::raw_sensor_data(7, 200, 2, &buffer),
            Envelope::marker(MessageType::Resume, u64::from(u32::MAX) + 1),
        ];

        for envelope in envelopes {
            let encoded = envelope.encode_to_vec();
            assert_eq!(Envelope::decode(&encoded[..]).unwrap(), envelope);
        }
    }

    #[test]
    fn pack_then_unpack_preserves_raw_values() {
        let descriptor = descriptor_of(SensorType::GyrAccMag);
        let mut rng = rand::rng();
        let raw: Vec<Vec<i16>> = (0..20)
            .map(|_| (0..9).map(|_| rng.random_range(i16::MIN..=i16::MAX)).collect())
            .collect();
        let physical: Vec<Vec<f64>> = raw
            .iter()
            .map(|sample| {
                sample
                    .iter()
                    .zip(descriptor.fields)
                    .map(|(v, field)| f64::from(*v) * field.scale)
                    .collect()
            })
            .collect();

        let buffer = pack_samples(descriptor, &physical);
        assert_eq!(buffer.len(), 20 * 18);
        let expected: Vec<u8> = raw.iter().flatten().flat_map(|v| v.to_le_bytes()).collect();
        assert_eq!(buffer, expected);

        let decoded: Vec<_> = unpack(&buffer, descriptor, 20).unwrap().collect();
        assert_eq!(decoded[0].values, physical[0]);
    }

    #[test]
    fn pack_saturates_out_of_range() {
        let descriptor = descriptor_of(SensorType::GyrAcc);
        let buffer = pack_samples(descriptor, &[vec![1e9, -1e9]]);
        assert_eq!(&buffer[..4], &[0xFF, 0x7F, 0x00, 0x80]);
        // missing fields are packed as zero
        assert_eq!(&buffer[4..], &[0; 8]);
    }

    fn legacy_bin(windows: usize) -> Vec<u8> {
        let record_size = LegacyFormat::Bin.record_size();
        let mut bin = vec![0u8; windows * FIFO_SAMPLE_COUNT * record_size];
        for (n, record) in bin.chunks_exact_mut(record_size).enumerate() {
            record[..2].copy_from_slice(&(n as i16).to_le_bytes());
            record[18] = 0xEE;
            record[19] = 0xEE;
            record[21] = 0xEE;
        }
        bin
    }

    fn kinds(stream: &[u8]) -> Vec<(MessageType, u64)> {
        FrameReader::new(stream)
            .map(|frame| {
                let envelope = Envelope::from_frame(&frame.unwrap()).unwrap();
                (envelope.kind().unwrap(), envelope.timestamp)
            })
            .collect()
    }

    #[test]
    fn legacy_stream_sequence() {
        let stream = legacy_to_stream(&legacy_bin(2), false);
        assert_eq!(
            kinds(&stream),
            vec![
                (MessageType::StartActivity, 0),
                (MessageType::SensorData, 1500),
                (MessageType::SensorData, 3000),
                (MessageType::Pause, 3000),
                (MessageType::SensorData, 3000),
            ]
        );
    }

    #[test]
    fn legacy_stream_open_water() {
        let stream = legacy_to_stream(&legacy_bin(1), true);
        assert_eq!(
            kinds(&stream),
            vec![
                (MessageType::StartOws, 1000),
                (MessageType::SensorData, 2500),
                (MessageType::StopOws, 2500),
                (MessageType::SensorData, 2500),
            ]
        );
    }

    #[test]
    fn legacy_stream_strips_tick_bytes() {
        let stream = legacy_to_stream(&legacy_bin(1), false);
        let second = FrameReader::new(&stream).nth(1).unwrap().unwrap();
        let envelope = Envelope::from_frame(&second).unwrap();
        let data = envelope.sensor_data.unwrap();

        assert_eq!(data.sensor_type(), Some(SensorType::GyrAccMag));
        assert_eq!(data.sample_count as usize, FIFO_SAMPLE_COUNT);
        assert_eq!(data.buffer.len(), FIFO_SAMPLE_COUNT * 18);
        assert_eq!(&data.buffer[18..20], &1i16.to_le_bytes());
        assert!(!data.buffer.contains(&0xEE));
    }

    #[test]
    fn legacy_stream_without_windows() {
        let stream = legacy_to_stream(&[0; 100], false);
        assert_eq!(
            kinds(&stream),
            vec![(MessageType::StartActivity, 0), (MessageType::Pause, 0)]
        );
    }
}
