#[macro_use]
extern crate log;

use std::io;

use anyhow::bail;
use swimlog_codec::{
    DecodeError, DecoderEvent, DecoderOptions, InputFormat, LegacyReader, SensorFamily,
    SensorLogDecoder,
};

mod info;
pub use info::{SideChannel, StreamSummary, event_table_path, summarize};

mod sink;
pub use sink::{CsvSinks, output_path};

mod time_mode;
pub use time_mode::{TimeBase, TimestampMode, start_time_from_filename};

/// Decodes a whole log into `sinks`, stopping at the first fatal error.
///
/// Rows decoded before the error are already handed to the sinks; the
/// caller still has to flush them.
pub fn decode_into<W, F>(
    data: &[u8],
    format: InputFormat,
    options: DecoderOptions,
    mut time: TimeBase,
    sinks: &mut CsvSinks<W, F>,
) -> anyhow::Result<Option<DecodeError>>
where
    W: io::Write,
    F: FnMut(SensorFamily) -> io::Result<W>,
{
    if time.mode == TimestampMode::Ticks && !format.carries_ticks() {
        bail!(".{} input has no tick counter", format.extension());
    }

    match format {
        InputFormat::Framed => {
            let mut decoder = SensorLogDecoder::with_options(data, options);
            for event in decoder.by_ref() {
                match event {
                    Ok(DecoderEvent::Window(window)) => sinks.write_window(&window, &mut time)?,
                    Ok(_) => {}
                    Err(error) => return Ok(Some(error)),
                }
            }
            let stats = decoder.stats();
            info!(
                "Decoded {} frames: {} windows, {} rows, {} skipped",
                stats.frames, stats.windows, stats.rows, stats.skipped
            );
        }
        InputFormat::Legacy(legacy) => {
            let raw_ticks = time.mode == TimestampMode::Ticks;
            let reader = LegacyReader::new(data, legacy).with_raw_ticks(raw_ticks);
            if reader.remainder() > 0 {
                warn!("Ignoring {} trailing bytes", reader.remainder());
            }
            for window in reader {
                sinks.write_window(&window, &mut time)?;
            }
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, collections::HashMap, rc::Rc};

    use prost::Message;
    use swimlog_codec::{Envelope, LegacyFormat, SensorType, constants::FIFO_SAMPLE_COUNT, frame};

    use super::*;

    type Outputs = Rc<RefCell<HashMap<SensorFamily, Vec<u8>>>>;

    struct Capture(SensorFamily, Outputs);

    impl io::Write for Capture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.1
                .borrow_mut()
                .entry(self.0)
                .or_default()
                .extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn run(
        data: &[u8],
        format: InputFormat,
        time: TimeBase,
    ) -> (anyhow::Result<Option<DecodeError>>, Outputs) {
        let outputs: Outputs = Rc::default();
        let opened = outputs.clone();
        let mut sinks = CsvSinks::new(
            move |family| Ok(Capture(family, opened.clone())),
            b',',
            time.mode.header(),
        );
        let result = decode_into(
            data,
            format,
            time.mode.decoder_options(None, false),
            time,
            &mut sinks,
        );
        sinks.finish().unwrap();
        (result, outputs)
    }

    fn lines(outputs: &Outputs, family: SensorFamily) -> Vec<String> {
        let text = String::from_utf8(outputs.borrow()[&family].clone()).unwrap();
        text.lines().map(str::to_owned).collect()
    }

    fn first_column(outputs: &Outputs, family: SensorFamily) -> Vec<String> {
        lines(outputs, family)
            .iter()
            .filter_map(|line| line.split(',').next().map(str::to_owned))
            .collect()
    }

    fn epoch_stamped_windows() -> Vec<u8> {
        let mut data = frame(
            &Envelope::sensor_data(1_700_000_001_500, SensorType::GyrAcc, 1, &[0; 12])
                .encode_to_vec(),
        );
        data.extend(frame(
            &Envelope::sensor_data(1_700_000_003_000, SensorType::GyrAcc, 1, &[0; 12])
                .encode_to_vec(),
        ));
        data
    }

    #[test]
    fn framed_stream_writes_rows_before_error() {
        let mut data = frame(
            &Envelope::sensor_data(1500, SensorType::GyrAcc, 1, &[0; 12]).encode_to_vec(),
        );
        data.extend(frame(
            &Envelope::sensor_data(3000, SensorType::GyrAcc, 2, &[0; 24]).encode_to_vec(),
        ));
        data.extend([0x20, 0x01]);

        let (result, outputs) = run(
            &data,
            InputFormat::Framed,
            TimeBase::absolute(TimestampMode::Relative),
        );

        assert!(matches!(
            result.unwrap(),
            Some(DecodeError::TruncatedFrame { frame_index: 2, .. })
        ));
        let motion = lines(&outputs, SensorFamily::Motion);
        assert_eq!(motion.len(), 4);
        assert!(motion[0].starts_with("time_ms,acc_x_mg"));
        assert!(motion[1].starts_with("1500,"));
        assert!(motion[2].starts_with("2250,"));
        assert!(motion[3].starts_with("3000,"));
    }

    #[test]
    fn framed_relative_time_starts_at_zero() {
        let time = TimeBase::new(TimestampMode::Relative, "swim", InputFormat::Framed);
        let (result, outputs) = run(&epoch_stamped_windows(), InputFormat::Framed, time);

        assert!(result.unwrap().is_none());
        assert_eq!(
            first_column(&outputs, SensorFamily::Motion),
            vec!["time_ms", "0", "1500"]
        );
    }

    #[test]
    fn framed_epoch_time_is_not_offset_by_filename() {
        let time = TimeBase::new(
            TimestampMode::Epoch,
            "sensor_data-20231114-221320",
            InputFormat::Framed,
        );
        let (result, outputs) = run(&epoch_stamped_windows(), InputFormat::Framed, time);

        assert!(result.unwrap().is_none());
        assert_eq!(
            first_column(&outputs, SensorFamily::Motion),
            vec!["epoch_time_ms", "1700000001500", "1700000003000"]
        );
    }

    fn epoch_dump() -> Vec<u8> {
        let mut data = Vec::new();
        for n in 0..FIFO_SAMPLE_COUNT as u64 {
            data.extend([0u8; 18]);
            data.extend((1_000 + n).to_le_bytes());
        }
        data
    }

    #[test]
    fn epoch_dump_ignores_filename_offset() {
        let format = InputFormat::Legacy(LegacyFormat::BinEpoch);
        let time = TimeBase::new(TimestampMode::Epoch, "sensor_data-20231114-221320", format);

        let (result, outputs) = run(&epoch_dump(), format, time);

        assert!(result.unwrap().is_none());
        let motion = lines(&outputs, SensorFamily::Motion);
        assert_eq!(motion[0].split(',').next(), Some("epoch_time_ms"));
        assert!(motion[1].starts_with("1000,"));
        assert_eq!(motion.len(), FIFO_SAMPLE_COUNT + 1);
    }

    #[test]
    fn epoch_dump_relative_time_starts_at_zero() {
        let format = InputFormat::Legacy(LegacyFormat::BinEpoch);
        let time = TimeBase::new(TimestampMode::Relative, "swim", format);

        let (result, outputs) = run(&epoch_dump(), format, time);

        assert!(result.unwrap().is_none());
        let times = first_column(&outputs, SensorFamily::Motion);
        assert_eq!(times[1], "0");
        assert_eq!(times[FIFO_SAMPLE_COUNT], (FIFO_SAMPLE_COUNT - 1).to_string());
    }

    #[test]
    fn tick_time_needs_a_tick_counter() {
        for legacy in [LegacyFormat::Bin2, LegacyFormat::BinEpoch] {
            let format = InputFormat::Legacy(legacy);
            let time = TimeBase::new(TimestampMode::Ticks, "swim", format);
            let (result, outputs) = run(&epoch_dump(), format, time);

            assert!(result.is_err());
            assert!(outputs.borrow().is_empty());
        }
    }
}
