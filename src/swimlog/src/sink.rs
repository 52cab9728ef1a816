use std::{
    collections::HashMap,
    io::{self, Write},
    path::{Path, PathBuf},
};

use anyhow::Context;
use csv::{Terminator, Writer, WriterBuilder};
use strum::IntoEnumIterator;
use swimlog_codec::{DecodedWindow, SensorFamily};

use crate::time_mode::TimeBase;

/// `<dir>/<stem><family suffix>.csv` (or `.tsv`) next to the input file.
pub fn output_path(input: &Path, family: SensorFamily, tsv: bool) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|stem| stem.to_string_lossy())
        .unwrap_or_default();
    let ext = if tsv { "tsv" } else { "csv" };
    input.with_file_name(format!("{}{}.{}", stem, family.file_suffix(), ext))
}

struct FamilySink<W: Write> {
    writer: Writer<W>,
    rows: usize,
}

/// One delimited-text writer per sensor family, opened on first use.
pub struct CsvSinks<W: Write, F> {
    open: F,
    delimiter: u8,
    time_header: &'static str,
    sinks: HashMap<SensorFamily, FamilySink<W>>,
}

impl<W, F> CsvSinks<W, F>
where
    W: Write,
    F: FnMut(SensorFamily) -> io::Result<W>,
{
    pub fn new(open: F, delimiter: u8, time_header: &'static str) -> Self {
        Self {
            open,
            delimiter,
            time_header,
            sinks: HashMap::new(),
        }
    }

    fn sink(&mut self, family: SensorFamily) -> anyhow::Result<&mut FamilySink<W>> {
        if !self.sinks.contains_key(&family) {
            let out = (self.open)(family)
                .with_context(|| format!("opening {} output", family))?;
            let mut writer = WriterBuilder::new()
                .delimiter(self.delimiter)
                .terminator(Terminator::Any(b'\n'))
                .from_writer(out);

            let mut header = vec![self.time_header];
            header.extend_from_slice(family.columns());
            writer.write_record(&header)?;
            debug!("Opened {} sink", family);
            self.sinks.insert(family, FamilySink { writer, rows: 0 });
        }
        self.sinks
            .get_mut(&family)
            .context("sink missing after open")
    }

    pub fn write_window(
        &mut self,
        window: &DecodedWindow,
        time: &mut TimeBase,
    ) -> anyhow::Result<()> {
        let descriptor = window.descriptor;
        let sink = self.sink(descriptor.family)?;

        for row in &window.rows {
            let mut record = Vec::with_capacity(row.values.len() + 1);
            record.push(time.apply(row.timestamp).to_string());
            record.extend(row.values.iter().enumerate().map(|(column, value)| {
                if descriptor.column_is_integer(column) {
                    (value.trunc() as i64).to_string()
                } else {
                    value.to_string()
                }
            }));
            sink.writer.write_record(&record)?;
        }
        sink.rows += window.rows.len();
        Ok(())
    }

    /// Flushes every sink and returns the row count written per family.
    pub fn finish(mut self) -> anyhow::Result<Vec<(SensorFamily, usize)>> {
        let mut written = Vec::with_capacity(self.sinks.len());
        for family in SensorFamily::iter() {
            if let Some(mut sink) = self.sinks.remove(&family) {
                sink.writer.flush()?;
                written.push((family, sink.rows));
            }
        }
        Ok(written)
    }
}
