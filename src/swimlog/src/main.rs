#[macro_use]
extern crate log;

use std::{fs, path::PathBuf};

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use swimlog::{
    CsvSinks, TimeBase, TimestampMode, event_table_path, output_path, start_time_from_filename,
    summarize,
};
use swimlog_codec::{InputFormat, LegacyFormat, legacy_to_stream};

#[derive(Parser)]
#[command(version, about = "Decode swim sensor logs into delimited text")]
pub struct SwimlogCli {
    #[clap(subcommand)]
    pub subcommand: SwimlogCommand,
}

#[derive(Subcommand)]
pub enum SwimlogCommand {
    ///
    /// Decode a sensor log into one csv/tsv file per sensor family
    ///
    Decode {
        #[arg(short, long, env = "SWIMLOG_FILE")]
        file: PathBuf,
        /// Write tab separated output instead of csv
        #[arg(long, env = "SWIMLOG_TSV")]
        tsv: bool,
        #[arg(long, value_enum, default_value_t, env = "SWIMLOG_TIME")]
        time: TimestampMode,
        /// Window duration used when no earlier window is available
        #[arg(long, env = "SWIMLOG_NOMINAL_INTERVAL_MS")]
        nominal_interval_ms: Option<u64>,
        /// Skip windows whose buffer is shorter than declared instead of stopping
        #[arg(long, env = "SWIMLOG_SKIP_SHORT_WINDOWS")]
        skip_short_windows: bool,
    },
    ///
    /// Print side-channel events and the sensor families present in a log
    ///
    Info {
        #[arg(short, long, env = "SWIMLOG_FILE")]
        file: PathBuf,
        #[arg(long)]
        json: bool,
        /// Also write the event table to `<stem>_protobuf_info.csv`
        #[arg(long)]
        csv: bool,
    },
    ///
    /// Convert a legacy .bin dump into a .bin_pb log
    ///
    Pack {
        #[arg(short, long, env = "SWIMLOG_FILE")]
        file: PathBuf,
        /// Mark the recording as an open water swim
        #[arg(long, env = "SWIMLOG_OWS")]
        ows: bool,
    },
}

fn main() -> anyhow::Result<()> {
    if let Err(error) = dotenv() {
        println!("{}", error);
    }

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = SwimlogCli::parse();
    match cli.subcommand {
        SwimlogCommand::Decode {
            file,
            tsv,
            time,
            nominal_interval_ms,
            skip_short_windows,
        } => {
            let format = InputFormat::from_path(&file)?;
            let data = fs::read(&file).with_context(|| format!("reading {}", file.display()))?;
            let time_base = TimeBase::new(time, &file_stem(&file), format);
            let options = time.decoder_options(nominal_interval_ms, skip_short_windows);

            let delimiter = if tsv { b'\t' } else { b',' };
            let mut sinks = CsvSinks::new(
                |family| fs::File::create(output_path(&file, family, tsv)),
                delimiter,
                time.header(),
            );
            let outcome = swimlog::decode_into(&data, format, options, time_base, &mut sinks);
            let written = sinks.finish()?;

            for (family, rows) in written {
                println!(
                    "{} -> {} ({} rows)",
                    file.display(),
                    output_path(&file, family, tsv).display(),
                    rows
                );
            }

            if let Some(error) = outcome? {
                error!("{}", error);
                return Err(error).context(format!("decoding {}", file.display()));
            }
            Ok(())
        }
        SwimlogCommand::Info { file, json, csv } => {
            if InputFormat::from_path(&file)? != InputFormat::Framed {
                bail!("info needs a .bin_pb log, got {}", file.display());
            }
            let data = fs::read(&file).with_context(|| format!("reading {}", file.display()))?;
            let start_time = start_time_from_filename(&file_stem(&file));
            let options = TimestampMode::Relative.decoder_options(None, true);
            let (summary, error) = summarize(&data, options, start_time);

            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print!("{}", summary);
            }

            if csv {
                let out = event_table_path(&file);
                let writer = fs::File::create(&out)
                    .with_context(|| format!("creating {}", out.display()))?;
                summary.write_event_table(writer)?;
                println!("{} -> {}", file.display(), out.display());
            }

            match error {
                Some(error) => Err(error).context(format!("reading {}", file.display())),
                None => Ok(()),
            }
        }
        SwimlogCommand::Pack { file, ows } => {
            if InputFormat::from_path(&file)? != InputFormat::Legacy(LegacyFormat::Bin) {
                bail!("pack needs a .bin dump, got {}", file.display());
            }
            let data = fs::read(&file).with_context(|| format!("reading {}", file.display()))?;
            let stream = legacy_to_stream(&data, ows);

            let out = file.with_extension(InputFormat::Framed.extension());
            fs::write(&out, &stream).with_context(|| format!("writing {}", out.display()))?;
            println!("{} -> {}", file.display(), out.display());
            Ok(())
        }
    }
}

fn file_stem(file: &std::path::Path) -> String {
    file.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}
