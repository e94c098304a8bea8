use std::{error, io, path::Path};

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod collect;
mod convert;
mod summary;

use crate::convert::{InputFormat, OutputFormat, convert};

#[derive(Parser)]
#[command(about = "Validate chrec recordings and convert them to other formats", long_about = None)]
struct Args {
    /// The path to a recording document or streamed recording
    recording_path: String,

    /// Input format (defaults to stream for `.jsonl` files and document otherwise)
    #[arg(short, long)]
    input_format: Option<InputFormat>,

    /// Output format
    #[arg(short, long)]
    format: OutputFormat,

    /// Output file path (defaults to <input_stem>.<format_extension>)
    #[arg(short, long)]
    output: Option<String>,
}

fn main() -> Result<(), Box<dyn error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let input_format = args
        .input_format
        .unwrap_or_else(|| InputFormat::from_path(&args.recording_path));

    let output_path = args.output.unwrap_or_else(|| {
        let stem = Path::new(&args.recording_path)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("output");
        format!("{}.{}", stem, args.format.extension())
    });

    convert(&args.recording_path, &input_format, &args.format, &output_path)?;

    Ok(())
}
