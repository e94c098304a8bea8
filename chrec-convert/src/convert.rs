use std::{error, fs, io, path::Path};

use chrec::streamed::StreamWriter;
use clap::ValueEnum;
use tracing::info;

use crate::{collect, summary};

#[derive(Clone, Debug, ValueEnum)]
pub(crate) enum InputFormat {
    /// A single JSON recording document
    Document,
    /// A streamed recording, one JSON event per line
    Stream,
}

impl InputFormat {
    /// Guess the format of a recording from its file extension.
    pub(crate) fn from_path(path: impl AsRef<Path>) -> Self {
        match path.as_ref().extension().and_then(|ext| ext.to_str()) {
            Some("jsonl") => InputFormat::Stream,
            _ => InputFormat::Document,
        }
    }
}

#[derive(Clone, Debug, ValueEnum)]
pub(crate) enum OutputFormat {
    /// A single JSON recording document
    Document,
    /// A streamed recording, one JSON event per line
    Stream,
    /// A human readable listing of the events
    Summary,
}

impl OutputFormat {
    pub(crate) fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Document => "json",
            OutputFormat::Stream => "jsonl",
            OutputFormat::Summary => "txt",
        }
    }
}

pub(crate) fn convert(
    recording_path: &str,
    input_format: &InputFormat,
    format: &OutputFormat,
    output_path: &str,
) -> Result<(), Box<dyn error::Error>> {
    let recording = collect::collect_recording(recording_path, input_format)?;

    match format {
        OutputFormat::Document => fs::write(output_path, recording.to_json_string_pretty()?)?,
        OutputFormat::Stream => {
            let file = fs::File::create(output_path)?;
            let mut writer = StreamWriter::new(file)?;
            writer.write_recording(&recording)?;
            writer.flush()?;
        }
        OutputFormat::Summary => {
            let file = io::BufWriter::new(fs::File::create(output_path)?);
            summary::write_summary(&recording, file)?;
        }
    }

    info!(output_path, ?format, "wrote recording");

    Ok(())
}
