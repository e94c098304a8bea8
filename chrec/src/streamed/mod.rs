//! Streamed recordings.
//!
//! A streamed recording stores the same records as a recording document, but one per line so that
//! events can be appended while a recording is in progress. The first line is a
//! [`StreamHeader`] carrying the format identifier, every following non-empty line is a single
//! [`TimedEvent`] record.
//!
//! ```text
//! {"format":"chrec-s/0.1.0","createdTime":"2024-06-01T12:00:00Z"}
//! {"timeSinceFirst":0,"event":{"type":"outbound","subType":"register"}}
//! {"timeSinceFirst":1250,"event":{"type":"result","subType":"registerResult"}}
//! ```
//!
//! [`TimedEvent`]: crate::TimedEvent

use std::io;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::{
    FormatIdentifier, FormatVariant,
    codec::{DecodeError, EncodeError},
};

mod read;
mod write;

pub use read::{StreamReader, from_path, from_reader};
pub use write::StreamWriter;

/// The format identifier written by this version of the software.
pub fn current_software_version() -> FormatIdentifier {
    FormatIdentifier {
        variant: FormatVariant::ChrecStreaming,
        major: 0,
        minor: 1,
        patch: 0,
    }
}

/// The first line of a streamed recording.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamHeader {
    /// The format the rest of the stream is written in.
    pub format: FormatIdentifier,
    /// When the stream was created. For reference only.
    pub created_time: Timestamp,
}

impl StreamHeader {
    /// A header for the current format, created now.
    pub fn now() -> Self {
        Self {
            format: current_software_version(),
            created_time: Timestamp::now(),
        }
    }
}

/// An error returned when writing a streamed recording.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum WriteStreamError {
    #[error("failed to write stream: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Encode(#[from] EncodeError),
}

/// An error returned when reading a streamed recording.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum ReadStreamError {
    /// An underlying IO error when reading the stream.
    #[error("failed to read stream: {0}")]
    Io(#[from] io::Error),
    /// The stream contains no header line.
    #[error("stream is empty, expected a header line")]
    MissingHeader,
    /// The first line is not a valid header.
    #[error("invalid stream header: {0}")]
    InvalidHeader(#[source] serde_json::Error),
    /// The stream is written in a format this software cannot read.
    #[error("software version {current} cannot read stream format version {found}")]
    IncompatibleFormat {
        current: FormatIdentifier,
        found: FormatIdentifier,
    },
    /// A line could not be decoded into an event.
    #[error("line {line}: {source}")]
    InvalidEvent { line: usize, source: DecodeError },
}
