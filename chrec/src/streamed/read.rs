use std::{
    fs,
    io::{self, BufRead},
    marker::PhantomData,
    path::Path,
};

use serde::de::DeserializeOwned;

use crate::{
    codec::{Decode, parse_json},
    recording::{EventRecording, TimedEvent},
    streamed::{ReadStreamError, StreamHeader, current_software_version},
};

/// Reads the events of a streamed recording one line at a time.
///
/// The header is read and checked for compatibility when the reader is created. Empty lines are
/// skipped. The iterator yields an error for the first line which cannot be decoded.
#[derive(Debug)]
pub struct StreamReader<R, In, Out> {
    lines: io::Lines<R>,
    header: StreamHeader,
    line: usize,
    _payloads: PhantomData<fn() -> (In, Out)>,
}

impl<R, In, Out> StreamReader<R, In, Out>
where
    R: BufRead,
{
    pub fn new(reader: R) -> Result<Self, ReadStreamError> {
        let mut lines = reader.lines();
        let raw_header = lines.next().ok_or(ReadStreamError::MissingHeader)??;
        let header: StreamHeader =
            serde_json::from_str(&raw_header).map_err(ReadStreamError::InvalidHeader)?;

        let current = current_software_version();
        if !current.can_read_version(&header.format) {
            return Err(ReadStreamError::IncompatibleFormat {
                current,
                found: header.format,
            });
        }

        Ok(Self {
            lines,
            header,
            line: 1,
            _payloads: PhantomData,
        })
    }

    pub fn header(&self) -> &StreamHeader {
        &self.header
    }
}

impl<R, In, Out> Iterator for StreamReader<R, In, Out>
where
    R: BufRead,
    In: DeserializeOwned,
    Out: DeserializeOwned,
{
    type Item = Result<TimedEvent<In, Out>, ReadStreamError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let raw_line = match self.lines.next()? {
                Ok(raw_line) => raw_line,
                Err(err) => return Some(Err(err.into())),
            };
            self.line += 1;
            if raw_line.trim().is_empty() {
                continue;
            }

            let line = self.line;
            let event = parse_json(&raw_line)
                .and_then(|value| TimedEvent::decode(&value))
                .map_err(|source| ReadStreamError::InvalidEvent { line, source });
            return Some(event);
        }
    }
}

/// Read a complete streamed recording.
///
/// Reading stops at the first error, partial recordings are never returned.
pub fn from_reader<In, Out>(reader: impl BufRead) -> Result<EventRecording<In, Out>, ReadStreamError>
where
    In: DeserializeOwned,
    Out: DeserializeOwned,
{
    StreamReader::<_, In, Out>::new(reader)?.collect()
}

/// Read a complete streamed recording from a file.
pub fn from_path<In, Out>(path: impl AsRef<Path>) -> Result<EventRecording<In, Out>, ReadStreamError>
where
    In: DeserializeOwned,
    Out: DeserializeOwned,
{
    let file = fs::File::open(path)?;
    from_reader(io::BufReader::new(file))
}
