use std::io::{self, Write};

use serde::Serialize;

use crate::{
    codec::Encode,
    recording::{EventRecording, TimedEvent},
    streamed::{StreamHeader, WriteStreamError},
};

/// Writes a streamed recording, one line per event.
#[derive(Debug)]
pub struct StreamWriter<W>
where
    W: io::Write,
{
    inner: io::BufWriter<W>,
    event_count: usize,
}

impl<W> StreamWriter<W>
where
    W: io::Write,
{
    /// Create a writer with a header for the current format, created now.
    pub fn new(inner: W) -> Result<Self, WriteStreamError> {
        Self::with_header(inner, &StreamHeader::now())
    }

    pub fn with_header(inner: W, header: &StreamHeader) -> Result<Self, WriteStreamError> {
        let mut buf_writer = io::BufWriter::new(inner);

        serde_json::to_writer(&mut buf_writer, header).map_err(io::Error::from)?;
        buf_writer.write_all(b"\n")?;

        Ok(Self {
            inner: buf_writer,
            event_count: 0,
        })
    }

    pub fn write_event<In, Out>(&mut self, event: &TimedEvent<In, Out>) -> Result<(), WriteStreamError>
    where
        In: Serialize,
        Out: Serialize,
    {
        let record = event.encode()?;
        serde_json::to_writer(&mut self.inner, &record).map_err(io::Error::from)?;
        self.inner.write_all(b"\n")?;
        self.event_count += 1;

        Ok(())
    }

    /// Write every event of a recording in order.
    pub fn write_recording<In, Out>(
        &mut self,
        recording: &EventRecording<In, Out>,
    ) -> Result<(), WriteStreamError>
    where
        In: Serialize,
        Out: Serialize,
    {
        recording
            .iter()
            .try_for_each(|event| self.write_event(event))
    }

    pub fn event_count(&self) -> usize {
        self.event_count
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }

    /// Flush buffered lines and return the underlying writer.
    pub fn into_inner(self) -> io::Result<W> {
        self.inner.into_inner().map_err(io::IntoInnerError::into_error)
    }
}
