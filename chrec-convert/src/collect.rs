use std::{error, fs};

use chrec::{EventRecording, streamed};
use serde_json::Value;
use tracing::{debug, info};

use crate::convert::InputFormat;

/// A recording with untyped application payloads.
pub(crate) type Recording = EventRecording<Value, Value>;

/// Read and validate a complete recording.
///
/// Any decoding error fails the whole read, no partial recording is returned.
pub(crate) fn collect_recording(
    recording_path: &str,
    format: &InputFormat,
) -> Result<Recording, Box<dyn error::Error>> {
    debug!(recording_path, ?format, "reading recording");

    let recording: Recording = match format {
        InputFormat::Document => {
            let contents = fs::read(recording_path)?;
            EventRecording::from_json_slice(&contents)?
        }
        InputFormat::Stream => streamed::from_path(recording_path)?,
    };

    info!(
        recording_path,
        events = recording.len(),
        "read recording"
    );

    Ok(recording)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn document_with_bad_event_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"events":[{{"timeSinceFirst":0,"event":{{"type":"inbound","subType":"nope"}}}}]}}"#
        )
        .unwrap();

        let err = collect_recording(file.path().to_str().unwrap(), &InputFormat::Document)
            .unwrap_err();

        assert!(
            err.to_string().contains("$.events[0].event.subType"),
            "{err}"
        );
    }

    #[test]
    fn untyped_payloads_are_kept() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"events":[{{"timeSinceFirst":5,"event":{{"type":"inbound","subType":"channelRead","payload":{{"id":1}}}}}}]}}"#
        )
        .unwrap();

        let recording =
            collect_recording(file.path().to_str().unwrap(), &InputFormat::Document).unwrap();

        assert_eq!(recording.len(), 1);
    }
}
