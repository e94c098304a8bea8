use std::{
    fs,
    io::{self, BufReader, Cursor},
    time::Duration,
};

use chrec::{
    DecodeReason, Event, EventRecording, FormatIdentifier, FormatVariant, Inbound, Outbound,
    OutboundResult, TimedEvent,
    streamed::{self, ReadStreamError, StreamHeader, StreamReader, StreamWriter},
};

type TestRecording = EventRecording<String, String>;

fn recording() -> TestRecording {
    TestRecording::from_events(vec![
        TimedEvent::new(Duration::ZERO, Outbound::Register),
        TimedEvent::new(Duration::from_nanos(500), OutboundResult::Register(None)),
        TimedEvent::new(Duration::from_micros(3), Outbound::Write("abc".to_owned())),
        TimedEvent::new(Duration::from_micros(9), Inbound::Read("def".to_owned())),
    ])
}

fn header_line(format: &str) -> String {
    format!(r#"{{"format":"{format}","createdTime":"2024-06-01T12:00:00Z"}}"#)
}

#[test]
fn write_and_read_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.jsonl");

    let recording = recording();
    {
        let file = fs::File::create(&path).unwrap();
        let mut writer = StreamWriter::new(file).unwrap();
        writer.write_recording(&recording).unwrap();
        assert_eq!(writer.event_count(), 4);
        writer.flush().unwrap();
    }

    let contents = fs::read_to_string(&path).unwrap();
    assert_eq!(contents.lines().count(), 5);

    let read: TestRecording = streamed::from_path(&path).unwrap();
    assert_eq!(read, recording);
}

#[test]
fn header_is_the_first_line() {
    let mut writer = StreamWriter::new(Vec::new()).unwrap();
    writer
        .write_event(&TimedEvent::<String, String>::new(Duration::ZERO, Outbound::Flush))
        .unwrap();
    let buffer = writer.into_inner().unwrap();
    let text = String::from_utf8(buffer).unwrap();

    let mut lines = text.lines();
    let header: StreamHeader = serde_json::from_str(lines.next().unwrap()).unwrap();
    assert_eq!(header.format, streamed::current_software_version());
    let event: serde_json::Value = serde_json::from_str(lines.next().unwrap()).unwrap();
    assert_eq!(
        event,
        serde_json::json!({
            "timeSinceFirst": 0,
            "event": { "type": "outbound", "subType": "flush" },
        })
    );
    assert!(lines.next().is_none());
}

#[test]
fn blank_lines_are_skipped() {
    let text = format!(
        "{header}\n\n{event}\n   \n",
        header = header_line("chrec-s/0.1.0"),
        event = r#"{"timeSinceFirst":7,"event":{"type":"inbound","subType":"channelActive"}}"#,
    );

    let read: TestRecording = streamed::from_reader(Cursor::new(text)).unwrap();

    let expected: Vec<TimedEvent<String, String>> =
        vec![TimedEvent::new(Duration::from_nanos(7), Inbound::Active)];
    assert_eq!(read.events(), expected.as_slice());
}

#[test]
fn empty_stream_has_no_header() {
    let result = streamed::from_reader::<String, String>(io::empty());

    assert!(matches!(result, Err(ReadStreamError::MissingHeader)));
}

#[test]
fn invalid_header() {
    let result = streamed::from_reader::<String, String>(Cursor::new("not json\n"));

    assert!(matches!(result, Err(ReadStreamError::InvalidHeader(_))));
}

#[test]
fn incompatible_format() {
    let text = format!("{}\n", header_line("chrec-s/0.2.0"));
    let result = streamed::from_reader::<String, String>(Cursor::new(text));

    let (current, found) = match result {
        Err(ReadStreamError::IncompatibleFormat { current, found }) => (current, found),
        other => panic!("expected incompatible format, got {other:?}"),
    };
    assert_eq!(current, streamed::current_software_version());
    assert_eq!(
        found,
        FormatIdentifier {
            variant: FormatVariant::ChrecStreaming,
            major: 0,
            minor: 2,
            patch: 0,
        }
    );
}

#[test]
fn invalid_event_reports_the_line() {
    let text = format!(
        "{header}\n{good}\n\n{bad}\n{good}\n",
        header = header_line("chrec-s/0.1.0"),
        good = r#"{"timeSinceFirst":1,"event":{"type":"outbound","subType":"read"}}"#,
        bad = r#"{"timeSinceFirst":2,"event":{"type":"outbound","subType":"read","payload":1"#,
    );

    let result = streamed::from_reader::<String, String>(Cursor::new(text));

    let (line, source) = match result {
        Err(ReadStreamError::InvalidEvent { line, source }) => (line, source),
        other => panic!("expected invalid event, got {other:?}"),
    };
    assert_eq!(line, 4);
    assert!(matches!(source.reason(), DecodeReason::Syntax(_)));
}

#[test]
fn reader_yields_events_lazily() {
    let text = format!(
        "{header}\n{first}\n{bad}\n",
        header = header_line("chrec-s/0.1.0"),
        first = r#"{"timeSinceFirst":1,"event":{"type":"outbound","subType":"read"}}"#,
        bad = r#"{"timeSinceFirst":2,"event":{"type":"outbound"}}"#,
    );

    let mut reader =
        StreamReader::<_, String, String>::new(BufReader::new(Cursor::new(text))).unwrap();
    assert_eq!(
        reader.header().format,
        streamed::current_software_version()
    );

    let first = reader.next().unwrap().unwrap();
    assert_eq!(first.event, Event::Outbound(Outbound::Read));

    let second = reader.next().unwrap();
    assert!(matches!(
        second,
        Err(ReadStreamError::InvalidEvent { line: 3, .. })
    ));
}
