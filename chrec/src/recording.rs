//! Timed events and recordings.

use std::{slice, time::Duration, vec};

use serde::{Deserialize, Deserializer, Serialize, Serializer, de::DeserializeOwned};
use serde_json::Value;

use crate::{
    codec::{
        Decode, DecodeError, DecodeReason, Encode, EncodeError, ROOT_PATH, RecordReader,
        RecordWriter, deserialize_decoded, parse_json, serialize_encoded,
    },
    event::Event,
};

const TIME_SINCE_FIRST: &str = "timeSinceFirst";
const EVENT: &str = "event";
const EVENTS: &str = "events";

/// An event together with the time that had elapsed since the recording started.
///
/// On the wire, the elapsed time is an integer number of nanoseconds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimedEvent<In, Out> {
    pub time_since_first: Duration,
    pub event: Event<In, Out>,
}

impl<In, Out> TimedEvent<In, Out> {
    pub fn new(time_since_first: Duration, event: impl Into<Event<In, Out>>) -> Self {
        Self {
            time_since_first,
            event: event.into(),
        }
    }
}

impl<In: Serialize, Out: Serialize> Encode for TimedEvent<In, Out> {
    fn encode(&self) -> Result<Value, EncodeError> {
        let nanos = u64::try_from(self.time_since_first.as_nanos())
            .map_err(|_| EncodeError::DurationOverflow(self.time_since_first))?;

        Ok(RecordWriter::new()
            .field(TIME_SINCE_FIRST, nanos)
            .field(EVENT, self.event.encode()?)
            .finish())
    }
}

impl<In: DeserializeOwned, Out: DeserializeOwned> Decode for TimedEvent<In, Out> {
    fn decode_at(path: &str, value: &Value) -> Result<Self, DecodeError> {
        let record = RecordReader::new(path, value)?;

        Ok(Self {
            time_since_first: Duration::from_nanos(record.u64(TIME_SINCE_FIRST)?),
            event: record.decode(EVENT)?,
        })
    }
}

/// An ordered recording of the events observed by a pipeline stage.
///
/// Events are stored in the order they were observed. Within a recording produced by a recorder,
/// the elapsed time of each event is never less than that of the event before it, see
/// [`EventRecording::is_monotonic`]. The codec does not enforce this.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventRecording<In, Out> {
    events: Vec<TimedEvent<In, Out>>,
}

impl<In, Out> Default for EventRecording<In, Out> {
    fn default() -> Self {
        Self { events: Vec::new() }
    }
}

impl<In, Out> EventRecording<In, Out> {
    /// Create an empty recording.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_events(events: Vec<TimedEvent<In, Out>>) -> Self {
        Self { events }
    }

    /// Append an event to the end of the recording.
    pub fn push(&mut self, event: TimedEvent<In, Out>) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[TimedEvent<In, Out>] {
        &self.events
    }

    pub fn into_events(self) -> Vec<TimedEvent<In, Out>> {
        self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> slice::Iter<'_, TimedEvent<In, Out>> {
        self.events.iter()
    }

    /// Returns whether the elapsed times never decrease from one event to the next.
    pub fn is_monotonic(&self) -> bool {
        self.events
            .windows(2)
            .all(|pair| pair[0].time_since_first <= pair[1].time_since_first)
    }
}

impl<In: Serialize, Out: Serialize> EventRecording<In, Out> {
    pub fn to_json_string(&self) -> Result<String, EncodeError> {
        Ok(serde_json::to_string(&self.encode()?)?)
    }

    /// Encode the recording as indented, human-readable JSON.
    pub fn to_json_string_pretty(&self) -> Result<String, EncodeError> {
        Ok(serde_json::to_string_pretty(&self.encode()?)?)
    }
}

impl<In: DeserializeOwned, Out: DeserializeOwned> EventRecording<In, Out> {
    pub fn from_json_str(text: &str) -> Result<Self, DecodeError> {
        Self::decode(&parse_json(text)?)
    }

    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, DecodeError> {
        let text = std::str::from_utf8(bytes)
            .map_err(|err| DecodeError::new(ROOT_PATH, DecodeReason::Syntax(err.to_string())))?;
        Self::from_json_str(text)
    }
}

impl<In, Out> From<Vec<TimedEvent<In, Out>>> for EventRecording<In, Out> {
    fn from(events: Vec<TimedEvent<In, Out>>) -> Self {
        Self::from_events(events)
    }
}

impl<In, Out> FromIterator<TimedEvent<In, Out>> for EventRecording<In, Out> {
    fn from_iter<I: IntoIterator<Item = TimedEvent<In, Out>>>(iter: I) -> Self {
        Self::from_events(iter.into_iter().collect())
    }
}

impl<In, Out> IntoIterator for EventRecording<In, Out> {
    type Item = TimedEvent<In, Out>;
    type IntoIter = vec::IntoIter<TimedEvent<In, Out>>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.into_iter()
    }
}

impl<'a, In, Out> IntoIterator for &'a EventRecording<In, Out> {
    type Item = &'a TimedEvent<In, Out>;
    type IntoIter = slice::Iter<'a, TimedEvent<In, Out>>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

impl<In: Serialize, Out: Serialize> Encode for EventRecording<In, Out> {
    fn encode(&self) -> Result<Value, EncodeError> {
        let events = self
            .events
            .iter()
            .map(Encode::encode)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(RecordWriter::new().field(EVENTS, events).finish())
    }
}

impl<In: DeserializeOwned, Out: DeserializeOwned> Decode for EventRecording<In, Out> {
    fn decode_at(path: &str, value: &Value) -> Result<Self, DecodeError> {
        let record = RecordReader::new(path, value)?;

        Ok(Self {
            events: record.decode_list(EVENTS)?,
        })
    }
}

impl<In: Serialize, Out: Serialize> Serialize for TimedEvent<In, Out> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_encoded(self, serializer)
    }
}

impl<'de, In: DeserializeOwned, Out: DeserializeOwned> Deserialize<'de> for TimedEvent<In, Out> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserialize_decoded(deserializer)
    }
}

impl<In: Serialize, Out: Serialize> Serialize for EventRecording<In, Out> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_encoded(self, serializer)
    }
}

impl<'de, In: DeserializeOwned, Out: DeserializeOwned> Deserialize<'de>
    for EventRecording<In, Out>
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserialize_decoded(deserializer)
    }
}
