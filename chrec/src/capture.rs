//! Best-effort captures of values which are not part of the event model.
//!
//! Errors and user events in a pipeline can be of any type. Rather than attempting to serialize
//! them structurally, a capture keeps only the name of the value's type and a textual rendering of
//! the value. Capturing never fails.

use std::{
    any::{self, Any},
    error, fmt, io,
};

use serde_json::Value;

use crate::codec::{Decode, DecodeError, Encode, EncodeError, RecordReader, RecordWriter};

const KIND: &str = "kind";
const DESCRIPTION: &str = "description";

/// A failure reduced to its type name and description.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ErrorCapture {
    /// The type name of the original error.
    pub kind: String,
    /// The `Display` rendering of the original error.
    pub description: String,
}

impl ErrorCapture {
    pub fn new(kind: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            description: description.into(),
        }
    }

    /// Capture an error.
    ///
    /// The kind is the type name of `E`. When `E` is a trait object, the kind names the trait
    /// object type rather than the erased concrete type.
    pub fn from_error<E>(error: &E) -> Self
    where
        E: error::Error + ?Sized,
    {
        Self::new(any::type_name::<E>(), error.to_string())
    }
}

impl From<&dyn PipelineError> for ErrorCapture {
    /// Capture a type-erased error, keeping the name of its concrete type.
    fn from(error: &dyn PipelineError) -> Self {
        Self::new(error.type_name(), error.to_string())
    }
}

impl From<&io::Error> for ErrorCapture {
    fn from(error: &io::Error) -> Self {
        Self::from_error(error)
    }
}

impl fmt::Display for ErrorCapture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{kind}: {desc}", kind = self.kind, desc = self.description)
    }
}

/// An arbitrary value reduced to its type name and `Debug` rendering.
///
/// Only the two strings survive encoding, the structure of the original value is lost.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct OpaqueValueCapture {
    /// The type name of the original value.
    pub kind: String,
    /// The `Debug` rendering of the original value.
    pub description: String,
}

impl OpaqueValueCapture {
    pub fn new(kind: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            description: description.into(),
        }
    }

    /// Capture any debuggable value.
    pub fn of<T>(value: &T) -> Self
    where
        T: fmt::Debug + ?Sized,
    {
        Self::new(any::type_name::<T>(), format!("{value:?}"))
    }

    /// Capture a type-erased user event, keeping the name of its concrete type.
    pub fn from_user_event(event: &dyn UserEvent) -> Self {
        Self::new(event.type_name(), format!("{event:?}"))
    }
}

impl fmt::Display for OpaqueValueCapture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{kind}({desc})", kind = self.kind, desc = self.description)
    }
}

/// A user event passed along a pipeline.
///
/// User events are type-erased. A recorder recognises the events it models by downcasting with
/// [`UserEvent::as_any`], any other event is captured with [`OpaqueValueCapture`].
///
/// This trait is implemented for every `'static` type that implements `Debug`.
pub trait UserEvent: Any + fmt::Debug {
    fn as_any(&self) -> &dyn Any;

    /// The name of the concrete type of the event.
    fn type_name(&self) -> &'static str;
}

impl<T> UserEvent for T
where
    T: Any + fmt::Debug,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn type_name(&self) -> &'static str {
        any::type_name::<T>()
    }
}

/// An error raised within a pipeline.
///
/// Like [`UserEvent`], errors are type-erased as they travel along a pipeline. The name of the
/// concrete type is kept so that it can be captured in an [`ErrorCapture`].
///
/// This trait is implemented for every `'static` type that implements `Error`.
pub trait PipelineError: error::Error + Any {
    /// The name of the concrete type of the error.
    fn type_name(&self) -> &'static str;
}

impl<E> PipelineError for E
where
    E: error::Error + Any,
{
    fn type_name(&self) -> &'static str {
        any::type_name::<E>()
    }
}

fn encode_capture(kind: &str, description: &str) -> Value {
    RecordWriter::new()
        .field(KIND, kind)
        .field(DESCRIPTION, description)
        .finish()
}

impl Encode for ErrorCapture {
    fn encode(&self) -> Result<Value, EncodeError> {
        Ok(encode_capture(&self.kind, &self.description))
    }
}

impl Decode for ErrorCapture {
    fn decode_at(path: &str, value: &Value) -> Result<Self, DecodeError> {
        let record = RecordReader::new(path, value)?;
        Ok(Self::new(record.string(KIND)?, record.string(DESCRIPTION)?))
    }
}

impl Encode for OpaqueValueCapture {
    fn encode(&self) -> Result<Value, EncodeError> {
        Ok(encode_capture(&self.kind, &self.description))
    }
}

impl Decode for OpaqueValueCapture {
    fn decode_at(path: &str, value: &Value) -> Result<Self, DecodeError> {
        let record = RecordReader::new(path, value)?;
        Ok(Self::new(record.string(KIND)?, record.string(DESCRIPTION)?))
    }
}

crate::codec::serde_via_codec!(ErrorCapture, OpaqueValueCapture);

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Custom {
        id: u32,
    }

    #[test]
    fn error_capture_uses_type_name_and_display() {
        let error = io::Error::new(io::ErrorKind::ConnectionRefused, "refused");
        let capture = ErrorCapture::from(&error);

        assert_eq!(capture.kind, any::type_name::<io::Error>());
        assert_eq!(capture.description, "refused");
    }

    #[derive(Debug, thiserror::Error)]
    #[error("no reply within {secs}s")]
    struct Timeout {
        secs: u32,
    }

    #[test]
    fn erased_error_keeps_concrete_type() {
        let error: Box<dyn PipelineError> = Box::new(Timeout { secs: 30 });
        let capture = ErrorCapture::from(&*error);

        assert!(capture.kind.ends_with("Timeout"), "kind: {}", capture.kind);
        assert_eq!(capture.description, "no reply within 30s");
    }

    #[test]
    fn opaque_capture_uses_debug() {
        let capture = OpaqueValueCapture::of(&Custom { id: 7 });

        assert!(capture.kind.ends_with("Custom"), "kind: {}", capture.kind);
        assert_eq!(capture.description, "Custom { id: 7 }");
    }

    #[test]
    fn erased_user_event_keeps_concrete_type() {
        let event: Box<dyn UserEvent> = Box::new(Custom { id: 1 });
        let capture = OpaqueValueCapture::from_user_event(&*event);

        assert!(capture.kind.ends_with("Custom"), "kind: {}", capture.kind);
        assert!((*event).as_any().downcast_ref::<Custom>().is_some());
    }
}
