//! Record encoding and decoding.
//!
//! Every wire type is converted to and from a JSON tree ([`serde_json::Value`]) by hand. Each
//! record carries one or two discriminator fields and only the fields that are relevant to the
//! variant it represents. Decoding dispatches on the discriminators and fails closed: an
//! unrecognised discriminator or a missing or malformed field is always a [`DecodeError`], never
//! a default value.
//!
//! The [`Encode`] and [`Decode`] traits are the codec contract. Types which implement them also
//! implement [`serde::Serialize`] and [`serde::Deserialize`] by going through the codec, so they
//! can be embedded in other serde documents.

use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize, Serializer, de::DeserializeOwned};
use serde_json::{Map, Value};

/// The path of the outermost record being decoded.
pub const ROOT_PATH: &str = "$";

/// Conversion of a value into its wire record.
pub trait Encode {
    /// Encode the value into a JSON tree.
    fn encode(&self) -> Result<Value, EncodeError>;
}

/// Conversion of a wire record back into a value.
pub trait Decode: Sized {
    /// Decode a value found at `path` within a larger document.
    ///
    /// The path is only used to report the location of errors.
    fn decode_at(path: &str, value: &Value) -> Result<Self, DecodeError>;

    /// Decode a value which is the root of a document.
    fn decode(value: &Value) -> Result<Self, DecodeError> {
        Self::decode_at(ROOT_PATH, value)
    }
}

/// An error encountered while decoding a record.
///
/// The path locates the offending value within the decoded document, for example
/// `$.events[3].event.payload.payload2`.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("cannot decode {path}: {reason}")]
pub struct DecodeError {
    path: String,
    reason: DecodeReason,
}

impl DecodeError {
    pub fn new(path: impl Into<String>, reason: DecodeReason) -> Self {
        Self {
            path: path.into(),
            reason,
        }
    }

    /// The location of the value which could not be decoded.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Why the value could not be decoded.
    pub fn reason(&self) -> &DecodeReason {
        &self.reason
    }
}

/// The reason a [`DecodeError`] was raised.
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DecodeReason {
    /// A discriminator field holds a value outside of the known grammar.
    #[error("unknown discriminator '{0}'")]
    UnknownDiscriminator(String),
    /// A field required by the record's discriminators is absent or null.
    #[error("missing required field")]
    MissingField,
    /// The value has the wrong JSON type.
    #[error("expected {0}")]
    InvalidType(&'static str),
    /// A fixed length byte array has the wrong number of elements.
    #[error("expected {expected} elements, found {found}")]
    InvalidLength { expected: usize, found: usize },
    /// A number doesn't fit in the integer type of the field.
    #[error("value {0} is out of range")]
    OutOfRange(String),
    /// An application payload could not be deserialized.
    #[error("invalid payload: {0}")]
    Payload(String),
    /// The input is not valid JSON.
    #[error("invalid JSON: {0}")]
    Syntax(String),
}

/// An error encountered while encoding a record.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    /// An application payload could not be serialized.
    #[error("payload could not be encoded: {0}")]
    Payload(#[from] serde_json::Error),
    /// An elapsed time is too large to be represented as 64-bit nanoseconds.
    #[error("elapsed time {0:?} does not fit in 64 bits of nanoseconds")]
    DurationOverflow(Duration),
}

/// Parse JSON text, reporting syntax errors as a [`DecodeError`] at the root.
pub(crate) fn parse_json(text: &str) -> Result<Value, DecodeError> {
    serde_json::from_str(text)
        .map_err(|err| DecodeError::new(ROOT_PATH, DecodeReason::Syntax(err.to_string())))
}

/// Read access to the fields of a single record.
pub(crate) struct RecordReader<'a> {
    path: String,
    fields: &'a Map<String, Value>,
}

impl<'a> RecordReader<'a> {
    pub(crate) fn new(path: &str, value: &'a Value) -> Result<Self, DecodeError> {
        match value {
            Value::Object(fields) => Ok(Self {
                path: path.to_owned(),
                fields,
            }),
            _ => Err(DecodeError::new(path, DecodeReason::InvalidType("an object"))),
        }
    }

    pub(crate) fn field_path(&self, name: &str) -> String {
        format!("{path}.{name}", path = self.path)
    }

    /// An error stating that the field `name` holds an unknown discriminator.
    pub(crate) fn unknown(&self, name: &str, value: &str) -> DecodeError {
        DecodeError::new(
            self.field_path(name),
            DecodeReason::UnknownDiscriminator(value.to_owned()),
        )
    }

    fn invalid(&self, name: &str, reason: DecodeReason) -> DecodeError {
        DecodeError::new(self.field_path(name), reason)
    }

    /// The value of a field, treating an explicit null the same as an absent field.
    pub(crate) fn get(&self, name: &str) -> Option<&'a Value> {
        self.fields.get(name).filter(|value| !value.is_null())
    }

    pub(crate) fn require(&self, name: &str) -> Result<&'a Value, DecodeError> {
        self.get(name)
            .ok_or_else(|| self.invalid(name, DecodeReason::MissingField))
    }

    pub(crate) fn str(&self, name: &str) -> Result<&'a str, DecodeError> {
        self.require(name)?
            .as_str()
            .ok_or_else(|| self.invalid(name, DecodeReason::InvalidType("a string")))
    }

    pub(crate) fn string(&self, name: &str) -> Result<String, DecodeError> {
        self.str(name).map(str::to_owned)
    }

    pub(crate) fn optional_string(&self, name: &str) -> Result<Option<String>, DecodeError> {
        match self.get(name) {
            None => Ok(None),
            Some(_) => self.string(name).map(Some),
        }
    }

    pub(crate) fn u64(&self, name: &str) -> Result<u64, DecodeError> {
        let value = self.require(name)?;
        value.as_u64().ok_or_else(|| match value {
            Value::Number(number) => {
                self.invalid(name, DecodeReason::OutOfRange(number.to_string()))
            }
            _ => self.invalid(name, DecodeReason::InvalidType("an unsigned integer")),
        })
    }

    pub(crate) fn u16(&self, name: &str) -> Result<u16, DecodeError> {
        let value = self.u64(name)?;
        u16::try_from(value)
            .map_err(|_| self.invalid(name, DecodeReason::OutOfRange(value.to_string())))
    }

    /// A fixed length array of raw bytes.
    pub(crate) fn bytes<const N: usize>(&self, name: &str) -> Result<[u8; N], DecodeError> {
        let elements = self
            .require(name)?
            .as_array()
            .ok_or_else(|| self.invalid(name, DecodeReason::InvalidType("an array of bytes")))?;
        if elements.len() != N {
            return Err(self.invalid(
                name,
                DecodeReason::InvalidLength {
                    expected: N,
                    found: elements.len(),
                },
            ));
        }

        let mut bytes = [0_u8; N];
        for (idx, (byte, element)) in bytes.iter_mut().zip(elements).enumerate() {
            let element_path = format!("{path}[{idx}]", path = self.field_path(name));
            let Some(raw) = element.as_u64() else {
                return Err(DecodeError::new(
                    element_path,
                    DecodeReason::InvalidType("a byte"),
                ));
            };
            *byte = u8::try_from(raw).map_err(|_| {
                DecodeError::new(element_path, DecodeReason::OutOfRange(raw.to_string()))
            })?;
        }

        Ok(bytes)
    }

    /// Decode a nested record.
    pub(crate) fn decode<T: Decode>(&self, name: &str) -> Result<T, DecodeError> {
        T::decode_at(&self.field_path(name), self.require(name)?)
    }

    /// Decode a nested record which may be absent or null.
    pub(crate) fn decode_optional<T: Decode>(&self, name: &str) -> Result<Option<T>, DecodeError> {
        self.get(name)
            .map(|value| T::decode_at(&self.field_path(name), value))
            .transpose()
    }

    /// Decode every element of an array of records.
    pub(crate) fn decode_list<T: Decode>(&self, name: &str) -> Result<Vec<T>, DecodeError> {
        let elements = self
            .require(name)?
            .as_array()
            .ok_or_else(|| self.invalid(name, DecodeReason::InvalidType("an array")))?;
        let list_path = self.field_path(name);

        elements
            .iter()
            .enumerate()
            .map(|(idx, element)| T::decode_at(&format!("{list_path}[{idx}]"), element))
            .collect()
    }

    /// Deserialize an application payload.
    ///
    /// The field must be present, but it may be null if that is how the payload type serializes.
    pub(crate) fn payload<T: DeserializeOwned>(&self, name: &str) -> Result<T, DecodeError> {
        let value = self
            .fields
            .get(name)
            .ok_or_else(|| self.invalid(name, DecodeReason::MissingField))?;
        T::deserialize(value).map_err(|err| self.invalid(name, DecodeReason::Payload(err.to_string())))
    }
}

/// Builder for the fields of a single record.
#[derive(Debug, Default)]
pub(crate) struct RecordWriter {
    fields: Map<String, Value>,
}

impl RecordWriter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn field(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(name.to_owned(), value.into());
        self
    }

    /// Add a field only if there is a value, absent values are omitted rather than written as null.
    pub(crate) fn optional_field(self, name: &str, value: Option<impl Into<Value>>) -> Self {
        match value {
            Some(value) => self.field(name, value),
            None => self,
        }
    }

    pub(crate) fn finish(self) -> Value {
        Value::Object(self.fields)
    }
}

pub(crate) fn serialize_encoded<T, S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
where
    T: Encode + ?Sized,
    S: Serializer,
{
    value
        .encode()
        .map_err(serde::ser::Error::custom)?
        .serialize(serializer)
}

pub(crate) fn deserialize_decoded<'de, T, D>(deserializer: D) -> Result<T, D::Error>
where
    T: Decode,
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    T::decode(&value).map_err(serde::de::Error::custom)
}

/// Implement `Serialize` and `Deserialize` for a non-generic type through its codec.
macro_rules! serde_via_codec {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl ::serde::Serialize for $ty {
                fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
                where
                    S: ::serde::Serializer,
                {
                    $crate::codec::serialize_encoded(self, serializer)
                }
            }

            impl<'de> ::serde::Deserialize<'de> for $ty {
                fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
                where
                    D: ::serde::Deserializer<'de>,
                {
                    $crate::codec::deserialize_decoded(deserializer)
                }
            }
        )+
    };
}

pub(crate) use serde_via_codec;
