//! The pipeline event algebra.
//!
//! An [`Event`] is one of three categories:
//!
//! - [`Outbound`]: an operation issued towards the transport.
//! - [`OutboundResult`]: the completion of an outbound operation which can fail.
//! - [`Inbound`]: a notification travelling towards the application.
//!
//! # Wire representation
//!
//! An event is encoded as `{"type": <category>, "subType": <variant>, "payload": <data>}`. The
//! category is one of `outbound`, `result` or `inbound`. The payload is only present for variants
//! which carry data. Decoding accepts exactly the combinations produced by encoding, anything else
//! is a [`DecodeError`].
//!
//! The application payloads of [`Outbound::Write`] and [`Inbound::Read`] are generic. They are
//! encoded with their own `serde` implementations.

use serde::{Deserialize, Deserializer, Serialize, Serializer, de::DeserializeOwned};
use serde_json::Value;

use crate::{
    address::SocketAddress,
    capture::ErrorCapture,
    codec::{
        Decode, DecodeError, DecodeReason, Encode, EncodeError, RecordReader, RecordWriter,
        deserialize_decoded, serde_via_codec, serialize_encoded,
    },
    user_event::{InboundUserEvent, OutboundUserEvent},
};

const TYPE: &str = "type";
const SUB_TYPE: &str = "subType";
const PAYLOAD: &str = "payload";

const OUTBOUND: &str = "outbound";
const RESULT: &str = "result";
const INBOUND: &str = "inbound";

/// A single observable pipeline event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event<In, Out> {
    Outbound(Outbound<Out>),
    OutboundResult(OutboundResult),
    Inbound(Inbound<In>),
}

impl<In, Out> Event<In, Out> {
    /// The category discriminator of the event.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Outbound(_) => OUTBOUND,
            Self::OutboundResult(_) => RESULT,
            Self::Inbound(_) => INBOUND,
        }
    }

    /// The variant discriminator of the event within its category.
    pub fn sub_type(&self) -> &'static str {
        match self {
            Self::Outbound(outbound) => outbound.sub_type(),
            Self::OutboundResult(result) => result.sub_type(),
            Self::Inbound(inbound) => inbound.sub_type(),
        }
    }
}

impl<In, Out> From<Outbound<Out>> for Event<In, Out> {
    fn from(value: Outbound<Out>) -> Self {
        Self::Outbound(value)
    }
}

impl<In, Out> From<OutboundResult> for Event<In, Out> {
    fn from(value: OutboundResult) -> Self {
        Self::OutboundResult(value)
    }
}

impl<In, Out> From<Inbound<In>> for Event<In, Out> {
    fn from(value: Inbound<In>) -> Self {
        Self::Inbound(value)
    }
}

/// How much of a channel to close.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CloseMode {
    /// Close the reading half.
    Input,
    /// Close the writing half.
    Output,
    /// Close the channel completely.
    All,
}

impl CloseMode {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Output => "output",
            Self::All => "all",
        }
    }
}

impl Encode for CloseMode {
    fn encode(&self) -> Result<Value, EncodeError> {
        Ok(Value::from(self.as_str()))
    }
}

impl Decode for CloseMode {
    fn decode_at(path: &str, value: &Value) -> Result<Self, DecodeError> {
        match value.as_str() {
            Some("input") => Ok(Self::Input),
            Some("output") => Ok(Self::Output),
            Some("all") => Ok(Self::All),
            Some(other) => Err(DecodeError::new(
                path,
                DecodeReason::UnknownDiscriminator(other.to_owned()),
            )),
            None => Err(DecodeError::new(path, DecodeReason::InvalidType("a string"))),
        }
    }
}

/// An operation issued towards the transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outbound<Out> {
    Register,
    Bind(SocketAddress),
    Connect(SocketAddress),
    Write(Out),
    Flush,
    Read,
    Close(CloseMode),
    TriggerUserEvent(OutboundUserEvent),
}

impl<Out> Outbound<Out> {
    pub fn sub_type(&self) -> &'static str {
        match self {
            Self::Register => "register",
            Self::Bind(_) => "bind",
            Self::Connect(_) => "connect",
            Self::Write(_) => "write",
            Self::Flush => "flush",
            Self::Read => "read",
            Self::Close(_) => "close",
            Self::TriggerUserEvent(_) => "triggerUserOutboundEvent",
        }
    }
}

impl<Out: Serialize> Outbound<Out> {
    fn encode_payload(&self) -> Result<Option<Value>, EncodeError> {
        Ok(match self {
            Self::Register | Self::Flush | Self::Read => None,
            Self::Bind(address) | Self::Connect(address) => Some(address.encode()?),
            Self::Write(data) => Some(serde_json::to_value(data)?),
            Self::Close(mode) => Some(mode.encode()?),
            Self::TriggerUserEvent(event) => Some(event.encode()?),
        })
    }
}

impl<Out: DeserializeOwned> Outbound<Out> {
    fn decode_record(record: &RecordReader<'_>, sub_type: &str) -> Result<Self, DecodeError> {
        Ok(match sub_type {
            "register" => Self::Register,
            "bind" => Self::Bind(record.decode(PAYLOAD)?),
            "connect" => Self::Connect(record.decode(PAYLOAD)?),
            "write" => Self::Write(record.payload(PAYLOAD)?),
            "flush" => Self::Flush,
            "read" => Self::Read,
            "close" => Self::Close(record.decode(PAYLOAD)?),
            "triggerUserOutboundEvent" => Self::TriggerUserEvent(record.decode(PAYLOAD)?),
            other => return Err(record.unknown(SUB_TYPE, other)),
        })
    }
}

/// The completion of an outbound operation.
///
/// Each variant carries the captured error if the operation failed, or `None` if it succeeded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OutboundResult {
    Register(Option<ErrorCapture>),
    Bind(Option<ErrorCapture>),
    Connect(Option<ErrorCapture>),
    Write(Option<ErrorCapture>),
    Close(Option<ErrorCapture>),
    TriggerUserEvent(Option<ErrorCapture>),
}

impl OutboundResult {
    pub fn sub_type(&self) -> &'static str {
        match self {
            Self::Register(_) => "registerResult",
            Self::Bind(_) => "bindResult",
            Self::Connect(_) => "connectResult",
            Self::Write(_) => "writeResult",
            Self::Close(_) => "closeResult",
            Self::TriggerUserEvent(_) => "triggerUserOutboundEventResult",
        }
    }

    /// The error the operation failed with, if any.
    pub fn error(&self) -> Option<&ErrorCapture> {
        match self {
            Self::Register(error)
            | Self::Bind(error)
            | Self::Connect(error)
            | Self::Write(error)
            | Self::Close(error)
            | Self::TriggerUserEvent(error) => error.as_ref(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error().is_none()
    }

    fn decode_record(record: &RecordReader<'_>, sub_type: &str) -> Result<Self, DecodeError> {
        let variant: fn(Option<ErrorCapture>) -> Self = match sub_type {
            "registerResult" => Self::Register,
            "bindResult" => Self::Bind,
            "connectResult" => Self::Connect,
            "writeResult" => Self::Write,
            "closeResult" => Self::Close,
            "triggerUserOutboundEventResult" => Self::TriggerUserEvent,
            other => return Err(record.unknown(SUB_TYPE, other)),
        };

        Ok(variant(record.decode_optional(PAYLOAD)?))
    }
}

/// A notification travelling towards the application.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Inbound<In> {
    Registered,
    Unregistered,
    Active,
    Inactive,
    Read(In),
    ReadComplete,
    WritabilityChanged,
    UserEventTriggered(InboundUserEvent),
    ErrorCaught(ErrorCapture),
}

impl<In> Inbound<In> {
    pub fn sub_type(&self) -> &'static str {
        match self {
            Self::Registered => "channelRegistered",
            Self::Unregistered => "channelUnregistered",
            Self::Active => "channelActive",
            Self::Inactive => "channelInactive",
            Self::Read(_) => "channelRead",
            Self::ReadComplete => "channelReadComplete",
            Self::WritabilityChanged => "channelWritabilityChanged",
            Self::UserEventTriggered(_) => "userInboundEventTriggered",
            Self::ErrorCaught(_) => "errorCaught",
        }
    }
}

impl<In: Serialize> Inbound<In> {
    fn encode_payload(&self) -> Result<Option<Value>, EncodeError> {
        Ok(match self {
            Self::Registered
            | Self::Unregistered
            | Self::Active
            | Self::Inactive
            | Self::ReadComplete
            | Self::WritabilityChanged => None,
            Self::Read(data) => Some(serde_json::to_value(data)?),
            Self::UserEventTriggered(event) => Some(event.encode()?),
            Self::ErrorCaught(error) => Some(error.encode()?),
        })
    }
}

impl<In: DeserializeOwned> Inbound<In> {
    fn decode_record(record: &RecordReader<'_>, sub_type: &str) -> Result<Self, DecodeError> {
        Ok(match sub_type {
            "channelRegistered" => Self::Registered,
            "channelUnregistered" => Self::Unregistered,
            "channelActive" => Self::Active,
            "channelInactive" => Self::Inactive,
            "channelRead" => Self::Read(record.payload(PAYLOAD)?),
            "channelReadComplete" => Self::ReadComplete,
            "channelWritabilityChanged" => Self::WritabilityChanged,
            "userInboundEventTriggered" => Self::UserEventTriggered(record.decode(PAYLOAD)?),
            "errorCaught" => Self::ErrorCaught(record.decode(PAYLOAD)?),
            other => return Err(record.unknown(SUB_TYPE, other)),
        })
    }
}

impl<In, Out> Encode for Event<In, Out>
where
    In: Serialize,
    Out: Serialize,
{
    fn encode(&self) -> Result<Value, EncodeError> {
        let payload = match self {
            Self::Outbound(outbound) => outbound.encode_payload()?,
            Self::OutboundResult(result) => result.error().map(Encode::encode).transpose()?,
            Self::Inbound(inbound) => inbound.encode_payload()?,
        };

        Ok(RecordWriter::new()
            .field(TYPE, self.type_name())
            .field(SUB_TYPE, self.sub_type())
            .optional_field(PAYLOAD, payload)
            .finish())
    }
}

impl<In, Out> Decode for Event<In, Out>
where
    In: DeserializeOwned,
    Out: DeserializeOwned,
{
    fn decode_at(path: &str, value: &Value) -> Result<Self, DecodeError> {
        let record = RecordReader::new(path, value)?;
        let category = record.str(TYPE)?;
        if !matches!(category, OUTBOUND | RESULT | INBOUND) {
            return Err(record.unknown(TYPE, category));
        }

        let sub_type = record.str(SUB_TYPE)?;
        match category {
            OUTBOUND => Outbound::decode_record(&record, sub_type).map(Self::Outbound),
            RESULT => OutboundResult::decode_record(&record, sub_type).map(Self::OutboundResult),
            _ => Inbound::decode_record(&record, sub_type).map(Self::Inbound),
        }
    }
}

impl<In: Serialize, Out: Serialize> Serialize for Event<In, Out> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_encoded(self, serializer)
    }
}

impl<'de, In: DeserializeOwned, Out: DeserializeOwned> Deserialize<'de> for Event<In, Out> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserialize_decoded(deserializer)
    }
}

serde_via_codec!(CloseMode);

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    type TestEvent = Event<String, String>;

    #[test]
    fn success_result_omits_payload() {
        let event: TestEvent = OutboundResult::Connect(None).into();

        assert_eq!(
            event.encode().unwrap(),
            json!({ "type": "result", "subType": "connectResult" })
        );
    }

    #[test]
    fn null_result_payload_is_success() {
        let value = json!({ "type": "result", "subType": "writeResult", "payload": null });

        assert_eq!(
            TestEvent::decode(&value).unwrap(),
            Event::OutboundResult(OutboundResult::Write(None))
        );
    }

    #[test]
    fn close_mode_encodes_as_string() {
        let event: TestEvent = Outbound::Close(CloseMode::Output).into();

        assert_eq!(
            event.encode().unwrap(),
            json!({ "type": "outbound", "subType": "close", "payload": "output" })
        );
    }

    #[test]
    fn unknown_category_is_reported_before_sub_type() {
        let value = json!({ "type": "sideways" });
        let err = TestEvent::decode(&value).unwrap_err();

        assert_eq!(err.path(), "$.type");
        assert_eq!(
            err.reason(),
            &DecodeReason::UnknownDiscriminator("sideways".into())
        );
    }
}
