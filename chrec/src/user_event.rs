//! User events travelling through a pipeline.
//!
//! Only a few user events are modelled. Inbound, the half-closure notifications are recognised.
//! Outbound, the requests to connect or bind to an endpoint are recognised. Everything else is
//! kept as an [`OpaqueValueCapture`] under the `other` discriminator.

use serde_json::Value;

use crate::{
    address::{EndpointAddress, EndpointKeys, PAYLOAD_1},
    capture::{OpaqueValueCapture, UserEvent},
    codec::{Decode, DecodeError, Encode, EncodeError, RecordReader, RecordWriter, serde_via_codec},
};

const TYPE: &str = "type";
const OTHER: &str = "other";

/// Half-closure notifications sent inbound by a channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChannelEvent {
    /// The peer closed its write side, no more data will be read.
    InputClosed,
    /// The peer closed its read side, no more data can be written.
    OutputClosed,
}

/// Requests sent outbound to establish a channel on an endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum EndpointRequest {
    Connect(EndpointAddress),
    Bind(EndpointAddress),
}

/// A user event which passed through the pipeline towards the application.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum InboundUserEvent {
    PeerClosedRead,
    PeerClosedWrite,
    Other(OpaqueValueCapture),
}

impl InboundUserEvent {
    /// Capture an inbound user event.
    ///
    /// A [`ChannelEvent`] is recognised, any other event is captured opaquely.
    pub fn capture(event: &dyn UserEvent) -> Self {
        match event.as_any().downcast_ref::<ChannelEvent>() {
            Some(ChannelEvent::InputClosed) => Self::PeerClosedRead,
            Some(ChannelEvent::OutputClosed) => Self::PeerClosedWrite,
            None => Self::Other(OpaqueValueCapture::from_user_event(event)),
        }
    }
}

impl Encode for InboundUserEvent {
    fn encode(&self) -> Result<Value, EncodeError> {
        let record = RecordWriter::new();
        let record = match self {
            Self::PeerClosedRead => record.field(TYPE, "peerClosedRead"),
            Self::PeerClosedWrite => record.field(TYPE, "peerClosedWrite"),
            Self::Other(capture) => record.field(TYPE, OTHER).field(PAYLOAD_1, capture.encode()?),
        };

        Ok(record.finish())
    }
}

impl Decode for InboundUserEvent {
    fn decode_at(path: &str, value: &Value) -> Result<Self, DecodeError> {
        let record = RecordReader::new(path, value)?;
        match record.str(TYPE)? {
            "peerClosedRead" => Ok(Self::PeerClosedRead),
            "peerClosedWrite" => Ok(Self::PeerClosedWrite),
            OTHER => Ok(Self::Other(record.decode(PAYLOAD_1)?)),
            other => Err(record.unknown(TYPE, other)),
        }
    }
}

/// A user event which passed through the pipeline towards the transport.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum OutboundUserEvent {
    ConnectToEndpoint(EndpointAddress),
    BindToEndpoint(EndpointAddress),
    Other(OpaqueValueCapture),
}

impl OutboundUserEvent {
    /// Capture an outbound user event.
    ///
    /// An [`EndpointRequest`] is recognised, any other event is captured opaquely.
    pub fn capture(event: &dyn UserEvent) -> Self {
        match event.as_any().downcast_ref::<EndpointRequest>() {
            Some(EndpointRequest::Connect(endpoint)) => Self::ConnectToEndpoint(endpoint.clone()),
            Some(EndpointRequest::Bind(endpoint)) => Self::BindToEndpoint(endpoint.clone()),
            None => Self::Other(OpaqueValueCapture::from_user_event(event)),
        }
    }
}

impl Encode for OutboundUserEvent {
    fn encode(&self) -> Result<Value, EncodeError> {
        let record = RecordWriter::new();
        let record = match self {
            Self::ConnectToEndpoint(endpoint) => endpoint.write_fields(
                record.field(TYPE, "connectToEndpoint"),
                EndpointKeys::NESTED,
            ),
            Self::BindToEndpoint(endpoint) => endpoint.write_fields(
                record.field(TYPE, "bindToEndpoint"),
                EndpointKeys::NESTED,
            ),
            Self::Other(capture) => record.field(TYPE, OTHER).field(PAYLOAD_1, capture.encode()?),
        };

        Ok(record.finish())
    }
}

impl Decode for OutboundUserEvent {
    fn decode_at(path: &str, value: &Value) -> Result<Self, DecodeError> {
        let record = RecordReader::new(path, value)?;
        match record.str(TYPE)? {
            "connectToEndpoint" => Ok(Self::ConnectToEndpoint(EndpointAddress::read_fields(
                &record,
                EndpointKeys::NESTED,
            )?)),
            "bindToEndpoint" => Ok(Self::BindToEndpoint(EndpointAddress::read_fields(
                &record,
                EndpointKeys::NESTED,
            )?)),
            OTHER => Ok(Self::Other(record.decode(PAYLOAD_1)?)),
            other => Err(record.unknown(TYPE, other)),
        }
    }
}

serde_via_codec!(InboundUserEvent, OutboundUserEvent);

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::address::HostSpec;

    #[test]
    fn recognises_channel_events() {
        assert_eq!(
            InboundUserEvent::capture(&ChannelEvent::InputClosed),
            InboundUserEvent::PeerClosedRead
        );
        assert_eq!(
            InboundUserEvent::capture(&ChannelEvent::OutputClosed),
            InboundUserEvent::PeerClosedWrite
        );
    }

    #[test]
    fn unknown_inbound_event_is_opaque() {
        let captured = InboundUserEvent::capture(&"idle timeout");

        assert_eq!(
            captured,
            InboundUserEvent::Other(OpaqueValueCapture::new("&str", "\"idle timeout\""))
        );
    }

    #[test]
    fn recognises_endpoint_requests() {
        let endpoint = EndpointAddress::Locator {
            url: "https://example.com".into(),
        };

        assert_eq!(
            OutboundUserEvent::capture(&EndpointRequest::Connect(endpoint.clone())),
            OutboundUserEvent::ConnectToEndpoint(endpoint.clone())
        );
        assert_eq!(
            OutboundUserEvent::capture(&EndpointRequest::Bind(endpoint.clone())),
            OutboundUserEvent::BindToEndpoint(endpoint)
        );
    }

    #[test]
    fn nested_endpoint_shares_the_record() {
        let event = OutboundUserEvent::ConnectToEndpoint(EndpointAddress::HostPort {
            host: HostSpec::Name {
                name: "example.com".into(),
                interface_name: None,
            },
            port: 443,
        });

        assert_eq!(
            event.encode().unwrap(),
            json!({
                "type": "connectToEndpoint",
                "subType": "hostPort",
                "hostType": "name",
                "payload1": "example.com",
                "payload2": 443,
            })
        );
    }
}
