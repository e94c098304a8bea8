use chrec::{
    CloseMode, Decode, DecodeReason, Encode, EndpointAddress, ErrorCapture, Event, HostSpec,
    Inbound, InboundUserEvent, OpaqueValueCapture, Outbound, OutboundResult, OutboundUserEvent,
    SocketAddress,
};
use serde_json::json;

type TestEvent = Event<Vec<u8>, String>;

fn error() -> ErrorCapture {
    ErrorCapture::new("std::io::error::Error", "connection refused")
}

fn all_events() -> Vec<TestEvent> {
    let address = SocketAddress::V4 {
        address: "10.1.2.3".into(),
        port: 9000,
    };

    vec![
        Outbound::Register.into(),
        Outbound::Bind(address.clone()).into(),
        Outbound::Connect(address).into(),
        Outbound::Write("hello".to_owned()).into(),
        Outbound::Flush.into(),
        Outbound::Read.into(),
        Outbound::Close(CloseMode::Input).into(),
        Outbound::Close(CloseMode::All).into(),
        Outbound::TriggerUserEvent(OutboundUserEvent::BindToEndpoint(
            EndpointAddress::HostPort {
                host: HostSpec::Ipv6([0; 16]),
                port: 0,
            },
        ))
        .into(),
        Outbound::TriggerUserEvent(OutboundUserEvent::Other(OpaqueValueCapture::new(
            "Ping", "Ping",
        )))
        .into(),
        OutboundResult::Register(None).into(),
        OutboundResult::Bind(Some(error())).into(),
        OutboundResult::Connect(Some(error())).into(),
        OutboundResult::Write(None).into(),
        OutboundResult::Close(None).into(),
        OutboundResult::TriggerUserEvent(Some(error())).into(),
        Inbound::Registered.into(),
        Inbound::Unregistered.into(),
        Inbound::Active.into(),
        Inbound::Inactive.into(),
        Inbound::Read(vec![0, 1, 255]).into(),
        Inbound::ReadComplete.into(),
        Inbound::WritabilityChanged.into(),
        Inbound::UserEventTriggered(InboundUserEvent::PeerClosedWrite).into(),
        Inbound::UserEventTriggered(InboundUserEvent::Other(OpaqueValueCapture::new(
            "Idle", "Idle { secs: 30 }",
        )))
        .into(),
        Inbound::ErrorCaught(error()).into(),
    ]
}

#[test]
fn every_variant_roundtrips() {
    for event in all_events() {
        let value = event.encode().unwrap();
        let decoded = TestEvent::decode(&value).unwrap();
        assert_eq!(decoded, event, "{value}");
    }
}

#[test]
fn discriminators_match_the_wire() {
    for event in all_events() {
        let value = event.encode().unwrap();
        assert_eq!(value["type"], event.type_name());
        assert_eq!(value["subType"], event.sub_type());
    }
}

#[test]
fn write_payload_uses_serde() {
    let event: TestEvent = Outbound::Write("ping".to_owned()).into();

    assert_eq!(
        event.encode().unwrap(),
        json!({ "type": "outbound", "subType": "write", "payload": "ping" })
    );
}

#[test]
fn failed_result_carries_the_error() {
    let event: TestEvent = OutboundResult::Connect(Some(error())).into();

    assert_eq!(
        event.encode().unwrap(),
        json!({
            "type": "result",
            "subType": "connectResult",
            "payload": {
                "kind": "std::io::error::Error",
                "description": "connection refused",
            },
        })
    );
}

#[test]
fn unit_payload_may_be_null() {
    let value = json!({ "type": "inbound", "subType": "channelRead", "payload": null });
    let event = Event::<(), ()>::decode(&value).unwrap();

    assert_eq!(event, Event::Inbound(Inbound::Read(())));
}

#[test]
fn missing_payload_is_rejected() {
    let value = json!({ "type": "inbound", "subType": "channelRead" });
    let err = TestEvent::decode(&value).unwrap_err();

    assert_eq!(err.path(), "$.payload");
    assert_eq!(err.reason(), &DecodeReason::MissingField);
}

#[test]
fn mismatched_payload_is_rejected() {
    let value = json!({ "type": "inbound", "subType": "channelRead", "payload": "not bytes" });
    let err = TestEvent::decode(&value).unwrap_err();

    assert_eq!(err.path(), "$.payload");
    assert!(matches!(err.reason(), DecodeReason::Payload(_)));
}

#[test]
fn sub_type_from_another_category_is_rejected() {
    let value = json!({ "type": "outbound", "subType": "channelActive" });
    let err = TestEvent::decode(&value).unwrap_err();

    assert_eq!(err.path(), "$.subType");
    assert_eq!(
        err.reason(),
        &DecodeReason::UnknownDiscriminator("channelActive".into())
    );
}

#[test]
fn unknown_close_mode_is_rejected() {
    let value = json!({ "type": "outbound", "subType": "close", "payload": "sideways" });
    let err = TestEvent::decode(&value).unwrap_err();

    assert_eq!(err.path(), "$.payload");
    assert!(matches!(
        err.reason(),
        DecodeReason::UnknownDiscriminator(_)
    ));
}

#[test]
fn nested_decode_errors_carry_the_full_path() {
    let value = json!({
        "type": "outbound",
        "subType": "triggerUserOutboundEvent",
        "payload": {
            "type": "connectToEndpoint",
            "subType": "hostPort",
            "hostType": "ipv4",
            "payload1": [1, 2, 3, 4],
        },
    });
    let err = TestEvent::decode(&value).unwrap_err();

    assert_eq!(err.path(), "$.payload.payload2");
    assert_eq!(err.reason(), &DecodeReason::MissingField);
}

#[test]
fn non_object_is_rejected() {
    let err = TestEvent::decode(&json!([1, 2, 3])).unwrap_err();

    assert_eq!(err.path(), "$");
    assert_eq!(err.reason(), &DecodeReason::InvalidType("an object"));
}

// User events

#[test]
fn other_user_event_wire_format() {
    let capture = OpaqueValueCapture::new("app::Idle", "Idle { secs: 30 }");
    let expected = json!({
        "type": "other",
        "payload1": { "kind": "app::Idle", "description": "Idle { secs: 30 }" },
    });

    let inbound = InboundUserEvent::Other(capture.clone());
    assert_eq!(inbound.encode().unwrap(), expected);
    assert_eq!(InboundUserEvent::decode(&expected).unwrap(), inbound);

    let outbound = OutboundUserEvent::Other(capture);
    assert_eq!(outbound.encode().unwrap(), expected);
    assert_eq!(OutboundUserEvent::decode(&expected).unwrap(), outbound);
}

#[test]
fn unknown_inbound_user_event_is_rejected() {
    let err = InboundUserEvent::decode(&json!({ "type": "peerVanished" })).unwrap_err();

    assert_eq!(err.path(), "$.type");
    assert_eq!(
        err.reason(),
        &DecodeReason::UnknownDiscriminator("peerVanished".into())
    );
}

#[test]
fn unknown_outbound_user_event_is_rejected() {
    let err = OutboundUserEvent::decode(&json!({ "type": "teleportToEndpoint" })).unwrap_err();

    assert_eq!(err.path(), "$.type");
    assert_eq!(
        err.reason(),
        &DecodeReason::UnknownDiscriminator("teleportToEndpoint".into())
    );
}

#[test]
fn unknown_nested_endpoint_is_rejected() {
    let value = json!({
        "type": "connectToEndpoint",
        "subType": "carrier",
        "payload1": "pigeon",
    });
    let err = OutboundUserEvent::decode(&value).unwrap_err();

    assert_eq!(err.path(), "$.subType");
    assert_eq!(
        err.reason(),
        &DecodeReason::UnknownDiscriminator("carrier".into())
    );
}

#[test]
fn unknown_nested_host_type_is_rejected() {
    let value = json!({
        "type": "bindToEndpoint",
        "subType": "hostPort",
        "hostType": "ipv5",
        "payload1": [1, 2, 3, 4, 5],
        "payload2": 80,
    });
    let err = OutboundUserEvent::decode(&value).unwrap_err();

    assert_eq!(err.path(), "$.hostType");
    assert_eq!(
        err.reason(),
        &DecodeReason::UnknownDiscriminator("ipv5".into())
    );
}

#[test]
fn other_user_event_requires_capture() {
    let inbound = InboundUserEvent::decode(&json!({ "type": "other" })).unwrap_err();
    let outbound = OutboundUserEvent::decode(&json!({ "type": "other" })).unwrap_err();

    for err in [inbound, outbound] {
        assert_eq!(err.path(), "$.payload1");
        assert_eq!(err.reason(), &DecodeReason::MissingField);
    }
}

#[test]
fn unknown_user_event_inside_event_carries_the_path() {
    let value = json!({
        "type": "inbound",
        "subType": "userInboundEventTriggered",
        "payload": { "type": "peerVanished" },
    });
    let err = TestEvent::decode(&value).unwrap_err();

    assert_eq!(err.path(), "$.payload.type");
}
