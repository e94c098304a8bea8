use std::io::{self, Write};

use chrec::{Event, Inbound, Outbound, TimedEvent};
use serde_json::Value;

use crate::collect::Recording;

/// Write one line per event: index, elapsed time, discriminators and a short description.
pub(crate) fn write_summary(recording: &Recording, mut out: impl Write) -> io::Result<()> {
    let duration = recording
        .events()
        .last()
        .map(|last| last.time_since_first)
        .unwrap_or_default();
    writeln!(
        out,
        "{count} events over {duration:?}",
        count = recording.len()
    )?;

    for (idx, timed) in recording.iter().enumerate() {
        write_event(&mut out, idx, timed)?;
    }

    out.flush()
}

fn write_event(
    out: &mut impl Write,
    idx: usize,
    timed: &TimedEvent<Value, Value>,
) -> io::Result<()> {
    let event = &timed.event;
    write!(
        out,
        "{idx}: +{time:?} {ty}/{sub_type}",
        time = timed.time_since_first,
        ty = event.type_name(),
        sub_type = event.sub_type(),
    )?;

    match event {
        Event::Outbound(Outbound::Bind(address) | Outbound::Connect(address)) => {
            write!(out, " {address}")?
        }
        Event::Outbound(Outbound::Write(data)) => write!(out, " {data}")?,
        Event::Outbound(Outbound::Close(mode)) => write!(out, " {mode:?}")?,
        Event::Outbound(Outbound::TriggerUserEvent(user_event)) => {
            write!(out, " {user_event:?}")?
        }
        Event::OutboundResult(result) => match result.error() {
            Some(error) => write!(out, " failed: {error}")?,
            None => write!(out, " ok")?,
        },
        Event::Inbound(Inbound::Read(data)) => write!(out, " {data}")?,
        Event::Inbound(Inbound::UserEventTriggered(user_event)) => {
            write!(out, " {user_event:?}")?
        }
        Event::Inbound(Inbound::ErrorCaught(error)) => write!(out, " {error}")?,
        _ => {}
    }

    writeln!(out)
}
