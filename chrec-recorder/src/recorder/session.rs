use std::{mem, time::Instant};

use chrec::{Event, EventRecording, TimedEvent};
use tokio::sync::oneshot;
use tracing::{debug, trace, warn};

use crate::clock::Clock;

enum State<In, Out> {
    Pending,
    Attached {
        start: Instant,
        recording: EventRecording<In, Out>,
    },
    Completed,
}

impl<In, Out> State<In, Out> {
    fn name(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Attached { .. } => "attached",
            Self::Completed => "completed",
        }
    }
}

/// The recording in progress, shared between a recorder and its completion observers.
pub(super) struct Session<In, Out, K> {
    clock: K,
    state: State<In, Out>,
    sender: Option<oneshot::Sender<EventRecording<In, Out>>>,
}

impl<In, Out, K> Session<In, Out, K>
where
    K: Clock,
{
    pub(super) fn new(clock: K, sender: oneshot::Sender<EventRecording<In, Out>>) -> Self {
        Self {
            clock,
            state: State::Pending,
            sender: Some(sender),
        }
    }

    pub(super) fn is_attached(&self) -> bool {
        matches!(self.state, State::Attached { .. })
    }

    pub(super) fn attach(&mut self) {
        match self.state {
            State::Pending => {
                self.state = State::Attached {
                    start: self.clock.now(),
                    recording: EventRecording::new(),
                };
                debug!("recorder attached, recording started");
            }
            ref state => debug!(state = state.name(), "recorder attached again, ignoring"),
        }
    }

    pub(super) fn record(&mut self, event: Event<In, Out>) {
        let State::Attached { start, recording } = &mut self.state else {
            debug!(
                state = self.state.name(),
                category = event.type_name(),
                sub_type = event.sub_type(),
                "recorder not attached, event not recorded"
            );
            return;
        };

        let time_since_first = self.clock.now().saturating_duration_since(*start);
        trace!(
            category = event.type_name(),
            sub_type = event.sub_type(),
            ?time_since_first,
            "recorded event"
        );
        recording.push(TimedEvent::new(time_since_first, event));
    }

    /// Complete the recording and deliver it.
    ///
    /// Detaching a recorder which was never attached delivers an empty recording.
    ///
    /// # Panics
    ///
    /// Panics if the recording has already been delivered.
    pub(super) fn detach(&mut self) {
        let Some(sender) = self.sender.take() else {
            panic!("recorder detached twice, the recording has already been delivered");
        };

        let recording = match mem::replace(&mut self.state, State::Completed) {
            State::Attached { recording, .. } => recording,
            _ => EventRecording::new(),
        };
        debug!(events = recording.len(), "recorder detached, delivering recording");

        if sender.send(recording).is_err() {
            warn!("recording handle was dropped, discarding recording");
        }
    }
}
