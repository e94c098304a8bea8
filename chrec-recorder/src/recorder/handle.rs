use std::{
    pin::Pin,
    task::{Context, Poll},
};

use chrec::EventRecording;
use tokio::sync::oneshot::{self, error::TryRecvError};

/// The recorder was dropped without being removed from its pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("recorder was dropped before the recording was delivered")]
pub struct RecordingDropped;

/// Receives the recording once its recorder is removed from the pipeline.
///
/// The handle is a future resolving to the recording. Outside of an async context, use
/// [`RecordingHandle::try_take`] or [`RecordingHandle::blocking_wait`].
#[derive(Debug)]
pub struct RecordingHandle<In, Out> {
    receiver: oneshot::Receiver<EventRecording<In, Out>>,
}

impl<In, Out> RecordingHandle<In, Out> {
    pub(super) fn new(receiver: oneshot::Receiver<EventRecording<In, Out>>) -> Self {
        Self { receiver }
    }

    /// Take the recording if it has been delivered.
    ///
    /// Returns `Ok(None)` while the recorder is still attached. The recording can only be taken
    /// once, afterwards this returns [`RecordingDropped`].
    pub fn try_take(&mut self) -> Result<Option<EventRecording<In, Out>>, RecordingDropped> {
        match self.receiver.try_recv() {
            Ok(recording) => Ok(Some(recording)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Closed) => Err(RecordingDropped),
        }
    }

    /// Block the current thread until the recording is delivered.
    ///
    /// # Panics
    ///
    /// Panics if called from within an async execution context.
    pub fn blocking_wait(self) -> Result<EventRecording<In, Out>, RecordingDropped> {
        self.receiver.blocking_recv().map_err(|_| RecordingDropped)
    }
}

impl<In, Out> Future for RecordingHandle<In, Out> {
    type Output = Result<EventRecording<In, Out>, RecordingDropped>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map_err(|_| RecordingDropped)
    }
}
