//! A pipeline stage which records every event passing through it.
//!
//! The [`Recorder`] is inserted into a duplex pipeline like any other [`DuplexHandler`]. It
//! records each callback as a [`TimedEvent`] and forwards it unchanged to the next stage. When the
//! recorder is removed from the pipeline, the completed recording is delivered to the
//! [`RecordingHandle`] returned when the recorder was created.
//!
//! [`TimedEvent`]: chrec::TimedEvent

pub mod clock;
pub mod pipeline;
mod recorder;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use pipeline::{ChannelContext, Completion, DuplexHandler};
pub use recorder::{Recorder, RecordingDropped, RecordingHandle};
