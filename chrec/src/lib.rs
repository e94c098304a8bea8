//! Recordings of the events observed by a duplex pipeline stage.
//!
//! A recording is an ordered list of [`TimedEvent`]s. It can be stored as a single JSON document
//! (see [`EventRecording`]) or as a line-oriented stream which can be appended to while
//! recording (see [`streamed`]).

pub mod address;
pub mod capture;
pub mod codec;
pub mod event;
mod identifier;
pub mod recording;
pub mod streamed;
pub mod user_event;

pub use address::{EndpointAddress, HostSpec, SocketAddress};
pub use capture::{ErrorCapture, OpaqueValueCapture, PipelineError, UserEvent};
pub use codec::{Decode, DecodeError, DecodeReason, Encode, EncodeError};
pub use event::{CloseMode, Event, Inbound, Outbound, OutboundResult};
pub use identifier::{FormatIdentifier, FormatVariant, ParseFormatVersionError};
pub use recording::{EventRecording, TimedEvent};
pub use user_event::{ChannelEvent, EndpointRequest, InboundUserEvent, OutboundUserEvent};
