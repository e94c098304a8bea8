use std::{cell::RefCell, fmt, io, rc::Rc};

use chrec::{
    CloseMode, ErrorCapture, Event, Inbound, InboundUserEvent, Outbound, OutboundResult,
    OutboundUserEvent, PipelineError, SocketAddress, UserEvent,
};
use tokio::sync::oneshot;

use crate::{
    clock::{Clock, MonotonicClock},
    pipeline::{ChannelContext, Completion, DuplexHandler},
};

mod handle;
mod session;

pub use handle::{RecordingDropped, RecordingHandle};
use session::Session;

/// A pipeline stage which records every event passing through it.
///
/// Each callback is recorded together with the time elapsed since the recorder was added to the
/// pipeline, then forwarded unchanged. For operations which complete asynchronously, the result
/// is recorded when the completion fires, before the original completion runs. Callbacks received
/// before the recorder is added or after it is removed are forwarded without being recorded.
///
/// Removing the recorder from the pipeline delivers the recording to the [`RecordingHandle`].
/// A recorder is removed at most once, removing it a second time panics.
///
/// # Examples
///
/// ```
/// use chrec_recorder::Recorder;
///
/// let (recorder, mut handle) = Recorder::<Vec<u8>, Vec<u8>>::new();
/// assert!(!recorder.is_attached());
/// assert!(matches!(handle.try_take(), Ok(None)));
/// ```
pub struct Recorder<In, Out, K = MonotonicClock> {
    session: Rc<RefCell<Session<In, Out, K>>>,
}

impl<In, Out> Recorder<In, Out> {
    /// Create a recorder timed by the system's monotonic clock.
    pub fn new() -> (Self, RecordingHandle<In, Out>) {
        Self::with_clock(MonotonicClock)
    }
}

impl<In, Out, K> Recorder<In, Out, K>
where
    K: Clock,
{
    pub fn with_clock(clock: K) -> (Self, RecordingHandle<In, Out>) {
        let (sender, receiver) = oneshot::channel();
        let recorder = Self {
            session: Rc::new(RefCell::new(Session::new(clock, sender))),
        };

        (recorder, RecordingHandle::new(receiver))
    }

    /// Whether the recorder has been added to a pipeline and not yet removed.
    pub fn is_attached(&self) -> bool {
        self.session.borrow().is_attached()
    }

    fn record(&self, event: impl Into<Event<In, Out>>) {
        self.session.borrow_mut().record(event.into());
    }
}

impl<In, Out, K> Recorder<In, Out, K>
where
    In: 'static,
    Out: 'static,
    K: Clock + 'static,
{
    /// Wrap a completion so that the operation's result is recorded when it fires.
    fn observe_result(
        &self,
        completion: Completion,
        to_result: fn(Option<ErrorCapture>) -> OutboundResult,
    ) -> Completion {
        // Completions may outlive the recorder, they must not keep the recording alive.
        let session = Rc::downgrade(&self.session);
        completion.observe(move |result: &io::Result<()>| {
            let Some(session) = session.upgrade() else {
                return;
            };
            let error = result.as_ref().err().map(ErrorCapture::from);
            session.borrow_mut().record(to_result(error).into());
        })
    }
}

impl<In, Out, K> fmt::Debug for Recorder<In, Out, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Recorder").finish_non_exhaustive()
    }
}

impl<In, Out, K> DuplexHandler<In, Out> for Recorder<In, Out, K>
where
    In: Clone + 'static,
    Out: Clone + 'static,
    K: Clock + 'static,
{
    fn handler_added<C>(&mut self, _ctx: &mut C)
    where
        C: ChannelContext<In, Out>,
    {
        self.session.borrow_mut().attach();
    }

    fn handler_removed<C>(&mut self, _ctx: &mut C)
    where
        C: ChannelContext<In, Out>,
    {
        self.session.borrow_mut().detach();
    }

    fn channel_registered<C>(&mut self, ctx: &mut C)
    where
        C: ChannelContext<In, Out>,
    {
        self.record(Inbound::Registered);
        ctx.fire_channel_registered();
    }

    fn channel_unregistered<C>(&mut self, ctx: &mut C)
    where
        C: ChannelContext<In, Out>,
    {
        self.record(Inbound::Unregistered);
        ctx.fire_channel_unregistered();
    }

    fn channel_active<C>(&mut self, ctx: &mut C)
    where
        C: ChannelContext<In, Out>,
    {
        self.record(Inbound::Active);
        ctx.fire_channel_active();
    }

    fn channel_inactive<C>(&mut self, ctx: &mut C)
    where
        C: ChannelContext<In, Out>,
    {
        self.record(Inbound::Inactive);
        ctx.fire_channel_inactive();
    }

    fn channel_read<C>(&mut self, ctx: &mut C, data: In)
    where
        C: ChannelContext<In, Out>,
    {
        self.record(Inbound::Read(data.clone()));
        ctx.fire_channel_read(data);
    }

    fn channel_read_complete<C>(&mut self, ctx: &mut C)
    where
        C: ChannelContext<In, Out>,
    {
        self.record(Inbound::ReadComplete);
        ctx.fire_channel_read_complete();
    }

    fn channel_writability_changed<C>(&mut self, ctx: &mut C)
    where
        C: ChannelContext<In, Out>,
    {
        self.record(Inbound::WritabilityChanged);
        ctx.fire_channel_writability_changed();
    }

    fn user_inbound_event_triggered<C>(&mut self, ctx: &mut C, event: Box<dyn UserEvent>)
    where
        C: ChannelContext<In, Out>,
    {
        self.record(Inbound::UserEventTriggered(InboundUserEvent::capture(
            &*event,
        )));
        ctx.fire_user_inbound_event_triggered(event);
    }

    fn error_caught<C>(&mut self, ctx: &mut C, error: Box<dyn PipelineError>)
    where
        C: ChannelContext<In, Out>,
    {
        self.record(Inbound::ErrorCaught(ErrorCapture::from(&*error)));
        ctx.fire_error_caught(error);
    }

    fn register<C>(&mut self, ctx: &mut C, completion: Completion)
    where
        C: ChannelContext<In, Out>,
    {
        self.record(Outbound::Register);
        let completion = self.observe_result(completion, OutboundResult::Register);
        ctx.register(completion);
    }

    fn bind<C>(&mut self, ctx: &mut C, address: SocketAddress, completion: Completion)
    where
        C: ChannelContext<In, Out>,
    {
        self.record(Outbound::Bind(address.clone()));
        let completion = self.observe_result(completion, OutboundResult::Bind);
        ctx.bind(address, completion);
    }

    fn connect<C>(&mut self, ctx: &mut C, address: SocketAddress, completion: Completion)
    where
        C: ChannelContext<In, Out>,
    {
        self.record(Outbound::Connect(address.clone()));
        let completion = self.observe_result(completion, OutboundResult::Connect);
        ctx.connect(address, completion);
    }

    fn write<C>(&mut self, ctx: &mut C, data: Out, completion: Completion)
    where
        C: ChannelContext<In, Out>,
    {
        self.record(Outbound::Write(data.clone()));
        let completion = self.observe_result(completion, OutboundResult::Write);
        ctx.write(data, completion);
    }

    fn flush<C>(&mut self, ctx: &mut C)
    where
        C: ChannelContext<In, Out>,
    {
        self.record(Outbound::Flush);
        ctx.flush();
    }

    fn read<C>(&mut self, ctx: &mut C)
    where
        C: ChannelContext<In, Out>,
    {
        self.record(Outbound::Read);
        ctx.read();
    }

    fn close<C>(&mut self, ctx: &mut C, mode: CloseMode, completion: Completion)
    where
        C: ChannelContext<In, Out>,
    {
        self.record(Outbound::Close(mode));
        let completion = self.observe_result(completion, OutboundResult::Close);
        ctx.close(mode, completion);
    }

    fn trigger_user_outbound_event<C>(
        &mut self,
        ctx: &mut C,
        event: Box<dyn UserEvent>,
        completion: Completion,
    ) where
        C: ChannelContext<In, Out>,
    {
        self.record(Outbound::TriggerUserEvent(OutboundUserEvent::capture(
            &*event,
        )));
        let completion = self.observe_result(completion, OutboundResult::TriggerUserEvent);
        ctx.trigger_user_outbound_event(event, completion);
    }
}
