//! The interface between a pipeline stage and the pipeline hosting it.
//!
//! A duplex pipeline is a chain of stages. Inbound notifications travel from the transport
//! towards the application, outbound operations travel from the application towards the
//! transport. A stage implements [`DuplexHandler`] and passes each callback along by calling the
//! matching method on the [`ChannelContext`] it is given, which represents the rest of the chain.

use std::{fmt, io};

use chrec::{CloseMode, PipelineError, SocketAddress, UserEvent};

/// A callback fired once when an outbound operation completes.
pub struct Completion {
    callback: Box<dyn FnOnce(&io::Result<()>)>,
}

impl Completion {
    pub fn new(callback: impl FnOnce(&io::Result<()>) + 'static) -> Self {
        Self {
            callback: Box::new(callback),
        }
    }

    /// A completion nobody is waiting for.
    pub fn ignored() -> Self {
        Self::new(|_| {})
    }

    /// Chain an observer which sees the result before the original callback does.
    pub fn observe(self, observer: impl FnOnce(&io::Result<()>) + 'static) -> Self {
        let callback = self.callback;
        Self::new(move |result| {
            observer(result);
            callback(result);
        })
    }

    pub fn complete(self, result: io::Result<()>) {
        (self.callback)(&result);
    }
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completion").finish_non_exhaustive()
    }
}

/// The next stage of the pipeline, as seen by a [`DuplexHandler`].
///
/// The `fire_*` methods pass an inbound notification towards the application. The remaining
/// methods pass an outbound operation towards the transport.
pub trait ChannelContext<In, Out> {
    fn fire_channel_registered(&mut self);
    fn fire_channel_unregistered(&mut self);
    fn fire_channel_active(&mut self);
    fn fire_channel_inactive(&mut self);
    fn fire_channel_read(&mut self, data: In);
    fn fire_channel_read_complete(&mut self);
    fn fire_channel_writability_changed(&mut self);
    fn fire_user_inbound_event_triggered(&mut self, event: Box<dyn UserEvent>);
    fn fire_error_caught(&mut self, error: Box<dyn PipelineError>);

    fn register(&mut self, completion: Completion);
    fn bind(&mut self, address: SocketAddress, completion: Completion);
    fn connect(&mut self, address: SocketAddress, completion: Completion);
    fn write(&mut self, data: Out, completion: Completion);
    fn flush(&mut self);
    fn read(&mut self);
    fn close(&mut self, mode: CloseMode, completion: Completion);
    fn trigger_user_outbound_event(&mut self, event: Box<dyn UserEvent>, completion: Completion);
}

/// A stage of a duplex pipeline.
///
/// Every method forwards to the next stage by default, so an implementation only overrides the
/// callbacks it is interested in.
pub trait DuplexHandler<In, Out> {
    /// Called when the stage is inserted into a pipeline, before any other callback.
    fn handler_added<C>(&mut self, ctx: &mut C)
    where
        C: ChannelContext<In, Out>,
    {
        let _ = ctx;
    }

    /// Called when the stage is removed from a pipeline, after every other callback.
    fn handler_removed<C>(&mut self, ctx: &mut C)
    where
        C: ChannelContext<In, Out>,
    {
        let _ = ctx;
    }

    fn channel_registered<C>(&mut self, ctx: &mut C)
    where
        C: ChannelContext<In, Out>,
    {
        ctx.fire_channel_registered();
    }

    fn channel_unregistered<C>(&mut self, ctx: &mut C)
    where
        C: ChannelContext<In, Out>,
    {
        ctx.fire_channel_unregistered();
    }

    fn channel_active<C>(&mut self, ctx: &mut C)
    where
        C: ChannelContext<In, Out>,
    {
        ctx.fire_channel_active();
    }

    fn channel_inactive<C>(&mut self, ctx: &mut C)
    where
        C: ChannelContext<In, Out>,
    {
        ctx.fire_channel_inactive();
    }

    fn channel_read<C>(&mut self, ctx: &mut C, data: In)
    where
        C: ChannelContext<In, Out>,
    {
        ctx.fire_channel_read(data);
    }

    fn channel_read_complete<C>(&mut self, ctx: &mut C)
    where
        C: ChannelContext<In, Out>,
    {
        ctx.fire_channel_read_complete();
    }

    fn channel_writability_changed<C>(&mut self, ctx: &mut C)
    where
        C: ChannelContext<In, Out>,
    {
        ctx.fire_channel_writability_changed();
    }

    fn user_inbound_event_triggered<C>(&mut self, ctx: &mut C, event: Box<dyn UserEvent>)
    where
        C: ChannelContext<In, Out>,
    {
        ctx.fire_user_inbound_event_triggered(event);
    }

    fn error_caught<C>(&mut self, ctx: &mut C, error: Box<dyn PipelineError>)
    where
        C: ChannelContext<In, Out>,
    {
        ctx.fire_error_caught(error);
    }

    fn register<C>(&mut self, ctx: &mut C, completion: Completion)
    where
        C: ChannelContext<In, Out>,
    {
        ctx.register(completion);
    }

    fn bind<C>(&mut self, ctx: &mut C, address: SocketAddress, completion: Completion)
    where
        C: ChannelContext<In, Out>,
    {
        ctx.bind(address, completion);
    }

    fn connect<C>(&mut self, ctx: &mut C, address: SocketAddress, completion: Completion)
    where
        C: ChannelContext<In, Out>,
    {
        ctx.connect(address, completion);
    }

    fn write<C>(&mut self, ctx: &mut C, data: Out, completion: Completion)
    where
        C: ChannelContext<In, Out>,
    {
        ctx.write(data, completion);
    }

    fn flush<C>(&mut self, ctx: &mut C)
    where
        C: ChannelContext<In, Out>,
    {
        ctx.flush();
    }

    fn read<C>(&mut self, ctx: &mut C)
    where
        C: ChannelContext<In, Out>,
    {
        ctx.read();
    }

    fn close<C>(&mut self, ctx: &mut C, mode: CloseMode, completion: Completion)
    where
        C: ChannelContext<In, Out>,
    {
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
        ctx.trigger_user_outbound_event(event, completion);
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use super::*;

    #[test]
    fn observer_runs_before_original() {
        let calls = Rc::new(RefCell::new(Vec::new()));

        let original_calls = Rc::clone(&calls);
        let observer_calls = Rc::clone(&calls);
        let completion = Completion::new(move |result| {
            original_calls
                .borrow_mut()
                .push(format!("original {}", result.is_ok()));
        })
        .observe(move |result| {
            observer_calls
                .borrow_mut()
                .push(format!("observer {}", result.is_ok()));
        });

        completion.complete(Err(io::ErrorKind::ConnectionRefused.into()));

        assert_eq!(*calls.borrow(), ["observer false", "original false"]);
    }
}
