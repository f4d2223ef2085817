//! Binds one call to the transport, one method per call shape.
//!
//! A [`CallDriver`] holds only immutable configuration, so a single instance serves every call.
//! All per-call state lives in the [`Call`] or [`Session`] the binding creates for the call and
//! passes in.

mod pacing;

use tokio::sync::mpsc;
use tokio::task;
use tracing::debug;

pub use self::pacing::Pacing;
use crate::call::error::CallError;
use crate::call::{Call, Session};
use crate::config::ServerConfig;
use crate::operation::{OperationError, Search, Step};
use crate::state_machine::{StateMachine, StreamInput};
use crate::transport::{Inbound, Outbound, TransportError};

#[derive(Debug, Clone, Copy)]
pub struct CallDriver {
    pacing: Pacing,
    outbound_buffer: usize,
}

impl CallDriver {
    pub fn new(pacing: Pacing, outbound_buffer: usize) -> Self {
        Self {
            pacing,
            outbound_buffer: outbound_buffer.max(1),
        }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(Pacing::new(config.pacing), config.outbound_buffer)
    }

    /// Capacity of the channels sitting between a driver and its outbound stream.
    pub fn outbound_buffer(&self) -> usize {
        self.outbound_buffer
    }

    /// Unary: compute the single response from the single request.
    pub fn unary<R>(
        &self,
        call: &mut Call,
        compute: impl FnOnce() -> Result<R, OperationError>,
    ) -> Result<R, CallError> {
        call.ensure_active()?;

        match compute() {
            Ok(response) => {
                call.complete();
                Ok(response)
            }
            Err(error) => Err(call.fail(error.into())),
        }
    }

    /// Server-stream: send every item the search finds, then complete without payload.
    ///
    /// The search runs on the blocking pool and hands items over through a channel, so a long
    /// gap between two items occupies no runtime worker. Once the peer stops listening the
    /// search halts at its next candidate.
    pub async fn server_stream<S, O>(
        &self,
        call: &mut Call,
        search: S,
        outbound: &mut O,
    ) -> Result<(), CallError>
    where
        S: Search + Send + 'static,
        S::Item: Send + 'static,
        O: Outbound<S::Item>,
    {
        call.ensure_active()?;

        let (found_tx, mut found) = mpsc::channel(self.outbound_buffer);
        let producer = task::spawn_blocking(move || run_search(search, found_tx));
        let pacing = self.pacing;

        let outcome = async {
            let mut sent = 0usize;
            loop {
                let item = tokio::select! {
                    item = found.recv() => item,
                    () = outbound.closed() => return Err(CallError::from(TransportError::Closed)),
                };
                let Some(item) = item else {
                    return Ok::<usize, CallError>(sent);
                };
                outbound.send(item).await?;
                sent += 1;
                pacing.pause().await;
            }
        }
        .await;

        // A dropped receiver stops the search.
        drop(found);
        let searched = producer.await;

        match outcome.and_then(|sent| searched.map(|()| sent).map_err(CallError::from)) {
            Ok(sent) => {
                debug!(call_id = %call.id(), sent, "sequence exhausted");
                call.complete();
                Ok(())
            }
            Err(error) => Err(call.fail(error)),
        }
    }

    /// Client-stream: feed every inbound element to the session and return the single final
    /// response produced at end-of-input.
    pub async fn client_stream<T, R, M, I>(
        &self,
        session: &mut Session<M>,
        inbound: &mut I,
    ) -> Result<R, CallError>
    where
        T: Send + 'static,
        M: StateMachine<Input = StreamInput<T>, Output = Result<R, OperationError>>,
        I: Inbound<T>,
    {
        let pacing = self.pacing;
        let outcome: Result<R, CallError> = async {
            while let Some(element) = inbound.recv().await? {
                session.accept(element)?;
                pacing.pause().await;
            }
            session.end_of_input()?;

            let response = session.drain().next();
            let response = response.ok_or_else(|| CallError::MissingResponse {
                call_id: session.call().id().clone(),
            })?;
            Ok::<R, CallError>(response?)
        }
        .await;

        match outcome {
            Ok(response) => {
                session.complete();
                Ok(response)
            }
            Err(error) => Err(session.fail(error)),
        }
    }

    /// Bidi-stream: the inbound side feeds the session and queues whatever it emits, the
    /// outbound side sends the queue.
    ///
    /// The inbound side closes the queue only after it has handled end-of-input, so the outbound
    /// side finishes once every pending message went out. A failure on either side drops the
    /// other and fails the call.
    pub async fn bidi_stream<T, M, I, O>(
        &self,
        session: &mut Session<M>,
        inbound: &mut I,
        outbound: &mut O,
    ) -> Result<(), CallError>
    where
        T: Send + 'static,
        M: StateMachine<Input = StreamInput<T>>,
        M::Output: Send + 'static,
        I: Inbound<T>,
        O: Outbound<M::Output>,
    {
        session.call().ensure_active()?;

        let (queue, mut pending) = mpsc::channel::<M::Output>(self.outbound_buffer);
        let pacing = self.pacing;
        let inbound_session = &mut *session;

        let inbound_side = async move {
            while let Some(element) = inbound.recv().await? {
                inbound_session.accept(element)?;
                for output in inbound_session.drain().collect::<Vec<_>>() {
                    queue
                        .send(output)
                        .await
                        .map_err(|_| TransportError::Closed)?;
                }
            }

            inbound_session.end_of_input()?;
            for output in inbound_session.drain().collect::<Vec<_>>() {
                queue
                    .send(output)
                    .await
                    .map_err(|_| TransportError::Closed)?;
            }

            // Closing the queue tells the outbound side that no more messages will follow.
            drop(queue);
            Ok::<(), CallError>(())
        };

        let outbound_side = async {
            let mut sent = 0usize;
            while let Some(output) = pending.recv().await {
                outbound.send(output).await?;
                sent += 1;
                pacing.pause().await;
            }
            debug!(sent, "outbound side drained");
            Ok::<(), CallError>(())
        };

        let outcome = tokio::try_join!(inbound_side, outbound_side);

        match outcome {
            Ok(_) => {
                session.complete();
                Ok(())
            }
            Err(error) => Err(session.fail(error)),
        }
    }
}

/// Step `search` until it is exhausted or nobody is left to receive what it finds.
fn run_search<S: Search>(mut search: S, found: mpsc::Sender<S::Item>) {
    while !found.is_closed() {
        match search.step() {
            Step::Found(item) => {
                if found.blocking_send(item).is_err() {
                    return;
                }
            }
            Step::Skipped => {}
            Step::Exhausted => return,
        }
    }
}

impl Default for CallDriver {
    fn default() -> Self {
        Self::new(Pacing::default(), 16)
    }
}
