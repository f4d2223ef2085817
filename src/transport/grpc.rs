use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tonic::{Status, Streaming};
use tracing::debug;

use super::{Inbound, Outbound, TransportError};
use crate::call::error::CallError;

/// Response stream handed back to tonic for server-streaming and bidi calls.
pub type ResponseStream<T> = ReceiverStream<Result<T, Status>>;

/// [`Inbound`] over a tonic request stream, extracting the operand from each request message.
pub struct GrpcInbound<Req, F> {
    stream: Streaming<Req>,
    extract: F,
}

impl<Req, F> GrpcInbound<Req, F> {
    pub fn new(stream: Streaming<Req>, extract: F) -> Self {
        Self { stream, extract }
    }
}

#[tonic::async_trait]
impl<Req, T, F> Inbound<T> for GrpcInbound<Req, F>
where
    Req: Send + 'static,
    T: Send + 'static,
    F: Fn(Req) -> T + Send,
{
    async fn recv(&mut self) -> Result<Option<T>, TransportError> {
        let message = self.stream.message().await?;
        Ok(message.map(&self.extract))
    }
}

/// [`Outbound`] feeding the channel behind a [`ResponseStream`].
pub struct GrpcOutbound<Resp, F> {
    sender: mpsc::Sender<Result<Resp, Status>>,
    wrap: F,
}

impl<Resp, F> GrpcOutbound<Resp, F> {
    pub fn new(sender: mpsc::Sender<Result<Resp, Status>>, wrap: F) -> Self {
        Self { sender, wrap }
    }

    /// Close the response stream with a terminal failure.
    ///
    /// If the peer is already gone there is nobody left to tell.
    pub async fn fail(self, error: CallError) {
        if self.sender.send(Err(error.into())).await.is_err() {
            debug!("peer disconnected before the failure could be reported");
        }
    }
}

#[tonic::async_trait]
impl<Resp, T, F> Outbound<T> for GrpcOutbound<Resp, F>
where
    Resp: Send + 'static,
    T: Send + 'static,
    F: Fn(T) -> Resp + Send,
{
    async fn send(&mut self, message: T) -> Result<(), TransportError> {
        let response = (self.wrap)(message);
        self.sender
            .send(Ok(response))
            .await
            .map_err(|_| TransportError::Closed)
    }

    async fn closed(&mut self) {
        self.sender.closed().await
    }
}
