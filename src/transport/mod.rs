//! The capabilities a call driver needs from the RPC transport.
//!
//! The transport itself (framing, serialization, multiplexing) is provided by tonic. Drivers only
//! see the two traits below, which keeps them independent of protobuf messages and lets tests
//! script inbound traffic or inject failures.
//!
//! Closing the outbound side with a final response, or with a terminal failure, is done by the
//! binding that owns the transport once the driver returns; see [`grpc`].

pub mod grpc;

use tonic::Status;

pub use self::grpc::{GrpcInbound, GrpcOutbound, ResponseStream};

/// Failure reported by the transport rather than by the calculator.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The peer or the transport aborted the call.
    #[error("transport reported failure: {0}")]
    Status(#[from] Status),

    /// The peer stopped listening to the outbound stream.
    #[error("outbound stream closed by peer")]
    Closed,
}

/// The receiving half of a call.
#[tonic::async_trait]
pub trait Inbound<T: Send + 'static>: Send {
    /// Receive the next inbound element.
    ///
    /// `Ok(None)` is end-of-input. Errors are transport failures and end the call.
    async fn recv(&mut self) -> Result<Option<T>, TransportError>;
}

/// The sending half of a call.
#[tonic::async_trait]
pub trait Outbound<T: Send + 'static>: Send {
    /// Send one outbound element.
    async fn send(&mut self, message: T) -> Result<(), TransportError>;

    /// Resolves once the peer stopped listening.
    ///
    /// Transports that cannot observe this never resolve; they report closure on the next send.
    async fn closed(&mut self) {
        std::future::pending::<()>().await
    }
}
