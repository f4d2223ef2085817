//! Error types for a single RPC call.

use tokio::task::JoinError;
use tonic::{Code, Status};

use super::{CallId, CallState};
use crate::operation::OperationError;
use crate::transport::TransportError;

/// Machine-readable category of a call failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidArgument,
    DivisionByZero,
    TransportFailure,
    Internal,
}

/// The terminal failure of a call.
#[derive(Debug, thiserror::Error)]
pub enum CallError {
    /// A business rule rejected the input.
    #[error(transparent)]
    Operation(#[from] OperationError),

    /// The transport failed to deliver or accept a message.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Input arrived after the session observed end-of-input.
    #[error("call {call_id} no longer accepts input")]
    InputClosed { call_id: CallId },

    /// The call already reached a terminal state.
    #[error("call {call_id} already terminated as {state:?}")]
    Terminated { call_id: CallId, state: CallState },

    /// The accumulator produced no final response at end-of-input.
    #[error("call {call_id} finished without a response")]
    MissingResponse { call_id: CallId },

    /// The blocking task running a server-stream search panicked.
    #[error("search task failed: {0}")]
    Search(#[from] JoinError),
}

impl CallError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Operation(OperationError::InvalidArgument(_)) => ErrorKind::InvalidArgument,
            Self::Operation(OperationError::DivisionByZero(_)) => ErrorKind::DivisionByZero,
            Self::Transport(_) => ErrorKind::TransportFailure,
            Self::InputClosed { .. }
            | Self::Terminated { .. }
            | Self::MissingResponse { .. }
            | Self::Search(_) => ErrorKind::Internal,
        }
    }
}

impl From<CallError> for Status {
    fn from(error: CallError) -> Self {
        match error {
            CallError::Operation(OperationError::InvalidArgument(message)) => {
                Status::invalid_argument(message)
            }
            CallError::Operation(OperationError::DivisionByZero(message)) => {
                Status::failed_precondition(message)
            }
            CallError::Transport(TransportError::Status(status)) => status,
            CallError::Transport(TransportError::Closed) => {
                Status::cancelled("outbound stream closed by peer")
            }
            other => Status::internal(other.to_string()),
        }
    }
}

/// Client side mapping: recover the failure taxonomy from the status the server reported.
impl From<Status> for CallError {
    fn from(status: Status) -> Self {
        match status.code() {
            Code::InvalidArgument => {
                OperationError::InvalidArgument(status.message().to_string()).into()
            }
            Code::FailedPrecondition => {
                OperationError::DivisionByZero(status.message().to_string()).into()
            }
            _ => TransportError::Status(status).into(),
        }
    }
}
