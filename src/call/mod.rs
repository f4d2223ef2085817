pub mod error;
pub mod session;

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, info_span, warn};
use uuid::Uuid;

use self::error::CallError;
pub use self::error::ErrorKind;
pub use self::session::Session;

/// Identifies one RPC invocation in logs. Carries no semantics beyond correlation.
#[derive(Clone, Hash, PartialEq, Eq)]
pub struct CallId(Arc<Uuid>);

impl CallId {
    pub fn generate() -> Self {
        Self(Arc::new(Uuid::new_v4()))
    }
}

impl fmt::Debug for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CallId({})", self.0)
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The four RPC interaction shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallShape {
    /// One request, one response.
    Unary,
    /// One request, many responses.
    ServerStream,
    /// Many requests, one response.
    ClientStream,
    /// Many requests, many responses.
    BidiStream,
}

/// Every operation exposed by the calculator service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Sum,
    Add,
    PrimeFactorization,
    ComputeAverage,
    FindMaximum,
    FindMinimum,
    RunningTotal,
    PerfectNumbersInRange,
    SquareRoot,
}

impl Operation {
    pub fn shape(self) -> CallShape {
        match self {
            Self::Sum | Self::Add | Self::SquareRoot => CallShape::Unary,
            Self::PrimeFactorization | Self::PerfectNumbersInRange => CallShape::ServerStream,
            Self::ComputeAverage | Self::RunningTotal => CallShape::ClientStream,
            Self::FindMaximum | Self::FindMinimum => CallShape::BidiStream,
        }
    }

    /// The RPC method name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Sum => "Sum",
            Self::Add => "Add",
            Self::PrimeFactorization => "PrimeFactorization",
            Self::ComputeAverage => "ComputeAverage",
            Self::FindMaximum => "FindMaximum",
            Self::FindMinimum => "FindMinimum",
            Self::RunningTotal => "RunningTotal",
            Self::PerfectNumbersInRange => "PerfectNumbersInRange",
            Self::SquareRoot => "SquareRoot",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    Active,
    Completed,
    Failed,
}

/// Lifecycle of one RPC invocation.
///
/// A call starts [`Active`](CallState::Active) and reaches exactly one terminal state. The first
/// terminal transition wins; later calls to [`complete`](Self::complete) or [`fail`](Self::fail)
/// leave the state untouched.
#[derive(Debug)]
pub struct Call {
    id: CallId,
    operation: Operation,
    state: CallState,
}

impl Call {
    pub fn new(operation: Operation) -> Self {
        let id = CallId::generate();
        debug!(call_id = %id, operation = %operation, "call started");

        Self {
            id,
            operation,
            state: CallState::Active,
        }
    }

    pub fn id(&self) -> &CallId {
        &self.id
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn shape(&self) -> CallShape {
        self.operation.shape()
    }

    pub fn state(&self) -> CallState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == CallState::Active
    }

    pub fn ensure_active(&self) -> Result<(), CallError> {
        if self.is_active() {
            Ok(())
        } else {
            Err(CallError::Terminated {
                call_id: self.id.clone(),
                state: self.state,
            })
        }
    }

    /// Span that every log line of this call is recorded under.
    pub fn span(&self) -> tracing::Span {
        info_span!(
            "call",
            call_id = %self.id,
            operation = %self.operation,
            shape = ?self.shape()
        )
    }

    pub fn complete(&mut self) {
        if self.is_active() {
            self.state = CallState::Completed;
            info!(call_id = %self.id, operation = %self.operation, "call completed");
        }
    }

    /// Move the call to [`Failed`](CallState::Failed) and hand the error back for reporting.
    pub fn fail(&mut self, error: CallError) -> CallError {
        if self.is_active() {
            self.state = CallState::Failed;
            warn!(
                call_id = %self.id,
                operation = %self.operation,
                kind = ?error.kind(),
                error = %error,
                "call failed"
            );
        }
        error
    }
}
