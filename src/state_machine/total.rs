use super::{StateMachine, StreamInput};
use crate::operation::{self, OperationError};

/// Cumulative sum over a client stream, emitted once at end-of-input.
///
/// An overflow is remembered and reported at end-of-input; later elements are ignored.
#[derive(Debug)]
pub struct TotalMachine {
    total: Result<i64, OperationError>,
    pending: Option<Result<i64, OperationError>>,
}

impl TotalMachine {
    pub fn new() -> Self {
        Self {
            total: Ok(0),
            pending: None,
        }
    }

    fn observe(&mut self, number: i64) {
        if let Ok(total) = self.total {
            self.total = operation::accumulate_total(total, number);
        }
    }

    fn finish(&mut self) {
        self.pending = Some(self.total.clone());
    }
}

impl Default for TotalMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl StateMachine for TotalMachine {
    type Input = StreamInput<i64>;
    type Output = Result<i64, OperationError>;

    fn process_input(&mut self, input: Self::Input) {
        match input {
            StreamInput::Element(number) => self.observe(number),
            StreamInput::EndOfInput => self.finish(),
        }
    }

    fn poll_output(&mut self) -> Option<Self::Output> {
        self.pending.take()
    }
}
