use super::{StateMachine, StreamInput};
use crate::operation::{self, OperationError};

/// Accumulates a mean over a client stream and emits it once at end-of-input.
#[derive(Debug, Default)]
pub struct AverageMachine {
    sum: i128,
    count: u64,
    pending: Option<Result<f64, OperationError>>,
}

impl AverageMachine {
    pub fn new() -> Self {
        Self::default()
    }

    fn observe(&mut self, number: i64) {
        self.sum += i128::from(number);
        self.count += 1;
    }

    fn finish(&mut self) {
        self.pending = Some(operation::mean(self.sum, self.count));
    }
}

impl StateMachine for AverageMachine {
    type Input = StreamInput<i64>;
    type Output = Result<f64, OperationError>;

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
