use std::collections::VecDeque;

use super::{StateMachine, StreamInput};
use crate::operation;

/// Running maximum over a bidi stream. Emits only when an element is strictly greater than
/// everything seen before it; the first element always emits.
#[derive(Debug, Default)]
pub struct MaximumMachine {
    maximum: Option<i64>,
    pending: VecDeque<i64>,
}

impl MaximumMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_maximum(&self) -> Option<i64> {
        self.maximum
    }

    fn observe(&mut self, number: i64) {
        if let Some(raised) = operation::raise_maximum(self.maximum, number) {
            self.maximum = Some(raised);
            self.pending.push_back(raised);
        }
    }
}

impl StateMachine for MaximumMachine {
    type Input = StreamInput<i64>;
    type Output = i64;

    fn process_input(&mut self, input: Self::Input) {
        match input {
            StreamInput::Element(number) => self.observe(number),
            StreamInput::EndOfInput => {}
        }
    }

    fn poll_output(&mut self) -> Option<Self::Output> {
        self.pending.pop_front()
    }
}
