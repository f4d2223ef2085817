use std::collections::VecDeque;

use super::{StateMachine, StreamInput};
use crate::operation;

/// Running minimum over a bidi stream. Emits the current minimum after every element.
#[derive(Debug, Default)]
pub struct MinimumMachine {
    minimum: Option<i64>,
    pending: VecDeque<i64>,
}

impl MinimumMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_minimum(&self) -> Option<i64> {
        self.minimum
    }

    fn observe(&mut self, number: i64) {
        let lowered = operation::lower_minimum(self.minimum, number);
        self.minimum = Some(lowered);
        self.pending.push_back(lowered);
    }
}

impl StateMachine for MinimumMachine {
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
