use tracing::debug;

use super::error::CallError;
use super::{Call, CallState};
use crate::state_machine::{StateMachine, StreamInput};

/// A [`Call`] paired with the accumulator that serves it.
///
/// The session owns the accumulator exclusively and refuses input once end-of-input was seen or
/// the call has terminated. A terminated session yields no output.
#[derive(Debug)]
pub struct Session<M> {
    call: Call,
    machine: M,
    input_closed: bool,
}

impl<M: StateMachine> Session<M> {
    pub fn new(call: Call, machine: M) -> Self {
        Self {
            call,
            machine,
            input_closed: false,
        }
    }

    pub fn call(&self) -> &Call {
        &self.call
    }

    pub fn state(&self) -> CallState {
        self.call.state()
    }

    /// Drain every output the accumulator has pending.
    pub fn drain(&mut self) -> impl Iterator<Item = M::Output> + '_ {
        let active = self.call.is_active();
        std::iter::from_fn(move || if active { self.machine.poll_output() } else { None })
    }

    pub fn complete(&mut self) {
        self.call.complete();
    }

    pub fn fail(&mut self, error: CallError) -> CallError {
        self.call.fail(error)
    }
}

impl<T, M> Session<M>
where
    M: StateMachine<Input = StreamInput<T>>,
{
    /// Feed one inbound element into the accumulator.
    pub fn accept(&mut self, element: T) -> Result<(), CallError> {
        self.call.ensure_active()?;
        if self.input_closed {
            return Err(CallError::InputClosed {
                call_id: self.call.id().clone(),
            });
        }

        self.machine.process_input(StreamInput::Element(element));
        Ok(())
    }

    /// Signal end-of-input. Further elements are refused.
    pub fn end_of_input(&mut self) -> Result<(), CallError> {
        self.call.ensure_active()?;
        if self.input_closed {
            return Err(CallError::InputClosed {
                call_id: self.call.id().clone(),
            });
        }

        debug!(call_id = %self.call.id(), "end of input");
        self.input_closed = true;
        self.machine.process_input(StreamInput::EndOfInput);
        Ok(())
    }
}
