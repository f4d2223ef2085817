pub mod average;
pub mod maximum;
pub mod minimum;
pub mod total;

pub use self::average::AverageMachine;
pub use self::maximum::MaximumMachine;
pub use self::minimum::MinimumMachine;
pub use self::total::TotalMachine;

/// The [`StateMachine`] trait provides calling semantics for the per-call accumulators and marks
/// the invariants that keep them deterministic.
///
/// # Functionality
/// A state machine consumes [`Input`](StateMachine::Input) through
/// [`process_input`](StateMachine::process_input) and hands back whatever it decided to emit
/// through [`poll_output`](StateMachine::poll_output). Feeding and draining are separate steps so
/// that the emission policy (emit on every element, emit on a strict increase, emit once at
/// end-of-input) lives entirely inside the machine while the driver only moves messages.
///
/// A driver is expected to poll until `None` after every input. Outputs that are not polled stay
/// pending inside the machine.
///
/// # Invariants
/// Implementors *must* uphold the following.
///
/// ## No Interior Mutability
/// All state is mutated only through `&mut self`. No [`std::cell`] containers, no
/// [`std::sync`] locks and no reference counted sharing. A machine belongs to exactly one call
/// and is dropped with it.
///
/// ## No IO
/// No [`std::io`], [`std::net`], clocks or system randomness. Anything time dependent (for
/// example pacing between messages) belongs to the driver.
///
/// ## No Concurrency, No Async
/// Machines never spawn, block or await. The same input sequence therefore always produces the
/// same output sequence, which is what makes two calls with identical input indistinguishable.
///
/// # Side Effects
/// Logging is allowed as long as the machine logic never depends on it.
///
/// # Example
/// ```ignore
/// let mut machine = MinimumMachine::new();
///
/// machine.process_input(StreamInput::Element(6));
/// assert_eq!(machine.poll_output(), Some(6));
///
/// machine.process_input(StreamInput::Element(9));
/// assert_eq!(machine.poll_output(), Some(6));
/// assert_eq!(machine.poll_output(), None);
/// ```
pub trait StateMachine {
    /// The type of input that is [processed](StateMachine::process_input) by the state machine.
    type Input;
    /// The type of output that is [polled](StateMachine::poll_output) from the state machine.
    type Output;

    /// Process the provided `input` into the state machine.
    fn process_input(&mut self, input: Self::Input);

    /// Poll the state machine for output, returning the next pending output if present.
    fn poll_output(&mut self) -> Option<Self::Output>;
}

/// Input of a streaming accumulator: one inbound element, or the end-of-input marker.
///
/// End-of-input is deliberately a value distinct from any transport failure; failures never reach
/// a machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamInput<T> {
    Element(T),
    EndOfInput,
}
