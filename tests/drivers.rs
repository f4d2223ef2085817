use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use calculator_rpc::call::error::CallError;
use calculator_rpc::call::{Call, CallState, ErrorKind, Operation, Session};
use calculator_rpc::driver::CallDriver;
use calculator_rpc::operation::{self, OperationError};
use calculator_rpc::state_machine::{AverageMachine, MaximumMachine, MinimumMachine, TotalMachine};
use calculator_rpc::transport::{GrpcOutbound, Inbound, Outbound, TransportError};
use tokio::sync::mpsc;
use tonic::Status;

const SAMPLE: [i64; 7] = [2, 6, 1, 9, 2, 8, 5];

/// Inbound side that replays a fixed script. An exhausted script is end-of-input.
struct ScriptedInbound {
    script: VecDeque<Result<i64, Status>>,
    received: usize,
}

impl ScriptedInbound {
    fn elements(numbers: &[i64]) -> Self {
        Self::script(numbers.iter().copied().map(Ok).collect())
    }

    fn script(script: Vec<Result<i64, Status>>) -> Self {
        Self {
            script: script.into(),
            received: 0,
        }
    }
}

#[tonic::async_trait]
impl Inbound<i64> for ScriptedInbound {
    async fn recv(&mut self) -> Result<Option<i64>, TransportError> {
        match self.script.pop_front() {
            Some(Ok(number)) => {
                self.received += 1;
                Ok(Some(number))
            }
            Some(Err(status)) => Err(status.into()),
            None => Ok(None),
        }
    }
}

/// Outbound side that records what was sent and optionally refuses sends after a limit.
#[derive(Clone, Default)]
struct RecordingOutbound {
    sent: Arc<Mutex<Vec<i64>>>,
    accept_limit: Option<usize>,
}

impl RecordingOutbound {
    fn failing_after(limit: usize) -> Self {
        Self {
            accept_limit: Some(limit),
            ..Self::default()
        }
    }

    fn sent(&self) -> Vec<i64> {
        self.sent.lock().unwrap().clone()
    }
}

#[tonic::async_trait]
impl Outbound<i64> for RecordingOutbound {
    async fn send(&mut self, message: i64) -> Result<(), TransportError> {
        let mut sent = self.sent.lock().unwrap();
        if self.accept_limit.is_some_and(|limit| sent.len() >= limit) {
            return Err(TransportError::Closed);
        }
        sent.push(message);
        Ok(())
    }
}

#[test]
fn test_unary_success_completes_call() {
    let driver = CallDriver::default();
    let mut call = Call::new(Operation::Sum);

    let result = driver.unary(&mut call, || operation::sum(10, 20));

    assert_eq!(result.unwrap(), 30);
    assert_eq!(call.state(), CallState::Completed);
}

#[test]
fn test_unary_failure_propagates_verbatim() {
    let driver = CallDriver::default();
    let mut call = Call::new(Operation::SquareRoot);

    let result = driver.unary(&mut call, || operation::square_root(-1.0));

    let error = result.unwrap_err();
    assert_eq!(error.kind(), ErrorKind::InvalidArgument);
    assert!(matches!(
        error,
        CallError::Operation(OperationError::InvalidArgument(ref msg)) if msg.contains("-1")
    ));
    assert_eq!(call.state(), CallState::Failed);
}

#[tokio::test]
async fn test_server_stream_sends_every_item() {
    let driver = CallDriver::default();
    let mut call = Call::new(Operation::PrimeFactorization);
    let mut outbound = RecordingOutbound::default();

    driver
        .server_stream(&mut call, operation::prime_factors(40), &mut outbound)
        .await
        .unwrap();

    assert_eq!(outbound.sent(), vec![2, 2, 2, 5]);
    assert_eq!(call.state(), CallState::Completed);
}

#[tokio::test]
async fn test_server_stream_empty_sequence_completes() {
    let driver = CallDriver::default();
    let mut call = Call::new(Operation::PerfectNumbersInRange);
    let mut outbound = RecordingOutbound::default();

    driver
        .server_stream(
            &mut call,
            operation::perfect_numbers_in_range(7, 27),
            &mut outbound,
        )
        .await
        .unwrap();

    assert!(outbound.sent().is_empty());
    assert_eq!(call.state(), CallState::Completed);
}

#[tokio::test]
async fn test_server_stream_stops_when_peer_closes() {
    let driver = CallDriver::default();
    let mut call = Call::new(Operation::PerfectNumbersInRange);
    let mut outbound = RecordingOutbound::failing_after(1);

    let result = driver
        .server_stream(
            &mut call,
            operation::perfect_numbers_in_range(1, 1000),
            &mut outbound,
        )
        .await;

    assert_eq!(result.unwrap_err().kind(), ErrorKind::TransportFailure);
    assert_eq!(outbound.sent(), vec![6]);
    assert_eq!(call.state(), CallState::Failed);
}

#[tokio::test]
async fn test_server_stream_halts_when_response_stream_dropped() {
    let driver = CallDriver::default();
    let (sender, mut responses) = mpsc::channel::<Result<i64, Status>>(4);

    let task = tokio::spawn(async move {
        let mut call = Call::new(Operation::PerfectNumbersInRange);
        let mut outbound = GrpcOutbound::new(sender, |number: i64| number);
        let result = driver
            .server_stream(
                &mut call,
                operation::perfect_numbers_in_range(1, 40_000_000),
                &mut outbound,
            )
            .await;
        (result, call.state())
    });

    for expected in [6, 28, 496, 8128] {
        assert_eq!(responses.recv().await.unwrap().unwrap(), expected);
    }
    // The next perfect number is 33550336, far beyond what the search reaches before the drop.
    drop(responses);

    let (result, state) = tokio::time::timeout(Duration::from_secs(10), task)
        .await
        .expect("search kept running after the peer went away")
        .unwrap();

    assert_eq!(result.unwrap_err().kind(), ErrorKind::TransportFailure);
    assert_eq!(state, CallState::Failed);
}

#[tokio::test]
async fn test_client_stream_average() {
    let driver = CallDriver::default();
    let mut session = Session::new(Call::new(Operation::ComputeAverage), AverageMachine::new());
    let mut inbound = ScriptedInbound::elements(&SAMPLE);

    let average = driver
        .client_stream(&mut session, &mut inbound)
        .await
        .unwrap();

    assert!((average - 33.0 / 7.0).abs() < f64::EPSILON);
    assert_eq!(session.state(), CallState::Completed);
}

#[tokio::test]
async fn test_client_stream_average_of_nothing() {
    let driver = CallDriver::default();
    let mut session = Session::new(Call::new(Operation::ComputeAverage), AverageMachine::new());
    let mut inbound = ScriptedInbound::elements(&[]);

    let result = driver.client_stream(&mut session, &mut inbound).await;

    assert_eq!(result.unwrap_err().kind(), ErrorKind::DivisionByZero);
    assert_eq!(session.state(), CallState::Failed);
}

#[tokio::test]
async fn test_client_stream_total() {
    let driver = CallDriver::default();
    let mut session = Session::new(Call::new(Operation::RunningTotal), TotalMachine::new());
    let mut inbound = ScriptedInbound::elements(&SAMPLE);

    let total = driver
        .client_stream(&mut session, &mut inbound)
        .await
        .unwrap();

    assert_eq!(total, 33);
    assert_eq!(session.state(), CallState::Completed);
}

#[tokio::test]
async fn test_client_stream_transport_failure_mid_stream() {
    let driver = CallDriver::default();
    let mut session = Session::new(Call::new(Operation::RunningTotal), TotalMachine::new());
    let mut inbound = ScriptedInbound::script(vec![
        Ok(2),
        Ok(6),
        Err(Status::unavailable("connection reset")),
        Ok(1),
    ]);

    let result = driver.client_stream(&mut session, &mut inbound).await;

    assert_eq!(result.unwrap_err().kind(), ErrorKind::TransportFailure);
    assert_eq!(session.state(), CallState::Failed);
    assert_eq!(inbound.received, 2, "no input may be consumed after the failure");
    assert_eq!(session.drain().count(), 0);
}

#[tokio::test]
async fn test_bidi_maximum() {
    let driver = CallDriver::default();
    let mut session = Session::new(Call::new(Operation::FindMaximum), MaximumMachine::new());
    let mut inbound = ScriptedInbound::elements(&SAMPLE);
    let mut outbound = RecordingOutbound::default();

    driver
        .bidi_stream(&mut session, &mut inbound, &mut outbound)
        .await
        .unwrap();

    assert_eq!(outbound.sent(), vec![2, 6, 9]);
    assert_eq!(session.state(), CallState::Completed);
}

#[tokio::test]
async fn test_bidi_minimum() {
    let driver = CallDriver::default();
    let mut session = Session::new(Call::new(Operation::FindMinimum), MinimumMachine::new());
    let mut inbound = ScriptedInbound::elements(&SAMPLE);
    let mut outbound = RecordingOutbound::default();

    driver
        .bidi_stream(&mut session, &mut inbound, &mut outbound)
        .await
        .unwrap();

    assert_eq!(outbound.sent(), vec![2, 2, 1, 1, 1, 1, 1]);
    assert_eq!(session.state(), CallState::Completed);
}

#[tokio::test]
async fn test_bidi_flushes_pending_with_small_buffer() {
    let driver = CallDriver::new(Default::default(), 1);
    let mut session = Session::new(Call::new(Operation::FindMinimum), MinimumMachine::new());
    let input: Vec<i64> = (0..200).rev().collect();
    let mut inbound = ScriptedInbound::elements(&input);
    let mut outbound = RecordingOutbound::default();

    driver
        .bidi_stream(&mut session, &mut inbound, &mut outbound)
        .await
        .unwrap();

    assert_eq!(outbound.sent(), input);
}

#[tokio::test]
async fn test_bidi_inbound_failure_stops_outbound() {
    let driver = CallDriver::default();
    let mut session = Session::new(Call::new(Operation::FindMinimum), MinimumMachine::new());
    let mut inbound = ScriptedInbound::script(vec![
        Ok(5),
        Ok(3),
        Err(Status::aborted("peer went away")),
        Ok(1),
    ]);
    let mut outbound = RecordingOutbound::default();

    let result = driver
        .bidi_stream(&mut session, &mut inbound, &mut outbound)
        .await;

    assert_eq!(result.unwrap_err().kind(), ErrorKind::TransportFailure);
    assert_eq!(session.state(), CallState::Failed);
    assert_eq!(inbound.received, 2);

    // Only responses to elements received before the failure can have gone out.
    let sent = outbound.sent();
    assert!([5, 3].starts_with(&sent), "unexpected responses {sent:?}");
    assert_eq!(session.drain().count(), 0);
}

#[tokio::test]
async fn test_bidi_outbound_failure_stops_inbound() {
    let driver = CallDriver::default();
    let mut session = Session::new(Call::new(Operation::FindMinimum), MinimumMachine::new());
    let input: Vec<i64> = (0..1000).collect();
    let mut inbound = ScriptedInbound::elements(&input);
    let mut outbound = RecordingOutbound::failing_after(3);

    let result = driver
        .bidi_stream(&mut session, &mut inbound, &mut outbound)
        .await;

    assert_eq!(result.unwrap_err().kind(), ErrorKind::TransportFailure);
    assert_eq!(session.state(), CallState::Failed);
    assert_eq!(outbound.sent(), vec![0, 0, 0]);
    assert!(inbound.received < input.len());
}

#[tokio::test]
async fn test_terminated_session_is_not_driven_again() {
    let driver = CallDriver::default();
    let mut session = Session::new(Call::new(Operation::FindMaximum), MaximumMachine::new());
    let mut outbound = RecordingOutbound::default();

    driver
        .bidi_stream(&mut session, &mut ScriptedInbound::elements(&[1]), &mut outbound)
        .await
        .unwrap();

    let result = driver
        .bidi_stream(&mut session, &mut ScriptedInbound::elements(&[7]), &mut outbound)
        .await;

    assert!(matches!(result, Err(CallError::Terminated { .. })));
    assert_eq!(outbound.sent(), vec![1]);
    assert_eq!(session.state(), CallState::Completed);
}

#[tokio::test]
async fn test_identical_calls_produce_identical_output() {
    let driver = CallDriver::default();
    let mut runs = Vec::new();

    for _ in 0..3 {
        let mut session = Session::new(Call::new(Operation::FindMaximum), MaximumMachine::new());
        let mut outbound = RecordingOutbound::default();
        driver
            .bidi_stream(
                &mut session,
                &mut ScriptedInbound::elements(&SAMPLE),
                &mut outbound,
            )
            .await
            .unwrap();
        runs.push(outbound.sent());
    }

    assert!(runs.windows(2).all(|pair| pair[0] == pair[1]));
}
