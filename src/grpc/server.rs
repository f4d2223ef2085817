use std::future::Future;

use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_stream::wrappers::{ReceiverStream, TcpListenerStream};
use tonic::{Request, Response, Status, Streaming};
use tracing::{Instrument, debug, info};

use crate::call::{Call, Operation, Session};
use crate::calculator_proto::calculator_service_server::{
    CalculatorService, CalculatorServiceServer,
};
use crate::calculator_proto::{
    AddRequest, AddResponse, ComputeAverageRequest, ComputeAverageResponse, FindMaximumRequest,
    FindMaximumResponse, FindMinimumRequest, FindMinimumResponse, PerfectNumbersInRangeRequest,
    PerfectNumbersInRangeResponse, PrimeFactorizationRequest, PrimeFactorizationResponse,
    RunningTotalRequest, RunningTotalResponse, SquareRootRequest, SquareRootResponse, SumRequest,
    SumResponse,
};
use crate::config::ServerConfig;
use crate::driver::CallDriver;
use crate::operation::{self, Search};
use crate::state_machine::{
    AverageMachine, MaximumMachine, MinimumMachine, StateMachine, StreamInput, TotalMachine,
};
use crate::transport::{GrpcInbound, GrpcOutbound, Inbound, ResponseStream};

/// Serve the calculator on `config.addr` until `shutdown` resolves.
pub async fn start_server(
    config: ServerConfig,
    shutdown: impl Future<Output = ()> + Send,
) -> anyhow::Result<()> {
    let service = CalculatorServiceImpl::new(CallDriver::from_config(&config));

    info!(address = %config.addr, pacing = ?config.pacing, "gRPC server starting");

    tonic::transport::Server::builder()
        .add_service(CalculatorServiceServer::new(service))
        .serve_with_shutdown(config.addr, shutdown)
        .await?;

    info!("gRPC server stopped");
    Ok(())
}

/// Serve the calculator on an already bound listener.
pub async fn serve_listener(
    listener: TcpListener,
    service: CalculatorServiceImpl,
) -> anyhow::Result<()> {
    info!(address = %listener.local_addr()?, "gRPC server starting");

    tonic::transport::Server::builder()
        .add_service(CalculatorServiceServer::new(service))
        .serve_with_incoming(TcpListenerStream::new(listener))
        .await?;

    Ok(())
}

/// The calculator service. Holds no per-call state, so one instance serves every call.
#[derive(Debug, Clone, Copy, Default)]
pub struct CalculatorServiceImpl {
    driver: CallDriver,
}

impl CalculatorServiceImpl {
    pub fn new(driver: CallDriver) -> Self {
        Self { driver }
    }

    /// Run a server-stream call on its own task and hand its response stream to tonic.
    fn spawn_server_stream<S, Resp, F>(
        &self,
        mut call: Call,
        search: S,
        wrap: F,
    ) -> Response<ResponseStream<Resp>>
    where
        S: Search + Send + 'static,
        S::Item: Send + 'static,
        Resp: Send + 'static,
        F: Fn(S::Item) -> Resp + Send + 'static,
    {
        let (sender, receiver) = mpsc::channel(self.driver.outbound_buffer());
        let driver = self.driver;
        let span = call.span();

        tokio::spawn(
            async move {
                let mut outbound = GrpcOutbound::new(sender, wrap);
                if let Err(error) = driver.server_stream(&mut call, search, &mut outbound).await {
                    outbound.fail(error).await;
                }
            }
            .instrument(span),
        );

        Response::new(ReceiverStream::new(receiver))
    }

    /// Run a bidi call on its own task and hand its response stream to tonic.
    fn spawn_bidi_stream<M, I, Resp, F>(
        &self,
        mut session: Session<M>,
        mut inbound: I,
        wrap: F,
    ) -> Response<ResponseStream<Resp>>
    where
        M: StateMachine<Input = StreamInput<i64>> + Send + 'static,
        M::Output: Send + 'static,
        I: Inbound<i64> + 'static,
        Resp: Send + 'static,
        F: Fn(M::Output) -> Resp + Send + 'static,
    {
        let (sender, receiver) = mpsc::channel(self.driver.outbound_buffer());
        let driver = self.driver;
        let span = session.call().span();

        tokio::spawn(
            async move {
                let mut outbound = GrpcOutbound::new(sender, wrap);
                if let Err(error) = driver
                    .bidi_stream(&mut session, &mut inbound, &mut outbound)
                    .await
                {
                    outbound.fail(error).await;
                }
            }
            .instrument(span),
        );

        Response::new(ReceiverStream::new(receiver))
    }
}

#[tonic::async_trait]
impl CalculatorService for CalculatorServiceImpl {
    type PrimeFactorizationStream = ResponseStream<PrimeFactorizationResponse>;
    type PerfectNumbersInRangeStream = ResponseStream<PerfectNumbersInRangeResponse>;
    type FindMaximumStream = ResponseStream<FindMaximumResponse>;
    type FindMinimumStream = ResponseStream<FindMinimumResponse>;

    async fn sum(&self, request: Request<SumRequest>) -> Result<Response<SumResponse>, Status> {
        let req = request.into_inner();
        let mut call = Call::new(Operation::Sum);

        let sum_result = call.span().in_scope(|| {
            debug!(first = req.first_number, second = req.second_number, "Sum request");
            self.driver
                .unary(&mut call, || operation::sum(req.first_number, req.second_number))
        })?;

        Ok(Response::new(SumResponse { sum_result }))
    }

    async fn add(&self, request: Request<AddRequest>) -> Result<Response<AddResponse>, Status> {
        let req = request.into_inner();
        let mut call = Call::new(Operation::Add);

        let sum_result = call.span().in_scope(|| {
            debug!(first = req.first_number, second = req.second_number, "Add request");
            self.driver
                .unary(&mut call, || operation::add(req.first_number, req.second_number))
        })?;

        Ok(Response::new(AddResponse { sum_result }))
    }

    async fn square_root(
        &self,
        request: Request<SquareRootRequest>,
    ) -> Result<Response<SquareRootResponse>, Status> {
        let req = request.into_inner();
        let mut call = Call::new(Operation::SquareRoot);

        let square_root = call.span().in_scope(|| {
            debug!(number = req.number, "SquareRoot request");
            self.driver.unary(&mut call, || operation::square_root(req.number))
        })?;

        Ok(Response::new(SquareRootResponse { square_root }))
    }

    async fn prime_factorization(
        &self,
        request: Request<PrimeFactorizationRequest>,
    ) -> Result<Response<Self::PrimeFactorizationStream>, Status> {
        let req = request.into_inner();
        let call = Call::new(Operation::PrimeFactorization);

        debug!(call_id = %call.id(), number = req.prime_factor, "PrimeFactorization request");

        Ok(self.spawn_server_stream(
            call,
            operation::prime_factors(req.prime_factor),
            |number| PrimeFactorizationResponse { number },
        ))
    }

    async fn perfect_numbers_in_range(
        &self,
        request: Request<PerfectNumbersInRangeRequest>,
    ) -> Result<Response<Self::PerfectNumbersInRangeStream>, Status> {
        let req = request.into_inner();
        let call = Call::new(Operation::PerfectNumbersInRange);

        debug!(call_id = %call.id(), min = req.min, max = req.max, "PerfectNumbersInRange request");

        Ok(self.spawn_server_stream(
            call,
            operation::perfect_numbers_in_range(req.min, req.max),
            |perfect_number| PerfectNumbersInRangeResponse { perfect_number },
        ))
    }

    async fn compute_average(
        &self,
        request: Request<Streaming<ComputeAverageRequest>>,
    ) -> Result<Response<ComputeAverageResponse>, Status> {
        let mut session = Session::new(Call::new(Operation::ComputeAverage), AverageMachine::new());
        let mut inbound =
            GrpcInbound::new(request.into_inner(), |req: ComputeAverageRequest| req.number);
        let span = session.call().span();

        let average = self
            .driver
            .client_stream(&mut session, &mut inbound)
            .instrument(span)
            .await?;

        Ok(Response::new(ComputeAverageResponse { average }))
    }

    async fn running_total(
        &self,
        request: Request<Streaming<RunningTotalRequest>>,
    ) -> Result<Response<RunningTotalResponse>, Status> {
        let mut session = Session::new(Call::new(Operation::RunningTotal), TotalMachine::new());
        let mut inbound =
            GrpcInbound::new(request.into_inner(), |req: RunningTotalRequest| req.number);
        let span = session.call().span();

        let total = self
            .driver
            .client_stream(&mut session, &mut inbound)
            .instrument(span)
            .await?;

        Ok(Response::new(RunningTotalResponse { total }))
    }

    async fn find_maximum(
        &self,
        request: Request<Streaming<FindMaximumRequest>>,
    ) -> Result<Response<Self::FindMaximumStream>, Status> {
        let session = Session::new(Call::new(Operation::FindMaximum), MaximumMachine::new());
        let inbound = GrpcInbound::new(request.into_inner(), |req: FindMaximumRequest| req.number);

        Ok(self.spawn_bidi_stream(session, inbound, |maximum| FindMaximumResponse {
            maximum,
        }))
    }

    async fn find_minimum(
        &self,
        request: Request<Streaming<FindMinimumRequest>>,
    ) -> Result<Response<Self::FindMinimumStream>, Status> {
        let session = Session::new(Call::new(Operation::FindMinimum), MinimumMachine::new());
        let inbound = GrpcInbound::new(request.into_inner(), |req: FindMinimumRequest| req.number);

        Ok(self.spawn_bidi_stream(session, inbound, |minimum| FindMinimumResponse {
            minimum,
        }))
    }
}
