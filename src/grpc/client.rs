use async_stream::stream;
use futures::{Stream, TryStreamExt};
use tonic::transport::Channel;
use tracing::{debug, info};

use crate::call::error::CallError;
use crate::calculator_proto::calculator_service_client::CalculatorServiceClient;
use crate::calculator_proto::{
    AddRequest, ComputeAverageRequest, FindMaximumRequest, FindMinimumRequest,
    PerfectNumbersInRangeRequest, PrimeFactorizationRequest, RunningTotalRequest,
    SquareRootRequest, SumRequest,
};
use crate::config::ClientConfig;
use crate::driver::Pacing;

/// Drives each calculator RPC from the calling side.
///
/// Streaming requests are generated lazily from the given numbers, paced by
/// [`ClientConfig::pacing`]. Streaming responses are collected in arrival order. A status
/// reported by the server is mapped back to a [`CallError`] with the same
/// [`ErrorKind`](crate::call::ErrorKind).
///
/// # Example
///
/// ```ignore
/// let config = ClientConfig::builder().endpoint("http://[::1]:50051").build();
/// let mut client = CalculatorClient::connect(config).await?;
///
/// let maxima = client.find_maximum(vec![2, 6, 1, 9, 2, 8, 5]).await?;
/// assert_eq!(maxima, vec![2, 6, 9]);
/// ```
#[derive(Debug, Clone)]
pub struct CalculatorClient {
    inner: CalculatorServiceClient<Channel>,
    pacing: Pacing,
}

impl CalculatorClient {
    pub async fn connect(config: ClientConfig) -> Result<Self, tonic::transport::Error> {
        info!(endpoint = %config.endpoint, "Connecting to calculator");

        let inner = CalculatorServiceClient::connect(config.endpoint).await?;
        Ok(Self::new(inner, Pacing::new(config.pacing)))
    }

    pub fn new(inner: CalculatorServiceClient<Channel>, pacing: Pacing) -> Self {
        Self { inner, pacing }
    }

    pub async fn sum(&mut self, first_number: i64, second_number: i64) -> Result<i64, CallError> {
        let response = self
            .inner
            .sum(SumRequest {
                first_number,
                second_number,
            })
            .await?;
        Ok(response.into_inner().sum_result)
    }

    pub async fn add(&mut self, first_number: i64, second_number: i64) -> Result<i64, CallError> {
        let response = self
            .inner
            .add(AddRequest {
                first_number,
                second_number,
            })
            .await?;
        Ok(response.into_inner().sum_result)
    }

    pub async fn square_root(&mut self, number: f64) -> Result<f64, CallError> {
        let response = self.inner.square_root(SquareRootRequest { number }).await?;
        Ok(response.into_inner().square_root)
    }

    pub async fn prime_factorization(&mut self, prime_factor: i64) -> Result<Vec<i64>, CallError> {
        let response = self
            .inner
            .prime_factorization(PrimeFactorizationRequest { prime_factor })
            .await?;

        let factors: Vec<i64> = response
            .into_inner()
            .map_ok(|resp| resp.number)
            .try_collect()
            .await?;
        Ok(factors)
    }

    pub async fn perfect_numbers_in_range(
        &mut self,
        min: i64,
        max: i64,
    ) -> Result<Vec<i64>, CallError> {
        let response = self
            .inner
            .perfect_numbers_in_range(PerfectNumbersInRangeRequest { min, max })
            .await?;

        let perfect: Vec<i64> = response
            .into_inner()
            .map_ok(|resp| resp.perfect_number)
            .try_collect()
            .await?;
        Ok(perfect)
    }

    pub async fn compute_average(&mut self, numbers: Vec<i64>) -> Result<f64, CallError> {
        let requests = paced_requests(numbers, self.pacing, |number| ComputeAverageRequest {
            number,
        });
        let response = self.inner.compute_average(requests).await?;
        Ok(response.into_inner().average)
    }

    pub async fn running_total(&mut self, numbers: Vec<i64>) -> Result<i64, CallError> {
        let requests = paced_requests(numbers, self.pacing, |number| RunningTotalRequest {
            number,
        });
        let response = self.inner.running_total(requests).await?;
        Ok(response.into_inner().total)
    }

    /// Responses are read while requests are still being sent.
    pub async fn find_maximum(&mut self, numbers: Vec<i64>) -> Result<Vec<i64>, CallError> {
        let requests = paced_requests(numbers, self.pacing, |number| FindMaximumRequest {
            number,
        });
        let response = self.inner.find_maximum(requests).await?;

        let maxima: Vec<i64> = response
            .into_inner()
            .map_ok(|resp| resp.maximum)
            .try_collect()
            .await?;
        Ok(maxima)
    }

    /// Responses are read while requests are still being sent.
    pub async fn find_minimum(&mut self, numbers: Vec<i64>) -> Result<Vec<i64>, CallError> {
        let requests = paced_requests(numbers, self.pacing, |number| FindMinimumRequest {
            number,
        });
        let response = self.inner.find_minimum(requests).await?;

        let minima: Vec<i64> = response
            .into_inner()
            .map_ok(|resp| resp.minimum)
            .try_collect()
            .await?;
        Ok(minima)
    }
}

/// Lazily turn `numbers` into request messages, pausing after each one.
fn paced_requests<Req, F>(
    numbers: Vec<i64>,
    pacing: Pacing,
    wrap: F,
) -> impl Stream<Item = Req> + Send + 'static
where
    Req: Send + 'static,
    F: Fn(i64) -> Req + Send + 'static,
{
    stream! {
        for number in numbers {
            debug!(number, "Sending request");
            yield wrap(number);
            pacing.pause().await;
        }
    }
}
