use anyhow::{Result, bail};
use calculator_rpc::call::ErrorKind;
use calculator_rpc::config::ClientConfig;
use calculator_rpc::grpc::CalculatorClient;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const SAMPLE: [i64; 7] = [2, 6, 1, 9, 2, 8, 5];

const DEMOS: [&str; 9] = [
    "sum",
    "add",
    "square-root",
    "prime-factorization",
    "perfect-numbers",
    "compute-average",
    "running-total",
    "find-maximum",
    "find-minimum",
];

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let selected = std::env::args().nth(1).unwrap_or_else(|| "all".to_string());
    let demos: Vec<&str> = match selected.as_str() {
        "all" => DEMOS.to_vec(),
        name if DEMOS.contains(&name) => vec![name],
        other => bail!("unknown demo '{other}', expected one of: all, {}", DEMOS.join(", ")),
    };

    let config = ClientConfig::from_env()?;
    let mut client = CalculatorClient::connect(config).await?;

    for demo in demos {
        run_demo(&mut client, demo).await;
    }

    Ok(())
}

/// Run one demonstration call, logging its outcome. A failed call does not stop the others.
async fn run_demo(client: &mut CalculatorClient, demo: &str) {
    info!(demo, "Request ------------->");

    let outcome = match demo {
        "sum" => client.sum(10, 20).await.map(|r| format!("sum_result: {r}")),
        "add" => client.add(30, 40).await.map(|r| format!("sum_result: {r}")),
        "square-root" => client
            .square_root(25.0)
            .await
            .map(|r| format!("square_root: {r}")),
        "prime-factorization" => client
            .prime_factorization(40)
            .await
            .map(|r| format!("numbers: {r:?}")),
        "perfect-numbers" => client
            .perfect_numbers_in_range(1, 1000)
            .await
            .map(|r| format!("perfect_numbers: {r:?}")),
        "compute-average" => client
            .compute_average(SAMPLE.to_vec())
            .await
            .map(|r| format!("average: {r}")),
        "running-total" => client
            .running_total(SAMPLE.to_vec())
            .await
            .map(|r| format!("total: {r}")),
        "find-maximum" => client
            .find_maximum(SAMPLE.to_vec())
            .await
            .map(|r| format!("maxima: {r:?}")),
        "find-minimum" => client
            .find_minimum(SAMPLE.to_vec())
            .await
            .map(|r| format!("minima: {r:?}")),
        _ => return,
    };

    match outcome {
        Ok(response) => info!(demo, %response, "Response <-------------"),
        Err(e) if e.kind() == ErrorKind::InvalidArgument => {
            error!(demo, error = %e, "Invalid argument error")
        }
        Err(e) => error!(demo, kind = ?e.kind(), error = %e, "Call failed"),
    }
}
