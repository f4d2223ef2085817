pub mod client;
pub mod server;

pub use self::client::CalculatorClient;
pub use self::server::{CalculatorServiceImpl, serve_listener, start_server};
pub use crate::calculator_proto::calculator_service_client::CalculatorServiceClient;
pub use crate::calculator_proto::calculator_service_server::CalculatorServiceServer;
