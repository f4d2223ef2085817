pub mod call;
pub mod config;
pub mod driver;
pub mod grpc;
pub mod operation;
pub mod state_machine;
pub mod transport;

pub mod calculator_proto {
    include!(concat!(env!("OUT_DIR"), "/calculator.rs"));
}

/// Address the server listens on when nothing else is configured.
pub const DEFAULT_ADDR: &str = "[::1]:50051";

/// Endpoint the client dials when nothing else is configured.
pub const DEFAULT_ENDPOINT: &str = "http://[::1]:50051";
