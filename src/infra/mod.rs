pub mod error;
pub mod http;
pub mod notion;
pub mod telemetry;
