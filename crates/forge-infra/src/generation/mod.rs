//! Text-generation gateway adapters.

mod responses;

pub use responses::{DEFAULT_BASE_URL, GatewayConfig, ResponsesGateway};
