pub mod logging;
pub mod trace_context;

pub use logging::{init_tracing, shutdown_tracing};
pub use trace_context::outbound_trace_headers;
