//! W3C trace-context headers for outbound HTTP calls.

use opentelemetry::trace::TraceContextExt;
use reqwest::header::{HeaderMap, HeaderValue};
use tracing::Span;
use tracing_opentelemetry::OpenTelemetrySpanExt;

pub const TRACEPARENT_HEADER: &str = "traceparent";
pub const TRACESTATE_HEADER: &str = "tracestate";

/// Headers carrying the current span's trace context.
///
/// Empty when no OTLP layer is installed or the current span is not
/// sampled into a valid trace.
pub fn outbound_trace_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();

    let context = Span::current().context();
    let otel_span = context.span();
    let span_context = otel_span.span_context();
    if !span_context.is_valid() {
        return headers;
    }

    let traceparent = format!(
        "00-{}-{}-{:02x}",
        span_context.trace_id(),
        span_context.span_id(),
        span_context.trace_flags().to_u8()
    );
    if let Ok(value) = HeaderValue::from_str(&traceparent) {
        headers.insert(TRACEPARENT_HEADER, value);
    }

    let trace_state = span_context.trace_state().header();
    if !trace_state.is_empty() {
        if let Ok(value) = HeaderValue::from_str(&trace_state) {
            headers.insert(TRACESTATE_HEADER, value);
        }
    }

    headers
}
