//! Structured Logging
//!
//! Tracing setup for the service plus small helpers that emit request and
//! lifecycle events with consistent field names.

use {
    crate::config::LogFormat,
    crate::error::ValidationFailure,
    std::sync::atomic::{AtomicU64, Ordering},
    std::time::{Duration, SystemTime, UNIX_EPOCH},
    tracing::{debug, info, span, warn, Level, Span},
    tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter},
    uuid::Uuid,
};

/// Initialize the tracing subscriber.
///
/// `RUST_LOG` takes precedence over the built-in filter.
pub fn init_tracing(format: LogFormat) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("person_service=info,warp=info"));

    match format {
        LogFormat::Json => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(true);

            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt_layer)
                .init();
        }
        LogFormat::Pretty => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .with_level(true)
                .with_ansi(true);

            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt_layer)
                .init();
        }
    }

    info!(format = ?format, "Tracing initialized");
}

static REQUEST_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Short, roughly ordered id: millisecond timestamp plus a wrapping counter.
pub fn generate_request_id() -> String {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64;

    let counter = REQUEST_COUNTER.fetch_add(1, Ordering::Relaxed);

    format!("{:x}-{:04x}", timestamp, counter % 0x10000)
}

/// Globally unique id for a server instance.
pub fn generate_instance_id() -> String {
    Uuid::new_v4().to_string()
}

/// Span wrapping one request, carrying its id.
pub fn request_span(method: &str, route: &str, request_id: &str) -> Span {
    span!(
        Level::INFO,
        "request",
        method = %method,
        route = %route,
        request_id = %request_id,
    )
}

/// Log that a request reached its handler.
pub fn log_request_received(route: &str) {
    debug!(route = %route, event = "request_received", "Received request");
}

/// Log a request that passed validation, with its handling time.
pub fn log_request_validated(route: &str, duration: Duration) {
    info!(
        route = %route,
        duration_us = duration.as_micros() as u64,
        event = "request_validated",
        "Request accepted"
    );
}

/// Log a rejected request and the dotted paths of its violations.
pub fn log_validation_failure(route: &str, failure: &ValidationFailure, duration: Duration) {
    let fields: Vec<String> = failure.violations().iter().map(|v| v.path()).collect();
    warn!(
        route = %route,
        violations = failure.len(),
        fields = ?fields,
        duration_us = duration.as_micros() as u64,
        event = "validation_failure",
        "Request rejected"
    );
}

/// Log a request refused by routing or body limits.
pub fn log_rejection(status: u16, reason: &str) {
    debug!(
        status = status,
        reason = %reason,
        event = "request_rejected",
        "Request rejected before validation"
    );
}

/// Log the address about to be bound.
pub fn log_server_startup(addr: &str, instance_id: &str) {
    info!(
        address = %addr,
        instance_id = %instance_id,
        event = "server_startup",
        "Starting person service"
    );
}

/// Log that the listener is bound and serving.
pub fn log_server_ready(addr: &str) {
    info!(
        address = %addr,
        event = "server_ready",
        "Person service ready and listening"
    );
}

/// Log the end of graceful shutdown.
pub fn log_server_shutdown() {
    info!(event = "server_shutdown", "Person service shutting down");
}
