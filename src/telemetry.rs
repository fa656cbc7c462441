//! OpenTelemetry tracing export
//!
//! Spans are exported over OTLP/gRPC to the collector named by
//! `OTEL_EXPORTER_OTLP_ENDPOINT`.

use opentelemetry::KeyValue;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{runtime, trace, Resource};
use tracing::Subscriber;
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::registry::LookupSpan;

const SERVICE_NAME: &str = "revision-operator";

/// Builds the OpenTelemetry layer for `subscriber`.
///
/// Returns `None` when the exporter cannot be installed; logging then
/// continues without trace export.
pub fn init_telemetry<S>(_subscriber: &S) -> Option<OpenTelemetryLayer<S, trace::Tracer>>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    let mut exporter = opentelemetry_otlp::new_exporter().tonic();
    if let Ok(endpoint) = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT") {
        exporter = exporter.with_endpoint(endpoint);
    }

    let resource = Resource::new(vec![
        KeyValue::new("service.name", SERVICE_NAME),
        KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
    ]);

    match opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_exporter(exporter)
        .with_trace_config(trace::config().with_resource(resource))
        .install_batch(runtime::Tokio)
    {
        Ok(tracer) => Some(tracing_opentelemetry::layer().with_tracer(tracer)),
        Err(e) => {
            eprintln!("Failed to install OTLP trace exporter: {e}");
            None
        }
    }
}

/// Flushes pending spans
pub fn shutdown_telemetry() {
    opentelemetry::global::shutdown_tracer_provider();
}
