use crate::bootstrap::BootstrapStep;
use opentelemetry::{KeyValue, global, trace::TracerProvider};
use opentelemetry_otlp::{Protocol, WithExportConfig};
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::metrics::{PeriodicReader, SdkMeterProvider};
use opentelemetry_sdk::trace::SdkTracerProvider;
use std::env;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const SERVICE_NAME: &str = "asr";

pub struct TelemetryProviders {
    otlp: Option<(SdkTracerProvider, SdkMeterProvider)>,
}

/// Installs the fmt subscriber, plus OTLP traces and metrics when
/// `OTLP_ENDPOINT` is set.
pub fn setup() -> color_eyre::Result<TelemetryProviders> {
    let Ok(otlp_endpoint) = env::var("OTLP_ENDPOINT") else {
        tracing_subscriber::registry()
            .with(EnvFilter::from_default_env())
            .with(tracing_subscriber::fmt::layer())
            .init();
        return Ok(TelemetryProviders { otlp: None });
    };

    let tracer_exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(&otlp_endpoint)
        .with_protocol(Protocol::Grpc)
        .build()?;

    let tracer_provider = SdkTracerProvider::builder()
        .with_batch_exporter(tracer_exporter)
        .with_resource(resource())
        .build();

    global::set_tracer_provider(tracer_provider.clone());

    let tracer = tracer_provider.tracer("asr-tracer");
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_opentelemetry::layer().with_tracer(tracer))
        .init();

    let metric_exporter = opentelemetry_otlp::MetricExporter::builder()
        .with_tonic()
        .with_endpoint(&otlp_endpoint)
        .with_protocol(Protocol::Grpc)
        .build()?;

    let reader = PeriodicReader::builder(metric_exporter)
        .with_interval(Duration::from_secs(10))
        .build();

    let meter_provider = SdkMeterProvider::builder()
        .with_resource(resource())
        .with_reader(reader)
        .build();

    global::set_meter_provider(meter_provider.clone());

    info!("otel setup completed");
    Ok(TelemetryProviders {
        otlp: Some((tracer_provider, meter_provider)),
    })
}

fn resource() -> Resource {
    Resource::builder().with_service_name(SERVICE_NAME).build()
}

pub fn on_shutdown(providers: TelemetryProviders) -> color_eyre::Result<()> {
    if let Some((tracer_provider, meter_provider)) = providers.otlp {
        tracer_provider.shutdown()?;
        meter_provider.shutdown()?;
    }
    Ok(())
}

fn result_label(success: bool) -> KeyValue {
    KeyValue::new("result", if success { "success" } else { "failure" })
}

pub fn send_bucket_probe_status(driver: &'static str, success: bool) {
    let counter = global::meter("asr")
        .u64_counter("bucket_probe_status")
        .build();
    counter.add(1, &[result_label(success), KeyValue::new("driver", driver)]);
}

pub fn send_capacity_miss(driver: &'static str, batch_size: u32) {
    let counter = global::meter("asr").u64_counter("capacity_misses").build();
    counter.add(
        1,
        &[
            KeyValue::new("driver", driver),
            KeyValue::new("batch_size", i64::from(batch_size)),
        ],
    );
}

pub fn send_bootstrap_status(step: BootstrapStep, success: bool) {
    let counter = global::meter("asr").u64_counter("bootstrap_status").build();
    counter.add(
        1,
        &[result_label(success), KeyValue::new("step", step.to_string())],
    );
}
