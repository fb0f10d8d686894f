//! Observability wiring: JSON logs on stderr plus optional OTLP trace export.

use anyhow::Context;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::trace::TracerProvider;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "taskgen=info,nodes=info,llm=info,store=info";

/// Keeps the trace exporter alive; call [`Telemetry::shutdown`] before exit so
/// buffered spans are flushed.
pub struct Telemetry {
    provider: Option<TracerProvider>,
}

impl Telemetry {
    /// Installs the global subscriber.
    ///
    /// Filtering follows `RUST_LOG` when set. Stdout stays reserved for the
    /// command's JSON response.
    ///
    /// # Errors
    ///
    /// Fails if the OTLP exporter cannot be built or a global subscriber is
    /// already installed.
    pub fn init(otlp_endpoint: Option<&str>) -> anyhow::Result<Self> {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
        let fmt_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr);

        let Some(endpoint) = otlp_endpoint else {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt_layer)
                .try_init()
                .context("failed to install tracing subscriber")?;
            return Ok(Self { provider: None });
        };

        let exporter = opentelemetry_otlp::SpanExporter::builder()
            .with_tonic()
            .with_endpoint(endpoint)
            .build()
            .context("failed to build OTLP span exporter")?;
        let provider = TracerProvider::builder()
            .with_batch_exporter(exporter, opentelemetry_sdk::runtime::Tokio)
            .build();
        let tracer = provider.tracer("taskgen");
        opentelemetry::global::set_tracer_provider(provider.clone());

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .with(tracing_opentelemetry::layer().with_tracer(tracer))
            .try_init()
            .context("failed to install tracing subscriber")?;

        Ok(Self {
            provider: Some(provider),
        })
    }

    /// Flushes and stops the trace exporter, if any.
    pub fn shutdown(self) {
        if let Some(provider) = self.provider {
            if let Err(e) = provider.shutdown() {
                tracing::warn!(error = %e, "failed to flush trace exporter");
            }
        }
    }
}
