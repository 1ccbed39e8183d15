//! Tracing subscriber initialization with structured logging and optional
//! OpenTelemetry trace export.
//!
//! # Usage
//!
//! ```no_run
//! // Warnings only, unless RUST_LOG says otherwise
//! etlas_observe::init_tracing(0, false).unwrap();
//!
//! // Debug output plus OpenTelemetry spans on stdout
//! etlas_observe::init_tracing(2, true).unwrap();
//! ```

use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::trace::SdkTracerProvider;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use std::sync::OnceLock;

/// Stores the OTel tracer provider so it can be shut down cleanly on exit.
static TRACER_PROVIDER: OnceLock<SdkTracerProvider> = OnceLock::new();

/// Filter directive for a `-v` count: 0 warn, 1 info, 2 debug, 3+ trace.
///
/// Only the workspace crates are raised; dependencies stay at `warn`.
pub fn verbosity_directive(verbosity: u8) -> String {
    let level = match verbosity {
        0 => return "warn".to_string(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    ["etlas", "etlas_core", "etlas_infra", "etlas_api"]
        .iter()
        .fold("warn".to_string(), |directive, target| {
            format!("{directive},{target}={level}")
        })
}

/// Initialize the global tracing subscriber.
///
/// - Installs a structured `fmt` layer on stderr with span close timing, so
///   command output on stdout stays clean.
/// - `RUST_LOG`, when set, wins over `verbosity`.
/// - When `enable_otel` is true, additionally bridges tracing spans to
///   OpenTelemetry using a stdout exporter.
///
/// # Errors
///
/// Returns an error if the global subscriber has already been set.
pub fn init_tracing(verbosity: u8, enable_otel: bool) -> Result<(), Box<dyn std::error::Error>> {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity_directive(verbosity)));

    if enable_otel {
        let provider = SdkTracerProvider::builder()
            .with_simple_exporter(opentelemetry_stdout::SpanExporter::default())
            .build();
        let tracer = provider.tracer("etlas");
        let otel_layer = tracing_opentelemetry::layer().with_tracer(tracer);

        let _ = TRACER_PROVIDER.set(provider.clone());
        opentelemetry::global::set_tracer_provider(provider);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .with(otel_layer)
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()?;
    }

    Ok(())
}

/// Flush pending traces and shut down the OpenTelemetry tracer provider.
///
/// No-op when OTel was not enabled.
pub fn shutdown_tracing() {
    if let Some(provider) = TRACER_PROVIDER.get() {
        if let Err(e) = provider.shutdown() {
            eprintln!("Warning: OTel tracer provider shutdown error: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_by_default() {
        assert_eq!(verbosity_directive(0), "warn");
    }

    #[test]
    fn verbose_raises_workspace_crates_only() {
        let directive = verbosity_directive(2);
        assert!(directive.starts_with("warn,"));
        assert!(directive.contains("etlas_core=debug"));
        assert!(directive.contains("etlas_infra=debug"));
        assert!(!directive.contains("sqlx"));
    }

    #[test]
    fn directives_parse() {
        for verbosity in 0..5 {
            assert!(EnvFilter::try_new(verbosity_directive(verbosity)).is_ok());
        }
    }
}
