use balance_sync_core::adapters::config::{
    app_config::AppConfig, telemetry_config::TelemetryConfig,
};
use balance_sync_core::application::shutdown::shutdown_channel;
use balance_sync_core::prettyprint::prettyprint::PrettyFormatter;
use indicatif::ProgressStyle;
use opentelemetry::KeyValue;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::trace as sdktrace;
use opentelemetry_sdk::Resource;
use std::env;
use std::process::ExitCode;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use tracing_indicatif::IndicatifLayer;
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Registry};

mod application_service_factory;
mod cli_adapter;

use application_service_factory::ApplicationServiceFactory;
use cli_adapter::CliAdapter;

#[tokio::main]
#[instrument]
async fn main() -> anyhow::Result<ExitCode> {
    let config = AppConfig::load().map_err(|report| anyhow::anyhow!("{report:?}"))?;

    setup_tracing(&config.telemetry)?;
    setup_panic_hook();

    let args: Vec<String> = env::args().collect();

    info!("Starting balance-sync runner ({})", config.schedule.cron);

    let (shutdown_tx, shutdown_rx) = shutdown_channel();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("🛑 Ctrl-C received, stopping after cleanup");
            let _ = shutdown_tx.send(true);
        }
    });

    let app_service = ApplicationServiceFactory::create(&config, shutdown_rx.clone())
        .map_err(|report| anyhow::anyhow!("{report:?}"))?;
    let cli_adapter = Arc::new(CliAdapter::new(app_service, shutdown_rx));

    let exit_code = match cli_adapter.run(args).await {
        Ok(output) if output.success => {
            info!("CLI execution completed successfully");
            ExitCode::SUCCESS
        }
        Ok(_) => ExitCode::FAILURE,
        Err(e) => {
            error!("CLI execution failed: {:?}", e);
            ExitCode::FAILURE
        }
    };

    opentelemetry::global::shutdown_tracer_provider();
    Ok(exit_code)
}

fn setup_tracing(telemetry: &TelemetryConfig) -> anyhow::Result<()> {
    let level = tracing::Level::from_str(&telemetry.level).unwrap_or(tracing::Level::INFO);

    let indicatif_layer = IndicatifLayer::new().with_progress_style(
        ProgressStyle::with_template(
            "{span_child_prefix}{spinner:.cyan} {span_name}{{{span_fields}}} [{elapsed}]",
        )?
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ "),
    );

    let stdout_layer = tracing_subscriber::fmt::layer()
        .event_format(PrettyFormatter::new(true))
        .with_writer(indicatif_layer.get_stderr_writer());

    let log_file_layer = telemetry
        .log_file
        .as_ref()
        .map(std::fs::File::create)
        .transpose()?
        .map(|file| {
            tracing_subscriber::fmt::layer()
                .event_format(PrettyFormatter::new(false))
                .with_writer(file)
                .with_ansi(false)
        });

    let otel_layer = match &telemetry.otlp_endpoint {
        Some(endpoint) => {
            let exporter = opentelemetry_otlp::new_exporter()
                .tonic()
                .with_endpoint(endpoint.clone());

            let tracer = opentelemetry_otlp::new_pipeline()
                .tracing()
                .with_exporter(exporter)
                .with_trace_config(sdktrace::config().with_resource(Resource::new(vec![
                    KeyValue::new("service.name", telemetry.service_name.clone()),
                ])))
                .install_batch(opentelemetry_sdk::runtime::Tokio)?;

            Some(OpenTelemetryLayer::new(tracer))
        }
        None => None,
    };

    Registry::default()
        .with(
            tracing_subscriber::filter::Targets::new()
                .with_target("balance_sync", level)
                .with_target("balance_sync_core", level),
        )
        .with(otel_layer)
        .with(indicatif_layer)
        .with(log_file_layer)
        .with(stdout_layer)
        .init();

    Ok(())
}

fn setup_panic_hook() {
    tracing::trace!("Setting panic hook");
    std::panic::set_hook(Box::new(|info| {
        tracing::error!("panic: {info}");
        opentelemetry::global::shutdown_tracer_provider();
    }));
}
