use anyhow::Result;
use std::sync::Arc;
use tokio::sync::{RwLock, broadcast};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;
use watchboard::client::{RequestClient, RequestError};
use watchboard::models::{EndpointMetricSample, MetricSample};
use watchboard::presenter::{BroadcastRenderer, ChartPresenter, RenderFrame};
use watchboard::*;

#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    let app_config = config::AppConfig::load()?;
    let client = Arc::new(
        RequestClient::from_config(&app_config.backend)
            .map_err(|e| anyhow::anyhow!("http client: {}", e))?,
    );

    let samples = fetch_system_metrics(&client, &app_config.backend.metrics_path).await?;
    let endpoint_samples = match &app_config.backend.endpoint_metrics_path {
        Some(path) => fetch_endpoint_metrics(&client, path).await?,
        None => Vec::new(),
    };

    let (frames_tx, _) = broadcast::channel::<RenderFrame>(app_config.charts.broadcast_capacity);
    let presenter = ChartPresenter::new(samples, BroadcastRenderer::new(frames_tx.clone()))
        .with_endpoint_metrics(endpoint_samples)
        .with_no_data_message(&app_config.charts.no_data_message);
    presenter.render_all();
    let presenter = Arc::new(RwLock::new(presenter));

    let app = routes::app(presenter, client, frames_tx);
    let addr = format!("{}:{}", app_config.server.host, app_config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("Server stopped");
    Ok(())
}

/// Metrics are fetched once. A missing base path is fatal; any other failure starts the
/// console with empty charts.
async fn fetch_system_metrics(client: &RequestClient, path: &str) -> Result<Vec<MetricSample>> {
    match client.get_detail::<Vec<MetricSample>>(path).await {
        Ok(samples) => {
            tracing::info!(samples = samples.len(), "system metrics loaded");
            Ok(samples)
        }
        Err(RequestError::Configuration) => Err(RequestError::Configuration.into()),
        Err(e) => {
            tracing::warn!(error = %e, "system metrics unavailable; charts start empty");
            Ok(Vec::new())
        }
    }
}

async fn fetch_endpoint_metrics(
    client: &RequestClient,
    path: &str,
) -> Result<Vec<EndpointMetricSample>> {
    match client.get_detail::<Vec<EndpointMetricSample>>(path).await {
        Ok(samples) => {
            tracing::info!(samples = samples.len(), "endpoint metrics loaded");
            Ok(samples)
        }
        Err(RequestError::Configuration) => Err(RequestError::Configuration.into()),
        Err(e) => {
            tracing::warn!(error = %e, "endpoint metrics unavailable; chart starts empty");
            Ok(Vec::new())
        }
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(s) => s,
                Err(_) => {
                    let _ = tokio::signal::ctrl_c().await;
                    return;
                }
            };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
    tracing::info!("Received shutdown signal");
}
