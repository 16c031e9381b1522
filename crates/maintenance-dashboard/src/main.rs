mod bootstrap;
mod report;

use std::sync::Arc;

use anyhow::Result;
use maintenance_core::settings::Settings;
use maintenance_data::analysis::analyze_source;
use maintenance_data::reader::{JsonRecordSource, RecordSource};
use maintenance_runtime::orchestrator::{DashboardUpdate, RefreshOrchestrator};

use crate::report::OutputFormat;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load();

    bootstrap::ensure_directories()?;
    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_ref())?;

    tracing::info!("Maintenance Dashboard v{} starting", env!("CARGO_PKG_VERSION"));

    let data_path = settings.resolved_data_path();
    let format = OutputFormat::from_setting(&settings.format);
    let source: Arc<dyn RecordSource> = Arc::new(JsonRecordSource::new(&data_path));
    tracing::info!(source = %source.describe(), "using record source");

    if settings.once {
        let update = single_update(source.as_ref());
        println!("{}", report::render(&update, format)?);
        return Ok(());
    }

    tracing::info!(
        refresh_rate = settings.refresh_rate,
        cache_ttl = settings.cache_ttl,
        "starting periodic refresh"
    );

    let orchestrator = RefreshOrchestrator::new(settings.refresh_rate, settings.cache_ttl, source);
    let (mut rx, handle) = orchestrator.start();

    loop {
        tokio::select! {
            update = rx.recv() => {
                let Some(update) = update else {
                    tracing::warn!("refresh loop ended unexpectedly");
                    break;
                };
                println!("{}", report::render(&update, format)?);
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Ctrl+C received; shutting down refresh task");
                break;
            }
        }
    }

    handle.abort();
    Ok(())
}

/// Build one update; a load failure becomes the empty state with its error.
fn single_update(source: &dyn RecordSource) -> DashboardUpdate {
    match analyze_source(source) {
        Ok(snapshot) => DashboardUpdate {
            snapshot: Some(snapshot),
            error: None,
            refresh_count: 1,
        },
        Err(e) => {
            tracing::error!(source = %source.describe(), error = %e, "failed to load maintenance records");
            DashboardUpdate {
                snapshot: None,
                error: Some(e.to_string()),
                refresh_count: 1,
            }
        }
    }
}
