use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use tracing::{error, info};

use fpl_dashboard::config::{Settings, load_dotenv};
use fpl_dashboard::fake_source::FakeFpl;
use fpl_dashboard::fpl_api::FplHttp;
use fpl_dashboard::logging::init_logging;
use fpl_dashboard::server::{AppState, SharedSource, serve};

#[tokio::main]
async fn main() -> ExitCode {
    load_dotenv();
    init_logging();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let settings = Settings::from_env();
    let source = build_source(&settings)?;
    info!(league_id = settings.league_id, "starting dashboard api");

    let addr = settings.bind_addr;
    serve(AppState::new(settings, source), addr).await;
    Ok(())
}

/// `--offline <dir>` (or `FPL_OFFLINE_DIR`) serves recorded responses instead of the live API.
fn build_source(settings: &Settings) -> Result<SharedSource> {
    let mut args = std::env::args().skip(1);
    let mut offline_dir = std::env::var("FPL_OFFLINE_DIR")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from);
    while let Some(arg) = args.next() {
        if arg == "--offline" {
            offline_dir = args.next().map(PathBuf::from);
        }
    }

    match offline_dir {
        Some(dir) => {
            info!(dir = %dir.display(), "using offline fpl data");
            Ok(Arc::new(FakeFpl::from_dir(&dir)?))
        }
        None => Ok(Arc::new(FplHttp::new(settings)?)),
    }
}
