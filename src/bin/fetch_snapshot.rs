use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::info;

use fpl_dashboard::aggregate::build_snapshot_with_bootstrap;
use fpl_dashboard::config::{Settings, is_manual_run, load_dotenv};
use fpl_dashboard::fake_source::FakeFpl;
use fpl_dashboard::fpl_api::{FplHttp, FplSource};
use fpl_dashboard::logging::init_logging;
use fpl_dashboard::schedule::should_publish;
use fpl_dashboard::snapshot::write_snapshot_file;

fn main() -> Result<()> {
    load_dotenv();
    init_logging();

    let mut settings = Settings::from_env();
    if let Some(path) = parse_path_arg("--out") {
        settings.snapshot_path = path;
    }
    let force = std::env::args().skip(1).any(|arg| arg == "--force");

    match parse_path_arg("--offline") {
        Some(dir) => {
            let source = FakeFpl::from_dir(&dir).context("load offline fpl data")?;
            run(&source, &settings, force)
        }
        None => {
            let source = FplHttp::new(&settings)?;
            run(&source, &settings, force)
        }
    }
}

fn run(source: &impl FplSource, settings: &Settings, force: bool) -> Result<()> {
    let now = Utc::now();
    let bootstrap = source.bootstrap().context("error fetching bootstrap data")?;

    let Some(reason) = should_publish(now, &bootstrap.events, force || is_manual_run()) else {
        println!("Skipping update: not a 6-hour mark and no recent deadline");
        return Ok(());
    };
    info!(%reason, "update proceeding");

    let snapshot = build_snapshot_with_bootstrap(source, &bootstrap, settings, now)?;
    write_snapshot_file(&settings.snapshot_path, &snapshot)?;

    println!("Snapshot written: {}", settings.snapshot_path.display());
    println!("Gameweek: {}", snapshot.meta.gameweek);
    println!("League: {}", snapshot.meta.league_name);
    println!(
        "Managers: {}/{}",
        snapshot.squads.len(),
        snapshot.standings.len()
    );
    Ok(())
}

fn parse_path_arg(flag: &str) -> Option<PathBuf> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let prefix = format!("{flag}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(path) = arg.strip_prefix(&prefix) {
            let trimmed = path.trim();
            if !trimmed.is_empty() {
                return Some(PathBuf::from(trimmed));
            }
        }
        if arg == flag {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() {
                return Some(PathBuf::from(next));
            }
        }
    }
    None
}
