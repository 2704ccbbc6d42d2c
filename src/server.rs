//! HTTP surface: refresh the snapshot on demand, serve the last one, and
//! forward the manual update trigger.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{error, info};
use warp::Filter;
use warp::http::StatusCode;
use warp::reply::{Json, WithStatus};

use crate::aggregate::build_snapshot;
use crate::config::Settings;
use crate::fpl_api::FplSource;
use crate::snapshot::Snapshot;
use crate::trigger::dispatch_workflow;

pub type SharedSource = Arc<dyn FplSource + Send + Sync>;

pub struct AppState {
    pub settings: Settings,
    source: SharedSource,
    current: RwLock<Option<Arc<Snapshot>>>,
}

impl AppState {
    pub fn new(settings: Settings, source: SharedSource) -> Arc<Self> {
        Arc::new(Self {
            settings,
            source,
            current: RwLock::new(None),
        })
    }

    pub async fn current(&self) -> Option<Arc<Snapshot>> {
        self.current.read().await.clone()
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

#[derive(Debug, Serialize)]
struct MessageBody<'a> {
    message: &'a str,
}

pub fn routes(
    state: Arc<AppState>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let state_filter = warp::any().map(move || state.clone());

    let refresh = warp::path!("api" / "refresh-data")
        .and(warp::get())
        .and(state_filter.clone())
        .and_then(handle_refresh);

    let snapshot = warp::path!("api" / "snapshot")
        .and(warp::get())
        .and(state_filter.clone())
        .and_then(handle_snapshot);

    let trigger = warp::path!("api" / "trigger-update")
        .and(warp::post())
        .and(state_filter)
        .and_then(handle_trigger);

    let health = warp::path!("health")
        .and(warp::get())
        .map(|| warp::reply::json(&serde_json::json!({ "status": "ok" })));

    refresh
        .or(snapshot)
        .or(trigger)
        .or(health)
        .with(warp::trace::request())
}

pub async fn serve(state: Arc<AppState>, addr: SocketAddr) {
    info!(%addr, "serving dashboard api");
    warp::serve(routes(state)).run(addr).await;
}

async fn handle_refresh(state: Arc<AppState>) -> Result<WithStatus<Json>, Infallible> {
    let worker = state.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        build_snapshot(worker.source.as_ref(), &worker.settings, Utc::now())
    })
    .await;

    let snapshot = match outcome {
        Ok(Ok(snapshot)) => Arc::new(snapshot),
        Ok(Err(err)) => {
            error!("snapshot failed: {err}");
            return Ok(error_reply(
                "Failed to fetch FPL data",
                Some(err.to_string()),
                err.status(),
            ));
        }
        Err(err) => {
            error!("snapshot task aborted: {err}");
            return Ok(error_reply(
                "Failed to fetch FPL data",
                Some(err.to_string()),
                500,
            ));
        }
    };

    info!(
        gameweek = snapshot.meta.gameweek,
        squads = snapshot.squads.len(),
        "snapshot refreshed"
    );
    *state.current.write().await = Some(snapshot.clone());
    Ok(warp::reply::with_status(
        warp::reply::json(snapshot.as_ref()),
        StatusCode::OK,
    ))
}

async fn handle_snapshot(state: Arc<AppState>) -> Result<WithStatus<Json>, Infallible> {
    match state.current().await {
        Some(snapshot) => Ok(warp::reply::with_status(
            warp::reply::json(snapshot.as_ref()),
            StatusCode::OK,
        )),
        None => Ok(error_reply(
            "No snapshot available",
            Some("call /api/refresh-data first".to_string()),
            404,
        )),
    }
}

async fn handle_trigger(state: Arc<AppState>) -> Result<WithStatus<Json>, Infallible> {
    let worker = state.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        dispatch_workflow(&worker.settings.workflow, worker.settings.request_timeout_secs)
    })
    .await;

    match outcome {
        Ok(Ok(())) => Ok(warp::reply::with_status(
            warp::reply::json(&MessageBody {
                message: "Update triggered successfully",
            }),
            StatusCode::OK,
        )),
        Ok(Err(err)) => {
            error!("update trigger failed: {err}");
            Ok(error_reply(&err.reply_message(), None, err.status()))
        }
        Err(err) => {
            error!("update trigger task aborted: {err}");
            Ok(error_reply("Internal Server Error", None, 500))
        }
    }
}

fn error_reply(error: &str, details: Option<String>, status: u16) -> WithStatus<Json> {
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    warp::reply::with_status(warp::reply::json(&ErrorBody { error, details }), status)
}
