use anyhow::Context;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use tracing::{info, warn};

use crate::config::WorkflowSettings;
use crate::error::TriggerError;
use crate::http_client::http_client;

/// Asks GitHub Actions to run the snapshot workflow on the configured branch.
pub fn dispatch_workflow(
    workflow: &WorkflowSettings,
    timeout_secs: u64,
) -> Result<(), TriggerError> {
    let Some(token) = workflow.token.as_deref() else {
        return Err(TriggerError::MissingToken);
    };
    let client = http_client(timeout_secs).map_err(TriggerError::Request)?;

    let url = dispatch_url(workflow);
    let resp = client
        .post(&url)
        .header(ACCEPT, "application/vnd.github.v3+json")
        .header(AUTHORIZATION, format!("token {token}"))
        .json(&serde_json::json!({ "ref": workflow.branch }))
        .send()
        .context("request failed")
        .map_err(TriggerError::Request)?;

    let status = resp.status();
    if status == StatusCode::NO_CONTENT {
        info!(workflow = %workflow.workflow_file, branch = %workflow.branch, "workflow dispatched");
        return Ok(());
    }
    let body = resp.text().unwrap_or_default();
    warn!(status = status.as_u16(), "workflow dispatch rejected");
    Err(TriggerError::Upstream {
        status: status.as_u16(),
        body,
    })
}

pub fn dispatch_url(workflow: &WorkflowSettings) -> String {
    format!(
        "{}/repos/{}/{}/actions/workflows/{}/dispatches",
        workflow.api_base, workflow.owner, workflow.repo, workflow.workflow_file
    )
}
