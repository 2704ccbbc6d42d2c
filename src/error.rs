use thiserror::Error;

/// Fatal snapshot failures. Optional sources never surface here.
#[derive(Debug, Error)]
pub enum AggregateError {
    #[error("failed to fetch bootstrap data: {0:#}")]
    Bootstrap(anyhow::Error),

    #[error("failed to fetch league data: {0:#}")]
    Standings(anyhow::Error),
}

impl AggregateError {
    pub fn status(&self) -> u16 {
        500
    }
}

#[derive(Debug, Error)]
pub enum TriggerError {
    #[error("Missing GitHub Token")]
    MissingToken,

    #[error("GitHub API Error: {body}")]
    Upstream { status: u16, body: String },

    #[error("workflow dispatch request failed: {0:#}")]
    Request(anyhow::Error),
}

impl TriggerError {
    pub fn status(&self) -> u16 {
        match self {
            TriggerError::Upstream { status, .. } if *status >= 400 => *status,
            // An unexpected 2xx/3xx from GitHub is still a failed dispatch.
            TriggerError::Upstream { .. } => 502,
            TriggerError::MissingToken | TriggerError::Request(_) => 500,
        }
    }

    /// Text for the `error` field of the reply. Transport failures stay in the log.
    pub fn reply_message(&self) -> String {
        match self {
            TriggerError::Request(_) => "Internal Server Error".to_string(),
            other => other.to_string(),
        }
    }
}

pub type AggregateResult<T> = Result<T, AggregateError>;
