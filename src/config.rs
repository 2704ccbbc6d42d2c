use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

pub const DEFAULT_LEAGUE_ID: u32 = 885316;
pub const DEFAULT_API_BASE: &str = "https://fantasy.premierleague.com/api";
pub const DEFAULT_SNAPSHOT_PATH: &str = "data/fpl_data.json";
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

#[derive(Debug, Clone)]
pub struct Settings {
    pub league_id: u32,
    pub api_base: String,
    pub fetch_parallelism: usize,
    pub request_timeout_secs: u64,
    pub bind_addr: SocketAddr,
    pub snapshot_path: PathBuf,
    pub workflow: WorkflowSettings,
}

/// Target of the manual "trigger update" button.
#[derive(Debug, Clone)]
pub struct WorkflowSettings {
    pub token: Option<String>,
    pub api_base: String,
    pub owner: String,
    pub repo: String,
    pub workflow_file: String,
    pub branch: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            league_id: DEFAULT_LEAGUE_ID,
            api_base: DEFAULT_API_BASE.to_string(),
            fetch_parallelism: 6,
            request_timeout_secs: 10,
            bind_addr: DEFAULT_BIND_ADDR
                .parse()
                .unwrap_or_else(|_| SocketAddr::from(([127, 0, 0, 1], 3000))),
            snapshot_path: PathBuf::from(DEFAULT_SNAPSHOT_PATH),
            workflow: WorkflowSettings::default(),
        }
    }
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            token: None,
            api_base: "https://api.github.com".to_string(),
            owner: "raehan15".to_string(),
            repo: "fpl-dashboard".to_string(),
            workflow_file: "update_data.yml".to_string(),
            branch: "master".to_string(),
        }
    }
}

impl Settings {
    /// Reads settings from the process environment. Call `load_dotenv` first
    /// if `.env` files should take part.
    pub fn from_env() -> Self {
        let defaults = Settings::default();
        let workflow_defaults = WorkflowSettings::default();

        let league_id = env::var("FPL_LEAGUE_ID")
            .ok()
            .and_then(|val| val.trim().parse::<u32>().ok())
            .unwrap_or(defaults.league_id);
        let api_base = non_empty_env("FPL_API_BASE")
            .map(|val| val.trim_end_matches('/').to_string())
            .unwrap_or(defaults.api_base);
        let fetch_parallelism = env::var("FETCH_PARALLELISM")
            .ok()
            .and_then(|val| val.parse::<usize>().ok())
            .unwrap_or(defaults.fetch_parallelism)
            .clamp(1, 32);
        let request_timeout_secs = env::var("REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|val| val.parse::<u64>().ok())
            .unwrap_or(defaults.request_timeout_secs)
            .clamp(1, 120);
        let bind_addr = env::var("BIND_ADDR")
            .ok()
            .and_then(|val| val.parse::<SocketAddr>().ok())
            .unwrap_or(defaults.bind_addr);
        let snapshot_path = non_empty_env("SNAPSHOT_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.snapshot_path);

        let workflow = WorkflowSettings {
            token: non_empty_env("GITHUB_PAT"),
            api_base: non_empty_env("GITHUB_API_BASE")
                .map(|val| val.trim_end_matches('/').to_string())
                .unwrap_or(workflow_defaults.api_base),
            owner: non_empty_env("GITHUB_REPO_OWNER").unwrap_or(workflow_defaults.owner),
            repo: non_empty_env("GITHUB_REPO_NAME").unwrap_or(workflow_defaults.repo),
            workflow_file: non_empty_env("GITHUB_WORKFLOW_FILE")
                .unwrap_or(workflow_defaults.workflow_file),
            branch: non_empty_env("GITHUB_BRANCH").unwrap_or(workflow_defaults.branch),
        };

        Self {
            league_id,
            api_base,
            fetch_parallelism,
            request_timeout_secs,
            bind_addr,
            snapshot_path,
            workflow,
        }
    }
}

pub fn load_dotenv() {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
}

/// True when the process was started by a workflow dispatch rather than the cron.
pub fn is_manual_run() -> bool {
    env::var("GITHUB_EVENT_NAME")
        .map(|val| val == "workflow_dispatch")
        .unwrap_or(false)
}

fn non_empty_env(key: &str) -> Option<String> {
    match env::var(key) {
        Ok(val) if !val.trim().is_empty() => Some(val.trim().to_string()),
        _ => None,
    }
}
