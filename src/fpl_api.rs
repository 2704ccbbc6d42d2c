use anyhow::{Context, Result};
use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use tracing::debug;

use crate::config::Settings;
use crate::http_client::http_client;

const MAX_STANDINGS_PAGES: u32 = 20;

/// Read side of the FPL API, one method per endpoint the snapshot joins.
pub trait FplSource: Sync {
    fn bootstrap(&self) -> Result<BootstrapStatic>;
    fn fixtures(&self) -> Result<Vec<Fixture>>;
    fn live(&self, gameweek: u32) -> Result<LiveEvent>;
    fn standings(&self, league_id: u32) -> Result<LeagueStandings>;
    fn picks(&self, entry: u64, gameweek: u32) -> Result<EntryPicks>;
    fn transfers(&self, entry: u64) -> Result<Vec<TransferRecord>>;
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BootstrapStatic {
    #[serde(default)]
    pub events: Vec<Event>,
    #[serde(default)]
    pub teams: Vec<ApiTeam>,
    #[serde(default)]
    pub elements: Vec<Element>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Event {
    pub id: u32,
    #[serde(default)]
    pub is_current: bool,
    #[serde(default)]
    pub is_next: bool,
    #[serde(default)]
    pub deadline_time: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiTeam {
    pub id: u32,
    pub name: String,
    pub short_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Element {
    pub id: u32,
    pub web_name: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub second_name: String,
    #[serde(default)]
    pub element_type: u8,
    #[serde(default)]
    pub team: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Fixture {
    // Unscheduled (postponed) fixtures carry a null event.
    #[serde(default)]
    pub event: Option<u32>,
    pub team_h: u32,
    pub team_a: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LiveEvent {
    #[serde(default)]
    pub elements: Vec<LiveElement>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LiveElement {
    pub id: u32,
    #[serde(default, deserialize_with = "null_or_default")]
    pub stats: LiveStats,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LiveStats {
    #[serde(default, deserialize_with = "null_or_default")]
    pub total_points: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LeagueStandings {
    pub league: LeagueInfo,
    pub standings: StandingsPage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LeagueInfo {
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StandingsPage {
    #[serde(default)]
    pub has_next: bool,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub results: Vec<StandingEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StandingEntry {
    pub entry: u64,
    pub player_name: String,
    pub entry_name: String,
    pub rank: u32,
    pub total: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntryPicks {
    #[serde(default)]
    pub picks: Option<Vec<Pick>>,
    #[serde(default)]
    pub active_chip: Option<String>,
    #[serde(default)]
    pub entry_history: Option<EntryHistory>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Pick {
    pub element: u32,
    #[serde(default)]
    pub multiplier: u8,
    #[serde(default)]
    pub is_captain: bool,
    #[serde(default)]
    pub is_vice_captain: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntryHistory {
    #[serde(default)]
    pub points: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransferRecord {
    #[serde(default)]
    pub event: Option<u32>,
    pub element_in: u32,
    pub element_out: u32,
}

pub fn parse_bootstrap_json(raw: &str) -> Result<BootstrapStatic> {
    let trimmed = raw.trim();
    if is_null_body(trimmed) {
        return Err(anyhow::anyhow!("empty bootstrap response"));
    }
    serde_json::from_str(trimmed).context("invalid bootstrap json")
}

pub fn parse_fixtures_json(raw: &str) -> Result<Vec<Fixture>> {
    let trimmed = raw.trim();
    if is_null_body(trimmed) {
        return Ok(Vec::new());
    }
    serde_json::from_str(trimmed).context("invalid fixtures json")
}

pub fn parse_live_json(raw: &str) -> Result<LiveEvent> {
    let trimmed = raw.trim();
    if is_null_body(trimmed) {
        return Ok(LiveEvent::default());
    }
    serde_json::from_str(trimmed).context("invalid live json")
}

pub fn parse_standings_json(raw: &str) -> Result<LeagueStandings> {
    let trimmed = raw.trim();
    if is_null_body(trimmed) {
        return Err(anyhow::anyhow!("empty standings response"));
    }
    serde_json::from_str(trimmed).context("invalid standings json")
}

pub fn parse_picks_json(raw: &str) -> Result<EntryPicks> {
    let trimmed = raw.trim();
    if is_null_body(trimmed) {
        return Ok(EntryPicks::default());
    }
    serde_json::from_str(trimmed).context("invalid picks json")
}

pub fn parse_transfers_json(raw: &str) -> Result<Vec<TransferRecord>> {
    let trimmed = raw.trim();
    if is_null_body(trimmed) {
        return Ok(Vec::new());
    }
    serde_json::from_str(trimmed).context("invalid transfers json")
}

fn null_or_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    let value = Option::<T>::deserialize(deserializer)?;
    Ok(value.unwrap_or_default())
}

fn is_null_body(trimmed: &str) -> bool {
    trimmed.is_empty() || trimmed == "null"
}

/// Live FPL API over the shared blocking client.
pub struct FplHttp {
    client: &'static Client,
    base: String,
}

impl FplHttp {
    pub fn new(settings: &Settings) -> Result<Self> {
        let client = http_client(settings.request_timeout_secs)?;
        Ok(Self {
            client,
            base: settings.api_base.trim_end_matches('/').to_string(),
        })
    }

    fn get(&self, path: &str) -> Result<String> {
        let url = format!("{}{}", self.base, path);
        debug!(%url, "fpl request");
        let resp = self
            .client
            .get(&url)
            .header(ACCEPT, "application/json")
            .send()
            .context("request failed")?;
        let status = resp.status();
        let body = resp.text().context("failed reading body")?;
        if !status.is_success() {
            return Err(anyhow::anyhow!("http {}: {}", status, truncate(&body, 200)));
        }
        Ok(body)
    }
}

impl FplSource for FplHttp {
    fn bootstrap(&self) -> Result<BootstrapStatic> {
        let body = self
            .get("/bootstrap-static/")
            .context("bootstrap request failed")?;
        parse_bootstrap_json(&body)
    }

    fn fixtures(&self) -> Result<Vec<Fixture>> {
        let body = self.get("/fixtures/").context("fixtures request failed")?;
        parse_fixtures_json(&body)
    }

    fn live(&self, gameweek: u32) -> Result<LiveEvent> {
        let body = self
            .get(&format!("/event/{gameweek}/live/"))
            .context("live points request failed")?;
        parse_live_json(&body)
    }

    fn standings(&self, league_id: u32) -> Result<LeagueStandings> {
        let body = self
            .get(&format!("/leagues-classic/{league_id}/standings/"))
            .context("league standings request failed")?;
        let first = parse_standings_json(&body)?;

        merge_standings_pages(first, |page| {
            let body = self
                .get(&format!(
                    "/leagues-classic/{league_id}/standings/?page_standings={page}"
                ))
                .with_context(|| format!("league standings page {page} request failed"))?;
            parse_standings_json(&body)
        })
    }

    fn picks(&self, entry: u64, gameweek: u32) -> Result<EntryPicks> {
        let body = self
            .get(&format!("/entry/{entry}/event/{gameweek}/picks/"))
            .context("picks request failed")?;
        parse_picks_json(&body)
    }

    fn transfers(&self, entry: u64) -> Result<Vec<TransferRecord>> {
        let body = self
            .get(&format!("/entry/{entry}/transfers/"))
            .context("transfers request failed")?;
        parse_transfers_json(&body)
    }
}

/// Follows `has_next` from the first page, appending each page's rows in order.
/// Classic leagues page at 50 entries; at most `MAX_STANDINGS_PAGES` are read,
/// and any page failing fails the whole league.
fn merge_standings_pages(
    mut league: LeagueStandings,
    mut fetch_page: impl FnMut(u32) -> Result<LeagueStandings>,
) -> Result<LeagueStandings> {
    let mut page = league.standings.page.max(1);
    let mut has_next = league.standings.has_next;
    while has_next && page < MAX_STANDINGS_PAGES {
        page += 1;
        let next = fetch_page(page)?;
        has_next = next.standings.has_next;
        league.standings.results.extend(next.standings.results);
    }
    if has_next {
        debug!(pages = page, "standings truncated at page cap");
    }
    league.standings.has_next = false;
    Ok(league)
}

fn truncate(body: &str, max: usize) -> &str {
    match body.char_indices().nth(max) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}
