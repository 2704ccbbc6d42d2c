//! In-memory FPL source for offline runs, tests and benches.
//!
//! A directory holds one file per endpoint:
//! `bootstrap.json`, `fixtures.json`, `live.json`, `standings.json`,
//! `picks_{entry}.json`, `transfers_{entry}.json`. Missing files behave like a
//! failed fetch, and any endpoint can be forced to fail.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::fpl_api::{
    BootstrapStatic, EntryPicks, Fixture, FplSource, LeagueStandings, LiveEvent, TransferRecord,
    parse_bootstrap_json, parse_fixtures_json, parse_live_json, parse_picks_json,
    parse_standings_json, parse_transfers_json,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Bootstrap,
    Fixtures,
    Live,
    Standings,
    Picks(u64),
    Transfers(u64),
}

#[derive(Debug, Clone, Default)]
pub struct FakeFpl {
    bootstrap: Option<BootstrapStatic>,
    fixtures: Option<Vec<Fixture>>,
    live: Option<LiveEvent>,
    standings: Option<LeagueStandings>,
    picks: HashMap<u64, EntryPicks>,
    transfers: HashMap<u64, Vec<TransferRecord>>,
    failing: HashSet<Endpoint>,
}

impl FakeFpl {
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let mut fake = FakeFpl::default();
        if let Some(raw) = read_optional(&dir.join("bootstrap.json"))? {
            fake.bootstrap = Some(parse_bootstrap_json(&raw)?);
        }
        if let Some(raw) = read_optional(&dir.join("fixtures.json"))? {
            fake.fixtures = Some(parse_fixtures_json(&raw)?);
        }
        if let Some(raw) = read_optional(&dir.join("live.json"))? {
            fake.live = Some(parse_live_json(&raw)?);
        }
        if let Some(raw) = read_optional(&dir.join("standings.json"))? {
            fake.standings = Some(parse_standings_json(&raw)?);
        }

        let entries = fs::read_dir(dir)
            .with_context(|| format!("read fake source dir {}", dir.display()))?;
        for entry in entries {
            let path = entry.context("read fake source entry")?.path();
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if let Some(id) = stem.strip_prefix("picks_").and_then(|s| s.parse::<u64>().ok()) {
                let raw = fs::read_to_string(&path).context("read picks fixture")?;
                fake.picks.insert(id, parse_picks_json(&raw)?);
            } else if let Some(id) = stem
                .strip_prefix("transfers_")
                .and_then(|s| s.parse::<u64>().ok())
            {
                let raw = fs::read_to_string(&path).context("read transfers fixture")?;
                fake.transfers.insert(id, parse_transfers_json(&raw)?);
            }
        }
        Ok(fake)
    }

    pub fn with_picks(mut self, entry: u64, picks: EntryPicks) -> Self {
        self.picks.insert(entry, picks);
        self
    }

    pub fn with_transfers(mut self, entry: u64, transfers: Vec<TransferRecord>) -> Self {
        self.transfers.insert(entry, transfers);
        self
    }

    pub fn failing(mut self, endpoint: Endpoint) -> Self {
        self.failing.insert(endpoint);
        self
    }

    fn check(&self, endpoint: Endpoint) -> Result<()> {
        if self.failing.contains(&endpoint) {
            return Err(anyhow::anyhow!("http 503 Service Unavailable: {endpoint:?}"));
        }
        Ok(())
    }
}

impl FplSource for FakeFpl {
    fn bootstrap(&self) -> Result<BootstrapStatic> {
        self.check(Endpoint::Bootstrap)?;
        self.bootstrap
            .clone()
            .ok_or_else(|| anyhow::anyhow!("no bootstrap data"))
    }

    fn fixtures(&self) -> Result<Vec<Fixture>> {
        self.check(Endpoint::Fixtures)?;
        self.fixtures
            .clone()
            .ok_or_else(|| anyhow::anyhow!("no fixtures data"))
    }

    fn live(&self, gameweek: u32) -> Result<LiveEvent> {
        self.check(Endpoint::Live)?;
        self.live
            .clone()
            .ok_or_else(|| anyhow::anyhow!("no live data for gameweek {gameweek}"))
    }

    fn standings(&self, league_id: u32) -> Result<LeagueStandings> {
        self.check(Endpoint::Standings)?;
        self.standings
            .clone()
            .ok_or_else(|| anyhow::anyhow!("no standings for league {league_id}"))
    }

    fn picks(&self, entry: u64, gameweek: u32) -> Result<EntryPicks> {
        self.check(Endpoint::Picks(entry))?;
        self.picks
            .get(&entry)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no picks for entry {entry} gameweek {gameweek}"))
    }

    fn transfers(&self, entry: u64) -> Result<Vec<TransferRecord>> {
        self.check(Endpoint::Transfers(entry))?;
        self.transfers
            .get(&entry)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no transfers for entry {entry}"))
    }
}

fn read_optional(path: &Path) -> Result<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }
    fs::read_to_string(path)
        .map(Some)
        .with_context(|| format!("read {}", path.display()))
}
