//! The dashboard document: one snapshot of the league for the current gameweek.
//!
//! Maps are `BTreeMap` so that serializing the same inputs twice yields the same
//! bytes; the page does not depend on key order.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

const PKT_OFFSET_SECS: i32 = 5 * 3600;
const PKT_LABEL: &str = "PKT";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub meta: Meta,
    pub teams_meta: BTreeMap<u32, TeamMeta>,
    pub standings: Vec<StandingRow>,
    pub squads: BTreeMap<String, Squad>,
    pub chips: BTreeMap<String, Option<String>>,
    pub captains: BTreeMap<String, String>,
    pub transfers: BTreeMap<String, Vec<TransferPair>>,
    pub differentials: Differentials,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    pub gameweek: u32,
    pub league_name: String,
    pub last_updated: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamMeta {
    pub name: String,
    pub short: String,
    pub primary: String,
    pub secondary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandingRow {
    pub rank: u32,
    pub manager: String,
    pub team_name: String,
    pub total_points: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Squad {
    pub starting: Vec<SquadPlayer>,
    pub bench: Vec<SquadPlayer>,
    pub gw_points: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SquadPlayer {
    pub name: String,
    pub full_name: String,
    pub position: Position,
    pub team_id: u32,
    pub team_short: String,
    pub is_captain: bool,
    pub is_vice: bool,
    pub multiplier: u8,
    pub fixture: FixtureInfo,
    pub points: i32,
    pub raw_points: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixtureInfo {
    pub opponent: String,
    pub opponent_id: u32,
    pub is_home: bool,
}

impl FixtureInfo {
    /// Shown for a team with no fixture in the gameweek (blank gameweek or fixtures unavailable).
    pub fn unresolved() -> Self {
        Self {
            opponent: crate::aggregate::UNKNOWN_SHORT.to_string(),
            opponent_id: 0,
            is_home: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferPair {
    #[serde(rename = "in")]
    pub player_in: String,
    #[serde(rename = "out")]
    pub player_out: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Differentials {
    pub unique: BTreeMap<String, Vec<String>>,
    pub duo: BTreeMap<String, Vec<String>>,
}

/// FPL `element_type`. Serialized as its number (1..=4, 0 when unknown).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum Position {
    Unknown,
    Goalkeeper,
    Defender,
    Midfielder,
    Forward,
}

impl From<u8> for Position {
    fn from(value: u8) -> Self {
        match value {
            1 => Position::Goalkeeper,
            2 => Position::Defender,
            3 => Position::Midfielder,
            4 => Position::Forward,
            _ => Position::Unknown,
        }
    }
}

impl From<Position> for u8 {
    fn from(value: Position) -> Self {
        match value {
            Position::Unknown => 0,
            Position::Goalkeeper => 1,
            Position::Defender => 2,
            Position::Midfielder => 3,
            Position::Forward => 4,
        }
    }
}

/// `YYYY-MM-DD HH:MM:SS PKT`, always UTC+5 whatever the host timezone.
pub fn display_timestamp(now: DateTime<Utc>) -> String {
    let Some(offset) = FixedOffset::east_opt(PKT_OFFSET_SECS) else {
        return format!("{} UTC", now.format("%Y-%m-%d %H:%M:%S"));
    };
    format!(
        "{} {PKT_LABEL}",
        now.with_timezone(&offset).format("%Y-%m-%d %H:%M:%S")
    )
}

/// Replaces the snapshot file wholesale (write to tmp, then rename).
pub fn write_snapshot_file(path: &Path, snapshot: &Snapshot) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).context("create snapshot dir")?;
        }
    }
    let tmp = path.with_extension("json.tmp");
    let json = serde_json::to_string_pretty(snapshot).context("serialize snapshot")?;
    fs::write(&tmp, json).context("write snapshot")?;
    fs::rename(&tmp, path).context("swap snapshot")?;
    Ok(())
}

pub fn read_snapshot_file(path: &Path) -> Result<Snapshot> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read snapshot {}", path.display()))?;
    serde_json::from_str(&raw).context("invalid snapshot json")
}
