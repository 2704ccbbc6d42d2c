//! Joins the FPL endpoints into one [`Snapshot`].
//!
//! Bootstrap and standings are required; fixtures, live points, picks and
//! transfers degrade to empty/zero values when their fetch fails. Managers are
//! processed independently on a bounded pool and merged in standings order.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::error::{AggregateError, AggregateResult};
use crate::fpl_api::{
    ApiTeam, BootstrapStatic, Element, Event, Fixture, FplSource, LiveEvent, Pick, StandingEntry,
    TransferRecord,
};
use crate::snapshot::{
    Differentials, FixtureInfo, Meta, Position, Snapshot, Squad, SquadPlayer, StandingRow,
    TeamMeta, TransferPair, display_timestamp,
};
use crate::team_colors::colors_for;

/// Last gameweek of a season. Used only when upstream flags neither a current
/// nor a next event (off-season); a policy choice, not something inferred.
pub const DEFAULT_GAMEWEEK: u32 = 38;
pub const UNKNOWN_NAME: &str = "Unknown";
pub const UNKNOWN_SHORT: &str = "???";

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerInfo {
    pub name: String,
    pub full_name: String,
    pub position: Position,
    pub team_id: u32,
}

/// Lookups shared read-only by every manager worker.
#[derive(Debug, Clone, Default)]
pub struct GameweekContext {
    pub gameweek: u32,
    pub teams_meta: BTreeMap<u32, TeamMeta>,
    pub players: HashMap<u32, PlayerInfo>,
    pub fixtures: HashMap<u32, FixtureInfo>,
    pub live_points: HashMap<u32, i32>,
}

/// Everything one manager contributes to the snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct ManagerResult {
    pub manager: String,
    pub squad: Squad,
    pub captain: String,
    pub chip: Option<String>,
    pub transfers: Vec<TransferPair>,
    pub starting_names: Vec<String>,
}

pub fn build_snapshot<S: FplSource + ?Sized>(
    source: &S,
    settings: &Settings,
    now: DateTime<Utc>,
) -> AggregateResult<Snapshot> {
    let bootstrap = source.bootstrap().map_err(AggregateError::Bootstrap)?;
    build_snapshot_with_bootstrap(source, &bootstrap, settings, now)
}

/// Same as [`build_snapshot`] for callers that already hold the bootstrap document.
pub fn build_snapshot_with_bootstrap<S: FplSource + ?Sized>(
    source: &S,
    bootstrap: &BootstrapStatic,
    settings: &Settings,
    now: DateTime<Utc>,
) -> AggregateResult<Snapshot> {
    let ctx = prepare_context(source, bootstrap);

    let league = source
        .standings(settings.league_id)
        .map_err(AggregateError::Standings)?;
    let managers = &league.standings.results;
    info!(
        league = %league.league.name,
        managers = managers.len(),
        gameweek = ctx.gameweek,
        "building snapshot"
    );

    let results: Vec<Option<ManagerResult>> = with_fetch_pool(settings.fetch_parallelism, || {
        managers
            .par_iter()
            .map(|entry| process_manager(source, entry, &ctx))
            .collect()
    });
    let results: Vec<ManagerResult> = results.into_iter().flatten().collect();

    let ownership = build_ownership_index(&results);
    let differentials = build_differentials(&ownership);

    let mut squads = BTreeMap::new();
    let mut chips = BTreeMap::new();
    let mut captains = BTreeMap::new();
    let mut transfers = BTreeMap::new();
    for result in results {
        chips.insert(result.manager.clone(), result.chip);
        captains.insert(result.manager.clone(), result.captain);
        transfers.insert(result.manager.clone(), result.transfers);
        squads.insert(result.manager, result.squad);
    }

    let standings = managers
        .iter()
        .map(|m| StandingRow {
            rank: m.rank,
            manager: m.player_name.clone(),
            team_name: m.entry_name.clone(),
            total_points: m.total,
        })
        .collect();

    Ok(Snapshot {
        meta: Meta {
            gameweek: ctx.gameweek,
            league_name: league.league.name.clone(),
            last_updated: display_timestamp(now),
        },
        teams_meta: ctx.teams_meta,
        standings,
        squads,
        chips,
        captains,
        transfers,
        differentials,
    })
}

/// Steps that only depend on the bootstrap document plus the two optional feeds.
pub fn prepare_context<S: FplSource + ?Sized>(
    source: &S,
    bootstrap: &BootstrapStatic,
) -> GameweekContext {
    let gameweek = current_gameweek(&bootstrap.events);
    info!(gameweek, "current gameweek");

    let teams_meta = build_teams_meta(&bootstrap.teams);
    let players = build_player_map(&bootstrap.elements);

    let fixtures = match source.fixtures() {
        Ok(fixtures) => build_fixture_map(&fixtures, gameweek, &teams_meta),
        Err(err) => {
            warn!("could not fetch fixtures, opponents unresolved: {err:#}");
            HashMap::new()
        }
    };

    let live_points = match source.live(gameweek) {
        Ok(live) => {
            let points = build_live_points(&live);
            debug!(players = points.len(), "live points loaded");
            points
        }
        Err(err) => {
            warn!("could not fetch live points, continuing without: {err:#}");
            HashMap::new()
        }
    };

    GameweekContext {
        gameweek,
        teams_meta,
        players,
        fixtures,
        live_points,
    }
}

pub fn current_gameweek(events: &[Event]) -> u32 {
    events
        .iter()
        .find(|e| e.is_current)
        .or_else(|| events.iter().find(|e| e.is_next))
        .map(|e| e.id)
        .unwrap_or(DEFAULT_GAMEWEEK)
}

pub fn build_teams_meta(teams: &[ApiTeam]) -> BTreeMap<u32, TeamMeta> {
    teams
        .iter()
        .map(|team| {
            let colors = colors_for(team.id);
            (
                team.id,
                TeamMeta {
                    name: team.name.clone(),
                    short: team.short_name.clone(),
                    primary: colors.primary.to_string(),
                    secondary: colors.secondary.to_string(),
                },
            )
        })
        .collect()
}

pub fn build_player_map(elements: &[Element]) -> HashMap<u32, PlayerInfo> {
    elements
        .iter()
        .map(|p| {
            (
                p.id,
                PlayerInfo {
                    name: p.web_name.clone(),
                    full_name: format!("{} {}", p.first_name, p.second_name),
                    position: Position::from(p.element_type),
                    team_id: p.team,
                },
            )
        })
        .collect()
}

/// One record per participant of each fixture in `gameweek`. In a double
/// gameweek the later fixture in upstream order wins.
pub fn build_fixture_map(
    fixtures: &[Fixture],
    gameweek: u32,
    teams_meta: &BTreeMap<u32, TeamMeta>,
) -> HashMap<u32, FixtureInfo> {
    let short = |id: u32| {
        teams_meta
            .get(&id)
            .map(|t| t.short.clone())
            .unwrap_or_else(|| UNKNOWN_SHORT.to_string())
    };

    let mut out = HashMap::new();
    for fixture in fixtures.iter().filter(|f| f.event == Some(gameweek)) {
        out.insert(
            fixture.team_h,
            FixtureInfo {
                opponent: short(fixture.team_a),
                opponent_id: fixture.team_a,
                is_home: true,
            },
        );
        out.insert(
            fixture.team_a,
            FixtureInfo {
                opponent: short(fixture.team_h),
                opponent_id: fixture.team_h,
                is_home: false,
            },
        );
    }
    out
}

pub fn build_live_points(live: &LiveEvent) -> HashMap<u32, i32> {
    live.elements
        .iter()
        .map(|e| (e.id, e.stats.total_points))
        .collect()
}

/// Multiplier 0 (bench) leaves the raw score untouched.
pub fn effective_points(raw_points: i32, multiplier: u8) -> i32 {
    if multiplier > 0 {
        raw_points * i32::from(multiplier)
    } else {
        raw_points
    }
}

/// Entry-history points win when positive; otherwise the starting XI sum.
pub fn gameweek_total(api_points: Option<i32>, starting: &[SquadPlayer]) -> i32 {
    match api_points {
        Some(points) if points > 0 => points,
        _ => starting.iter().map(|p| p.points).sum(),
    }
}

/// Position ascending, captain first, then vice. Stable, so remaining ties
/// keep pick order.
pub fn sort_starting(players: &mut [SquadPlayer]) {
    players.sort_by(|a, b| {
        a.position
            .cmp(&b.position)
            .then_with(|| b.is_captain.cmp(&a.is_captain))
            .then_with(|| b.is_vice.cmp(&a.is_vice))
    });
}

impl GameweekContext {
    pub fn full_name(&self, player_id: u32) -> String {
        self.players
            .get(&player_id)
            .map(|p| p.full_name.clone())
            .unwrap_or_else(|| UNKNOWN_NAME.to_string())
    }

    pub fn squad_player(&self, pick: &Pick) -> SquadPlayer {
        let info = self.players.get(&pick.element);
        let team_id = info.map(|p| p.team_id).unwrap_or(0);
        let team_short = self
            .teams_meta
            .get(&team_id)
            .map(|t| t.short.clone())
            .unwrap_or_else(|| UNKNOWN_SHORT.to_string());
        let fixture = self
            .fixtures
            .get(&team_id)
            .cloned()
            .unwrap_or_else(FixtureInfo::unresolved);
        let raw_points = self.live_points.get(&pick.element).copied().unwrap_or(0);

        SquadPlayer {
            name: info
                .map(|p| p.name.clone())
                .unwrap_or_else(|| UNKNOWN_NAME.to_string()),
            full_name: info
                .map(|p| p.full_name.clone())
                .unwrap_or_else(|| UNKNOWN_NAME.to_string()),
            position: info.map(|p| p.position).unwrap_or(Position::Unknown),
            team_id,
            team_short,
            is_captain: pick.is_captain,
            is_vice: pick.is_vice_captain,
            multiplier: pick.multiplier,
            fixture,
            points: effective_points(raw_points, pick.multiplier),
            raw_points,
        }
    }

    /// Returns the squad plus the starting full names in pick order.
    pub fn build_squad(&self, picks: &[Pick], api_points: Option<i32>) -> (Squad, Vec<String>) {
        let mut starting = Vec::new();
        let mut bench = Vec::new();
        let mut starting_names = Vec::new();

        for pick in picks {
            let player = self.squad_player(pick);
            if pick.multiplier > 0 {
                starting_names.push(player.full_name.clone());
                starting.push(player);
            } else {
                bench.push(player);
            }
        }

        let gw_points = gameweek_total(api_points, &starting);
        sort_starting(&mut starting);

        (
            Squad {
                starting,
                bench,
                gw_points,
            },
            starting_names,
        )
    }

    pub fn gameweek_transfers(&self, records: &[TransferRecord]) -> Vec<TransferPair> {
        records
            .iter()
            .filter(|t| t.event == Some(self.gameweek))
            .map(|t| TransferPair {
                player_in: self.full_name(t.element_in),
                player_out: self.full_name(t.element_out),
            })
            .collect()
    }
}

/// `None` means the manager is left out of squads, chips, captains and transfers.
pub fn process_manager<S: FplSource + ?Sized>(
    source: &S,
    entry: &StandingEntry,
    ctx: &GameweekContext,
) -> Option<ManagerResult> {
    let manager = entry.player_name.clone();
    debug!(%manager, entry = entry.entry, "processing manager");

    let picks_doc = match source.picks(entry.entry, ctx.gameweek) {
        Ok(doc) => doc,
        Err(err) => {
            warn!(%manager, "could not fetch picks: {err:#}");
            return None;
        }
    };
    let Some(picks) = picks_doc.picks.as_deref() else {
        warn!(%manager, "picks response has no picks, skipping");
        return None;
    };

    let api_points = picks_doc.entry_history.as_ref().and_then(|h| h.points);
    let (squad, starting_names) = ctx.build_squad(picks, api_points);

    let captain = picks
        .iter()
        .find(|p| p.is_captain)
        .map(|p| ctx.full_name(p.element))
        .unwrap_or_else(|| UNKNOWN_NAME.to_string());

    let chip = picks_doc.active_chip.clone().filter(|c| !c.is_empty());

    let transfers = match source.transfers(entry.entry) {
        Ok(records) => ctx.gameweek_transfers(&records),
        Err(err) => {
            warn!(%manager, "could not fetch transfers: {err:#}");
            Vec::new()
        }
    };

    Some(ManagerResult {
        manager,
        squad,
        captain,
        chip,
        transfers,
        starting_names,
    })
}

/// Player full name -> managers who started them, in merge order. A manager is
/// listed once per name even when two starters share it (e.g. two unresolved
/// players both named "Unknown").
pub fn build_ownership_index(results: &[ManagerResult]) -> BTreeMap<String, Vec<String>> {
    let mut owners: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for result in results {
        for name in &result.starting_names {
            let managers = owners.entry(name.clone()).or_default();
            if managers.last() != Some(&result.manager) {
                managers.push(result.manager.clone());
            }
        }
    }
    owners
}

pub fn build_differentials(ownership: &BTreeMap<String, Vec<String>>) -> Differentials {
    let mut out = Differentials::default();
    for (player, owners) in ownership {
        let bucket = match owners.len() {
            1 => &mut out.unique,
            2 => &mut out.duo,
            _ => continue,
        };
        for owner in owners {
            bucket.entry(owner.clone()).or_default().push(player.clone());
        }
    }
    out
}

fn with_fetch_pool<T>(threads: usize, action: impl FnOnce() -> T + Send) -> T
where
    T: Send,
{
    match rayon::ThreadPoolBuilder::new()
        .num_threads(threads.max(1))
        .build()
    {
        Ok(pool) => pool.install(action),
        Err(_) => action(),
    }
}
