use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{TimeZone, Utc};

use fpl_dashboard::aggregate::{
    DEFAULT_GAMEWEEK, GameweekContext, ManagerResult, PlayerInfo, build_differentials,
    build_ownership_index, build_snapshot, current_gameweek, effective_points, gameweek_total,
};
use fpl_dashboard::config::Settings;
use fpl_dashboard::error::AggregateError;
use fpl_dashboard::fake_source::{Endpoint, FakeFpl};
use fpl_dashboard::fpl_api::{EntryPicks, Event, Pick};
use fpl_dashboard::snapshot::{Position, Squad, TransferPair};

fn league_source() -> FakeFpl {
    let mut dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    dir.push("tests");
    dir.push("fixtures");
    dir.push("league");
    FakeFpl::from_dir(&dir).expect("fixture league should load")
}

fn settings() -> Settings {
    Settings {
        fetch_parallelism: 2,
        ..Settings::default()
    }
}

fn fixed_now() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 8, 25, 19, 30, 0).unwrap()
}

fn names(players: &[fpl_dashboard::snapshot::SquadPlayer]) -> Vec<&str> {
    players.iter().map(|p| p.full_name.as_str()).collect()
}

fn pick(element: u32, multiplier: u8, is_captain: bool, is_vice_captain: bool) -> Pick {
    Pick {
        element,
        multiplier,
        is_captain,
        is_vice_captain,
    }
}

fn event(id: u32, is_current: bool, is_next: bool) -> Event {
    Event {
        id,
        is_current,
        is_next,
        deadline_time: None,
    }
}

#[test]
fn snapshot_meta_and_standings_cover_every_manager() {
    let snapshot = build_snapshot(&league_source(), &settings(), fixed_now()).expect("snapshot");

    assert_eq!(snapshot.meta.gameweek, 2);
    assert_eq!(snapshot.meta.league_name, "Office League");
    assert_eq!(snapshot.meta.last_updated, "2024-08-26 00:30:00 PKT");

    let managers: Vec<&str> = snapshot.standings.iter().map(|s| s.manager.as_str()).collect();
    assert_eq!(
        managers,
        vec!["Alice Khan", "Bilal Shah", "Cara Noor", "Dan Iqbal"]
    );
    assert_eq!(snapshot.standings[1].team_name, "Haaland Globetrotters");
    assert_eq!(snapshot.standings[1].total_points, 121);
}

#[test]
fn manager_without_picks_is_left_out_of_per_manager_maps() {
    let snapshot = build_snapshot(&league_source(), &settings(), fixed_now()).expect("snapshot");

    assert_eq!(snapshot.squads.len(), 3);
    assert!(!snapshot.squads.contains_key("Dan Iqbal"));
    assert!(!snapshot.captains.contains_key("Dan Iqbal"));
    assert!(!snapshot.chips.contains_key("Dan Iqbal"));
    assert!(!snapshot.transfers.contains_key("Dan Iqbal"));
}

#[test]
fn teams_meta_merges_color_table_with_fallback() {
    let snapshot = build_snapshot(&league_source(), &settings(), fixed_now()).expect("snapshot");

    let liverpool = &snapshot.teams_meta[&12u32];
    assert_eq!(liverpool.short, "LIV");
    assert_eq!(liverpool.primary, "#C8102E");
    let sunderland = &snapshot.teams_meta[&21u32];
    assert_eq!(sunderland.name, "Sunderland");
    assert_eq!(sunderland.primary, "#888888");
    assert_eq!(sunderland.secondary, "#FFFFFF");
}

#[test]
fn squads_split_starting_and_bench_with_points() {
    let snapshot = build_snapshot(&league_source(), &settings(), fixed_now()).expect("snapshot");
    let alice = &snapshot.squads["Alice Khan"];

    assert_eq!(alice.starting.len(), 4);
    assert_eq!(alice.bench.len(), 1);
    assert_eq!(
        names(&alice.starting),
        vec!["David Raya", "William Saliba", "Mohamed Salah", "Erling Haaland"]
    );

    let salah = &alice.starting[2];
    assert!(salah.is_captain);
    assert_eq!(salah.multiplier, 2);
    assert_eq!(salah.raw_points, 13);
    assert_eq!(salah.points, 26);
    assert_eq!(salah.team_short, "LIV");
    assert_eq!(salah.fixture.opponent, "ARS");
    assert_eq!(salah.fixture.opponent_id, 1);
    assert!(!salah.fixture.is_home);

    let bench = &alice.bench[0];
    assert_eq!(bench.full_name, "Bruno Fernandes");
    assert_eq!(bench.raw_points, -1);
    assert_eq!(bench.points, -1);
}

#[test]
fn entry_history_points_take_precedence_over_computed_sum() {
    let snapshot = build_snapshot(&league_source(), &settings(), fixed_now()).expect("snapshot");

    // Alice: computed 6 + 2 + 26 + 16 = 50, entry history says 57.
    let alice = &snapshot.squads["Alice Khan"];
    let computed: i32 = alice.starting.iter().map(|p| p.points).sum();
    assert_eq!(computed, 50);
    assert_eq!(alice.gw_points, 57);

    // Bilal: entry history reports 0, so the triple-captain sum is used.
    assert_eq!(snapshot.squads["Bilal Shah"].gw_points, 3 + 6 + 48 + 8);
    // Cara: no entry history at all.
    assert_eq!(snapshot.squads["Cara Noor"].gw_points, 6 + 1 + 13 + 10);
}

#[test]
fn starting_list_sorts_by_position_then_captain_then_vice() {
    let snapshot = build_snapshot(&league_source(), &settings(), fixed_now()).expect("snapshot");
    let cara = &snapshot.squads["Cara Noor"];

    // The unresolved pick has position 0 and sorts first; Salah (vice) beats Foden.
    assert_eq!(
        names(&cara.starting),
        vec![
            "Unknown",
            "David Raya",
            "Mohamed Salah",
            "Phil Foden",
            "Wilson Isidor"
        ]
    );
    let unknown = &cara.starting[0];
    assert_eq!(unknown.name, "Unknown");
    assert_eq!(unknown.position, Position::Unknown);
    assert_eq!(unknown.team_id, 0);
    assert_eq!(unknown.team_short, "???");
    assert_eq!(unknown.fixture.opponent, "???");
}

#[test]
fn team_without_fixture_reports_unresolved_opponent() {
    let snapshot = build_snapshot(&league_source(), &settings(), fixed_now()).expect("snapshot");
    let fernandes = &snapshot.squads["Alice Khan"].bench[0];

    assert_eq!(fernandes.team_short, "MUN");
    assert_eq!(fernandes.fixture.opponent, "???");
    assert_eq!(fernandes.fixture.opponent_id, 0);
    assert!(fernandes.fixture.is_home);
}

#[test]
fn captains_chips_and_transfers_per_manager() {
    let snapshot = build_snapshot(&league_source(), &settings(), fixed_now()).expect("snapshot");

    assert_eq!(snapshot.captains["Alice Khan"], "Mohamed Salah");
    assert_eq!(snapshot.captains["Bilal Shah"], "Erling Haaland");
    assert_eq!(snapshot.captains["Cara Noor"], "Wilson Isidor");

    assert_eq!(snapshot.chips["Alice Khan"], None);
    assert_eq!(snapshot.chips["Bilal Shah"].as_deref(), Some("3xc"));

    assert_eq!(
        snapshot.transfers["Alice Khan"],
        vec![TransferPair {
            player_in: "Erling Haaland".to_string(),
            player_out: "Phil Foden".to_string(),
        }]
    );
    assert!(snapshot.transfers["Bilal Shah"].is_empty());
    // Cara's transfers endpoint has no data and fails; she still gets a squad.
    assert!(snapshot.transfers["Cara Noor"].is_empty());
    assert!(snapshot.squads.contains_key("Cara Noor"));
}

#[test]
fn differentials_split_unique_and_duo_owners() {
    let snapshot = build_snapshot(&league_source(), &settings(), fixed_now()).expect("snapshot");
    let diffs = &snapshot.differentials;

    assert_eq!(diffs.unique["Alice Khan"], vec!["William Saliba"]);
    assert_eq!(
        diffs.unique["Bilal Shah"],
        vec!["Alisson Becker", "Bukayo Saka", "Virgil van Dijk"]
    );
    assert_eq!(
        diffs.unique["Cara Noor"],
        vec!["Phil Foden", "Unknown", "Wilson Isidor"]
    );

    assert_eq!(
        diffs.duo["Alice Khan"],
        vec!["David Raya", "Erling Haaland", "Mohamed Salah"]
    );
    assert_eq!(diffs.duo["Bilal Shah"], vec!["Erling Haaland"]);
    assert_eq!(diffs.duo["Cara Noor"], vec!["David Raya", "Mohamed Salah"]);
}

#[test]
fn bench_players_do_not_count_as_owned() {
    let snapshot = build_snapshot(&league_source(), &settings(), fixed_now()).expect("snapshot");
    // Isidor is on Bilal's bench, so Cara is his only owner.
    assert!(
        !snapshot
            .differentials
            .duo
            .values()
            .any(|players| players.iter().any(|p| p == "Wilson Isidor"))
    );
}

#[test]
fn failed_live_points_zero_every_player_but_still_succeeds() {
    let source = league_source().failing(Endpoint::Live);
    let snapshot = build_snapshot(&source, &settings(), fixed_now()).expect("snapshot");

    for squad in snapshot.squads.values() {
        for player in squad.starting.iter().chain(squad.bench.iter()) {
            assert_eq!(player.raw_points, 0);
            assert_eq!(player.points, 0);
        }
    }
    // Entry history still wins for Alice; the others fall back to a zero sum.
    assert_eq!(snapshot.squads["Alice Khan"].gw_points, 57);
    assert_eq!(snapshot.squads["Bilal Shah"].gw_points, 0);
}

#[test]
fn failed_fixtures_leave_every_opponent_unresolved() {
    let source = league_source().failing(Endpoint::Fixtures);
    let snapshot = build_snapshot(&source, &settings(), fixed_now()).expect("snapshot");

    for squad in snapshot.squads.values() {
        for player in squad.starting.iter().chain(squad.bench.iter()) {
            assert_eq!(player.fixture.opponent, "???");
            assert_eq!(player.fixture.opponent_id, 0);
            assert!(player.fixture.is_home);
        }
    }
}

#[test]
fn failed_picks_skip_only_that_manager() {
    let source = league_source().failing(Endpoint::Picks(101));
    let snapshot = build_snapshot(&source, &settings(), fixed_now()).expect("snapshot");

    assert!(!snapshot.squads.contains_key("Alice Khan"));
    assert!(!snapshot.captains.contains_key("Alice Khan"));
    assert_eq!(snapshot.standings.len(), 4);
    // Without Alice, Saliba has no owner and Raya/Salah drop to unique for Cara.
    assert!(!snapshot.differentials.unique.contains_key("Alice Khan"));
    assert!(
        snapshot.differentials.unique["Cara Noor"].contains(&"David Raya".to_string())
    );
}

#[test]
fn failed_standings_is_fatal() {
    let source = league_source().failing(Endpoint::Standings);
    let err = build_snapshot(&source, &settings(), fixed_now()).unwrap_err();
    assert!(matches!(err, AggregateError::Standings(_)));
    assert_eq!(err.status(), 500);
    assert!(err.to_string().starts_with("failed to fetch league data"));
}

#[test]
fn failed_bootstrap_is_fatal() {
    let source = league_source().failing(Endpoint::Bootstrap);
    let err = build_snapshot(&source, &settings(), fixed_now()).unwrap_err();
    assert!(matches!(err, AggregateError::Bootstrap(_)));
}

#[test]
fn repeated_runs_are_byte_identical_apart_from_timestamp() {
    let source = league_source();
    let first = build_snapshot(&source, &settings(), fixed_now()).expect("first");
    let later = Utc.with_ymd_and_hms(2024, 8, 25, 20, 0, 0).unwrap();
    let second = build_snapshot(&source, &settings(), later).expect("second");

    assert_eq!(to_json(&first.teams_meta), to_json(&second.teams_meta));
    assert_eq!(to_json(&first.standings), to_json(&second.standings));
    assert_eq!(to_json(&first.squads), to_json(&second.squads));
    assert_eq!(to_json(&first.differentials), to_json(&second.differentials));
    assert_ne!(first.meta.last_updated, second.meta.last_updated);
}

fn to_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string(value).expect("serializable")
}

#[test]
fn teams_meta_keys_serialize_as_strings() {
    let snapshot = build_snapshot(&league_source(), &settings(), fixed_now()).expect("snapshot");
    let value = serde_json::to_value(&snapshot).expect("serialize");
    assert_eq!(value["teams_meta"]["13"]["short"], "MCI");
    assert_eq!(value["squads"]["Alice Khan"]["starting"][0]["position"], 1);
    assert_eq!(value["transfers"]["Alice Khan"][0]["in"], "Erling Haaland");
    assert!(value["chips"]["Alice Khan"].is_null());
}

#[test]
fn current_gameweek_prefers_current_then_next_then_default() {
    assert_eq!(
        current_gameweek(&[event(4, false, false), event(5, true, false), event(6, false, true)]),
        5
    );
    assert_eq!(
        current_gameweek(&[event(1, false, false), event(2, false, true)]),
        2
    );
    assert_eq!(current_gameweek(&[event(1, false, false)]), DEFAULT_GAMEWEEK);
    assert_eq!(current_gameweek(&[]), 38);
}

#[test]
fn effective_points_apply_multiplier_only_when_starting() {
    assert_eq!(effective_points(7, 0), 7);
    assert_eq!(effective_points(7, 1), 7);
    assert_eq!(effective_points(7, 2), 14);
    assert_eq!(effective_points(7, 3), 21);
    assert_eq!(effective_points(-2, 2), -4);
}

fn context_with_points(points: &[(u32, i32)]) -> GameweekContext {
    let mut ctx = GameweekContext {
        gameweek: 2,
        ..GameweekContext::default()
    };
    for (id, pts) in points {
        ctx.players.insert(
            *id,
            PlayerInfo {
                name: format!("P{id}"),
                full_name: format!("Player {id}"),
                position: Position::Midfielder,
                team_id: 0,
            },
        );
        ctx.live_points.insert(*id, *pts);
    }
    ctx
}

#[test]
fn gameweek_total_uses_api_value_when_positive() {
    let ctx = context_with_points(&[(1, 20), (2, 15), (3, 15)]);
    let picks = [pick(1, 1, false, false), pick(2, 1, false, false), pick(3, 1, false, false)];

    let (squad, _) = ctx.build_squad(&picks, Some(57));
    assert_eq!(squad.starting.iter().map(|p| p.points).sum::<i32>(), 50);
    assert_eq!(squad.gw_points, 57);
}

#[test]
fn gameweek_total_falls_back_to_sum_when_api_is_zero() {
    let ctx = context_with_points(&[(1, 20), (2, 11), (3, 9)]);
    let picks = [pick(1, 1, false, false), pick(2, 2, true, false), pick(3, 0, false, false)];

    let (squad, starting_names) = ctx.build_squad(&picks, Some(0));
    assert_eq!(squad.gw_points, 42);
    assert_eq!(squad.bench.len(), 1);
    assert_eq!(starting_names, vec!["Player 1", "Player 2"]);
    assert_eq!(gameweek_total(None, &[]), 0);
    assert_eq!(gameweek_total(Some(-4), &squad.starting), 42);
}

#[test]
fn starting_size_matches_non_zero_multipliers() {
    let ctx = context_with_points(&[(1, 1), (2, 2), (3, 3), (4, 4), (5, 5)]);
    let picks = [
        pick(1, 1, false, false),
        pick(2, 0, false, false),
        pick(3, 3, true, false),
        pick(4, 0, false, false),
        pick(5, 1, false, true),
    ];
    let (squad, _) = ctx.build_squad(&picks, None);
    let non_zero = picks.iter().filter(|p| p.multiplier > 0).count();
    assert_eq!(squad.starting.len(), non_zero);
    assert_eq!(squad.bench.len(), picks.len() - non_zero);
}

#[test]
fn equal_positions_keep_pick_order_after_captain_and_vice() {
    let ctx = context_with_points(&[(1, 0), (2, 0), (3, 0), (4, 0)]);
    let picks = [
        pick(1, 1, false, false),
        pick(2, 1, false, true),
        pick(3, 1, false, false),
        pick(4, 2, true, false),
    ];
    let (squad, _) = ctx.build_squad(&picks, None);
    assert_eq!(
        names(&squad.starting),
        vec!["Player 4", "Player 2", "Player 1", "Player 3"]
    );
}

fn result(manager: &str, starting: &[&str]) -> ManagerResult {
    ManagerResult {
        manager: manager.to_string(),
        squad: Squad {
            starting: Vec::new(),
            bench: Vec::new(),
            gw_points: 0,
        },
        captain: String::new(),
        chip: None,
        transfers: Vec::new(),
        starting_names: starting.iter().map(|s| s.to_string()).collect(),
    }
}

#[test]
fn three_owners_is_not_a_differential() {
    let results = vec![
        result("A", &["Salah", "Palmer", "Isak"]),
        result("B", &["Salah", "Palmer"]),
        result("C", &["Salah", "Mbeumo"]),
    ];
    let ownership = build_ownership_index(&results);
    assert_eq!(ownership["Salah"], vec!["A", "B", "C"]);

    let diffs = build_differentials(&ownership);
    let mut expected_unique = BTreeMap::new();
    expected_unique.insert("A".to_string(), vec!["Isak".to_string()]);
    expected_unique.insert("C".to_string(), vec!["Mbeumo".to_string()]);
    assert_eq!(diffs.unique, expected_unique);
    assert_eq!(diffs.duo["A"], vec!["Palmer"]);
    assert_eq!(diffs.duo["B"], vec!["Palmer"]);
    assert!(!diffs.duo.contains_key("C"));
    assert!(
        diffs
            .unique
            .values()
            .chain(diffs.duo.values())
            .all(|players| !players.contains(&"Salah".to_string()))
    );
}

#[test]
fn shared_starter_names_count_their_manager_once() {
    let results = vec![result("A", &["Unknown", "Saka", "Unknown"])];
    let ownership = build_ownership_index(&results);
    assert_eq!(ownership["Unknown"], vec!["A"]);

    let diffs = build_differentials(&ownership);
    assert_eq!(diffs.unique["A"], vec!["Saka", "Unknown"]);
    assert!(diffs.duo.is_empty());
}

#[test]
fn two_unresolved_starters_make_one_ownership_entry() {
    // Dan starts two ids missing from bootstrap; Cara starts one.
    let source = league_source()
        .with_picks(
            104,
            EntryPicks {
                picks: Some(vec![pick(900, 1, true, false), pick(901, 1, false, true)]),
                active_chip: None,
                entry_history: None,
            },
        )
        .with_transfers(104, Vec::new());
    let snapshot = build_snapshot(&source, &settings(), fixed_now()).expect("snapshot");

    let dan = &snapshot.squads["Dan Iqbal"];
    assert_eq!(names(&dan.starting), vec!["Unknown", "Unknown"]);
    assert_eq!(snapshot.captains["Dan Iqbal"], "Unknown");

    let diffs = &snapshot.differentials;
    assert_eq!(diffs.duo["Dan Iqbal"], vec!["Unknown"]);
    assert_eq!(
        diffs.duo["Cara Noor"],
        vec!["David Raya", "Mohamed Salah", "Unknown"]
    );
    assert_eq!(diffs.unique["Cara Noor"], vec!["Phil Foden", "Wilson Isidor"]);
    assert!(!diffs.unique.contains_key("Dan Iqbal"));
}
