use std::fs;
use std::path::PathBuf;

use fpl_terminal::dataset::{AvailabilityStatus, Position};
use fpl_terminal::dataset_fetch::parse_bootstrap;
use fpl_terminal::history_fetch::parse_element_summary;
use fpl_terminal::metrics::keys;

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

#[test]
fn parses_bootstrap_fixture() {
    let raw = read_fixture("bootstrap_static_sample.json");
    let snapshot = parse_bootstrap(&raw).expect("fixture should parse");

    // The id-less "Ghost" row is dropped, everything else survives.
    assert_eq!(snapshot.records.len(), 6);
    assert_eq!(snapshot.teams_by_id.len(), 3);
    assert_eq!(snapshot.teams_by_id.get(&2).map(String::as_str), Some("Liverpool"));
}

#[test]
fn bootstrap_positions_resolve_from_element_types() {
    let raw = read_fixture("bootstrap_static_sample.json");
    let snapshot = parse_bootstrap(&raw).expect("fixture should parse");
    let by_id = |id: u32| {
        snapshot
            .records
            .iter()
            .find(|r| r.id == id)
            .expect("player in fixture")
    };

    assert_eq!(by_id(101).position, Some(Position::Goalkeeper));
    assert_eq!(by_id(102).position, Some(Position::Defender));
    assert_eq!(by_id(103).position, Some(Position::Midfielder));
    assert_eq!(by_id(104).position, Some(Position::Forward));
    // element_type 5 is a manager, not a canonical position.
    assert_eq!(by_id(105).position, None);
    assert_eq!(by_id(105).position_raw, "Manager");
}

#[test]
fn bootstrap_string_numerics_and_price_scale() {
    let raw = read_fixture("bootstrap_static_sample.json");
    let snapshot = parse_bootstrap(&raw).expect("fixture should parse");
    let salah = snapshot
        .records
        .iter()
        .find(|r| r.name == "Salah")
        .expect("Salah in fixture");

    // now_cost is tenths of a million.
    assert!((salah.price - 13.1).abs() < 1e-9);
    assert!((salah.points_per_game() - 7.3).abs() < 1e-9);
    assert!((salah.stat_or(keys::XG_PER90, 0.0) - 0.68).abs() < 1e-9);
    assert_eq!(salah.stat_or(keys::CREATIVITY_RANK, 0.0), 2.0);
    assert_eq!(salah.stat_or(keys::PENALTIES_ORDER, 0.0), 1.0);
    // points_per_million is derived when the feed omits it.
    let ppm = salah.stat_or(keys::POINTS_PER_MILLION, 0.0);
    assert!((ppm - 16.107).abs() < 1e-6);
}

#[test]
fn bootstrap_snapshot_spelling_round_trips() {
    let raw = read_fixture("bootstrap_static_sample.json");
    let snapshot = parse_bootstrap(&raw).expect("fixture should parse");
    let trialist = snapshot
        .records
        .iter()
        .find(|r| r.id == 107)
        .expect("Trialist in fixture");

    // Exported snapshots carry literal team/position/price columns.
    assert_eq!(trialist.team, "Loan XI");
    assert_eq!(trialist.position, Some(Position::Forward));
    assert!((trialist.price - 4.4).abs() < 1e-9);
    assert_eq!(trialist.status, AvailabilityStatus::Doubtful);
}

#[test]
fn bootstrap_news_is_truncated() {
    let raw = read_fixture("bootstrap_static_sample.json");
    let snapshot = parse_bootstrap(&raw).expect("fixture should parse");
    let wissa = snapshot
        .records
        .iter()
        .find(|r| r.name == "Wissa")
        .expect("Wissa in fixture");

    assert_eq!(wissa.status, AvailabilityStatus::Injured);
    assert_eq!(wissa.news.chars().count(), 60);
    assert!(wissa.news.starts_with("Knee injury"));
}

#[test]
fn parses_element_summary_fixture() {
    let raw = read_fixture("element_summary_sample.json");
    let snapshot = parse_bootstrap(&read_fixture("bootstrap_static_sample.json"))
        .expect("fixture should parse");
    let rows = parse_element_summary(&raw, &snapshot.teams_by_id).expect("fixture should parse");

    // The round-less row is dropped; the rest come back sorted by round.
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].round, 1);
    assert_eq!(rows[0].opponent, "Brentford");
    assert_eq!(rows[1].round, 2);
    assert_eq!(rows[1].opponent, "Arsenal");
    assert_eq!(rows[1].total_points, 9);
    // Unknown opponent id and missing kickoff degrade, not fail.
    assert_eq!(rows[2].opponent, "?");
    assert!(rows[2].kickoff.is_none());
}

#[test]
fn empty_bootstrap_is_empty_not_error() {
    let snapshot = parse_bootstrap("{}").expect("empty doc should parse");
    assert!(snapshot.records.is_empty());
    assert!(snapshot.teams_by_id.is_empty());
}
