//! Loading the player snapshot.
//!
//! Three sources, same parsed shape: the live `bootstrap-static` feed, a
//! local JSON snapshot file (`FPL_SNAPSHOT`), or the generated offline sample
//! (`FPL_OFFLINE=1`). The parser is tolerant by construction: rows are raw
//! JSON objects read through the `metrics` accessors, so a snapshot missing
//! optional columns still loads.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;

use crate::dataset::{
    fingerprint_bytes, normalize_position, position_from_element_type, AvailabilityStatus, Dataset,
    DatasetSource, PlayerRecord,
};
use crate::http_cache::fetch_json_cached;
use crate::http_client::http_client;
use crate::metrics::{keys, numeric};
use crate::sample_data;
use crate::value_score::round3;

const BOOTSTRAP_URL: &str = "https://fantasy.premierleague.com/api/bootstrap-static/";
const BOOTSTRAP_MAX_AGE: Duration = Duration::from_secs(15 * 60);
const NEWS_MAX_CHARS: usize = 60;

/// Stat columns copied off each row verbatim when present.
const INGESTED_STATS: &[&str] = &[
    keys::TOTAL_POINTS,
    keys::POINTS_PER_GAME,
    keys::POINTS_PER_MILLION,
    keys::FORM,
    keys::VALUE_SEASON,
    keys::SELECTED_BY_PERCENT,
    keys::XG_PER90,
    keys::XA_PER90,
    keys::XGI_PER90,
    keys::XGC_PER90,
    keys::CLEAN_SHEETS_PER90,
    keys::SAVES_PER90,
    keys::CREATIVITY_RANK,
    keys::CORNERS_ORDER,
    keys::DIRECT_FREEKICKS_ORDER,
    keys::PENALTIES_ORDER,
];

/// Load the dataset from whichever source the environment selects.
pub fn load_dataset() -> Result<Dataset> {
    if std::env::var("FPL_OFFLINE").map(|v| v == "1").unwrap_or(false) {
        return Ok(sample_data::sample_dataset());
    }
    if let Ok(path) = std::env::var("FPL_SNAPSHOT") {
        if !path.trim().is_empty() {
            return load_snapshot_file(Path::new(&path));
        }
    }
    load_live()
}

pub fn load_live() -> Result<Dataset> {
    let client = http_client()?;
    let body = fetch_json_cached(client, BOOTSTRAP_URL, BOOTSTRAP_MAX_AGE)
        .context("fetch bootstrap-static")?;
    let snapshot = parse_bootstrap(&body)?;
    Ok(Dataset::new(
        snapshot.records,
        snapshot.teams_by_id,
        fingerprint_bytes(body.as_bytes()),
        DatasetSource::Live,
    ))
}

pub fn load_snapshot_file(path: &Path) -> Result<Dataset> {
    let body = fs::read_to_string(path)
        .with_context(|| format!("read snapshot {}", path.display()))?;
    let snapshot = parse_bootstrap(&body)?;
    Ok(Dataset::new(
        snapshot.records,
        snapshot.teams_by_id,
        fingerprint_bytes(body.as_bytes()),
        DatasetSource::SnapshotFile,
    ))
}

/// Parsed rows plus the team id lookup the history feed needs.
#[derive(Debug, Clone)]
pub struct ParsedSnapshot {
    pub records: Vec<PlayerRecord>,
    pub teams_by_id: HashMap<u32, String>,
}

#[derive(Debug, Deserialize)]
struct Bootstrap {
    #[serde(default)]
    elements: Vec<Value>,
    #[serde(default)]
    teams: Vec<TeamRow>,
    #[serde(default)]
    element_types: Vec<ElementTypeRow>,
}

#[derive(Debug, Deserialize)]
struct TeamRow {
    id: u32,
    name: String,
}

#[derive(Debug, Deserialize)]
struct ElementTypeRow {
    id: u8,
    #[serde(default)]
    singular_name: String,
    #[serde(default)]
    singular_name_short: String,
}

/// Parse a `bootstrap-static`-shaped document into player records.
/// Rows without an id are skipped; everything else degrades field by field.
pub fn parse_bootstrap(raw: &str) -> Result<ParsedSnapshot> {
    let doc: Bootstrap = serde_json::from_str(raw).context("invalid bootstrap json")?;

    let team_names: HashMap<u32, String> =
        doc.teams.iter().map(|t| (t.id, t.name.clone())).collect();
    let type_names: HashMap<u8, String> = doc
        .element_types
        .iter()
        .map(|t| {
            let name = if !t.singular_name.trim().is_empty() {
                t.singular_name.clone()
            } else {
                t.singular_name_short.clone()
            };
            (t.id, name)
        })
        .collect();

    let mut records = Vec::with_capacity(doc.elements.len());
    for row in &doc.elements {
        if let Some(record) = parse_element(row, &team_names, &type_names) {
            records.push(record);
        }
    }
    Ok(ParsedSnapshot {
        records,
        teams_by_id: team_names,
    })
}

fn parse_element(
    row: &Value,
    team_names: &HashMap<u32, String>,
    type_names: &HashMap<u8, String>,
) -> Option<PlayerRecord> {
    let id = row.get("id").and_then(Value::as_u64)? as u32;

    let name = row
        .get("web_name")
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| {
            let first = row.get("first_name").and_then(Value::as_str)?;
            let second = row.get("second_name").and_then(Value::as_str)?;
            Some(format!("{first} {second}"))
        })
        .unwrap_or_else(|| format!("Player {id}"))
        .trim()
        .to_string();

    let team = row
        .get("team")
        .and_then(Value::as_u64)
        .and_then(|tid| team_names.get(&(tid as u32)).cloned())
        .or_else(|| {
            row.get("team")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| "Unknown".to_string());

    // Position: the element_type lookup when the feed provides one, else a
    // literal position column (exported snapshots carry either spelling).
    let element_type = row.get("element_type").and_then(Value::as_u64).map(|t| t as u8);
    let position_raw = element_type
        .and_then(|t| type_names.get(&t).cloned())
        .filter(|s| !s.trim().is_empty())
        .or_else(|| {
            row.get("position")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_default();
    let position = normalize_position(&position_raw)
        .or_else(|| element_type.and_then(position_from_element_type));

    // Live feed prices come as tenths of a million.
    let price = match row.get("now_cost").and_then(numeric) {
        Some(now_cost) => now_cost / 10.0,
        None => row.get("price").and_then(numeric).unwrap_or(0.0),
    }
    .max(0.0);

    let minutes = row
        .get("minutes")
        .and_then(numeric)
        .map(|m| m.max(0.0) as u32)
        .unwrap_or(0);

    let status = row
        .get("status")
        .and_then(Value::as_str)
        .map(AvailabilityStatus::from_code)
        .unwrap_or(AvailabilityStatus::Unknown);

    let news: String = row
        .get("news")
        .and_then(Value::as_str)
        .unwrap_or("")
        .chars()
        .take(NEWS_MAX_CHARS)
        .collect();

    let mut stats = HashMap::new();
    for key in INGESTED_STATS {
        if let Some(value) = row.get(*key).and_then(numeric) {
            stats.insert((*key).to_string(), value);
        }
    }
    if !stats.contains_key(keys::POINTS_PER_MILLION) && price > 0.0 {
        if let Some(total) = stats.get(keys::TOTAL_POINTS).copied() {
            stats.insert(keys::POINTS_PER_MILLION.to_string(), round3(total / price));
        }
    }

    Some(PlayerRecord {
        id,
        name,
        team,
        position_raw,
        position,
        price,
        minutes,
        status,
        news,
        stats,
    })
}
