//! Per-player gameweek history from the `element-summary` endpoint.
//!
//! The history feeds the Performance tab directly; it never passes through
//! scoring or filtering.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::http_cache::fetch_json_cached;
use crate::http_client::http_client;
use crate::metrics::numeric;

const SUMMARY_MAX_AGE: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameweekEntry {
    pub round: u32,
    pub total_points: i32,
    pub opponent: String,
    pub minutes: u32,
    pub kickoff: Option<String>,
}

fn summary_url(player_id: u32) -> String {
    format!("https://fantasy.premierleague.com/api/element-summary/{player_id}/")
}

/// Fetch the finished-gameweek rows for one player. `team_names` maps FPL
/// team ids to display names for the opponent column.
pub fn fetch_player_history(
    player_id: u32,
    team_names: &HashMap<u32, String>,
) -> Result<Vec<GameweekEntry>> {
    let client = http_client()?;
    let body = fetch_json_cached(client, &summary_url(player_id), SUMMARY_MAX_AGE)
        .with_context(|| format!("fetch element-summary for player {player_id}"))?;
    parse_element_summary(&body, team_names)
}

/// Parse an `element-summary` document. Rows missing a round are skipped;
/// every other field degrades to a default.
pub fn parse_element_summary(
    raw: &str,
    team_names: &HashMap<u32, String>,
) -> Result<Vec<GameweekEntry>> {
    let root: Value = serde_json::from_str(raw).context("invalid element-summary json")?;
    let Some(history) = root.get("history").and_then(Value::as_array) else {
        return Ok(Vec::new());
    };

    let mut entries = Vec::with_capacity(history.len());
    for row in history {
        let Some(round) = row.get("round").and_then(numeric) else {
            continue;
        };
        let opponent = row
            .get("opponent_team")
            .and_then(Value::as_u64)
            .and_then(|tid| team_names.get(&(tid as u32)).cloned())
            .or_else(|| {
                row.get("opponent_team")
                    .and_then(Value::as_str)
                    .map(str::to_string)
            })
            .unwrap_or_else(|| "?".to_string());
        entries.push(GameweekEntry {
            round: round.max(0.0) as u32,
            total_points: row.get("total_points").and_then(numeric).unwrap_or(0.0) as i32,
            opponent,
            minutes: row.get("minutes").and_then(numeric).unwrap_or(0.0).max(0.0) as u32,
            kickoff: row
                .get("kickoff_time")
                .and_then(Value::as_str)
                .map(str::to_string),
        });
    }
    entries.sort_by_key(|e| e.round);
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_history_rows_and_maps_opponents() {
        let team_names = HashMap::from([(3u32, "Arsenal".to_string())]);
        let raw = r#"{"history":[
            {"round":2,"total_points":9,"opponent_team":3,"minutes":90,"kickoff_time":"2025-08-23T14:00:00Z"},
            {"round":1,"total_points":2,"opponent_team":99,"minutes":45}
        ]}"#;
        let rows = parse_element_summary(raw, &team_names).expect("parses");
        assert_eq!(rows.len(), 2);
        // Sorted by round.
        assert_eq!(rows[0].round, 1);
        assert_eq!(rows[0].opponent, "?");
        assert_eq!(rows[1].opponent, "Arsenal");
        assert_eq!(rows[1].total_points, 9);
        assert_eq!(rows[1].kickoff.as_deref(), Some("2025-08-23T14:00:00Z"));
    }

    #[test]
    fn missing_history_array_is_empty_not_error() {
        let rows = parse_element_summary(r#"{"fixtures":[]}"#, &HashMap::new()).expect("parses");
        assert!(rows.is_empty());
    }
}
