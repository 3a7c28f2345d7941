//! In-memory player dataset: one record per row of the loaded snapshot.

use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::metrics::keys;

/// Canonical position categories. Everything that scores position-aware maps
/// into one of these four; manager rows and other non-player entities do not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Position {
    Goalkeeper,
    Defender,
    Midfielder,
    Forward,
}

impl Position {
    pub const ALL: [Position; 4] = [
        Position::Goalkeeper,
        Position::Defender,
        Position::Midfielder,
        Position::Forward,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Position::Goalkeeper => "Goalkeeper",
            Position::Defender => "Defender",
            Position::Midfielder => "Midfielder",
            Position::Forward => "Forward",
        }
    }

    pub fn short(self) -> &'static str {
        match self {
            Position::Goalkeeper => "GKP",
            Position::Defender => "DEF",
            Position::Midfielder => "MID",
            Position::Forward => "FWD",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// The feed uses full names in `element_types.singular_name` and short codes
// in `singular_name_short`; older exported snapshots carry either spelling.
// One table, applied at ingest, so nothing downstream branches on spelling.
static POSITION_SPELLINGS: Lazy<HashMap<&'static str, Position>> = Lazy::new(|| {
    HashMap::from([
        ("goalkeeper", Position::Goalkeeper),
        ("gkp", Position::Goalkeeper),
        ("gk", Position::Goalkeeper),
        ("defender", Position::Defender),
        ("def", Position::Defender),
        ("midfielder", Position::Midfielder),
        ("mid", Position::Midfielder),
        ("forward", Position::Forward),
        ("fwd", Position::Forward),
        ("fw", Position::Forward),
    ])
});

/// Map a raw position spelling to the canonical category, if it has one.
pub fn normalize_position(raw: &str) -> Option<Position> {
    POSITION_SPELLINGS
        .get(raw.trim().to_lowercase().as_str())
        .copied()
}

/// Map an FPL `element_type` id to the canonical category. Ids above 4 are
/// non-player rows (the feed added assistant managers as type 5).
pub fn position_from_element_type(element_type: u8) -> Option<Position> {
    match element_type {
        1 => Some(Position::Goalkeeper),
        2 => Some(Position::Defender),
        3 => Some(Position::Midfielder),
        4 => Some(Position::Forward),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AvailabilityStatus {
    Available,
    Doubtful,
    Injured,
    Suspended,
    Unknown,
}

impl AvailabilityStatus {
    /// FPL status codes: a=available, d=doubtful, i=injured, s=suspended.
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "a" => AvailabilityStatus::Available,
            "d" => AvailabilityStatus::Doubtful,
            "i" => AvailabilityStatus::Injured,
            "s" => AvailabilityStatus::Suspended,
            _ => AvailabilityStatus::Unknown,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AvailabilityStatus::Available => "OK",
            AvailabilityStatus::Doubtful => "?",
            AvailabilityStatus::Injured => "INJ",
            AvailabilityStatus::Suspended => "SUS",
            AvailabilityStatus::Unknown => "-",
        }
    }
}

/// One row of the loaded snapshot. Mandatory identity fields are typed;
/// every numeric stat lives in `stats` and is read through the tolerant
/// accessors, since no optional column is guaranteed present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub id: u32,
    pub name: String,
    pub team: String,
    /// Spelling as it appeared in the source, kept for display/export.
    pub position_raw: String,
    pub position: Option<Position>,
    /// Currency-millions.
    pub price: f64,
    pub minutes: u32,
    pub status: AvailabilityStatus,
    pub news: String,
    pub stats: HashMap<String, f64>,
}

impl PlayerRecord {
    pub fn stat(&self, key: &str) -> Option<f64> {
        self.stats.get(key).copied().filter(|v| v.is_finite())
    }

    /// Missing, absent-column and non-finite values all read as `default`.
    pub fn stat_or(&self, key: &str, default: f64) -> f64 {
        self.stat(key).unwrap_or(default)
    }

    pub fn total_points(&self) -> f64 {
        self.stat_or(keys::TOTAL_POINTS, 0.0)
    }

    pub fn points_per_game(&self) -> f64 {
        self.stat_or(keys::POINTS_PER_GAME, 0.0)
    }

    pub fn form(&self) -> f64 {
        self.stat_or(keys::FORM, 0.0)
    }

    pub fn value_season(&self) -> f64 {
        self.stat_or(keys::VALUE_SEASON, 0.0)
    }

    pub fn selected_by_percent(&self) -> f64 {
        self.stat_or(keys::SELECTED_BY_PERCENT, 0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DatasetSource {
    Live,
    SnapshotFile,
    Sample,
}

impl DatasetSource {
    pub fn label(self) -> &'static str {
        match self {
            DatasetSource::Live => "live",
            DatasetSource::SnapshotFile => "snapshot",
            DatasetSource::Sample => "sample",
        }
    }
}

/// An immutable snapshot of the player universe. The fingerprint keys the
/// value-score cache: scores recompute only when it changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    pub records: Vec<PlayerRecord>,
    /// Source team ids to display names, for mapping opponent ids in the
    /// gameweek history feed.
    pub teams_by_id: HashMap<u32, String>,
    pub fingerprint: String,
    pub source: DatasetSource,
    /// Unix seconds of the load, for the "data updated" footer.
    pub loaded_at: u64,
}

impl Dataset {
    pub fn new(
        records: Vec<PlayerRecord>,
        teams_by_id: HashMap<u32, String>,
        fingerprint: String,
        source: DatasetSource,
    ) -> Self {
        let loaded_at = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        Dataset {
            records,
            teams_by_id,
            fingerprint,
            source,
            loaded_at,
        }
    }

    /// Distinct team names, sorted, for the team filter.
    pub fn team_names(&self) -> Vec<String> {
        let mut teams: Vec<String> = self.records.iter().map(|r| r.team.clone()).collect();
        teams.sort();
        teams.dedup();
        teams
    }
}

/// SHA-256 hex digest of the raw snapshot bytes.
pub fn fingerprint_bytes(raw: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw);
    let digest = hasher.finalize();
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_both_spelling_families() {
        assert_eq!(normalize_position("Goalkeeper"), Some(Position::Goalkeeper));
        assert_eq!(normalize_position("GKP"), Some(Position::Goalkeeper));
        assert_eq!(normalize_position("gk"), Some(Position::Goalkeeper));
        assert_eq!(normalize_position("Defender"), Some(Position::Defender));
        assert_eq!(normalize_position("DEF"), Some(Position::Defender));
        assert_eq!(normalize_position("Midfielder"), Some(Position::Midfielder));
        assert_eq!(normalize_position(" MID "), Some(Position::Midfielder));
        assert_eq!(normalize_position("Forward"), Some(Position::Forward));
        assert_eq!(normalize_position("FWD"), Some(Position::Forward));
        assert_eq!(normalize_position("Manager"), None);
        assert_eq!(normalize_position("AM"), None);
    }

    #[test]
    fn element_type_five_is_not_a_player() {
        assert_eq!(position_from_element_type(1), Some(Position::Goalkeeper));
        assert_eq!(position_from_element_type(4), Some(Position::Forward));
        assert_eq!(position_from_element_type(5), None);
        assert_eq!(position_from_element_type(0), None);
    }

    #[test]
    fn fingerprint_is_stable_and_content_sensitive() {
        let a = fingerprint_bytes(b"snapshot-a");
        let b = fingerprint_bytes(b"snapshot-a");
        let c = fingerprint_bytes(b"snapshot-b");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
    }
}
