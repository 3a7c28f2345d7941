//! Ranking and filter pipeline.
//!
//! Every table in the UI is this one pipeline invoked with different
//! parameters: an optional AND-ed predicate set, a stable descending sort by
//! a chosen key, and the differential-pick derivation. Views never re-derive
//! their own filtering.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::dataset::Position;
use crate::value_score::ScoredPlayer;

pub const DIFFERENTIAL_OWNERSHIP_CEILING: f64 = 10.0;
pub const DIFFERENTIAL_LIMIT: usize = 10;
pub const DEFAULT_TOP_N: usize = 10;

/// Sort keys offered by the ranking views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortKey {
    ValueScore,
    PointsPerMillion,
    TotalPoints,
    ValueSeason,
    Form,
}

impl SortKey {
    pub const ALL: [SortKey; 5] = [
        SortKey::ValueScore,
        SortKey::PointsPerMillion,
        SortKey::TotalPoints,
        SortKey::ValueSeason,
        SortKey::Form,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SortKey::ValueScore => "Value Score",
            SortKey::PointsPerMillion => "Points per Million",
            SortKey::TotalPoints => "Total Points",
            SortKey::ValueSeason => "Value/Season",
            SortKey::Form => "Form",
        }
    }

    pub fn next(self) -> SortKey {
        match self {
            SortKey::ValueScore => SortKey::PointsPerMillion,
            SortKey::PointsPerMillion => SortKey::TotalPoints,
            SortKey::TotalPoints => SortKey::ValueSeason,
            SortKey::ValueSeason => SortKey::Form,
            SortKey::Form => SortKey::ValueScore,
        }
    }

    pub fn value(self, player: &ScoredPlayer) -> f64 {
        match self {
            SortKey::ValueScore => player.value_score,
            SortKey::PointsPerMillion => player
                .record
                .stat_or(crate::metrics::keys::POINTS_PER_MILLION, 0.0),
            SortKey::TotalPoints => player.record.total_points(),
            SortKey::ValueSeason => player.record.value_season(),
            SortKey::Form => player.record.form(),
        }
    }
}

/// Independently optional constraints, AND-ed together.
///
/// `None` on a membership constraint means "no constraint"; `Some` with an
/// empty set is an explicit empty selection and matches nothing. A UI slider
/// whose data range collapses to `min == max` must stay `None` here, so it
/// never becomes an unusable fixed-point bound.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlayerFilter {
    pub positions: Option<HashSet<Position>>,
    pub teams: Option<HashSet<String>>,
    pub max_price: Option<f64>,
    pub min_minutes: Option<u32>,
    pub min_form: Option<f64>,
    pub min_value: Option<f64>,
    pub max_selected: Option<f64>,
}

impl PlayerFilter {
    pub fn is_empty(&self) -> bool {
        self.positions.is_none()
            && self.teams.is_none()
            && self.max_price.is_none()
            && self.min_minutes.is_none()
            && self.min_form.is_none()
            && self.min_value.is_none()
            && self.max_selected.is_none()
    }

    pub fn matches(&self, player: &ScoredPlayer) -> bool {
        let record = &player.record;
        if let Some(positions) = &self.positions {
            let Some(position) = record.position else {
                return false;
            };
            if !positions.contains(&position) {
                return false;
            }
        }
        if let Some(teams) = &self.teams {
            if !teams.contains(&record.team) {
                return false;
            }
        }
        if let Some(max_price) = self.max_price {
            if record.price > max_price {
                return false;
            }
        }
        if let Some(min_minutes) = self.min_minutes {
            if record.minutes < min_minutes {
                return false;
            }
        }
        if let Some(min_form) = self.min_form {
            if record.form() < min_form {
                return false;
            }
        }
        if let Some(min_value) = self.min_value {
            if record.value_season() < min_value {
                return false;
            }
        }
        if let Some(max_selected) = self.max_selected {
            if record.selected_by_percent() > max_selected {
                return false;
            }
        }
        true
    }

    /// The matching subset, input order preserved. An empty result is a
    /// valid outcome, not an error.
    pub fn apply(&self, players: &[ScoredPlayer]) -> Vec<ScoredPlayer> {
        players
            .iter()
            .filter(|p| self.matches(p))
            .cloned()
            .collect()
    }
}

/// Top `n` players by `key`, descending. The sort is stable: equal keys keep
/// their input order.
pub fn top_n(players: &[ScoredPlayer], key: SortKey, n: usize) -> Vec<ScoredPlayer> {
    let mut out: Vec<ScoredPlayer> = players.to_vec();
    out.sort_by(|a, b| {
        key.value(b)
            .partial_cmp(&key.value(a))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    out.truncate(n);
    out
}

/// Differential picks: ownership under 10%, value_season at or above the
/// median of the population passed in. Callers filter first; the median is
/// taken over that filtered population, which is what makes the view line up
/// with the table next to it.
pub fn differential_picks(players: &[ScoredPlayer]) -> Vec<ScoredPlayer> {
    let Some(median) = median_value_season(players) else {
        return Vec::new();
    };
    let contrarian: Vec<ScoredPlayer> = players
        .iter()
        .filter(|p| {
            p.record.selected_by_percent() < DIFFERENTIAL_OWNERSHIP_CEILING
                && p.record.value_season() >= median
        })
        .cloned()
        .collect();
    top_n(&contrarian, SortKey::ValueSeason, DIFFERENTIAL_LIMIT)
}

pub fn median_value_season(players: &[ScoredPlayer]) -> Option<f64> {
    if players.is_empty() {
        return None;
    }
    let mut values: Vec<f64> = players.iter().map(|p| p.record.value_season()).collect();
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        Some(values[mid])
    } else {
        Some((values[mid - 1] + values[mid]) / 2.0)
    }
}
