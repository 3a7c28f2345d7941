//! Position-aware Value Score.
//!
//! Converts the heterogeneous raw columns into one comparable ranking number
//! per player, with a distinct fixed weight table per canonical position.
//! The weights are product policy, not tunables: changing them reorders every
//! ranking view, so they live here as constants rather than in config.

use serde::{Deserialize, Serialize};

use crate::dataset::{Dataset, PlayerRecord, Position};
use crate::metrics::keys;

// Small offsets keep the inverse terms finite when a metric is exactly zero.
// They compress the score range for zero-metric players slightly; accepted.
const INV_OFFSET: f64 = 0.01;
const FALLBACK_PRICE_OFFSET: f64 = 0.1;

/// Full-season minutes ceiling used to scale the availability term.
const MINUTES_SCALE: f64 = 3000.0;

/// Score one record. Total over every record: rows without a canonical
/// position (team staff, manager entries) get the neutral fallback score.
/// Pure, deterministic, never fails; missing metrics read as zero.
pub fn score_record(record: &PlayerRecord) -> f64 {
    let ppg = record.points_per_game();
    let form = record.form();
    let price = record.price;
    let minutes = record.minutes as f64;

    let raw = match record.position {
        Some(Position::Goalkeeper) => {
            0.25 * ppg
                + 0.20 * record.stat_or(keys::SAVES_PER90, 0.0)
                + 0.20 * record.stat_or(keys::CLEAN_SHEETS_PER90, 0.0)
                + 0.15 * (1.0 / (record.stat_or(keys::XGC_PER90, 0.0) + INV_OFFSET))
                + 0.10 * form
                - 0.10 * price
        }
        Some(Position::Defender) => {
            0.25 * ppg
                + 0.15 * record.stat_or(keys::XGI_PER90, 0.0)
                + 0.15 * (1.0 / (record.stat_or(keys::XGC_PER90, 0.0) + INV_OFFSET))
                + 0.15 * record.stat_or(keys::CLEAN_SHEETS_PER90, 0.0)
                + 0.10 * form
                + 0.10 * (minutes / MINUTES_SCALE)
                - 0.05 * price
        }
        Some(Position::Midfielder) => {
            0.25 * ppg
                + 0.20 * record.stat_or(keys::XG_PER90, 0.0)
                + 0.20 * record.stat_or(keys::XA_PER90, 0.0)
                + 0.10 * record.stat_or(keys::XGI_PER90, 0.0)
                + 0.10 * (1.0 / (record.stat_or(keys::CREATIVITY_RANK, 0.0) + INV_OFFSET))
                + 0.10 * form
                - 0.05 * price
        }
        Some(Position::Forward) => {
            0.30 * ppg
                + 0.30 * record.stat_or(keys::XG_PER90, 0.0)
                + 0.15 * record.stat_or(keys::XGI_PER90, 0.0)
                + 0.10 * form
                + 0.10 * (minutes / MINUTES_SCALE)
                - 0.05 * price
        }
        None => (ppg + record.total_points()) / (price + FALLBACK_PRICE_OFFSET),
    };

    round3(raw)
}

/// Round to 3 decimals; more digits would display false precision.
pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Value scores for a whole dataset, index-aligned with its records, cached
/// on the dataset fingerprint so a view render never recomputes the column.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoreCache {
    fingerprint: String,
    scores: Vec<f64>,
}

impl ScoreCache {
    /// Scores for `dataset`, recomputing only when its fingerprint differs
    /// from the cached one.
    pub fn scores_for(&mut self, dataset: &Dataset) -> &[f64] {
        if self.fingerprint != dataset.fingerprint || self.scores.len() != dataset.records.len() {
            self.scores = dataset.records.iter().map(score_record).collect();
            self.fingerprint = dataset.fingerprint.clone();
        }
        &self.scores
    }

    pub fn matches(&self, dataset: &Dataset) -> bool {
        self.fingerprint == dataset.fingerprint && self.scores.len() == dataset.records.len()
    }
}

/// A record paired with its computed score; the unit the ranking views and
/// exports operate on.
#[derive(Debug, Clone)]
pub struct ScoredPlayer {
    pub record: PlayerRecord,
    pub value_score: f64,
}

pub fn scored_players(dataset: &Dataset, cache: &mut ScoreCache) -> Vec<ScoredPlayer> {
    let scores = cache.scores_for(dataset);
    dataset
        .records
        .iter()
        .zip(scores.iter())
        .map(|(record, score)| ScoredPlayer {
            record: record.clone(),
            value_score: *score,
        })
        .collect()
}
