//! Multi-metric comparison matrix for the radar view.
//!
//! Min-max normalizes each selected metric across the selected players so
//! axes with wildly different scales (total points vs xG per 90) land on a
//! shared [0, 1] range. Columns without enough signal are pruned, and the
//! builder refuses to produce a matrix it cannot normalize meaningfully.

use std::error::Error;
use std::fmt;

use crate::value_score::ScoredPlayer;

/// Guards a zero-range column; such a column normalizes to all zeros.
const RANGE_EPSILON: f64 = 1e-6;

pub const MIN_PLAYERS: usize = 2;
pub const MIN_METRICS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonError {
    /// Fewer than two selected players hold usable data across the
    /// surviving metrics.
    NotEnoughPlayers,
    /// Fewer than two metric columns survive pruning.
    NotEnoughMetrics,
}

impl fmt::Display for ComparisonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComparisonError::NotEnoughPlayers => {
                write!(f, "not enough players with data for the selected metrics")
            }
            ComparisonError::NotEnoughMetrics => {
                write!(f, "not enough valid metrics across the selected players")
            }
        }
    }
}

impl Error for ComparisonError {}

/// Request-scoped players × metrics matrix of values in [0, 1].
/// `values[player_index][metric_index]` pairs with `players`/`metrics`.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonMatrix {
    pub players: Vec<String>,
    pub metrics: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

impl ComparisonMatrix {
    pub fn row(&self, player: &str) -> Option<&[f64]> {
        self.players
            .iter()
            .position(|p| p == player)
            .map(|i| self.values[i].as_slice())
    }
}

/// Build the normalized matrix for `players` over `metric_keys`.
///
/// Pipeline: missing values read as 0; a metric column is kept only when at
/// least two players hold a value above 0; a player is kept only when every
/// surviving metric is above 0 for them; each surviving column is scaled by
/// `(v - min) / (max - min + eps)`.
pub fn build_comparison(
    players: &[ScoredPlayer],
    metric_keys: &[&str],
) -> Result<ComparisonMatrix, ComparisonError> {
    if metric_keys.len() < MIN_METRICS {
        return Err(ComparisonError::NotEnoughMetrics);
    }
    if players.len() < MIN_PLAYERS {
        return Err(ComparisonError::NotEnoughPlayers);
    }

    let raw: Vec<Vec<f64>> = players
        .iter()
        .map(|p| {
            metric_keys
                .iter()
                .map(|key| p.record.stat_or(key, 0.0))
                .collect()
        })
        .collect();

    let surviving_metrics: Vec<usize> = (0..metric_keys.len())
        .filter(|&m| raw.iter().filter(|row| row[m] > 0.0).count() >= MIN_PLAYERS)
        .collect();
    if surviving_metrics.len() < MIN_METRICS {
        return Err(ComparisonError::NotEnoughMetrics);
    }

    let surviving_players: Vec<usize> = (0..players.len())
        .filter(|&p| surviving_metrics.iter().all(|&m| raw[p][m] > 0.0))
        .collect();
    if surviving_players.len() < MIN_PLAYERS {
        return Err(ComparisonError::NotEnoughPlayers);
    }

    let mut values = vec![vec![0.0; surviving_metrics.len()]; surviving_players.len()];
    for (out_m, &m) in surviving_metrics.iter().enumerate() {
        let column: Vec<f64> = surviving_players.iter().map(|&p| raw[p][m]).collect();
        let min = column.iter().copied().fold(f64::INFINITY, f64::min);
        let max = column.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let range = max - min + RANGE_EPSILON;
        for (out_p, value) in column.iter().enumerate() {
            values[out_p][out_m] = (value - min) / range;
        }
    }

    Ok(ComparisonMatrix {
        players: surviving_players
            .iter()
            .map(|&p| players[p].record.name.clone())
            .collect(),
        metrics: surviving_metrics
            .iter()
            .map(|&m| metric_keys[m].to_string())
            .collect(),
        values,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{AvailabilityStatus, PlayerRecord, Position};
    use std::collections::HashMap;

    fn player(name: &str, stats: &[(&str, f64)]) -> ScoredPlayer {
        let mut map = HashMap::new();
        for (k, v) in stats {
            map.insert(k.to_string(), *v);
        }
        ScoredPlayer {
            record: PlayerRecord {
                id: 0,
                name: name.to_string(),
                team: "Test FC".to_string(),
                position_raw: String::new(),
                position: Some(Position::Midfielder),
                price: 5.0,
                minutes: 900,
                status: AvailabilityStatus::Available,
                news: String::new(),
                stats: map,
            },
            value_score: 0.0,
        }
    }

    #[test]
    fn normalizes_each_column_to_unit_range() {
        let players = vec![
            player("Alpha", &[("xg", 0.2), ("xa", 0.1)]),
            player("Beta", &[("xg", 0.6), ("xa", 0.3)]),
        ];
        let matrix = build_comparison(&players, &["xg", "xa"]).expect("matrix builds");
        assert_eq!(matrix.players, vec!["Alpha", "Beta"]);
        assert_eq!(matrix.metrics, vec!["xg", "xa"]);

        let alpha = matrix.row("Alpha").unwrap();
        let beta = matrix.row("Beta").unwrap();
        // Column minimum maps to 0; maximum lands just under 1 (epsilon).
        assert_eq!(alpha[0], 0.0);
        assert!((beta[0] - 1.0).abs() < 1e-4);
        assert!(beta[1] > alpha[1]);
    }

    #[test]
    fn constant_column_normalizes_to_zero_without_error() {
        let players = vec![
            player("Alpha", &[("xg", 0.5), ("xa", 0.1)]),
            player("Beta", &[("xg", 0.5), ("xa", 0.4)]),
        ];
        let matrix = build_comparison(&players, &["xg", "xa"]).expect("matrix builds");
        for row in &matrix.values {
            assert_eq!(row[0], 0.0);
            assert!(row[0].is_finite());
        }
    }

    #[test]
    fn metric_without_two_positive_holders_is_pruned() {
        // "saves" is positive for only one outfielder; it must be dropped and
        // the remaining single metric is not enough.
        let players = vec![
            player("Alpha", &[("xg", 0.5), ("saves", 3.0)]),
            player("Beta", &[("xg", 0.4), ("saves", 0.0)]),
        ];
        assert_eq!(
            build_comparison(&players, &["xg", "saves"]),
            Err(ComparisonError::NotEnoughMetrics)
        );
    }

    #[test]
    fn single_metric_request_is_rejected_up_front() {
        let players = vec![player("Alpha", &[("xg", 0.5)]), player("Beta", &[("xg", 0.4)])];
        assert_eq!(
            build_comparison(&players, &["xg"]),
            Err(ComparisonError::NotEnoughMetrics)
        );
    }

    #[test]
    fn players_missing_a_surviving_metric_are_dropped() {
        let players = vec![
            player("Alpha", &[("xg", 0.5), ("xa", 0.2)]),
            player("Beta", &[("xg", 0.4), ("xa", 0.3)]),
            player("Gamma", &[("xg", 0.6)]), // no xa recorded
        ];
        let matrix = build_comparison(&players, &["xg", "xa"]).expect("matrix builds");
        assert_eq!(matrix.players, vec!["Alpha", "Beta"]);
    }

    #[test]
    fn too_few_complete_players_is_an_explicit_signal() {
        let players = vec![
            player("Alpha", &[("xg", 0.5), ("xa", 0.2)]),
            player("Beta", &[("xg", 0.4)]),
            player("Gamma", &[("xa", 0.3)]),
        ];
        assert_eq!(
            build_comparison(&players, &["xg", "xa"]),
            Err(ComparisonError::NotEnoughPlayers)
        );
    }

    #[test]
    fn fewer_than_two_players_is_rejected() {
        let players = vec![player("Alpha", &[("xg", 0.5), ("xa", 0.2)])];
        assert_eq!(
            build_comparison(&players, &["xg", "xa"]),
            Err(ComparisonError::NotEnoughPlayers)
        );
    }
}
