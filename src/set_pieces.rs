//! Set-piece taker orders per team, derived from the snapshot's three order
//! columns. A lower order means first in line; players with no order on any
//! column are omitted.

use crate::dataset::{AvailabilityStatus, PlayerRecord};
use crate::metrics::keys;

#[derive(Debug, Clone, PartialEq)]
pub struct SetPieceRow {
    pub player: String,
    pub team: String,
    pub position: String,
    pub corners: Option<u32>,
    pub direct_freekicks: Option<u32>,
    pub penalties: Option<u32>,
    pub status: AvailabilityStatus,
}

fn order(record: &PlayerRecord, key: &str) -> Option<u32> {
    record.stat(key).filter(|v| *v >= 1.0).map(|v| v as u32)
}

/// Rows for every player holding at least one set-piece order, sorted by
/// team, then position spelling, then name.
pub fn set_piece_rows(records: &[PlayerRecord]) -> Vec<SetPieceRow> {
    let mut rows: Vec<SetPieceRow> = records
        .iter()
        .filter_map(|record| {
            let corners = order(record, keys::CORNERS_ORDER);
            let direct_freekicks = order(record, keys::DIRECT_FREEKICKS_ORDER);
            let penalties = order(record, keys::PENALTIES_ORDER);
            if corners.is_none() && direct_freekicks.is_none() && penalties.is_none() {
                return None;
            }
            Some(SetPieceRow {
                player: record.name.clone(),
                team: record.team.clone(),
                position: record.position_raw.clone(),
                corners,
                direct_freekicks,
                penalties,
                status: record.status,
            })
        })
        .collect();
    rows.sort_by(|a, b| {
        a.team
            .cmp(&b.team)
            .then_with(|| a.position.cmp(&b.position))
            .then_with(|| a.player.cmp(&b.player))
    });
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Position;
    use std::collections::HashMap;

    fn record(name: &str, team: &str, orders: &[(&str, f64)]) -> PlayerRecord {
        let mut stats = HashMap::new();
        for (k, v) in orders {
            stats.insert(k.to_string(), *v);
        }
        PlayerRecord {
            id: 0,
            name: name.to_string(),
            team: team.to_string(),
            position_raw: "Midfielder".to_string(),
            position: Some(Position::Midfielder),
            price: 5.0,
            minutes: 900,
            status: AvailabilityStatus::Available,
            news: String::new(),
            stats,
        }
    }

    #[test]
    fn keeps_only_players_with_an_order_and_groups_by_team() {
        let records = vec![
            record("Taker B", "Zeta FC", &[(keys::PENALTIES_ORDER, 1.0)]),
            record("No Orders", "Alpha FC", &[]),
            record("Taker A", "Alpha FC", &[(keys::CORNERS_ORDER, 2.0)]),
        ];
        let rows = set_piece_rows(&records);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].player, "Taker A");
        assert_eq!(rows[0].corners, Some(2));
        assert_eq!(rows[1].player, "Taker B");
        assert_eq!(rows[1].penalties, Some(1));
    }

    #[test]
    fn zero_order_reads_as_absent() {
        let records = vec![record("Zero", "Alpha FC", &[(keys::PENALTIES_ORDER, 0.0)])];
        assert!(set_piece_rows(&records).is_empty());
    }
}
