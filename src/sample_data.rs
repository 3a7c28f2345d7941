//! Offline sample dataset for demos and benches (`FPL_OFFLINE=1`) and as a
//! fallback when the live feed is unreachable on first run.

use std::collections::HashMap;

use rand::Rng;

use crate::dataset::{
    fingerprint_bytes, AvailabilityStatus, Dataset, DatasetSource, PlayerRecord, Position,
};
use crate::metrics::keys;
use crate::value_score::round3;

const SAMPLE_TEAMS: &[&str] = &[
    "Rivermoor FC",
    "Harborview United",
    "Kestrel Park",
    "Old Brompton",
    "Northgate Athletic",
    "Saltmarsh Town",
];

const FIRST_NAMES: &[&str] = &[
    "Alex", "Ben", "Ciaran", "Dan", "Emile", "Felipe", "Gabriel", "Hugo", "Ivan", "Jakub",
    "Kai", "Luca", "Marc", "Nico", "Oliver", "Pedro",
];

const LAST_NAMES: &[&str] = &[
    "Adeyemi", "Baros", "Calder", "Dyer", "Eriksen", "Ferreira", "Gallas", "Holt", "Iversen",
    "Jansen", "Kovac", "Larsen", "Moreno", "Novak", "Ostertag", "Price",
];

/// Build a plausible snapshot: a full squad per sample team plus one manager
/// row, so the fallback scoring branch is reachable in demos too.
pub fn sample_dataset() -> Dataset {
    let mut rng = rand::thread_rng();
    let mut records = Vec::new();
    let mut next_id = 1u32;

    for team in SAMPLE_TEAMS {
        let squad = [
            (Position::Goalkeeper, 2),
            (Position::Defender, 5),
            (Position::Midfielder, 5),
            (Position::Forward, 3),
        ];
        for (position, count) in squad {
            for _ in 0..count {
                records.push(sample_player(&mut rng, next_id, team, position));
                next_id += 1;
            }
        }
        records.push(sample_manager(&mut rng, next_id, team));
        next_id += 1;
    }

    let teams_by_id: HashMap<u32, String> = SAMPLE_TEAMS
        .iter()
        .enumerate()
        .map(|(idx, name)| (idx as u32 + 1, name.to_string()))
        .collect();
    let fingerprint = serde_json::to_vec(&records)
        .map(|bytes| fingerprint_bytes(&bytes))
        .unwrap_or_else(|_| fingerprint_bytes(b"sample-dataset"));
    Dataset::new(records, teams_by_id, fingerprint, DatasetSource::Sample)
}

fn sample_name(rng: &mut impl Rng) -> String {
    let first = FIRST_NAMES[rng.gen_range(0..FIRST_NAMES.len())];
    let last = LAST_NAMES[rng.gen_range(0..LAST_NAMES.len())];
    format!("{first} {last}")
}

fn sample_player(rng: &mut impl Rng, id: u32, team: &str, position: Position) -> PlayerRecord {
    // Bench players get low minutes and no advanced metrics, mirroring the
    // real feed's sparsity.
    let is_regular = rng.gen_bool(0.7);
    let minutes: u32 = if is_regular {
        rng.gen_range(900..2800)
    } else {
        rng.gen_range(0..400)
    };
    let games = (minutes as f64 / 90.0).max(1.0);
    let ppg = if is_regular {
        rng.gen_range(2.0..7.5)
    } else {
        rng.gen_range(0.0..2.5)
    };
    let total_points = round3(ppg * games);
    let price = match position {
        Position::Goalkeeper => rng.gen_range(4.0..6.0),
        Position::Defender => rng.gen_range(4.0..7.5),
        Position::Midfielder => rng.gen_range(4.5..13.0),
        Position::Forward => rng.gen_range(4.5..15.0),
    };
    let price = (price * 2.0_f64).round() / 2.0;

    let mut stats = HashMap::from([
        (keys::TOTAL_POINTS.to_string(), total_points),
        (keys::POINTS_PER_GAME.to_string(), round3(ppg)),
        (keys::FORM.to_string(), round3(rng.gen_range(0.0..8.0))),
        (
            keys::VALUE_SEASON.to_string(),
            round3(total_points / price),
        ),
        (
            keys::POINTS_PER_MILLION.to_string(),
            round3(total_points / price),
        ),
        (
            keys::SELECTED_BY_PERCENT.to_string(),
            round3(rng.gen_range(0.1..45.0)),
        ),
    ]);

    if is_regular {
        match position {
            Position::Goalkeeper => {
                stats.insert(keys::SAVES_PER90.to_string(), round3(rng.gen_range(1.5..4.5)));
                stats.insert(
                    keys::CLEAN_SHEETS_PER90.to_string(),
                    round3(rng.gen_range(0.1..0.5)),
                );
                stats.insert(keys::XGC_PER90.to_string(), round3(rng.gen_range(0.8..2.2)));
            }
            Position::Defender => {
                stats.insert(keys::XGI_PER90.to_string(), round3(rng.gen_range(0.0..0.4)));
                stats.insert(
                    keys::CLEAN_SHEETS_PER90.to_string(),
                    round3(rng.gen_range(0.1..0.5)),
                );
                stats.insert(keys::XGC_PER90.to_string(), round3(rng.gen_range(0.8..2.0)));
            }
            Position::Midfielder => {
                stats.insert(keys::XG_PER90.to_string(), round3(rng.gen_range(0.0..0.6)));
                stats.insert(keys::XA_PER90.to_string(), round3(rng.gen_range(0.0..0.5)));
                stats.insert(keys::XGI_PER90.to_string(), round3(rng.gen_range(0.0..0.9)));
                stats.insert(
                    keys::CREATIVITY_RANK.to_string(),
                    rng.gen_range(1..400) as f64,
                );
            }
            Position::Forward => {
                stats.insert(keys::XG_PER90.to_string(), round3(rng.gen_range(0.1..0.9)));
                stats.insert(keys::XGI_PER90.to_string(), round3(rng.gen_range(0.1..1.1)));
            }
        }
    }

    // A few set-piece takers per squad.
    if rng.gen_bool(0.15) {
        stats.insert(keys::PENALTIES_ORDER.to_string(), rng.gen_range(1..3) as f64);
    }
    if rng.gen_bool(0.2) {
        stats.insert(keys::CORNERS_ORDER.to_string(), rng.gen_range(1..4) as f64);
    }

    let status = match rng.gen_range(0..20) {
        0 => AvailabilityStatus::Injured,
        1 => AvailabilityStatus::Doubtful,
        _ => AvailabilityStatus::Available,
    };

    PlayerRecord {
        id,
        name: sample_name(rng),
        team: team.to_string(),
        position_raw: position.label().to_string(),
        position: Some(position),
        price,
        minutes,
        status,
        news: String::new(),
        stats,
    }
}

fn sample_manager(rng: &mut impl Rng, id: u32, team: &str) -> PlayerRecord {
    PlayerRecord {
        id,
        name: sample_name(rng),
        team: team.to_string(),
        position_raw: "Manager".to_string(),
        position: None,
        price: 1.0,
        minutes: 0,
        status: AvailabilityStatus::Available,
        news: String::new(),
        stats: HashMap::from([
            (keys::TOTAL_POINTS.to_string(), rng.gen_range(0..30) as f64),
            (keys::POINTS_PER_GAME.to_string(), round3(rng.gen_range(0.0..3.0))),
        ]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_covers_every_position_and_a_manager_row() {
        let dataset = sample_dataset();
        assert_eq!(dataset.source, DatasetSource::Sample);
        for position in Position::ALL {
            assert!(dataset
                .records
                .iter()
                .any(|r| r.position == Some(position)));
        }
        assert!(dataset.records.iter().any(|r| r.position.is_none()));
        assert_eq!(dataset.team_names().len(), SAMPLE_TEAMS.len());
    }
}
