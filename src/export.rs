//! CSV and XLSX export of the derived views.
//!
//! CSV is the per-view download (filtered table, top picks, differentials,
//! comparison matrix, set pieces); the workbook export writes every view as
//! a sheet plus a gameweek-history sheet for the highest-value players,
//! fetched in parallel. History fetch failures are collected, not fatal.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use rayon::prelude::*;
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::comparison::ComparisonMatrix;
use crate::dataset::Dataset;
use crate::history_fetch;
use crate::rankings::{self, SortKey};
use crate::set_pieces::{self, SetPieceRow};
use crate::value_score::ScoredPlayer;

/// Players included on the workbook's history sheet.
const HISTORY_SHEET_PLAYERS: usize = 20;

pub struct ExportProgress {
    pub current: usize,
    pub total: usize,
    pub message: String,
}

pub struct ExportReport {
    pub players: usize,
    pub sheets: usize,
    pub history_rows: usize,
    pub errors: Vec<String>,
}

const PLAYER_HEADER: &[&str] = &[
    "Player",
    "Team",
    "Position",
    "Price (m)",
    "Minutes",
    "Total Points",
    "Points/Game",
    "Points per Million",
    "Form",
    "Value/Season",
    "% Selected",
    "Value Score",
    "Status",
    "News",
];

fn player_row(player: &ScoredPlayer) -> Vec<String> {
    let record = &player.record;
    vec![
        record.name.clone(),
        record.team.clone(),
        record.position_raw.clone(),
        format!("{:.1}", record.price),
        record.minutes.to_string(),
        format!("{}", record.total_points()),
        format!("{}", record.points_per_game()),
        format!(
            "{}",
            record.stat_or(crate::metrics::keys::POINTS_PER_MILLION, 0.0)
        ),
        format!("{}", record.form()),
        format!("{}", record.value_season()),
        format!("{}", record.selected_by_percent()),
        format!("{:.3}", player.value_score),
        record.status.label().to_string(),
        record.news.clone(),
    ]
}

fn player_rows(players: &[ScoredPlayer]) -> Vec<Vec<String>> {
    let mut rows = vec![PLAYER_HEADER.iter().map(|s| s.to_string()).collect()];
    rows.extend(players.iter().map(player_row));
    rows
}

fn set_piece_sheet_rows(rows: &[SetPieceRow]) -> Vec<Vec<String>> {
    let mut out = vec![vec![
        "Player".to_string(),
        "Team".to_string(),
        "Position".to_string(),
        "Corners/Indirect FK".to_string(),
        "Direct FK".to_string(),
        "Penalties".to_string(),
        "Status".to_string(),
    ]];
    out.extend(rows.iter().map(|row| {
        vec![
            row.player.clone(),
            row.team.clone(),
            row.position.clone(),
            opt_to_string(row.corners),
            opt_to_string(row.direct_freekicks),
            opt_to_string(row.penalties),
            row.status.label().to_string(),
        ]
    }));
    out
}

fn comparison_rows(matrix: &ComparisonMatrix) -> Vec<Vec<String>> {
    let mut header = vec!["Player".to_string()];
    header.extend(matrix.metrics.iter().cloned());
    let mut rows = vec![header];
    for (player, values) in matrix.players.iter().zip(matrix.values.iter()) {
        let mut row = vec![player.clone()];
        row.extend(values.iter().map(|v| format!("{v:.4}")));
        rows.push(row);
    }
    rows
}

// --- CSV -------------------------------------------------------------------

fn write_csv<W: Write>(writer: W, rows: &[Vec<String>]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for row in rows {
        wtr.write_record(row).context("write csv record")?;
    }
    wtr.flush().context("flush csv")?;
    Ok(())
}

pub fn write_players_csv<W: Write>(writer: W, players: &[ScoredPlayer]) -> Result<()> {
    write_csv(writer, &player_rows(players))
}

pub fn write_comparison_csv<W: Write>(writer: W, matrix: &ComparisonMatrix) -> Result<()> {
    write_csv(writer, &comparison_rows(matrix))
}

pub fn write_set_pieces_csv<W: Write>(writer: W, rows: &[SetPieceRow]) -> Result<()> {
    write_csv(writer, &set_piece_sheet_rows(rows))
}

pub fn players_csv_to_path(path: &Path, players: &[ScoredPlayer]) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("create {}", path.display()))?;
    write_players_csv(file, players)
}

// --- XLSX workbook ---------------------------------------------------------

/// Write the full workbook: the (already filtered/scored) player table, the
/// ranking views derived from it, set pieces, and recent gameweek history
/// for the top players by value score.
pub fn export_workbook_with_progress(
    path: &Path,
    dataset: &Dataset,
    players: &[ScoredPlayer],
    mut on_progress: impl FnMut(ExportProgress),
) -> Result<ExportReport> {
    let mut errors = Vec::new();
    let history_targets = rankings::top_n(players, SortKey::ValueScore, HISTORY_SHEET_PLAYERS);
    let total = history_targets.len() + 1;

    on_progress(ExportProgress {
        current: 0,
        total,
        message: format!("Exporting {} players", players.len()),
    });

    let history_header = vec![
        "Player".to_string(),
        "Round".to_string(),
        "Points".to_string(),
        "Opponent".to_string(),
        "Minutes".to_string(),
        "Kickoff".to_string(),
    ];
    let fetched: Vec<(String, Result<Vec<history_fetch::GameweekEntry>>)> = history_targets
        .par_iter()
        .map(|player| {
            let result = history_fetch::fetch_player_history(player.record.id, &dataset.teams_by_id);
            (player.record.name.clone(), result)
        })
        .collect();

    let mut history_rows = vec![history_header];
    let mut current = 1;
    for (name, result) in fetched {
        match result {
            Ok(entries) => {
                for entry in entries {
                    history_rows.push(vec![
                        name.clone(),
                        entry.round.to_string(),
                        entry.total_points.to_string(),
                        entry.opponent.clone(),
                        entry.minutes.to_string(),
                        entry.kickoff.clone().unwrap_or_default(),
                    ]);
                }
            }
            Err(err) => errors.push(format!("history {name}: {err}")),
        }
        current += 1;
        on_progress(ExportProgress {
            current,
            total,
            message: format!("History: {name}"),
        });
    }

    let top_picks = rankings::top_n(players, SortKey::PointsPerMillion, rankings::DEFAULT_TOP_N);
    let top_points = rankings::top_n(players, SortKey::TotalPoints, rankings::DEFAULT_TOP_N);
    let differentials = rankings::differential_picks(players);
    let records: Vec<_> = players.iter().map(|p| p.record.clone()).collect();
    let set_pieces = set_pieces::set_piece_rows(&records);

    let mut workbook = Workbook::new();
    let sheets: &[(&str, Vec<Vec<String>>)] = &[
        ("Players", player_rows(players)),
        ("Top Picks", player_rows(&top_picks)),
        ("Top Points", player_rows(&top_points)),
        ("Differentials", player_rows(&differentials)),
        ("Set Pieces", set_piece_sheet_rows(&set_pieces)),
        ("Gameweek History", history_rows),
    ];
    for (name, rows) in sheets {
        let sheet = workbook.add_worksheet();
        sheet.set_name(*name)?;
        write_rows(sheet, rows)?;
    }
    workbook
        .save(path)
        .with_context(|| format!("save workbook {}", path.display()))?;

    Ok(ExportReport {
        players: players.len(),
        sheets: sheets.len(),
        history_rows: sheets
            .last()
            .map(|(_, rows)| rows.len().saturating_sub(1))
            .unwrap_or(0),
        errors,
    })
}

fn opt_to_string<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<String>]) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            worksheet
                .write_string(row_idx as u32, col_idx as u16, value)
                .with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comparison::ComparisonMatrix;
    use crate::dataset::{AvailabilityStatus, PlayerRecord, Position};
    use std::collections::HashMap;

    fn player(name: &str) -> ScoredPlayer {
        ScoredPlayer {
            record: PlayerRecord {
                id: 1,
                name: name.to_string(),
                team: "Test FC".to_string(),
                position_raw: "Forward".to_string(),
                position: Some(Position::Forward),
                price: 7.5,
                minutes: 900,
                status: AvailabilityStatus::Available,
                news: "knock, 75% chance".to_string(),
                stats: HashMap::new(),
            },
            value_score: 1.234,
        }
    }

    #[test]
    fn players_csv_has_header_and_quotes_commas() {
        let mut out = Vec::new();
        write_players_csv(&mut out, &[player("Salah")]).expect("csv writes");
        let text = String::from_utf8(out).expect("utf8");
        let mut lines = text.lines();
        assert!(lines.next().unwrap().starts_with("Player,Team,Position"));
        let row = lines.next().unwrap();
        assert!(row.contains("Salah"));
        assert!(row.contains("\"knock, 75% chance\""));
        assert!(row.contains("1.234"));
    }

    #[test]
    fn comparison_csv_matches_matrix_shape() {
        let matrix = ComparisonMatrix {
            players: vec!["A".to_string(), "B".to_string()],
            metrics: vec!["xg".to_string(), "xa".to_string()],
            values: vec![vec![0.0, 1.0], vec![1.0, 0.0]],
        };
        let mut out = Vec::new();
        write_comparison_csv(&mut out, &matrix).expect("csv writes");
        let text = String::from_utf8(out).expect("utf8");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "Player,xg,xa");
        assert_eq!(lines[1], "A,0.0000,1.0000");
    }
}
