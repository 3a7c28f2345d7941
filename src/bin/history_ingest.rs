//! Bulk gameweek-history ingest into the local sqlite store.
//!
//! Fetches the element-summary history for the top players by value score
//! and upserts it, so the TUI's Performance tab answers from disk.
//!
//! Usage: history_ingest [--count N] [--db PATH]

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};

use fpl_terminal::value_score::{scored_players, ScoreCache};
use fpl_terminal::{dataset_fetch, history_fetch, history_store, rankings};

const DEFAULT_COUNT: usize = 50;

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let count = parse_count_arg().unwrap_or(DEFAULT_COUNT);
    if count == 0 {
        return Err(anyhow!("--count must be at least 1"));
    }
    let db_path = parse_db_path_arg()
        .or_else(history_store::default_db_path)
        .context("unable to resolve sqlite path")?;

    let dataset = dataset_fetch::load_dataset()?;
    let mut cache = ScoreCache::default();
    let players = scored_players(&dataset, &mut cache);
    let targets = rankings::top_n(&players, rankings::SortKey::ValueScore, count);

    let mut conn = history_store::open_db(&db_path)?;
    let mut rows_written = 0usize;
    let mut errors = Vec::new();
    for player in &targets {
        match history_fetch::fetch_player_history(player.record.id, &dataset.teams_by_id) {
            Ok(entries) => {
                rows_written += history_store::upsert_history(&mut conn, player.record.id, &entries)?;
            }
            Err(err) => errors.push(format!("{}: {err:#}", player.record.name)),
        }
    }

    println!("History ingest complete");
    println!("DB: {}", db_path.display());
    println!("Players: {}/{}", targets.len() - errors.len(), targets.len());
    println!("Rows upserted: {rows_written}");
    if !errors.is_empty() {
        println!("Errors: {}", errors.len());
        for err in errors.iter().take(6) {
            println!(" - {err}");
        }
    }

    Ok(())
}

fn parse_count_arg() -> Option<usize> {
    flag_value("--count")?.parse().ok()
}

fn parse_db_path_arg() -> Option<PathBuf> {
    Some(PathBuf::from(flag_value("--db")?))
}

fn flag_value(flag: &str) -> Option<String> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    args.iter()
        .position(|arg| arg == flag)
        .and_then(|idx| args.get(idx + 1).cloned())
}
