//! Headless workbook export: load the dataset, score it, and write the
//! full XLSX workbook (or a plain players CSV) without starting the TUI.
//!
//! Usage: export_workbook [--out PATH] [--csv]

use std::path::PathBuf;

use anyhow::Result;

use fpl_terminal::value_score::{scored_players, ScoreCache};
use fpl_terminal::{dataset_fetch, export};

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let csv = std::env::args().skip(1).any(|arg| arg == "--csv");
    let out = parse_out_arg().unwrap_or_else(|| {
        let ext = if csv { "csv" } else { "xlsx" };
        PathBuf::from(format!(
            "fpl_export_{}.{ext}",
            chrono::Local::now().format("%Y%m%d_%H%M%S")
        ))
    });

    let dataset = dataset_fetch::load_dataset()?;
    let mut cache = ScoreCache::default();
    let players = scored_players(&dataset, &mut cache);
    println!(
        "Loaded {} players ({})",
        dataset.records.len(),
        dataset.source.label()
    );

    if csv {
        export::players_csv_to_path(&out, &players)?;
        println!("Wrote {}", out.display());
        return Ok(());
    }

    let report = export::export_workbook_with_progress(&out, &dataset, &players, |progress| {
        println!("[{}/{}] {}", progress.current, progress.total, progress.message);
    })?;

    println!("Wrote {}", out.display());
    println!(
        "Sheets: {} | Players: {} | History rows: {}",
        report.sheets, report.players, report.history_rows
    );
    if !report.errors.is_empty() {
        println!("Errors: {}", report.errors.len());
        for err in report.errors.iter().take(6) {
            println!(" - {err}");
        }
    }

    Ok(())
}

fn parse_out_arg() -> Option<PathBuf> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    args.iter()
        .position(|arg| arg == "--out")
        .and_then(|idx| args.get(idx + 1).map(PathBuf::from))
}
