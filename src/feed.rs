//! Provider thread: owns all network and disk I/O so the UI thread never
//! blocks. Receives `ProviderCommand`s from the UI, pushes `Delta`s back.

use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use rusqlite::Connection;

use crate::dataset_fetch;
use crate::history_fetch;
use crate::history_store;
use crate::sample_data;
use crate::state::{Delta, ProviderCommand};

const COMMAND_POLL: Duration = Duration::from_secs(1);
/// Live snapshots refresh on their own at this cadence; file and sample
/// sources only reload on an explicit refresh.
const AUTO_REFRESH: Duration = Duration::from_secs(15 * 60);

pub fn spawn_provider(
    tx: Sender<Delta>,
    commands: Receiver<ProviderCommand>,
) -> JoinHandle<()> {
    thread::Builder::new()
        .name("provider".to_string())
        .spawn(move || provider_loop(tx, commands))
        .unwrap_or_else(|err| panic!("spawn provider thread: {err}"))
}

fn provider_loop(tx: Sender<Delta>, commands: Receiver<ProviderCommand>) {
    let mut history_db = open_history_db(&tx);
    let mut teams = std::collections::HashMap::new();
    let mut auto_refresh = load_and_send(&tx, &mut teams);
    let mut last_refresh = Instant::now();

    loop {
        match commands.recv_timeout(COMMAND_POLL) {
            Ok(ProviderCommand::RefreshDataset) => {
                auto_refresh = load_and_send(&tx, &mut teams);
                last_refresh = Instant::now();
            }
            Ok(ProviderCommand::FetchHistory {
                player_id,
                player_name,
            }) => {
                fetch_history(&tx, history_db.as_mut(), &teams, player_id, &player_name);
            }
            Ok(ProviderCommand::ExportWorkbook { path }) => {
                run_export(&tx, &path);
            }
            Err(RecvTimeoutError::Timeout) => {
                if auto_refresh && last_refresh.elapsed() >= AUTO_REFRESH {
                    auto_refresh = load_and_send(&tx, &mut teams);
                    last_refresh = Instant::now();
                }
            }
            Err(RecvTimeoutError::Disconnected) => return,
        }
    }
}

/// Load the dataset per the environment knobs, falling back to the bundled
/// sample so the UI always has rows to show. Returns whether the source is
/// live (and therefore worth refreshing on a timer).
fn load_and_send(
    tx: &Sender<Delta>,
    teams: &mut std::collections::HashMap<u32, String>,
) -> bool {
    match dataset_fetch::load_dataset() {
        Ok(dataset) => {
            let live = dataset.source == crate::dataset::DatasetSource::Live;
            *teams = dataset.teams_by_id.clone();
            let _ = tx.send(Delta::DatasetLoaded(Box::new(dataset)));
            live
        }
        Err(err) => {
            let _ = tx.send(Delta::DatasetFailed {
                error: format!("{err:#}, using sample data"),
            });
            let dataset = sample_data::sample_dataset();
            *teams = dataset.teams_by_id.clone();
            let _ = tx.send(Delta::DatasetLoaded(Box::new(dataset)));
            false
        }
    }
}

fn open_history_db(tx: &Sender<Delta>) -> Option<Connection> {
    let path = history_store::default_db_path()?;
    match history_store::open_db(&path) {
        Ok(conn) => Some(conn),
        Err(err) => {
            let _ = tx.send(Delta::Log(format!(
                "[WARN] History store unavailable ({err:#}), falling back to network only"
            )));
            None
        }
    }
}

/// Serve history from the sqlite store when present, otherwise fetch from
/// the element-summary endpoint and persist what came back.
fn fetch_history(
    tx: &Sender<Delta>,
    db: Option<&mut Connection>,
    teams: &std::collections::HashMap<u32, String>,
    player_id: u32,
    player_name: &str,
) {
    if let Some(conn) = db.as_deref() {
        if let Ok(entries) = history_store::load_history(conn, player_id) {
            if !entries.is_empty() {
                let _ = tx.send(Delta::HistoryLoaded { player_id, entries });
                return;
            }
        }
    }

    match history_fetch::fetch_player_history(player_id, teams) {
        Ok(entries) => {
            if let Some(conn) = db {
                if let Err(err) = history_store::upsert_history(conn, player_id, &entries) {
                    let _ = tx.send(Delta::Log(format!(
                        "[WARN] History store write for {player_name}: {err:#}"
                    )));
                }
            }
            let _ = tx.send(Delta::HistoryLoaded { player_id, entries });
        }
        Err(err) => {
            let _ = tx.send(Delta::HistoryFailed {
                player_id,
                error: format!("{err:#}"),
            });
        }
    }
}

fn run_export(tx: &Sender<Delta>, path: &str) {
    let _ = tx.send(Delta::ExportStarted {
        path: path.to_string(),
    });
    let dataset = match dataset_fetch::load_dataset() {
        Ok(dataset) => dataset,
        Err(_) => sample_data::sample_dataset(),
    };
    let mut cache = crate::value_score::ScoreCache::default();
    let players = crate::value_score::scored_players(&dataset, &mut cache);
    let progress_tx = tx.clone();
    let result = crate::export::export_workbook_with_progress(
        std::path::Path::new(path),
        &dataset,
        &players,
        |progress| {
            let _ = progress_tx.send(Delta::ExportProgress {
                current: progress.current,
                total: progress.total,
                message: progress.message,
            });
        },
    );
    match result {
        Ok(report) => {
            for err in &report.errors {
                let _ = tx.send(Delta::Log(format!("[WARN] Export: {err}")));
            }
            let _ = tx.send(Delta::ExportFinished {
                path: path.to_string(),
                history_rows: report.history_rows,
                errors: report.errors.len(),
            });
        }
        Err(err) => {
            let _ = tx.send(Delta::Log(format!("[WARN] Export failed: {err:#}")));
            let _ = tx.send(Delta::ExportFinished {
                path: path.to_string(),
                history_rows: 0,
                errors: 1,
            });
        }
    }
}
