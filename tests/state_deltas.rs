use fpl_terminal::history_fetch::GameweekEntry;
use fpl_terminal::sample_data::sample_dataset;
use fpl_terminal::state::{apply_delta, AppState, Delta};

fn entry(round: u32, points: i32) -> GameweekEntry {
    GameweekEntry {
        round,
        total_points: points,
        opponent: "Opponent".to_string(),
        minutes: 90,
        kickoff: None,
    }
}

#[test]
fn history_delta_stores_rows_and_clears_loading() {
    let mut state = AppState::new();
    state.history_loading.insert(42);

    apply_delta(
        &mut state,
        Delta::HistoryLoaded {
            player_id: 42,
            entries: vec![entry(1, 8), entry(2, 2)],
        },
    );

    assert!(!state.history_loading.contains(&42));
    assert_eq!(state.history.get(&42).map(Vec::len), Some(2));
}

#[test]
fn history_failure_clears_loading_and_logs() {
    let mut state = AppState::new();
    state.history_loading.insert(7);

    apply_delta(
        &mut state,
        Delta::HistoryFailed {
            player_id: 7,
            error: "timeout".to_string(),
        },
    );

    assert!(!state.history_loading.contains(&7));
    assert!(state.logs.back().unwrap().contains("timeout"));
    assert!(state.history.get(&7).is_none());
}

#[test]
fn export_lifecycle_deltas_drive_status() {
    let mut state = AppState::new();

    apply_delta(
        &mut state,
        Delta::ExportStarted {
            path: "out.xlsx".to_string(),
        },
    );
    assert!(state.export.running);

    apply_delta(
        &mut state,
        Delta::ExportProgress {
            current: 3,
            total: 21,
            message: "History: Salah".to_string(),
        },
    );
    assert_eq!(state.export.current, 3);
    assert_eq!(state.export.total, 21);

    apply_delta(
        &mut state,
        Delta::ExportFinished {
            path: "out.xlsx".to_string(),
            history_rows: 120,
            errors: 0,
        },
    );
    assert!(!state.export.running);
    assert!(state.logs.back().unwrap().contains("Export finished"));
}

#[test]
fn dataset_failure_stops_the_spinner() {
    let mut state = AppState::new();
    assert!(state.dataset_loading);

    apply_delta(
        &mut state,
        Delta::DatasetFailed {
            error: "dns".to_string(),
        },
    );

    assert!(!state.dataset_loading);
    assert!(state.dataset.is_none());
}

#[test]
fn reloading_a_dataset_drops_stale_history() {
    let mut state = AppState::new();
    apply_delta(
        &mut state,
        Delta::DatasetLoaded(Box::new(sample_dataset())),
    );
    state.history.insert(1, vec![entry(1, 5)]);

    apply_delta(
        &mut state,
        Delta::DatasetLoaded(Box::new(sample_dataset())),
    );
    assert!(state.history.is_empty());
}

#[test]
fn log_ring_is_bounded() {
    let mut state = AppState::new();
    for i in 0..500 {
        apply_delta(&mut state, Delta::Log(format!("[INFO] line {i}")));
    }
    assert!(state.logs.len() <= 200);
    assert!(state.logs.back().unwrap().ends_with("line 499"));
}
