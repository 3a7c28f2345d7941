//! Warm-start snapshot: the last dataset and its score cache, saved to the
//! app cache dir so a restart paints real rows before the provider's first
//! fetch completes.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::dataset::Dataset;
use crate::http_cache::app_cache_dir;
use crate::state::AppState;
use crate::value_score::ScoreCache;

const SNAPSHOT_VERSION: u32 = 1;
const SNAPSHOT_FILE: &str = "app_cache.json";

#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    dataset: Dataset,
    score_cache: ScoreCache,
}

fn snapshot_path() -> Option<PathBuf> {
    app_cache_dir().map(|dir| dir.join(SNAPSHOT_FILE))
}

/// Restore the previous session's dataset into `state`, if a compatible
/// snapshot exists. Returns whether anything was restored.
pub fn load_into_state(state: &mut AppState) -> bool {
    let Some(path) = snapshot_path() else {
        return false;
    };
    let Ok(raw) = fs::read_to_string(&path) else {
        return false;
    };
    let Ok(snapshot) = serde_json::from_str::<Snapshot>(&raw) else {
        return false;
    };
    if snapshot.version != SNAPSHOT_VERSION {
        return false;
    }
    state.score_cache = snapshot.score_cache;
    state.set_dataset(snapshot.dataset);
    // A restore is a stopgap, keep the loading flag so the provider's
    // fresh fetch is still awaited.
    state.dataset_loading = true;
    true
}

pub fn save_from_state(state: &AppState) -> Result<()> {
    let Some(dataset) = &state.dataset else {
        return Ok(());
    };
    let Some(path) = snapshot_path() else {
        return Ok(());
    };
    let Some(dir) = path.parent() else {
        return Ok(());
    };
    fs::create_dir_all(dir).ok();
    let snapshot = Snapshot {
        version: SNAPSHOT_VERSION,
        dataset: dataset.clone(),
        score_cache: state.score_cache.clone(),
    };
    let tmp = path.with_extension("json.tmp");
    let json = serde_json::to_string(&snapshot).context("serialize app snapshot")?;
    fs::write(&tmp, json).context("write app snapshot")?;
    fs::rename(&tmp, &path).context("swap app snapshot")?;
    Ok(())
}
