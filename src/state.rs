//! Application state, provider messages, and the delta loop.
//!
//! The TUI thread owns `AppState`; the provider thread sends `Delta`s over
//! an mpsc channel and receives `ProviderCommand`s back. Derived views
//! (filtered table, rankings, comparison) are computed from the scored
//! snapshot on demand; the value-score column itself is cached on the
//! dataset fingerprint and recomputed only when a new snapshot lands.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::comparison::{build_comparison, ComparisonError, ComparisonMatrix};
use crate::dataset::{Dataset, Position};
use crate::history_fetch::GameweekEntry;
use crate::metrics::COMPARISON_METRICS;
use crate::rankings::{self, PlayerFilter, SortKey};
use crate::value_score::{scored_players, ScoreCache, ScoredPlayer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Players,
    TopPicks,
    Performance,
    Comparison,
    SetPieces,
}

impl Tab {
    pub const ALL: [Tab; 5] = [
        Tab::Players,
        Tab::TopPicks,
        Tab::Performance,
        Tab::Comparison,
        Tab::SetPieces,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Tab::Players => "Players",
            Tab::TopPicks => "Top Picks",
            Tab::Performance => "Performance",
            Tab::Comparison => "Comparison",
            Tab::SetPieces => "Set Pieces",
        }
    }

    /// Performance, Comparison and Set Pieces sit behind the access gate.
    pub fn is_premium(self) -> bool {
        matches!(self, Tab::Performance | Tab::Comparison | Tab::SetPieces)
    }

    pub fn next(self) -> Tab {
        match self {
            Tab::Players => Tab::TopPicks,
            Tab::TopPicks => Tab::Performance,
            Tab::Performance => Tab::Comparison,
            Tab::Comparison => Tab::SetPieces,
            Tab::SetPieces => Tab::Players,
        }
    }

    pub fn prev(self) -> Tab {
        match self {
            Tab::Players => Tab::SetPieces,
            Tab::TopPicks => Tab::Players,
            Tab::Performance => Tab::TopPicks,
            Tab::Comparison => Tab::Performance,
            Tab::SetPieces => Tab::Comparison,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonFocus {
    Players,
    Metrics,
}

/// Sidebar filter controls, bounded by the loaded dataset. The controls
/// carry UI values; `to_filter` maps them onto the pipeline's optional
/// constraints, leaving a constraint unset when the control sits at its
/// no-op end or when the data range collapsed to a single point.
#[derive(Debug, Clone, Default)]
pub struct FilterControls {
    pub positions: HashSet<Position>,
    pub team: Option<String>,
    pub all_teams: Vec<String>,
    pub price_bounds: (f64, f64),
    pub max_price: f64,
    pub minutes_bound: u32,
    pub min_minutes: u32,
    pub form_bounds: (f64, f64),
    pub min_form: f64,
    pub value_bounds: (f64, f64),
    pub min_value: f64,
    pub max_selected: f64,
}

const PRICE_STEP: f64 = 0.5;
const MINUTES_STEP: u32 = 90;
const FORM_STEP: f64 = 0.5;
const VALUE_STEP: f64 = 0.5;
const SELECTED_STEP: f64 = 5.0;

impl FilterControls {
    pub fn for_dataset(dataset: &Dataset) -> Self {
        let mut price_min = f64::INFINITY;
        let mut price_max = 0.0f64;
        let mut minutes_max = 0u32;
        let mut form_min = f64::INFINITY;
        let mut form_max = f64::NEG_INFINITY;
        let mut value_min = f64::INFINITY;
        let mut value_max = f64::NEG_INFINITY;
        for record in &dataset.records {
            price_min = price_min.min(record.price);
            price_max = price_max.max(record.price);
            minutes_max = minutes_max.max(record.minutes);
            form_min = form_min.min(record.form());
            form_max = form_max.max(record.form());
            value_min = value_min.min(record.value_season());
            value_max = value_max.max(record.value_season());
        }
        if dataset.records.is_empty() {
            price_min = 0.0;
            form_min = 0.0;
            form_max = 0.0;
            value_min = 0.0;
            value_max = 0.0;
        }

        let mut controls = FilterControls {
            positions: HashSet::from(Position::ALL),
            team: None,
            all_teams: dataset.team_names(),
            price_bounds: (price_min, price_max),
            max_price: price_max,
            minutes_bound: minutes_max,
            min_minutes: 0,
            form_bounds: (form_min, form_max),
            min_form: form_min,
            value_bounds: (value_min, value_max),
            min_value: value_min,
            max_selected: 100.0,
        };
        controls.reset();
        controls
    }

    pub fn reset(&mut self) {
        self.positions = HashSet::from(Position::ALL);
        self.team = None;
        self.max_price = self.price_bounds.1;
        self.min_minutes = 0;
        self.min_form = self.form_bounds.0;
        self.min_value = self.value_bounds.0;
        self.max_selected = 100.0;
    }

    pub fn to_filter(&self) -> PlayerFilter {
        let positions = if self.positions.len() == Position::ALL.len() {
            None
        } else {
            Some(self.positions.clone())
        };
        let teams = self
            .team
            .as_ref()
            .map(|team| HashSet::from([team.clone()]));
        let max_price = (self.price_bounds.0 < self.price_bounds.1
            && self.max_price < self.price_bounds.1)
            .then_some(self.max_price);
        let min_minutes = (self.min_minutes > 0).then_some(self.min_minutes);
        let min_form = (self.form_bounds.0 < self.form_bounds.1
            && self.min_form > self.form_bounds.0)
            .then_some(self.min_form);
        let min_value = (self.value_bounds.0 < self.value_bounds.1
            && self.min_value > self.value_bounds.0)
            .then_some(self.min_value);
        let max_selected = (self.max_selected < 100.0).then_some(self.max_selected);

        PlayerFilter {
            positions,
            teams,
            max_price,
            min_minutes,
            min_form,
            min_value,
            max_selected,
        }
    }

    /// Cycle All -> GKP -> DEF -> MID -> FWD -> All.
    pub fn cycle_position(&mut self) {
        let current = if self.positions.len() == 1 {
            self.positions.iter().next().copied()
        } else {
            None
        };
        self.positions = match current {
            None => HashSet::from([Position::Goalkeeper]),
            Some(Position::Goalkeeper) => HashSet::from([Position::Defender]),
            Some(Position::Defender) => HashSet::from([Position::Midfielder]),
            Some(Position::Midfielder) => HashSet::from([Position::Forward]),
            Some(Position::Forward) => HashSet::from(Position::ALL),
        };
    }

    /// Cycle All -> each team in order -> All.
    pub fn cycle_team(&mut self) {
        if self.all_teams.is_empty() {
            return;
        }
        self.team = match &self.team {
            None => Some(self.all_teams[0].clone()),
            Some(team) => {
                let idx = self.all_teams.iter().position(|t| t == team);
                match idx {
                    Some(i) if i + 1 < self.all_teams.len() => {
                        Some(self.all_teams[i + 1].clone())
                    }
                    _ => None,
                }
            }
        };
    }

    pub fn adjust_max_price(&mut self, up: bool) {
        let delta = if up { PRICE_STEP } else { -PRICE_STEP };
        self.max_price = (self.max_price + delta).clamp(self.price_bounds.0, self.price_bounds.1);
    }

    pub fn adjust_min_minutes(&mut self, up: bool) {
        self.min_minutes = if up {
            (self.min_minutes + MINUTES_STEP).min(self.minutes_bound)
        } else {
            self.min_minutes.saturating_sub(MINUTES_STEP)
        };
    }

    pub fn adjust_min_form(&mut self, up: bool) {
        let delta = if up { FORM_STEP } else { -FORM_STEP };
        self.min_form = (self.min_form + delta).clamp(self.form_bounds.0, self.form_bounds.1);
    }

    pub fn adjust_min_value(&mut self, up: bool) {
        let delta = if up { VALUE_STEP } else { -VALUE_STEP };
        self.min_value = (self.min_value + delta).clamp(self.value_bounds.0, self.value_bounds.1);
    }

    pub fn adjust_max_selected(&mut self, up: bool) {
        let delta = if up { SELECTED_STEP } else { -SELECTED_STEP };
        self.max_selected = (self.max_selected + delta).clamp(0.0, 100.0);
    }
}

#[derive(Debug, Clone, Default)]
pub struct AccessState {
    pub unlocked: bool,
    pub prompt_active: bool,
    pub input: String,
}

#[derive(Debug, Clone, Default)]
pub struct ExportStatus {
    pub running: bool,
    pub current: usize,
    pub total: usize,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub tab: Tab,
    pub dataset: Option<Dataset>,
    pub dataset_loading: bool,
    pub score_cache: ScoreCache,
    pub scored: Vec<ScoredPlayer>,
    pub filters: FilterControls,
    pub sort: SortKey,
    pub selected: usize,
    pub perf_selected: usize,
    pub history: HashMap<u32, Vec<GameweekEntry>>,
    pub history_loading: HashSet<u32>,
    pub compare_players: HashSet<u32>,
    pub compare_metrics: Vec<String>,
    pub compare_focus: ComparisonFocus,
    pub compare_player_cursor: usize,
    pub compare_metric_cursor: usize,
    pub access: AccessState,
    pub export: ExportStatus,
    pub logs: VecDeque<String>,
    pub help_overlay: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        AppState {
            tab: Tab::Players,
            dataset: None,
            dataset_loading: true,
            score_cache: ScoreCache::default(),
            scored: Vec::new(),
            filters: FilterControls::default(),
            sort: SortKey::ValueScore,
            selected: 0,
            perf_selected: 0,
            history: HashMap::new(),
            history_loading: HashSet::new(),
            compare_players: HashSet::new(),
            compare_metrics: vec![
                crate::metrics::keys::POINTS_PER_GAME.to_string(),
                crate::metrics::keys::XG_PER90.to_string(),
                crate::metrics::keys::XA_PER90.to_string(),
            ],
            compare_focus: ComparisonFocus::Players,
            compare_player_cursor: 0,
            compare_metric_cursor: 0,
            access: AccessState {
                unlocked: crate::premium::access_from_env(),
                ..AccessState::default()
            },
            export: ExportStatus::default(),
            logs: VecDeque::new(),
            help_overlay: false,
        }
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        const MAX_LOGS: usize = 200;
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }

    /// Install a freshly loaded dataset: recompute the value-score column
    /// (cache permitting) and rebuild the filter bounds.
    pub fn set_dataset(&mut self, dataset: Dataset) {
        self.scored = scored_players(&dataset, &mut self.score_cache);
        self.filters = FilterControls::for_dataset(&dataset);
        self.dataset = Some(dataset);
        self.dataset_loading = false;
        self.selected = 0;
        self.perf_selected = 0;
        self.compare_player_cursor = 0;
        self.compare_players.clear();
        self.history.clear();
        self.history_loading.clear();
    }

    /// The Players-tab view: filtered, then sorted by the active key.
    pub fn filtered_players(&self) -> Vec<ScoredPlayer> {
        let filtered = self.filters.to_filter().apply(&self.scored);
        rankings::top_n(&filtered, self.sort, filtered.len())
    }

    pub fn cycle_sort(&mut self) {
        self.sort = self.sort.next();
        self.selected = 0;
    }

    pub fn selected_performance_player(&self) -> Option<&ScoredPlayer> {
        // Cursor indexes the scored (unfiltered) list, name-ordered views
        // are overkill here.
        self.scored.get(self.perf_selected)
    }

    pub fn toggle_compare_player(&mut self) {
        let Some(player) = self.scored.get(self.compare_player_cursor) else {
            return;
        };
        let id = player.record.id;
        if !self.compare_players.remove(&id) {
            self.compare_players.insert(id);
        }
    }

    pub fn toggle_compare_metric(&mut self) {
        let Some(key) = COMPARISON_METRICS.get(self.compare_metric_cursor) else {
            return;
        };
        if let Some(pos) = self.compare_metrics.iter().position(|m| m == key) {
            self.compare_metrics.remove(pos);
        } else {
            self.compare_metrics.push(key.to_string());
        }
    }

    /// Build the comparison matrix for the current selection.
    pub fn comparison(&self) -> Result<ComparisonMatrix, ComparisonError> {
        let selected: Vec<ScoredPlayer> = self
            .scored
            .iter()
            .filter(|p| self.compare_players.contains(&p.record.id))
            .cloned()
            .collect();
        let metric_keys: Vec<&str> = self.compare_metrics.iter().map(String::as_str).collect();
        build_comparison(&selected, &metric_keys)
    }

    pub fn data_updated_label(&self) -> String {
        let Some(dataset) = &self.dataset else {
            return "loading...".to_string();
        };
        let when = chrono::DateTime::from_timestamp(dataset.loaded_at as i64, 0)
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "?".to_string());
        format!(
            "{} players | {} | updated {}",
            dataset.records.len(),
            dataset.source.label(),
            when
        )
    }
}

/// Messages from the provider thread to the UI.
#[derive(Debug)]
pub enum Delta {
    DatasetLoaded(Box<Dataset>),
    DatasetFailed {
        error: String,
    },
    HistoryLoaded {
        player_id: u32,
        entries: Vec<GameweekEntry>,
    },
    HistoryFailed {
        player_id: u32,
        error: String,
    },
    ExportStarted {
        path: String,
    },
    ExportProgress {
        current: usize,
        total: usize,
        message: String,
    },
    ExportFinished {
        path: String,
        history_rows: usize,
        errors: usize,
    },
    Log(String),
}

/// Commands from the UI to the provider thread.
#[derive(Debug, Clone)]
pub enum ProviderCommand {
    RefreshDataset,
    FetchHistory {
        player_id: u32,
        player_name: String,
    },
    ExportWorkbook {
        path: String,
    },
}

pub fn apply_delta(state: &mut AppState, delta: Delta) {
    match delta {
        Delta::DatasetLoaded(dataset) => {
            let count = dataset.records.len();
            let source = dataset.source.label();
            state.set_dataset(*dataset);
            state.push_log(format!("[INFO] Dataset loaded: {count} rows ({source})"));
        }
        Delta::DatasetFailed { error } => {
            state.dataset_loading = false;
            state.push_log(format!("[WARN] Dataset load failed: {error}"));
        }
        Delta::HistoryLoaded { player_id, entries } => {
            state.history_loading.remove(&player_id);
            state.push_log(format!(
                "[INFO] History loaded: player {player_id} ({} gameweeks)",
                entries.len()
            ));
            state.history.insert(player_id, entries);
        }
        Delta::HistoryFailed { player_id, error } => {
            state.history_loading.remove(&player_id);
            state.push_log(format!("[WARN] History for player {player_id}: {error}"));
        }
        Delta::ExportStarted { path } => {
            state.export = ExportStatus {
                running: true,
                current: 0,
                total: 0,
                message: format!("Exporting to {path}"),
            };
            state.push_log(format!("[INFO] Export started: {path}"));
        }
        Delta::ExportProgress {
            current,
            total,
            message,
        } => {
            state.export.current = current;
            state.export.total = total;
            state.export.message = message;
        }
        Delta::ExportFinished {
            path,
            history_rows,
            errors,
        } => {
            state.export.running = false;
            state.export.message = format!("Saved {path}");
            state.push_log(format!(
                "[INFO] Export finished: {path} ({history_rows} history rows, {errors} errors)"
            ));
        }
        Delta::Log(msg) => state.push_log(msg),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample_data::sample_dataset;

    #[test]
    fn fresh_controls_map_to_an_empty_filter() {
        let dataset = sample_dataset();
        let controls = FilterControls::for_dataset(&dataset);
        assert!(controls.to_filter().is_empty());
    }

    #[test]
    fn degenerate_value_range_never_becomes_a_constraint() {
        let dataset = sample_dataset();
        let mut controls = FilterControls::for_dataset(&dataset);
        controls.value_bounds = (3.0, 3.0);
        controls.min_value = 3.0;
        assert!(controls.to_filter().min_value.is_none());
    }

    #[test]
    fn nudged_controls_materialize_constraints() {
        let dataset = sample_dataset();
        let mut controls = FilterControls::for_dataset(&dataset);
        controls.adjust_max_price(false);
        controls.adjust_min_minutes(true);
        controls.adjust_max_selected(false);
        let filter = controls.to_filter();
        assert!(filter.max_price.is_some());
        assert_eq!(filter.min_minutes, Some(90));
        assert_eq!(filter.max_selected, Some(95.0));
    }

    #[test]
    fn position_cycle_returns_to_all() {
        let dataset = sample_dataset();
        let mut controls = FilterControls::for_dataset(&dataset);
        for _ in 0..4 {
            controls.cycle_position();
            assert_eq!(controls.positions.len(), 1);
        }
        controls.cycle_position();
        assert_eq!(controls.positions.len(), Position::ALL.len());
    }

    #[test]
    fn dataset_delta_scores_and_rebuilds_filters() {
        let mut state = AppState::new();
        let dataset = sample_dataset();
        let expected = dataset.records.len();
        apply_delta(&mut state, Delta::DatasetLoaded(Box::new(dataset)));
        assert!(!state.dataset_loading);
        assert_eq!(state.scored.len(), expected);
        assert!(!state.filters.all_teams.is_empty());
        assert!(state.logs.back().unwrap().contains("Dataset loaded"));
    }

    #[test]
    fn filtered_players_sorts_by_active_key() {
        let mut state = AppState::new();
        apply_delta(
            &mut state,
            Delta::DatasetLoaded(Box::new(sample_dataset())),
        );
        state.sort = SortKey::TotalPoints;
        let view = state.filtered_players();
        for pair in view.windows(2) {
            assert!(
                SortKey::TotalPoints.value(&pair[0]) >= SortKey::TotalPoints.value(&pair[1])
            );
        }
    }
}
