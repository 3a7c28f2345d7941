use std::collections::HashSet;
use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};

use fpl_terminal::comparison::build_comparison;
use fpl_terminal::dataset::Position;
use fpl_terminal::dataset_fetch::parse_bootstrap;
use fpl_terminal::metrics::keys;
use fpl_terminal::rankings::{self, PlayerFilter, SortKey};
use fpl_terminal::sample_data::sample_dataset;
use fpl_terminal::value_score::{score_record, scored_players, ScoreCache};

const BOOTSTRAP_JSON: &str = r#"{
  "teams": [
    { "id": 1, "name": "Arsenal" },
    { "id": 2, "name": "Liverpool" }
  ],
  "element_types": [
    { "id": 1, "singular_name": "Goalkeeper" },
    { "id": 2, "singular_name": "Defender" },
    { "id": 3, "singular_name": "Midfielder" },
    { "id": 4, "singular_name": "Forward" }
  ],
  "elements": [
    {
      "id": 1, "web_name": "Keeper", "team": 1, "element_type": 1,
      "now_cost": 50, "minutes": 1890, "status": "a",
      "total_points": 80, "points_per_game": "3.8", "form": "4.0",
      "value_season": "16.0", "selected_by_percent": "12.0",
      "saves_per_90": "3.4", "clean_sheets_per_90": "0.40",
      "expected_goals_conceded_per_90": "1.02"
    },
    {
      "id": 2, "web_name": "Winger", "team": 2, "element_type": 3,
      "now_cost": 128, "minutes": 2100, "status": "a",
      "total_points": 190, "points_per_game": "6.8", "form": "7.5",
      "value_season": "14.8", "selected_by_percent": "48.0",
      "expected_goals_per_90": "0.61", "expected_assists_per_90": "0.31",
      "expected_goal_involvements_per_90": "0.92", "creativity_rank": 3
    }
  ]
}"#;

fn bench_bootstrap_parse(c: &mut Criterion) {
    c.bench_function("bootstrap_parse", |b| {
        b.iter(|| {
            let snapshot = parse_bootstrap(black_box(BOOTSTRAP_JSON)).unwrap();
            black_box(snapshot.records.len());
        })
    });
}

fn bench_score_dataset(c: &mut Criterion) {
    let dataset = sample_dataset();
    c.bench_function("score_dataset", |b| {
        b.iter(|| {
            let total: f64 = dataset
                .records
                .iter()
                .map(|record| score_record(black_box(record)))
                .sum();
            black_box(total);
        })
    });
}

fn bench_filter_and_rank(c: &mut Criterion) {
    let dataset = sample_dataset();
    let mut cache = ScoreCache::default();
    let scored = scored_players(&dataset, &mut cache);
    let filter = PlayerFilter {
        positions: Some(HashSet::from([Position::Midfielder, Position::Forward])),
        min_minutes: Some(450),
        max_selected: Some(50.0),
        ..PlayerFilter::default()
    };

    c.bench_function("filter_and_rank", |b| {
        b.iter(|| {
            let filtered = filter.apply(black_box(&scored));
            let ranked = rankings::top_n(&filtered, SortKey::ValueScore, 10);
            black_box(ranked.len());
        })
    });
}

fn bench_differentials(c: &mut Criterion) {
    let dataset = sample_dataset();
    let mut cache = ScoreCache::default();
    let scored = scored_players(&dataset, &mut cache);

    c.bench_function("differential_picks", |b| {
        b.iter(|| {
            let picks = rankings::differential_picks(black_box(&scored));
            black_box(picks.len());
        })
    });
}

fn bench_comparison(c: &mut Criterion) {
    let dataset = sample_dataset();
    let mut cache = ScoreCache::default();
    let scored = scored_players(&dataset, &mut cache);
    let selected: Vec<_> = scored.iter().take(6).cloned().collect();
    let metrics = [keys::POINTS_PER_GAME, keys::FORM, keys::VALUE_SEASON];

    c.bench_function("build_comparison", |b| {
        b.iter(|| {
            let matrix = build_comparison(black_box(&selected), black_box(&metrics));
            black_box(matrix.is_ok());
        })
    });
}

criterion_group!(
    benches,
    bench_bootstrap_parse,
    bench_score_dataset,
    bench_filter_and_rank,
    bench_differentials,
    bench_comparison
);
criterion_main!(benches);
