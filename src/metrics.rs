//! Tolerant numeric access over semi-structured player rows.
//!
//! The FPL feed is inconsistent about types: `form`, `points_per_game`,
//! `selected_by_percent` and the per-90 columns arrive as JSON strings, the
//! rest as numbers, and low-minute players are missing most advanced metrics
//! entirely. Everything funnels through these helpers so a missing or
//! malformed field is always a default, never an error.

use serde_json::Value;

/// Canonical stat column names used across the crate. These match the FPL
/// `bootstrap-static` field names where one exists.
pub mod keys {
    pub const TOTAL_POINTS: &str = "total_points";
    pub const POINTS_PER_GAME: &str = "points_per_game";
    pub const POINTS_PER_MILLION: &str = "points_per_million";
    pub const FORM: &str = "form";
    pub const VALUE_SEASON: &str = "value_season";
    pub const SELECTED_BY_PERCENT: &str = "selected_by_percent";
    pub const XG_PER90: &str = "expected_goals_per_90";
    pub const XA_PER90: &str = "expected_assists_per_90";
    pub const XGI_PER90: &str = "expected_goal_involvements_per_90";
    pub const XGC_PER90: &str = "expected_goals_conceded_per_90";
    pub const CLEAN_SHEETS_PER90: &str = "clean_sheets_per_90";
    pub const SAVES_PER90: &str = "saves_per_90";
    pub const CREATIVITY_RANK: &str = "creativity_rank";
    pub const CORNERS_ORDER: &str = "corners_and_indirect_freekicks_order";
    pub const DIRECT_FREEKICKS_ORDER: &str = "direct_freekicks_order";
    pub const PENALTIES_ORDER: &str = "penalties_order";
}

/// Columns offered by the comparison picker. Set-piece orders are excluded:
/// a lower order is better, which would read backwards on a radar axis.
pub const COMPARISON_METRICS: &[&str] = &[
    keys::TOTAL_POINTS,
    keys::POINTS_PER_GAME,
    keys::POINTS_PER_MILLION,
    keys::FORM,
    keys::VALUE_SEASON,
    keys::SELECTED_BY_PERCENT,
    keys::XG_PER90,
    keys::XA_PER90,
    keys::XGI_PER90,
    keys::XGC_PER90,
    keys::CLEAN_SHEETS_PER90,
    keys::SAVES_PER90,
];

/// Parse a display-ish numeric string ("4.5", "1,234", "-") into a float.
pub fn parse_number(raw: &str) -> Option<f64> {
    let s = raw.trim();
    if s.is_empty() || s == "-" {
        return None;
    }
    let cleaned: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-' || *c == ',')
        .collect();
    let cleaned = cleaned.replace(',', "");
    if cleaned.is_empty() || cleaned == "-" {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Coerce a JSON value to a finite float. Accepts numbers and numeric
/// strings; null, booleans, arrays, objects and garbage all yield `None`.
pub fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => parse_number(s),
        _ => None,
    }
}

/// Field lookup on a raw JSON row: absent column, null, or unparseable
/// value all collapse to `default`.
pub fn field_or(row: &Value, name: &str, default: f64) -> f64 {
    row.get(name).and_then(numeric).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_number_handles_feed_strings() {
        assert_eq!(parse_number("4.5"), Some(4.5));
        assert_eq!(parse_number(" 1,234 "), Some(1234.0));
        assert_eq!(parse_number("-0.3"), Some(-0.3));
        assert_eq!(parse_number("-"), None);
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("n/a"), None);
    }

    #[test]
    fn numeric_accepts_numbers_and_strings_only() {
        assert_eq!(numeric(&json!(3.25)), Some(3.25));
        assert_eq!(numeric(&json!("3.25")), Some(3.25));
        assert_eq!(numeric(&json!(null)), None);
        assert_eq!(numeric(&json!(true)), None);
        assert_eq!(numeric(&json!([1])), None);
    }

    #[test]
    fn field_or_defaults_for_absent_and_null() {
        let row = json!({"form": "2.5", "minutes": 90, "news": null});
        assert_eq!(field_or(&row, "form", 0.0), 2.5);
        assert_eq!(field_or(&row, "minutes", 0.0), 90.0);
        assert_eq!(field_or(&row, "news", 0.0), 0.0);
        assert_eq!(field_or(&row, "not_a_column", 7.0), 7.0);
    }
}
