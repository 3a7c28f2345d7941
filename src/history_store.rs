//! Sqlite persistence for fetched gameweek history, so a player's
//! Performance view is instant across runs and the headless ingest bin can
//! warm the whole league in one go.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection};

use crate::history_fetch::GameweekEntry;
use crate::http_cache::app_cache_dir;

const DB_FILE: &str = "player_history.sqlite";

pub fn default_db_path() -> Option<PathBuf> {
    app_cache_dir().map(|dir| dir.join(DB_FILE))
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let conn =
        Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        CREATE TABLE IF NOT EXISTS gameweek_history (
            player_id INTEGER NOT NULL,
            round INTEGER NOT NULL,
            total_points INTEGER NOT NULL,
            opponent TEXT NOT NULL,
            minutes INTEGER NOT NULL,
            kickoff TEXT NULL,
            updated_at TEXT NOT NULL,
            PRIMARY KEY (player_id, round)
        );
        CREATE INDEX IF NOT EXISTS idx_history_player ON gameweek_history(player_id);
        "#,
    )
    .context("create sqlite schema")?;
    Ok(())
}

/// Upsert one player's history rows. Returns the number of rows written.
pub fn upsert_history(
    conn: &mut Connection,
    player_id: u32,
    entries: &[GameweekEntry],
) -> Result<usize> {
    let updated_at = Utc::now().to_rfc3339();
    let tx = conn.transaction().context("begin history transaction")?;
    {
        let mut stmt = tx
            .prepare(
                r#"
                INSERT OR REPLACE INTO gameweek_history
                    (player_id, round, total_points, opponent, minutes, kickoff, updated_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )
            .context("prepare history upsert")?;
        for entry in entries {
            stmt.execute(params![
                player_id as i64,
                entry.round as i64,
                entry.total_points as i64,
                entry.opponent,
                entry.minutes as i64,
                entry.kickoff,
                updated_at,
            ])
            .context("upsert history row")?;
        }
    }
    tx.commit().context("commit history transaction")?;
    Ok(entries.len())
}

pub fn load_history(conn: &Connection, player_id: u32) -> Result<Vec<GameweekEntry>> {
    let mut stmt = conn
        .prepare(
            r#"
            SELECT round, total_points, opponent, minutes, kickoff
            FROM gameweek_history
            WHERE player_id = ?1
            ORDER BY round ASC
            "#,
        )
        .context("prepare history query")?;

    let rows = stmt
        .query_map(params![player_id as i64], |row| {
            Ok(GameweekEntry {
                round: row.get::<_, i64>(0)? as u32,
                total_points: row.get::<_, i64>(1)? as i32,
                opponent: row.get(2)?,
                minutes: row.get::<_, i64>(3)? as u32,
                kickoff: row.get(4)?,
            })
        })
        .context("query history rows")?;

    let mut entries = Vec::new();
    for row in rows {
        entries.push(row.context("read history row")?);
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(round: u32, points: i32) -> GameweekEntry {
        GameweekEntry {
            round,
            total_points: points,
            opponent: "Test FC".to_string(),
            minutes: 90,
            kickoff: None,
        }
    }

    #[test]
    fn roundtrips_and_replaces_rows() {
        let mut conn = Connection::open_in_memory().expect("open in-memory db");
        init_schema(&conn).expect("schema");

        upsert_history(&mut conn, 7, &[entry(1, 2), entry(2, 9)]).expect("upsert");
        let rows = load_history(&conn, 7).expect("load");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].total_points, 9);

        // Re-fetch of the same round replaces instead of duplicating.
        upsert_history(&mut conn, 7, &[entry(2, 12)]).expect("upsert again");
        let rows = load_history(&conn, 7).expect("load again");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].total_points, 12);

        assert!(load_history(&conn, 99).expect("other player").is_empty());
    }
}
