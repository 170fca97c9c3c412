use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::Connection;
use tracing::debug;

use crate::post::Post;
use crate::problems::PostProblem;

pub fn connect(path: &str) -> Result<Connection> {
    if let Some(dir) = Path::new(path).parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    let conn = Connection::open(path).with_context(|| format!("Failed to open database {}", path))?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS analyzed_posts (
            post_id       INTEGER PRIMARY KEY,
            topic_id      INTEGER,
            url           TEXT,
            problem_count INTEGER NOT NULL DEFAULT 0,
            analyzed_at   TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS post_problems (
            id          INTEGER PRIMARY KEY,
            post_id     INTEGER NOT NULL REFERENCES analyzed_posts(post_id) ON DELETE CASCADE,
            kind        TEXT NOT NULL,
            probability REAL NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_problems_post ON post_problems(post_id);
        ",
    )?;
    Ok(())
}

// ── Saving ──

pub struct AnalysisRow {
    pub post_id: i64,
    pub topic_id: Option<i64>,
    pub url: Option<String>,
    pub problems: Vec<PostProblem>,
}

/// Database key for a post. Posts without an id (0) or with an id beyond
/// `i64::MAX` cannot be stored.
pub fn post_key(post: &Post) -> Option<i64> {
    i64::try_from(post.id).ok().filter(|&id| id != 0)
}

impl AnalysisRow {
    pub fn new(post: Post, problems: Vec<PostProblem>) -> Option<Self> {
        Some(AnalysisRow {
            post_id: post_key(&post)?,
            topic_id: post.topic_id.and_then(|t| i64::try_from(t).ok()),
            url: post.url,
            problems,
        })
    }
}

/// Store analysis results, replacing any earlier result for the same post.
pub fn save_results(conn: &Connection, rows: &[AnalysisRow]) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;
    {
        let mut clear_stmt = tx.prepare("DELETE FROM post_problems WHERE post_id = ?1")?;
        let mut post_stmt = tx.prepare(
            "INSERT OR REPLACE INTO analyzed_posts (post_id, topic_id, url, problem_count, analyzed_at)
             VALUES (?1, ?2, ?3, ?4, datetime('now'))",
        )?;
        let mut problem_stmt =
            tx.prepare("INSERT INTO post_problems (post_id, kind, probability) VALUES (?1, ?2, ?3)")?;

        for r in rows {
            clear_stmt.execute(rusqlite::params![r.post_id])?;
            post_stmt.execute(rusqlite::params![r.post_id, r.topic_id, r.url, r.problems.len() as i64])?;
            for p in &r.problems {
                problem_stmt.execute(rusqlite::params![r.post_id, p.kind(), p.probability() as f64])?;
            }
        }
    }
    tx.commit()?;
    debug!("Saved {} analysis results", rows.len());
    Ok(rows.len())
}

pub fn fetch_analyzed_ids(conn: &Connection) -> Result<HashSet<i64>> {
    let mut stmt = conn.prepare("SELECT post_id FROM analyzed_posts")?;
    let ids = stmt
        .query_map([], |row| row.get(0))?
        .collect::<Result<HashSet<i64>, _>>()?;
    Ok(ids)
}

// ── Flagged ──

pub struct FlaggedRow {
    pub post_id: i64,
    pub url: String,
    pub kind: String,
    pub probability: f64,
    pub analyzed_at: String,
}

pub fn fetch_flagged(conn: &Connection, limit: usize) -> Result<Vec<FlaggedRow>> {
    let mut stmt = conn.prepare(
        "SELECT a.post_id, COALESCE(a.url,''), p.kind, p.probability, a.analyzed_at
         FROM post_problems p
         JOIN analyzed_posts a ON a.post_id = p.post_id
         ORDER BY a.analyzed_at DESC, p.probability DESC
         LIMIT ?1",
    )?;
    let rows = stmt
        .query_map([limit as i64], |row| {
            Ok(FlaggedRow {
                post_id: row.get(0)?,
                url: row.get(1)?,
                kind: row.get(2)?,
                probability: row.get(3)?,
                analyzed_at: row.get(4)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ── Stats ──

pub struct Stats {
    pub analyzed: usize,
    pub flagged: usize,
    pub clean: usize,
    pub problems: usize,
}

pub fn get_stats(conn: &Connection) -> Result<Stats> {
    let analyzed: usize = conn.query_row("SELECT COUNT(*) FROM analyzed_posts", [], |r| r.get(0))?;
    let flagged: usize = conn.query_row(
        "SELECT COUNT(*) FROM analyzed_posts WHERE problem_count > 0",
        [],
        |r| r.get(0),
    )?;
    let problems: usize = conn.query_row("SELECT COUNT(*) FROM post_problems", [], |r| r.get(0))?;
    Ok(Stats {
        analyzed,
        flagged,
        clean: analyzed - flagged,
        problems,
    })
}
