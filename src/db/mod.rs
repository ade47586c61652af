use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex, MutexGuard};

pub mod career;
pub mod models;
use career::{PlayerCareer, TeamRecord};
use models::{Match, MatchStatus};

/// Load/save access to match documents keyed by match id.
pub trait MatchStore {
    fn load_match(&self, id: &str) -> Result<Option<Match>>;

    fn save_match(&self, m: &Match) -> Result<()>;

    /// Returns whether a document was removed.
    fn delete_match(&self, id: &str) -> Result<bool>;
}

/// Load/save access to player career and team records.
pub trait CareerStore {
    fn load_player(&self, player_id: &str) -> Result<Option<PlayerCareer>>;

    fn save_player(&self, career: &PlayerCareer) -> Result<()>;

    fn load_team(&self, team_id: &str) -> Result<Option<TeamRecord>>;

    fn save_team(&self, record: &TeamRecord) -> Result<()>;
}

/// Thread-safe SQLite document store (single connection with mutex)
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open (or create) the SQLite database at the given path.
    /// `":memory:"` gives a throwaway store.
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database at {}", path))?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
        let db = Database {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    /// Run schema migrations (idempotent)
    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn()?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("database connection mutex poisoned"))
    }

    // ── Matches ───────────────────────────────────────────────────────────────

    /// List (id, status) pairs, newest update first.
    pub fn list_matches(&self, status: Option<MatchStatus>) -> Result<Vec<(String, String)>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, status FROM matches
             WHERE ?1 IS NULL OR status = ?1
             ORDER BY updated_at DESC",
        )?;
        let rows = stmt
            .query_map(params![status.map(MatchStatus::as_str)], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}

impl MatchStore for Database {
    fn load_match(&self, id: &str) -> Result<Option<Match>> {
        let conn = self.conn()?;
        let doc: Option<String> = conn
            .query_row("SELECT document FROM matches WHERE id = ?1", params![id], |row| {
                row.get(0)
            })
            .optional()?;
        doc.map(|d| serde_json::from_str(&d).with_context(|| format!("Corrupt match document {}", id)))
            .transpose()
    }

    fn save_match(&self, m: &Match) -> Result<()> {
        let doc = serde_json::to_string(m).context("Failed to serialize match")?;
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO matches (id, status, document, updated_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(id) DO UPDATE SET
                status=excluded.status,
                document=excluded.document,
                updated_at=excluded.updated_at",
            params![m.id, m.status.as_str(), doc, m.updated_at],
        )?;
        Ok(())
    }

    fn delete_match(&self, id: &str) -> Result<bool> {
        let conn = self.conn()?;
        let removed = conn.execute("DELETE FROM matches WHERE id = ?1", params![id])?;
        Ok(removed > 0)
    }
}

impl CareerStore for Database {
    fn load_player(&self, player_id: &str) -> Result<Option<PlayerCareer>> {
        let conn = self.conn()?;
        let doc: Option<String> = conn
            .query_row(
                "SELECT document FROM player_careers WHERE player_id = ?1",
                params![player_id],
                |row| row.get(0),
            )
            .optional()?;
        doc.map(|d| {
            serde_json::from_str(&d)
                .with_context(|| format!("Corrupt career document {}", player_id))
        })
        .transpose()
    }

    fn save_player(&self, career: &PlayerCareer) -> Result<()> {
        let doc = serde_json::to_string(career).context("Failed to serialize career")?;
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO player_careers (player_id, name, document, updated_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(player_id) DO UPDATE SET
                name=excluded.name,
                document=excluded.document,
                updated_at=excluded.updated_at",
            params![career.player_id, career.name, doc, Utc::now()],
        )?;
        Ok(())
    }

    fn load_team(&self, team_id: &str) -> Result<Option<TeamRecord>> {
        let conn = self.conn()?;
        let doc: Option<String> = conn
            .query_row(
                "SELECT document FROM team_records WHERE team_id = ?1",
                params![team_id],
                |row| row.get(0),
            )
            .optional()?;
        doc.map(|d| {
            serde_json::from_str(&d).with_context(|| format!("Corrupt team document {}", team_id))
        })
        .transpose()
    }

    fn save_team(&self, record: &TeamRecord) -> Result<()> {
        let doc = serde_json::to_string(record).context("Failed to serialize team record")?;
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO team_records (team_id, name, document, updated_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(team_id) DO UPDATE SET
                name=excluded.name,
                document=excluded.document,
                updated_at=excluded.updated_at",
            params![record.team_id, record.name, doc, Utc::now()],
        )?;
        Ok(())
    }
}

/// SQLite schema (idempotent CREATE IF NOT EXISTS)
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS matches (
    id          TEXT    PRIMARY KEY,
    status      TEXT    NOT NULL,
    document    TEXT    NOT NULL,
    updated_at  TEXT    NOT NULL
);

CREATE TABLE IF NOT EXISTS player_careers (
    player_id   TEXT    PRIMARY KEY,
    name        TEXT    NOT NULL,
    document    TEXT    NOT NULL,
    updated_at  TEXT    NOT NULL
);

CREATE TABLE IF NOT EXISTS team_records (
    team_id     TEXT    PRIMARY KEY,
    name        TEXT    NOT NULL,
    document    TEXT    NOT NULL,
    updated_at  TEXT    NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_matches_status ON matches(status);
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use models::{MatchFormat, NewMatch, Team};

    fn sample_match(id: &str) -> Match {
        Match::new(
            NewMatch {
                id: id.into(),
                format: MatchFormat::t20(),
                team_a: Team::named("Strikers"),
                team_b: Team::named("Thunder"),
            },
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn test_match_document_round_trip() {
        let db = Database::open(":memory:").unwrap();
        let m = sample_match("m1");
        db.save_match(&m).unwrap();

        let loaded = db.load_match("m1").unwrap().expect("saved match");
        assert_eq!(loaded, m);
        assert!(db.load_match("missing").unwrap().is_none());

        let listed = db.list_matches(Some(MatchStatus::Scheduled)).unwrap();
        assert_eq!(listed, vec![("m1".to_string(), "scheduled".to_string())]);
        assert!(db.list_matches(Some(MatchStatus::Live)).unwrap().is_empty());

        assert!(db.delete_match("m1").unwrap());
        assert!(!db.delete_match("m1").unwrap());
    }

    #[test]
    fn test_career_upsert() {
        let db = Database::open(":memory:").unwrap();
        let mut career = PlayerCareer::new("p1", "Rahul");
        db.save_player(&career).unwrap();
        career.matches = 3;
        db.save_player(&career).unwrap();
        assert_eq!(db.load_player("p1").unwrap().unwrap().matches, 3);

        let team = TeamRecord::new("t1", "Strikers");
        db.save_team(&team).unwrap();
        assert_eq!(db.load_team("t1").unwrap(), Some(team));
        assert!(db.load_team("t2").unwrap().is_none());
    }
}
