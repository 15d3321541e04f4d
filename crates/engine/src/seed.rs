//! Candidate seeding – replace the `candidates` table with a fixture set.

use crate::traits::{CandidateStore, CapResult};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Fixture shipped with the engine.
pub const DEFAULT_FIXTURE: &str = include_str!("../fixtures/candidates.yaml");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub election_id: i64,
    pub name: String,
    pub party: String,
    pub description: String,
    /// Polling support in whole percent.
    pub polling_support: u8,
    #[serde(default)]
    pub is_incumbent: bool,
    #[serde(default)]
    pub website: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedSummary {
    pub deleted: usize,
    pub inserted: usize,
    pub total: usize,
    pub per_election: BTreeMap<i64, usize>,
}

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("failed to parse candidate fixture: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("candidate #{index} is invalid: {reason}")]
    Invalid { index: usize, reason: String },
}

/// Parse and validate a YAML candidate list.
pub fn load_fixture(yaml: &str) -> Result<Vec<Candidate>, SeedError> {
    let candidates: Vec<Candidate> = serde_yaml::from_str(yaml)?;
    for (index, c) in candidates.iter().enumerate() {
        if c.name.trim().is_empty() {
            return Err(SeedError::Invalid {
                index,
                reason: "name is empty".into(),
            });
        }
        if c.polling_support > 100 {
            return Err(SeedError::Invalid {
                index,
                reason: format!("polling_support {} exceeds 100", c.polling_support),
            });
        }
    }
    Ok(candidates)
}

/// Replace the store's contents with `candidates` and report the result.
pub fn seed_candidates<S>(store: &mut S, candidates: &[Candidate]) -> CapResult<SeedSummary>
where
    S: CandidateStore + ?Sized,
{
    let deleted = store.replace_all(candidates)?;
    tracing::info!(deleted, inserted = candidates.len(), "candidates replaced");

    let summary = SeedSummary {
        deleted,
        inserted: candidates.len(),
        total: store.count()?,
        per_election: store.count_by_election()?,
    };
    if summary.total != summary.inserted {
        tracing::warn!(
            total = summary.total,
            inserted = summary.inserted,
            "row count after seeding does not match fixture"
        );
    }
    Ok(summary)
}

// ===========================================================================
// SQLite store
// ===========================================================================

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS candidates (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    election_id     INTEGER NOT NULL,
    name            TEXT    NOT NULL,
    party           TEXT    NOT NULL,
    description     TEXT    NOT NULL,
    polling_support INTEGER NOT NULL,
    is_incumbent    INTEGER NOT NULL DEFAULT 0,
    website         TEXT
)";

pub struct SqliteCandidateStore {
    conn: Connection,
}

impl SqliteCandidateStore {
    /// Open (or create) a database file and make sure the table exists.
    pub fn open(path: &Path) -> CapResult<Self> {
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> CapResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> CapResult<Self> {
        conn.execute_batch(CREATE_TABLE)?;
        Ok(Self { conn })
    }

    pub fn all(&self) -> CapResult<Vec<Candidate>> {
        let mut stmt = self.conn.prepare(
            "SELECT election_id, name, party, description, polling_support, is_incumbent, website
             FROM candidates ORDER BY id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(Candidate {
                election_id: row.get(0)?,
                name: row.get(1)?,
                party: row.get(2)?,
                description: row.get(3)?,
                polling_support: row.get(4)?,
                is_incumbent: row.get(5)?,
                website: row.get(6)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

impl CandidateStore for SqliteCandidateStore {
    fn replace_all(&mut self, candidates: &[Candidate]) -> CapResult<usize> {
        let tx = self.conn.transaction()?;
        let deleted = tx.execute("DELETE FROM candidates", [])?;
        {
            let mut insert = tx.prepare(
                "INSERT INTO candidates
                 (election_id, name, party, description, polling_support, is_incumbent, website)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for c in candidates {
                insert.execute(params![
                    c.election_id,
                    c.name,
                    c.party,
                    c.description,
                    c.polling_support,
                    c.is_incumbent,
                    c.website,
                ])?;
            }
        }
        tx.commit()?;
        Ok(deleted)
    }

    fn count(&self) -> CapResult<usize> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM candidates", [], |row| row.get(0))?;
        Ok(n as usize)
    }

    fn count_by_election(&self) -> CapResult<BTreeMap<i64, usize>> {
        let mut stmt = self.conn.prepare(
            "SELECT election_id, COUNT(*) FROM candidates GROUP BY election_id ORDER BY election_id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)? as usize))
        })?;
        Ok(rows.collect::<Result<BTreeMap<_, _>, _>>()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_fixture_loads() {
        let candidates = load_fixture(DEFAULT_FIXTURE).expect("fixture should parse");
        assert_eq!(candidates.len(), 8);
        assert_eq!(candidates[0].name, "Michael Rulli");
        assert_eq!(candidates[0].website.as_deref(), Some("https://michaelrulli.com"));
        assert_eq!(candidates[1].website, None);
        assert!(candidates[4].is_incumbent);
    }

    #[test]
    fn test_fixture_validation() {
        let yaml = r#"
- election_id: 1
  name: "  "
  party: Independent
  description: blank
  polling_support: 10
"#;
        assert!(matches!(
            load_fixture(yaml),
            Err(SeedError::Invalid { index: 0, .. })
        ));

        let yaml = r#"
- election_id: 1
  name: Pat
  party: Independent
  description: overpolled
  polling_support: 101
"#;
        assert!(matches!(load_fixture(yaml), Err(SeedError::Invalid { .. })));
        assert!(matches!(load_fixture("- [oops"), Err(SeedError::Parse(_))));
    }

    #[test]
    fn test_seed_reports_per_election_counts() {
        let candidates = load_fixture(DEFAULT_FIXTURE).unwrap();
        let mut store = SqliteCandidateStore::open_in_memory().unwrap();

        let summary = seed_candidates(&mut store, &candidates).unwrap();

        assert_eq!(summary.deleted, 0);
        assert_eq!(summary.inserted, 8);
        assert_eq!(summary.total, 8);
        assert_eq!(
            summary.per_election,
            BTreeMap::from([(199, 2), (200, 2), (201, 2), (202, 2)])
        );
    }

    #[test]
    fn test_reseeding_replaces_rows() {
        let candidates = load_fixture(DEFAULT_FIXTURE).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("tracker.db");

        let mut store = SqliteCandidateStore::open(&db).unwrap();
        seed_candidates(&mut store, &candidates).unwrap();
        drop(store);

        let mut store = SqliteCandidateStore::open(&db).unwrap();
        let summary = seed_candidates(&mut store, &candidates[..3]).unwrap();

        assert_eq!(summary.deleted, 8);
        assert_eq!(summary.total, 3);
        assert_eq!(store.all().unwrap(), candidates[..3].to_vec());
    }
}
