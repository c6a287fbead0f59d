//! SQLite persistence: users, sessions, documents, analyses, citations.
//!
//! A single connection behind a mutex is plenty here; every statement is
//! short and the analysis pipeline dominates request time anyway.

use std::sync::Mutex;

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};

use paperlens_core::AnalysisResult;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    email TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    created_at TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS sessions (
    token TEXT PRIMARY KEY,
    user_id INTEGER NOT NULL REFERENCES users(id),
    created_at TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS documents (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL REFERENCES users(id),
    filename TEXT NOT NULL,
    title TEXT,
    word_count INTEGER NOT NULL,
    created_at TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS analyses (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    document_id INTEGER NOT NULL REFERENCES documents(id),
    summary TEXT NOT NULL,
    plagiarism_score REAL NOT NULL,
    plagiarism_sources TEXT NOT NULL,
    claims TEXT NOT NULL,
    critique TEXT NOT NULL,
    processing_ms INTEGER NOT NULL,
    created_at TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS citations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    analysis_id INTEGER NOT NULL REFERENCES analyses(id),
    raw_text TEXT NOT NULL,
    cleaned_title TEXT NOT NULL,
    status TEXT NOT NULL,
    doi TEXT,
    matched_title TEXT
);
";

pub struct Storage {
    conn: Mutex<Connection>,
}

impl Storage {
    pub fn open(path: &str) -> anyhow::Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    #[cfg(test)]
    pub fn open_in_memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn create_user(&self, email: &str, password_hash: &str) -> rusqlite::Result<i64> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO users (email, password_hash, created_at) VALUES (?1, ?2, ?3)",
            params![email, password_hash, Utc::now().to_rfc3339()],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Look up `(id, password_hash)` by email.
    pub fn find_user(&self, email: &str) -> rusqlite::Result<Option<(i64, String)>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT id, password_hash FROM users WHERE email = ?1",
            params![email],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()
    }

    pub fn insert_session(&self, token: &str, user_id: i64) -> rusqlite::Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO sessions (token, user_id, created_at) VALUES (?1, ?2, ?3)",
            params![token, user_id, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    pub fn user_for_token(&self, token: &str) -> rusqlite::Result<Option<i64>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT user_id FROM sessions WHERE token = ?1",
            params![token],
            |row| row.get(0),
        )
        .optional()
    }

    pub fn store_document(
        &self,
        user_id: i64,
        filename: &str,
        title: Option<&str>,
        word_count: usize,
    ) -> rusqlite::Result<i64> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO documents (user_id, filename, title, word_count, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                user_id,
                filename,
                title,
                word_count as i64,
                Utc::now().to_rfc3339()
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Persist one analysis with its citation rows. Returns the analysis id.
    pub fn store_analysis(
        &self,
        document_id: i64,
        result: &AnalysisResult,
    ) -> anyhow::Result<i64> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO analyses (document_id, summary, plagiarism_score, \
             plagiarism_sources, claims, critique, processing_ms, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                document_id,
                result.summary,
                result.plagiarism_score,
                serde_json::to_string(&result.plagiarism_sources)?,
                serde_json::to_string(&result.claims)?,
                serde_json::to_string(&result.critique)?,
                result.processing.as_millis() as i64,
                Utc::now().to_rfc3339()
            ],
        )?;
        let analysis_id = tx.last_insert_rowid();

        for citation in &result.citations {
            let status = serde_json::to_value(citation.status)?
                .as_str()
                .unwrap_or("error")
                .to_string();
            tx.execute(
                "INSERT INTO citations (analysis_id, raw_text, cleaned_title, \
                 status, doi, matched_title) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    analysis_id,
                    citation.raw_text,
                    citation.cleaned_title,
                    status,
                    citation.doi,
                    citation.matched_title
                ],
            )?;
        }

        tx.commit()?;
        Ok(analysis_id)
    }

    #[cfg(test)]
    fn count(&self, table: &str) -> i64 {
        let conn = self.conn.lock().unwrap();
        conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
            row.get(0)
        })
        .unwrap()
    }
}

/// True when an insert failed on a UNIQUE constraint (duplicate email).
pub fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use paperlens_core::{CitationRecord, CitationStatus, CritiqueReport};

    use super::*;

    fn sample_result() -> AnalysisResult {
        AnalysisResult {
            summary: "A summary.".to_string(),
            plagiarism_score: 12.5,
            plagiarism_sources: vec![],
            citations: vec![CitationRecord {
                raw_text: "1. Smith, J. (2020). A Study of Things.".to_string(),
                cleaned_title: "A Study of Things".to_string(),
                status: CitationStatus::Valid,
                doi: Some("10.1000/xyz".to_string()),
                matched_title: None,
            }],
            claims: vec![],
            critique: CritiqueReport::default(),
            processing: Duration::from_millis(1234),
        }
    }

    #[test]
    fn duplicate_email_is_a_unique_violation() {
        let storage = Storage::open_in_memory().unwrap();
        storage.create_user("a@example.org", "hash").unwrap();
        let err = storage.create_user("a@example.org", "hash").unwrap_err();
        assert!(is_unique_violation(&err));
    }

    #[test]
    fn session_token_resolves_to_user() {
        let storage = Storage::open_in_memory().unwrap();
        let user_id = storage.create_user("a@example.org", "hash").unwrap();
        storage.insert_session("tok123", user_id).unwrap();

        assert_eq!(storage.user_for_token("tok123").unwrap(), Some(user_id));
        assert_eq!(storage.user_for_token("other").unwrap(), None);
    }

    #[test]
    fn analysis_and_citations_are_persisted_atomically() {
        let storage = Storage::open_in_memory().unwrap();
        let user_id = storage.create_user("a@example.org", "hash").unwrap();
        let doc_id = storage
            .store_document(user_id, "paper.pdf", Some("A Title"), 420)
            .unwrap();

        let analysis_id = storage.store_analysis(doc_id, &sample_result()).unwrap();
        assert!(analysis_id > 0);
        assert_eq!(storage.count("analyses"), 1);
        assert_eq!(storage.count("citations"), 1);
    }
}
