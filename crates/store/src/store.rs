use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Local};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use topicsim_core::{GeneratedDocument, SimConfig};
use tracing::info;

/// SQLite-backed corpus store. Every call opens its own connection and
/// closes it on return.
#[derive(Clone)]
pub struct SimStore {
    path: PathBuf,
}

impl SimStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let store = Self {
            path: path.as_ref().to_path_buf(),
        };
        store.init()?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connection(&self) -> Result<Connection> {
        let conn = Connection::open(&self.path)
            .with_context(|| format!("failed to open database {}", self.path.display()))?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(conn)
    }

    pub fn init(&self) -> Result<()> {
        let conn = self.connection()?;
        conn.execute_batch(
            r#"
            PRAGMA journal_mode = WAL;
            CREATE TABLE IF NOT EXISTS sim_parameters (
                run_id INTEGER PRIMARY KEY AUTOINCREMENT,
                K_topics INTEGER NOT NULL,
                V_size INTEGER NOT NULL,
                N_docs INTEGER NOT NULL,
                alpha_param REAL NOT NULL,
                sim_date TEXT NOT NULL,
                final_similarity_score REAL
            );
            CREATE TABLE IF NOT EXISTS documents_data (
                doc_id INTEGER PRIMARY KEY AUTOINCREMENT,
                run_id INTEGER NOT NULL,
                simulated_text TEXT NOT NULL,
                true_theta_vector TEXT NOT NULL,
                FOREIGN KEY(run_id) REFERENCES sim_parameters(run_id)
            );
            CREATE TABLE IF NOT EXISTS analysis_results (
                result_id INTEGER PRIMARY KEY AUTOINCREMENT,
                doc_id INTEGER NOT NULL,
                run_id INTEGER NOT NULL,
                predicted_theta_vector TEXT NOT NULL,
                cosine_similarity REAL NOT NULL,
                FOREIGN KEY(run_id) REFERENCES sim_parameters(run_id)
            );
            CREATE INDEX IF NOT EXISTS idx_documents_run ON documents_data(run_id);
            CREATE INDEX IF NOT EXISTS idx_results_run ON analysis_results(run_id);
            "#,
        )?;
        Ok(())
    }

    pub fn record_simulation_parameters(&self, run: &RunParameters) -> Result<i64> {
        let conn = self.connection()?;
        conn.execute(
            "INSERT INTO sim_parameters (K_topics, V_size, N_docs, alpha_param, sim_date) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                run.topics as i64,
                run.vocab_size as i64,
                run.docs as i64,
                run.alpha,
                run.sim_date.to_rfc3339()
            ],
        )
        .context("failed to record simulation parameters")?;
        Ok(conn.last_insert_rowid())
    }

    pub fn bulk_insert_documents(&self, documents: &[GeneratedDocument]) -> Result<usize> {
        if documents.is_empty() {
            return Err(anyhow!("no documents to insert"));
        }
        let mut conn = self.connection()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO documents_data (run_id, simulated_text, true_theta_vector) VALUES (?1, ?2, ?3)",
            )?;
            for doc in documents {
                stmt.execute(params![doc.run_id, doc.text, doc.theta_json()?])
                    .context("failed to insert document")?;
            }
        }
        tx.commit()?;
        info!(count = documents.len(), "documents stored");
        Ok(documents.len())
    }

    /// Documents of one run in insertion order.
    pub fn fetch_documents_for_analysis(&self, run_id: i64) -> Result<Vec<StoredDocument>> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(
            "SELECT doc_id, simulated_text, true_theta_vector FROM documents_data WHERE run_id = ?1 ORDER BY doc_id",
        )?;
        let mut rows = stmt.query([run_id])?;
        let mut documents = Vec::new();
        while let Some(row) = rows.next()? {
            let doc_id: i64 = row.get(0)?;
            let raw_theta: String = row.get(2)?;
            let true_theta = serde_json::from_str(&raw_theta)
                .with_context(|| format!("invalid true_theta_vector for doc {doc_id}"))?;
            documents.push(StoredDocument {
                doc_id,
                run_id,
                text: row.get(1)?,
                true_theta,
            });
        }
        info!(run_id, count = documents.len(), "documents fetched");
        Ok(documents)
    }

    pub fn bulk_insert_analysis_results(&self, results: &[AnalysisRecord]) -> Result<usize> {
        if results.is_empty() {
            return Err(anyhow!("no analysis results to insert"));
        }
        let mut conn = self.connection()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO analysis_results (doc_id, run_id, predicted_theta_vector, cosine_similarity) VALUES (?1, ?2, ?3, ?4)",
            )?;
            for result in results {
                stmt.execute(params![
                    result.doc_id,
                    result.run_id,
                    serde_json::to_string(&result.predicted_theta)?,
                    result.cosine_similarity
                ])
                .context("failed to insert analysis result")?;
            }
        }
        tx.commit()?;
        info!(count = results.len(), "analysis results stored");
        Ok(results.len())
    }

    pub fn update_simulation_results(&self, run_id: i64, final_similarity_score: f64) -> Result<()> {
        let conn = self.connection()?;
        let changed = conn.execute(
            "UPDATE sim_parameters SET final_similarity_score = ?1 WHERE run_id = ?2",
            params![final_similarity_score, run_id],
        )?;
        if changed == 0 {
            return Err(anyhow!("run {run_id} does not exist"));
        }
        info!(run_id, final_similarity_score, "final score stored");
        Ok(())
    }

    pub fn fetch_run(&self, run_id: i64) -> Result<Option<RunSummary>> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(&format!("{RUN_SUMMARY_SELECT} WHERE p.run_id = ?1"))?;
        let run = stmt.query_row([run_id], run_summary_from_row).optional()?;
        Ok(run)
    }

    /// All runs, newest first.
    pub fn list_runs(&self) -> Result<Vec<RunSummary>> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(&format!("{RUN_SUMMARY_SELECT} ORDER BY p.run_id DESC"))?;
        let runs = stmt
            .query_map([], run_summary_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(runs)
    }

    pub fn fetch_analysis_results(&self, run_id: i64) -> Result<Vec<AnalysisRecord>> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(
            "SELECT doc_id, predicted_theta_vector, cosine_similarity FROM analysis_results WHERE run_id = ?1 ORDER BY result_id",
        )?;
        let mut rows = stmt.query([run_id])?;
        let mut results = Vec::new();
        while let Some(row) = rows.next()? {
            let doc_id: i64 = row.get(0)?;
            let raw_theta: String = row.get(1)?;
            let predicted_theta = serde_json::from_str(&raw_theta)
                .with_context(|| format!("invalid predicted_theta_vector for doc {doc_id}"))?;
            results.push(AnalysisRecord {
                doc_id,
                run_id,
                predicted_theta,
                cosine_similarity: row.get(2)?,
            });
        }
        Ok(results)
    }
}

const RUN_SUMMARY_SELECT: &str = r#"
    SELECT
        p.run_id,
        p.K_topics,
        p.V_size,
        p.N_docs,
        p.alpha_param,
        p.sim_date,
        p.final_similarity_score,
        (SELECT COUNT(*) FROM documents_data d WHERE d.run_id = p.run_id)
    FROM sim_parameters p
"#;

fn run_summary_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RunSummary> {
    Ok(RunSummary {
        run_id: row.get(0)?,
        topics: row.get::<_, i64>(1)? as usize,
        vocab_size: row.get::<_, i64>(2)? as usize,
        docs: row.get::<_, i64>(3)? as usize,
        alpha: row.get(4)?,
        sim_date: row.get(5)?,
        final_similarity_score: row.get(6)?,
        stored_documents: row.get::<_, i64>(7)? as usize,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunParameters {
    pub topics: usize,
    pub vocab_size: usize,
    pub docs: usize,
    pub alpha: f64,
    pub sim_date: DateTime<Local>,
}

impl RunParameters {
    pub fn from_config(cfg: &SimConfig, sim_date: DateTime<Local>) -> Self {
        Self {
            topics: cfg.topics,
            vocab_size: cfg.vocab_size,
            docs: cfg.docs,
            alpha: cfg.alpha,
            sim_date,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub doc_id: i64,
    pub run_id: i64,
    pub text: String,
    pub true_theta: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRecord {
    pub doc_id: i64,
    pub run_id: i64,
    pub predicted_theta: Vec<f64>,
    pub cosine_similarity: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub run_id: i64,
    pub topics: usize,
    pub vocab_size: usize,
    pub docs: usize,
    pub alpha: f64,
    /// RFC 3339 timestamp.
    pub sim_date: String,
    pub final_similarity_score: Option<f64>,
    pub stored_documents: usize,
}
