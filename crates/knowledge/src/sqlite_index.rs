//! SQLite-backed vector index for document fragments.
//!
//! Embeddings are stored as little-endian `f32` BLOBs and scored by brute
//! force cosine similarity, which is fine for small local corpora.

use crate::types::{DocumentFragment, ScoredFragment};
use crate::vector_index::VectorIndex;
use docchat_core::{AppError, AppResult};
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Local vector index stored in a single SQLite file.
pub struct SqliteIndex {
    path: PathBuf,
    conn: Arc<Mutex<Connection>>,
}

impl SqliteIndex {
    /// Open (creating if needed) the index at `db_path`.
    pub fn open(db_path: &Path) -> AppResult<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| AppError::Index(format!("Failed to create index directory: {}", e)))?;
        }

        let conn = Connection::open(db_path)
            .map_err(|e| AppError::Index(format!("Failed to open SQLite index: {}", e)))?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS fragments (
                id TEXT PRIMARY KEY,
                text TEXT NOT NULL,
                embedding BLOB NOT NULL,
                metadata TEXT NOT NULL
            );
            "#,
        )
        .map_err(|e| AppError::Index(format!("Failed to create tables: {}", e)))?;

        tracing::debug!("Opened SQLite index at {:?}", db_path);

        Ok(Self {
            path: db_path.to_path_buf(),
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Store a fragment with its embedding and return the new row id.
    pub fn insert(&self, fragment: &DocumentFragment, embedding: &[f32]) -> AppResult<String> {
        let id = uuid::Uuid::new_v4().to_string();
        let metadata_json = serde_json::to_string(&fragment.metadata)
            .map_err(|e| AppError::Index(format!("Failed to serialize metadata: {}", e)))?;

        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO fragments (id, text, embedding, metadata) VALUES (?1, ?2, ?3, ?4)",
            params![id, fragment.text, embedding_to_bytes(embedding), metadata_json],
        )
        .map_err(|e| AppError::Index(format!("Failed to insert fragment: {}", e)))?;

        Ok(id)
    }

    /// Number of stored fragments.
    pub fn count(&self) -> AppResult<usize> {
        let conn = self.lock()?;
        conn.query_row("SELECT COUNT(*) FROM fragments", [], |row| {
            row.get::<_, i64>(0).map(|v| v as usize)
        })
        .map_err(|e| AppError::Index(format!("Failed to count fragments: {}", e)))
    }

    fn lock(&self) -> AppResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| AppError::Index("SQLite connection lock poisoned".to_string()))
    }
}

/// Score every stored fragment against `query` and keep the best `top_k`.
///
/// Rows are read in insertion order and the sort is stable, so equal scores
/// keep that order.
fn query_fragments(
    conn: &Connection,
    query: &[f32],
    top_k: usize,
) -> AppResult<Vec<ScoredFragment>> {
    let mut stmt = conn
        .prepare("SELECT text, embedding, metadata FROM fragments ORDER BY rowid")
        .map_err(|e| AppError::Index(format!("Failed to prepare query: {}", e)))?;

    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Vec<u8>>(1)?,
                row.get::<_, String>(2)?,
            ))
        })
        .map_err(|e| AppError::Index(format!("Failed to query fragments: {}", e)))?;

    let mut results = Vec::new();
    for row in rows {
        let (text, embedding_bytes, metadata_json) =
            row.map_err(|e| AppError::Index(format!("Failed to read fragment: {}", e)))?;

        let embedding = bytes_to_embedding(&embedding_bytes)?;
        let metadata = serde_json::from_str(&metadata_json)
            .map_err(|e| AppError::Index(format!("Invalid fragment metadata: {}", e)))?;

        results.push(ScoredFragment::new(
            DocumentFragment { text, metadata },
            cosine_similarity(query, &embedding),
        ));
    }

    results.sort_by(ScoredFragment::best_first);
    results.truncate(top_k);

    tracing::debug!(
        "Retrieved {} fragments (requested top-{})",
        results.len(),
        top_k
    );

    Ok(results)
}

#[async_trait::async_trait]
impl VectorIndex for SqliteIndex {
    fn backend_name(&self) -> &str {
        "sqlite"
    }

    async fn query(&self, vector: &[f32], top_k: usize) -> AppResult<Vec<ScoredFragment>> {
        let conn = Arc::clone(&self.conn);
        let query = vector.to_vec();

        tokio::task::spawn_blocking(move || {
            let conn = conn
                .lock()
                .map_err(|_| AppError::Index("SQLite connection lock poisoned".to_string()))?;
            query_fragments(&conn, &query, top_k)
        })
        .await
        .map_err(|e| AppError::Index(format!("SQLite query task failed: {}", e)))?
    }
}

fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn bytes_to_embedding(bytes: &[u8]) -> AppResult<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return Err(AppError::Index(
            "Invalid embedding bytes length".to_string(),
        ));
    }

    Ok(bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}

/// Cosine similarity; 0.0 for mismatched lengths or zero vectors.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}
