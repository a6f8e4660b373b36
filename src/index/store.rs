//! SQLite-backed vector store for embedded chunks.

use crate::domain::{Chunk, SearchHit};
use crate::utils::normalize_path;
use anyhow::{bail, Context, Result};
use rusqlite::{params, params_from_iter, Connection};
use std::cmp::Ordering;
use std::path::Path;

pub const SCHEMA_VERSION: i64 = 1;

/// Optional restrictions applied before similarity ranking.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilter {
    pub repo: Option<String>,
    pub branch: Option<String>,
    /// Path prefix, e.g. `src/components`.
    pub directory: Option<String>,
    pub language: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexStats {
    pub chunks: usize,
    pub files: usize,
    pub repos: Vec<String>,
}

pub struct VectorStore {
    conn: Connection,
}

impl VectorStore {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed creating index directory: {}", parent.display()))?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("Failed opening index database: {}", path.display()))?;
        Self::with_connection(conn)
    }

    pub fn in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        ensure_schema(&conn)?;
        Ok(Self { conn })
    }

    pub fn clear(&mut self) -> Result<()> {
        self.conn.execute("DELETE FROM chunks", [])?;
        Ok(())
    }

    /// Insert or replace `chunks` with their `embeddings` (same order).
    pub fn insert(
        &mut self,
        chunks: &[Chunk],
        embeddings: &[Vec<f32>],
        repo: &str,
        branch: &str,
    ) -> Result<usize> {
        if chunks.len() != embeddings.len() {
            bail!("{} chunks but {} embeddings", chunks.len(), embeddings.len());
        }

        let tx = self.conn.transaction()?;
        for (chunk, embedding) in chunks.iter().zip(embeddings) {
            tx.execute(
                "INSERT OR REPLACE INTO chunks(id, path, language, start_line, end_line, content, repo, branch, embedding)
                 VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    chunk.id,
                    chunk.path,
                    chunk.language,
                    chunk.start_line as i64,
                    chunk.end_line as i64,
                    chunk.content,
                    repo,
                    branch,
                    encode_embedding(embedding),
                ],
            )?;
        }
        tx.commit()?;
        Ok(chunks.len())
    }

    /// Top `limit` chunks by cosine similarity to `query`. Ties break by
    /// path, then start line.
    pub fn search(
        &self,
        query: &[f32],
        filter: &SearchFilter,
        limit: usize,
    ) -> Result<Vec<SearchHit>> {
        let mut sql = String::from(
            "SELECT path, content, start_line, end_line, language, embedding FROM chunks WHERE 1 = 1",
        );
        let mut values: Vec<String> = Vec::new();
        if let Some(repo) = &filter.repo {
            values.push(repo.clone());
            sql.push_str(&format!(" AND repo = ?{}", values.len()));
        }
        if let Some(branch) = &filter.branch {
            values.push(branch.clone());
            sql.push_str(&format!(" AND branch = ?{}", values.len()));
        }
        if let Some(directory) = filter.directory.as_deref().map(normalize_path) {
            let prefix = directory.trim_end_matches('/');
            if !prefix.is_empty() {
                values.push(format!("{prefix}/"));
                let n = values.len();
                sql.push_str(&format!(" AND substr(path, 1, length(?{n})) = ?{n}"));
            }
        }
        if let Some(language) = &filter.language {
            values.push(language.to_lowercase());
            sql.push_str(&format!(" AND language = ?{}", values.len()));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values.iter()), |row| {
            let blob: Vec<u8> = row.get(5)?;
            Ok((
                SearchHit {
                    path: row.get(0)?,
                    content: row.get(1)?,
                    start_line: row.get::<_, i64>(2)? as usize,
                    end_line: row.get::<_, i64>(3)? as usize,
                    language: row.get(4)?,
                    score: 0.0,
                },
                blob,
            ))
        })?;

        let mut hits = Vec::new();
        for row in rows {
            let (mut hit, blob) = row?;
            hit.score = cosine_similarity(query, &decode_embedding(&blob));
            hits.push(hit);
        }

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.path.cmp(&b.path))
                .then_with(|| a.start_line.cmp(&b.start_line))
        });
        hits.truncate(limit);
        Ok(hits)
    }

    pub fn stats(&self) -> Result<IndexStats> {
        let chunks: i64 = self.conn.query_row("SELECT COUNT(*) FROM chunks", [], |row| row.get(0))?;
        let files: i64 =
            self.conn.query_row("SELECT COUNT(DISTINCT path) FROM chunks", [], |row| row.get(0))?;
        let mut stmt = self.conn.prepare("SELECT DISTINCT repo FROM chunks ORDER BY repo")?;
        let repos =
            stmt.query_map([], |row| row.get(0))?.collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(IndexStats { chunks: chunks as usize, files: files as usize, repos })
    }
}

fn ensure_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS chunks (
            id TEXT PRIMARY KEY,
            path TEXT NOT NULL,
            language TEXT NOT NULL,
            start_line INTEGER NOT NULL,
            end_line INTEGER NOT NULL,
            content TEXT NOT NULL,
            repo TEXT NOT NULL,
            branch TEXT NOT NULL,
            embedding BLOB NOT NULL
        );

        CREATE INDEX IF NOT EXISTS chunks_repo_branch ON chunks(repo, branch);
        ",
    )?;

    let current: Option<i64> =
        conn.query_row("SELECT version FROM schema_version LIMIT 1", [], |row| row.get(0)).ok();
    match current {
        None => {
            conn.execute("INSERT INTO schema_version(version) VALUES(?1)", [SCHEMA_VERSION])?;
        }
        Some(version) if version == SCHEMA_VERSION => {}
        Some(version) => {
            bail!("Unsupported index schema version {version}; expected {}", SCHEMA_VERSION);
        }
    }
    Ok(())
}

fn encode_embedding(vector: &[f32]) -> Vec<u8> {
    vector.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn decode_embedding(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4).map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]])).collect()
}

/// Zero when either vector has no magnitude or the lengths differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let (mut dot, mut norm_a, mut norm_b) = (0.0f32, 0.0f32, 0.0f32);
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}
