//! Append-only vector table persisted under `<db_path>/<table_name>/`.
//!
//! `schema.json` holds the dimensionality fixed at first write; `rows.jsonl` holds one
//! [`TableRow`] per line. Writers to the same table must be serialized by the caller.

use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;

use sha2::{Digest, Sha256};
use study_core::error::{codes, AppError};
use tracing::info;

use super::model::{Chunk, SearchHit, StoreReport, TableRow, TableSchema};
use super::similarity;

#[derive(Debug, Clone)]
pub struct VectorTable {
    db_path: PathBuf,
    table_name: String,
}

fn store_err(message: &str, details: String) -> AppError {
    AppError::new(codes::INDEX_STORE_FAILED, message).with_details(details)
}

fn mismatch(message: &str, details: String) -> AppError {
    AppError::new(codes::INDEX_DIMENSION_MISMATCH, message).with_details(details)
}

impl VectorTable {
    pub fn open(db_path: PathBuf, table_name: &str) -> Result<Self, AppError> {
        let valid = !table_name.is_empty()
            && table_name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
            && !table_name.starts_with('.');
        if !valid {
            return Err(AppError::config("Table name must be [A-Za-z0-9_.-] and not start with '.'")
                .with_details(format!("table_name={table_name}")));
        }
        Ok(Self {
            db_path,
            table_name: table_name.to_string(),
        })
    }

    pub fn name(&self) -> &str {
        &self.table_name
    }

    fn table_dir(&self) -> PathBuf {
        self.db_path.join(&self.table_name)
    }

    fn schema_path(&self) -> PathBuf {
        self.table_dir().join("schema.json")
    }

    fn rows_path(&self) -> PathBuf {
        self.table_dir().join("rows.jsonl")
    }

    pub fn exists(&self) -> bool {
        self.schema_path().exists()
    }

    pub fn schema(&self) -> Result<Option<TableSchema>, AppError> {
        let path = self.schema_path();
        if !path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(&path).map_err(|e| {
            store_err("Failed to read table schema", format!("path={}; err={}", path.display(), e))
        })?;
        serde_json::from_slice(&bytes).map(Some).map_err(|e| {
            store_err("Failed to decode table schema", format!("path={}; err={}", path.display(), e))
        })
    }

    fn write_schema(&self, schema: &TableSchema) -> Result<(), AppError> {
        let path = self.schema_path();
        let tmp = path.with_extension("tmp");
        let json = serde_json::to_string_pretty(schema)
            .map_err(|e| store_err("Failed to encode table schema", e.to_string()))?;
        fs::write(&tmp, json.as_bytes()).map_err(|e| {
            store_err("Failed to write table schema", format!("path={}; err={}", tmp.display(), e))
        })?;
        fs::rename(&tmp, &path).map_err(|e| {
            store_err(
                "Failed to finalize table schema write",
                format!("tmp={}; dest={}; err={}", tmp.display(), path.display(), e),
            )
        })
    }

    /// Append chunks and their embeddings. The first write creates the table and fixes its
    /// dimensionality; later writes with a different width fail without touching the table.
    pub fn store(&self, chunks: &[Chunk], embeddings: &[Vec<f32>]) -> Result<StoreReport, AppError> {
        if chunks.len() != embeddings.len() {
            return Err(mismatch(
                "Chunk and embedding counts differ",
                format!("chunks={}; embeddings={}", chunks.len(), embeddings.len()),
            ));
        }
        let existing = self.schema()?;
        if chunks.is_empty() {
            return Ok(StoreReport {
                table_name: self.table_name.clone(),
                rows_written: 0,
                created: false,
                dims: existing.map(|s| s.dims),
            });
        }

        let dims = embeddings[0].len();
        if dims == 0 {
            return Err(mismatch("Embedding vectors must not be empty", "dims=0".to_string()));
        }
        if let Some((i, v)) = embeddings.iter().enumerate().find(|(_, v)| v.len() != dims) {
            return Err(mismatch(
                "Embedding dimension mismatch within batch",
                format!("expected={dims}; got={}; position={i}", v.len()),
            ));
        }
        let dims = dims as u32;
        if let Some(schema) = existing.as_ref() {
            if schema.dims != dims {
                return Err(mismatch(
                    "Embedding dimension does not match table schema",
                    format!("table={}; table_dims={}; got={}", self.table_name, schema.dims, dims),
                ));
            }
        }

        let created = existing.is_none();
        let mut schema = existing.unwrap_or_else(|| TableSchema {
            table_name: self.table_name.clone(),
            dims,
            row_count: 0,
            next_row_id: 0,
        });

        let dir = self.table_dir();
        fs::create_dir_all(&dir).map_err(|e| {
            store_err("Failed to create table directory", format!("path={}; err={}", dir.display(), e))
        })?;

        let rows_path = self.rows_path();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&rows_path)
            .map_err(|e| {
                store_err("Failed to open table rows", format!("path={}; err={}", rows_path.display(), e))
            })?;
        let mut w = BufWriter::new(file);
        for (offset, (chunk, vector)) in chunks.iter().zip(embeddings.iter()).enumerate() {
            let row = TableRow {
                row_id: schema.next_row_id + offset as u64,
                text: chunk.text.clone(),
                vector: vector.clone(),
                source: chunk.source.clone(),
                chunk_index: chunk.index,
                text_sha256: hex::encode(Sha256::digest(chunk.text.as_bytes())),
            };
            let line = serde_json::to_string(&row)
                .map_err(|e| store_err("Failed to encode table row", e.to_string()))?;
            writeln!(w, "{line}").map_err(|e| {
                store_err("Failed to append table row", format!("path={}; err={}", rows_path.display(), e))
            })?;
        }
        w.flush().map_err(|e| {
            store_err("Failed to flush table rows", format!("path={}; err={}", rows_path.display(), e))
        })?;

        let written = chunks.len() as u64;
        schema.row_count += written;
        schema.next_row_id += written;
        self.write_schema(&schema)?;

        if created {
            info!(table = %self.table_name, dims, rows = written, "created vector table");
        } else {
            info!(table = %self.table_name, rows = written, total = schema.row_count, "appended to vector table");
        }

        Ok(StoreReport {
            table_name: self.table_name.clone(),
            rows_written: written,
            created,
            dims: Some(dims),
        })
    }

    pub fn rows(&self) -> Result<Vec<TableRow>, AppError> {
        let path = self.rows_path();
        if !path.exists() {
            return Ok(Vec::new());
        }
        let file = fs::File::open(&path).map_err(|e| {
            store_err("Failed to open table rows", format!("path={}; err={}", path.display(), e))
        })?;
        let mut out = Vec::new();
        for (lineno, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| {
                store_err("Failed to read table rows", format!("path={}; err={}", path.display(), e))
            })?;
            if line.trim().is_empty() {
                continue;
            }
            let row: TableRow = serde_json::from_str(&line).map_err(|e| {
                store_err(
                    "Failed to decode table row",
                    format!("path={}; line={}; err={}", path.display(), lineno + 1, e),
                )
            })?;
            out.push(row);
        }
        Ok(out)
    }

    /// Up to `k` rows nearest to `query` by cosine distance, closest first.
    /// Ties are broken by row id; zero-norm rows are never returned.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>, AppError> {
        let schema = self.schema()?.ok_or_else(|| {
            AppError::new(codes::INDEX_TABLE_NOT_FOUND, "Vector table does not exist")
                .with_details(format!(
                    "db_path={}; table={}",
                    self.db_path.display(),
                    self.table_name
                ))
        })?;
        if query.len() as u32 != schema.dims {
            return Err(mismatch(
                "Query embedding dims do not match table dims",
                format!("table_dims={}; query_dims={}", schema.dims, query.len()),
            ));
        }
        if k == 0 {
            return Ok(Vec::new());
        }
        let qnorm = similarity::l2_norm(query);
        if qnorm == 0.0 {
            return Err(AppError::new(
                codes::AI_RETRIEVAL_FAILED,
                "Query embedding norm is zero",
            ));
        }

        let mut scored: Vec<(f32, TableRow)> = Vec::new();
        for row in self.rows()? {
            if row.vector.len() as u32 != schema.dims {
                return Err(mismatch(
                    "Stored vector dims mismatch",
                    format!("row_id={}; expected={}; got={}", row.row_id, schema.dims, row.vector.len()),
                ));
            }
            let vnorm = similarity::l2_norm(&row.vector);
            if vnorm == 0.0 {
                continue;
            }
            let d = similarity::cosine_distance(query, &row.vector, qnorm, vnorm);
            scored.push((d, row));
        }

        scored.sort_by(|a, b| {
            a.0.partial_cmp(&b.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.1.row_id.cmp(&b.1.row_id))
        });
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(distance, row)| SearchHit {
                row_id: row.row_id,
                chunk: row.to_chunk(),
                distance,
            })
            .collect())
    }
}
