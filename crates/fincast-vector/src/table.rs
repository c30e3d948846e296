//! LanceDB connection and housekeeping helpers.
//!
//! Provides the database open function, a table existence check, and the
//! key/value `meta` table that records how an index was built.

use anyhow::{anyhow, Result};
use arrow_array::{RecordBatch, RecordBatchIterator, StringArray, TimestampMillisecondArray};
use chrono::Utc;
use futures::TryStreamExt;
use lancedb::query::ExecutableQuery;
use lancedb::{connect, Connection};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use crate::schema::{build_meta_schema, META_TABLE};

pub async fn open_db(path: &Path) -> Result<Connection> {
    Ok(connect(path.to_string_lossy().as_ref()).execute().await?)
}

pub async fn table_exists(conn: &Connection, name: &str) -> Result<bool> {
    let names = conn.table_names().execute().await?;
    Ok(names.iter().any(|n| n == name))
}

/// Build parameters stored next to the chunks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexManifest {
    pub embedder_id: String,
    pub dim: usize,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub built_at: String,
}

impl IndexManifest {
    fn to_entries(&self) -> Vec<(&'static str, String)> {
        vec![
            ("embedder_id", self.embedder_id.clone()),
            ("dim", self.dim.to_string()),
            ("chunk_size", self.chunk_size.to_string()),
            ("chunk_overlap", self.chunk_overlap.to_string()),
            ("built_at", self.built_at.clone()),
        ]
    }

    fn from_entries(entries: &BTreeMap<String, String>) -> Result<Self> {
        let get = |k: &str| entries.get(k).cloned().ok_or_else(|| anyhow!("manifest is missing '{}'", k));
        Ok(Self {
            embedder_id: get("embedder_id")?,
            dim: get("dim")?.parse()?,
            chunk_size: get("chunk_size")?.parse()?,
            chunk_overlap: get("chunk_overlap")?.parse()?,
            built_at: get("built_at")?,
        })
    }
}

/// Writes the manifest into a fresh `meta` table; fails if one already exists.
pub async fn write_manifest(conn: &Connection, manifest: &IndexManifest) -> Result<()> {
    let entries = manifest.to_entries();
    let now = Utc::now().timestamp_millis();
    let rb = RecordBatch::try_new(
        build_meta_schema(),
        vec![
            Arc::new(StringArray::from(entries.iter().map(|(k, _)| k.to_string()).collect::<Vec<_>>())),
            Arc::new(StringArray::from(entries.iter().map(|(_, v)| v.clone()).collect::<Vec<_>>())),
            Arc::new(TimestampMillisecondArray::from(vec![now; entries.len()])),
        ],
    )?;
    let reader = Box::new(RecordBatchIterator::new(vec![Ok(rb)].into_iter(), build_meta_schema()));
    conn.create_table(META_TABLE, reader).execute().await?;
    Ok(())
}

/// Reads the manifest; `None` when the meta table is absent.
pub async fn read_manifest(conn: &Connection) -> Result<Option<IndexManifest>> {
    if !table_exists(conn, META_TABLE).await? {
        return Ok(None);
    }
    let t = conn.open_table(META_TABLE).execute().await?;
    let batches: Vec<RecordBatch> = t.query().execute().await?.try_collect().await?;
    let mut entries = BTreeMap::new();
    for batch in &batches {
        let keys = batch.column_by_name("key").and_then(|c| c.as_any().downcast_ref::<StringArray>()).ok_or_else(|| anyhow!("meta.key column missing"))?;
        let values = batch.column_by_name("value").and_then(|c| c.as_any().downcast_ref::<StringArray>()).ok_or_else(|| anyhow!("meta.value column missing"))?;
        for i in 0..batch.num_rows() {
            entries.insert(keys.value(i).to_string(), values.value(i).to_string());
        }
    }
    IndexManifest::from_entries(&entries).map(Some)
}
