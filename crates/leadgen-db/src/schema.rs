//! Destination schema discovery.
//!
//! The destination table's column set is read from catalog metadata once
//! per process and cached. The cache is explicitly owned by whoever
//! constructs it and tolerates staleness: a live schema change is picked up
//! only after `invalidate` or a restart.

use sqlx::PgPool;
use tokio::sync::RwLock;
use std::sync::Arc;

use crate::{DbError, DbResult};

/// Column names tried first when picking the raw-payload column.
pub const PAYLOAD_COLUMN_NAMES: &[&str] = &["payload", "raw_payload", "payload_json"];

#[derive(Debug, Clone)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
}

/// Discovered column layout of the destination table.
#[derive(Debug, Clone)]
pub struct TableSchema {
    pub table: String,
    pub columns: Vec<ColumnInfo>,
}

impl TableSchema {
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    pub fn column_type(&self, name: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.data_type.as_str())
    }

    /// The column that holds the verbatim payload: a preferred name when
    /// present, else the first JSON-capable column.
    pub fn payload_column(&self) -> Option<&str> {
        for preferred in PAYLOAD_COLUMN_NAMES {
            if let Some(col) = self.columns.iter().find(|c| c.name == *preferred) {
                return Some(col.name.as_str());
            }
        }
        self.columns
            .iter()
            .find(|c| matches!(c.data_type.as_str(), "jsonb" | "json"))
            .map(|c| c.name.as_str())
    }
}

/// Lazily populated per-process cache of the destination schema.
pub struct SchemaCache {
    pool: PgPool,
    table: String,
    inner: RwLock<Option<Arc<TableSchema>>>,
}

impl SchemaCache {
    pub fn new(pool: PgPool, table: impl Into<String>) -> Self {
        Self {
            pool,
            table: table.into(),
            inner: RwLock::new(None),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// The cached schema, loading it from the catalog on first use.
    pub async fn get(&self) -> DbResult<Arc<TableSchema>> {
        if let Some(schema) = self.inner.read().await.clone() {
            return Ok(schema);
        }
        let schema = Arc::new(self.load().await?);
        *self.inner.write().await = Some(schema.clone());
        Ok(schema)
    }

    /// Drop the cached schema so the next write re-discovers it.
    pub async fn invalidate(&self) {
        *self.inner.write().await = None;
    }

    async fn load(&self) -> DbResult<TableSchema> {
        let (schema_name, table_name) = split_qualified(&self.table);
        let rows = sqlx::query_as::<_, (String, String)>(
            r#"
            SELECT column_name, data_type
            FROM information_schema.columns
            WHERE table_schema = $1 AND table_name = $2
            ORDER BY ordinal_position
            "#,
        )
        .bind(schema_name.unwrap_or("public"))
        .bind(table_name)
        .fetch_all(&self.pool)
        .await?;

        if rows.is_empty() {
            return Err(DbError::Schema(format!(
                "destination table {} not found",
                self.table
            )));
        }

        Ok(TableSchema {
            table: self.table.clone(),
            columns: rows
                .into_iter()
                .map(|(name, data_type)| ColumnInfo { name, data_type })
                .collect(),
        })
    }
}

#[cfg(test)]
impl SchemaCache {
    async fn seed(&self, schema: TableSchema) {
        *self.inner.write().await = Some(Arc::new(schema));
    }

    async fn cached(&self) -> Option<Arc<TableSchema>> {
        self.inner.read().await.clone()
    }
}

/// Split an optionally schema-qualified table name.
fn split_qualified(name: &str) -> (Option<&str>, &str) {
    match name.split_once('.') {
        Some((schema, table)) => (Some(schema), table),
        None => (None, name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema(columns: &[(&str, &str)]) -> TableSchema {
        TableSchema {
            table: "leads".to_string(),
            columns: columns
                .iter()
                .map(|(name, data_type)| ColumnInfo {
                    name: name.to_string(),
                    data_type: data_type.to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn preferred_payload_name_wins_over_json_type() {
        let s = schema(&[("extra", "jsonb"), ("raw_payload", "text")]);
        assert_eq!(s.payload_column(), Some("raw_payload"));
    }

    #[test]
    fn falls_back_to_first_json_capable_column() {
        let s = schema(&[("name", "text"), ("blob", "json"), ("other", "jsonb")]);
        assert_eq!(s.payload_column(), Some("blob"));
    }

    #[test]
    fn no_usable_column_yields_none() {
        let s = schema(&[("name", "text"), ("age", "integer")]);
        assert_eq!(s.payload_column(), None);
    }

    #[test]
    fn qualified_names_split() {
        assert_eq!(split_qualified("app.leads"), (Some("app"), "leads"));
        assert_eq!(split_qualified("leads"), (None, "leads"));
    }

    // A lazy pool never connects, so these only pass while the cache is
    // serving from memory.
    fn lazy_cache() -> SchemaCache {
        let pool = PgPool::connect_lazy("postgres://unused-in-tests/unused")
            .expect("lazy pool construction");
        SchemaCache::new(pool, "leads")
    }

    #[tokio::test]
    async fn cached_schema_is_served_without_touching_the_database() {
        let cache = lazy_cache();
        cache.seed(schema(&[("payload", "jsonb")])).await;

        let served = cache.get().await.unwrap();
        assert_eq!(served.payload_column(), Some("payload"));
    }

    #[tokio::test]
    async fn invalidate_clears_the_cached_schema() {
        let cache = lazy_cache();
        cache.seed(schema(&[("payload", "jsonb")])).await;
        assert!(cache.cached().await.is_some());

        cache.invalidate().await;
        assert!(cache.cached().await.is_none());

        // The next read would have to go back to the catalog, which the
        // lazy pool cannot reach.
        assert!(cache.get().await.is_err());
    }
}
