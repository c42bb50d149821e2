//! Schema-adaptive lead writer.
//!
//! Maps an intake payload onto whatever columns the destination table
//! actually has. The verbatim lead document always lands in one designated
//! payload column; semantic columns are a convenience projection, populated
//! only when a column of that exact name exists.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use leadgen_core::{IntakeMeta, to_canonical_string};
use serde_json::Value;
use sqlx::PgPool;

use crate::schema::{SchemaCache, TableSchema};
use crate::{DbError, DbResult};

/// Lead-document fields projected into same-named destination columns.
const SEMANTIC_FIELDS: &[&str] = &[
    "full_name",
    "company",
    "email",
    "phone",
    "contact_method",
    "category",
    "city",
    "state",
    "postal_code",
    "country",
];

/// A value bound into one insert slot.
#[derive(Debug, Clone, PartialEq)]
enum FieldValue {
    Text(String),
    Timestamp(DateTime<Utc>),
}

/// Destination for materialized leads.
#[async_trait]
pub trait LeadSink: Send + Sync {
    /// Insert one lead. Fails with a schema error when the destination
    /// table or a usable payload column is missing; absent semantic columns
    /// are skipped silently.
    async fn write(&self, meta: &IntakeMeta, lead: &Value) -> DbResult<()>;
}

/// Writes materialized leads into the destination table.
pub struct LeadWriter {
    pool: PgPool,
    cache: SchemaCache,
}

impl LeadWriter {
    pub fn new(pool: PgPool, cache: SchemaCache) -> Self {
        Self { pool, cache }
    }

    /// Invalidation hook for the destination schema cache.
    pub fn schema_cache(&self) -> &SchemaCache {
        &self.cache
    }

    async fn insert(&self, meta: &IntakeMeta, lead: &Value) -> DbResult<()> {
        let schema = self.cache.get().await?;
        let payload_column = schema.payload_column().ok_or_else(|| {
            DbError::Schema(format!(
                "no payload column in destination table {}",
                schema.table
            ))
        })?;
        let payload_cast = match schema.column_type(payload_column) {
            Some("jsonb") => "::jsonb",
            Some("json") => "::json",
            _ => "",
        };

        let columns = project(&schema, semantic_columns(meta, lead));
        let mut names: Vec<&str> = columns.iter().map(|(name, _)| *name).collect();
        names.push(payload_column);
        let sql = insert_sql(&schema.table, &names, payload_cast);

        let mut query = sqlx::query(&sql);
        for (_, value) in columns {
            query = match value {
                FieldValue::Text(s) => query.bind(s),
                FieldValue::Timestamp(t) => query.bind(t),
            };
        }
        query = query.bind(to_canonical_string(lead));
        query.execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl LeadSink for LeadWriter {
    async fn write(&self, meta: &IntakeMeta, lead: &Value) -> DbResult<()> {
        self.insert(meta, lead).await
    }
}

/// Candidate (column, value) pairs for one record: the intake identifiers
/// plus whichever semantic fields the lead document carries as strings.
fn semantic_columns(meta: &IntakeMeta, lead: &Value) -> Vec<(&'static str, FieldValue)> {
    let mut columns = vec![
        ("intake_id", FieldValue::Text(meta.intake_id.to_string())),
        ("request_id", FieldValue::Text(meta.request_id.clone())),
        ("received_at_utc", FieldValue::Timestamp(meta.received_at_utc)),
        ("lead_source", FieldValue::Text(meta.lead_source.clone())),
    ];
    for field in SEMANTIC_FIELDS.iter().copied() {
        if let Some(text) = lead.get(field).and_then(Value::as_str) {
            columns.push((field, FieldValue::Text(text.to_string())));
        }
    }
    columns
}

/// Keep only candidates whose column exists in the discovered schema.
fn project(
    schema: &TableSchema,
    candidates: Vec<(&'static str, FieldValue)>,
) -> Vec<(&'static str, FieldValue)> {
    candidates
        .into_iter()
        .filter(|(name, _)| schema.has_column(name))
        .collect()
}

/// Build the insert statement. Column names come from catalog metadata or
/// compile-time constants, never from field values; every value is a bind
/// parameter. The last column is the payload slot and gets `payload_cast`.
fn insert_sql(table: &str, columns: &[&str], payload_cast: &str) -> String {
    let column_list = columns
        .iter()
        .map(|name| quote_ident(name))
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = (1..=columns.len())
        .map(|i| {
            if i == columns.len() {
                format!("${i}{payload_cast}")
            } else {
                format!("${i}")
            }
        })
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_table(table),
        column_list,
        placeholders
    )
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Quote each part of an optionally schema-qualified table name.
fn quote_table(name: &str) -> String {
    name.split('.')
        .map(quote_ident)
        .collect::<Vec<_>>()
        .join(".")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ColumnInfo;
    use serde_json::json;

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

    fn meta() -> IntakeMeta {
        IntakeMeta::stamp(Some("req-42".to_string()), "web")
    }

    #[test]
    fn projection_skips_absent_columns() {
        let narrow = schema(&[("payload", "jsonb")]);
        let lead = json!({"email": "ada@example.com", "city": "Oslo"});
        let columns = project(&narrow, semantic_columns(&meta(), &lead));
        assert!(columns.is_empty());
    }

    #[test]
    fn projection_populates_present_columns() {
        let wide = schema(&[
            ("intake_id", "text"),
            ("email", "text"),
            ("city", "text"),
            ("payload", "jsonb"),
        ]);
        let lead = json!({"email": "ada@example.com", "city": "Oslo", "phone": "555"});
        let columns = project(&wide, semantic_columns(&meta(), &lead));
        let names: Vec<&str> = columns.iter().map(|(n, _)| *n).collect();
        assert_eq!(names, vec!["intake_id", "email", "city"]);
    }

    #[test]
    fn non_string_lead_fields_are_not_projected() {
        let wide = schema(&[("phone", "text"), ("payload", "jsonb")]);
        let lead = json!({"phone": 5551234});
        let columns = project(&wide, semantic_columns(&meta(), &lead));
        assert!(columns.is_empty());
    }

    #[test]
    fn insert_statement_quotes_columns_and_binds_values() {
        let sql = insert_sql("leads", &["email", "payload"], "::jsonb");
        assert_eq!(
            sql,
            "INSERT INTO \"leads\" (\"email\", \"payload\") VALUES ($1, $2::jsonb)"
        );
    }

    #[test]
    fn insert_statement_handles_qualified_tables() {
        let sql = insert_sql("app.leads", &["payload"], "::jsonb");
        assert_eq!(sql, "INSERT INTO \"app\".\"leads\" (\"payload\") VALUES ($1::jsonb)");
    }

    #[test]
    fn quoting_escapes_embedded_quotes() {
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }
}
