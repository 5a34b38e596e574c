//! PostgreSQL data access component.
//!
//! Translates the gateway operations into catalog reflection and data calls
//! against a single target database, with no intermediate caching. A
//! [`PgConnector`] is constructed per request and discarded after use; each
//! operation opens its own connection (no pooling).

use std::time::Duration;

use common::config::DatabaseConfig;
use common::errors::{AppError, AppResult};
use common::models::{TableContent, UpdateRecord};
use common::utils::SqlGuard;
use serde_json::Value;
use sqlx::postgres::{PgColumn, PgConnection, PgRow};
use sqlx::query_builder::Separated;
use sqlx::{
    Column, ConnectOptions, Connection, Executor, Postgres, QueryBuilder, Row, Statement, TypeInfo,
};

/// PostgreSQL SQLSTATE for "database does not exist".
const INVALID_CATALOG_NAME: &str = "3D000";

/// Data access component for one target database.
///
/// Connection parameters are immutable after construction.
pub struct PgConnector {
    config: DatabaseConfig,
    connect_timeout: Duration,
}

impl PgConnector {
    /// Creates a connector for the given database.
    pub fn new(config: DatabaseConfig, connect_timeout: Duration) -> Self {
        Self {
            config,
            connect_timeout,
        }
    }

    /// Opens a fresh connection to the target database.
    async fn connect(&self) -> AppResult<PgConnection> {
        let options = self.config.connect_options();
        let connected = tokio::time::timeout(self.connect_timeout, options.connect())
            .await
            .map_err(|_| {
                AppError::DatabaseConnection(format!(
                    "connect to {}:{} timed out after {}s",
                    self.config.host,
                    self.config.port,
                    self.connect_timeout.as_secs()
                ))
            })?;

        connected.map_err(|e| match &e {
            sqlx::Error::Database(db) if db.code().as_deref() == Some(INVALID_CATALOG_NAME) => {
                AppError::DatabaseMissing(self.config.database.clone())
            }
            _ => AppError::DatabaseConnection(e.to_string()),
        })
    }

    /// Returns all non-internal schema names visible to the connection.
    pub async fn list_schemas(&self) -> AppResult<Vec<String>> {
        let mut conn = self.connect().await?;

        let schemas = sqlx::query_scalar::<_, String>(
            "SELECT nspname FROM pg_catalog.pg_namespace
             WHERE nspname !~ '^pg_'
             ORDER BY nspname",
        )
        .fetch_all(&mut conn)
        .await
        .map_err(|e| AppError::DatabaseQuery(e.to_string()))?;

        tracing::debug!(database = %self.config.database, count = schemas.len(), "schemas listed");
        Ok(schemas)
    }

    /// Returns table names within `schema`, in catalog order.
    ///
    /// A schema that does not exist yields an empty list, per reflection
    /// semantics.
    pub async fn list_tables(&self, schema: &str) -> AppResult<Vec<String>> {
        let mut conn = self.connect().await?;

        let tables = sqlx::query_scalar::<_, String>(
            "SELECT c.relname FROM pg_catalog.pg_class c
             JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
             WHERE n.nspname = $1 AND c.relkind IN ('r', 'p')",
        )
        .bind(schema)
        .fetch_all(&mut conn)
        .await
        .map_err(|e| AppError::DatabaseQuery(e.to_string()))?;

        tracing::debug!(schema = %schema, count = tables.len(), "tables listed");
        Ok(tables)
    }

    /// Reads the full contents of `schema.table`.
    ///
    /// Columns come back in table-declaration order; rows in whatever order
    /// the database returns them (no ORDER BY, so order is not guaranteed
    /// across calls).
    pub async fn read_table(&self, schema: &str, table: &str) -> AppResult<TableContent> {
        let mut conn = self.connect().await?;
        let columns = self.table_columns(&mut conn, schema, table).await?;

        let column_list = columns
            .iter()
            .map(|c| quote_ident(c))
            .collect::<Vec<_>>()
            .join(", ");
        let select = format!(
            "SELECT {} FROM {}.{}",
            column_list,
            quote_ident(schema),
            quote_ident(table)
        );

        let rows = sqlx::query(&select)
            .fetch_all(&mut conn)
            .await
            .map_err(|e| AppError::DatabaseQuery(e.to_string()))?;

        tracing::debug!(schema = %schema, table = %table, rows = rows.len(), "table read");
        Ok(TableContent {
            column_header: columns,
            table_content: rows.iter().map(row_values).collect(),
        })
    }

    /// Applies a batch of filtered updates to `schema.table` within one
    /// transaction.
    ///
    /// Every filter and content key of every record is checked against the
    /// reflected column set before anything executes, so an unknown column
    /// leaves the table untouched.
    pub async fn update_table(
        &self,
        schema: &str,
        table: &str,
        records: &[UpdateRecord],
    ) -> AppResult<()> {
        let mut conn = self.connect().await?;
        let columns = self.table_columns(&mut conn, schema, table).await?;

        for record in records {
            for key in record.filter.keys().chain(record.content.keys()) {
                if !columns.iter().any(|c| c == key) {
                    return Err(AppError::UnknownColumn(format!(
                        "{} is not a column of {}.{}",
                        key,
                        quote_ident(schema),
                        quote_ident(table)
                    )));
                }
            }
        }

        let mut tx = conn
            .begin()
            .await
            .map_err(|e| AppError::DatabaseQuery(e.to_string()))?;

        for record in records {
            let mut statement = build_update(schema, table, record)?;
            statement
                .build()
                .execute(&mut *tx)
                .await
                .map_err(|e| AppError::DatabaseQuery(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| AppError::DatabaseQuery(e.to_string()))?;

        tracing::info!(schema = %schema, table = %table, records = records.len(), "update batch committed");
        Ok(())
    }

    /// Executes one raw read-only statement.
    ///
    /// The statement is run through [`SqlGuard`] first: everything after the
    /// first `;` is discarded and the remainder must be a SELECT. Column
    /// headers come from statement preparation, so an empty result still
    /// carries them.
    pub async fn execute_read_only(&self, sql: &str) -> AppResult<TableContent> {
        let statement = SqlGuard::read_only_statement(sql)?;
        let mut conn = self.connect().await?;

        let prepared = conn
            .prepare(statement)
            .await
            .map_err(|e| AppError::DatabaseQuery(e.to_string()))?;
        let column_header: Vec<String> = prepared
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect();

        let rows = prepared
            .query()
            .fetch_all(&mut conn)
            .await
            .map_err(|e| AppError::DatabaseQuery(e.to_string()))?;

        tracing::debug!(rows = rows.len(), "raw query executed");
        Ok(TableContent {
            column_header,
            table_content: rows.iter().map(row_values).collect(),
        })
    }

    /// Reflects the column names of `schema.table` in declaration order.
    async fn table_columns(
        &self,
        conn: &mut PgConnection,
        schema: &str,
        table: &str,
    ) -> AppResult<Vec<String>> {
        let columns = sqlx::query_scalar::<_, String>(
            "SELECT column_name FROM information_schema.columns
             WHERE table_schema = $1 AND table_name = $2
             ORDER BY ordinal_position",
        )
        .bind(schema)
        .bind(table)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| AppError::DatabaseQuery(e.to_string()))?;

        if columns.is_empty() {
            return Err(AppError::DatabaseQuery(format!(
                "table {}.{} does not exist",
                quote_ident(schema),
                quote_ident(table)
            )));
        }
        Ok(columns)
    }
}

/// Builds one parameterized UPDATE statement for a record.
///
/// Filter pairs are matched with logical AND; a NULL filter value compiles
/// to `IS NULL`; an empty filter matches every row.
fn build_update(
    schema: &str,
    table: &str,
    record: &UpdateRecord,
) -> AppResult<QueryBuilder<'static, Postgres>> {
    if record.content.is_empty() {
        return Err(AppError::Validation(
            "update record has no content assignments".to_string(),
        ));
    }

    let mut builder = QueryBuilder::<Postgres>::new("UPDATE ");
    builder
        .push(quote_ident(schema))
        .push(".")
        .push(quote_ident(table))
        .push(" SET ");

    let mut assignments = builder.separated(", ");
    for (column, value) in &record.content {
        assignments.push(format!("{} = ", quote_ident(column)));
        push_bind_value(&mut assignments, value);
    }

    if !record.filter.is_empty() {
        builder.push(" WHERE ");
        let mut conditions = builder.separated(" AND ");
        for (column, value) in &record.filter {
            if value.is_null() {
                conditions.push(format!("{} IS NULL", quote_ident(column)));
            } else {
                conditions.push(format!("{} = ", quote_ident(column)));
                push_bind_value(&mut conditions, value);
            }
        }
    }

    Ok(builder)
}

/// Binds a JSON value as a typed parameter, without a leading separator.
fn push_bind_value<Sep: std::fmt::Display>(
    separated: &mut Separated<'_, '_, Postgres, Sep>,
    value: &Value,
) {
    match value {
        Value::Null => {
            separated.push_unseparated("NULL");
        }
        Value::Bool(b) => {
            separated.push_bind_unseparated(*b);
        }
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                separated.push_bind_unseparated(i);
            } else {
                separated.push_bind_unseparated(n.as_f64().unwrap_or(0.0));
            }
        }
        Value::String(s) => {
            separated.push_bind_unseparated(s.clone());
        }
        other => {
            separated.push_bind_unseparated(other.to_string());
        }
    }
}

/// Quotes an identifier for safe interpolation into statement text.
fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Decodes every column of a row into JSON values.
fn row_values(row: &PgRow) -> Vec<Value> {
    row.columns()
        .iter()
        .map(|column| decode_value(row, column))
        .collect()
}

/// Decodes one column by its declared type, preserving NULL.
///
/// Types without a direct mapping fall back to text, then to NULL.
fn decode_value(row: &PgRow, column: &PgColumn) -> Value {
    let idx = column.ordinal();
    let decoded = match column.type_info().name() {
        "BOOL" => row
            .try_get::<Option<bool>, _>(idx)
            .map(|v| v.map(Value::from).unwrap_or(Value::Null)),
        "INT2" => row
            .try_get::<Option<i16>, _>(idx)
            .map(|v| v.map(|i| Value::from(i64::from(i))).unwrap_or(Value::Null)),
        "INT4" => row
            .try_get::<Option<i32>, _>(idx)
            .map(|v| v.map(|i| Value::from(i64::from(i))).unwrap_or(Value::Null)),
        "INT8" => row
            .try_get::<Option<i64>, _>(idx)
            .map(|v| v.map(Value::from).unwrap_or(Value::Null)),
        "FLOAT4" => row
            .try_get::<Option<f32>, _>(idx)
            .map(|v| v.map(|f| Value::from(f64::from(f))).unwrap_or(Value::Null)),
        "FLOAT8" => row
            .try_get::<Option<f64>, _>(idx)
            .map(|v| v.map(Value::from).unwrap_or(Value::Null)),
        "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" => row
            .try_get::<Option<String>, _>(idx)
            .map(|v| v.map(Value::from).unwrap_or(Value::Null)),
        _ => row
            .try_get::<Option<String>, _>(idx)
            .map(|v| v.map(Value::from).unwrap_or(Value::Null)),
    };

    decoded.unwrap_or_else(|e| {
        tracing::warn!(column = column.name(), error = %e, "column decode failed, returning null");
        Value::Null
    })
}


/// Tests against a live PostgreSQL instance, configured through the `DB_*`
/// environment variables. Each test seeds and drops its own fixtures.
#[cfg(test)]
mod live_tests {
    use std::collections::BTreeMap;

    use serde_json::json;

    use super::*;

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn connector() -> PgConnector {
        PgConnector::new(DatabaseConfig::load(), TIMEOUT)
    }

    async fn seed(conn: &mut PgConnection, table: &str) {
        conn.execute(format!("DROP TABLE IF EXISTS public.{}", quote_ident(table)).as_str())
            .await
            .unwrap();
        conn.execute(
            format!(
                "CREATE TABLE public.{} (
                    id integer PRIMARY KEY,
                    item_description varchar NOT NULL,
                    predicted_item_label varchar NOT NULL,
                    reviewed_answer varchar
                )",
                quote_ident(table)
            )
            .as_str(),
        )
        .await
        .unwrap();
        conn.execute(
            format!(
                "INSERT INTO public.{} VALUES
                    (1, 'pizza', 'food', NULL),
                    (2, 'prosciutto di parma', 'food', NULL),
                    (3, 'prosecco', 'alcohol', NULL),
                    (4, 'Lamborghini', 'unknown', NULL),
                    (5, 'Ferrari', 'unknown', NULL)",
                quote_ident(table)
            )
            .as_str(),
        )
        .await
        .unwrap();
    }

    async fn drop_table(conn: &mut PgConnection, table: &str) {
        conn.execute(format!("DROP TABLE IF EXISTS public.{}", quote_ident(table)).as_str())
            .await
            .unwrap();
    }

    fn update(filter: serde_json::Value, content: serde_json::Value) -> UpdateRecord {
        UpdateRecord {
            filter: serde_json::from_value::<BTreeMap<String, serde_json::Value>>(filter).unwrap(),
            content: serde_json::from_value::<BTreeMap<String, serde_json::Value>>(content)
                .unwrap(),
        }
    }

    #[tokio::test]
    #[ignore = "requires a running PostgreSQL (set DB_* env vars)"]
    async fn live_list_schemas_includes_builtins() {
        let schemas = connector().list_schemas().await.unwrap();
        assert!(schemas.contains(&"public".to_string()));
        assert!(schemas.contains(&"information_schema".to_string()));
        assert!(!schemas.iter().any(|s| s.starts_with("pg_")));
    }

    #[tokio::test]
    #[ignore = "requires a running PostgreSQL (set DB_* env vars)"]
    async fn live_list_schemas_missing_database_fails() {
        let connector = PgConnector::new(
            DatabaseConfig::load().with_database("datagate_no_such_database"),
            TIMEOUT,
        );
        let err = connector.list_schemas().await.unwrap_err();
        assert!(matches!(err, AppError::DatabaseMissing(_)));
    }

    #[tokio::test]
    #[ignore = "requires a running PostgreSQL (set DB_* env vars)"]
    async fn live_list_tables_returns_seeded_set() {
        let connector = connector();
        let mut conn = connector.connect().await.unwrap();
        seed(&mut conn, "gw_tables_a").await;
        seed(&mut conn, "gw_tables_b").await;

        let tables = connector.list_tables("public").await.unwrap();
        assert!(tables.contains(&"gw_tables_a".to_string()));
        assert!(tables.contains(&"gw_tables_b".to_string()));

        let missing = connector.list_tables("gw_no_such_schema").await.unwrap();
        assert!(missing.is_empty());

        drop_table(&mut conn, "gw_tables_a").await;
        drop_table(&mut conn, "gw_tables_b").await;
    }

    #[tokio::test]
    #[ignore = "requires a running PostgreSQL (set DB_* env vars)"]
    async fn live_read_table_preserves_column_order_and_nulls() {
        let connector = connector();
        let mut conn = connector.connect().await.unwrap();
        seed(&mut conn, "gw_read").await;

        let content = connector.read_table("public", "gw_read").await.unwrap();
        assert_eq!(
            content.column_header,
            vec![
                "id",
                "item_description",
                "predicted_item_label",
                "reviewed_answer"
            ]
        );
        assert_eq!(content.table_content.len(), 5);
        assert!(content
            .table_content
            .contains(&vec![json!(1), json!("pizza"), json!("food"), Value::Null]));

        drop_table(&mut conn, "gw_read").await;
    }

    #[tokio::test]
    #[ignore = "requires a running PostgreSQL (set DB_* env vars)"]
    async fn live_update_touches_only_matched_rows() {
        let connector = connector();
        let mut conn = connector.connect().await.unwrap();
        seed(&mut conn, "gw_update").await;

        connector
            .update_table(
                "public",
                "gw_update",
                &[
                    update(json!({"id": 3}), json!({"reviewed_answer": "new_content"})),
                    update(json!({"id": 4}), json!({"reviewed_answer": "new_content_2"})),
                ],
            )
            .await
            .unwrap();

        let content = connector.read_table("public", "gw_update").await.unwrap();
        let answer_of = |id: i64| {
            content
                .table_content
                .iter()
                .find(|row| row[0] == json!(id))
                .map(|row| row[3].clone())
                .unwrap()
        };
        assert_eq!(answer_of(3), json!("new_content"));
        assert_eq!(answer_of(4), json!("new_content_2"));
        assert_eq!(answer_of(1), Value::Null);
        // unspecified columns untouched
        assert_eq!(
            content
                .table_content
                .iter()
                .find(|row| row[0] == json!(3))
                .map(|row| row[1].clone())
                .unwrap(),
            json!("prosecco")
        );

        drop_table(&mut conn, "gw_update").await;
    }

    #[tokio::test]
    #[ignore = "requires a running PostgreSQL (set DB_* env vars)"]
    async fn live_update_unknown_column_leaves_table_unchanged() {
        let connector = connector();
        let mut conn = connector.connect().await.unwrap();
        seed(&mut conn, "gw_update_bad").await;

        let err = connector
            .update_table(
                "public",
                "gw_update_bad",
                &[
                    update(json!({"id": 1}), json!({"reviewed_answer": "applied"})),
                    update(json!({"no_such_column": 2}), json!({"reviewed_answer": "x"})),
                ],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UnknownColumn(_)));

        let content = connector
            .read_table("public", "gw_update_bad")
            .await
            .unwrap();
        assert!(content
            .table_content
            .iter()
            .all(|row| row[3] == Value::Null));

        drop_table(&mut conn, "gw_update_bad").await;
    }

    #[tokio::test]
    #[ignore = "requires a running PostgreSQL (set DB_* env vars)"]
    async fn live_select_executes_only_first_statement() {
        let connector = connector();
        let mut conn = connector.connect().await.unwrap();
        seed(&mut conn, "gw_select").await;

        let content = connector
            .execute_read_only("SELECT id, item_description FROM public.gw_select; DROP TABLE public.gw_select")
            .await
            .unwrap();
        assert_eq!(content.column_header, vec!["id", "item_description"]);
        assert_eq!(content.table_content.len(), 5);

        // the trailing DROP was discarded, not executed
        let tables = connector.list_tables("public").await.unwrap();
        assert!(tables.contains(&"gw_select".to_string()));

        drop_table(&mut conn, "gw_select").await;
    }

    #[tokio::test]
    #[ignore = "requires a running PostgreSQL (set DB_* env vars)"]
    async fn live_select_headers_survive_empty_results() {
        let content = connector()
            .execute_read_only("select 1 as one where false")
            .await
            .unwrap();
        assert_eq!(content.column_header, vec!["one"]);
        assert!(content.table_content.is_empty());
    }
}
