//! Schema, table and update models.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Request body for listing schemas.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SchemasRequest {
    /// Database to inspect; defaults to the configured one.
    pub database: Option<String>,
}

/// Schema listing response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SchemasResult {
    /// Schema names visible to the connection.
    pub schemas: Vec<String>,
}

/// Request body for listing tables in a schema.
#[derive(Debug, Deserialize, ToSchema)]
pub struct TablesRequest {
    /// Schema to inspect; defaults to `public`.
    pub schema_name: Option<String>,
}

/// Table listing response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TablesResult {
    /// Table names within the schema.
    pub tables: Vec<String>,
}

/// Request body for reading a table's full contents.
#[derive(Debug, Deserialize, ToSchema)]
pub struct TableContentRequest {
    /// Schema holding the table; defaults to `public`.
    pub target_schema: Option<String>,
    /// Table to read.
    pub target_table: Option<String>,
}

/// One update instruction: which rows to match, and what to set on them.
///
/// Every key in `filter` and `content` must name an existing column of the
/// target table. Maps are ordered so the generated statement text is
/// deterministic.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateRecord {
    /// Column/value pairs matched with logical AND.
    pub filter: BTreeMap<String, serde_json::Value>,
    /// Column/value assignments applied to matched rows.
    pub content: BTreeMap<String, serde_json::Value>,
}

/// Request body for applying a batch of filtered updates.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateTableRequest {
    /// Schema holding the table; defaults to `public`.
    pub target_schema: Option<String>,
    /// Table to update.
    pub target_table: Option<String>,
    /// Update records, applied in order within one transaction.
    pub payload: Vec<UpdateRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_record_deserializes_filter_and_content() {
        let record: UpdateRecord = serde_json::from_value(serde_json::json!({
            "filter": {"id": 3},
            "content": {"reviewed_answer": "new_content"}
        }))
        .unwrap();

        assert_eq!(record.filter["id"], serde_json::json!(3));
        assert_eq!(
            record.content["reviewed_answer"],
            serde_json::json!("new_content")
        );
    }
}
