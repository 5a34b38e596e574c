//! Raw query models.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Request body for executing a raw read-only query.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SelectRequest {
    /// SQL statement to execute. Only SELECT statements are accepted.
    #[validate(length(min = 1, message = "SQL statement is required"))]
    pub sql_string: String,
}

/// Contents of a table or query result.
///
/// `column_header` preserves the column order of the underlying table or
/// statement; each row in `table_content` is a tuple in the same order.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TableContent {
    /// Column names in declaration order.
    pub column_header: Vec<String>,
    /// Row tuples in database-returned order.
    pub table_content: Vec<Vec<serde_json::Value>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_content_serializes_nulls() {
        let content = TableContent {
            column_header: vec!["id".to_string(), "reviewed_answer".to_string()],
            table_content: vec![vec![serde_json::json!(1), serde_json::Value::Null]],
        };

        let value = serde_json::to_value(&content).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "column_header": ["id", "reviewed_answer"],
                "table_content": [[1, null]]
            })
        );
    }
}
