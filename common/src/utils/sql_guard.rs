//! Raw SQL statement guard.
//!
//! Enforces the read-only policy for ad-hoc queries.

use crate::errors::AppError;

/// Guards raw SQL statements submitted for ad-hoc execution.
pub struct SqlGuard;

impl SqlGuard {
    /// Extracts the single statement allowed to run from a raw SQL string.
    ///
    /// Everything after the first statement separator (`;`) is discarded.
    /// The surviving statement must start with `select` (any letter case);
    /// anything else is rejected.
    ///
    /// This is a prefix check, not a parser. It does not catch semantically
    /// dangerous statements disguised as selects.
    ///
    /// # Errors
    /// Returns `AppError::ReadOnlyViolation` if the statement is not a SELECT.
    pub fn read_only_statement(sql: &str) -> Result<&str, AppError> {
        let statement = sql.split(';').next().unwrap_or_default().trim();
        if !statement.to_lowercase().starts_with("select") {
            return Err(AppError::ReadOnlyViolation(statement.to_string()));
        }
        Ok(statement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_is_allowed() {
        assert_eq!(
            SqlGuard::read_only_statement("select * from items").unwrap(),
            "select * from items"
        );
    }

    #[test]
    fn test_select_is_case_insensitive() {
        assert!(SqlGuard::read_only_statement("SeLeCt 1").is_ok());
    }

    #[test]
    fn test_leading_whitespace_is_trimmed() {
        assert_eq!(SqlGuard::read_only_statement("  SELECT 1  ").unwrap(), "SELECT 1");
    }

    #[test]
    fn test_drop_is_rejected() {
        assert!(SqlGuard::read_only_statement("drop table items").is_err());
    }

    #[test]
    fn test_trailing_statements_are_discarded() {
        assert_eq!(
            SqlGuard::read_only_statement("select 1; drop table items").unwrap(),
            "select 1"
        );
    }

    #[test]
    fn test_leading_non_select_is_rejected_even_with_select_after() {
        assert!(SqlGuard::read_only_statement("drop table items; select 1").is_err());
    }

    #[test]
    fn test_empty_statement_is_rejected() {
        assert!(SqlGuard::read_only_statement("").is_err());
        assert!(SqlGuard::read_only_statement(";select 1").is_err());
    }

    #[test]
    fn test_original_casing_is_preserved() {
        assert_eq!(
            SqlGuard::read_only_statement("SELECT 'Ferrari'").unwrap(),
            "SELECT 'Ferrari'"
        );
    }
}
