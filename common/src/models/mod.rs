//! Shared request and response models.

pub mod greeting;
pub mod query;
pub mod table;

// Re-export commonly used types
pub use greeting::{GreetingRequest, GreetingResult};
pub use query::{SelectRequest, TableContent};
pub use table::{
    SchemasRequest, SchemasResult, TableContentRequest, TablesRequest, TablesResult, UpdateRecord,
    UpdateTableRequest,
};
