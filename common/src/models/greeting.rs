//! Greeting models.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Request body for the greeting endpoint.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct GreetingRequest {
    /// Name to greet.
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
}

/// Greeting response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GreetingResult {
    /// Greeting message.
    pub message: String,
}
