//! Parameters for ESP key endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Body for storing a new ESP key
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateEspKeyParams {
    /// Optional display label; a sequential per-user default is assigned when omitted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// The raw provider API key; validated upstream before it is stored
    pub key: String,
}
