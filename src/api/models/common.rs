// Envelope shared by every backend endpoint

use serde::{Deserialize, Serialize};

use crate::error::FieldErrors;

/// Response body returned by the registry API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Payload, absent on most error responses
    pub data: Option<T>,
    /// Human readable outcome
    #[serde(default)]
    pub message: Option<String>,
    /// Per field validation messages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrors>,
    /// Pagination info, list endpoints only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<PageMeta>,
}

/// Pagination block of a list response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageMeta {
    #[serde(default)]
    pub current_page: Option<u32>,
    pub last_page: u32,
    #[serde(default)]
    pub per_page: Option<u32>,
    #[serde(default)]
    pub total: Option<u64>,
}

/// Body of a non-2xx response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub errors: Option<FieldErrors>,
}
