use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Response of the external document number lookup.
#[derive(Debug, Clone, Deserialize)]
pub struct PersonLookupResponse {
    #[serde(default)]
    pub status: Value,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub information: Option<PersonInfo>,
}

impl PersonLookupResponse {
    /// The provider reports success as `true`, `"success"` or `200` depending on the route.
    pub fn is_success(&self) -> bool {
        match &self.status {
            Value::Bool(ok) => *ok,
            Value::Number(code) => code.as_u64() == Some(200),
            Value::String(s) => s.eq_ignore_ascii_case("success") || s == "200",
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonInfo {
    #[serde(default)]
    pub names: String,
    #[serde(default)]
    pub father_last_name: String,
    #[serde(default)]
    pub mother_last_name: String,
    #[serde(default)]
    pub birthday: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
}
