use std::time::Duration;

use reqwest::header::ACCEPT;

use crate::api::models::{PersonInfo, PersonLookupResponse};

/// Client for the national ID lookup used to prefill registration forms.
///
/// Lookups are best effort: any failure is logged and reported as `None` so a
/// form can always be filled in by hand.
#[derive(Debug, Clone)]
pub struct PersonLookup {
    http: reqwest::Client,
    base_url: String,
}

impl PersonLookup {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub async fn lookup(&self, document_number: &str) -> Option<PersonInfo> {
        let document_number = document_number.trim();
        if document_number.is_empty() || !document_number.chars().all(|c| c.is_ascii_digit()) {
            tracing::debug!("Skipping lookup for malformed document number");
            return None;
        }

        let url = format!("{}/{}", self.base_url, document_number);
        let response = match self.http.get(&url).header(ACCEPT, "application/json").send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!("Person lookup failed: {}", e);
                return None;
            }
        };

        if !response.status().is_success() {
            tracing::warn!("Person lookup returned status {}", response.status());
            return None;
        }

        match response.json::<PersonLookupResponse>().await {
            Ok(body) if body.is_success() => body.information,
            Ok(body) => {
                tracing::warn!(
                    "Person lookup unsuccessful: {}",
                    body.message.unwrap_or_default()
                );
                None
            }
            Err(e) => {
                tracing::warn!("Person lookup returned an unreadable body: {}", e);
                None
            }
        }
    }
}
