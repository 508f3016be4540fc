//! Create/update forms for any entity in the catalog.

pub mod rules;

use std::collections::BTreeMap;

use serde_json::Value;

use crate::api::models::{ApiResponse, PersonInfo};
use crate::client::{ResourceClient, envelope};
use crate::entity::EntityDescriptor;
use crate::error::{AppError, AppResult};
use crate::notify::{Notification, Notifier};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    Create,
    /// Editing the record with this id.
    Update(String),
}

pub struct FormController {
    client: ResourceClient,
    descriptor: EntityDescriptor,
    mode: FormMode,
    values: BTreeMap<String, String>,
    errors: BTreeMap<String, String>,
}

impl FormController {
    pub fn new(client: ResourceClient, descriptor: EntityDescriptor, mode: FormMode) -> Self {
        let values = descriptor.schema.defaults();
        Self {
            client,
            descriptor,
            mode,
            values,
            errors: BTreeMap::new(),
        }
    }

    pub fn mode(&self) -> &FormMode {
        &self.mode
    }

    pub fn values(&self) -> &BTreeMap<String, String> {
        &self.values
    }

    pub fn value(&self, field: &str) -> Option<&str> {
        self.values.get(field).map(String::as_str)
    }

    pub fn errors(&self) -> &BTreeMap<String, String> {
        &self.errors
    }

    pub fn error(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }

    /// Sets a field; returns false for fields the form does not have.
    pub fn set(&mut self, field: &str, value: impl Into<String>) -> bool {
        if self.descriptor.schema.field(field).is_none() {
            return false;
        }
        self.values.insert(field.to_string(), value.into());
        true
    }

    /// Copies an existing record into the form before editing it.
    pub fn load(&mut self, record: &Value) {
        for field in &self.descriptor.schema.fields {
            let text = match record.get(field.name) {
                Some(Value::String(s)) => s.clone(),
                Some(Value::Number(n)) => n.to_string(),
                Some(Value::Bool(b)) => b.to_string(),
                Some(Value::Array(items)) => items
                    .iter()
                    .filter_map(|item| match item {
                        Value::String(s) => Some(s.clone()),
                        Value::Object(o) => o.get("name").and_then(Value::as_str).map(str::to_string),
                        _ => None,
                    })
                    .collect::<Vec<_>>()
                    .join(","),
                _ => continue,
            };
            self.values.insert(field.name.to_string(), text);
        }
    }

    /// Fills name, surname, birth date and gender fields from a document lookup.
    pub fn prefill_from_person(&mut self, person: &PersonInfo) -> usize {
        let gender = person
            .gender
            .as_deref()
            .and_then(|g| g.trim().chars().next())
            .map(|c| c.to_ascii_uppercase().to_string());
        let candidates = [
            ("name", Some(person.names.clone())),
            ("first_name", Some(person.father_last_name.clone())),
            ("last_name", Some(person.mother_last_name.clone())),
            ("birth_date", person.birthday.clone()),
            ("gender", gender),
        ];

        let mut filled = 0;
        for (field, value) in candidates {
            let Some(value) = value.filter(|v| !v.trim().is_empty()) else {
                continue;
            };
            if self.set(field, value.trim()) {
                filled += 1;
            }
        }
        filled
    }

    /// Validates, then creates or updates the record.
    ///
    /// Client-side failures never reach the network. Backend field errors are
    /// copied onto the form and the entered values are kept.
    pub async fn submit(&mut self, notifier: &dyn Notifier) -> AppResult<Value> {
        let creating = self.mode == FormMode::Create;
        self.errors = self.descriptor.schema.validate(&self.values, creating);
        if !self.errors.is_empty() {
            tracing::debug!(
                "{} form rejected on {} field(s)",
                self.descriptor.kind,
                self.errors.len()
            );
            return Err(AppError::Validation(
                self.errors
                    .iter()
                    .map(|(field, message)| (field.clone(), vec![message.clone()]))
                    .collect(),
            ));
        }

        let body = self.descriptor.schema.to_body(&self.values);
        let endpoints = &self.descriptor.endpoints;
        let result = match &self.mode {
            FormMode::Create => self.client.post(&endpoints.register, &body).await,
            FormMode::Update(id) => self.client.put(&endpoints.update_path(id), &body).await,
        };

        match result {
            Ok(response) => {
                let response: ApiResponse<Value> = envelope(response)?;
                let message = response
                    .message
                    .unwrap_or_else(|| format!("{} saved", self.descriptor.label));
                notifier.notify(Notification::success(message));
                Ok(response.data.unwrap_or(Value::Null))
            }
            Err(e) => {
                if let Some(field_errors) = e.field_errors() {
                    for (field, messages) in field_errors {
                        if let Some(first) = messages.first() {
                            self.errors.insert(field.clone(), first.clone());
                        }
                    }
                }
                notifier.notify(Notification::error(e.user_message()));
                Err(e)
            }
        }
    }

    /// Back to the initial defaults, no request involved.
    pub fn reset(&mut self) {
        self.values = self.descriptor.schema.defaults();
        self.errors.clear();
    }
}

/// Delete action of a list row.
pub async fn delete_record(
    client: &ResourceClient,
    descriptor: &EntityDescriptor,
    id: &str,
    notifier: &dyn Notifier,
) -> AppResult<()> {
    match client.delete(&descriptor.endpoints.delete_path(id)).await {
        Ok(response) => {
            let response: ApiResponse<Value> = envelope(response)?;
            let message = response
                .message
                .unwrap_or_else(|| format!("{} record deleted", descriptor.label));
            notifier.notify(Notification::success(message));
            Ok(())
        }
        Err(e) => {
            notifier.notify(Notification::error(e.user_message()));
            Err(e)
        }
    }
}
