use std::collections::BTreeMap;

use regex::Regex;
use serde_json::{Map, Value};

/// One constraint on a form field.
#[derive(Debug, Clone)]
pub enum Rule {
    Required,
    MinLength(usize),
    MaxLength(usize),
    Pattern { regex: Regex, message: String },
    Range { min: i64, max: i64 },
}

impl Rule {
    /// Message for `value` when it breaks this rule.
    pub fn check(&self, label: &str, value: &str) -> Option<String> {
        let len = value.chars().count();
        match self {
            Rule::Required if value.is_empty() => Some(format!("{label} is required")),
            Rule::MinLength(min) if len < *min => {
                Some(format!("{label} must have at least {min} characters"))
            }
            Rule::MaxLength(max) if len > *max => {
                Some(format!("{label} must have at most {max} characters"))
            }
            Rule::Pattern { regex, message } if !regex.is_match(value) => Some(message.clone()),
            Rule::Range { min, max } => match value.parse::<i64>() {
                Err(_) => Some(format!("{label} must be a number")),
                Ok(n) if n < *min || n > *max => {
                    Some(format!("{label} must be between {min} and {max}"))
                }
                Ok(_) => None,
            },
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    /// Sent as a JSON number.
    Integer,
    /// Comma separated input sent as a JSON array of strings.
    List,
    /// Only required when creating; left out of updates when blank.
    Secret,
}

#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub default: String,
    pub rules: Vec<Rule>,
}

impl FieldSpec {
    pub fn text(name: &'static str, label: &'static str) -> Self {
        Self {
            name,
            label,
            kind: FieldKind::Text,
            default: String::new(),
            rules: Vec::new(),
        }
    }

    pub fn integer(name: &'static str, label: &'static str) -> Self {
        Self {
            kind: FieldKind::Integer,
            ..Self::text(name, label)
        }
    }

    pub fn list(name: &'static str, label: &'static str) -> Self {
        Self {
            kind: FieldKind::List,
            ..Self::text(name, label)
        }
    }

    pub fn secret(name: &'static str, label: &'static str) -> Self {
        Self {
            kind: FieldKind::Secret,
            ..Self::text(name, label)
        }
    }

    pub fn required(mut self) -> Self {
        self.rules.push(Rule::Required);
        self
    }

    pub fn min(mut self, len: usize) -> Self {
        self.rules.push(Rule::MinLength(len));
        self
    }

    pub fn max(mut self, len: usize) -> Self {
        self.rules.push(Rule::MaxLength(len));
        self
    }

    pub fn pattern(mut self, regex: &Regex, message: &str) -> Self {
        self.rules.push(Rule::Pattern {
            regex: regex.clone(),
            message: message.to_string(),
        });
        self
    }

    pub fn range(mut self, min: i64, max: i64) -> Self {
        self.rules.push(Rule::Range { min, max });
        self
    }

    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default = value.into();
        self
    }

    fn is_required(&self) -> bool {
        self.rules.iter().any(|r| matches!(r, Rule::Required))
    }

    /// First failing rule, if any. Optional blank fields pass.
    pub fn validate(&self, value: &str, creating: bool) -> Option<String> {
        let value = value.trim();
        if value.is_empty() && (!self.is_required() || (self.kind == FieldKind::Secret && !creating))
        {
            return None;
        }
        self.rules.iter().find_map(|rule| rule.check(self.label, value))
    }

    fn to_json(&self, value: &str) -> Option<Value> {
        let value = value.trim();
        match self.kind {
            FieldKind::Text => Some(Value::String(value.to_string())),
            FieldKind::Secret if value.is_empty() => None,
            FieldKind::Secret => Some(Value::String(value.to_string())),
            FieldKind::Integer if value.is_empty() => Some(Value::Null),
            FieldKind::Integer => Some(
                value
                    .parse::<i64>()
                    .map(Value::from)
                    .unwrap_or_else(|_| Value::String(value.to_string())),
            ),
            FieldKind::List => Some(Value::Array(
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(|s| Value::String(s.to_string()))
                    .collect(),
            )),
        }
    }
}

/// Ordered set of fields making up an entity form.
#[derive(Debug, Clone, Default)]
pub struct FormSchema {
    pub fields: Vec<FieldSpec>,
}

impl FormSchema {
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        Self { fields }
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn defaults(&self) -> BTreeMap<String, String> {
        self.fields
            .iter()
            .map(|f| (f.name.to_string(), f.default.clone()))
            .collect()
    }

    /// One message per failing field.
    pub fn validate(
        &self,
        values: &BTreeMap<String, String>,
        creating: bool,
    ) -> BTreeMap<String, String> {
        self.fields
            .iter()
            .filter_map(|f| {
                let value = values.get(f.name).map(String::as_str).unwrap_or_default();
                f.validate(value, creating)
                    .map(|message| (f.name.to_string(), message))
            })
            .collect()
    }

    pub fn to_body(&self, values: &BTreeMap<String, String>) -> Value {
        let mut body = Map::new();
        for field in &self.fields {
            let value = values.get(field.name).map(String::as_str).unwrap_or_default();
            if let Some(json) = field.to_json(value) {
                body.insert(field.name.to_string(), json);
            }
        }
        Value::Object(body)
    }
}
