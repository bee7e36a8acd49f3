use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::SchemaError;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContactRecord {
    pub name: String,
    pub email: String,
}

impl ContactRecord {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

/// Fields accepted by the contact form. Order here is the reporting order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactField {
    Name,
    Email,
}

impl ContactField {
    pub const ALL: [ContactField; 2] = [ContactField::Name, ContactField::Email];

    pub fn as_str(self) -> &'static str {
        match self {
            ContactField::Name => "name",
            ContactField::Email => "email",
        }
    }
}

impl fmt::Display for ContactField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContactField {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(ContactField::Name),
            "email" => Ok(ContactField::Email),
            other => Err(SchemaError::UnknownField(other.to_string())),
        }
    }
}

/// Per-field message lists. Both keys are always serialized so callers can
/// render without probing for presence.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldErrors {
    #[serde(default)]
    pub name: Vec<String>,
    #[serde(default)]
    pub email: Vec<String>,
}

impl FieldErrors {
    pub fn get(&self, field: ContactField) -> &[String] {
        match field {
            ContactField::Name => &self.name,
            ContactField::Email => &self.email,
        }
    }

    pub fn get_mut(&mut self, field: ContactField) -> &mut Vec<String> {
        match field {
            ContactField::Name => &mut self.name,
            ContactField::Email => &mut self.email,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.email.is_empty()
    }

    /// Errors carrying a single message on one field.
    pub fn single(field: ContactField, message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.get_mut(field).push(message.into());
        errors
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionResult {
    pub success: bool,
    #[serde(default)]
    pub errors: FieldErrors,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_error: Option<String>,
}

impl SubmissionResult {
    /// The state a form starts from before any submission.
    pub fn initial() -> Self {
        Self::default()
    }

    pub fn failed(errors: FieldErrors) -> Self {
        Self {
            success: false,
            errors,
            server_error: None,
        }
    }

    pub fn server_failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            errors: FieldErrors::default(),
            server_error: Some(message.into()),
        }
    }
}

/// Raw string-keyed form input as posted by the browser.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawContactForm {
    values: HashMap<String, String>,
}

impl RawContactForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from key/value pairs; the first occurrence of a key wins.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut values = HashMap::new();
        for (k, v) in pairs {
            values.entry(k.into()).or_insert_with(|| v.into());
        }
        Self { values }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.entry(key.into()).or_insert_with(|| value.into());
        self
    }

    /// Value for `key`, or `""` when the key was not posted.
    pub fn get(&self, key: &str) -> &str {
        self.values.get(key).map(String::as_str).unwrap_or("")
    }

    pub fn field(&self, field: ContactField) -> &str {
        self.get(field.as_str())
    }

    pub fn to_record(&self) -> ContactRecord {
        ContactRecord::new(
            self.field(ContactField::Name),
            self.field(ContactField::Email),
        )
    }
}

impl From<HashMap<String, String>> for RawContactForm {
    fn from(values: HashMap<String, String>) -> Self {
        Self { values }
    }
}
