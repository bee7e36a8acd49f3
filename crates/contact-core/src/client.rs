//! Blur-time validation of a single field.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::errors::SchemaError;
use crate::model::ContactField;
use crate::schema::{ContactSchema, ValidationIssues};

/// Message to display for `field_name` after blur.
///
/// Returns `""` when the field is valid or the failure carries no message.
/// Non-validation failures are passed through untouched so the caller can
/// keep them out of field state.
pub fn blur_message(
    schema: &ContactSchema,
    field_name: &str,
    value: &str,
) -> Result<String, SchemaError> {
    display_message(schema.validate_field(field_name, value))
}

fn display_message(outcome: Result<(), SchemaError>) -> Result<String, SchemaError> {
    match outcome {
        Ok(()) => Ok(String::new()),
        Err(SchemaError::Validation(issues)) => Ok(first_message(&issues)),
        Err(other) => Err(other),
    }
}

fn first_message(issues: &ValidationIssues) -> String {
    issues
        .first()
        .map(|issue| issue.message.clone())
        .unwrap_or_default()
}

fn field_message(schema: &ContactSchema, field: ContactField, value: &str) -> String {
    match schema.validate_subset(&[(field, value)]) {
        Ok(()) => String::new(),
        Err(issues) => first_message(&issues),
    }
}

/// One display string per field; empty means no client error.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientFieldErrors {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

impl ClientFieldErrors {
    pub fn message(&self, field: ContactField) -> &str {
        match field {
            ContactField::Name => &self.name,
            ContactField::Email => &self.email,
        }
    }

    fn slot(&mut self, field: ContactField) -> &mut String {
        match field {
            ContactField::Name => &mut self.name,
            ContactField::Email => &mut self.email,
        }
    }

    pub fn clear(&mut self) {
        self.name.clear();
        self.email.clear();
    }

    /// Re-validate one field and update only its entry.
    ///
    /// Returns the new message, or `None` when `field_name` is not a form
    /// field; that failure is logged and state is left as it was.
    pub fn on_field_blur(
        &mut self,
        schema: &ContactSchema,
        field_name: &str,
        value: &str,
    ) -> Option<&str> {
        let field = match field_name.parse::<ContactField>() {
            Ok(field) => field,
            Err(err) => {
                warn!(target: "contacts.client", field = field_name, "blur validation skipped: {err}");
                return None;
            }
        };
        let slot = self.slot(field);
        *slot = field_message(schema, field, value);
        Some(slot.as_str())
    }
}
