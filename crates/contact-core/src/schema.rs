//! Declarative field rules for the contact form.
//!
//! Rules are stored per field in a fixed order. Full-record validation and
//! single-field (blur) validation share the same rule table; subset
//! validation only filters which fields are visited.

use std::collections::BTreeMap;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::errors::SchemaError;
use crate::model::{ContactField, ContactRecord, FieldErrors};

pub const NAME_MIN_CHARS: usize = 3;
pub const NAME_MAX_CHARS: usize = 20;

pub const MSG_NAME_TOO_SHORT: &str = "名前は3文字以上で入力してください";
pub const MSG_NAME_TOO_LONG: &str = "名前は20文字以内で入力してください";
pub const MSG_EMAIL_REQUIRED: &str = "メールアドレスは必須です";
pub const MSG_EMAIL_INVALID: &str = "正しいメールアドレス形式で入力してください";

// local part may not start with '.' and no ".." anywhere; both are checked
// outside the regex since the engine has no lookaround.
static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9_'+\-.]*[A-Za-z0-9_+\-]@(?:[A-Za-z0-9][A-Za-z0-9\-]*\.)+[A-Za-z]{2,}$")
        .expect("email regex")
});

/// Format-only email check: `local@domain.tld`.
pub fn is_email(value: &str) -> bool {
    !value.starts_with('.') && !value.contains("..") && EMAIL_RE.is_match(value)
}

/// Length in UTF-16 code units, so a character outside the BMP counts as two.
fn name_len(value: &str) -> usize {
    value.encode_utf16().count()
}

/// A single predicate with its stable code and display message.
#[derive(Clone, Copy)]
pub struct Rule {
    pub code: &'static str,
    pub message: &'static str,
    passes: fn(&str) -> bool,
}

impl Rule {
    pub const fn new(code: &'static str, message: &'static str, passes: fn(&str) -> bool) -> Self {
        Self {
            code,
            message,
            passes,
        }
    }

    pub fn passes(&self, value: &str) -> bool {
        (self.passes)(value)
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("code", &self.code)
            .field("message", &self.message)
            .finish()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FieldIssue {
    pub field: ContactField,
    pub code: &'static str,
    pub message: String,
}

impl FieldIssue {
    pub fn new(field: ContactField, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            code,
            message: message.into(),
        }
    }
}

/// Failing rules in field order, then rule order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ValidationIssues {
    issues: Vec<FieldIssue>,
}

impl ValidationIssues {
    pub fn new(issues: Vec<FieldIssue>) -> Self {
        Self { issues }
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldIssue> {
        self.issues.iter()
    }

    pub fn first(&self) -> Option<&FieldIssue> {
        self.issues.first()
    }

    /// Group messages per field. Fields without issues keep an empty list.
    pub fn to_field_errors(&self) -> FieldErrors {
        let mut errors = FieldErrors::default();
        for issue in &self.issues {
            errors.get_mut(issue.field).push(issue.message.clone());
        }
        errors
    }
}

impl fmt::Display for ValidationIssues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for issue in &self.issues {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", issue.field, issue.message)?;
            first = false;
        }
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct ContactSchema {
    rules: BTreeMap<ContactField, Vec<Rule>>,
}

impl Default for ContactSchema {
    fn default() -> Self {
        Self::new()
    }
}

impl ContactSchema {
    pub fn new() -> Self {
        let mut rules = BTreeMap::new();
        rules.insert(
            ContactField::Name,
            vec![
                Rule::new("too_short", MSG_NAME_TOO_SHORT, |v| {
                    name_len(v) >= NAME_MIN_CHARS
                }),
                Rule::new("too_long", MSG_NAME_TOO_LONG, |v| {
                    name_len(v) <= NAME_MAX_CHARS
                }),
            ],
        );
        rules.insert(
            ContactField::Email,
            vec![
                Rule::new("required", MSG_EMAIL_REQUIRED, |v| !v.is_empty()),
                // empty input is the `required` rule's concern
                Rule::new("invalid_format", MSG_EMAIL_INVALID, |v| {
                    v.is_empty() || is_email(v)
                }),
            ],
        );
        Self { rules }
    }

    pub fn rules(&self, field: ContactField) -> &[Rule] {
        self.rules.get(&field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Validate every field of a full record.
    pub fn validate(&self, record: &ContactRecord) -> Result<ContactRecord, ValidationIssues> {
        self.validate_subset(&[
            (ContactField::Name, record.name.as_str()),
            (ContactField::Email, record.email.as_str()),
        ])?;
        Ok(record.clone())
    }

    /// Validate only the listed fields; absent fields are not inspected.
    pub fn validate_subset(&self, fields: &[(ContactField, &str)]) -> Result<(), ValidationIssues> {
        let mut ordered = fields.to_vec();
        ordered.sort_by_key(|(field, _)| *field);

        let issues: Vec<FieldIssue> = ordered
            .into_iter()
            .flat_map(|(field, value)| {
                self.rules(field)
                    .iter()
                    .filter(move |rule| !rule.passes(value))
                    .map(move |rule| FieldIssue::new(field, rule.code, rule.message))
            })
            .collect();

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationIssues::new(issues))
        }
    }

    /// Validate one field addressed by its wire name.
    pub fn validate_field(&self, field_name: &str, value: &str) -> Result<(), SchemaError> {
        let field: ContactField = field_name.parse()?;
        self.validate_subset(&[(field, value)])
            .map_err(SchemaError::Validation)
    }
}
