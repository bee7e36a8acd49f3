use std::sync::Arc;

use tracing::{debug, info};

use crate::errors::SubmitError;
use crate::model::{ContactField, FieldErrors, RawContactForm, SubmissionResult};
use crate::schema::ContactSchema;
use crate::store::ContactStore;

/// Where a successful submission sends the caller.
pub const COMPLETE_PATH: &str = "/contacts/complete";

pub const MSG_EMAIL_DUPLICATE: &str = "このメールアドレスは既に登録されています";

/// Result of one submission. `Redirect` is terminal and carries no result
/// value; the failure variants carry the per-field errors to render.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    ValidationFailed(FieldErrors),
    Conflict(FieldErrors),
    Redirect(String),
}

impl SubmitOutcome {
    /// Wire result for failures; `None` for a redirect.
    pub fn into_result(self) -> Option<SubmissionResult> {
        match self {
            SubmitOutcome::ValidationFailed(errors) | SubmitOutcome::Conflict(errors) => {
                Some(SubmissionResult::failed(errors))
            }
            SubmitOutcome::Redirect(_) => None,
        }
    }

    pub fn redirect_path(&self) -> Option<&str> {
        match self {
            SubmitOutcome::Redirect(path) => Some(path.as_str()),
            _ => None,
        }
    }
}

/// Server-side submission handler: validate, check uniqueness, persist.
///
/// The existence check and the insert are two separate store calls, so two
/// concurrent submissions of one email can both pass the check. Stores must
/// enforce uniqueness themselves; the loser surfaces as [`SubmitError::Store`].
#[derive(Clone)]
pub struct ContactSubmission<S> {
    schema: Arc<ContactSchema>,
    store: S,
}

impl<S: ContactStore> ContactSubmission<S> {
    pub fn new(schema: Arc<ContactSchema>, store: S) -> Self {
        Self { schema, store }
    }

    pub fn schema(&self) -> &ContactSchema {
        &self.schema
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn submit(
        &self,
        previous: &SubmissionResult,
        input: &RawContactForm,
    ) -> Result<SubmitOutcome, SubmitError> {
        debug!(
            target: "contacts",
            resubmission = !previous.errors.is_empty() || previous.server_error.is_some(),
            "contact submission received"
        );

        let record = match self.schema.validate(&input.to_record()) {
            Ok(record) => record,
            Err(issues) => {
                debug!(target: "contacts", %issues, "contact submission rejected");
                return Ok(SubmitOutcome::ValidationFailed(issues.to_field_errors()));
            }
        };

        let existing = self
            .store
            .find_by_email(&record.email)
            .await
            .map_err(SubmitError::Store)?;
        if existing.is_some() {
            info!(target: "contacts", "contact submission conflicts with stored email");
            return Ok(SubmitOutcome::Conflict(FieldErrors::single(
                ContactField::Email,
                MSG_EMAIL_DUPLICATE,
            )));
        }

        self.store
            .create(&record)
            .await
            .map_err(SubmitError::Store)?;
        info!(target: "contacts", "contact stored");
        Ok(SubmitOutcome::Redirect(COMPLETE_PATH.to_string()))
    }
}
