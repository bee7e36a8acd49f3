//! Contact form core: validation schema, blur validation, and the submission
//! pipeline. No HTTP here; persistence is reached through [`ContactStore`].

pub mod client;
pub mod config;
pub mod errors;
pub mod model;
pub mod schema;
pub mod store;
pub mod submit;

pub use crate::client::{blur_message, ClientFieldErrors};
pub use crate::config::{load_config, resolve_config_path, Config, StorageBackend};
pub use crate::errors::{ConfigError, SchemaError, SubmitError};
pub use crate::model::{
    ContactField, ContactRecord, FieldErrors, RawContactForm, SubmissionResult,
};
pub use crate::schema::{ContactSchema, FieldIssue, ValidationIssues};
pub use crate::store::{ContactStore, LocalStore};
pub use crate::submit::{ContactSubmission, SubmitOutcome, COMPLETE_PATH};
