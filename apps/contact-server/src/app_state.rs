use std::sync::Arc;

use contact_core::{ContactSchema, ContactStore, ContactSubmission, LocalStore};
use contact_kernel::Kernel;
use serde::Serialize;

/// Row returned by the listing endpoint. The memory backend keeps no id or
/// timestamp, so those are omitted there.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub(crate) struct ContactItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
}

#[derive(Clone)]
pub(crate) enum ContactListing {
    Sqlite(Kernel),
    Memory(LocalStore),
}

impl ContactListing {
    /// Newest first, at most `limit` rows.
    pub async fn recent(&self, limit: usize) -> anyhow::Result<Vec<ContactItem>> {
        match self {
            ContactListing::Sqlite(kernel) => {
                let rows = kernel.list_contacts_async(limit as i64).await?;
                Ok(rows
                    .into_iter()
                    .map(|row| ContactItem {
                        id: Some(row.id),
                        name: row.name,
                        email: row.email,
                        created: Some(row.created),
                    })
                    .collect())
            }
            ContactListing::Memory(store) => Ok(store
                .records()
                .await
                .into_iter()
                .rev()
                .take(limit)
                .map(|record| ContactItem {
                    id: None,
                    name: record.name,
                    email: record.email,
                    created: None,
                })
                .collect()),
        }
    }
}

#[derive(Clone)]
pub(crate) struct AppState {
    submission: ContactSubmission<Arc<dyn ContactStore>>,
    listing: ContactListing,
}

impl AppState {
    pub fn new(store: Arc<dyn ContactStore>, listing: ContactListing) -> Self {
        let schema = Arc::new(ContactSchema::new());
        Self {
            submission: ContactSubmission::new(schema, store),
            listing,
        }
    }

    pub fn with_kernel(kernel: Kernel) -> Self {
        let store: Arc<dyn ContactStore> = Arc::new(kernel.clone());
        Self::new(store, ContactListing::Sqlite(kernel))
    }

    pub fn in_memory(store: LocalStore) -> Self {
        let shared: Arc<dyn ContactStore> = Arc::new(store.clone());
        Self::new(shared, ContactListing::Memory(store))
    }

    pub fn submission(&self) -> &ContactSubmission<Arc<dyn ContactStore>> {
        &self.submission
    }

    pub fn schema(&self) -> &ContactSchema {
        self.submission.schema()
    }

    pub fn listing(&self) -> &ContactListing {
        &self.listing
    }
}
