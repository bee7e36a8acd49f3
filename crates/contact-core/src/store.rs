use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::model::ContactRecord;

/// Persistence collaborator used by the submission pipeline.
#[async_trait::async_trait]
pub trait ContactStore: Send + Sync {
    /// Exact-match lookup on the stored email.
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<ContactRecord>>;
    /// Persist a new record and return what was stored.
    async fn create(&self, record: &ContactRecord) -> anyhow::Result<ContactRecord>;
}

#[async_trait::async_trait]
impl<S: ContactStore + ?Sized> ContactStore for Arc<S> {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<ContactRecord>> {
        (**self).find_by_email(email).await
    }

    async fn create(&self, record: &ContactRecord) -> anyhow::Result<ContactRecord> {
        (**self).create(record).await
    }
}

/// In-memory store for single-process use and tests.
#[derive(Clone, Default)]
pub struct LocalStore {
    inner: Arc<LocalInner>,
}

#[derive(Default)]
struct LocalInner {
    records: Mutex<Vec<ContactRecord>>,
    creates: AtomicUsize,
}

impl LocalStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = ContactRecord>,
    {
        let inner = LocalInner {
            records: Mutex::new(records.into_iter().collect()),
            creates: AtomicUsize::new(0),
        };
        Self {
            inner: Arc::new(inner),
        }
    }

    pub async fn records(&self) -> Vec<ContactRecord> {
        self.inner.records.lock().await.clone()
    }

    /// Number of `create` calls seen so far.
    pub fn create_calls(&self) -> usize {
        self.inner.creates.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ContactStore for LocalStore {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<ContactRecord>> {
        let records = self.inner.records.lock().await;
        Ok(records.iter().find(|r| r.email == email).cloned())
    }

    async fn create(&self, record: &ContactRecord) -> anyhow::Result<ContactRecord> {
        self.inner.creates.fetch_add(1, Ordering::SeqCst);
        let mut records = self.inner.records.lock().await;
        if records.iter().any(|r| r.email == record.email) {
            anyhow::bail!("email already stored: {}", record.email);
        }
        records.push(record.clone());
        Ok(record.clone())
    }
}
