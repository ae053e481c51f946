use crate::{EmailError, SessionNotifier};
use async_trait::async_trait;
use cairn_core::{Label, Thread, ThreadSummary};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThreadFilter {
    pub label_ids: Option<Vec<String>>,
}

impl ThreadFilter {
    pub fn labels(label_ids: &[String]) -> Self {
        Self {
            label_ids: Some(label_ids.to_vec()),
        }
    }
}

/// The remote mail service as seen by the views.
#[async_trait]
pub trait MailService: Send + Sync {
    async fn fetch_labels(&self) -> Result<Vec<Label>, EmailError>;

    async fn fetch_thread_summaries(
        &self,
        filter: &ThreadFilter,
    ) -> Result<Vec<ThreadSummary>, EmailError>;

    async fn fetch_full_thread(&self, id: &str) -> Result<Thread, EmailError>;

    fn session(&self) -> &SessionNotifier;

    fn is_signed_in(&self) -> bool {
        self.session().is_signed_in()
    }
}
