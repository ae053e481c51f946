use crate::{EmailError, MailService};
use cairn_core::Label;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Labels keyed by id.
pub type LabelMap = HashMap<String, Label>;

/// Fetches the account's labels once and serves them from memory afterwards.
///
/// Concurrent first callers share a single fetch. A failed fetch is not
/// remembered, so the next caller tries again.
pub struct LabelDirectory {
    service: Arc<dyn MailService>,
    labels: OnceCell<Arc<Vec<Label>>>,
    by_id: OnceCell<Arc<LabelMap>>,
}

impl LabelDirectory {
    pub fn new(service: Arc<dyn MailService>) -> Self {
        Self {
            service,
            labels: OnceCell::new(),
            by_id: OnceCell::new(),
        }
    }

    pub async fn labels(&self) -> Result<Arc<Vec<Label>>, EmailError> {
        self.labels
            .get_or_try_init(|| async {
                let labels = self.service.fetch_labels().await?;
                tracing::debug!(count = labels.len(), "labels fetched");
                Ok::<_, EmailError>(Arc::new(labels))
            })
            .await
            .cloned()
    }

    pub async fn label_map(&self) -> Result<Arc<LabelMap>, EmailError> {
        self.by_id
            .get_or_try_init(|| async {
                let labels = self.labels().await?;
                Ok::<_, EmailError>(Arc::new(index_labels(&labels)))
            })
            .await
            .cloned()
    }

    /// The label map if it has already been loaded.
    pub fn cached_label_map(&self) -> Option<Arc<LabelMap>> {
        self.by_id.get().cloned()
    }
}

pub fn index_labels(labels: &[Label]) -> LabelMap {
    labels
        .iter()
        .filter_map(|label| label.id.clone().map(|id| (id, label.clone())))
        .collect()
}

/// User labels meant for the navigation menu, in service order.
pub fn visible_labels(labels: &[Label]) -> Vec<Label> {
    labels
        .iter()
        .filter(|label| label.is_visible_user_label())
        .cloned()
        .collect()
}
