use cairn_cache::Identity;
use cairn_email::{EmailError, LabelDirectory, MailService};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Dependency keys fed to the view's cache cells.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewKey {
    Client(Identity<dyn MailService>),
    Directory(Identity<LabelDirectory>),
    /// Bumped on every sign-in so cells reload for the new session.
    SignIn(u64),
    LabelIds(Vec<String>),
    ThreadId(String),
    HistoryId(Option<String>),
    Revision(u64),
}

/// What the user is looking at. Shared between the coordinator and the
/// dependency functions of every cell it owns.
pub(crate) struct Selection {
    pub client: Option<Arc<dyn MailService>>,
    pub directory: Option<Arc<LabelDirectory>>,
    pub sign_ins: Arc<AtomicU64>,
    pub label_ids: Vec<String>,
    pub revision: u64,
}

impl Selection {
    pub fn new(label_ids: Vec<String>) -> Self {
        Self {
            client: None,
            directory: None,
            sign_ins: Arc::new(AtomicU64::new(0)),
            label_ids,
            revision: 0,
        }
    }

    /// Keys identifying the current client session, or `None` with no client.
    pub fn client_keys(&self) -> Option<Vec<ViewKey>> {
        let client = self.client.as_ref()?;
        Some(vec![
            ViewKey::Client(Identity::new(Arc::clone(client))),
            ViewKey::SignIn(self.sign_ins.load(Ordering::SeqCst)),
        ])
    }

    pub fn is_signed_in(&self) -> bool {
        self.client
            .as_ref()
            .is_some_and(|client| client.is_signed_in())
    }
}

#[derive(Clone)]
pub(crate) struct SharedSelection(Arc<RwLock<Selection>>);

impl SharedSelection {
    pub fn new(selection: Selection) -> Self {
        Self(Arc::new(RwLock::new(selection)))
    }

    pub fn read(&self) -> RwLockReadGuard<'_, Selection> {
        self.0.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, Selection> {
        self.0.write().unwrap_or_else(PoisonError::into_inner)
    }
}

pub(crate) fn client_from(deps: &[ViewKey]) -> Result<Arc<dyn MailService>, EmailError> {
    deps.iter()
        .find_map(|key| match key {
            ViewKey::Client(client) => Some(Arc::clone(client.arc())),
            _ => None,
        })
        .ok_or(EmailError::Unauthenticated)
}

pub(crate) fn directory_from(deps: &[ViewKey]) -> Result<Arc<LabelDirectory>, EmailError> {
    deps.iter()
        .find_map(|key| match key {
            ViewKey::Directory(directory) => Some(Arc::clone(directory.arc())),
            _ => None,
        })
        .ok_or(EmailError::Unauthenticated)
}

pub(crate) fn label_ids_from(deps: &[ViewKey]) -> Vec<String> {
    deps.iter()
        .find_map(|key| match key {
            ViewKey::LabelIds(ids) => Some(ids.clone()),
            _ => None,
        })
        .unwrap_or_default()
}

pub(crate) fn thread_id_from(deps: &[ViewKey]) -> Result<String, EmailError> {
    deps.iter()
        .find_map(|key| match key {
            ViewKey::ThreadId(id) => Some(id.clone()),
            _ => None,
        })
        .ok_or_else(|| EmailError::Data("thread id missing".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extractors_find_their_keys() {
        let deps = vec![
            ViewKey::SignIn(1),
            ViewKey::LabelIds(vec!["INBOX".to_string()]),
            ViewKey::ThreadId("t1".to_string()),
        ];
        assert_eq!(label_ids_from(&deps), vec!["INBOX".to_string()]);
        assert_eq!(thread_id_from(&deps).expect("thread id"), "t1");
        assert!(matches!(client_from(&deps), Err(EmailError::Unauthenticated)));
        assert!(directory_from(&deps).is_err());
    }

    #[test]
    fn no_client_means_no_keys() {
        let selection = Selection::new(vec!["INBOX".to_string()]);
        assert!(selection.client_keys().is_none());
        assert!(!selection.is_signed_in());
    }
}
