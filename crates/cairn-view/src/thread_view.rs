use crate::coordinator::FETCH_RETRY;
use crate::format::format_relative_date;
use crate::keys::{client_from, thread_id_from, SharedSelection, ViewKey};
use crate::{MessageView, ThreadRow};
use cairn_cache::{CachedTask, CellState, Host};
use cairn_core::{Thread, ThreadSummary, UNREAD_LABEL};
use cairn_email::{parse_address, parse_address_list, thread_metadata, EmailError, LabelMap};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;

/// A thread in the list: its summary, its full message list loaded through a
/// cache cell, and the open state of the thread and each message.
pub struct ThreadView {
    summary: ThreadSummary,
    id: String,
    open: bool,
    full_thread: CachedTask<Arc<Thread>, ViewKey>,
    loaded: Option<Arc<Thread>>,
    messages: Vec<MessageView>,
}

impl ThreadView {
    pub(crate) fn new(
        id: String,
        summary: ThreadSummary,
        host: Arc<dyn Host>,
        selection: SharedSelection,
    ) -> Self {
        let thread_id = id.clone();
        let history_id = summary.history_id.clone();
        let full_thread = CachedTask::new(
            format!("thread {id}"),
            host,
            |deps: Vec<ViewKey>| async move {
                let client = client_from(&deps)?;
                let id = thread_id_from(&deps)?;
                let thread = client.fetch_full_thread(&id).await?;
                Ok::<_, EmailError>(Arc::new(thread))
            },
        )
        .with_deps(move || {
            let mut keys = selection.read().client_keys()?;
            keys.push(ViewKey::ThreadId(thread_id.clone()));
            keys.push(ViewKey::HistoryId(history_id.clone()));
            Some(keys)
        })
        .with_retry(FETCH_RETRY);

        Self {
            summary,
            id,
            open: false,
            full_thread,
            loaded: None,
            messages: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn summary(&self) -> &ThreadSummary {
        &self.summary
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub(crate) fn set_open(&mut self, open: bool) {
        self.open = open;
    }

    pub fn toggle(&mut self) -> bool {
        self.open = !self.open;
        self.open
    }

    pub fn state(&self) -> CellState {
        self.full_thread.state()
    }

    /// Let a thread whose fetch kept failing try again.
    pub(crate) fn retry_failed(&mut self) {
        if self.full_thread.state() == CellState::Failed {
            self.full_thread.reset_failures();
        }
    }

    pub fn toggle_message(&mut self, message_id: &str) -> Option<bool> {
        self.messages
            .iter_mut()
            .find(|message| message.id() == Some(message_id))
            .map(MessageView::toggle)
    }

    /// Rebuild message views when a different thread value arrives, keeping
    /// the open state of messages that are still present.
    fn sync_messages(&mut self, thread: &Arc<Thread>) {
        if self
            .loaded
            .as_ref()
            .is_some_and(|loaded| Arc::ptr_eq(loaded, thread))
        {
            return;
        }

        let previous: HashMap<String, bool> = self
            .messages
            .iter()
            .filter_map(|message| message.id().map(|id| (id.to_string(), message.is_open())))
            .collect();
        let total = thread.messages.len();
        self.messages = thread
            .messages
            .iter()
            .enumerate()
            .map(|(index, raw)| {
                let mut view = MessageView::new(raw, index, total);
                if let Some(open) = view.id().and_then(|id| previous.get(id)) {
                    view.set_open(*open);
                }
                view
            })
            .collect();
        self.loaded = Some(Arc::clone(thread));
    }

    pub(crate) fn row(
        &mut self,
        labels: Option<&LabelMap>,
        now: DateTime<Utc>,
        window_days: i64,
    ) -> ThreadRow {
        let full = self.full_thread.get();
        if let Some(thread) = &full {
            self.sync_messages(thread);
        }
        let metadata = full.as_deref().map(thread_metadata).unwrap_or_default();

        let label_names: Vec<String> = labels
            .map(|labels| {
                metadata
                    .label_ids
                    .iter()
                    .filter_map(|id| labels.get(id))
                    .filter(|label| label.is_visible_user_label())
                    .filter_map(|label| label.name.clone())
                    .collect()
            })
            .unwrap_or_default();

        ThreadRow {
            id: self.id.clone(),
            snippet: self.summary.snippet.clone(),
            from: metadata.from.as_deref().map(parse_address),
            to: metadata
                .to
                .as_deref()
                .map(parse_address_list)
                .unwrap_or_default(),
            date: metadata
                .date
                .as_deref()
                .and_then(|date| format_relative_date(date, now, window_days)),
            subject: metadata.subject.clone(),
            labels: label_names,
            unread: metadata.label_ids.contains(UNREAD_LABEL),
            open: self.open,
            loaded: full.is_some(),
            messages: match (&full, self.open) {
                (Some(_), true) => self.messages.iter().map(MessageView::row).collect(),
                _ => Vec::new(),
            },
        }
    }
}

impl std::fmt::Debug for ThreadView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadView")
            .field("id", &self.id)
            .field("open", &self.open)
            .field("full_thread", &self.full_thread)
            .field("messages", &self.messages.len())
            .finish()
    }
}
