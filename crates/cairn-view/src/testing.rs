use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use cairn_cache::{Host, PendingOperation, Settled};
use cairn_core::{
    Label, MessagePart, MessagePartBody, MessagePartHeader, RawMessage, Thread, ThreadSummary,
};
use cairn_email::{EmailError, MailService, SessionNotifier, ThreadFilter};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// In-memory mail service that counts every fetch.
pub(crate) struct MemoryMailService {
    labels: Vec<Label>,
    threads: Mutex<Vec<Thread>>,
    pub label_calls: AtomicUsize,
    pub summary_calls: AtomicUsize,
    pub thread_calls: AtomicUsize,
    /// Number of upcoming full-thread fetches that fail.
    pub fail_thread_fetches: AtomicUsize,
    session: SessionNotifier,
}

impl MemoryMailService {
    pub fn new(labels: Vec<Label>, threads: Vec<Thread>) -> Self {
        Self {
            labels,
            threads: Mutex::new(threads),
            label_calls: AtomicUsize::new(0),
            summary_calls: AtomicUsize::new(0),
            thread_calls: AtomicUsize::new(0),
            fail_thread_fetches: AtomicUsize::new(0),
            session: SessionNotifier::new(true),
        }
    }

    pub fn replace_threads(&self, threads: Vec<Thread>) {
        *self.threads.lock().expect("threads lock") = threads;
    }

    pub fn calls(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MailService for MemoryMailService {
    async fn fetch_labels(&self) -> Result<Vec<Label>, EmailError> {
        self.label_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.labels.clone())
    }

    async fn fetch_thread_summaries(
        &self,
        filter: &ThreadFilter,
    ) -> Result<Vec<ThreadSummary>, EmailError> {
        self.summary_calls.fetch_add(1, Ordering::SeqCst);
        let threads = self.threads.lock().expect("threads lock");
        Ok(threads
            .iter()
            .filter(|thread| match &filter.label_ids {
                Some(ids) => thread
                    .messages
                    .iter()
                    .flat_map(|message| message.label_ids.iter().flatten())
                    .any(|label| ids.contains(label)),
                None => true,
            })
            .map(Thread::summary)
            .collect())
    }

    async fn fetch_full_thread(&self, id: &str) -> Result<Thread, EmailError> {
        self.thread_calls.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .fail_thread_fetches
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if failing {
            return Err(EmailError::Data(format!("thread {id} unavailable")));
        }
        self.threads
            .lock()
            .expect("threads lock")
            .iter()
            .find(|thread| thread.id.as_deref() == Some(id))
            .cloned()
            .ok_or_else(|| EmailError::Data(format!("unknown thread {id}")))
    }

    fn session(&self) -> &SessionNotifier {
        &self.session
    }
}

/// Host that keeps announced operations so tests can wait for them.
#[derive(Default)]
pub(crate) struct RecordingHost {
    pub updates: AtomicUsize,
    pending: Mutex<Vec<PendingOperation>>,
}

impl RecordingHost {
    pub fn pending_count(&self) -> usize {
        self.pending.lock().expect("pending lock").len()
    }

    pub async fn settle(&self) -> Vec<Settled> {
        let pending = std::mem::take(&mut *self.pending.lock().expect("pending lock"));
        let mut outcomes = Vec::new();
        for operation in pending {
            outcomes.push(operation.settled().await);
        }
        outcomes
    }
}

impl Host for RecordingHost {
    fn request_update(&self) {
        self.updates.fetch_add(1, Ordering::SeqCst);
    }

    fn pending(&self, operation: PendingOperation) {
        self.pending.lock().expect("pending lock").push(operation);
    }
}

fn header(name: &str, value: &str) -> MessagePartHeader {
    MessagePartHeader {
        name: Some(name.to_string()),
        value: Some(value.to_string()),
    }
}

pub(crate) fn message(
    id: &str,
    labels: &[&str],
    headers: &[(&str, &str)],
    mime_type: &str,
    text: &str,
) -> RawMessage {
    RawMessage {
        id: Some(id.to_string()),
        label_ids: Some(labels.iter().map(|label| label.to_string()).collect()),
        snippet: Some(text.chars().take(20).collect()),
        payload: Some(MessagePart {
            mime_type: Some(mime_type.to_string()),
            headers: headers
                .iter()
                .map(|(name, value)| header(name, value))
                .collect(),
            body: Some(MessagePartBody {
                size: Some(text.len() as u64),
                data: Some(URL_SAFE_NO_PAD.encode(text)),
                ..Default::default()
            }),
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub(crate) fn plain_message(id: &str, labels: &[&str], from: &str, text: &str) -> RawMessage {
    message(id, labels, &[("From", from)], "text/plain", text)
}

pub(crate) fn html_message(id: &str, html: &str) -> RawMessage {
    message(id, &["INBOX"], &[("From", "jane@x.com")], "text/html", html)
}

pub(crate) fn thread(id: &str, history_id: &str, messages: Vec<RawMessage>) -> Thread {
    Thread {
        id: Some(id.to_string()),
        snippet: Some(format!("snippet of {id}")),
        history_id: Some(history_id.to_string()),
        messages: messages
            .into_iter()
            .map(|mut message| {
                message.thread_id = Some(id.to_string());
                message
            })
            .collect(),
    }
}

pub(crate) fn user_label(id: &str, name: &str, color: Option<&str>) -> Label {
    Label {
        id: Some(id.to_string()),
        name: Some(name.to_string()),
        label_type: Some("user".to_string()),
        label_list_visibility: Some("labelShow".to_string()),
        color: color.map(|background| cairn_core::LabelColor {
            text_color: "#000000".to_string(),
            background_color: background.to_string(),
        }),
        ..Default::default()
    }
}
