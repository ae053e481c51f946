use crate::{EmailError, MailService, SessionNotifier, ThreadFilter};
use async_trait::async_trait;
use cairn_core::{Label, Thread, ThreadSummary, UserProfile};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

const LABELS_FILE: &str = "labels.json";
const THREADS_FILE: &str = "threads.json";
const USERS_FILE: &str = "users.json";

/// Serves mail from JSON files on disk for offline debugging.
///
/// `threads.json` holds full threads; summaries are derived from them and
/// filtered by the labels of their messages.
#[derive(Debug)]
pub struct FixtureMailService {
    directory: PathBuf,
    session: SessionNotifier,
}

impl FixtureMailService {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            session: SessionNotifier::new(true),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub async fn users(&self) -> Result<Vec<UserProfile>, EmailError> {
        self.read_optional(USERS_FILE).await
    }

    async fn threads(&self) -> Result<Vec<Thread>, EmailError> {
        self.read_optional(THREADS_FILE).await
    }

    async fn read_optional<T: DeserializeOwned>(&self, file: &str) -> Result<Vec<T>, EmailError> {
        let path = self.directory.join(file);
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(path = %path.display(), "fixture file missing");
                Ok(Vec::new())
            }
            Err(err) => Err(err.into()),
        }
    }
}

fn thread_has_any_label(thread: &Thread, label_ids: &[String]) -> bool {
    thread
        .messages
        .iter()
        .flat_map(|message| message.label_ids.iter().flatten())
        .any(|label| label_ids.contains(label))
}

#[async_trait]
impl MailService for FixtureMailService {
    async fn fetch_labels(&self) -> Result<Vec<Label>, EmailError> {
        self.read_optional(LABELS_FILE).await
    }

    async fn fetch_thread_summaries(
        &self,
        filter: &ThreadFilter,
    ) -> Result<Vec<ThreadSummary>, EmailError> {
        let threads = self.threads().await?;
        Ok(threads
            .iter()
            .filter(|thread| match &filter.label_ids {
                Some(label_ids) => thread_has_any_label(thread, label_ids),
                None => true,
            })
            .map(Thread::summary)
            .collect())
    }

    async fn fetch_full_thread(&self, id: &str) -> Result<Thread, EmailError> {
        self.threads()
            .await?
            .into_iter()
            .find(|thread| thread.id.as_deref() == Some(id))
            .ok_or_else(|| EmailError::Data(format!("unknown thread {id}")))
    }

    fn session(&self) -> &SessionNotifier {
        &self.session
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn fixture_dir(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        let dir = std::env::temp_dir().join(format!(
            "cairn-fixtures-{name}-{}-{nanos}",
            std::process::id()
        ));
        std::fs::create_dir_all(&dir).expect("fixture dir");
        dir
    }

    fn write_threads(dir: &Path) {
        let threads = r#"[
            {"id": "t1", "snippet": "first", "messages": [
                {"id": "m1", "labelIds": ["INBOX", "UNREAD"]}
            ]},
            {"id": "t2", "snippet": "second", "messages": [
                {"id": "m2", "labelIds": ["SENT"]}
            ]}
        ]"#;
        std::fs::write(dir.join(THREADS_FILE), threads).expect("write threads");
    }

    #[tokio::test]
    async fn summaries_follow_label_filter() {
        let dir = fixture_dir("filter");
        write_threads(&dir);
        let service = FixtureMailService::new(&dir);

        let inbox = service
            .fetch_thread_summaries(&ThreadFilter::labels(&["INBOX".to_string()]))
            .await
            .expect("inbox");
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].id.as_deref(), Some("t1"));

        let all = service
            .fetch_thread_summaries(&ThreadFilter::default())
            .await
            .expect("all");
        assert_eq!(all.len(), 2);

        let full = service.fetch_full_thread("t2").await.expect("t2");
        assert_eq!(full.messages.len(), 1);
        assert!(service.fetch_full_thread("missing").await.is_err());
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn missing_files_read_as_empty() {
        let dir = fixture_dir("empty");
        let service = FixtureMailService::new(&dir);
        assert!(service.fetch_labels().await.expect("labels").is_empty());
        assert!(service.users().await.expect("users").is_empty());
        assert!(service.is_signed_in());
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn malformed_json_is_an_error() {
        let dir = fixture_dir("bad");
        std::fs::write(dir.join(LABELS_FILE), "{not json").expect("write");
        let service = FixtureMailService::new(&dir);
        assert!(matches!(
            service.fetch_labels().await,
            Err(EmailError::Json(_))
        ));
        let _ = std::fs::remove_dir_all(dir);
    }
}
