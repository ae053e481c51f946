use crate::{EmailError, MailService, SessionNotifier, ThreadFilter};
use async_trait::async_trait;
use cairn_core::{Label, Thread, ThreadSummary};
use futures::future::try_join_all;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::{PoisonError, RwLock};
use url::Url;

#[derive(Debug, Deserialize)]
struct LabelListResponse {
    labels: Option<Vec<Label>>,
}

#[derive(Debug, Deserialize)]
struct ThreadListResponse {
    threads: Option<Vec<ThreadSummary>>,
}

/// Gmail REST client authenticated with an OAuth bearer token.
pub struct GmailClient {
    http: reqwest::Client,
    api_base: String,
    max_results: usize,
    access_token: RwLock<Option<String>>,
    session: SessionNotifier,
}

impl GmailClient {
    pub fn new(api_base: &Url, max_results: usize) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: api_base.as_str().trim_end_matches('/').to_string(),
            max_results,
            access_token: RwLock::new(None),
            session: SessionNotifier::new(false),
        }
    }

    pub fn sign_in(&self, access_token: String) {
        *self
            .access_token
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(access_token);
        self.session.set_signed_in(true);
    }

    pub fn sign_out(&self) {
        *self
            .access_token
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
        self.session.set_signed_in(false);
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path)
    }

    fn token(&self) -> Result<String, EmailError> {
        self.access_token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(EmailError::Unauthenticated)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, EmailError> {
        let token = self.token()?;
        let response = self
            .http
            .get(self.endpoint(path))
            .bearer_auth(token)
            .query(query)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(EmailError::Data(format!(
                "Gmail request {path} failed with status {}",
                response.status()
            )));
        }

        Ok(response.json().await?)
    }

    async fn fetch_label(&self, label: Label) -> Result<Label, EmailError> {
        let Some(id) = label.id.as_deref() else {
            return Ok(label);
        };
        self.get_json(&format!("labels/{id}"), &[]).await
    }
}

#[async_trait]
impl MailService for GmailClient {
    async fn fetch_labels(&self) -> Result<Vec<Label>, EmailError> {
        let list: LabelListResponse = self.get_json("labels", &[]).await?;
        // The list endpoint omits counts and colors; fetch each label in full.
        let labels = list.labels.unwrap_or_default();
        try_join_all(labels.into_iter().map(|label| self.fetch_label(label))).await
    }

    async fn fetch_thread_summaries(
        &self,
        filter: &ThreadFilter,
    ) -> Result<Vec<ThreadSummary>, EmailError> {
        let mut query = vec![("maxResults", self.max_results.to_string())];
        for label_id in filter.label_ids.iter().flatten() {
            query.push(("labelIds", label_id.clone()));
        }

        let list: ThreadListResponse = self.get_json("threads", &query).await?;
        Ok(list.threads.unwrap_or_default())
    }

    async fn fetch_full_thread(&self, id: &str) -> Result<Thread, EmailError> {
        self.get_json(&format!("threads/{id}"), &[]).await
    }

    fn session(&self) -> &SessionNotifier {
        &self.session
    }
}

impl std::fmt::Debug for GmailClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let has_token = self
            .access_token
            .read()
            .map(|token| token.is_some())
            .unwrap_or(false);
        f.debug_struct("GmailClient")
            .field("api_base", &self.api_base)
            .field("max_results", &self.max_results)
            .field("access_token", &has_token.then_some("[REDACTED]"))
            .field("session", &self.session)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> GmailClient {
        let base = Url::parse("https://gmail.example.test/gmail/v1/users/me/").expect("url");
        GmailClient::new(&base, 10)
    }

    #[test]
    fn endpoints_are_joined_under_the_api_base() {
        assert_eq!(
            client().endpoint("threads/abc"),
            "https://gmail.example.test/gmail/v1/users/me/threads/abc"
        );
    }

    #[tokio::test]
    async fn requests_without_token_are_rejected_locally() {
        let client = client();
        let err = client.fetch_labels().await.expect_err("no token");
        assert!(matches!(err, EmailError::Unauthenticated));
        let err = client.fetch_full_thread("t1").await.expect_err("no token");
        assert!(matches!(err, EmailError::Unauthenticated));
    }

    #[test]
    fn sign_in_and_out_drive_the_session() {
        let client = client();
        assert!(!client.is_signed_in());
        client.sign_in("secret-token".to_string());
        assert!(client.is_signed_in());
        let debug = format!("{client:?}");
        assert!(!debug.contains("secret-token"));
        assert!(debug.contains("[REDACTED]"));
        client.sign_out();
        assert!(!client.is_signed_in());
        assert!(matches!(client.token(), Err(EmailError::Unauthenticated)));
    }
}
