use crate::keys::{client_from, directory_from, label_ids_from, Selection, SharedSelection, ViewKey};
use crate::{AppView, NavItem, ThreadRow, ThreadView};
use cairn_cache::{CachedTask, Host, Identity, RetryPolicy};
use cairn_core::{Label, ThreadSummary, UserProfile};
use cairn_email::{visible_labels, EmailError, LabelDirectory, LabelMap, MailService, ThreadFilter};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Navigation entries shown above the user's own labels.
pub const BUILT_IN_LABELS: [(&str, &str, &str); 7] = [
    ("INBOX", "Inbox", "inbox"),
    ("STARRED", "Starred", "star"),
    ("SENT", "Sent", "send"),
    ("all_mail", "All Mail", "email"),
    ("TRASH", "Trash", "delete"),
    ("SPAM", "Spam", "report"),
    ("DRAFT", "Drafts", "drafts"),
];

pub(crate) const FETCH_RETRY: RetryPolicy = RetryPolicy::OnNextGet { max_attempts: 3 };

#[derive(Clone)]
struct LoadedLabels {
    labels: Arc<Vec<Label>>,
    by_id: Arc<LabelMap>,
}

/// Owns the application's cache cells and turns them into an [`AppView`].
///
/// Labels depend on the attached client; the thread list depends on the
/// client, the selected label ids and the refresh revision. Each listed
/// thread gets a [`ThreadView`] that is reused across renders while its
/// history id stays the same.
pub struct AppCoordinator {
    host: Arc<dyn Host>,
    selection: SharedSelection,
    labels: CachedTask<LoadedLabels, ViewKey>,
    threads: CachedTask<Arc<Vec<ThreadSummary>>, ViewKey>,
    thread_views: HashMap<String, ThreadView>,
    profile: Option<UserProfile>,
    window_days: i64,
}

impl AppCoordinator {
    pub fn new(host: Arc<dyn Host>, default_label_ids: Vec<String>, window_days: i64) -> Self {
        let selection = SharedSelection::new(Selection::new(default_label_ids));

        let labels_selection = selection.clone();
        let labels = CachedTask::new("labels", Arc::clone(&host), |deps: Vec<ViewKey>| async move {
            let directory = directory_from(&deps)?;
            let labels = directory.labels().await?;
            let by_id = directory.label_map().await?;
            Ok::<_, EmailError>(LoadedLabels { labels, by_id })
        })
        .with_deps(move || {
            let selection = labels_selection.read();
            let directory = selection.directory.as_ref()?;
            Some(vec![
                ViewKey::Directory(Identity::new(Arc::clone(directory))),
                ViewKey::SignIn(selection.sign_ins.load(Ordering::SeqCst)),
            ])
        })
        .with_retry(FETCH_RETRY);

        let threads_selection = selection.clone();
        let threads = CachedTask::new(
            "threads",
            Arc::clone(&host),
            |deps: Vec<ViewKey>| async move {
                let client = client_from(&deps)?;
                let filter = ThreadFilter::labels(&label_ids_from(&deps));
                let summaries = client.fetch_thread_summaries(&filter).await?;
                tracing::debug!(count = summaries.len(), "thread summaries fetched");
                Ok::<_, EmailError>(Arc::new(summaries))
            },
        )
        .with_deps(move || {
            let selection = threads_selection.read();
            let mut keys = selection.client_keys()?;
            keys.push(ViewKey::LabelIds(selection.label_ids.clone()));
            keys.push(ViewKey::Revision(selection.revision));
            Some(keys)
        })
        .with_retry(FETCH_RETRY);

        Self {
            host,
            selection,
            labels,
            threads,
            thread_views: HashMap::new(),
            profile: None,
            window_days,
        }
    }

    /// Use `client` for every fetch from now on.
    ///
    /// Each later sign-in on the client reloads labels and threads.
    pub fn attach_client(&mut self, client: Arc<dyn MailService>) {
        let sign_ins = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&sign_ins);
        let host = Arc::clone(&self.host);
        client.session().on_signed_in_change(move |signed_in| {
            if signed_in {
                counter.fetch_add(1, Ordering::SeqCst);
            }
            host.request_update();
        });

        {
            let mut selection = self.selection.write();
            selection.directory = Some(Arc::new(LabelDirectory::new(Arc::clone(&client))));
            selection.client = Some(client);
            selection.sign_ins = sign_ins;
        }
        self.thread_views.clear();
        tracing::info!("mail client attached");
        self.host.request_update();
    }

    pub fn select_label(&mut self, label_id: impl Into<String>) {
        let label_id = label_id.into();
        tracing::info!(%label_id, "switching label");
        self.selection.write().label_ids = vec![label_id];
        self.host.request_update();
    }

    pub fn label_ids(&self) -> Vec<String> {
        self.selection.read().label_ids.clone()
    }

    /// Reload the thread list on the next render. Threads whose full fetch
    /// failed try again.
    pub fn refresh(&mut self) {
        self.selection.write().revision += 1;
        for view in self.thread_views.values_mut() {
            view.retry_failed();
        }
    }

    pub fn set_profile(&mut self, profile: Option<UserProfile>) {
        self.profile = profile;
    }

    pub fn is_signed_in(&self) -> bool {
        self.selection.read().is_signed_in()
    }

    pub fn toggle_thread(&mut self, thread_id: &str) -> Option<bool> {
        self.thread_views.get_mut(thread_id).map(ThreadView::toggle)
    }

    pub fn toggle_message(&mut self, thread_id: &str, message_id: &str) -> Option<bool> {
        self.thread_views
            .get_mut(thread_id)?
            .toggle_message(message_id)
    }

    pub fn thread_view(&self, thread_id: &str) -> Option<&ThreadView> {
        self.thread_views.get(thread_id)
    }

    /// Cells are only consulted while signed in, so nothing is fetched for a
    /// signed-out session.
    pub fn render(&mut self, now: DateTime<Utc>) -> AppView {
        let signed_in = self.is_signed_in();
        let (labels, summaries) = if signed_in {
            (self.labels.get(), self.threads.get())
        } else {
            (None, None)
        };

        let selected = self.label_ids();
        let nav: Vec<NavItem> = BUILT_IN_LABELS
            .iter()
            .map(|(id, title, icon)| NavItem {
                label_id: id.to_string(),
                title: title.to_string(),
                icon,
                color: None,
                selected: selected.iter().any(|label| label == id),
            })
            .collect();
        let label_nav = labels
            .as_ref()
            .map(|loaded| user_nav(&loaded.labels, &selected))
            .unwrap_or_default();
        let title = nav
            .iter()
            .chain(&label_nav)
            .find(|item| item.selected)
            .map(|item| item.title.clone())
            .or_else(|| selected.first().cloned())
            .unwrap_or_default();

        let threads = match summaries {
            Some(summaries) => {
                let by_id = labels.as_ref().map(|loaded| loaded.by_id.as_ref());
                self.thread_rows(&summaries, by_id, now)
            }
            None => Vec::new(),
        };

        AppView {
            signed_in,
            show_login: !signed_in,
            title,
            profile: self.profile.clone(),
            nav,
            label_nav,
            threads,
        }
    }

    fn thread_rows(
        &mut self,
        summaries: &[ThreadSummary],
        labels: Option<&LabelMap>,
        now: DateTime<Utc>,
    ) -> Vec<ThreadRow> {
        let mut previous = std::mem::take(&mut self.thread_views);
        let mut rows = Vec::with_capacity(summaries.len());

        for summary in summaries {
            let Some(id) = summary.id.clone() else {
                tracing::debug!("skipping thread summary without id");
                continue;
            };
            let mut view = match previous.remove(&id) {
                Some(view) if view.summary().history_id == summary.history_id => view,
                stale => {
                    let mut view = ThreadView::new(
                        id.clone(),
                        summary.clone(),
                        Arc::clone(&self.host),
                        self.selection.clone(),
                    );
                    if let Some(stale) = stale {
                        view.set_open(stale.is_open());
                    }
                    view
                }
            };
            rows.push(view.row(labels, now, self.window_days));
            self.thread_views.insert(id, view);
        }
        rows
    }
}

fn user_nav(labels: &[Label], selected: &[String]) -> Vec<NavItem> {
    visible_labels(labels)
        .into_iter()
        .filter_map(|label| {
            let id = label.id?;
            Some(NavItem {
                title: label.name.unwrap_or_else(|| id.clone()),
                icon: "label",
                color: label.color.map(|color| color.background_color),
                selected: selected.contains(&id),
                label_id: id,
            })
        })
        .collect()
}

impl std::fmt::Debug for AppCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppCoordinator")
            .field("labels", &self.labels)
            .field("threads", &self.threads)
            .field("thread_views", &self.thread_views.len())
            .finish()
    }
}
