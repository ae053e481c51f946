use cairn_core::{Address, UserProfile};
use cairn_email::QuotedBody;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavItem {
    pub label_id: String,
    pub title: String,
    pub icon: &'static str,
    pub color: Option<String>,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRow {
    pub id: Option<String>,
    pub from_name: Option<String>,
    pub open: bool,
    /// Shown while the message is collapsed.
    pub snippet: Option<String>,
    /// Present only while the message is open.
    pub body: Option<QuotedBody>,
    pub attachments: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadRow {
    pub id: String,
    pub snippet: Option<String>,
    pub from: Option<Address>,
    pub to: Vec<Address>,
    pub date: Option<String>,
    pub subject: Option<String>,
    /// Names of the user labels on any message in the thread.
    pub labels: Vec<String>,
    pub unread: bool,
    pub open: bool,
    pub loaded: bool,
    pub messages: Vec<MessageRow>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppView {
    pub signed_in: bool,
    pub show_login: bool,
    pub title: String,
    pub profile: Option<UserProfile>,
    pub nav: Vec<NavItem>,
    pub label_nav: Vec<NavItem>,
    pub threads: Vec<ThreadRow>,
}
