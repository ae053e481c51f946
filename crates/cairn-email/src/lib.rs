mod address;
mod error;
mod extract;
mod fixtures;
mod gmail;
mod labels;
mod mime;
mod quote;
mod service;
mod session;
mod thread;

pub use address::{parse_address, parse_address_list};
pub use error::EmailError;
pub use extract::parse_message;
pub use fixtures::FixtureMailService;
pub use gmail::GmailClient;
pub use labels::{index_labels, visible_labels, LabelDirectory, LabelMap};
pub use mime::{decode_body_data, header_map, message_body, walk_parts, MimeWalk};
pub use quote::{split_quoted, QuotedBody};
pub use service::{MailService, ThreadFilter};
pub use session::SessionNotifier;
pub use thread::{metadata_for_messages, thread_metadata};
