use crate::mime::header_map;
use cairn_core::{RawMessage, Thread, ThreadMetadata};

pub fn thread_metadata(thread: &Thread) -> ThreadMetadata {
    metadata_for_messages(&thread.messages)
}

/// Aggregates display metadata over messages in delivery order.
///
/// The subject comes from the first message so reply prefixes never leak
/// into the thread title. Sender, recipients and date come from the last
/// message. Labels are the union over every message.
pub fn metadata_for_messages(messages: &[RawMessage]) -> ThreadMetadata {
    let mut metadata = ThreadMetadata::default();

    if let Some(first) = messages.first() {
        let headers = first
            .payload
            .as_ref()
            .map(|payload| header_map(&payload.headers))
            .unwrap_or_default();
        metadata.subject = headers.get("subject").cloned();
    }

    if let Some(last) = messages.last() {
        let mut headers = last
            .payload
            .as_ref()
            .map(|payload| header_map(&payload.headers))
            .unwrap_or_default();
        metadata.date = headers.swap_remove("date");
        metadata.from = headers.swap_remove("from");
        metadata.to = headers.swap_remove("to");
    }

    for message in messages {
        metadata
            .label_ids
            .extend(message.label_ids.iter().flatten().cloned());
    }

    metadata
}
