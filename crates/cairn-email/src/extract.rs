use crate::mime::{header_map, walk_parts, MimeWalk};
use cairn_core::{ParsedMessage, RawMessage};

/// Flattens one raw message into its render-ready form.
///
/// Extraction is pure and cheap; callers re-run it whenever the underlying
/// message changes instead of caching the result.
pub fn parse_message(message: &RawMessage) -> ParsedMessage {
    let headers = message
        .payload
        .as_ref()
        .map(|payload| header_map(&payload.headers))
        .unwrap_or_default();

    let MimeWalk {
        from,
        text_html,
        text_plain,
        attachments,
    } = message.payload.as_ref().map(walk_parts).unwrap_or_default();

    ParsedMessage {
        id: message.id.clone(),
        thread_id: message.thread_id.clone(),
        label_ids: message.label_ids.iter().flatten().cloned().collect(),
        from,
        snippet: message.snippet.clone(),
        history_id: message.history_id.clone(),
        internal_date: message.internal_date.clone(),
        headers,
        text_html,
        text_plain,
        attachments,
    }
}
