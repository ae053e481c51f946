use crate::MessageRow;
use cairn_core::{ParsedMessage, RawMessage};
use cairn_email::{parse_message, split_quoted, QuotedBody};

/// One message inside an open thread.
#[derive(Debug, Clone)]
pub struct MessageView {
    parsed: ParsedMessage,
    open: bool,
}

impl MessageView {
    /// The last message of a thread starts open, as does any unread message
    /// or one that carries no label list at all.
    pub fn new(message: &RawMessage, index: usize, total: usize) -> Self {
        let parsed = parse_message(message);
        let open = index + 1 == total || message.label_ids.is_none() || parsed.is_unread();
        Self { parsed, open }
    }

    pub fn id(&self) -> Option<&str> {
        self.parsed.id.as_deref()
    }

    pub fn parsed(&self) -> &ParsedMessage {
        &self.parsed
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn set_open(&mut self, open: bool) {
        self.open = open;
    }

    pub fn toggle(&mut self) -> bool {
        self.open = !self.open;
        self.open
    }

    pub fn row(&self) -> MessageRow {
        MessageRow {
            id: self.parsed.id.clone(),
            from_name: self.parsed.from.as_ref().map(|from| from.name.clone()),
            open: self.open,
            snippet: self.parsed.snippet.clone(),
            body: self.open.then(|| self.body()).flatten(),
            attachments: self
                .parsed
                .attachments
                .iter()
                .filter(|attachment| !attachment.inline)
                .filter_map(|attachment| attachment.filename.clone())
                .filter(|name| !name.is_empty())
                .collect(),
        }
    }

    fn body(&self) -> Option<QuotedBody> {
        match self.parsed.text_html.as_deref() {
            Some(html) if !html.is_empty() => Some(split_quoted(html)),
            _ => self.parsed.text_plain.as_ref().map(|plain| QuotedBody {
                visible: plain.clone(),
                quoted: None,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{html_message, plain_message};

    #[test]
    fn last_message_starts_open() {
        let message = plain_message("m1", &["INBOX"], "Jane <jane@x.com>", "hello");
        assert!(!MessageView::new(&message, 0, 2).is_open());
        assert!(MessageView::new(&message, 1, 2).is_open());
    }

    #[test]
    fn unread_or_unlabelled_messages_start_open() {
        let unread = plain_message("m1", &["INBOX", "UNREAD"], "Jane <jane@x.com>", "hi");
        assert!(MessageView::new(&unread, 0, 3).is_open());

        let mut unlabelled = plain_message("m2", &[], "Jane <jane@x.com>", "hi");
        assert!(!MessageView::new(&unlabelled, 0, 3).is_open());
        unlabelled.label_ids = None;
        assert!(MessageView::new(&unlabelled, 0, 3).is_open());
    }

    #[test]
    fn collapsed_rows_hide_the_body() {
        let message = plain_message("m1", &["INBOX"], "\"Jane Doe\" <jane@x.com>", "body text");
        let mut view = MessageView::new(&message, 0, 2);
        let row = view.row();
        assert_eq!(row.from_name.as_deref(), Some("Jane Doe"));
        assert!(row.body.is_none());

        assert!(view.toggle());
        let body = view.row().body.expect("open body");
        assert_eq!(body.visible, "body text");
        assert!(body.quoted.is_none());
    }

    #[test]
    fn html_bodies_are_split_at_the_quote() {
        let message = html_message(
            "m1",
            "<p>Reply</p><div class=\"gmail_quote\">On Monday someone wrote</div>",
        );
        let row = MessageView::new(&message, 0, 1).row();
        let body = row.body.expect("open body");
        assert_eq!(body.visible, "<p>Reply</p>");
        assert!(body.quoted.is_some());
    }
}
