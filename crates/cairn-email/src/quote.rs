use once_cell::sync::Lazy;
use regex::Regex;

static GMAIL_QUOTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<div[^>]*class="[^"]*\bgmail_quote\b[^"]*"[^>]*>"#)
        .expect("valid gmail quote regex")
});

/// An HTML body split into the part worth showing and the quoted history.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuotedBody {
    pub visible: String,
    pub quoted: Option<String>,
}

/// Sanitizes `html` and splits it at the first Gmail quote block.
pub fn split_quoted(html: &str) -> QuotedBody {
    let cleaned = ammonia::Builder::default()
        .add_generic_attributes(&["class"])
        .clean(html)
        .to_string();

    match GMAIL_QUOTE.find(&cleaned) {
        Some(found) => QuotedBody {
            visible: cleaned[..found.start()].trim_end().to_string(),
            quoted: Some(cleaned[found.start()..].to_string()),
        },
        None => QuotedBody {
            visible: cleaned,
            quoted: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_at_first_quote_block() {
        let html = r#"<p>Sounds good</p><div class="gmail_quote gmail_quote_container"><p>Earlier</p></div>"#;
        let body = split_quoted(html);
        assert_eq!(body.visible, "<p>Sounds good</p>");
        let quoted = body.quoted.expect("quoted part");
        assert!(quoted.starts_with("<div class=\"gmail_quote"));
        assert!(quoted.contains("Earlier"));
    }

    #[test]
    fn body_without_quote_is_kept_whole() {
        let body = split_quoted("<p>Hello</p>");
        assert_eq!(body.visible, "<p>Hello</p>");
        assert!(body.quoted.is_none());
    }

    #[test]
    fn scripts_are_stripped() {
        let body = split_quoted("<p>Hi</p><script>alert(1)</script>");
        assert!(!body.visible.contains("script"));
        assert!(body.visible.contains("Hi"));
    }

    #[test]
    fn similar_class_names_do_not_split() {
        let body = split_quoted(r#"<div class="not_gmail_quoted">x</div>"#);
        assert!(body.quoted.is_none());
    }
}
