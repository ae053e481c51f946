use crate::address::parse_address;
use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use cairn_core::{Address, Attachment, HeaderMap, MessagePart, MessagePartHeader, RawMessage};

const MULTIPART_MIXED: &str = "multipart/mixed";
const MULTIPART_ALTERNATIVE: &str = "multipart/alternative";
const TEXT_HTML: &str = "text/html";
const TEXT_PLAIN: &str = "text/plain";

/// URL-safe alphabet that accepts padded and unpadded payloads alike.
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Decodes a body payload (URL-safe base64) into text.
///
/// Standard-alphabet characters are folded into the URL-safe ones first, so
/// either encoding decodes. Invalid UTF-8 sequences are replaced rather than
/// rejected. Returns `None` only when the base64 itself is malformed.
pub fn decode_body_data(data: &str) -> Option<String> {
    let normalized = data
        .chars()
        .filter(|ch| !ch.is_ascii_whitespace())
        .map(|ch| match ch {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect::<String>();

    match URL_SAFE_LENIENT.decode(normalized.as_bytes()) {
        Ok(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
        Err(err) => {
            tracing::debug!("skipping undecodable body payload: {err}");
            None
        }
    }
}

/// Builds a header map with lower-cased names. When a name repeats, the last
/// value wins.
pub fn header_map(headers: &[MessagePartHeader]) -> HeaderMap {
    let mut map = HeaderMap::new();
    for header in headers {
        let Some(name) = header.name.as_deref() else {
            continue;
        };
        map.insert(
            name.to_ascii_lowercase(),
            header.value.clone().unwrap_or_default(),
        );
    }
    map
}

/// Everything a depth-first walk of a body tree yields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MimeWalk {
    pub from: Option<Address>,
    pub text_html: Option<String>,
    pub text_plain: Option<String>,
    pub attachments: Vec<Attachment>,
}

/// Walks `root` in pre-order, collecting bodies and attachment descriptors.
pub fn walk_parts(root: &MessagePart) -> MimeWalk {
    let mut walk = MimeWalk::default();
    visit(root, &mut walk);
    walk
}

fn visit(part: &MessagePart, walk: &mut MimeWalk) {
    if let Some(body) = &part.body {
        let headers = header_map(&part.headers);

        if walk.from.is_none() {
            walk.from = headers.get("from").map(|value| parse_address(value));
        }

        let disposition = headers
            .get("content-disposition")
            .map(String::as_str)
            .unwrap_or_default();
        let is_attachment = disposition.contains("attachment");
        let is_inline = disposition.contains("inline");

        if is_attachment || is_inline {
            walk.attachments.push(Attachment {
                inline: is_inline,
                filename: part.filename.clone(),
                mime_type: part.mime_type.clone(),
                size: body.size,
                attachment_id: body.attachment_id.clone(),
                headers,
            });
        } else {
            let mime_type = part.mime_type.as_deref().unwrap_or_default();
            let decoded = || body.data.as_deref().and_then(decode_body_data);
            if mime_type.contains(TEXT_HTML) {
                if let Some(html) = decoded() {
                    walk.text_html = Some(html);
                }
            } else if mime_type.contains(TEXT_PLAIN) {
                if let Some(text) = decoded() {
                    walk.text_plain = Some(text);
                }
            }
        }
    }

    for child in &part.parts {
        visit(child, walk);
    }
}

/// Resolves a single display body by dispatching on the root mime type.
///
/// Unlike [`walk_parts`] this only understands the common top-level shapes;
/// anything else resolves to `None`.
pub fn message_body(message: &RawMessage) -> Option<String> {
    let payload = message.payload.as_ref()?;
    match payload.mime_type.as_deref() {
        Some(MULTIPART_MIXED) => mixed_body(payload),
        Some(MULTIPART_ALTERNATIVE) => alternative_body(payload),
        Some(TEXT_PLAIN) => part_text(payload),
        other => {
            tracing::debug!(mime_type = ?other, "unknown body type");
            None
        }
    }
}

fn mixed_body(part: &MessagePart) -> Option<String> {
    part.child_with_mime_type(MULTIPART_ALTERNATIVE)
        .and_then(alternative_body)
}

fn alternative_body(part: &MessagePart) -> Option<String> {
    if let Some(html) = part.child_with_mime_type(TEXT_HTML).and_then(part_text) {
        return Some(html);
    }
    part.child_with_mime_type(TEXT_PLAIN).and_then(part_text)
}

fn part_text(part: &MessagePart) -> Option<String> {
    let data = part.body.as_ref()?.data.as_deref()?;
    if data.is_empty() {
        return None;
    }
    decode_body_data(data)
}
