use cairn_core::Address;
use once_cell::sync::Lazy;
use regex::Regex;

static NAMED_ADDRESS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""?(.*?)"?\s?<(.*)>"#).expect("valid named address regex"));

/// Parses a single `From`-style header value.
///
/// Accepts `"Display Name" <user@host>`, `Display Name <user@host>`,
/// `<user@host>` and a bare `user@host`. Malformed input degrades to a best
/// effort address rather than failing: the whole value becomes the email and
/// its local part becomes the name. The display name is always cut at the
/// first `@` so a name that is itself an address still reads as a name.
pub fn parse_address(raw: &str) -> Address {
    let (name, email) = match NAMED_ADDRESS.captures(raw) {
        Some(captures) => {
            let email = captures.get(2).map_or("", |m| m.as_str());
            let name = captures
                .get(1)
                .map(|m| m.as_str())
                .filter(|name| !name.is_empty())
                .unwrap_or(email);
            (name, email)
        }
        None => (local_part(raw), raw),
    };

    Address {
        name: local_part(name).to_string(),
        email: email.to_string(),
    }
}

/// Parses a comma separated recipient header such as `To` or `Cc`.
pub fn parse_address_list(raw: &str) -> Vec<Address> {
    split_recipients(raw)
        .into_iter()
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(parse_address)
        .collect()
}

fn local_part(value: &str) -> &str {
    value.split('@').next().unwrap_or(value)
}

fn split_recipients(raw: &str) -> Vec<&str> {
    let mut entries = Vec::new();
    let mut in_quotes = false;
    let mut angle_depth = 0_u32;
    let mut start = 0;

    for (index, ch) in raw.char_indices() {
        match ch {
            '"' => in_quotes = !in_quotes,
            '<' if !in_quotes => angle_depth += 1,
            '>' if !in_quotes => angle_depth = angle_depth.saturating_sub(1),
            ',' if !in_quotes && angle_depth == 0 => {
                entries.push(&raw[start..index]);
                start = index + 1;
            }
            _ => {}
        }
    }
    entries.push(&raw[start..]);
    entries
}
