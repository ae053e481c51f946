use chrono::{DateTime, Utc};

/// Formats an RFC 2822 date relative to `now`.
///
/// Dates within `window_days` read as minutes, hours or days ago. Older dates
/// are written out in full. Unparseable input yields `None`.
pub fn format_relative_date(raw: &str, now: DateTime<Utc>, window_days: i64) -> Option<String> {
    let date = match DateTime::parse_from_rfc2822(raw.trim()) {
        Ok(date) => date.with_timezone(&Utc),
        Err(err) => {
            tracing::debug!(raw, %err, "unparseable message date");
            return None;
        }
    };

    let elapsed = now.signed_duration_since(date);
    if elapsed.num_days() >= window_days {
        return Some(date.format("%B %-d, %Y").to_string());
    }
    if elapsed.num_hours() >= 24 {
        return Some(format!("{} days ago", elapsed.num_days()));
    }
    if elapsed.num_minutes() >= 60 {
        return Some(format!("{} hours ago", elapsed.num_hours()));
    }
    Some(format!("{} minutes ago", elapsed.num_minutes().max(0)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 20, 12, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    #[test]
    fn recent_dates_are_relative() {
        assert_eq!(
            format_relative_date("Wed, 20 Mar 2024 11:35:10 +0000", now(), 30).as_deref(),
            Some("24 minutes ago")
        );
        assert_eq!(
            format_relative_date("Wed, 20 Mar 2024 09:00:00 +0000", now(), 30).as_deref(),
            Some("3 hours ago")
        );
        assert_eq!(
            format_relative_date("Sun, 10 Mar 2024 12:00:00 +0000", now(), 30).as_deref(),
            Some("10 days ago")
        );
    }

    #[test]
    fn offsets_are_normalized() {
        assert_eq!(
            format_relative_date("Wed, 20 Mar 2024 13:00:00 +0200", now(), 30).as_deref(),
            Some("1 hours ago")
        );
    }

    #[test]
    fn old_dates_are_written_in_full() {
        assert_eq!(
            format_relative_date("Mon, 1 Jan 2024 08:00:00 +0000", now(), 30).as_deref(),
            Some("January 1, 2024")
        );
    }

    #[test]
    fn future_dates_clamp_to_zero_minutes() {
        assert_eq!(
            format_relative_date("Wed, 20 Mar 2024 12:05:00 +0000", now(), 30).as_deref(),
            Some("0 minutes ago")
        );
    }

    #[test]
    fn garbage_is_ignored() {
        assert_eq!(format_relative_date("yesterday-ish", now(), 30), None);
    }
}
