//! `Cache-Control` directive parsing and HTTP-date handling.
//!
//! Only what freshness arithmetic needs: directive lookup by name and parsing
//! of the `Date` / `Expires` field values (RFC 9111 §5.2, RFC 9110 §5.6.7).

use chrono::{DateTime, NaiveDateTime, Utc};

/// Largest delta-seconds value honored (RFC 9111 §1.2.2); bigger values are
/// capped to it.
pub const MAX_DELTA_SECONDS: i64 = 2_147_483_648;

/// Parsed `Cache-Control` header value.
///
/// Directive names are matched case-insensitively; a quoted argument has its
/// quotes removed.
///
/// # Examples
///
/// ```
/// use rttp_cache::http::CacheControl;
///
/// let cc = CacheControl::parse("public, max-age=60, s-maxage=\"120\"");
/// assert!(cc.contains("public"));
/// assert_eq!(cc.seconds("max-age"), Some(60));
/// assert_eq!(cc.seconds("s-maxage"), Some(120));
/// ```
#[derive(Debug, Clone, Default)]
pub struct CacheControl {
    directives: Vec<(String, Option<String>)>,
}

impl CacheControl {
    /// Parses a comma-separated directive list. Malformed items are skipped.
    pub fn parse(value: &str) -> Self {
        let directives = value
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(|item| match item.split_once('=') {
                Some((name, arg)) => (
                    name.trim().to_ascii_lowercase(),
                    Some(arg.trim().trim_matches('"').to_owned()),
                ),
                None => (item.to_ascii_lowercase(), None),
            })
            .collect();
        Self { directives }
    }

    /// Returns `true` if the directive is present, with or without an argument.
    pub fn contains(&self, name: &str) -> bool {
        self.directives
            .iter()
            .any(|(n, _)| n.eq_ignore_ascii_case(name))
    }

    /// Returns the argument of `name` as delta-seconds.
    ///
    /// Only non-negative integers are accepted; values past
    /// [`MAX_DELTA_SECONDS`], including ones too long for any integer type,
    /// are capped.
    pub fn seconds(&self, name: &str) -> Option<i64> {
        self.directives
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .and_then(|(_, arg)| arg.as_deref())
            .and_then(delta_seconds)
    }
}

/// Parses a delta-seconds value: one or more ASCII digits.
pub fn delta_seconds(value: &str) -> Option<i64> {
    let value = value.trim();
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(
        value
            .parse::<i64>()
            .map_or(MAX_DELTA_SECONDS, |secs| secs.min(MAX_DELTA_SECONDS)),
    )
}

/// Parses an HTTP-date in any of the three formats RFC 9110 accepts.
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();

    // IMF-fixdate, and anything else RFC 2822 shaped ("GMT" zone included).
    if let Ok(dt) = DateTime::parse_from_rfc2822(value) {
        return Some(dt.with_timezone(&Utc));
    }

    // Obsolete RFC 850: "Sunday, 06-Nov-94 08:49:37 GMT"
    if let Some(naive) = value
        .strip_suffix(" GMT")
        .and_then(|v| NaiveDateTime::parse_from_str(v, "%A, %d-%b-%y %H:%M:%S").ok())
    {
        return Some(naive.and_utc());
    }

    // asctime: "Sun Nov  6 08:49:37 1994", day space-padded
    let collapsed = value.split_whitespace().collect::<Vec<_>>().join(" ");
    NaiveDateTime::parse_from_str(&collapsed, "%a %b %d %H:%M:%S %Y")
        .ok()
        .map(|naive| naive.and_utc())
}
