//! Vary matching between two request header snapshots.

use crate::http::HeaderFields;

/// Splits a `Vary` value into normalized header names.
///
/// Names are separated by commas and/or whitespace, lower-cased, and have
/// underscores turned into hyphens so `ACCEPT_LANGUAGE` and
/// `Accept-Language` name the same field.
pub fn vary_names(vary: &str) -> impl Iterator<Item = String> + '_ {
    vary.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|name| !name.is_empty())
        .map(|name| name.to_ascii_lowercase().replace('_', "-"))
}

/// Returns `true` if two request snapshots select the same representation
/// under `vary`.
///
/// An empty `vary` always matches. Otherwise every named header must carry
/// the same value list on both sides; a header absent on both sides matches.
///
/// # Examples
///
/// ```
/// use rttp_cache::cache::requests_match;
/// use rttp_cache::http::Headers;
///
/// let mut a = Headers::new();
/// a.insert("Accept-Language", "en");
/// let mut b = Headers::new();
/// b.insert("accept-language", "fr");
///
/// assert!(requests_match("", &a.to_fields(), &b.to_fields()));
/// assert!(!requests_match("Accept-Language", &a.to_fields(), &b.to_fields()));
/// ```
pub fn requests_match(vary: &str, a: &HeaderFields, b: &HeaderFields) -> bool {
    vary_names(vary).all(|name| a.get(&name) == b.get(&name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::Headers;

    fn fields(pairs: &[(&str, &str)]) -> HeaderFields {
        let mut headers = Headers::new();
        for (name, value) in pairs {
            headers.insert(*name, *value);
        }
        headers.to_fields()
    }

    #[test]
    fn empty_vary_always_matches() {
        assert!(requests_match("", &fields(&[("x", "1")]), &fields(&[("x", "2")])));
        assert!(requests_match(" , ", &fields(&[("x", "1")]), &fields(&[("x", "2")])));
    }

    #[test]
    fn equal_values_match() {
        let a = fields(&[("X", "1"), ("Y", "a")]);
        let b = fields(&[("x", "1"), ("y", "b")]);
        assert!(requests_match("X", &a, &b));
        assert!(!requests_match("X, Y", &a, &b));
    }

    #[test]
    fn separators_and_underscores() {
        let a = fields(&[("Accept-Encoding", "gzip"), ("Accept-Language", "en")]);
        let b = fields(&[("accept-encoding", "gzip"), ("accept-language", "en")]);
        assert!(requests_match("ACCEPT_ENCODING   accept-language,", &a, &b));
    }

    #[test]
    fn missing_on_one_side_fails() {
        let a = fields(&[("X", "1")]);
        let b = fields(&[]);
        assert!(!requests_match("X", &a, &b));
        assert!(requests_match("Z", &a, &b));
    }

    #[test]
    fn whole_value_list_is_compared() {
        let a = fields(&[("X", "1"), ("X", "2")]);
        let b = fields(&[("X", "1")]);
        assert!(!requests_match("X", &a, &b));
    }
}
