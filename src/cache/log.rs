//! Annotations attached to hit / miss / write log events.
//!
//! Both helpers are display-only and are skipped entirely when the `info`
//! level is disabled.

use url::form_urlencoded;

use super::vary::vary_names;
use crate::http::Headers;

/// Renders the request's values for the headers named by `vary`, as
/// `(Vary: accept-language=en, x=1)`. Empty when there is no Vary.
pub fn describe_vary(vary: &[String], request: &Headers) -> String {
    if vary.is_empty() {
        return String::new();
    }

    let spec = vary.join(", ");
    let present: Vec<String> = vary_names(&spec)
        .filter_map(|name| {
            let value = request.get(&name)?;
            Some(format!("{name}={value}"))
        })
        .collect();

    format!("(Vary: {})", present.join(", "))
}

/// Renders a sub-request fragment URI (`/_fragment?_path=...`) as
/// `FRAGMENT Controller::action(k=v, ...)`. Empty for ordinary URIs.
///
/// The `_path` query parameter is itself a URL-encoded query string holding
/// the `_controller` and its arguments.
pub fn describe_fragment(uri: &str) -> String {
    if !uri.contains("/_fragment") {
        return String::new();
    }

    let Some((_, query)) = uri.split_once('?') else {
        return String::new();
    };
    let query = query.split('#').next().unwrap_or_default();

    let Some(path) = form_urlencoded::parse(query.as_bytes())
        .find(|(name, _)| name == "_path")
        .map(|(_, value)| value.into_owned())
    else {
        return String::new();
    };

    let mut controller = String::new();
    let mut args = Vec::new();
    for (name, value) in form_urlencoded::parse(path.as_bytes()) {
        if name == "_controller" {
            controller = value.into_owned();
        } else {
            args.push(format!("{name}={value}"));
        }
    }

    format!("FRAGMENT {controller}({})", args.join(", "))
}
