//! URL composition and query-string building.

use crate::config::QueryParams;

/// Join a base URL and a path with exactly one separating slash.
///
/// An empty base returns the path unchanged; an empty path returns the
/// base. No other normalization is performed.
pub fn join_url(base: &str, path: &str) -> String {
    if base.is_empty() {
        return path.to_string();
    }
    if path.is_empty() {
        return base.to_string();
    }
    match (base.ends_with('/'), path.starts_with('/')) {
        (true, true) => format!("{}{}", base, &path[1..]),
        (false, false) => format!("{base}/{path}"),
        _ => format!("{base}{path}"),
    }
}

/// Append query parameters to a URL.
///
/// Entries with a `None` value are omitted; the rest are percent-encoded.
/// A query string already present on the URL is preserved and the new
/// parameters are appended; a fragment stays at the end.
pub fn append_query(url: &str, params: &QueryParams) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    let mut any = false;
    for (key, value) in params.iter() {
        if let Some(value) = value {
            serializer.append_pair(key, value);
            any = true;
        }
    }
    if !any {
        return url.to_string();
    }
    let encoded = serializer.finish();

    let (base, fragment) = match url.split_once('#') {
        Some((base, fragment)) => (base, Some(fragment)),
        None => (url, None),
    };

    let mut out = String::with_capacity(base.len() + encoded.len() + 2);
    out.push_str(base);
    if base.contains('?') {
        if !(base.ends_with('?') || base.ends_with('&')) {
            out.push('&');
        }
    } else {
        out.push('?');
    }
    out.push_str(&encoded);
    if let Some(fragment) = fragment {
        out.push('#');
        out.push_str(fragment);
    }
    out
}
