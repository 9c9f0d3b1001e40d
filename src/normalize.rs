//! URL normalization and validation.
//!
//! The single gate every URL passes through before it can be registered.
//! Deterministic and side-effect free; hosts are kept as typed (no
//! case-folding, no punycode) and query strings are dropped.

/// Normalize and validate a URL for monitoring.
///
/// Rules, in order: trim whitespace, prepend `https://` when no
/// `http://`/`https://` prefix is present, require a host that contains a
/// dot and no whitespace, rebuild as `scheme://authority[path]` and strip
/// trailing slashes. Returns `None` for anything invalid.
pub fn normalize_url(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    // auto add scheme
    let with_scheme = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };

    let (scheme, rest) = with_scheme.split_once("://")?;
    if scheme != "http" && scheme != "https" {
        return None;
    }

    // The authority runs to the first '/', '?' or '#'; query and fragment
    // are not carried into the normalized form.
    let (authority, remainder) = match rest.find(['/', '?', '#']) {
        Some(i) => (&rest[..i], &rest[i..]),
        None => (rest, ""),
    };

    if authority.is_empty()
        || authority.contains(char::is_whitespace)
        || !authority.contains('.')
    {
        return None;
    }

    let path = if remainder.starts_with('/') {
        match remainder.find(['?', '#']) {
            Some(i) => &remainder[..i],
            None => remainder,
        }
    } else {
        ""
    };

    let normalized = format!("{scheme}://{authority}{path}");
    Some(normalized.trim_end_matches('/').to_string())
}
