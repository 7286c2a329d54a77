//! URL match patterns

/// Scheme wildcard every canonical pattern starts with
pub const WILDCARD_SCHEME: &str = "*://";

/// Canonical match pattern for a loosely typed entry.
///
/// Patterns that already start with `*://` are returned unchanged. Anything
/// else loses its leading `*`, `.` and `/` characters and is wrapped as
/// `*://*.<rest>/*`, so the result is always idempotent under this function.
pub fn normalize_pattern(input: &str) -> String {
    if input.starts_with(WILDCARD_SCHEME) {
        return input.to_string();
    }
    let rest = input.trim_start_matches(['*', '.', '/']);
    format!("*://*.{}/*", rest)
}

/// Whether a canonical pattern names a usable host
pub fn is_valid_pattern(pattern: &str) -> bool {
    let Some(rest) = pattern.strip_prefix(WILDCARD_SCHEME) else {
        return false;
    };
    let host = rest.split('/').next().unwrap_or_default();

    !host.is_empty()
        && host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '*'))
        && host.chars().any(|c| c.is_ascii_alphanumeric())
}

/// Reduce a typed website to its bare domain.
///
/// Accepts inputs such as `https://www.Example.com:8080/path`, returning
/// `example.com`. Returns `None` when no plausible host remains.
pub fn clean_domain(input: &str) -> Option<String> {
    let trimmed = input.trim().to_ascii_lowercase();
    let without_scheme = match trimmed.find("://") {
        Some(idx) => &trimmed[idx + 3..],
        None => trimmed.as_str(),
    };

    let host = without_scheme
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default();
    // Drop credentials and port
    let host = host.rsplit('@').next().unwrap_or_default();
    let host = host.split(':').next().unwrap_or_default();
    let host = host.strip_prefix("www.").unwrap_or(host);
    let host = host.trim_end_matches('.');

    let labels_ok = host.split('.').all(|label| {
        !label.is_empty()
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    });

    if host.contains('.') && labels_ok {
        Some(host.to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_domain_wrapped() {
        assert_eq!(normalize_pattern("facebook.com"), "*://*.facebook.com/*");
    }

    #[test]
    fn canonical_unchanged() {
        assert_eq!(normalize_pattern("*://*.x.com/*"), "*://*.x.com/*");
        assert_eq!(normalize_pattern("*://mail.x.com/inbox"), "*://mail.x.com/inbox");
    }

    #[test]
    fn leading_wildcards_stripped() {
        assert_eq!(normalize_pattern("*.reddit.com"), "*://*.reddit.com/*");
        assert_eq!(normalize_pattern("//./news.com"), "*://*.news.com/*");
    }

    #[test]
    fn normalize_is_idempotent() {
        let inputs = [
            "facebook.com",
            "*://*.x.com/*",
            "*.a.org",
            "",
            "...",
            "http://example.com",
            "sub.domain.co.uk/path",
            "*:/broken",
            "   spaced.com",
        ];
        for input in inputs {
            let once = normalize_pattern(input);
            assert_eq!(normalize_pattern(&once), once, "input: {:?}", input);
        }
    }

    #[test]
    fn pattern_validity() {
        assert!(is_valid_pattern("*://*.facebook.com/*"));
        assert!(is_valid_pattern("*://localhost/*"));
        assert!(!is_valid_pattern(&normalize_pattern("")));
        assert!(!is_valid_pattern(&normalize_pattern("...")));
        assert!(!is_valid_pattern("*://*.bad host.com/*"));
        assert!(!is_valid_pattern("facebook.com"));
    }

    #[test]
    fn clean_domain_strips_noise() {
        assert_eq!(clean_domain("https://www.Example.com:8080/a?b"), Some("example.com".into()));
        assert_eq!(clean_domain("  reddit.com/r/rust "), Some("reddit.com".into()));
        assert_eq!(clean_domain("user@news.ycombinator.com"), Some("news.ycombinator.com".into()));
        assert_eq!(clean_domain("twitch.tv."), Some("twitch.tv".into()));
    }

    #[test]
    fn clean_domain_rejects_junk() {
        assert_eq!(clean_domain(""), None);
        assert_eq!(clean_domain("localhost"), None);
        assert_eq!(clean_domain("not a site"), None);
        assert_eq!(clean_domain("bad..com"), None);
        assert_eq!(clean_domain("-x.com"), None);
    }
}
