//! Domain normalization.
//!
//! Users paste whatever is in their address bar. These helpers reduce such
//! input to the bare host name that goes into the hosts file. No syntax
//! validation is performed: any non-empty result is accepted.

use indexmap::IndexSet;

/// Normalize one raw entry to a bare, lower-cased domain.
///
/// Strips a leading `http://` or `https://` (any case), drops everything from
/// the first `/`, trims whitespace and lower-cases. Returns `None` when nothing
/// is left.
pub fn normalize(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let without_scheme = strip_scheme(trimmed);
    let host = match without_scheme.find('/') {
        Some(idx) => &without_scheme[..idx],
        None => without_scheme,
    };
    let host = host.trim().to_lowercase();
    if host.is_empty() {
        None
    } else {
        Some(host)
    }
}

/// Normalize a list, dropping empty results and duplicates while keeping the
/// order of first appearance.
pub fn normalize_all<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    raw.into_iter()
        .filter_map(|s| normalize(s.as_ref()))
        .collect::<IndexSet<_>>()
        .into_iter()
        .collect()
}

fn strip_scheme(s: &str) -> &str {
    for scheme in ["https://", "http://"] {
        if s.len() >= scheme.len()
            && s.is_char_boundary(scheme.len())
            && s[..scheme.len()].eq_ignore_ascii_case(scheme)
        {
            return &s[scheme.len()..];
        }
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn strips_scheme_and_path() {
        assert_eq!(normalize("https://twitter.com/home").as_deref(), Some("twitter.com"));
        assert_eq!(normalize("http://news.ycombinator.com/").as_deref(), Some("news.ycombinator.com"));
        assert_eq!(normalize("facebook.com").as_deref(), Some("facebook.com"));
    }

    #[test]
    fn scheme_is_case_insensitive() {
        assert_eq!(normalize("HTTPS://Reddit.COM/r/rust").as_deref(), Some("reddit.com"));
        assert_eq!(normalize("Http://example.org").as_deref(), Some("example.org"));
    }

    #[test]
    fn trims_whitespace() {
        assert_eq!(normalize("   youtube.com  ").as_deref(), Some("youtube.com"));
        assert_eq!(normalize("  https://youtube.com /watch").as_deref(), Some("youtube.com"));
    }

    #[test]
    fn empty_results_are_discarded() {
        assert_eq!(normalize(""), None);
        assert_eq!(normalize("   "), None);
        assert_eq!(normalize("https://"), None);
        assert_eq!(normalize("/path/only"), None);
    }

    #[test]
    fn only_leading_scheme_is_stripped() {
        // No syntax validation beyond prefix/suffix stripping.
        assert_eq!(normalize("ftp://files.example.com").as_deref(), Some("ftp:"));
        assert_eq!(normalize("not a domain").as_deref(), Some("not a domain"));
    }

    #[test]
    fn normalize_all_dedups_in_first_appearance_order() {
        let out = normalize_all([
            "facebook.com",
            "https://twitter.com/home",
            "FACEBOOK.com",
            "",
            "http://twitter.com",
            "reddit.com",
        ]);
        assert_eq!(out, vec!["facebook.com", "twitter.com", "reddit.com"]);
    }

    proptest! {
        #[test]
        fn normalized_output_is_bare(raw in "\\PC{0,40}") {
            if let Some(d) = normalize(&raw) {
                prop_assert!(!d.is_empty());
                prop_assert!(!d.contains('/'));
                prop_assert_eq!(d.trim(), d.as_str());
                prop_assert_eq!(d.to_lowercase(), d.clone());
            }
        }

        #[test]
        fn normalize_is_idempotent(raw in "[a-zA-Z0-9./: -]{0,40}") {
            if let Some(d) = normalize(&raw) {
                prop_assert_eq!(normalize(&d), Some(d.clone()));
            }
        }
    }
}
