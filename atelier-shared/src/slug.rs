/// URL slug derivation
///
/// Slugs are computed from a record's title/name field whenever that field
/// changes: lowercase, non-alphanumeric runs collapsed to single hyphens,
/// leading/trailing hyphens trimmed. The result is deterministic, so
/// re-slugifying the same title always yields the same slug. Uniqueness is
/// enforced at the storage layer, not here.
///
/// # Example
///
/// ```
/// use atelier_shared::slug::slugify;
///
/// assert_eq!(slugify("Cloud Migration"), "cloud-migration");
/// assert_eq!(slugify("  DevOps & SRE!  "), "devops-sre");
/// ```

/// Derives a URL-safe slug from a human-readable title.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_hyphen = false;

    for ch in title.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }

    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_title() {
        assert_eq!(slugify("Cloud Migration"), "cloud-migration");
    }

    #[test]
    fn test_collapses_non_alphanumeric_runs() {
        assert_eq!(slugify("DevOps & SRE -- Consulting"), "devops-sre-consulting");
        assert_eq!(slugify("a!!!b"), "a-b");
    }

    #[test]
    fn test_trims_leading_and_trailing_separators() {
        assert_eq!(slugify("  hello world  "), "hello-world");
        assert_eq!(slugify("---x---"), "x");
    }

    #[test]
    fn test_lowercases() {
        assert_eq!(slugify("UI/UX Design"), "ui-ux-design");
    }

    #[test]
    fn test_idempotent() {
        let once = slugify("Custom Web Development!");
        let twice = slugify(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_empty_and_symbol_only_titles() {
        assert_eq!(slugify(""), "");
        assert_eq!(slugify("!@#$%"), "");
    }

    #[test]
    fn test_digits_preserved() {
        assert_eq!(slugify("Top 10 Frameworks 2024"), "top-10-frameworks-2024");
    }
}
