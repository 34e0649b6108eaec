//! Slug derivation for brand identifiers
//!
//! Slugs are the public identifier for brand rows and appear in URLs,
//! so derivation must be deterministic and collision behavior explicit
//! (callers retry with a domain-derived slug on UNIQUE violation).

/// Derive a URL-safe slug from a display name or domain
///
/// Lowercases, maps every non-alphanumeric run to a single `-`, and
/// trims leading/trailing dashes. Returns "brand" for input with no
/// alphanumeric content at all, so callers never get an empty slug.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut last_dash = true; // suppress leading dash

    for c in input.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }

    while slug.ends_with('-') {
        slug.pop();
    }

    if slug.is_empty() {
        "brand".to_string()
    } else {
        slug
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_simple_name() {
        assert_eq!(slugify("Acme"), "acme");
    }

    #[test]
    fn test_slugify_collapses_separator_runs() {
        assert_eq!(slugify("Acme  Cloud -- Platform"), "acme-cloud-platform");
    }

    #[test]
    fn test_slugify_domain() {
        assert_eq!(slugify("acme.com"), "acme-com");
    }

    #[test]
    fn test_slugify_strips_edges() {
        assert_eq!(slugify("  --Acme-- "), "acme");
    }

    #[test]
    fn test_slugify_empty_input_falls_back() {
        assert_eq!(slugify("!!!"), "brand");
        assert_eq!(slugify(""), "brand");
    }
}
