//! URL helper functions

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::config::SiteConfig;

/// Characters escaped in a single path segment (RFC 3986 unreserved ones are kept)
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Site-relative path of a blog post
///
/// # Examples
/// ```ignore
/// post_path("hello world") // -> "/blog/hello%20world"
/// ```
pub fn post_path(slug: &str) -> String {
    format!("/blog/{}", encode_segment(slug))
}

/// Absolute URL for a site-relative path
///
/// # Examples
/// ```ignore
/// full_url_for(&config, "/blog") // -> "https://example.com/blog"
/// full_url_for(&config, "")      // -> "https://example.com"
/// ```
pub fn full_url_for(config: &SiteConfig, path: &str) -> String {
    let base = config.base_url();
    let path = path.trim_start_matches('/');

    if path.is_empty() {
        base.to_string()
    } else {
        format!("{}/{}", base, path)
    }
}

/// Percent-encode one path segment
pub fn encode_segment(segment: &str) -> String {
    utf8_percent_encode(segment, SEGMENT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> SiteConfig {
        SiteConfig {
            url: "https://example.com/".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_full_url_for() {
        let config = test_config();
        assert_eq!(full_url_for(&config, ""), "https://example.com");
        assert_eq!(full_url_for(&config, "/blog"), "https://example.com/blog");
        assert_eq!(
            full_url_for(&config, "blog/hello-world"),
            "https://example.com/blog/hello-world"
        );
    }

    #[test]
    fn test_post_path() {
        assert_eq!(post_path("hello-world"), "/blog/hello-world");
        assert_eq!(post_path("v1.2_notes~x"), "/blog/v1.2_notes~x");
        assert_eq!(post_path("a b&c"), "/blog/a%20b%26c");
    }
}
