//! XML sitemap

use chrono::{DateTime, Utc};

use crate::config::{ChangeFreq, SiteConfig};
use crate::content::PostIndex;
use crate::helpers::{escape_xml, full_url_for, w3c_datetime};

/// One `<url>` element
#[derive(Debug, Clone, PartialEq)]
pub struct SitemapEntry {
    pub loc: String,
    pub lastmod: String,
    pub changefreq: ChangeFreq,
    pub priority: f32,
}

/// Builds the sitemap from the configured static routes plus one entry per post
pub struct Sitemap<'a> {
    config: &'a SiteConfig,
}

impl<'a> Sitemap<'a> {
    pub fn new(config: &'a SiteConfig) -> Self {
        Self { config }
    }

    /// Static routes first, then posts in enumeration order
    pub fn entries(&self, index: &PostIndex, now: DateTime<Utc>) -> Vec<SitemapEntry> {
        let config = self.config;
        let generated = w3c_datetime(&now);

        let mut entries: Vec<SitemapEntry> = config
            .sitemap
            .static_routes()
            .iter()
            .map(|route| SitemapEntry {
                loc: full_url_for(config, &route.path),
                lastmod: generated.clone(),
                changefreq: route.changefreq,
                priority: route.priority,
            })
            .collect();

        entries.extend(index.posts().iter().map(|post| SitemapEntry {
            loc: full_url_for(config, &post.path()),
            lastmod: post
                .date
                .map(|d| w3c_datetime(&d))
                .unwrap_or_else(|| generated.clone()),
            changefreq: config.sitemap.post_changefreq,
            priority: config.sitemap.post_priority,
        }));

        entries
    }

    pub fn render(&self, index: &PostIndex, now: DateTime<Utc>) -> String {
        let urls: Vec<String> = self
            .entries(index, now)
            .iter()
            .map(|entry| {
                format!(
                    "  <url>\n    <loc>{}</loc>\n    <lastmod>{}</lastmod>\n    <changefreq>{}</changefreq>\n    <priority>{}</priority>\n  </url>",
                    escape_xml(&entry.loc),
                    entry.lastmod,
                    entry.changefreq.as_str(),
                    format_priority(entry.priority)
                )
            })
            .collect();

        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
{}
</urlset>
"#,
            urls.join("\n")
        )
    }
}

/// Priority clamped to 0.0..=1.0, keeping at least one decimal place
fn format_priority(priority: f32) -> String {
    let priority = if priority.is_nan() {
        0.5
    } else {
        priority.clamp(0.0, 1.0)
    };
    let text = priority.to_string();
    if text.contains('.') {
        text
    } else {
        format!("{}.0", text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RouteConfig;
    use crate::content::{ContentLoader, IndexStatus};
    use chrono::TimeZone;
    use chrono_tz::Tz;
    use std::fs;
    use tempfile::TempDir;

    fn config() -> SiteConfig {
        SiteConfig {
            url: "https://example.com".to_string(),
            ..Default::default()
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_empty_index_has_static_routes() {
        let config = config();
        let index = PostIndex::empty(IndexStatus::Missing);
        let sitemap = Sitemap::new(&config);

        let entries = sitemap.entries(&index, now());
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].loc, "https://example.com");
        assert_eq!(entries[1].loc, "https://example.com/blog");
        assert!(entries[0].priority > entries[1].priority);

        let xml = sitemap.render(&index, now());
        assert!(xml.starts_with("<?xml"));
        assert!(xml.contains("<loc>https://example.com</loc>"));
        assert!(xml.contains("<priority>1.0</priority>"));
        assert!(xml.contains("<priority>0.6</priority>"));
        assert!(xml.contains("<lastmod>2025-06-01T12:00:00+00:00</lastmod>"));
        assert!(xml.trim_end().ends_with("</urlset>"));
    }

    #[test]
    fn test_custom_routes_keep_home_and_blog() {
        let mut config = config();
        config.sitemap.routes = vec![RouteConfig {
            path: "/about".to_string(),
            changefreq: ChangeFreq::Yearly,
            priority: 0.55,
        }];
        let index = PostIndex::empty(IndexStatus::Missing);

        let xml = Sitemap::new(&config).render(&index, now());
        assert_eq!(xml.matches("<url>").count(), 3);
        assert!(xml.contains("<loc>https://example.com</loc>"));
        assert!(xml.contains("<loc>https://example.com/blog</loc>"));
        assert!(xml.contains("<loc>https://example.com/about</loc>"));
        assert!(xml.contains("<priority>0.55</priority>"));
    }

    #[test]
    fn test_priority_format() {
        assert_eq!(format_priority(1.0), "1.0");
        assert_eq!(format_priority(0.85), "0.85");
        assert_eq!(format_priority(0.0), "0.0");
        assert_eq!(format_priority(3.0), "1.0");
        assert_eq!(format_priority(-1.0), "0.0");
    }

    #[test]
    fn test_one_entry_per_post() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("hello-world.md"), "---\ndate: 2024-01-01\n---\n").unwrap();
        fs::write(tmp.path().join("second.md"), "no metadata").unwrap();
        fs::write(tmp.path().join("third.md"), "").unwrap();
        let index = ContentLoader::from_dir(tmp.path(), Tz::UTC).scan();

        let config = config();
        let entries = Sitemap::new(&config).entries(&index, now());
        assert_eq!(entries.len(), 2 + 3);

        let hello = &entries[2];
        assert_eq!(hello.loc, "https://example.com/blog/hello-world");
        assert_eq!(hello.lastmod, "2024-01-01T00:00:00+00:00");
        assert_eq!(hello.changefreq, ChangeFreq::Monthly);
        assert!(entries[0].priority > hello.priority);

        assert_eq!(entries[3].lastmod, "2025-06-01T12:00:00+00:00");

        let xml = Sitemap::new(&config).render(&index, now());
        assert_eq!(xml.matches("<url>").count(), 5);
        assert!(xml.contains("<changefreq>monthly</changefreq>"));
        assert!(xml.contains("<priority>0.5</priority>"));
    }
}
