//! robots.txt and manifest.webmanifest

use crate::config::SiteConfig;
use crate::helpers::full_url_for;

/// robots.txt allowing everything and pointing at the sitemap
pub fn robots_txt(config: &SiteConfig) -> String {
    format!(
        "User-agent: *\nAllow: /\nSitemap: {}\n",
        full_url_for(config, "/sitemap.xml")
    )
}

/// Web app manifest as pretty-printed JSON
pub fn manifest_json(config: &SiteConfig) -> String {
    serde_json::to_string_pretty(&config.manifest).unwrap_or_else(|e| {
        tracing::warn!("Failed to serialize manifest: {}", e);
        "{}".to_string()
    })
}
