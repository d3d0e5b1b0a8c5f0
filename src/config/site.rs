//! Site configuration (_config.yml)

use anyhow::{Context, Result};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Environment variable that overrides the configured base URL
pub const SITE_URL_ENV: &str = "SITE_URL";

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub description: String,
    pub author: String,
    pub language: String,
    pub timezone: String,

    // URL
    pub url: String,

    // Directory
    pub posts_dir: String,
    pub public_dir: String,
    pub static_dir: String,

    // Generated documents
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub sitemap: SitemapConfig,
    #[serde(default)]
    pub manifest: ManifestConfig,

    // Writing
    #[serde(default)]
    pub highlight: HighlightConfig,

    // Free-form values for the landing page templates
    #[serde(flatten)]
    pub extra: HashMap<String, serde_yaml::Value>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "Tech Portfolio".to_string(),
            description: "AI Research, Cybersecurity, CTF, and Infrastructure Development"
                .to_string(),
            author: "John Doe".to_string(),
            language: "en".to_string(),
            timezone: "UTC".to_string(),

            url: "https://example.com".to_string(),

            posts_dir: "posts".to_string(),
            public_dir: "public".to_string(),
            static_dir: "static".to_string(),

            feed: FeedConfig::default(),
            sitemap: SitemapConfig::default(),
            manifest: ManifestConfig::default(),

            highlight: HighlightConfig::default(),

            extra: HashMap::new(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content =
            fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
        let config: SiteConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse {:?}", path))?;
        Ok(config)
    }

    /// Apply the `SITE_URL` environment override, if set
    pub fn apply_env(&mut self) {
        self.apply_url_override(std::env::var(SITE_URL_ENV).ok());
    }

    /// Replace the base URL when an override value is present and non-empty
    pub fn apply_url_override(&mut self, value: Option<String>) {
        if let Some(url) = value.map(|v| v.trim().to_string()) {
            if !url.is_empty() {
                tracing::debug!("Base URL overridden to {}", url);
                self.url = url;
            }
        }
    }

    /// Base URL without a trailing slash
    pub fn base_url(&self) -> &str {
        self.url.trim_end_matches('/')
    }

    /// Time zone used to interpret dates written without an offset
    pub fn tz(&self) -> Tz {
        match self.timezone.trim() {
            "" => Tz::UTC,
            name => name.parse::<Tz>().unwrap_or_else(|_| {
                tracing::warn!("Unknown timezone {:?}, falling back to UTC", name);
                Tz::UTC
            }),
        }
    }

    /// Title of the RSS channel
    pub fn feed_title(&self) -> String {
        match &self.feed.title {
            Some(title) if !title.trim().is_empty() => title.clone(),
            _ => format!("{}: Blog", self.title),
        }
    }

    /// Description of the RSS channel
    pub fn feed_description(&self) -> &str {
        match &self.feed.description {
            Some(description) => description,
            None => &self.description,
        }
    }
}

/// RSS feed configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Output path relative to the site root
    pub path: String,
    pub title: Option<String>,
    pub description: Option<String>,
    /// Maximum number of items; all posts when unset
    pub limit: Option<usize>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            path: "rss.xml".to_string(),
            title: None,
            description: None,
            limit: None,
        }
    }
}

/// Sitemap change-frequency hint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeFreq {
    Always,
    Hourly,
    Daily,
    Weekly,
    Monthly,
    Yearly,
    Never,
}

impl ChangeFreq {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeFreq::Always => "always",
            ChangeFreq::Hourly => "hourly",
            ChangeFreq::Daily => "daily",
            ChangeFreq::Weekly => "weekly",
            ChangeFreq::Monthly => "monthly",
            ChangeFreq::Yearly => "yearly",
            ChangeFreq::Never => "never",
        }
    }
}

/// A static route listed in the sitemap
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteConfig {
    /// Path relative to the base URL; the empty string is the root
    pub path: String,
    pub changefreq: ChangeFreq,
    pub priority: f32,
}

/// Sitemap configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SitemapConfig {
    pub routes: Vec<RouteConfig>,
    pub post_changefreq: ChangeFreq,
    pub post_priority: f32,
}

impl Default for SitemapConfig {
    fn default() -> Self {
        Self {
            routes: vec![RouteConfig::home(), RouteConfig::blog()],
            post_changefreq: ChangeFreq::Monthly,
            post_priority: 0.5,
        }
    }
}

impl RouteConfig {
    fn home() -> Self {
        Self {
            path: String::new(),
            changefreq: ChangeFreq::Weekly,
            priority: 1.0,
        }
    }

    fn blog() -> Self {
        Self {
            path: "/blog".to_string(),
            changefreq: ChangeFreq::Weekly,
            priority: 0.6,
        }
    }

    /// Path with surrounding slashes removed, so `""` and `"/"` compare equal
    fn key(&self) -> &str {
        self.path.trim_matches('/')
    }
}

impl SitemapConfig {
    /// Static routes for the sitemap: the root and `/blog` always come first,
    /// taking their hints from `routes` when listed there, followed by the
    /// other configured routes without duplicates.
    pub fn static_routes(&self) -> Vec<RouteConfig> {
        let configured = |default: RouteConfig| {
            self.routes
                .iter()
                .find(|r| r.key() == default.key())
                .cloned()
                .unwrap_or(default)
        };

        let mut routes = vec![
            configured(RouteConfig::home()),
            configured(RouteConfig::blog()),
        ];
        for route in &self.routes {
            if !routes.iter().any(|r| r.key() == route.key()) {
                routes.push(route.clone());
            }
        }
        routes
    }
}

/// Web app manifest configuration, serialized as-is into manifest.webmanifest
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ManifestConfig {
    pub name: String,
    pub short_name: String,
    pub start_url: String,
    pub display: String,
    pub background_color: String,
    pub theme_color: String,
    pub icons: Vec<ManifestIcon>,
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self {
            name: "Tech Portfolio".to_string(),
            short_name: "Portfolio".to_string(),
            start_url: "/".to_string(),
            display: "standalone".to_string(),
            background_color: "#000000".to_string(),
            theme_color: "#000000".to_string(),
            icons: vec![ManifestIcon {
                src: "/placeholder-logo.png".to_string(),
                sizes: "512x512".to_string(),
                mime_type: "image/png".to_string(),
            }],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestIcon {
    pub src: String,
    pub sizes: String,
    #[serde(rename = "type")]
    pub mime_type: String,
}

/// Code highlighting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    pub enable: bool,
    pub theme: String,
    pub line_number: bool,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            enable: true,
            theme: "base16-ocean.dark".to_string(),
            line_number: false,
        }
    }
}
