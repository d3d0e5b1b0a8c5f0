//! RSS 2.0 feed

use chrono::{DateTime, Utc};

use crate::config::SiteConfig;
use crate::content::PostIndex;
use crate::helpers::{escape_xml, full_url_for, rfc2822};

/// Builds the blog's RSS 2.0 document
pub struct RssFeed<'a> {
    config: &'a SiteConfig,
}

impl<'a> RssFeed<'a> {
    pub fn new(config: &'a SiteConfig) -> Self {
        Self { config }
    }

    /// Render the feed. `now` stands in for posts without a date.
    pub fn render(&self, index: &PostIndex, now: DateTime<Utc>) -> String {
        let config = self.config;
        let mut feed = String::new();

        feed.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\" ?>\n");
        feed.push_str("<rss version=\"2.0\">\n");
        feed.push_str("  <channel>\n");
        feed.push_str(&format!(
            "    <title>{}</title>\n",
            escape_xml(&config.feed_title())
        ));
        feed.push_str(&format!(
            "    <link>{}</link>\n",
            escape_xml(&full_url_for(config, "/blog"))
        ));
        feed.push_str(&format!(
            "    <description>{}</description>\n",
            escape_xml(config.feed_description())
        ));
        if !config.language.is_empty() {
            feed.push_str(&format!(
                "    <language>{}</language>\n",
                escape_xml(&config.language)
            ));
        }
        feed.push_str(&format!(
            "    <lastBuildDate>{}</lastBuildDate>\n",
            rfc2822(&now)
        ));

        let limit = config.feed.limit.unwrap_or(usize::MAX);
        for post in index.by_date().into_iter().take(limit) {
            let url = escape_xml(&full_url_for(config, &post.path()));
            let pub_date = match post.date {
                Some(date) => rfc2822(&date),
                None => rfc2822(&now),
            };

            feed.push_str("    <item>\n");
            feed.push_str(&format!("      <title>{}</title>\n", escape_xml(post.title())));
            feed.push_str(&format!("      <link>{}</link>\n", url));
            feed.push_str(&format!("      <guid>{}</guid>\n", url));
            feed.push_str(&format!("      <pubDate>{}</pubDate>\n", pub_date));
            feed.push_str(&format!(
                "      <description>{}</description>\n",
                escape_xml(post.excerpt())
            ));
            feed.push_str("    </item>\n");
        }

        feed.push_str("  </channel>\n");
        feed.push_str("</rss>\n");

        tracing::debug!("Rendered RSS feed with {} posts", index.len().min(limit));
        feed
    }
}
