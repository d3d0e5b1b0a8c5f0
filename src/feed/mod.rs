//! Feed generators - RSS, sitemap, robots.txt and the web app manifest
//!
//! Every generator takes the site configuration and a [`PostIndex`]
//! explicitly and always produces a document. An index that came back
//! empty (missing or unreadable posts directory) yields a valid document
//! with no post entries.
//!
//! [`PostIndex`]: crate::content::PostIndex

pub mod meta;
pub mod rss;
pub mod sitemap;

pub use meta::{manifest_json, robots_txt};
pub use rss::RssFeed;
pub use sitemap::{Sitemap, SitemapEntry};
