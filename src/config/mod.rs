//! Configuration module

mod site;

pub use site::ChangeFreq;
pub use site::FeedConfig;
pub use site::HighlightConfig;
pub use site::ManifestConfig;
pub use site::ManifestIcon;
pub use site::RouteConfig;
pub use site::SiteConfig;
pub use site::SitemapConfig;
pub use site::SITE_URL_ENV;
