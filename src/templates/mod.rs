//! Built-in page templates using the Tera template engine
//!
//! The templates are embedded in the binary. Post bodies are the only
//! values marked `safe`; everything else goes through Tera's HTML
//! autoescaping.

use anyhow::Result;
use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;
use std::collections::HashMap;
use tera::{Context, Tera};

use crate::config::SiteConfig;
use crate::content::{Post, RenderedPost};
use crate::helpers::format_date;

/// Template renderer with the embedded default theme
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Create a new renderer with all templates loaded
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("default/layout.html")),
            ("home.html", include_str!("default/home.html")),
            ("blog.html", include_str!("default/blog.html")),
            ("post.html", include_str!("default/post.html")),
            ("404.html", include_str!("default/404.html")),
        ])?;

        tera.register_filter("date_format", date_format_filter);

        Ok(Self { tera })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }

    /// Landing page with the most recent posts
    pub fn render_home(&self, config: &SiteConfig, recent: &[&Post]) -> Result<String> {
        let mut context = base_context(config);
        let posts: Vec<PostData> = recent.iter().map(|p| PostData::from_post(p)).collect();
        context.insert("posts", &posts);
        self.render("home.html", &context)
    }

    /// Blog listing
    pub fn render_blog(&self, config: &SiteConfig, posts: &[&Post]) -> Result<String> {
        let mut context = base_context(config);
        let posts: Vec<PostData> = posts.iter().map(|p| PostData::from_post(p)).collect();
        context.insert("posts", &posts);
        self.render("blog.html", &context)
    }

    /// A single post page
    pub fn render_post(&self, config: &SiteConfig, post: &RenderedPost) -> Result<String> {
        let mut context = base_context(config);
        let mut data = PostData::from_post(&post.post);
        data.content = Some(post.content.clone());
        context.insert("post", &data);
        self.render("post.html", &context)
    }

    pub fn render_not_found(&self, config: &SiteConfig) -> Result<String> {
        self.render("404.html", &base_context(config))
    }
}

fn base_context(config: &SiteConfig) -> Context {
    let mut context = Context::new();
    context.insert("config", &ConfigData::from_config(config));
    context.insert("year", &Utc::now().year());
    context
}

/// Tera filter: format an RFC 3339 date string with a Moment.js-style format
fn date_format_filter(
    value: &tera::Value,
    args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("date_format", "value", String, value);
    let format = match args.get("format") {
        Some(val) => tera::try_get_value!("date_format", "format", String, val),
        None => "YYYY-MM-DD".to_string(),
    };

    match DateTime::parse_from_rfc3339(&s) {
        Ok(date) => Ok(tera::Value::String(format_date(&date, &format))),
        Err(_) => Ok(tera::Value::String(s)),
    }
}

// Data structures for template context

#[derive(Debug, Clone, Serialize)]
pub struct PostData {
    pub slug: String,
    pub title: String,
    /// RFC 3339, or null when the post has no usable date
    pub date: Option<String>,
    pub author: String,
    pub excerpt: String,
    pub path: String,
    pub tags: Vec<String>,
    pub categories: Vec<String>,
    pub content: Option<String>,
}

impl PostData {
    pub fn from_post(post: &Post) -> Self {
        Self {
            slug: post.slug.clone(),
            title: post.title().to_string(),
            date: post.date.map(|d| d.to_rfc3339()),
            author: post.author().to_string(),
            excerpt: post.excerpt().to_string(),
            path: post.path(),
            tags: post.front_matter.tags.clone(),
            categories: post.front_matter.categories.clone(),
            content: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ConfigData {
    pub title: String,
    pub description: String,
    pub author: String,
    pub language: String,
    pub url: String,
    pub feed_title: String,
    pub feed_path: String,
    pub extra: HashMap<String, serde_yaml::Value>,
}

impl ConfigData {
    pub fn from_config(config: &SiteConfig) -> Self {
        Self {
            title: config.title.clone(),
            description: config.description.clone(),
            author: config.author.clone(),
            language: config.language.clone(),
            url: config.base_url().to_string(),
            feed_title: config.feed_title(),
            feed_path: config.feed.path.trim_start_matches('/').to_string(),
            extra: config.extra.clone(),
        }
    }
}
