//! Post model

use chrono::{DateTime, FixedOffset, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use std::path::PathBuf;

use super::{ContentError, FrontMatter, MarkdownRenderer};

/// A blog post, loaded from one content file
#[derive(Debug, Clone, Serialize)]
pub struct Post {
    /// File name without extension; the URL segment under `/blog/`
    pub slug: String,

    /// Full source file path
    pub source: PathBuf,

    /// Metadata header
    pub front_matter: FrontMatter,

    /// Parsed publication date, if the header has a usable one
    pub date: Option<DateTime<FixedOffset>>,

    /// Raw markdown body, metadata block removed
    pub raw: String,
}

impl Post {
    /// Build a post from the text of its content file
    pub fn from_source(slug: String, source: PathBuf, text: &str, tz: &Tz) -> Self {
        let (front_matter, body) = FrontMatter::parse(text);
        let date = front_matter.parse_date(tz);
        if date.is_none() {
            if let Some(raw_date) = &front_matter.date {
                tracing::warn!("Post {:?} has an unparsable date {:?}", slug, raw_date);
            }
        }

        Self {
            slug,
            source,
            front_matter,
            date,
            raw: body.to_string(),
        }
    }

    /// Title from the metadata, else the slug
    pub fn title(&self) -> &str {
        self.front_matter
            .title
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(&self.slug)
    }

    pub fn author(&self) -> &str {
        self.front_matter.author.as_deref().unwrap_or("")
    }

    /// Excerpt from the metadata, else the text before `<!-- more -->`, else empty
    pub fn excerpt(&self) -> &str {
        self.front_matter
            .excerpt
            .as_deref()
            .filter(|e| !e.trim().is_empty())
            .or_else(|| MarkdownRenderer::split_excerpt(&self.raw))
            .unwrap_or("")
    }

    /// Ordering key: the post date, or the Unix epoch when it has none
    pub fn sort_key(&self) -> DateTime<Utc> {
        self.date.map(|d| d.with_timezone(&Utc)).unwrap_or_default()
    }

    /// Site-relative path of the post page
    pub fn path(&self) -> String {
        crate::helpers::post_path(&self.slug)
    }

    /// Render the body, consuming the post
    pub fn render(self, renderer: &MarkdownRenderer) -> Result<RenderedPost, ContentError> {
        let content = renderer.render(&self.raw)?;
        Ok(RenderedPost {
            post: self,
            content,
        })
    }
}

/// A post together with its rendered HTML body
#[derive(Debug, Clone, Serialize)]
pub struct RenderedPost {
    pub post: Post,
    pub content: String,
}
