//! Generator module - writes the static site to the public directory

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

use crate::content::{MarkdownRenderer, PostIndex};
use crate::feed::{manifest_json, robots_txt, RssFeed, Sitemap};
use crate::templates::TemplateRenderer;
use crate::Site;

/// Number of posts shown on the landing page
pub const HOME_RECENT_POSTS: usize = 3;

/// What a generation run produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerateStats {
    pub posts: usize,
    pub files: usize,
}

/// Static site generator using Tera templates
pub struct Generator {
    site: Site,
    templates: TemplateRenderer,
    markdown: MarkdownRenderer,
}

impl Generator {
    /// Create a new generator
    pub fn new(site: &Site) -> Result<Self> {
        Ok(Self {
            site: site.clone(),
            templates: TemplateRenderer::new()?,
            markdown: MarkdownRenderer::with_options(&site.config.highlight),
        })
    }

    /// Generate the entire site
    pub fn generate(&self, index: &PostIndex) -> Result<GenerateStats> {
        self.generate_at(index, Utc::now())
    }

    /// Generate the entire site with an explicit build time
    pub fn generate_at(&self, index: &PostIndex, now: DateTime<Utc>) -> Result<GenerateStats> {
        let config = &self.site.config;
        let public_dir = &self.site.public_dir;
        let mut stats = GenerateStats::default();

        fs::create_dir_all(public_dir)
            .with_context(|| format!("Failed to create {:?}", public_dir))?;

        stats.files += self.copy_static_assets()?;

        let sorted = index.by_date();

        let recent: Vec<_> = sorted.iter().take(HOME_RECENT_POSTS).copied().collect();
        self.write("index.html", &self.templates.render_home(config, &recent)?)?;
        self.write("blog/index.html", &self.templates.render_blog(config, &sorted)?)?;
        self.write("404.html", &self.templates.render_not_found(config)?)?;
        stats.files += 3;

        // A post that fails to render aborts the build; there is no safe fallback body
        for post in &sorted {
            let rendered = (*post)
                .clone()
                .render(&self.markdown)
                .with_context(|| format!("Failed to render post {:?}", post.slug))?;
            let html = self
                .templates
                .render_post(config, &rendered)
                .with_context(|| format!("Failed to lay out post {:?}", post.slug))?;
            self.write(&format!("blog/{}/index.html", post.slug), &html)?;
            stats.posts += 1;
            stats.files += 1;
        }

        self.write(&config.feed.path, &RssFeed::new(config).render(index, now))?;
        self.write("sitemap.xml", &Sitemap::new(config).render(index, now))?;
        self.write("robots.txt", &robots_txt(config))?;
        self.write("manifest.webmanifest", &manifest_json(config))?;
        stats.files += 4;

        tracing::info!(
            "Generated {} posts, {} files in {:?}",
            stats.posts,
            stats.files,
            public_dir
        );

        Ok(stats)
    }

    /// Write a file below the public directory, creating parents
    fn write(&self, relative: &str, content: &str) -> Result<()> {
        let path = self.site.public_dir.join(relative.trim_start_matches('/'));
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, content).with_context(|| format!("Failed to write {:?}", path))?;
        tracing::debug!("Wrote {:?}", path);
        Ok(())
    }

    /// Copy static assets (images, css, etc.) to the public directory
    fn copy_static_assets(&self) -> Result<usize> {
        let static_dir = &self.site.static_dir;
        if !static_dir.exists() {
            return Ok(0);
        }

        let mut copied = 0;
        for entry in WalkDir::new(static_dir)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }

            let relative = path.strip_prefix(static_dir)?;
            let dest = self.site.public_dir.join(relative);
            copy_file(path, &dest)?;
            copied += 1;
        }

        Ok(copied)
    }
}

fn copy_file(from: &Path, to: &Path) -> Result<()> {
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(from, to).with_context(|| format!("Failed to copy {:?} to {:?}", from, to))?;
    Ok(())
}
