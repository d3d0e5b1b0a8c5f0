//! Create a new post

use anyhow::Result;
use std::fs;
use std::path::PathBuf;

use crate::content::loader::POST_EXTENSION;
use crate::Site;

/// Create a new post file; the slug defaults to the slugified title
pub fn create_post(site: &Site, title: &str, slug: Option<&str>) -> Result<PathBuf> {
    let slug = match slug {
        Some(s) => slug::slugify(s),
        None => slug::slugify(title),
    };
    if slug.is_empty() {
        anyhow::bail!("Cannot derive a slug from {:?}", title);
    }

    fs::create_dir_all(&site.posts_dir)?;

    let file_path = site.posts_dir.join(format!("{}.{}", slug, POST_EXTENSION));
    if file_path.exists() {
        anyhow::bail!("File already exists: {:?}", file_path);
    }

    let now = chrono::Local::now();
    let content = format!(
        "---\ntitle: {}\ndate: {}\nauthor: {}\nexcerpt: \"\"\ntags:\n---\n",
        yaml_string(title),
        now.format("%Y-%m-%d %H:%M:%S"),
        yaml_string(&site.config.author),
    );

    fs::write(&file_path, content)?;
    tracing::info!("Created post {:?}", slug);

    Ok(file_path)
}

/// Quote a value for a YAML scalar
fn yaml_string(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}
