//! List site content

use anyhow::Result;
use std::collections::HashMap;

use crate::content::PostIndex;
use crate::helpers::full_url_for;
use crate::Site;

/// List site content by type
pub fn run(site: &Site, content_type: &str) -> Result<()> {
    let index = site.loader().scan();
    for line in lines(site, &index, content_type)? {
        println!("{}", line);
    }
    Ok(())
}

/// Build the listing for a content type
pub fn lines(site: &Site, index: &PostIndex, content_type: &str) -> Result<Vec<String>> {
    let mut out = Vec::new();

    match content_type {
        "post" | "posts" => {
            out.push(format!("Posts ({}):", index.len()));
            for post in index.by_date() {
                let date = post
                    .date
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| "----------".to_string());
                out.push(format!("  {} - {} [{}]", date, post.title(), post.slug));
            }
        }
        "tag" | "tags" => {
            let tags = count(index.posts().iter().flat_map(|p| &p.front_matter.tags));
            out.push(format!("Tags ({}):", tags.len()));
            out.extend(tags.into_iter().map(|(tag, n)| format!("  {} ({})", tag, n)));
        }
        "category" | "categories" => {
            let categories = count(index.posts().iter().flat_map(|p| &p.front_matter.categories));
            out.push(format!("Categories ({}):", categories.len()));
            out.extend(
                categories
                    .into_iter()
                    .map(|(cat, n)| format!("  {} ({})", cat, n)),
            );
        }
        "route" | "routes" => {
            let config = &site.config;
            let mut routes: Vec<String> = vec![
                "/".to_string(),
                "/blog".to_string(),
                format!("/{}", config.feed.path.trim_start_matches('/')),
                "/sitemap.xml".to_string(),
                "/robots.txt".to_string(),
                "/manifest.webmanifest".to_string(),
            ];
            routes.extend(index.posts().iter().map(|p| p.path()));
            out.push(format!("Routes ({}):", routes.len()));
            out.extend(
                routes
                    .iter()
                    .map(|r| format!("  {}", full_url_for(config, r))),
            );
        }
        _ => {
            anyhow::bail!(
                "Unknown type: {}. Available: post, tag, category, route",
                content_type
            );
        }
    }

    Ok(out)
}

/// Count occurrences, most frequent first, then alphabetical
fn count<'a>(names: impl Iterator<Item = &'a String>) -> Vec<(String, usize)> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for name in names {
        *counts.entry(name.clone()).or_insert(0) += 1;
    }
    let mut counts: Vec<_> = counts.into_iter().collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    counts
}
