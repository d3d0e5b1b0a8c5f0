//! Initialize a new site

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::CONFIG_FILE;

const DEFAULT_CONFIG: &str = r#"# Site
title: Tech Portfolio
description: AI Research, Cybersecurity, CTF, and Infrastructure Development
author: John Doe
language: en
timezone: UTC

# URL (the SITE_URL environment variable overrides this)
url: https://example.com

# Directory
posts_dir: posts
public_dir: public
static_dir: static

# RSS feed
feed:
  path: rss.xml
  description: Articles on AI, cybersecurity, CTFs, and infrastructure.

# Sitemap
sitemap:
  routes:
    - path: ''
      changefreq: weekly
      priority: 1.0
    - path: /blog
      changefreq: weekly
      priority: 0.6
  post_changefreq: monthly
  post_priority: 0.5

# Writing
highlight:
  enable: true
  theme: base16-ocean.dark
  line_number: false
"#;

const DEFAULT_STYLE: &str = r#"body { background: #000; color: #fff; font-family: monospace; margin: 0; }
header nav { display: flex; gap: 2rem; padding: 1rem; border-bottom: 1px solid #222; }
a { color: #4ade80; }
main { max-width: 56rem; margin: 0 auto; padding: 2rem 1rem; }
.meta { color: #9ca3af; }
"#;

/// Initialize a new site in the given directory
pub fn init_site(target_dir: &Path) -> Result<()> {
    let config_path = target_dir.join(CONFIG_FILE);
    if config_path.exists() {
        anyhow::bail!("A site already exists in {:?}", target_dir);
    }

    fs::create_dir_all(target_dir.join("posts"))?;
    fs::create_dir_all(target_dir.join("static/css"))?;

    fs::write(&config_path, DEFAULT_CONFIG)
        .with_context(|| format!("Failed to write {:?}", config_path))?;
    fs::write(target_dir.join("static/css/style.css"), DEFAULT_STYLE)?;

    let now = chrono::Local::now();
    let sample_post = format!(
        r#"---
title: Hello World
date: {}
author: John Doe
excerpt: The first post on this site.
tags:
  - meta
---

Welcome! This is the first post. Its URL comes from the file name, so
`posts/hello-world.md` is served at `/blog/hello-world`.

<!-- more -->

## Writing posts

```bash
$ folio new "My New Post"
```

## Building

```bash
$ folio generate
$ folio server
```
"#,
        now.format("%Y-%m-%d %H:%M:%S")
    );

    fs::write(target_dir.join("posts/hello-world.md"), sample_post)?;
    tracing::debug!("Wrote sample post to {:?}", target_dir.join("posts"));

    Ok(())
}
