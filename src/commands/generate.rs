//! Generate static files

use anyhow::{Context, Result};
use notify::Watcher;
use std::path::Path;
use std::sync::mpsc::channel;
use std::time::{Duration, Instant};

use crate::content::IndexStatus;
use crate::generator::{GenerateStats, Generator};
use crate::{Site, CONFIG_FILE};

/// Generate the static site
pub fn run(site: &Site) -> Result<GenerateStats> {
    let start = Instant::now();

    let index = site.loader().scan();
    match index.status() {
        IndexStatus::Loaded => tracing::info!("Loaded {} posts", index.len()),
        IndexStatus::Missing => tracing::info!(
            "No posts directory at {:?}, building without posts",
            site.posts_dir
        ),
        IndexStatus::Unreadable(reason) => tracing::warn!(
            "Posts directory {:?} could not be read ({}), building without posts",
            site.posts_dir,
            reason
        ),
    }

    let generator = Generator::new(site)?;
    let stats = generator.generate(&index)?;

    let duration = start.elapsed();
    tracing::info!("Generated in {:.2}s", duration.as_secs_f64());

    Ok(stats)
}

/// Watch for file changes and regenerate
pub async fn watch(site: &Site) -> Result<()> {
    let (tx, rx) = channel();

    let mut watcher = notify::recommended_watcher(move |res| {
        if let Ok(event) = res {
            let _ = tx.send(event);
        }
    })?;

    for dir in [&site.posts_dir, &site.static_dir] {
        if dir.exists() {
            watcher
                .watch(dir, notify::RecursiveMode::Recursive)
                .with_context(|| format!("Failed to watch {:?}", dir))?;
        }
    }

    let config_path = site.base_dir.join(CONFIG_FILE);
    if config_path.exists() {
        watcher.watch(Path::new(&config_path), notify::RecursiveMode::NonRecursive)?;
    }

    tracing::info!("Watching for changes. Press Ctrl+C to stop.");

    let mut last_rebuild = Instant::now();

    loop {
        match rx.recv_timeout(Duration::from_millis(100)) {
            Ok(event) => {
                if !is_relevant(&event) {
                    continue;
                }
                // Debounce: only rebuild if more than 500ms since last rebuild
                if last_rebuild.elapsed() > Duration::from_millis(500) {
                    tracing::info!("File changed, regenerating...");
                    // Pick up config edits as well as content edits
                    match Site::new(&site.base_dir).and_then(|fresh| run(&fresh)) {
                        Ok(_) => tracing::info!("Regenerated successfully"),
                        Err(e) => tracing::error!("Generation failed: {:#}", e),
                    }
                    last_rebuild = Instant::now();
                }
            }
            Err(std::sync::mpsc::RecvTimeoutError::Timeout) => {}
            Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }

    Ok(())
}

/// Ignore editor swap files and VCS noise
fn is_relevant(event: &notify::Event) -> bool {
    event.paths.iter().any(|path| {
        let path_str = path.to_string_lossy();
        !path_str.contains(".git")
            && !path_str.contains(".DS_Store")
            && !path_str.ends_with('~')
            && !path_str.ends_with(".swp")
    })
}
