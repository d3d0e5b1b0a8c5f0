//! Content loader - builds the post index from the posts directory
//!
//! The directory listing is the source of truth: every `.md` file directly
//! inside the posts directory is one post, and its file name (minus the
//! extension) is the slug. The index is rebuilt from scratch on every scan.

use chrono_tz::Tz;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::{ContentError, Post};
use crate::config::SiteConfig;

/// Extension of content files
pub const POST_EXTENSION: &str = "md";

/// How a scan of the posts directory went
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexStatus {
    /// The directory was read
    Loaded,
    /// The directory does not exist
    Missing,
    /// The directory exists but could not be read; the reason is kept for diagnostics
    Unreadable(String),
}

/// All posts found by one scan
#[derive(Debug, Clone)]
pub struct PostIndex {
    posts: Vec<Post>,
    status: IndexStatus,
}

impl PostIndex {
    /// An index with no posts and the given status
    pub fn empty(status: IndexStatus) -> Self {
        Self {
            posts: Vec::new(),
            status,
        }
    }

    /// Posts in enumeration (slug) order
    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn status(&self) -> &IndexStatus {
        &self.status
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    /// Look up a post by slug
    pub fn get(&self, slug: &str) -> Option<&Post> {
        self.posts.iter().find(|p| p.slug == slug)
    }

    /// Posts sorted newest first; posts without a date come last
    pub fn by_date(&self) -> Vec<&Post> {
        let mut posts: Vec<&Post> = self.posts.iter().collect();
        posts.sort_by(|a, b| b.sort_key().cmp(&a.sort_key()));
        posts
    }
}

/// Loads posts from the posts directory
pub struct ContentLoader {
    posts_dir: PathBuf,
    timezone: Tz,
}

impl ContentLoader {
    /// Create a loader for a site rooted at `base_dir`
    pub fn new(config: &SiteConfig, base_dir: &Path) -> Self {
        Self {
            posts_dir: base_dir.join(&config.posts_dir),
            timezone: config.tz(),
        }
    }

    /// Create a loader for an explicit directory
    pub fn from_dir<P: AsRef<Path>>(posts_dir: P, timezone: Tz) -> Self {
        Self {
            posts_dir: posts_dir.as_ref().to_path_buf(),
            timezone,
        }
    }

    pub fn posts_dir(&self) -> &Path {
        &self.posts_dir
    }

    /// Scan the posts directory.
    ///
    /// Never fails: a missing or unreadable directory gives an empty index
    /// whose status says which of the two happened.
    pub fn scan(&self) -> PostIndex {
        if !self.posts_dir.exists() {
            tracing::debug!("Posts directory {:?} does not exist", self.posts_dir);
            return PostIndex::empty(IndexStatus::Missing);
        }
        if !self.posts_dir.is_dir() {
            tracing::warn!("Posts path {:?} is not a directory", self.posts_dir);
            return PostIndex::empty(IndexStatus::Unreadable("not a directory".to_string()));
        }

        match self.try_scan() {
            Ok(posts) => {
                tracing::debug!("Indexed {} posts from {:?}", posts.len(), self.posts_dir);
                PostIndex {
                    posts,
                    status: IndexStatus::Loaded,
                }
            }
            Err(e) => {
                tracing::warn!("Failed to index posts, continuing with none: {}", e);
                PostIndex::empty(IndexStatus::Unreadable(e.to_string()))
            }
        }
    }

    /// Scan the posts directory, failing on the first unreadable entry
    pub fn try_scan(&self) -> Result<Vec<Post>, ContentError> {
        let mut posts = Vec::new();

        for entry in WalkDir::new(&self.posts_dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|source| ContentError::Walk {
                path: self.posts_dir.clone(),
                source,
            })?;
            let path = entry.path();
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(slug) = slug_for(path) else {
                continue;
            };

            let text = fs::read_to_string(path).map_err(|source| ContentError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            posts.push(Post::from_source(
                slug,
                path.to_path_buf(),
                &text,
                &self.timezone,
            ));
        }

        Ok(posts)
    }

    /// Load a single post by slug
    pub fn load_post(&self, slug: &str) -> Result<Post, ContentError> {
        if !is_valid_slug(slug) {
            return Err(ContentError::NotFound(slug.to_string()));
        }

        let path = self.posts_dir.join(format!("{}.{}", slug, POST_EXTENSION));
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ContentError::NotFound(slug.to_string()));
            }
            Err(source) => return Err(ContentError::Io { path, source }),
        };

        Ok(Post::from_source(
            slug.to_string(),
            path,
            &text,
            &self.timezone,
        ))
    }
}

/// Slug of a content file: its name with the extension removed
pub fn slug_for(path: &Path) -> Option<String> {
    let is_post = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e == POST_EXTENSION)
        .unwrap_or(false);
    if !is_post {
        return None;
    }

    path.file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| is_valid_slug(s))
        .map(str::to_string)
}

/// A slug names a file directly inside the posts directory
fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug != "."
        && slug != ".."
        && !slug.contains(['/', '\\', '\0'])
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, content: &str) {
        fs::write(dir.join(name), content).unwrap();
    }

    fn loader(dir: &Path) -> ContentLoader {
        ContentLoader::from_dir(dir, Tz::UTC)
    }

    #[test]
    fn test_slug_is_file_stem() {
        assert_eq!(slug_for(Path::new("posts/hello-world.md")), Some("hello-world".into()));
        assert_eq!(slug_for(Path::new("posts/v1.2-notes.md")), Some("v1.2-notes".into()));
        assert_eq!(slug_for(Path::new("posts/readme.txt")), None);
        assert_eq!(slug_for(Path::new("posts/upper.MD")), None);
        assert_eq!(slug_for(Path::new("posts/noext")), None);
        assert_eq!(slug_for(Path::new("posts/..md")), None);
        assert_eq!(slug_for(Path::new("posts/...md")), None);
    }

    #[test]
    fn test_scan_skips_dot_only_names() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "..md", "---\ntitle: Dot\n---\n");
        write(tmp.path(), "...md", "---\ntitle: Dots\n---\n");
        write(tmp.path(), "real.md", "---\ntitle: Real\n---\n");

        let index = loader(tmp.path()).scan();
        let slugs: Vec<_> = index.posts().iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, vec!["real"]);
    }

    #[test]
    fn test_scan_posts() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "b-post.md", "---\ntitle: B\ndate: 2024-02-01\n---\nB body");
        write(tmp.path(), "a-post.md", "---\ntitle: A\n---\nA body");
        write(tmp.path(), "notes.txt", "ignored");
        fs::create_dir(tmp.path().join("drafts.md")).unwrap();
        fs::create_dir(tmp.path().join("nested")).unwrap();
        write(&tmp.path().join("nested"), "deep.md", "ignored");

        let index = loader(tmp.path()).scan();
        assert_eq!(index.status(), &IndexStatus::Loaded);
        let slugs: Vec<_> = index.posts().iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, vec!["a-post", "b-post"]);
        assert_eq!(index.get("b-post").unwrap().title(), "B");
        assert!(index.get("notes").is_none());
    }

    #[test]
    fn test_by_date_newest_first_undated_last() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "old.md", "---\ndate: 2020-01-01\n---\n");
        write(tmp.path(), "new.md", "---\ndate: 2024-06-01\n---\n");
        write(tmp.path(), "undated.md", "---\ntitle: No date\n---\n");
        write(tmp.path(), "garbled.md", "---\ndate: not a date\n---\n");

        let index = loader(tmp.path()).scan();
        let order: Vec<_> = index.by_date().iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(order, vec!["new", "old", "garbled", "undated"]);
    }

    #[test]
    fn test_missing_directory_is_empty() {
        let tmp = TempDir::new().unwrap();
        let index = loader(&tmp.path().join("nope")).scan();
        assert!(index.is_empty());
        assert_eq!(index.status(), &IndexStatus::Missing);
    }

    #[test]
    fn test_file_instead_of_directory_is_unreadable() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "posts", "not a dir");
        let index = loader(&tmp.path().join("posts")).scan();
        assert!(index.is_empty());
        assert!(matches!(index.status(), IndexStatus::Unreadable(_)));
    }

    #[test]
    fn test_invalid_utf8_is_unreadable() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("bad.md"), [0xff, 0xfe, 0x00]).unwrap();
        let index = loader(tmp.path()).scan();
        assert!(index.is_empty());
        assert!(matches!(index.status(), IndexStatus::Unreadable(_)));
        assert!(loader(tmp.path()).try_scan().is_err());
    }

    #[test]
    fn test_load_post() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "hello-world.md", "---\ntitle: Hello\n---\n# Hi\n");

        let post = loader(tmp.path()).load_post("hello-world").unwrap();
        assert_eq!(post.title(), "Hello");
        assert_eq!(post.raw, "# Hi\n");

        let missing = loader(tmp.path()).load_post("nope").unwrap_err();
        assert!(missing.is_not_found());

        let traversal = loader(tmp.path()).load_post("../hello-world").unwrap_err();
        assert!(traversal.is_not_found());
        assert!(loader(tmp.path()).load_post("").unwrap_err().is_not_found());
    }
}
