//! Development server rendering every page on demand
//!
//! Each request scans the posts directory again and builds its own post
//! index, so edits show up on the next reload and requests share no
//! mutable state.

use anyhow::Result;
use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderValue, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use chrono::Utc;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::content::MarkdownRenderer;
use crate::feed::{manifest_json, robots_txt, RssFeed, Sitemap};
use crate::generator::HOME_RECENT_POSTS;
use crate::templates::TemplateRenderer;
use crate::Site;

const FEED_CACHE_CONTROL: &str = "s-maxage=1800, stale-while-revalidate=86400";
const ROBOTS_CACHE_CONTROL: &str = "s-maxage=86400, stale-while-revalidate=604800";

/// Server state; read-only after startup
pub struct ServerState {
    site: Site,
    templates: TemplateRenderer,
    markdown: MarkdownRenderer,
}

impl ServerState {
    pub fn new(site: &Site) -> Result<Self> {
        Ok(Self {
            site: site.clone(),
            templates: TemplateRenderer::new()?,
            markdown: MarkdownRenderer::with_options(&site.config.highlight),
        })
    }
}

/// A fully rendered response, independent of axum
#[derive(Debug)]
pub struct Page {
    pub status: StatusCode,
    pub content_type: &'static str,
    pub cache_control: Option<&'static str>,
    pub body: String,
}

impl Page {
    fn html(status: StatusCode, body: String) -> Self {
        Self {
            status,
            content_type: "text/html; charset=utf-8",
            cache_control: None,
            body,
        }
    }

    fn error(e: anyhow::Error) -> Self {
        tracing::error!("Failed to render page: {:#}", e);
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            content_type: "text/plain; charset=utf-8",
            cache_control: None,
            body: format!("Internal error: {:#}", e),
        }
    }
}

impl IntoResponse for Page {
    fn into_response(self) -> Response {
        let mut response = (self.status, self.body).into_response();
        let headers = response.headers_mut();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(self.content_type),
        );
        if let Some(cache_control) = self.cache_control {
            headers.insert(
                header::CACHE_CONTROL,
                HeaderValue::from_static(cache_control),
            );
        }
        response
    }
}

/// Landing page
pub fn home_page(state: &ServerState) -> Page {
    let index = state.site.loader().scan();
    let recent: Vec<_> = index
        .by_date()
        .into_iter()
        .take(HOME_RECENT_POSTS)
        .collect();
    match state.templates.render_home(&state.site.config, &recent) {
        Ok(body) => Page::html(StatusCode::OK, body),
        Err(e) => Page::error(e),
    }
}

/// Blog listing
pub fn blog_page(state: &ServerState) -> Page {
    let index = state.site.loader().scan();
    match state
        .templates
        .render_blog(&state.site.config, &index.by_date())
    {
        Ok(body) => Page::html(StatusCode::OK, body),
        Err(e) => Page::error(e),
    }
}

/// A single post; a missing slug is a 404, a render failure a 500
pub fn post_page(state: &ServerState, slug: &str) -> Page {
    let post = match state.site.loader().load_post(slug) {
        Ok(post) => post,
        Err(e) if e.is_not_found() => return not_found_page(state),
        Err(e) => return Page::error(e.into()),
    };

    let rendered = match post.render(&state.markdown) {
        Ok(rendered) => rendered,
        Err(e) => return Page::error(e.into()),
    };

    match state.templates.render_post(&state.site.config, &rendered) {
        Ok(body) => Page::html(StatusCode::OK, body),
        Err(e) => Page::error(e),
    }
}

pub fn not_found_page(state: &ServerState) -> Page {
    match state.templates.render_not_found(&state.site.config) {
        Ok(body) => Page::html(StatusCode::NOT_FOUND, body),
        Err(e) => Page::error(e),
    }
}

pub fn rss_page(state: &ServerState) -> Page {
    let index = state.site.loader().scan();
    Page {
        status: StatusCode::OK,
        content_type: "application/xml; charset=utf-8",
        cache_control: Some(FEED_CACHE_CONTROL),
        body: RssFeed::new(&state.site.config).render(&index, Utc::now()),
    }
}

pub fn sitemap_page(state: &ServerState) -> Page {
    let index = state.site.loader().scan();
    Page {
        status: StatusCode::OK,
        content_type: "application/xml; charset=utf-8",
        cache_control: None,
        body: Sitemap::new(&state.site.config).render(&index, Utc::now()),
    }
}

pub fn robots_page(state: &ServerState) -> Page {
    Page {
        status: StatusCode::OK,
        content_type: "text/plain; charset=utf-8",
        cache_control: Some(ROBOTS_CACHE_CONTROL),
        body: robots_txt(&state.site.config),
    }
}

pub fn manifest_page(state: &ServerState) -> Page {
    Page {
        status: StatusCode::OK,
        content_type: "application/manifest+json",
        cache_control: None,
        body: manifest_json(&state.site.config),
    }
}

/// Build the router
pub fn router(state: Arc<ServerState>) -> Router {
    let feed_route = format!(
        "/{}",
        state.site.config.feed.path.trim_start_matches('/')
    );

    Router::new()
        .route("/", get(|State(s): State<Arc<ServerState>>| async move { home_page(&s) }))
        .route("/blog", get(|State(s): State<Arc<ServerState>>| async move { blog_page(&s) }))
        .route("/blog/", get(|State(s): State<Arc<ServerState>>| async move { blog_page(&s) }))
        .route("/blog/:slug", get(post_handler))
        .route(&feed_route, get(|State(s): State<Arc<ServerState>>| async move { rss_page(&s) }))
        .route(
            "/sitemap.xml",
            get(|State(s): State<Arc<ServerState>>| async move { sitemap_page(&s) }),
        )
        .route(
            "/robots.txt",
            get(|State(s): State<Arc<ServerState>>| async move { robots_page(&s) }),
        )
        .route(
            "/manifest.webmanifest",
            get(|State(s): State<Arc<ServerState>>| async move { manifest_page(&s) }),
        )
        .fallback(fallback_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn post_handler(
    State(state): State<Arc<ServerState>>,
    Path(slug): Path<String>,
) -> Page {
    post_page(&state, &slug)
}

/// Serve static assets, falling back to the 404 page
async fn fallback_handler(
    State(state): State<Arc<ServerState>>,
    request: Request<Body>,
) -> Response {
    let mut service = ServeDir::new(&state.site.static_dir);
    match service.try_call(request).await {
        Ok(response) if response.status() != StatusCode::NOT_FOUND => response.into_response(),
        Ok(_) => not_found_page(&state).into_response(),
        Err(e) => {
            tracing::error!("Failed to serve static file: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response()
        }
    }
}

/// Start the development server
pub async fn start(site: &Site, ip: &str, port: u16, open: bool) -> Result<()> {
    let state = Arc::new(ServerState::new(site)?);
    let app = router(state);

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    let url = format!("http://{}:{}", ip, port);
    println!("Server running at {}", url);
    println!("Press Ctrl+C to stop.");

    if open {
        if let Err(e) = open_browser(&url) {
            tracing::warn!("Failed to open browser: {}", e);
        }
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Open a URL in the default browser
fn open_browser(url: &str) -> Result<()> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open").arg(url).spawn()?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open").arg(url).spawn()?;
    }

    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/c", "start", url])
            .spawn()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn state(posts: &[(&str, &str)]) -> (TempDir, ServerState) {
        let tmp = TempDir::new().unwrap();
        let posts_dir = tmp.path().join("posts");
        fs::create_dir_all(&posts_dir).unwrap();
        for (name, content) in posts {
            fs::write(posts_dir.join(name), content).unwrap();
        }
        let site = Site::new(tmp.path()).unwrap();
        let state = ServerState::new(&site).unwrap();
        (tmp, state)
    }

    #[test]
    fn test_post_page() {
        let (_tmp, state) = state(&[("hello-world.md", "---\ntitle: Hello\n---\n# Hi\n")]);
        let page = post_page(&state, "hello-world");
        assert_eq!(page.status, StatusCode::OK);
        assert!(page.body.contains("<h1>Hi</h1>"));
    }

    #[test]
    fn test_missing_post_is_404() {
        let (_tmp, state) = state(&[]);
        let page = post_page(&state, "nope");
        assert_eq!(page.status, StatusCode::NOT_FOUND);
        assert!(page.body.contains("Page Not Found"));

        let page = post_page(&state, "..");
        assert_eq!(page.status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_requests_see_new_posts() {
        let (tmp, state) = state(&[]);
        assert!(!rss_page(&state).body.contains("<item>"));

        fs::write(tmp.path().join("posts/late.md"), "---\ntitle: Late\n---\n").unwrap();
        let rss = rss_page(&state);
        assert!(rss.body.contains("<title>Late</title>"));
        assert_eq!(rss.cache_control, Some(FEED_CACHE_CONTROL));
        assert!(blog_page(&state).body.contains("Late"));
    }

    #[test]
    fn test_feeds_without_posts_dir() {
        let tmp = TempDir::new().unwrap();
        let site = Site::new(tmp.path()).unwrap();
        let state = ServerState::new(&site).unwrap();

        let sitemap = sitemap_page(&state);
        assert_eq!(sitemap.status, StatusCode::OK);
        assert_eq!(sitemap.body.matches("<url>").count(), 2);
        assert_eq!(rss_page(&state).status, StatusCode::OK);
        assert_eq!(home_page(&state).status, StatusCode::OK);
    }

    #[test]
    fn test_metadata_routes() {
        let (_tmp, state) = state(&[]);
        assert!(robots_page(&state).body.starts_with("User-agent: *"));
        assert_eq!(
            manifest_page(&state).content_type,
            "application/manifest+json"
        );
    }

    #[test]
    fn test_router_builds() {
        let (_tmp, state) = state(&[]);
        let _router = router(Arc::new(state));
    }
}
