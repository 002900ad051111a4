//! Development server with on-demand article rendering
//!
//! Generated files are served from the public directory. Article routes that
//! were not generated are resolved against the CMS: the first visit gets a
//! loading page that refreshes itself, and once the article is ready it is
//! rendered and written next to the generated ones.

use anyhow::Result;
use axum::{
    body::Body,
    extract::{Path, State},
    http::{Request, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::article::{is_valid_uid, FallbackResolver, Resolution};
use crate::cms::ContentSource;
use crate::helpers::post_path;
use crate::templates::TemplateRenderer;
use crate::Blog;

/// Server state
struct ServerState {
    public_dir: PathBuf,
    resolver: Arc<FallbackResolver>,
    renderer: TemplateRenderer,
}

/// Start the development server
pub async fn start(blog: &Blog, ip: &str, port: u16, open: bool) -> Result<()> {
    let app = router(blog, blog.content_source()?)?;

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

/// Routes of the development server
pub fn router(blog: &Blog, source: Arc<dyn ContentSource>) -> Result<Router> {
    let resolver = FallbackResolver::new(
        source,
        Arc::new(blog.formatter()?),
        blog.config.cms.document_type.clone(),
    );

    let state = Arc::new(ServerState {
        public_dir: blog.public_dir.clone(),
        resolver: Arc::new(resolver),
        renderer: blog.renderer()?,
    });

    Ok(Router::new()
        .route("/post/:uid", get(article_handler))
        .route("/post/:uid/", get(article_handler))
        .fallback(fallback_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

async fn article_handler(
    State(state): State<Arc<ServerState>>,
    Path(uid): Path<String>,
) -> Response {
    if !is_valid_uid(&uid) {
        return page(StatusCode::NOT_FOUND, state.renderer.render_not_found());
    }

    let file_path = state.public_dir.join(post_path(&uid)).join("index.html");
    if let Ok(html) = tokio::fs::read_to_string(&file_path).await {
        return Html(html).into_response();
    }

    match state.resolver.resolve(&uid) {
        Resolution::Ready(post) => {
            let html = match state.renderer.render_article(&post) {
                Ok(html) => html,
                Err(e) => {
                    tracing::error!("Failed to render article {}: {}", uid, e);
                    return page(StatusCode::INTERNAL_SERVER_ERROR, state.renderer.render_error());
                }
            };
            if let Err(e) = persist(&file_path, &html).await {
                tracing::warn!("Failed to write {:?}: {}", file_path, e);
            }
            Html(html).into_response()
        }
        Resolution::Pending => page(StatusCode::OK, state.renderer.render_fallback(&uid)),
        Resolution::NotFound => page(StatusCode::NOT_FOUND, state.renderer.render_not_found()),
        Resolution::Failed(reason) => {
            tracing::warn!("Article {} failed to load: {}", uid, reason);
            page(StatusCode::BAD_GATEWAY, state.renderer.render_error())
        }
    }
}

/// Serve generated files
async fn fallback_handler(
    State(state): State<Arc<ServerState>>,
    request: Request<Body>,
) -> Response {
    let mut service = ServeDir::new(&state.public_dir).append_index_html_on_directories(true);
    match service.try_call(request).await {
        Ok(response) => response.into_response(),
        Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response(),
    }
}

fn page(status: StatusCode, html: Result<String>) -> Response {
    match html {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => {
            tracing::error!("Failed to render page: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response()
        }
    }
}

async fn persist(file_path: &std::path::Path, html: &str) -> std::io::Result<()> {
    if let Some(parent) = file_path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(file_path, html).await?;
    tracing::info!("Wrote {:?}", file_path);
    Ok(())
}

/// Open URL in default browser
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
