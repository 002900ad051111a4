//! Generate static files

use anyhow::Result;
use std::sync::Arc;

use crate::cms::ContentSource;
use crate::generator::Generator;
use crate::Blog;

/// Generate the static site from the configured CMS
pub async fn run(blog: &Blog) -> Result<()> {
    let source = blog.content_source()?;
    run_with_source(blog, source).await
}

/// Generate the static site from `source`
pub async fn run_with_source(blog: &Blog, source: Arc<dyn ContentSource>) -> Result<()> {
    let start = std::time::Instant::now();

    let generator = Generator::new(blog, source)?;
    let stats = generator.generate().await?;

    tracing::info!(
        "Generated {} listing pages ({} posts) and {} articles",
        stats.listing_pages,
        stats.posts_listed,
        stats.articles
    );

    let duration = start.elapsed();
    tracing::info!("Generated in {:.2}s", duration.as_secs_f64());

    Ok(())
}
