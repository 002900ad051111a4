//! List posts available in the CMS

use anyhow::{Context, Result};

use crate::cms::ContentSource;
use crate::listing::ListingState;
use crate::Blog;

/// Print every post, in listing order
pub async fn run(blog: &Blog) -> Result<()> {
    let source = blog.content_source()?;
    let state = collect(blog, source.as_ref()).await?;

    println!("Posts ({}):", state.posts().len());
    for post in state.posts() {
        println!(
            "  {} - {} [{}]",
            post.first_publication_date.as_deref().unwrap_or("unpublished"),
            post.title,
            post.uid
        );
    }
    if state.has_more() {
        println!("  ... more posts beyond cms.max_pages");
    }

    Ok(())
}

/// Load up to `cms.max_pages` pages of posts
async fn collect(blog: &Blog, source: &dyn ContentSource) -> Result<ListingState> {
    let cms = &blog.config.cms;
    let formatter = blog.formatter()?;

    let first = source
        .query(&cms.document_type, cms.paths_page_size)
        .await
        .context("Failed to fetch posts")?;
    let mut state = ListingState::from_first_page(&first, &formatter);

    let mut pages = 1;
    while pages < cms.max_pages && state.load_more(source, &formatter).await? {
        pages += 1;
    }

    Ok(state)
}
