//! Generator module - renders the listing and article pages to static files

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::article::{enumerate_paths, fetch_article, is_valid_uid};
use crate::cms::ContentSource;
use crate::format::Formatter;
use crate::helpers::{listing_path, post_path};
use crate::listing::{ListingAction, ListingState};
use crate::templates::{TemplateRenderer, LOGO_SVG, STYLE_CSS};
use crate::Blog;

/// What a generation run produced
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GenerateStats {
    pub listing_pages: usize,
    pub posts_listed: usize,
    pub articles: usize,
}

/// Static site generator
pub struct Generator {
    blog: Blog,
    source: Arc<dyn ContentSource>,
    formatter: Formatter,
    renderer: TemplateRenderer,
}

impl Generator {
    /// Create a new generator reading from `source`
    pub fn new(blog: &Blog, source: Arc<dyn ContentSource>) -> Result<Self> {
        Ok(Self {
            blog: blog.clone(),
            source,
            formatter: blog.formatter()?,
            renderer: blog.renderer()?,
        })
    }

    /// Generate the entire site
    pub async fn generate(&self) -> Result<GenerateStats> {
        fs::create_dir_all(&self.blog.public_dir)?;
        self.write_assets()?;

        let (listing_pages, posts_listed) = self.generate_listing_pages().await?;
        let articles = self.generate_article_pages().await?;

        Ok(GenerateStats {
            listing_pages,
            posts_listed,
            articles,
        })
    }

    fn write_assets(&self) -> Result<()> {
        let assets = self.blog.public_dir.join("assets");
        fs::create_dir_all(&assets)?;
        fs::write(assets.join("logo.svg"), LOGO_SVG)?;
        fs::write(assets.join("style.css"), STYLE_CSS)?;
        Ok(())
    }

    /// Write `index.html` and one `page/{n}/index.html` per loaded page
    ///
    /// Page `n` shows the posts of the first `n` API pages, so following the
    /// "load more" links reproduces the growing listing.
    async fn generate_listing_pages(&self) -> Result<(usize, usize)> {
        let cms = &self.blog.config.cms;
        let first = self
            .source
            .query(&cms.document_type, cms.page_size)
            .await
            .context("Failed to fetch the first page of posts")?;

        let mut state = ListingState::from_first_page(&first, &self.formatter);
        let mut page = 1;

        loop {
            if page >= cms.max_pages && state.has_more() {
                tracing::warn!(
                    "Listing stopped after {} pages; raise cms.max_pages to show more",
                    page
                );
                state.apply(ListingAction::SetCursor(None));
            }

            let html = self.renderer.render_listing(&state, page)?;
            let output = write_route(&self.blog.public_dir, &listing_path(page), &html)?;
            tracing::debug!("Generated: {:?}", output);

            let loaded = state
                .load_more(self.source.as_ref(), &self.formatter)
                .await
                .with_context(|| format!("Failed to load listing page {}", page + 1))?;
            if !loaded {
                break;
            }
            page += 1;
        }

        Ok((page, state.posts().len()))
    }

    async fn generate_article_pages(&self) -> Result<usize> {
        let cms = &self.blog.config.cms;
        let uids = enumerate_paths(
            self.source.as_ref(),
            &cms.document_type,
            cms.paths_page_size,
            cms.max_pages,
        )
        .await
        .context("Failed to enumerate articles")?;

        let mut count = 0;
        for uid in &uids {
            if !is_valid_uid(uid) {
                tracing::warn!("Skipping article with unusable uid {:?}", uid);
                continue;
            }

            let post = fetch_article(
                self.source.as_ref(),
                &self.formatter,
                &cms.document_type,
                uid,
            )
            .await
            .with_context(|| format!("Failed to fetch article {}", uid))?;

            let Some(post) = post else {
                tracing::warn!("Article {} disappeared during generation", uid);
                continue;
            };

            let html = self.renderer.render_article(&post)?;
            let output = write_route(&self.blog.public_dir, &post_path(uid), &html)?;
            tracing::debug!("Generated post: {:?}", output);
            count += 1;
        }

        Ok(count)
    }
}

/// Write `html` as the `index.html` of `route` under `public_dir`
pub fn write_route(public_dir: &Path, route: &str, html: &str) -> Result<PathBuf> {
    let output_path = public_dir
        .join(route.trim_start_matches('/'))
        .join("index.html");
    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| anyhow::anyhow!("Failed to create dir {:?}: {}", parent, e))?;
    }
    fs::write(&output_path, html)
        .map_err(|e| anyhow::anyhow!("Failed to write {:?}: {}", output_path, e))?;
    Ok(output_path)
}
