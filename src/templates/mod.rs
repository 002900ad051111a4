//! Built-in site templates using the Tera template engine
//!
//! Templates and static assets are embedded in the binary. Text coming from
//! the CMS is escaped by Tera; only rendered rich text and internally built
//! URLs are marked safe.

use anyhow::Result;
use serde::Serialize;
use tera::{Context, Tera};

use crate::config::SiteConfig;
use crate::format::PostDetail;
use crate::helpers::{listing_path, url_for};
use crate::i18n::{I18n, Strings};
use crate::listing::ListingState;

/// Site logo, written to `assets/logo.svg`
pub const LOGO_SVG: &str = include_str!("assets/logo.svg");

/// Site stylesheet, written to `assets/style.css`
pub const STYLE_CSS: &str = include_str!("assets/style.css");

/// Seconds between reloads of the loading placeholder
const FALLBACK_REFRESH_SECS: u32 = 1;

/// Template renderer with the embedded site theme
pub struct TemplateRenderer {
    tera: Tera,
    i18n: I18n,
    site: SiteData,
}

impl TemplateRenderer {
    /// Create a new renderer with all templates loaded
    pub fn new(config: &SiteConfig, i18n: &I18n) -> Result<Self> {
        let mut tera = Tera::default();

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("site/layout.html")),
            ("index.html", include_str!("site/index.html")),
            ("post.html", include_str!("site/post.html")),
            ("fallback.html", include_str!("site/fallback.html")),
            ("message.html", include_str!("site/message.html")),
            // Partials
            (
                "partials/header.html",
                include_str!("site/partials/header.html"),
            ),
        ])?;

        let site = SiteData {
            title: config.title.clone(),
            language: i18n.language().to_string(),
            root: url_for(config, ""),
            version: env!("CARGO_PKG_VERSION"),
            strings: i18n.strings(),
        };

        Ok(Self {
            tera,
            i18n: i18n.clone(),
            site,
        })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }

    /// Render listing page `page` (1-based) from the posts shown so far
    ///
    /// The "load more" control links to page `page + 1` and is only present
    /// while the listing has a cursor.
    pub fn render_listing(&self, state: &ListingState, page: usize) -> Result<String> {
        let next_link = state
            .has_more()
            .then(|| format!("{}{}", self.site.root, listing_path(page + 1)));

        let mut context = self.base_context();
        context.insert("posts", state.posts());
        context.insert("page", &page);
        context.insert("next_link", &next_link);
        self.render("index.html", &context)
    }

    /// Render an article page
    pub fn render_article(&self, post: &PostDetail) -> Result<String> {
        let mut context = self.base_context();
        context.insert("post", post);
        self.render("post.html", &context)
    }

    /// Render the loading placeholder shown while an article resolves
    pub fn render_fallback(&self, uid: &str) -> Result<String> {
        let mut context = self.base_context();
        context.insert("uid", uid);
        context.insert("refresh_secs", &FALLBACK_REFRESH_SECS);
        self.render("fallback.html", &context)
    }

    /// Render the page for an unknown article
    pub fn render_not_found(&self) -> Result<String> {
        self.render_message("not_found", "not_found_hint")
    }

    /// Render the page for an article that failed to load
    pub fn render_error(&self) -> Result<String> {
        self.render_message("error", "error_hint")
    }

    fn render_message(&self, heading_key: &str, hint_key: &str) -> Result<String> {
        let mut context = self.base_context();
        context.insert("heading", &self.i18n.get(heading_key));
        context.insert("hint", &self.i18n.get(hint_key));
        self.render("message.html", &context)
    }

    fn base_context(&self) -> Context {
        let mut context = Context::new();
        context.insert("site", &self.site);
        context
    }
}

/// Data structures for template context

#[derive(Debug, Clone, Serialize)]
pub struct SiteData {
    pub title: String,
    pub language: String,
    /// Root URL, always ending in `/`
    pub root: String,
    pub version: &'static str,
    pub strings: Strings,
}
