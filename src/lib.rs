//! blog-rs: a static blog generator backed by a headless CMS
//!
//! Posts are fetched from a Prismic repository, mapped into display records
//! and rendered with embedded Tera templates. The development server serves
//! the generated site and renders articles missing from it on demand.

pub mod article;
pub mod cms;
pub mod commands;
pub mod config;
pub mod format;
pub mod generator;
pub mod helpers;
pub mod i18n;
pub mod listing;
pub mod richtext;
pub mod server;
pub mod templates;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cms::{ContentSource, PrismicClient};
use crate::format::Formatter;
use crate::i18n::I18n;
use crate::templates::TemplateRenderer;

/// Configuration file name, relative to the base directory
pub const CONFIG_FILE: &str = "_config.yml";

/// The main blog application
#[derive(Clone)]
pub struct Blog {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Public (output) directory
    pub public_dir: PathBuf,
}

impl Blog {
    /// Create a new instance from a directory, applying environment overrides
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config_path = base_dir.join(CONFIG_FILE);

        let mut config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            tracing::warn!("No {} found in {:?}, using defaults", CONFIG_FILE, base_dir);
            config::SiteConfig::default()
        };
        config.apply_env();

        Ok(Self::with_config(base_dir, config))
    }

    /// Create an instance from an already loaded configuration
    pub fn with_config<P: AsRef<Path>>(base_dir: P, config: config::SiteConfig) -> Self {
        let base_dir = base_dir.as_ref().to_path_buf();
        let public_dir = base_dir.join(&config.public_dir);

        Self {
            config,
            base_dir,
            public_dir,
        }
    }

    /// HTTP client for the configured CMS repository
    pub fn content_source(&self) -> Result<Arc<dyn ContentSource>> {
        let client = PrismicClient::new(&self.config.cms).with_context(|| {
            format!(
                "cms.endpoint must be set in {} or via {}",
                CONFIG_FILE,
                config::ENV_ENDPOINT
            )
        })?;
        Ok(Arc::new(client))
    }

    /// Formatter for display dates and reading time
    pub fn formatter(&self) -> Result<Formatter> {
        Formatter::new(&self.config)
    }

    /// UI strings, including overrides from `languages/`
    pub fn i18n(&self) -> Result<I18n> {
        let mut i18n = I18n::new(&self.config.language);
        i18n.load_languages(self.base_dir.join("languages"))?;
        Ok(i18n)
    }

    /// Template renderer for this site
    pub fn renderer(&self) -> Result<TemplateRenderer> {
        TemplateRenderer::new(&self.config, &self.i18n()?)
    }

    /// Generate the static site
    pub async fn generate(&self) -> Result<()> {
        commands::generate::run(self).await
    }

    /// Clean the public directory
    pub fn clean(&self) -> Result<()> {
        commands::clean::run(self)
    }
}
