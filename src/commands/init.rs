//! Initialize a new blog

use anyhow::Result;
use std::fs;
use std::path::Path;

use crate::CONFIG_FILE;

const DEFAULT_CONFIG: &str = r#"# Site
title: spacetraveling
language: pt-BR
timezone: UTC

# URL
root: /

# Directory
public_dir: public

# Date / reading time
## date-fns style tokens: dd, MMM, yyyy, HH, mm...
date_format: dd MMM yyyy
words_per_minute: 200

# Content source
## PRISMIC_API_ENDPOINT and PRISMIC_ACCESS_TOKEN override these values
cms:
  endpoint: ''
  access_token:
  document_type: post
  page_size: 1
  paths_page_size: 100
  max_pages: 100
"#;

/// Initialize a new site in the given directory
///
/// An existing configuration file is left untouched.
pub fn init_site(target_dir: &Path) -> Result<()> {
    fs::create_dir_all(target_dir)?;
    fs::create_dir_all(target_dir.join("languages"))?;

    let config_path = target_dir.join(CONFIG_FILE);
    if config_path.exists() {
        tracing::warn!("{:?} already exists, keeping it", config_path);
    } else {
        fs::write(&config_path, DEFAULT_CONFIG)?;
        tracing::info!("Created {:?}", config_path);
    }

    Ok(())
}
