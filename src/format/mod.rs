//! Formatter - maps API documents into the display shape used by the pages
//!
//! All mappings borrow their input and only depend on the site
//! configuration captured in [`Formatter`].

use anyhow::{anyhow, Result};
use chrono::{DateTime, Locale, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use crate::cms::{ContentSection, Document};
use crate::config::SiteConfig;
use crate::helpers::{count_words, date_xml, display_date, parse_locale};
use crate::richtext;

/// Post as shown in the listing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostSummary {
    pub uid: String,
    /// Locale-formatted first publication date
    pub first_publication_date: Option<String>,
    /// Machine-readable first publication date
    pub published_at: Option<String>,
    pub title: String,
    pub subtitle: String,
    pub author: String,
}

/// Post as shown on its article page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostDetail {
    pub uid: String,
    pub first_publication_date: Option<String>,
    pub published_at: Option<String>,
    pub title: String,
    pub subtitle: String,
    pub author: String,
    pub banner_url: Option<String>,
    pub sections: Vec<Section>,
    /// Estimated reading time in minutes
    pub estimated_read_time: usize,
}

/// A content section with its body rendered to HTML
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Section {
    pub heading: String,
    pub body_html: String,
}

/// Display settings for dates and reading time
pub struct Formatter {
    timezone: Tz,
    locale: Locale,
    date_format: String,
    words_per_minute: usize,
}

impl Formatter {
    /// Create a formatter from the site configuration
    pub fn new(config: &SiteConfig) -> Result<Self> {
        let timezone: Tz = config
            .timezone
            .parse()
            .map_err(|_| anyhow!("Unknown timezone: {}", config.timezone))?;
        let locale = parse_locale(&config.language)
            .ok_or_else(|| anyhow!("Unsupported language: {}", config.language))?;

        Ok(Self {
            timezone,
            locale,
            date_format: config.date_format.clone(),
            words_per_minute: config.words_per_minute.max(1),
        })
    }

    /// Locale-formatted date, if any
    pub fn display_date(&self, date: Option<&DateTime<Utc>>) -> Option<String> {
        date.map(|d| display_date(d, self.timezone, &self.date_format, self.locale))
    }

    /// Map a document to its listing shape
    pub fn summary(&self, doc: &Document) -> PostSummary {
        PostSummary {
            uid: doc.uid.clone(),
            first_publication_date: self.display_date(doc.first_publication_date.as_ref()),
            published_at: doc.first_publication_date.as_ref().map(date_xml),
            title: doc.data.title.clone(),
            subtitle: doc.data.subtitle.clone(),
            author: doc.data.author.clone(),
        }
    }

    /// Map a document to its article shape
    pub fn detail(&self, doc: &Document) -> PostDetail {
        let sections = doc
            .data
            .content
            .iter()
            .map(|s| Section {
                heading: s.heading.clone(),
                body_html: richtext::as_html(&s.body),
            })
            .collect();

        PostDetail {
            uid: doc.uid.clone(),
            first_publication_date: self.display_date(doc.first_publication_date.as_ref()),
            published_at: doc.first_publication_date.as_ref().map(date_xml),
            title: doc.data.title.clone(),
            subtitle: doc.data.subtitle.clone(),
            author: doc.data.author.clone(),
            banner_url: doc.data.banner.as_ref().and_then(|b| b.url.clone()),
            sections,
            estimated_read_time: reading_time(&doc.data.content, self.words_per_minute),
        }
    }
}

/// Words in all headings and bodies of the content sections
pub fn count_section_words(sections: &[ContentSection]) -> usize {
    sections
        .iter()
        .map(|s| count_words(&s.heading) + count_words(&richtext::as_text(&s.body)))
        .sum()
}

/// Estimated reading time in whole minutes, rounded up
pub fn reading_time(sections: &[ContentSection], words_per_minute: usize) -> usize {
    count_section_words(sections).div_ceil(words_per_minute.max(1))
}
