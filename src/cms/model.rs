//! Response schema of the Prismic REST API
//!
//! Every response crossing the API boundary is parsed into these types, so a
//! shape mismatch surfaces as a decode error instead of a missing field
//! deep inside rendering.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

use crate::richtext::RichTextBlock;

/// API descriptor returned by the endpoint root
#[derive(Debug, Clone, Deserialize)]
pub struct ApiDescriptor {
    pub refs: Vec<ApiRef>,
}

impl ApiDescriptor {
    /// The ref pointing at the published content
    pub fn master_ref(&self) -> Option<&str> {
        self.refs
            .iter()
            .find(|r| r.is_master_ref)
            .map(|r| r.reference.as_str())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiRef {
    pub id: String,
    #[serde(rename = "ref")]
    pub reference: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(rename = "isMasterRef", default)]
    pub is_master_ref: bool,
}

/// Pagination envelope of a search
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub results_per_page: u32,
    #[serde(default)]
    pub total_results_size: u32,
    #[serde(default)]
    pub total_pages: u32,
    /// Cursor to the next page; empty strings are treated as absent
    #[serde(default, deserialize_with = "non_empty_string")]
    pub next_page: Option<String>,
    #[serde(default, deserialize_with = "non_empty_string")]
    pub prev_page: Option<String>,
    pub results: Vec<Document>,
}

/// A post document
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Document {
    pub id: String,
    pub uid: String,
    #[serde(rename = "type")]
    pub document_type: String,
    #[serde(default, deserialize_with = "timestamp")]
    pub first_publication_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "timestamp")]
    pub last_publication_date: Option<DateTime<Utc>>,
    pub data: PostData,
}

/// Custom fields of a post
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PostData {
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub subtitle: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub author: String,
    #[serde(default)]
    pub banner: Option<ImageField>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: Vec<ContentSection>,
}

/// Image field; an unset image is an empty object
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ImageField {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub alt: Option<String>,
}

/// One entry of the `content` group
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ContentSection {
    #[serde(default, deserialize_with = "null_as_default")]
    pub heading: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub body: Vec<RichTextBlock>,
}

/// Parse a Prismic timestamp (`2021-03-15T19:25:28+0000`, RFC 3339 also accepted)
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%z")
        .or_else(|_| DateTime::parse_from_rfc3339(s))
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

fn timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(raw) => parse_timestamp(&raw)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp {:?}", raw))),
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn non_empty_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.filter(|s| !s.trim().is_empty()))
}
