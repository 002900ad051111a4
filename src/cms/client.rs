//! Prismic REST API client

use async_trait::async_trait;
use reqwest::Url;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio::sync::OnceCell;

use super::{ApiDescriptor, CmsError, ContentSource, Document, SearchResponse};
use crate::config::CmsConfig;

/// HTTP client bound to one repository endpoint and its credentials
pub struct PrismicClient {
    http: reqwest::Client,
    endpoint: String,
    access_token: Option<String>,
    master_ref: OnceCell<String>,
}

impl PrismicClient {
    /// Create a client from the CMS configuration
    pub fn new(config: &CmsConfig) -> Result<Self, CmsError> {
        let endpoint = config.endpoint.trim().trim_end_matches('/').to_string();
        Url::parse(&endpoint).map_err(|e| CmsError::InvalidUrl {
            url: endpoint.clone(),
            message: e.to_string(),
        })?;

        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("blog-rs/", env!("CARGO_PKG_VERSION")));
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder.build().map_err(|source| CmsError::Http {
            url: endpoint.clone(),
            source,
        })?;

        Ok(Self {
            http,
            endpoint,
            access_token: config.access_token.clone().filter(|t| !t.is_empty()),
            master_ref: OnceCell::new(),
        })
    }

    /// The master ref, fetched once from the API descriptor
    async fn master_ref(&self) -> Result<&str, CmsError> {
        let reference = self
            .master_ref
            .get_or_try_init(|| async {
                let url = self.url(&self.endpoint, &[])?;
                let api: ApiDescriptor = self.get_json(url).await?;
                let reference = api
                    .master_ref()
                    .ok_or_else(|| CmsError::MissingMasterRef(self.endpoint.clone()))?;
                tracing::debug!("Using master ref {}", reference);
                Ok::<_, CmsError>(reference.to_string())
            })
            .await?;
        Ok(reference.as_str())
    }

    async fn search(&self, predicate: &str, page_size: usize) -> Result<SearchResponse, CmsError> {
        let reference = self.master_ref().await?;
        let page_size = page_size.to_string();
        let url = self.url(
            &format!("{}/documents/search", self.endpoint),
            &[
                ("ref", reference),
                ("q", predicate),
                ("pageSize", page_size.as_str()),
            ],
        )?;
        self.get_json(url).await
    }

    /// Build a URL, appending the access token when one is configured
    fn url(&self, base: &str, params: &[(&str, &str)]) -> Result<Url, CmsError> {
        let mut url = Url::parse(base).map_err(|e| CmsError::InvalidUrl {
            url: base.to_string(),
            message: e.to_string(),
        })?;
        {
            let mut query = url.query_pairs_mut();
            for (key, value) in params {
                query.append_pair(key, value);
            }
            if let Some(token) = &self.access_token {
                query.append_pair("access_token", token);
            }
        }
        if url.query() == Some("") {
            url.set_query(None);
        }
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, CmsError> {
        let display_url = redact(&url);
        tracing::debug!("GET {}", display_url);

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|source| CmsError::Http {
                url: display_url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(CmsError::Status {
                url: display_url,
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|source| CmsError::Http {
            url: display_url.clone(),
            source,
        })?;
        serde_json::from_slice(&body).map_err(|source| CmsError::Decode {
            url: display_url,
            source,
        })
    }
}

#[async_trait]
impl ContentSource for PrismicClient {
    async fn query(
        &self,
        document_type: &str,
        page_size: usize,
    ) -> Result<SearchResponse, CmsError> {
        let predicate = format!("[[at(document.type, \"{}\")]]", quote(document_type));
        self.search(&predicate, page_size).await
    }

    async fn get_by_uid(&self, document_type: &str, uid: &str) -> Result<Document, CmsError> {
        let predicate = format!(
            "[[at(my.{}.uid, \"{}\")]]",
            quote(document_type),
            quote(uid)
        );
        let response = self.search(&predicate, 1).await?;
        response
            .results
            .into_iter()
            .next()
            .ok_or_else(|| CmsError::NotFound {
                document_type: document_type.to_string(),
                uid: uid.to_string(),
            })
    }

    async fn fetch_page(&self, cursor: &str) -> Result<SearchResponse, CmsError> {
        let mut url = Url::parse(cursor).map_err(|e| CmsError::InvalidUrl {
            url: cursor.to_string(),
            message: e.to_string(),
        })?;
        // cursors of private repositories do not always repeat the token
        if let Some(token) = &self.access_token {
            if !url.query_pairs().any(|(key, _)| key == "access_token") {
                url.query_pairs_mut().append_pair("access_token", token);
            }
        }
        self.get_json(url).await
    }
}

/// Escape a value embedded in a predicate string literal
fn quote(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// URL for logs and errors, without the access token
fn redact(url: &Url) -> String {
    let mut redacted = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != "access_token")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    if pairs.is_empty() {
        redacted.set_query(None);
    } else {
        redacted.query_pairs_mut().clear().extend_pairs(pairs);
    }
    redacted.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cms::testing::{api_json, document_json, search_json};
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mock_api(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/api/v2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(api_json("MASTER")))
            .expect(1)
            .mount(server)
            .await;
    }

    fn client_for(server: &MockServer, token: Option<&str>) -> PrismicClient {
        let config = CmsConfig {
            endpoint: format!("{}/api/v2", server.uri()),
            access_token: token.map(str::to_string),
            ..Default::default()
        };
        PrismicClient::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_query_by_type() {
        let server = MockServer::start().await;
        mock_api(&server).await;
        let next = format!("{}/api/v2/documents/search?page=2", server.uri());
        Mock::given(method("GET"))
            .and(path("/api/v2/documents/search"))
            .and(query_param("ref", "MASTER"))
            .and(query_param("q", "[[at(document.type, \"post\")]]"))
            .and(query_param("pageSize", "1"))
            .and(query_param("access_token", "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(search_json(
                vec![document_json("first", "First post", Some("2021-03-15T19:25:28+0000"))],
                Some(next.as_str()),
            )))
            .mount(&server)
            .await;

        let client = client_for(&server, Some("secret"));
        let page = client.query("post", 1).await.unwrap();
        assert_eq!(page.results.len(), 1);
        assert_eq!(page.results[0].uid, "first");
        assert_eq!(page.next_page.as_deref(), Some(next.as_str()));

        // master ref is cached; the descriptor mock expects a single call
        client.query("post", 1).await.unwrap();
    }

    #[tokio::test]
    async fn test_get_by_uid() {
        let server = MockServer::start().await;
        mock_api(&server).await;
        Mock::given(method("GET"))
            .and(path("/api/v2/documents/search"))
            .and(query_param("q", "[[at(my.post.uid, \"hello\")]]"))
            .respond_with(ResponseTemplate::new(200).set_body_json(search_json(
                vec![document_json("hello", "Hello", None)],
                None,
            )))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v2/documents/search"))
            .and(query_param("q", "[[at(my.post.uid, \"missing\")]]"))
            .respond_with(ResponseTemplate::new(200).set_body_json(search_json(vec![], None)))
            .mount(&server)
            .await;

        let client = client_for(&server, None);
        let doc = client.get_by_uid("post", "hello").await.unwrap();
        assert_eq!(doc.data.title, "Hello");

        let err = client.get_by_uid("post", "missing").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_fetch_page_and_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/cursor/2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(search_json(
                vec![document_json("second", "Second", None)],
                None,
            )))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/cursor/broken"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/cursor/gone"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = client_for(&server, None);
        let page = client
            .fetch_page(&format!("{}/cursor/2", server.uri()))
            .await
            .unwrap();
        assert_eq!(page.results[0].uid, "second");
        assert!(page.next_page.is_none());

        let err = client
            .fetch_page(&format!("{}/cursor/broken", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, CmsError::Decode { .. }));

        let err = client
            .fetch_page(&format!("{}/cursor/gone", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, CmsError::Status { status: 500, .. }));

        let err = client.fetch_page("not a url").await.unwrap_err();
        assert!(matches!(err, CmsError::InvalidUrl { .. }));
    }

    #[tokio::test]
    async fn test_fetch_page_sends_access_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/documents/search"))
            .and(query_param("page", "2"))
            .and(query_param("access_token", "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(search_json(
                vec![document_json("second", "Second", None)],
                None,
            )))
            .expect(2)
            .mount(&server)
            .await;

        let client = client_for(&server, Some("secret"));
        let bare = format!("{}/api/v2/documents/search?page=2", server.uri());
        let page = client.fetch_page(&bare).await.unwrap();
        assert_eq!(page.results[0].uid, "second");

        // a token already on the cursor is kept as is
        let with_token = format!("{}&access_token=secret", bare);
        client.fetch_page(&with_token).await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_master_ref() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"refs": []})))
            .mount(&server)
            .await;

        let client = client_for(&server, None);
        let err = client.query("post", 1).await.unwrap_err();
        assert!(matches!(err, CmsError::MissingMasterRef(_)));
    }

    #[test]
    fn test_invalid_endpoint() {
        let config = CmsConfig::default();
        assert!(matches!(
            PrismicClient::new(&config),
            Err(CmsError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_redact() {
        let url = Url::parse("https://x.io/api/v2/documents/search?ref=M&access_token=s").unwrap();
        assert_eq!(redact(&url), "https://x.io/api/v2/documents/search?ref=M");
        let url = Url::parse("https://x.io/api/v2?access_token=s").unwrap();
        assert_eq!(redact(&url), "https://x.io/api/v2");
    }

    #[test]
    fn test_quote() {
        assert_eq!(quote(r#"a"b\c"#), r#"a\"b\\c"#);
    }
}
