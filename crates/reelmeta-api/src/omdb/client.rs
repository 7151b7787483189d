use std::time::Duration;

use reqwest::Client;
use url::Url;

use super::error::OmdbError;
use super::types::OmdbResponse;
use crate::traits::{LookupOutcome, LookupQuery, LookupService};

pub const DEFAULT_BASE_URL: &str = "https://www.omdbapi.com/";

/// OMDb (Open Movie Database) title lookup client.
pub struct OmdbClient {
    base_url: Url,
    api_key: String,
    http: Client,
}

impl OmdbClient {
    /// Build a client whose every request is bounded by `timeout`.
    pub fn new(base_url: &str, api_key: String, timeout: Duration) -> Result<Self, OmdbError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| OmdbError::Config(format!("invalid base URL '{base_url}': {e}")))?;
        if api_key.trim().is_empty() {
            return Err(OmdbError::Config("missing OMDb API key".into()));
        }
        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url,
            api_key,
            http,
        })
    }

    fn query_params(&self, query: &LookupQuery) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("apikey", self.api_key.clone()),
            ("type", query.media_type.as_str().to_string()),
            ("t", query.title.clone()),
        ];
        if let Some(year) = query.year {
            params.push(("y", year.to_string()));
        }
        params
    }

    async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, OmdbError> {
        if resp.status().is_success() {
            Ok(resp)
        } else {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!(status, "OMDb API error");
            Err(OmdbError::Api {
                status,
                message: body,
            })
        }
    }
}

impl LookupService for OmdbClient {
    type Error = OmdbError;

    async fn lookup(&self, query: &LookupQuery) -> Result<LookupOutcome, OmdbError> {
        tracing::debug!(title = %query.title, year = ?query.year, "OMDb request");

        let resp = self
            .http
            .get(self.base_url.clone())
            .query(&self.query_params(query))
            .send()
            .await?;

        let resp = Self::check_response(resp).await?;
        let text = resp.text().await?;
        let body: OmdbResponse = serde_json::from_str(&text).map_err(|e| {
            let preview: String = text.chars().take(200).collect();
            OmdbError::Parse(format!("{e}. Response: {preview}"))
        })?;

        Ok(body.into_outcome())
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use super::*;

    fn client() -> OmdbClient {
        OmdbClient::new(DEFAULT_BASE_URL, "secret".into(), Duration::from_secs(10)).unwrap()
    }

    #[test]
    fn test_params_with_year() {
        let params = client().query_params(&LookupQuery::movie("The Matrix", Some(1999)));
        assert_eq!(
            params,
            vec![
                ("apikey", "secret".to_string()),
                ("type", "movie".to_string()),
                ("t", "The Matrix".to_string()),
                ("y", "1999".to_string()),
            ]
        );
    }

    #[test]
    fn test_params_without_year() {
        let params = client().query_params(&LookupQuery::movie("Heat", None));
        assert!(params.iter().all(|(k, _)| *k != "y"));
        assert!(params.contains(&("t", "Heat".to_string())));
    }

    #[test]
    fn test_rejects_invalid_base_url() {
        let err = OmdbClient::new("not a url", "secret".into(), Duration::from_secs(1));
        assert!(matches!(err, Err(OmdbError::Config(_))));
    }

    #[test]
    fn test_rejects_blank_api_key() {
        let err = OmdbClient::new(DEFAULT_BASE_URL, "  ".into(), Duration::from_secs(1));
        assert!(matches!(err, Err(OmdbError::Config(_))));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_an_error() {
        let client = OmdbClient::new(
            "http://127.0.0.1:9/",
            "secret".into(),
            Duration::from_millis(500),
        )
        .unwrap();
        let result = client.lookup(&LookupQuery::movie("Heat", None)).await;
        assert!(matches!(result, Err(OmdbError::Http(_))));
    }

    /// Serve one canned HTTP response on a local port and return its base URL.
    async fn serve_once(status: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
        });
        format!("http://{addr}/")
    }

    async fn lookup_against(status: &'static str, body: &'static str) -> Result<LookupOutcome, OmdbError> {
        let base = serve_once(status, body).await;
        let client = OmdbClient::new(&base, "secret".into(), Duration::from_secs(5)).unwrap();
        client.lookup(&LookupQuery::movie("Heat", Some(1995))).await
    }

    #[tokio::test]
    async fn test_server_error_status_is_an_error() {
        let result = lookup_against("500 Internal Server Error", "upstream down").await;
        match result {
            Err(OmdbError::Api { status, message }) => {
                assert_eq!(status, 500);
                assert_eq!(message, "upstream down");
            }
            other => panic!("Expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unparsable_body_is_an_error() {
        let result = lookup_against("200 OK", "<html>rate limited</html>").await;
        assert!(matches!(result, Err(OmdbError::Parse(_))));
    }

    #[tokio::test]
    async fn test_not_found_body_is_not_an_error() {
        let result = lookup_against("200 OK", r#"{"Response":"False","Error":"Movie not found!"}"#).await;
        assert_eq!(result.unwrap(), LookupOutcome::NotFound);
    }
}
