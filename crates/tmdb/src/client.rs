//! TMDB (The Movie Database) proxy client.
//!
//! Uses TMDB API v3: https://developer.themoviedb.org/docs

use serde_json::Value;
use tracing::debug;

use cinehub_core::types::MediaType;

use crate::TmdbError;
use crate::query::{DETAILS_APPEND, DiscoverQuery, SearchQuery, TrendingQuery};

const BASE_URL: &str = "https://api.themoviedb.org/3";

/// TMDB credential. The v4 read token is preferred over the v3 api key.
#[derive(Debug, Clone)]
pub enum TmdbAuth {
    /// v4 read token, sent as `Authorization: Bearer <token>`.
    Bearer(String),
    /// v3 api key, sent as the `api_key` query parameter.
    ApiKey(String),
}

impl TmdbAuth {
    pub fn from_credentials(read_token: Option<&str>, api_key: Option<&str>) -> Option<Self> {
        match (read_token, api_key) {
            (Some(t), _) if !t.is_empty() => Some(Self::Bearer(t.to_string())),
            (_, Some(k)) if !k.is_empty() => Some(Self::ApiKey(k.to_string())),
            _ => None,
        }
    }
}

pub struct TmdbClient {
    auth: Option<TmdbAuth>,
    base_url: String,
    client: reqwest::Client,
}

impl TmdbClient {
    pub fn new(auth: Option<TmdbAuth>) -> Self {
        Self::with_base_url(auth, BASE_URL)
    }

    /// Client against a non-default base URL. Used by tests to point at a
    /// local mock upstream.
    pub fn with_base_url(auth: Option<TmdbAuth>, base_url: impl Into<String>) -> Self {
        Self {
            auth,
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.auth.is_some()
    }

    /// Perform one authenticated GET against a TMDB resource path.
    ///
    /// Parameters with empty values are omitted from the outgoing request.
    /// Exactly one outbound request per call; no retry.
    pub async fn fetch_resource(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<Value, TmdbError> {
        let auth = self.auth.as_ref().ok_or(TmdbError::Configuration)?;

        let mut query: Vec<(&str, &str)> = params
            .iter()
            .filter(|(_, v)| !v.is_empty())
            .copied()
            .collect();
        if let TmdbAuth::ApiKey(key) = auth {
            query.push(("api_key", key.as_str()));
        }

        let url = format!("{}{path}", self.base_url);
        debug!(url = %url, "TMDB request");

        let mut req = self
            .client
            .get(&url)
            .query(&query)
            .header(reqwest::header::ACCEPT, "application/json");
        if let TmdbAuth::Bearer(token) = auth {
            req = req.bearer_auth(token);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| TmdbError::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(TmdbError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        resp.json()
            .await
            .map_err(|e| TmdbError::Decode(e.to_string()))
    }

    pub async fn discover(&self, query: &DiscoverQuery) -> Result<Value, TmdbError> {
        self.fetch_owned(&query.path(), &query.params()).await
    }

    pub async fn search(&self, query: &SearchQuery) -> Result<Value, TmdbError> {
        self.fetch_owned(&query.path(), &query.params()).await
    }

    pub async fn trending(&self, query: &TrendingQuery) -> Result<Value, TmdbError> {
        self.fetch_owned(&query.path(), &query.params()).await
    }

    /// Full details in one call, with the fixed `append_to_response` bundle.
    pub async fn details(
        &self,
        media: MediaType,
        id: &str,
        language: Option<&str>,
    ) -> Result<Value, TmdbError> {
        let mut params = vec![("append_to_response", DETAILS_APPEND)];
        if let Some(lang) = language {
            params.push(("language", lang));
        }
        self.fetch_resource(&format!("/{media}/{id}"), &params).await
    }

    pub async fn season(&self, series_id: &str, season_number: &str) -> Result<Value, TmdbError> {
        self.fetch_resource(&format!("/tv/{series_id}/season/{season_number}"), &[])
            .await
    }

    pub async fn genres(&self, media: MediaType) -> Result<Value, TmdbError> {
        self.fetch_resource(&format!("/genre/{media}/list"), &[])
            .await
    }

    async fn fetch_owned(
        &self,
        path: &str,
        params: &[(&'static str, String)],
    ) -> Result<Value, TmdbError> {
        let borrowed: Vec<(&str, &str)> = params.iter().map(|(k, v)| (*k, v.as_str())).collect();
        self.fetch_resource(path, &borrowed).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param, query_param_is_missing};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn bearer_token_goes_in_the_header() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/movie/603"))
            .and(header("authorization", "Bearer token-v4"))
            .and(query_param_is_missing("api_key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 603 })))
            .expect(1)
            .mount(&server)
            .await;

        let client = TmdbClient::with_base_url(
            TmdbAuth::from_credentials(Some("token-v4"), Some("key-v3")),
            server.uri(),
        );
        let data = client.fetch_resource("/movie/603", &[]).await.unwrap();
        assert_eq!(data["id"], 603);
    }

    #[tokio::test]
    async fn api_key_goes_in_the_query_string() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/movie/603"))
            .and(query_param("api_key", "key-v3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 603 })))
            .expect(1)
            .mount(&server)
            .await;

        let client = TmdbClient::with_base_url(
            TmdbAuth::from_credentials(None, Some("key-v3")),
            server.uri(),
        );
        client.fetch_resource("/movie/603", &[]).await.unwrap();
    }

    #[tokio::test]
    async fn missing_credentials_fail_before_any_request() {
        let server = MockServer::start().await;

        let client = TmdbClient::with_base_url(None, server.uri());
        let err = client.fetch_resource("/movie/603", &[]).await.unwrap_err();
        assert!(matches!(err, TmdbError::Configuration));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[test]
    fn empty_credentials_count_as_missing() {
        assert!(TmdbAuth::from_credentials(Some(""), Some("")).is_none());
        assert!(matches!(
            TmdbAuth::from_credentials(Some(""), Some("k")),
            Some(TmdbAuth::ApiKey(_))
        ));
    }

    #[tokio::test]
    async fn non_2xx_surfaces_as_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/movie/0"))
            .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
            .mount(&server)
            .await;

        let client = TmdbClient::with_base_url(
            TmdbAuth::from_credentials(Some("t"), None),
            server.uri(),
        );
        let err = client.fetch_resource("/movie/0", &[]).await.unwrap_err();
        match err {
            TmdbError::Upstream { status, body } => {
                assert_eq!(status, 404);
                assert_eq!(body, "not found");
            }
            other => panic!("expected Upstream, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_params_are_omitted() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/discover/movie"))
            .and(query_param("page", "1"))
            .and(query_param_is_missing("region"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "results": [] })))
            .expect(1)
            .mount(&server)
            .await;

        let client = TmdbClient::with_base_url(
            TmdbAuth::from_credentials(Some("t"), None),
            server.uri(),
        );
        client
            .fetch_resource("/discover/movie", &[("page", "1"), ("region", "")])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn discover_year_reaches_the_wire_with_the_mapped_key() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/discover/movie"))
            .and(query_param("primary_release_year", "1999"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "results": [] })))
            .expect(1)
            .mount(&server)
            .await;

        let client = TmdbClient::with_base_url(
            TmdbAuth::from_credentials(Some("t"), None),
            server.uri(),
        );
        let mut query = DiscoverQuery::new(MediaType::Movie);
        query.year = Some("1999".to_string());
        client.discover(&query).await.unwrap();
    }
}
