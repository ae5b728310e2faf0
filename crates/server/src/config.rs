//! Runtime configuration, read from the environment once at startup.

use cinehub_streaming::registry;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub tmdb_read_token: Option<String>,
    pub tmdb_api_key: Option<String>,
    /// Response cache lifetime for the standard listing routes, in seconds.
    pub cache_ttl_secs: u64,
    /// Origins allowed in the CSP `frame-src` directive.
    pub allowed_iframe_origins: Vec<String>,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let bind_addr =
            std::env::var("CINEHUB_BIND").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        let tmdb_read_token = non_empty(std::env::var("TMDB_READ_TOKEN").ok());
        let tmdb_api_key = non_empty(std::env::var("TMDB_API_KEY").ok());

        let cache_ttl_secs = std::env::var("CACHE_TTL_SECONDS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(300);

        let extra_origins = std::env::var("ALLOWED_IFRAME_ORIGINS").unwrap_or_default();
        let allowed_iframe_origins = merge_iframe_origins(&extra_origins);

        Self {
            bind_addr,
            tmdb_read_token,
            tmdb_api_key,
            cache_ttl_secs,
            allowed_iframe_origins,
        }
    }

    pub fn tmdb_configured(&self) -> bool {
        self.tmdb_read_token.is_some() || self.tmdb_api_key.is_some()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".to_string(),
            tmdb_read_token: None,
            tmdb_api_key: None,
            cache_ttl_secs: 300,
            allowed_iframe_origins: registry::provider_origins(),
        }
    }
}

/// Registry provider origins merged with the comma/space separated
/// `ALLOWED_IFRAME_ORIGINS` allow-list.
pub fn merge_iframe_origins(extra: &str) -> Vec<String> {
    let mut origins = registry::provider_origins();
    for origin in extra.split([',', ' ']) {
        let origin = origin.trim();
        if origin.is_empty() {
            continue;
        }
        if !origins.iter().any(|o| o == origin) {
            origins.push(origin.to_string());
        }
    }
    origins
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iframe_origins_always_include_the_providers() {
        let origins = merge_iframe_origins("");
        assert!(origins.contains(&"https://vidnest.fun".to_string()));
    }

    #[test]
    fn extra_origins_are_merged_and_deduplicated() {
        let origins = merge_iframe_origins("https://example.com, https://vidnest.fun https://example.com");
        assert_eq!(
            origins.iter().filter(|o| *o == "https://example.com").count(),
            1
        );
        assert_eq!(
            origins.iter().filter(|o| *o == "https://vidnest.fun").count(),
            1
        );
    }
}
