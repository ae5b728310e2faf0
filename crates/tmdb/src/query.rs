//! Request-shaped records for the TMDB endpoints this service proxies.
//!
//! Each query type exists only for the duration of one outbound request:
//! it maps incoming route parameters onto TMDB query parameters.

use serde_json::Value;

use cinehub_core::types::{MediaType, SearchKind, TimeWindow, TrendingScope};

/// Sub-resources bundled into a single details call.
pub const DETAILS_APPEND: &str =
    "videos,images,credits,recommendations,release_dates,content_ratings,external_ids";

/// Filter parameters for `/discover/{movie|tv}`.
#[derive(Debug, Clone)]
pub struct DiscoverQuery {
    pub media: MediaType,
    pub page: String,
    pub sort_by: String,
    pub with_genres: Option<String>,
    pub with_original_language: Option<String>,
    pub region: Option<String>,
    pub language: Option<String>,
    pub year: Option<String>,
}

impl DiscoverQuery {
    pub fn new(media: MediaType) -> Self {
        Self {
            media,
            page: "1".to_string(),
            sort_by: "popularity.desc".to_string(),
            with_genres: None,
            with_original_language: None,
            region: None,
            language: None,
            year: None,
        }
    }

    pub fn path(&self) -> String {
        format!("/discover/{}", self.media)
    }

    /// The year filter key TMDB expects depends on the media kind.
    pub fn year_key(media: MediaType) -> &'static str {
        match media {
            MediaType::Movie => "primary_release_year",
            MediaType::Tv => "first_air_date_year",
        }
    }

    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("page", self.page.clone()),
            ("sort_by", self.sort_by.clone()),
        ];
        if let Some(v) = &self.with_genres {
            params.push(("with_genres", v.clone()));
        }
        if let Some(v) = &self.with_original_language {
            params.push(("with_original_language", v.clone()));
        }
        if let Some(v) = &self.region {
            params.push(("region", v.clone()));
        }
        if let Some(v) = &self.language {
            params.push(("language", v.clone()));
        }
        if let Some(v) = &self.year {
            params.push((Self::year_key(self.media), v.clone()));
        }
        params
    }
}

/// Parameters for `/search/{multi|movie|tv}`.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub kind: SearchKind,
    pub query: String,
    pub page: String,
    pub language: Option<String>,
}

impl SearchQuery {
    pub fn new(kind: SearchKind, query: impl Into<String>) -> Self {
        Self {
            kind,
            query: query.into(),
            page: "1".to_string(),
            language: None,
        }
    }

    pub fn path(&self) -> String {
        format!("/search/{}", self.kind)
    }

    /// Queries under two characters are rejected without an upstream call.
    pub fn validate(&self) -> Result<(), String> {
        if self.query.chars().count() < 2 {
            return Err("query too short".to_string());
        }
        Ok(())
    }

    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("query", self.query.clone()),
            ("page", self.page.clone()),
        ];
        if let Some(v) = &self.language {
            params.push(("language", v.clone()));
        }
        params
    }
}

/// Parameters for `/trending/{all|movie|tv}/{day|week}`.
#[derive(Debug, Clone)]
pub struct TrendingQuery {
    pub scope: TrendingScope,
    pub window: TimeWindow,
    pub page: String,
    pub language: Option<String>,
}

impl TrendingQuery {
    pub fn new(scope: TrendingScope, window: TimeWindow) -> Self {
        Self {
            scope,
            window,
            page: "1".to_string(),
            language: None,
        }
    }

    pub fn path(&self) -> String {
        format!("/trending/{}/{}", self.scope, self.window)
    }

    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("page", self.page.clone())];
        if let Some(v) = &self.language {
            params.push(("language", v.clone()));
        }
        params
    }
}

/// Remove `person`-typed entries from a multi-search result set.
///
/// Movie and tv searches never return people, so this only runs for multi.
pub fn strip_person_results(data: &mut Value) {
    if let Some(results) = data.get_mut("results").and_then(Value::as_array_mut) {
        results.retain(|r| r["media_type"] != "person");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn year_key_maps_per_media_kind() {
        assert_eq!(
            DiscoverQuery::year_key(MediaType::Movie),
            "primary_release_year"
        );
        assert_eq!(DiscoverQuery::year_key(MediaType::Tv), "first_air_date_year");
    }

    #[test]
    fn discover_params_include_mapped_year() {
        let mut query = DiscoverQuery::new(MediaType::Tv);
        query.year = Some("1999".to_string());
        let params = query.params();
        assert!(params.contains(&("first_air_date_year", "1999".to_string())));
        assert!(!params.iter().any(|(k, _)| *k == "primary_release_year"));
    }

    #[test]
    fn discover_params_omit_unset_filters() {
        let params = DiscoverQuery::new(MediaType::Movie).params();
        let keys: Vec<&str> = params.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec!["page", "sort_by"]);
    }

    #[test]
    fn discover_defaults() {
        let query = DiscoverQuery::new(MediaType::Movie);
        assert_eq!(query.page, "1");
        assert_eq!(query.sort_by, "popularity.desc");
        assert_eq!(query.path(), "/discover/movie");
    }

    #[test]
    fn short_search_query_is_rejected() {
        assert!(SearchQuery::new(SearchKind::Multi, "a").validate().is_err());
        assert!(SearchQuery::new(SearchKind::Multi, "").validate().is_err());
        assert!(SearchQuery::new(SearchKind::Multi, "ab").validate().is_ok());
    }

    #[test]
    fn search_path_per_kind() {
        assert_eq!(SearchQuery::new(SearchKind::Multi, "dune").path(), "/search/multi");
        assert_eq!(SearchQuery::new(SearchKind::Movie, "dune").path(), "/search/movie");
        assert_eq!(SearchQuery::new(SearchKind::Tv, "dune").path(), "/search/tv");
    }

    #[test]
    fn trending_path() {
        let query = TrendingQuery::new(TrendingScope::All, TimeWindow::Week);
        assert_eq!(query.path(), "/trending/all/week");
    }

    #[test]
    fn person_results_are_stripped() {
        let mut data = json!({
            "page": 1,
            "results": [
                { "id": 1, "media_type": "movie", "title": "Heat" },
                { "id": 2, "media_type": "person", "name": "Al Pacino" },
                { "id": 3, "media_type": "tv", "name": "Mindhunter" }
            ]
        });
        strip_person_results(&mut data);
        let results = data["results"].as_array().unwrap();
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r["media_type"] != "person"));
    }

    #[test]
    fn strip_is_a_no_op_without_results() {
        let mut data = json!({ "page": 1 });
        strip_person_results(&mut data);
        assert_eq!(data, json!({ "page": 1 }));
    }
}
