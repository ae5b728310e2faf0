use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use cinehub_core::error::ApiError;
use cinehub_core::types::{MediaType, SearchKind, TimeWindow, TrendingScope};
use cinehub_streaming::player::{PlayerEvent, PlayerState};
use cinehub_streaming::{StreamServer, registry};
use cinehub_tmdb::TmdbError;
use cinehub_tmdb::query::{DiscoverQuery, SearchQuery, TrendingQuery, strip_person_results};

use crate::csp::csp_header;
use crate::error::AppError;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let csp = header::HeaderValue::from_str(&csp_header(&state.config.allowed_iframe_origins))
        .unwrap_or_else(|_| header::HeaderValue::from_static("default-src 'self'"));

    Router::new()
        .nest("/api", api_router())
        .layer(
            tower::ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(SetResponseHeaderLayer::if_not_present(
                    header::CONTENT_SECURITY_POLICY,
                    csp,
                )),
        )
        .with_state(state)
}

fn api_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/discover", get(discover))
        .route("/search", get(search))
        .route("/trending", get(trending))
        .route("/details/{media}/{id}", get(details))
        .route("/tv/{id}/season/{season}", get(season))
        .route("/genres/{media}", get(genres))
        .route("/filters", get(filters))
        .route("/home", get(home))
        .route("/stream/movie/{id}", get(stream_movie))
        .route("/stream/tv/{id}/{season}/{episode}", get(stream_episode))
        .route("/playback/sessions", post(create_playback_session))
        .route(
            "/playback/sessions/{id}",
            get(get_playback_session).delete(stop_playback_session),
        )
        .route("/playback/sessions/{id}/events", post(playback_event))
}

/// TMDB-backed responses are cached at the HTTP layer only, with a
/// revalidation TTL.
fn cached_json(data: Value, max_age_secs: u64) -> Response {
    (
        [(
            header::CACHE_CONTROL,
            format!(
                "s-maxage={max_age_secs}, stale-while-revalidate={}",
                max_age_secs * 10
            ),
        )],
        Json(data),
    )
        .into_response()
}

fn parse_media(s: &str) -> Result<MediaType, AppError> {
    MediaType::parse(s)
        .ok_or_else(|| ApiError::BadRequest(format!("type must be 'movie' or 'tv', got '{s}'")).into())
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

async fn health(State(state): State<AppState>) -> Json<Value> {
    let has_v4 = state.config.tmdb_read_token.is_some();
    let has_v3 = state.config.tmdb_api_key.is_some();
    let configured = has_v3 || has_v4;

    Json(json!({
        "status": if configured { "ok" } else { "missing_tmdb_credentials" },
        "tmdb": {
            "has_v3_api_key": has_v3,
            "has_v4_bearer": has_v4,
            "configured": configured,
        },
        "cache": { "ttl_seconds": state.config.cache_ttl_secs },
        "security": { "allowed_iframe_origins": state.config.allowed_iframe_origins },
    }))
}

// ---------------------------------------------------------------------------
// Discover
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct DiscoverParams {
    #[serde(rename = "type")]
    media: Option<String>,
    page: Option<String>,
    sort_by: Option<String>,
    /// Shorthand alias for `sort_by`.
    sort: Option<String>,
    with_genres: Option<String>,
    with_original_language: Option<String>,
    region: Option<String>,
    language: Option<String>,
    year: Option<String>,
}

async fn discover(
    State(state): State<AppState>,
    Query(params): Query<DiscoverParams>,
) -> Result<Response, AppError> {
    let media = parse_media(params.media.as_deref().unwrap_or("movie"))?;

    let mut query = DiscoverQuery::new(media);
    if let Some(page) = params.page {
        query.page = page;
    }
    if let Some(sort_by) = params.sort_by.or(params.sort) {
        query.sort_by = sort_by;
    }
    query.with_genres = params.with_genres;
    query.with_original_language = params.with_original_language;
    query.region = params.region;
    query.language = params.language;
    query.year = params.year;

    let data = state.tmdb.discover(&query).await?;
    Ok(cached_json(data, state.config.cache_ttl_secs))
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct SearchParams {
    q: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    page: Option<String>,
    language: Option<String>,
}

async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Response, AppError> {
    let kind_str = params.kind.as_deref().unwrap_or("multi");
    let kind = SearchKind::parse(kind_str).ok_or_else(|| {
        ApiError::BadRequest(format!(
            "type must be 'multi', 'movie' or 'tv', got '{kind_str}'"
        ))
    })?;

    let mut query = SearchQuery::new(kind, params.q.unwrap_or_default());
    if let Some(page) = params.page {
        query.page = page;
    }
    query.language = params.language;
    query.validate().map_err(ApiError::BadRequest)?;

    let mut data = state.tmdb.search(&query).await?;
    if kind == SearchKind::Multi {
        strip_person_results(&mut data);
    }
    Ok(cached_json(data, 60))
}

// ---------------------------------------------------------------------------
// Trending
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct TrendingParams {
    media_type: Option<String>,
    time_window: Option<String>,
    page: Option<String>,
    language: Option<String>,
}

async fn trending(
    State(state): State<AppState>,
    Query(params): Query<TrendingParams>,
) -> Result<Response, AppError> {
    let scope_str = params.media_type.as_deref().unwrap_or("all");
    let scope = TrendingScope::parse(scope_str).ok_or_else(|| {
        ApiError::BadRequest(format!(
            "media_type must be 'all', 'movie' or 'tv', got '{scope_str}'"
        ))
    })?;
    let window_str = params.time_window.as_deref().unwrap_or("week");
    let window = TimeWindow::parse(window_str).ok_or_else(|| {
        ApiError::BadRequest(format!(
            "time_window must be 'day' or 'week', got '{window_str}'"
        ))
    })?;

    let mut query = TrendingQuery::new(scope, window);
    if let Some(page) = params.page {
        query.page = page;
    }
    query.language = params.language;

    let data = state.tmdb.trending(&query).await?;
    Ok(cached_json(data, state.config.cache_ttl_secs))
}

// ---------------------------------------------------------------------------
// Details / seasons / genres
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct DetailsParams {
    language: Option<String>,
}

async fn details(
    State(state): State<AppState>,
    Path((media, id)): Path<(String, String)>,
    Query(params): Query<DetailsParams>,
) -> Result<Response, AppError> {
    let media = parse_media(&media)?;
    let data = state
        .tmdb
        .details(media, &id, params.language.as_deref())
        .await?;
    Ok(cached_json(data, 600))
}

async fn season(
    State(state): State<AppState>,
    Path((id, season_number)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let data = state.tmdb.season(&id, &season_number).await?;
    Ok(cached_json(data, 600))
}

async fn genres(
    State(state): State<AppState>,
    Path(media): Path<String>,
) -> Result<Response, AppError> {
    let media = parse_media(&media)?;
    let data = state.tmdb.genres(media).await?;
    Ok(cached_json(data, state.config.cache_ttl_secs))
}

// ---------------------------------------------------------------------------
// Filters (genre lists + year list for the browse UI)
// ---------------------------------------------------------------------------

async fn filters(State(state): State<AppState>) -> Result<Response, AppError> {
    use chrono::Datelike;

    let (movie_genres, tv_genres) = tokio::join!(
        state.tmdb.genres(MediaType::Movie),
        state.tmdb.genres(MediaType::Tv)
    );
    let movie_genres = movie_genres?;
    let tv_genres = tv_genres?;

    let current_year = chrono::Utc::now().year();
    let years: Vec<String> = (0..80).map(|i| (current_year - i).to_string()).collect();

    Ok(cached_json(
        json!({
            "movie_genres": genre_list(&movie_genres),
            "tv_genres": genre_list(&tv_genres),
            "years": years,
        }),
        86400,
    ))
}

fn genre_list(data: &Value) -> Value {
    data.get("genres").cloned().unwrap_or_else(|| json!([]))
}

// ---------------------------------------------------------------------------
// Home aggregation
// ---------------------------------------------------------------------------

/// Trending plus five discover variants, fetched as one concurrent batch.
/// A failed sub-fetch degrades to an empty list so the rest of the page
/// still renders.
async fn home(State(state): State<AppState>) -> Result<Response, AppError> {
    let trending_query = TrendingQuery::new(TrendingScope::All, TimeWindow::Week);
    let popular_movies_query = DiscoverQuery::new(MediaType::Movie);
    let popular_tv_query = DiscoverQuery::new(MediaType::Tv);
    let mut top_movies_query = DiscoverQuery::new(MediaType::Movie);
    top_movies_query.sort_by = "vote_average.desc".to_string();
    let mut top_tv_query = DiscoverQuery::new(MediaType::Tv);
    top_tv_query.sort_by = "vote_average.desc".to_string();
    let mut upcoming_query = DiscoverQuery::new(MediaType::Movie);
    upcoming_query.sort_by = "release_date.desc".to_string();

    let (trending, popular_movies, popular_tv, top_movies, top_tv, upcoming) = tokio::join!(
        state.tmdb.trending(&trending_query),
        state.tmdb.discover(&popular_movies_query),
        state.tmdb.discover(&popular_tv_query),
        state.tmdb.discover(&top_movies_query),
        state.tmdb.discover(&top_tv_query),
        state.tmdb.discover(&upcoming_query),
    );

    Ok(cached_json(
        json!({
            "trending": or_empty(trending),
            "popular_movies": or_empty(popular_movies),
            "popular_tv": or_empty(popular_tv),
            "top_rated_movies": or_empty(top_movies),
            "top_rated_tv": or_empty(top_tv),
            "upcoming_movies": or_empty(upcoming),
        }),
        state.config.cache_ttl_secs,
    ))
}

fn or_empty(result: Result<Value, TmdbError>) -> Value {
    match result {
        Ok(data) => data,
        Err(e) => {
            tracing::warn!(error = %e, "home sub-fetch degraded to empty list");
            json!({ "results": [] })
        }
    }
}

// ---------------------------------------------------------------------------
// Stream servers
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct ServersResponse {
    servers: Vec<StreamServer>,
}

async fn stream_movie(Path(id): Path<String>) -> Json<ServersResponse> {
    Json(ServersResponse {
        servers: registry::movie_servers(&id),
    })
}

async fn stream_episode(
    Path((id, season_number, episode_number)): Path<(String, String, String)>,
) -> Json<ServersResponse> {
    Json(ServersResponse {
        servers: registry::episode_servers(&id, &season_number, &episode_number),
    })
}

// ---------------------------------------------------------------------------
// Playback sessions (fallback player)
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct CreateSessionRequest {
    media_type: String,
    id: String,
    #[serde(default)]
    season: Option<String>,
    #[serde(default)]
    episode: Option<String>,
}

#[derive(Serialize)]
struct SessionResponse {
    session_id: String,
    state: PlayerState,
}

async fn create_playback_session(
    State(state): State<AppState>,
    Json(body): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<SessionResponse>), AppError> {
    let media = parse_media(&body.media_type)?;
    let servers = match media {
        MediaType::Movie => registry::movie_servers(&body.id),
        MediaType::Tv => {
            let (Some(season_number), Some(episode_number)) = (&body.season, &body.episode) else {
                return Err(
                    ApiError::BadRequest("tv playback requires season and episode".into()).into(),
                );
            };
            registry::episode_servers(&body.id, season_number, episode_number)
        }
    };

    let (session_id, player) = state.sessions.create(servers).await?;
    Ok((
        StatusCode::CREATED,
        Json(SessionResponse {
            session_id,
            state: player,
        }),
    ))
}

async fn get_playback_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionResponse>, AppError> {
    let player = state.sessions.get(&id).await?;
    Ok(Json(SessionResponse {
        session_id: id,
        state: player,
    }))
}

/// Iframe load/error callbacks and user actions, injected as events.
#[derive(Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum PlaybackEventRequest {
    Loaded,
    Failed,
    NotWorking,
    Select { index: usize },
}

impl From<PlaybackEventRequest> for PlayerEvent {
    fn from(req: PlaybackEventRequest) -> Self {
        match req {
            PlaybackEventRequest::Loaded => PlayerEvent::FrameLoaded,
            PlaybackEventRequest::Failed => PlayerEvent::FrameFailed,
            PlaybackEventRequest::NotWorking => PlayerEvent::NotWorking,
            PlaybackEventRequest::Select { index } => PlayerEvent::Select(index),
        }
    }
}

async fn playback_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<PlaybackEventRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    let player = state.sessions.dispatch(&id, body.into()).await?;
    Ok(Json(SessionResponse {
        session_id: id,
        state: player,
    }))
}

async fn stop_playback_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    state.sessions.remove(&id).await?;
    Ok(Json(json!({ "ok": true })))
}
