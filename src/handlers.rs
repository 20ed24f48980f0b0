use std::convert::Infallible;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_stream::stream;
use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::Json;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::warn;

use score_stream::render_index;

use crate::constants::{
    DEFAULT_PAGE_SIZE, INITIAL_PAYLOAD_LIMIT, LEADERBOARD_DEFAULT_LIMIT, LEADERBOARD_MAX_LIMIT,
    LEADERBOARD_MIN_LIMIT, MAX_NAME_LEN, MAX_PAGE_SIZE,
};
use crate::models::{
    CachedPayload, LeaderboardPayload, ScoresPayload, SubmitRequest, SubmitResponse,
};
use crate::normalize::{normalize, NormalizeError, SortMode};
use crate::state::{AppState, StreamEvent};
use crate::util::now_ms;

#[derive(Deserialize)]
pub(crate) struct LeaderboardParams {
    limit: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ScoresParams {
    sort: Option<String>,
    page: Option<String>,
    per_page: Option<String>,
}

pub(crate) async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

pub(crate) async fn index_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let html = state.initial_html.read().await.clone();
    let mut response = Response::new(Body::from(html));
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/html; charset=utf-8"),
    );
    response
}

pub(crate) async fn docs_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let mut response = Response::new(Body::from(state.docs_html.clone()));
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/html; charset=utf-8"),
    );
    response
}

pub(crate) async fn leaderboard_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LeaderboardParams>,
) -> Response {
    let limit = clamp_limit(params.limit.as_deref());
    let now = now_ms();

    {
        let cache = state.leaderboard_cache.read().await;
        if let Some(entry) = cache.get(&limit) {
            if now.saturating_sub(entry.ts_ms) < state.config.api_cache_ttl.as_millis() as u64 {
                return json_response(&entry.payload);
            }
        }
    }

    match build_leaderboard_payload(&state, limit, now).await {
        Ok(payload) => {
            {
                let mut cache = state.leaderboard_cache.write().await;
                cache.insert(
                    limit,
                    CachedPayload {
                        ts_ms: now,
                        payload: payload.clone(),
                    },
                );
            }
            json_response(&payload)
        }
        Err(err) => {
            // Serve the last good payload before surfacing the failure.
            let cache = state.leaderboard_cache.read().await;
            if let Some(entry) = cache.get(&limit) {
                return json_response(&entry.payload);
            }
            error_response(err.to_string())
        }
    }
}

pub(crate) async fn scores_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ScoresParams>,
) -> Response {
    let page = match parse_positive(params.page.as_deref(), 1) {
        Ok(page) => page,
        Err(message) => return bad_request_response(message),
    };
    let per_page = match parse_positive(params.per_page.as_deref(), DEFAULT_PAGE_SIZE) {
        Ok(per_page) => per_page.min(MAX_PAGE_SIZE),
        Err(message) => return bad_request_response(message),
    };
    let sort = SortMode::parse(params.sort.as_deref());

    if let Err(err) = ensure_score_book(&state).await {
        return error_response(err.to_string());
    }

    let book = state.score_book.read().await;
    match normalize(&book.entries, sort, page, per_page) {
        Ok(result) => {
            let payload = ScoresPayload {
                sort: sort.as_str().to_string(),
                page,
                per_page,
                total_pages: result.total_pages,
                total_unique: result.total_unique,
                entries: result.items,
                ts: now_ms(),
            };
            json_response(&payload)
        }
        Err(err @ NormalizeError::InvalidArgument { .. }) => bad_request_response(err.to_string()),
    }
}

pub(crate) async fn submit_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SubmitRequest>,
) -> Response {
    let name = request.name.trim();
    if name.is_empty() {
        return bad_request_response("name must not be empty".to_string());
    }
    if name.chars().count() > MAX_NAME_LEN {
        return bad_request_response(format!("name must be at most {} characters", MAX_NAME_LEN));
    }

    if let Err(err) = state.upstream.submit(name, request.score).await {
        warn!(?err, "score submission failed");
        return error_response(err.to_string());
    }

    // Pick the new score up promptly instead of waiting for the next tick.
    let state = Arc::clone(&state);
    tokio::spawn(async move {
        crate::background::refresh_scores(&state).await;
    });

    json_response(&SubmitResponse { status: "success" })
}

pub(crate) async fn options_handler() -> impl IntoResponse {
    (StatusCode::NO_CONTENT, cors_headers())
}

fn json_response<T: Serialize>(payload: &T) -> Response {
    let body = match serde_json::to_string(payload) {
        Ok(body) => body,
        Err(err) => return error_response(err.to_string()),
    };
    let mut headers = cors_headers();
    headers.insert("Content-Type", HeaderValue::from_static("application/json"));
    headers.insert(
        "Cache-Control",
        HeaderValue::from_static(
            "public, s-maxage=1, stale-while-revalidate=1, stale-if-error=30",
        ),
    );
    (StatusCode::OK, headers, body).into_response()
}

fn error_response(message: String) -> Response {
    let headers = cors_headers();
    (StatusCode::INTERNAL_SERVER_ERROR, headers, message).into_response()
}

fn bad_request_response(message: String) -> Response {
    let headers = cors_headers();
    (StatusCode::BAD_REQUEST, headers, message).into_response()
}

fn clamp_limit(input: Option<&str>) -> usize {
    let value = input
        .and_then(|value| value.parse::<usize>().ok())
        .unwrap_or(LEADERBOARD_DEFAULT_LIMIT);
    value.clamp(LEADERBOARD_MIN_LIMIT, LEADERBOARD_MAX_LIMIT)
}

/// Pagination parameters must be positive when present; absent means the
/// default. Zero and garbage are client errors rather than silent clamps.
fn parse_positive(input: Option<&str>, default: usize) -> Result<usize, String> {
    match input.map(str::trim) {
        None => Ok(default),
        Some("") => Ok(default),
        Some(value) => match value.parse::<usize>() {
            Ok(parsed) if parsed > 0 => Ok(parsed),
            _ => Err(format!("expected a positive integer, got {:?}", value)),
        },
    }
}

async fn build_leaderboard_payload(
    state: &AppState,
    limit: usize,
    now: u64,
) -> Result<LeaderboardPayload> {
    if ensure_score_book(state).await.is_ok() {
        let book = state.score_book.read().await;
        // A fetched-but-empty book is a valid board, not a warming cache.
        if book.ts_ms != 0 {
            let result = normalize(&book.entries, SortMode::Score, 1, limit)
                .map_err(|err| anyhow!(err.to_string()))?;
            return Ok(LeaderboardPayload {
                limit,
                total_unique: result.total_unique,
                entries: result.items,
                ts: now,
            });
        }
    }

    // Never fetched and the full list is unreachable; the upstream's own top
    // list is a cheaper read and usually still up.
    let entries = state.upstream.get_leaderboard().await?;
    let result = normalize(&entries, SortMode::Score, 1, limit)
        .map_err(|err| anyhow!(err.to_string()))?;
    Ok(LeaderboardPayload {
        limit,
        total_unique: result.total_unique,
        entries: result.items,
        ts: now,
    })
}

/// Make sure the raw score list has been fetched and is not too old. A stale
/// book is served as-is when the upstream is down. Freshness keys on the
/// fetch time, so an empty store does not force a re-fetch per request.
pub(crate) async fn ensure_score_book(state: &AppState) -> Result<()> {
    let now = now_ms();
    let max_age = state.config.refresh_interval.as_millis() as u64 * 2;
    {
        let book = state.score_book.read().await;
        if book.age_ms(now).map(|age| age < max_age).unwrap_or(false) {
            return Ok(());
        }
    }

    match state.upstream.get_all_scores().await {
        Ok(entries) => {
            state.record_scores(entries).await;
            Ok(())
        }
        Err(err) => {
            let book = state.score_book.read().await;
            if book.ts_ms == 0 {
                Err(err)
            } else {
                warn!(?err, "score refresh failed; serving stale list");
                Ok(())
            }
        }
    }
}

pub(crate) async fn refresh_initial_payload(state: &Arc<AppState>) {
    let limit = INITIAL_PAYLOAD_LIMIT;
    let now = now_ms();
    let payload = {
        let book = state.score_book.read().await;
        if book.ts_ms == 0 {
            return;
        }
        let result = match normalize(&book.entries, SortMode::Score, 1, limit) {
            Ok(result) => result,
            Err(_) => return,
        };
        LeaderboardPayload {
            limit,
            total_unique: result.total_unique,
            entries: result.items,
            ts: now,
        }
    };
    let payload_json = match serialize_payload_for_html(&payload) {
        Some(json) => json,
        None => return,
    };
    let html = render_index(&state.score_stream_url, &state.cache_bust, Some(&payload_json));
    {
        let mut cache = state.initial_html.write().await;
        *cache = Bytes::from(html);
    }
    {
        let mut cache = state.leaderboard_cache.write().await;
        cache.insert(
            limit,
            CachedPayload {
                ts_ms: now,
                payload,
            },
        );
    }
}

fn serialize_payload_for_html(payload: &LeaderboardPayload) -> Option<String> {
    let json = serde_json::to_string(payload).ok()?;
    if json.contains("</") {
        Some(json.replace("</", "<\\/"))
    } else {
        Some(json)
    }
}

pub(crate) async fn score_stream(State(state): State<Arc<AppState>>) -> Response {
    let stream_state = Arc::clone(&state);
    let heartbeat = state.config.heartbeat;

    let stream = stream! {
        let mut rx = stream_state.sender.subscribe();

        yield Ok::<_, Infallible>(Event::default().comment("stream-open"));

        if let Some(payload) = stream_state.latest_leaderboard().await {
            if let Some(event) = build_leaderboard_event(payload) {
                yield Ok::<_, Infallible>(event);
            }
        }

        loop {
            match rx.recv().await {
                Ok(StreamEvent::Leaderboard(payload)) => {
                    if let Some(event) = build_leaderboard_event(payload) {
                        yield Ok::<_, Infallible>(event);
                    }
                }
                Ok(StreamEvent::Error(message)) => {
                    let json = serde_json::json!({ "message": message }).to_string();
                    yield Ok::<_, Infallible>(Event::default().event("error").data(json));
                }
                Ok(StreamEvent::Shutdown) => break,
                Err(broadcast::error::RecvError::Lagged(_)) => {
                    warn!("score-stream lagged; skipping messages");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    };

    let sse = Sse::new(stream).keep_alive(KeepAlive::new().interval(heartbeat).text("heartbeat"));
    let mut response = sse.into_response();
    apply_stream_headers(&mut response);
    response
}

fn build_leaderboard_event(payload: LeaderboardPayload) -> Option<Event> {
    match serde_json::to_string(&payload) {
        Ok(json) => Some(Event::default().data(json)),
        Err(err) => {
            warn!(?err, "failed to serialize leaderboard payload");
            None
        }
    }
}

fn cors_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("Access-Control-Allow-Origin", HeaderValue::from_static("*"));
    headers.insert(
        "Access-Control-Allow-Methods",
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    headers.insert(
        "Access-Control-Allow-Headers",
        HeaderValue::from_static("Content-Type"),
    );
    headers
}

fn apply_stream_headers(response: &mut Response) {
    let headers = response.headers_mut();
    headers.extend(cors_headers());
    headers.insert(
        "Cache-Control",
        HeaderValue::from_static("no-cache, no-transform"),
    );
    headers.insert("Connection", HeaderValue::from_static("keep-alive"));
    headers.insert("X-Accel-Buffering", HeaderValue::from_static("no"));
}
