use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::constants::INITIAL_PAYLOAD_LIMIT;
use crate::handlers::refresh_initial_payload;
use crate::models::LeaderboardPayload;
use crate::normalize::{normalize, SortMode};
use crate::state::AppState;
use crate::util::now_ms;

/// Periodic pull of the upstream score list, matching the widget-era
/// 30 second auto-refresh. Failures back off exponentially up to 30s.
pub(crate) async fn run_score_cache_updater(state: Arc<AppState>) {
    let base_interval = state.config.refresh_interval;
    let mut backoff = base_interval;
    let max_backoff = Duration::from_secs(30);
    let mut consecutive_failures = 0u32;

    loop {
        match try_refresh_scores(&state).await {
            Ok(()) => {
                backoff = base_interval;
                consecutive_failures = 0;
                tokio::time::sleep(base_interval).await;
            }
            Err(err) => {
                consecutive_failures += 1;
                warn!(?err, consecutive_failures, "score refresh failed; retrying");
                if consecutive_failures == 3 {
                    state.broadcast_error(err.to_string());
                }
                tokio::time::sleep(backoff).await;
                backoff = std::cmp::min(backoff * 2, max_backoff);
            }
        }
    }
}

/// One refresh pass; used by the updater loop and fired after submissions.
/// Errors are logged rather than surfaced since callers cannot retry anyway.
pub(crate) async fn refresh_scores(state: &Arc<AppState>) {
    if let Err(err) = try_refresh_scores(state).await {
        warn!(?err, "score refresh failed");
    }
}

async fn try_refresh_scores(state: &Arc<AppState>) -> anyhow::Result<()> {
    let entries = state.upstream.get_all_scores().await?;
    state.record_scores(entries).await;

    let payload = {
        let book = state.score_book.read().await;
        let result = normalize(&book.entries, SortMode::Score, 1, INITIAL_PAYLOAD_LIMIT)?;
        LeaderboardPayload {
            limit: INITIAL_PAYLOAD_LIMIT,
            total_unique: result.total_unique,
            entries: result.items,
            ts: now_ms(),
        }
    };

    let changed = {
        let latest = state.latest.read().await;
        latest
            .as_ref()
            .map(|previous| !previous.same_board(&payload))
            .unwrap_or(true)
    };

    if changed {
        {
            let mut latest = state.latest.write().await;
            *latest = Some(payload.clone());
        }
        state.broadcast_leaderboard(payload);
        refresh_initial_payload(state).await;
    }

    Ok(())
}

pub(crate) async fn run_subscriber_metrics(state: Arc<AppState>) {
    let mut interval = tokio::time::interval(Duration::from_secs(60));
    loop {
        interval.tick().await;
        let subscriber_count = state.sender.receiver_count();
        if subscriber_count == 0 {
            continue;
        }

        let now = now_ms();
        let (book_len, book_age_ms) = {
            let book = state.score_book.read().await;
            (book.entries.len(), book.age_ms(now))
        };
        let leaderboard_cache_len = { state.leaderboard_cache.read().await.len() };
        let latest_board_len = {
            let latest = state.latest.read().await;
            latest.as_ref().map(|payload| payload.entries.len())
        };

        let book_age_ms = book_age_ms
            .map(|value| value.to_string())
            .unwrap_or_else(|| "-".to_string());
        let latest_board_len = latest_board_len
            .map(|value| value.to_string())
            .unwrap_or_else(|| "-".to_string());

        info!(
            subscribers = subscriber_count,
            book_len,
            book_age_ms = %book_age_ms,
            leaderboard_cache_len,
            latest_board_len = %latest_board_len,
            "subscriber metrics"
        );
    }
}
