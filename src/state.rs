use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::{broadcast, RwLock};

use score_stream::{render_docs, render_index};

use crate::config::Config;
use crate::constants::BROADCAST_BUFFER;
use crate::models::{CachedPayload, LeaderboardPayload, ScoreBook, ScoreEntry};
use crate::upstream::ScoreApiClient;
use crate::util::now_ms;

#[derive(Clone)]
pub(crate) enum StreamEvent {
    Leaderboard(LeaderboardPayload),
    Error(String),
    Shutdown,
}

pub(crate) struct AppState {
    pub(crate) sender: broadcast::Sender<StreamEvent>,
    pub(crate) latest: Arc<RwLock<Option<LeaderboardPayload>>>,
    pub(crate) score_book: Arc<RwLock<ScoreBook>>,
    pub(crate) leaderboard_cache: Arc<RwLock<HashMap<usize, CachedPayload<LeaderboardPayload>>>>,
    pub(crate) initial_html: Arc<RwLock<Bytes>>,
    pub(crate) docs_html: Bytes,
    pub(crate) score_stream_url: String,
    pub(crate) cache_bust: String,
    pub(crate) upstream: ScoreApiClient,
    pub(crate) config: Config,
}

impl AppState {
    pub(crate) fn new(
        config: Config,
        upstream: ScoreApiClient,
        score_stream_url: String,
    ) -> Arc<Self> {
        let (sender, _) = broadcast::channel(BROADCAST_BUFFER);
        let cache_bust = now_ms().to_string();
        let base_html = render_index(&score_stream_url, &cache_bust, None);
        let docs_html = render_docs(&cache_bust);
        Arc::new(Self {
            sender,
            latest: Arc::new(RwLock::new(None)),
            score_book: Arc::new(RwLock::new(ScoreBook::default())),
            leaderboard_cache: Arc::new(RwLock::new(HashMap::new())),
            initial_html: Arc::new(RwLock::new(Bytes::from(base_html))),
            docs_html: Bytes::from(docs_html),
            score_stream_url,
            cache_bust,
            upstream,
            config,
        })
    }

    pub(crate) fn broadcast_leaderboard(&self, payload: LeaderboardPayload) {
        let _ = self.sender.send(StreamEvent::Leaderboard(payload));
    }

    pub(crate) fn broadcast_error(&self, message: impl Into<String>) {
        let _ = self.sender.send(StreamEvent::Error(message.into()));
    }

    pub(crate) fn broadcast_shutdown(&self) {
        let _ = self.sender.send(StreamEvent::Shutdown);
    }

    /// Replace the raw score list and drop derived payload caches so the
    /// next reads rebuild from the fresh list.
    pub(crate) async fn record_scores(&self, entries: Vec<ScoreEntry>) {
        {
            let mut book = self.score_book.write().await;
            book.entries = entries;
            book.ts_ms = now_ms();
        }
        let mut cache = self.leaderboard_cache.write().await;
        cache.clear();
    }

    pub(crate) async fn latest_leaderboard(&self) -> Option<LeaderboardPayload> {
        self.latest.read().await.clone()
    }
}
