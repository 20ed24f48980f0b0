use serde::{Deserialize, Serialize};

/// One row as the upstream score API reports it. Entries are read-only once
/// fetched; the normalizer copies rather than mutates.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub(crate) struct ScoreEntry {
    pub(crate) name: String,
    pub(crate) score: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) timestamp: Option<String>,
}

#[derive(Clone)]
pub(crate) struct CachedPayload<T> {
    pub(crate) ts_ms: u64,
    pub(crate) payload: T,
}

/// Raw list last fetched from the upstream API, plus when it was fetched.
#[derive(Default)]
pub(crate) struct ScoreBook {
    pub(crate) entries: Vec<ScoreEntry>,
    pub(crate) ts_ms: u64,
}

impl ScoreBook {
    /// `None` until the first successful fetch.
    pub(crate) fn age_ms(&self, now: u64) -> Option<u64> {
        if self.ts_ms == 0 {
            None
        } else {
            Some(now.saturating_sub(self.ts_ms))
        }
    }
}

#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LeaderboardPayload {
    pub(crate) limit: usize,
    pub(crate) total_unique: usize,
    pub(crate) entries: Vec<ScoreEntry>,
    pub(crate) ts: u64,
}

impl LeaderboardPayload {
    /// Whether two payloads would render the same board. The fetch timestamp
    /// is ignored so an unchanged list does not re-broadcast.
    pub(crate) fn same_board(&self, other: &LeaderboardPayload) -> bool {
        self.entries.len() == other.entries.len()
            && self
                .entries
                .iter()
                .zip(other.entries.iter())
                .all(|(a, b)| a.name == b.name && a.score == b.score)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ScoresPayload {
    pub(crate) sort: String,
    pub(crate) page: usize,
    pub(crate) per_page: usize,
    pub(crate) total_pages: usize,
    pub(crate) total_unique: usize,
    pub(crate) entries: Vec<ScoreEntry>,
    pub(crate) ts: u64,
}

#[derive(Deserialize)]
pub(crate) struct SubmitRequest {
    pub(crate) name: String,
    pub(crate) score: i64,
}

#[derive(Serialize)]
pub(crate) struct SubmitResponse {
    pub(crate) status: &'static str,
}
