use std::cmp::Ordering;
use std::collections::HashMap;

use thiserror::Error;

use crate::models::ScoreEntry;
use crate::util::parse_timestamp_ms;

#[derive(Debug, Error)]
pub(crate) enum NormalizeError {
    #[error("page and pageSize must be positive (got page={page}, pageSize={page_size})")]
    InvalidArgument { page: usize, page_size: usize },
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum SortMode {
    Score,
    Recent,
}

impl SortMode {
    /// Lenient query-string parse; anything unrecognized falls back to the
    /// score ordering, matching how unknown limits are clamped elsewhere.
    pub(crate) fn parse(input: Option<&str>) -> Self {
        match input.map(str::trim) {
            Some("recent") => SortMode::Recent,
            _ => SortMode::Score,
        }
    }

    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            SortMode::Score => "score",
            SortMode::Recent => "recent",
        }
    }
}

pub(crate) struct ScorePage {
    pub(crate) items: Vec<ScoreEntry>,
    pub(crate) total_pages: usize,
    pub(crate) total_unique: usize,
}

/// Deduplicate, order and slice a raw score list.
///
/// Names are identities case-insensitively; per name only the highest score
/// survives, first occurrence winning ties. `total_pages` is never below 1,
/// and a page past the end yields an empty slice rather than an error.
pub(crate) fn normalize(
    entries: &[ScoreEntry],
    sort: SortMode,
    page: usize,
    page_size: usize,
) -> Result<ScorePage, NormalizeError> {
    if page == 0 || page_size == 0 {
        return Err(NormalizeError::InvalidArgument { page, page_size });
    }

    let mut unique: Vec<ScoreEntry> = Vec::new();
    let mut seen: HashMap<String, usize> = HashMap::new();
    for entry in entries {
        let key = entry.name.to_lowercase();
        match seen.get(&key) {
            Some(&index) => {
                if entry.score > unique[index].score {
                    unique[index] = entry.clone();
                }
            }
            None => {
                seen.insert(key, unique.len());
                unique.push(entry.clone());
            }
        }
    }

    match sort {
        SortMode::Score => unique.sort_by(|a, b| b.score.cmp(&a.score)),
        SortMode::Recent => unique.sort_by(|a, b| {
            let a_ts = parse_timestamp_ms(a.timestamp.as_deref());
            let b_ts = parse_timestamp_ms(b.timestamp.as_deref());
            match (a_ts, b_ts) {
                (Some(a_ts), Some(b_ts)) => b_ts.cmp(&a_ts),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
        }),
    }

    let total_unique = unique.len();
    let total_pages = (total_unique.div_ceil(page_size)).max(1);

    let start = (page - 1).saturating_mul(page_size).min(total_unique);
    let end = start.saturating_add(page_size).min(total_unique);
    let items = unique[start..end].to_vec();

    Ok(ScorePage {
        items,
        total_pages,
        total_unique,
    })
}
