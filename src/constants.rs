pub(crate) const DEFAULT_PORT: u16 = 8787;

pub(crate) const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;
pub(crate) const DEFAULT_REFRESH_INTERVAL_MS: u64 = 30_000;
pub(crate) const DEFAULT_HEARTBEAT_MS: u64 = 15_000;
pub(crate) const DEFAULT_API_CACHE_TTL_MS: u64 = 2_000;

pub(crate) const LEADERBOARD_DEFAULT_LIMIT: usize = 10;
pub(crate) const LEADERBOARD_MIN_LIMIT: usize = 1;
pub(crate) const LEADERBOARD_MAX_LIMIT: usize = 100;

pub(crate) const DEFAULT_PAGE_SIZE: usize = 20;
pub(crate) const MAX_PAGE_SIZE: usize = 100;

pub(crate) const MAX_NAME_LEN: usize = 20;

pub(crate) const BROADCAST_BUFFER: usize = 32;
pub(crate) const INITIAL_PAYLOAD_LIMIT: usize = LEADERBOARD_DEFAULT_LIMIT;
pub(crate) const DEFAULT_STATIC_DIR: &str = "static";
