/// Maximum topic title length in characters
pub const MAX_TITLE_CHARS: usize = 200;

/// Maximum topic / reply body length in characters
pub const MAX_CONTENT_CHARS: usize = 20_000;

/// Default backend API base URL (local development)
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api";

/// Default HTTP port of the media proxy server
pub const DEFAULT_HTTP_PORT: u16 = 3000;

/// Per-attempt upstream timeout for media fetches in production (seconds)
pub const MEDIA_FETCH_TIMEOUT_SECS: u64 = 30;

/// `Cache-Control` sent with proxied media (one year, immutable)
pub const MEDIA_CACHE_CONTROL: &str = "public, max-age=31536000, immutable";
