//! Media proxy: path normalization and ordered upstream fallback.
//!
//! Uploaded media may live under several backend URL layouts. A request is
//! tried against each candidate in a fixed order and the first 2xx answer
//! wins. Every attempt gets its own timeout.

use std::future::Future;
use std::time::Duration;

use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::error::ServerError;
use crate::metrics::{MediaOutcome, Metrics};

/// Runs of this many identical letters mark a path as garbage
/// (e.g. `aaaaaa.png` produced by a broken uploader).
const MAX_REPEATED_LETTERS: usize = 5;

/// Leading segments already implied by the candidate URLs.
const REDUNDANT_PREFIXES: [&[&str]; 3] = [&["api", "media", "uploads"], &["media", "uploads"], &["uploads"]];

/// Segments that come from stringified missing values on the front-end.
const PLACEHOLDER_SEGMENTS: [&str; 2] = ["undefined", "null"];

// ---------------------------------------------------------------------------
// Path handling
// ---------------------------------------------------------------------------

/// Clean up a requested media path.
///
/// Empty segments are dropped and a redundant `uploads/` prefix is removed.
/// Dot segments and paths that look malformed are rejected. So are
/// backslashes and a decoded `?` or `#`, which must not reach the upstream
/// URL.
pub fn normalize_media_path(raw: &str) -> Result<String, ServerError> {
    let malformed = || ServerError::MalformedMediaPath {
        path: raw.to_string(),
    };

    let mut segments: Vec<&str> = raw.split('/').filter(|s| !s.is_empty()).collect();

    if segments
        .iter()
        .any(|s| *s == "." || *s == ".." || s.contains(['\\', '?', '#']))
    {
        return Err(malformed());
    }

    for prefix in REDUNDANT_PREFIXES {
        if segments.len() >= prefix.len() && segments[..prefix.len()] == *prefix {
            segments.drain(..prefix.len());
            break;
        }
    }

    if segments.is_empty() {
        return Err(malformed());
    }

    let path = segments.join("/");
    if looks_malformed(&path) {
        return Err(malformed());
    }
    Ok(path)
}

/// Heuristic for paths no uploader would produce.
pub fn looks_malformed(path: &str) -> bool {
    if path.split('/').any(|s| {
        PLACEHOLDER_SEGMENTS
            .iter()
            .any(|p| s.eq_ignore_ascii_case(p))
    }) {
        return true;
    }

    let mut run = 0usize;
    let mut previous = None;
    for c in path.chars() {
        if c.is_ascii_alphabetic() && Some(c.to_ascii_lowercase()) == previous {
            run += 1;
        } else {
            run = 1;
        }
        if c.is_ascii_alphabetic() && run >= MAX_REPEATED_LETTERS {
            return true;
        }
        previous = c.is_ascii_alphabetic().then(|| c.to_ascii_lowercase());
    }
    false
}

/// Candidate upstream URLs for `path`, in the order they are tried.
pub fn candidate_urls(api_base: &str, media_base: &str, path: &str) -> [String; 4] {
    let api = api_base.trim_end_matches('/');
    let media = media_base.trim_end_matches('/');
    [
        format!("{api}/media/uploads/{path}"),
        format!("{media}/uploads/{path}"),
        format!("{media}/storage/{path}"),
        format!("{media}/public/uploads/{path}"),
    ]
}

/// Content type from the file extension, for upstreams that omit it.
pub fn guess_content_type(path: &str) -> &'static str {
    let ext = path
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "pdf" => "application/pdf",
        "vtt" => "text/vtt",
        _ => "application/octet-stream",
    }
}

// ---------------------------------------------------------------------------
// Fetching
// ---------------------------------------------------------------------------

/// An upstream answer. `body` is empty for non-2xx statuses.
#[derive(Debug, Clone)]
pub struct FetchedMedia {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl FetchedMedia {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The request never produced a response.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Upstream timed out")]
    Timeout,

    #[error("Upstream transport error: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else {
            FetchError::Transport(e.to_string())
        }
    }
}

/// Single GET against an upstream URL.
pub trait MediaFetcher: Send + Sync + 'static {
    fn fetch(
        &self,
        url: &str,
        timeout: Option<Duration>,
    ) -> impl Future<Output = Result<FetchedMedia, FetchError>> + Send;
}

#[derive(Debug, Clone)]
pub struct HttpMediaFetcher {
    client: reqwest::Client,
}

impl HttpMediaFetcher {
    pub fn new() -> Result<Self, ServerError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| ServerError::Internal(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

impl MediaFetcher for HttpMediaFetcher {
    async fn fetch(&self, url: &str, timeout: Option<Duration>) -> Result<FetchedMedia, FetchError> {
        let mut request = self.client.get(url);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);

        if !response.status().is_success() {
            return Ok(FetchedMedia {
                status,
                content_type,
                body: Bytes::new(),
            });
        }

        let body = response.bytes().await?;
        Ok(FetchedMedia {
            status,
            content_type,
            body,
        })
    }
}

// ---------------------------------------------------------------------------
// Proxy
// ---------------------------------------------------------------------------

/// A successfully proxied file.
#[derive(Debug, Clone)]
pub struct ProxiedMedia {
    pub content_type: String,
    pub body: Bytes,
    /// The candidate URL that answered.
    pub source: String,
}

pub struct MediaProxy<F> {
    fetcher: F,
    api_base: String,
    media_base: String,
    timeout: Option<Duration>,
    metrics: Metrics,
}

impl<F: MediaFetcher> MediaProxy<F> {
    pub fn new(
        fetcher: F,
        api_base: impl Into<String>,
        media_base: impl Into<String>,
        timeout: Option<Duration>,
        metrics: Metrics,
    ) -> Self {
        Self {
            fetcher,
            api_base: api_base.into(),
            media_base: media_base.into(),
            timeout,
            metrics,
        }
    }

    /// Resolve `raw_path` against the candidates in order.
    ///
    /// Fails with `MediaNotFound` when every candidate answered non-2xx and
    /// with `MediaUpstream` when at least one never answered.
    pub async fn fetch(&self, raw_path: &str) -> Result<ProxiedMedia, ServerError> {
        let path = match normalize_media_path(raw_path) {
            Ok(path) => path,
            Err(e) => {
                warn!(path = %raw_path, "Rejected malformed media path");
                self.metrics.record_media(MediaOutcome::Rejected);
                return Err(e);
            }
        };

        let mut transport_failure: Option<FetchError> = None;

        for (attempt, url) in candidate_urls(&self.api_base, &self.media_base, &path)
            .into_iter()
            .enumerate()
        {
            if attempt > 0 {
                self.metrics.record_fallback();
            }

            match self.fetcher.fetch(&url, self.timeout).await {
                Ok(media) if media.is_success() => {
                    let content_type = media
                        .content_type
                        .unwrap_or_else(|| guess_content_type(&path).to_string());
                    info!(%path, source = %url, size = media.body.len(), "Media proxied");
                    self.metrics.record_media(MediaOutcome::Hit);
                    self.metrics.record_bytes(media.body.len());
                    return Ok(ProxiedMedia {
                        content_type,
                        body: media.body,
                        source: url,
                    });
                }
                Ok(media) => {
                    debug!(%url, status = media.status, "Media candidate missed");
                }
                Err(e) => {
                    warn!(%url, error = %e, "Media candidate failed");
                    transport_failure = Some(e);
                }
            }
        }

        match transport_failure {
            Some(e) => {
                self.metrics.record_media(MediaOutcome::Error);
                Err(ServerError::MediaUpstream {
                    path,
                    detail: e.to_string(),
                })
            }
            None => {
                self.metrics.record_media(MediaOutcome::NotFound);
                Err(ServerError::MediaNotFound { path })
            }
        }
    }
}
