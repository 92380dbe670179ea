//! Process and request metrics, rendered in the Prometheus text format.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use axum::{
    extract::{MatchedPath, State},
    http::Request,
    middleware::Next,
    response::Response,
};

/// How a media proxy request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaOutcome {
    Hit,
    NotFound,
    Error,
    Rejected,
}

impl MediaOutcome {
    const ALL: [MediaOutcome; 4] = [Self::Hit, Self::NotFound, Self::Error, Self::Rejected];

    fn label(self) -> &'static str {
        match self {
            Self::Hit => "hit",
            Self::NotFound => "not_found",
            Self::Error => "error",
            Self::Rejected => "rejected",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

struct MetricsInner {
    started_at: Instant,
    start_time_seconds: f64,
    requests: Mutex<BTreeMap<(String, u16), u64>>,
    media: [AtomicU64; 4],
    fallbacks: AtomicU64,
    bytes: AtomicU64,
}

#[derive(Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

impl Metrics {
    pub fn new() -> Self {
        let start_time_seconds = chrono::Utc::now().timestamp_millis() as f64 / 1000.0;
        Self {
            inner: Arc::new(MetricsInner {
                started_at: Instant::now(),
                start_time_seconds,
                requests: Mutex::new(BTreeMap::new()),
                media: Default::default(),
                fallbacks: AtomicU64::new(0),
                bytes: AtomicU64::new(0),
            }),
        }
    }

    pub fn record_request(&self, route: &str, status: u16) {
        let mut requests = self
            .inner
            .requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *requests.entry((route.to_string(), status)).or_insert(0) += 1;
    }

    pub fn record_media(&self, outcome: MediaOutcome) {
        self.inner.media[outcome.index()].fetch_add(1, Ordering::Relaxed);
    }

    /// One candidate URL was tried after an earlier one failed.
    pub fn record_fallback(&self) {
        self.inner.fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_bytes(&self, n: usize) {
        self.inner.bytes.fetch_add(n as u64, Ordering::Relaxed);
    }

    pub fn media_count(&self, outcome: MediaOutcome) -> u64 {
        self.inner.media[outcome.index()].load(Ordering::Relaxed)
    }

    pub fn fallback_count(&self) -> u64 {
        self.inner.fallbacks.load(Ordering::Relaxed)
    }

    /// Render every series in the text exposition format (version 0.0.4).
    pub fn render(&self) -> String {
        let mut out = String::new();
        let inner = &self.inner;

        // Writing to a String cannot fail.
        let _ = writeln!(out, "# HELP agora_build_info Build information.");
        let _ = writeln!(out, "# TYPE agora_build_info gauge");
        let _ = writeln!(
            out,
            "agora_build_info{{version=\"{}\"}} 1",
            env!("CARGO_PKG_VERSION")
        );

        let _ = writeln!(out, "# HELP process_start_time_seconds Start time of the process since unix epoch in seconds.");
        let _ = writeln!(out, "# TYPE process_start_time_seconds gauge");
        let _ = writeln!(out, "process_start_time_seconds {:.3}", inner.start_time_seconds);

        let _ = writeln!(out, "# HELP process_uptime_seconds Seconds since the process started.");
        let _ = writeln!(out, "# TYPE process_uptime_seconds gauge");
        let _ = writeln!(
            out,
            "process_uptime_seconds {:.3}",
            inner.started_at.elapsed().as_secs_f64()
        );

        if let Some(rss) = resident_memory_bytes() {
            let _ = writeln!(out, "# HELP process_resident_memory_bytes Resident memory size in bytes.");
            let _ = writeln!(out, "# TYPE process_resident_memory_bytes gauge");
            let _ = writeln!(out, "process_resident_memory_bytes {rss}");
        }

        let _ = writeln!(out, "# HELP http_requests_total HTTP requests served, by route and status.");
        let _ = writeln!(out, "# TYPE http_requests_total counter");
        {
            let requests = inner.requests.lock().unwrap_or_else(PoisonError::into_inner);
            for ((route, status), count) in requests.iter() {
                let _ = writeln!(
                    out,
                    "http_requests_total{{route=\"{}\",status=\"{}\"}} {}",
                    escape_label(route),
                    status,
                    count
                );
            }
        }

        let _ = writeln!(out, "# HELP media_proxy_requests_total Media proxy requests, by outcome.");
        let _ = writeln!(out, "# TYPE media_proxy_requests_total counter");
        for outcome in MediaOutcome::ALL {
            let _ = writeln!(
                out,
                "media_proxy_requests_total{{outcome=\"{}\"}} {}",
                outcome.label(),
                self.media_count(outcome)
            );
        }

        let _ = writeln!(out, "# HELP media_proxy_fallbacks_total Candidate URLs tried after an earlier candidate failed.");
        let _ = writeln!(out, "# TYPE media_proxy_fallbacks_total counter");
        let _ = writeln!(out, "media_proxy_fallbacks_total {}", self.fallback_count());

        let _ = writeln!(out, "# HELP media_proxy_bytes_total Media bytes delivered.");
        let _ = writeln!(out, "# TYPE media_proxy_bytes_total counter");
        let _ = writeln!(
            out,
            "media_proxy_bytes_total {}",
            inner.bytes.load(Ordering::Relaxed)
        );

        out
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

fn escape_label(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

#[cfg(target_os = "linux")]
fn resident_memory_bytes() -> Option<u64> {
    let status = std::fs::read_to_string("/proc/self/status").ok()?;
    let line = status.lines().find(|l| l.starts_with("VmRSS:"))?;
    let kib: u64 = line.split_whitespace().nth(1)?.parse().ok()?;
    Some(kib * 1024)
}

#[cfg(not(target_os = "linux"))]
fn resident_memory_bytes() -> Option<u64> {
    None
}

/// Count every response by matched route and status code.
pub async fn track_requests(
    State(metrics): State<Metrics>,
    req: Request<axum::body::Body>,
    next: Next,
) -> Response {
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(req).await;
    metrics.record_request(&route, response.status().as_u16());
    response
}
