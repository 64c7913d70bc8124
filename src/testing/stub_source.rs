//! In-process `FetchAdapter` with scripted results.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use url::Url;

use crate::core::error::AppError;
use crate::download::error::DownloadError;
use crate::download::source::{host_matches, FetchAdapter, FetchRequest, FetchedMedia, MediaKind};

#[derive(Debug, Clone)]
enum StubResult {
    File { name: String, size: u64, kind: MediaKind },
    Fail(String),
    Hang(Duration),
}

/// Claims the given domains and "downloads" by writing a small file.
///
/// The reported size is the scripted one; the bytes on disk are a placeholder
/// so tests with 120 MB results stay cheap.
pub struct StubSource {
    name: String,
    domains: Vec<String>,
    result: StubResult,
    calls: AtomicUsize,
    requests: Mutex<Vec<FetchRequest>>,
}

impl StubSource {
    pub fn new(name: &str, domains: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            domains: domains.iter().map(|d| d.to_string()).collect(),
            result: StubResult::File {
                name: "video.mp4".to_string(),
                size: 1024,
                kind: MediaKind::Video,
            },
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn producing(mut self, name: &str, size: u64, kind: MediaKind) -> Self {
        self.result = StubResult::File {
            name: name.to_string(),
            size,
            kind,
        };
        self
    }

    pub fn failing(mut self, cause: &str) -> Self {
        self.result = StubResult::Fail(cause.to_string());
        self
    }

    pub fn hanging(mut self, duration: Duration) -> Self {
        self.result = StubResult::Hang(duration);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<FetchRequest> {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl FetchAdapter for StubSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn supports_url(&self, url: &Url) -> bool {
        let domains: Vec<&str> = self.domains.iter().map(String::as_str).collect();
        host_matches(url, &domains)
    }

    async fn fetch(&self, request: &FetchRequest) -> Result<FetchedMedia, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request.clone());

        match &self.result {
            StubResult::File { name, size, kind } => {
                let path = request.dest_dir.join(name);
                tokio::fs::write(&path, b"stub media").await?;
                Ok(FetchedMedia {
                    path,
                    size: *size,
                    kind: *kind,
                })
            }
            StubResult::Fail(cause) => Err(DownloadError::YtDlp(cause.clone()).into()),
            StubResult::Hang(duration) => {
                tokio::time::sleep(*duration).await;
                Err(DownloadError::Other("stub hang finished".to_string()).into())
            }
        }
    }
}
