use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::catalog::CoursePackage;
use crate::error::{FetchError, PipelineError, PipelineResult};
use crate::settings::WorkerCount;
use crate::store::RawStore;

/// Retries after the first attempt; every package gets at most `MAX_RETRIES + 1` tries.
pub const MAX_RETRIES: u32 = 3;
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(60);

/// Downloads one page body. Shared by every worker, so it must be usable concurrently.
pub trait PageFetcher: Send + Sync + 'static {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<String, FetchError>> + Send;
}

/// `reqwest::Client` keeps its own connection pool; one instance serves all workers.
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("qguide_pipeline/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let body = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(body)
    }
}

/// Fetch stats returned after completion.
#[derive(Debug, Default)]
pub struct FetchStats {
    pub total: usize,
    pub ok: usize,
    pub errors: usize,
    /// Identifiers that exhausted their retries or could not be stored.
    pub failed: Vec<String>,
}

pub struct FetchPool<F> {
    fetcher: Arc<F>,
    workers: WorkerCount,
    attempt_timeout: Duration,
}

impl<F: PageFetcher> FetchPool<F> {
    pub fn new(fetcher: F, workers: WorkerCount) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            workers,
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
        }
    }

    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    /// Fetch every package once (with retries), saving each body to `store` as it arrives.
    /// Individual failures are counted, never raised.
    pub async fn run(
        &self,
        packages: Vec<CoursePackage>,
        store: &dyn RawStore,
    ) -> PipelineResult<FetchStats> {
        if packages.is_empty() {
            return Err(PipelineError::NoPackages);
        }

        let total = packages.len();
        let workers = self.workers.get();
        let semaphore = Arc::new(Semaphore::new(workers));
        info!("Downloading {} pages with {} workers", total, workers);

        let pb = ProgressBar::new(total as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );

        // Channel: workers send results, this loop writes them to the store
        let (tx, mut rx) =
            tokio::sync::mpsc::channel::<(String, Result<String, FetchError>)>(workers * 2);

        for package in packages {
            let fetcher = Arc::clone(&self.fetcher);
            let sem = Arc::clone(&semaphore);
            let tx = tx.clone();
            let timeout = self.attempt_timeout;

            tokio::spawn(async move {
                let Ok(_permit) = sem.acquire().await else {
                    return;
                };
                let result = fetch_with_retry(fetcher.as_ref(), &package, timeout).await;
                let _ = tx.send((package.identifier, result)).await;
            });
        }

        // Drop our copy of tx so rx closes when all spawned tasks finish
        drop(tx);

        let mut stats = FetchStats {
            total,
            ..Default::default()
        };

        while let Some((identifier, result)) = rx.recv().await {
            let outcome = match result {
                Ok(body) => store.put(&identifier, &body).map_err(|e| e.to_string()),
                Err(e) => Err(e.to_string()),
            };
            match outcome {
                Ok(()) => stats.ok += 1,
                Err(e) => {
                    warn!("Giving up on {}: {}", identifier, e);
                    stats.errors += 1;
                    stats.failed.push(identifier);
                }
            }
            pb.inc(1);
        }

        pb.finish_and_clear();
        info!("Downloaded {}/{} pages successfully.", stats.ok, stats.total);
        Ok(stats)
    }
}

/// Up to `MAX_RETRIES` immediate retries with identical parameters. A timed-out
/// attempt counts as a failed one.
async fn fetch_with_retry<F: PageFetcher>(
    fetcher: &F,
    package: &CoursePackage,
    timeout: Duration,
) -> Result<String, FetchError> {
    let mut attempt = 0;
    loop {
        let result = match tokio::time::timeout(timeout, fetcher.fetch(&package.url)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout(timeout)),
        };

        match result {
            Ok(body) => return Ok(body),
            Err(e) if attempt < MAX_RETRIES => {
                attempt += 1;
                warn!(
                    "Error downloading {} ({}), retry {}/{}: {}",
                    package.url, package.identifier, attempt, MAX_RETRIES, e
                );
            }
            Err(e) => return Err(e),
        }
    }
}

// ── Tests ──
