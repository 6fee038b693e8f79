//! Bounded concurrent fetch of every page of a listing.
//!
//! A fixed pool of `min(concurrency, page_count)` workers pulls page indices
//! from a shared cursor. Each worker holds a semaphore permit only while its
//! HTTP request is in flight; decoding happens on the collecting side. The
//! collector reads exactly one result per page, in completion order.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;
use tokio::time::{Instant, timeout, timeout_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::FetchConfig;
use crate::error::{FetchError, PageError, PageFailure};
use crate::request::{PageRequest, PageSource, Paginated};

/// Items collected from a listing plus the pages that did not make it.
#[derive(Debug)]
pub struct FetchOutcome<T> {
    /// Total reported by the discovery request.
    pub total: u64,
    pub page_count: usize,
    /// Items in page order.
    pub items: Vec<T>,
    /// Failed pages in page order.
    pub failures: Vec<PageFailure>,
}

impl<T> FetchOutcome<T> {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failed_pages(&self) -> Vec<usize> {
        self.failures.iter().map(|f| f.page).collect()
    }

    /// Convert to the bare item list, turning any page failure into an error.
    pub fn into_complete(self) -> Result<Vec<T>, FetchError> {
        if self.failures.is_empty() {
            Ok(self.items)
        } else {
            Err(FetchError::Partial {
                page_count: self.page_count,
                failures: self.failures,
            })
        }
    }
}

/// One page's raw result, sent from a worker to the collector.
struct PageResult {
    page: usize,
    offset: u64,
    body: Result<Vec<u8>, PageError>,
}

/// Fetches whole listings from one [`PageSource`].
pub struct Fetcher<S: ?Sized> {
    source: Arc<S>,
    config: FetchConfig,
    permits: Arc<Semaphore>,
}

impl<S: PageSource + ?Sized + 'static> Fetcher<S> {
    pub fn new(source: Arc<S>, config: FetchConfig) -> Result<Self, FetchError> {
        config.validate()?;
        let permits = Arc::new(Semaphore::new(config.concurrency));
        Ok(Self {
            source,
            config,
            permits,
        })
    }

    /// Draw in-flight permits from a pool shared with other fetchers.
    pub fn with_permits(mut self, permits: Arc<Semaphore>) -> Self {
        self.permits = permits;
        self
    }

    pub fn permits(&self) -> Arc<Semaphore> {
        Arc::clone(&self.permits)
    }

    /// Fetch every page of the listing behind `base`.
    ///
    /// Fails outright when discovery fails, the listing is empty, the overall
    /// deadline passes, or no page at all could be collected. Anything short
    /// of that comes back as a [`FetchOutcome`] whose `failures` name the
    /// missing pages.
    pub async fn fetch_all<P: Paginated>(
        &self,
        base: &PageRequest,
    ) -> Result<FetchOutcome<P::Item>, FetchError> {
        let deadline = Instant::now() + self.config.overall_timeout;

        let total = match timeout_at(deadline, self.discover::<P>(base)).await {
            Ok(total) => total?,
            Err(_) => {
                return Err(FetchError::DeadlineExceeded {
                    completed: 0,
                    page_count: 0,
                });
            }
        };
        if total == 0 {
            return Err(FetchError::NoResults);
        }

        let pages = self.config.page_count(total);
        if pages > self.config.max_pages {
            return Err(FetchError::TooManyPages {
                total,
                page_count: pages,
                max_pages: self.config.max_pages,
            });
        }
        let page_count = usize::try_from(pages).map_err(|_| FetchError::TooManyPages {
            total,
            page_count: pages,
            max_pages: self.config.max_pages,
        })?;
        let page_size = self.config.max_page_size;
        debug!(url = %base.url, total, page_count, "discovered listing size");

        let worker_count = self.config.concurrency.min(page_count);
        let cancel = CancellationToken::new();
        let cursor = Arc::new(AtomicUsize::new(0));
        let (results_tx, mut results_rx) = mpsc::channel::<PageResult>(worker_count);

        let mut workers = JoinSet::new();
        for _ in 0..worker_count {
            let worker = Worker {
                source: Arc::clone(&self.source),
                permits: Arc::clone(&self.permits),
                base: base.clone(),
                cursor: Arc::clone(&cursor),
                page_count,
                page_size,
                request_timeout: self.config.request_timeout,
                cancel: cancel.clone(),
                results: results_tx.clone(),
            };
            workers.spawn(worker.run());
        }
        // Workers hold the only senders, so the channel closes once they all stop.
        drop(results_tx);

        let mut seen = BTreeSet::new();
        let mut collected: Vec<(usize, Vec<P::Item>)> = Vec::new();
        let mut failures = Vec::new();

        while seen.len() < page_count {
            let next = match timeout_at(deadline, results_rx.recv()).await {
                Ok(next) => next,
                Err(_) => {
                    cancel.cancel();
                    workers.abort_all();
                    warn!(
                        url = %base.url,
                        completed = seen.len(),
                        page_count,
                        "listing deadline exceeded, in-flight pages cancelled"
                    );
                    return Err(FetchError::DeadlineExceeded {
                        completed: seen.len(),
                        page_count,
                    });
                }
            };
            let Some(result) = next else {
                break;
            };
            seen.insert(result.page);

            let error = match result.body.and_then(|body| decode::<P>(&body)) {
                Ok(page) => {
                    let items = page.into_items();
                    let received = items.len() as u64;
                    let is_last = result.page + 1 == page_count;
                    collected.push((result.page, items));
                    // Only the last page may legitimately come back short.
                    if is_last || received >= page_size {
                        continue;
                    }
                    PageError::Short {
                        expected: page_size,
                        received,
                    }
                }
                Err(error) => error,
            };

            warn!(
                url = %base.url,
                page = result.page,
                offset = result.offset,
                %error,
                "page fetch failed"
            );
            failures.push(PageFailure {
                page: result.page,
                offset: result.offset,
                error,
            });
            if self.config.fail_fast {
                cancel.cancel();
            }
        }

        // Pages nobody claimed after a fail-fast cancel.
        for page in (0..page_count).filter(|page| !seen.contains(page)) {
            failures.push(PageFailure {
                page,
                offset: page as u64 * page_size,
                error: PageError::Cancelled,
            });
        }

        if collected.is_empty() {
            failures.sort_by_key(|f| f.page);
            if let Some(first) = failures.into_iter().next() {
                return Err(FetchError::AllPagesFailed { page_count, first });
            }
            return Err(FetchError::NoResults);
        }

        collected.sort_by_key(|(page, _)| *page);
        failures.sort_by_key(|f| f.page);
        let items: Vec<P::Item> = collected.into_iter().flat_map(|(_, items)| items).collect();

        info!(
            url = %base.url,
            total,
            page_count,
            items = items.len(),
            failed = failures.len(),
            "listing fetched"
        );

        Ok(FetchOutcome {
            total,
            page_count,
            items,
            failures,
        })
    }

    async fn discover<P: Paginated>(&self, base: &PageRequest) -> Result<u64, FetchError> {
        let probe = base.page(0, self.config.discovery_page_size);
        let body = fetch_page(
            self.source.as_ref(),
            &self.permits,
            &probe,
            self.config.request_timeout,
        )
        .await
        .map_err(FetchError::Discovery)?;
        let page = decode::<P>(&body).map_err(FetchError::Discovery)?;
        Ok(page.total())
    }
}

struct Worker<S: ?Sized> {
    source: Arc<S>,
    permits: Arc<Semaphore>,
    base: PageRequest,
    cursor: Arc<AtomicUsize>,
    page_count: usize,
    page_size: u64,
    request_timeout: Duration,
    cancel: CancellationToken,
    results: mpsc::Sender<PageResult>,
}

impl<S: PageSource + ?Sized + 'static> Worker<S> {
    async fn run(self) {
        loop {
            if self.cancel.is_cancelled() {
                break;
            }
            let page = self.cursor.fetch_add(1, Ordering::SeqCst);
            if page >= self.page_count {
                break;
            }
            let offset = page as u64 * self.page_size;
            let request = self.base.page(offset, self.page_size);

            let body = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => Err(PageError::Cancelled),
                body = fetch_page(self.source.as_ref(), &self.permits, &request, self.request_timeout) => body,
            };

            if self.results.send(PageResult { page, offset, body }).await.is_err() {
                break;
            }
        }
    }
}

/// Issue one request while holding a permit. The permit is released as soon
/// as the response body is in hand.
async fn fetch_page<S: PageSource + ?Sized>(
    source: &S,
    permits: &Semaphore,
    request: &PageRequest,
    limit: Duration,
) -> Result<Vec<u8>, PageError> {
    let _permit = permits.acquire().await.map_err(|_| PageError::Cancelled)?;
    match timeout(limit, source.get(request)).await {
        Ok(body) => body.map_err(PageError::from),
        Err(_) => Err(PageError::Timeout(limit)),
    }
}

fn decode<P: Paginated>(body: &[u8]) -> Result<P, PageError> {
    serde_json::from_slice(body).map_err(|e| PageError::Decode(e.to_string()))
}
