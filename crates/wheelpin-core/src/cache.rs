use crate::error::{CoreError, Result};
use dashmap::DashMap;
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Maximum number of cached entries to prevent unbounded memory growth.
const MAX_CACHE_ENTRIES: usize = 1000;

/// Cached HTTP response body.
///
/// The body is wrapped in `Arc` so repeated lookups of the same package
/// share one buffer.
///
/// # Examples
///
/// ```
/// use wheelpin_core::cache::CachedResponse;
/// use std::sync::Arc;
/// use std::time::Instant;
///
/// let response = CachedResponse {
///     body: Arc::new(b"response data".to_vec()),
///     fetched_at: Instant::now(),
/// };
///
/// let cloned = response.clone();
/// assert!(Arc::ptr_eq(&response.body, &cloned.body));
/// ```
#[derive(Debug, Clone)]
pub struct CachedResponse {
    pub body: Arc<Vec<u8>>,
    pub fetched_at: Instant,
}

/// Transport settings for [`HttpCache`].
///
/// # Defaults
///
/// - `timeout`: 30 seconds
/// - `retries`: 2 (three attempts in total)
/// - `retry_backoff`: 500ms, multiplied by the attempt number
/// - `require_https`: `true`
#[derive(Debug, Clone)]
pub struct CacheOptions {
    pub timeout: Duration,
    pub retries: u32,
    pub retry_backoff: Duration,
    pub require_https: bool,
    pub user_agent: String,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            retries: 2,
            retry_backoff: Duration::from_millis(500),
            require_https: true,
            user_agent: concat!("wheelpin/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Read-through HTTP cache keyed by URL.
///
/// The first request for a URL goes to the network (with bounded retry on
/// transient failures); later requests for the same URL in the same process
/// return the stored body without touching the network.
///
/// # Examples
///
/// ```no_run
/// use wheelpin_core::cache::HttpCache;
///
/// # async fn example() -> wheelpin_core::error::Result<()> {
/// let cache = HttpCache::new()?;
///
/// let first = cache.get_cached("https://pypi.org/pypi/requests/json").await?;
/// let second = cache.get_cached("https://pypi.org/pypi/requests/json").await?;
///
/// assert!(std::sync::Arc::ptr_eq(&first, &second));
/// # Ok(())
/// # }
/// ```
pub struct HttpCache {
    entries: DashMap<String, CachedResponse>,
    client: Client,
    options: CacheOptions,
}

impl HttpCache {
    /// Creates a cache with [`CacheOptions::default`].
    pub fn new() -> Result<Self> {
        Self::with_options(CacheOptions::default())
    }

    /// Creates a cache with explicit transport settings.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::RegistryError` if the HTTP client cannot be built
    /// (for example when the TLS backend fails to initialize).
    pub fn with_options(options: CacheOptions) -> Result<Self> {
        let client = Client::builder()
            .user_agent(options.user_agent.clone())
            .timeout(options.timeout)
            .build()
            .map_err(|e| CoreError::RegistryError {
                url: String::new(),
                source: e,
            })?;

        Ok(Self {
            entries: DashMap::new(),
            client,
            options,
        })
    }

    /// Retrieves the body at `url`, fetching it on first use.
    ///
    /// # Errors
    ///
    /// - `CoreError::InsecureUrl` when HTTPS is required and `url` is plain HTTP
    /// - `CoreError::NotFound` on 404 (never retried)
    /// - `CoreError::HttpStatus` / `CoreError::RegistryError` once retries are exhausted
    pub async fn get_cached(&self, url: &str) -> Result<Arc<Vec<u8>>> {
        if let Some(cached) = self.entries.get(url) {
            tracing::trace!("cache hit: {}", url);
            return Ok(Arc::clone(&cached.body));
        }

        if self.entries.len() >= MAX_CACHE_ENTRIES {
            self.evict_entries();
        }

        self.fetch_and_store(url).await
    }

    /// Fetches `url` from the network, retrying transient failures, and stores the body.
    pub(crate) async fn fetch_and_store(&self, url: &str) -> Result<Arc<Vec<u8>>> {
        self.ensure_https(url)?;

        let mut attempt: u32 = 0;
        loop {
            match self.fetch_once(url).await {
                Ok(body) => {
                    let body_arc = Arc::new(body);
                    self.entries.insert(
                        url.to_string(),
                        CachedResponse {
                            body: Arc::clone(&body_arc),
                            fetched_at: Instant::now(),
                        },
                    );
                    return Ok(body_arc);
                }
                Err(e) if e.is_transient() && attempt < self.options.retries => {
                    attempt += 1;
                    let delay = self.options.retry_backoff * attempt;
                    tracing::warn!(
                        "request to {} failed (attempt {}), retrying in {:?}: {}",
                        url,
                        attempt,
                        delay,
                        e
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn fetch_once(&self, url: &str) -> Result<Vec<u8>> {
        tracing::debug!("fetching: {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| CoreError::RegistryError {
                url: url.to_string(),
                source: e,
            })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(CoreError::NotFound {
                url: url.to_string(),
            });
        }
        if !status.is_success() {
            return Err(CoreError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| CoreError::RegistryError {
                url: url.to_string(),
                source: e,
            })?;

        Ok(body.to_vec())
    }

    fn ensure_https(&self, url: &str) -> Result<()> {
        if self.options.require_https && !url.starts_with("https://") {
            return Err(CoreError::InsecureUrl(url.to_string()));
        }
        Ok(())
    }

    /// Clears all cached entries.
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Returns the number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the cache contains no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Evicts the oldest ~10% of entries when capacity is reached.
    fn evict_entries(&self) {
        let target_removals = MAX_CACHE_ENTRIES / 10;

        let mut by_age: Vec<(String, Instant)> = self
            .entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().fetched_at))
            .collect();
        by_age.sort_by_key(|(_, time)| *time);

        let mut removed = 0;
        for (url, _) in by_age.iter().take(target_removals) {
            self.entries.remove(url);
            removed += 1;
        }

        tracing::debug!("evicted {} cache entries", removed);
    }
}
