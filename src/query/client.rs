//! Read cache with request deduplication
//!
//! Entries are keyed by [`QueryKey`]. A read is served from the cache while
//! the entry is fresh; otherwise it joins the identity's in-flight request
//! or starts one. The in-flight future is `Shared`, so however many readers
//! ask at once, the backend sees one call.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::time::Instant;

use super::key::QueryKey;
use crate::backend::{ApiError, Backend};

/// How long fetched data counts as fresh unless configured otherwise
pub const DEFAULT_STALE_TIME: Duration = Duration::from_secs(5 * 60);

/// How long an unused entry is kept once it has gone stale
pub const DEFAULT_GC_TIME: Duration = Duration::from_secs(5 * 60);

const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

type SharedFetch = Shared<BoxFuture<'static, Result<Value, ApiError>>>;

/// Per-read options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
    /// When false no request is made and the cached snapshot is returned
    pub enabled: bool,
    /// Extra attempts after a failed request
    pub retry: u32,
    pub stale_time: Duration,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            retry: 0,
            stale_time: DEFAULT_STALE_TIME,
        }
    }
}

impl QueryOptions {
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn retry(mut self, retry: u32) -> Self {
        self.retry = retry;
        self
    }

    pub fn stale_time(mut self, stale_time: Duration) -> Self {
        self.stale_time = stale_time;
        self
    }
}

/// What a view knows about one read
#[derive(Debug, Clone)]
pub struct QueryState<T> {
    pub data: Option<T>,
    /// Fetching with nothing cached yet
    pub is_loading: bool,
    /// Any request in flight, including background refetches
    pub is_fetching: bool,
    pub is_success: bool,
    pub error: Option<ApiError>,
}

impl<T> Default for QueryState<T> {
    fn default() -> Self {
        Self {
            data: None,
            is_loading: false,
            is_fetching: false,
            is_success: false,
            error: None,
        }
    }
}

impl<T> QueryState<T> {
    /// State shown while the first request for a view is running
    pub fn loading() -> Self {
        Self {
            is_loading: true,
            is_fetching: true,
            ..Self::default()
        }
    }
}

impl QueryState<Value> {
    /// Decode the cached JSON into `T`; a decode failure becomes the error
    pub fn decode<T: DeserializeOwned>(self) -> QueryState<T> {
        let (data, error) = match self.data {
            Some(value) => match serde_json::from_value(value) {
                Ok(data) => (Some(data), self.error),
                Err(e) => (None, Some(ApiError::from(e))),
            },
            None => (None, self.error),
        };
        QueryState {
            is_success: data.is_some() && error.is_none(),
            data,
            is_loading: self.is_loading,
            is_fetching: self.is_fetching,
            error,
        }
    }
}

/// A running request and the generation it was started for
struct InFlight {
    generation: u64,
    request: SharedFetch,
}

struct Entry {
    data: Option<Value>,
    error: Option<ApiError>,
    updated_at: Option<Instant>,
    /// Last read or write-back; unused entries are swept after `gc_time`
    last_used: Instant,
    invalidated: bool,
    /// Bumped on every invalidation. Reads never join a request started for
    /// an older generation, and such a request cannot mark the entry fresh.
    generation: u64,
    /// Generation of the request whose outcome is stored
    settled_generation: Option<u64>,
    in_flight: Option<InFlight>,
}

impl Entry {
    fn new() -> Self {
        Self {
            data: None,
            error: None,
            updated_at: None,
            last_used: Instant::now(),
            invalidated: false,
            generation: 0,
            settled_generation: None,
            in_flight: None,
        }
    }

    fn is_fresh(&self, stale_time: Duration) -> bool {
        match self.updated_at {
            Some(at) => !self.invalidated && self.error.is_none() && at.elapsed() < stale_time,
            None => false,
        }
    }

    fn state(&self) -> QueryState<Value> {
        let is_fetching = self.in_flight.is_some();
        QueryState {
            data: self.data.clone(),
            is_loading: is_fetching && self.data.is_none(),
            is_fetching,
            is_success: self.data.is_some() && self.error.is_none(),
            error: self.error.clone(),
        }
    }
}

/// Process-wide read cache
#[derive(Clone)]
pub struct QueryClient {
    backend: Arc<dyn Backend>,
    cache: Arc<Mutex<HashMap<QueryKey, Entry>>>,
    defaults: QueryOptions,
    gc_time: Duration,
}

impl QueryClient {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            cache: Arc::new(Mutex::new(HashMap::new())),
            defaults: QueryOptions::default(),
            gc_time: DEFAULT_GC_TIME,
        }
    }

    pub fn with_gc_time(mut self, gc_time: Duration) -> Self {
        self.gc_time = gc_time;
        self
    }

    pub fn with_defaults(mut self, defaults: QueryOptions) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn defaults(&self) -> QueryOptions {
        self.defaults
    }

    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    /// Cached state without touching the network
    pub fn snapshot(&self, key: &QueryKey) -> QueryState<Value> {
        self.cache
            .lock()
            .get(key)
            .map(Entry::state)
            .unwrap_or_default()
    }

    /// Whether [`fetch`](Self::fetch) would go to the network
    pub fn is_stale(&self, key: &QueryKey, options: QueryOptions) -> bool {
        self.cache
            .lock()
            .get(key)
            .map(|e| !e.is_fresh(options.stale_time))
            .unwrap_or(true)
    }

    /// Read with the client's default options
    pub async fn fetch_default(&self, key: QueryKey) -> QueryState<Value> {
        self.fetch(key, self.defaults).await
    }

    /// Read `key`, from cache when fresh
    pub async fn fetch(&self, key: QueryKey, options: QueryOptions) -> QueryState<Value> {
        if !options.enabled {
            return self.snapshot(&key);
        }

        let request = {
            let mut cache = self.cache.lock();
            self.sweep(&mut cache);
            let entry = cache.entry(key.clone()).or_insert_with(Entry::new);
            entry.last_used = Instant::now();
            if entry.is_fresh(options.stale_time) {
                tracing::debug!("Cache hit: {}", key);
                return entry.state();
            }
            let joinable = entry
                .in_flight
                .as_ref()
                .filter(|running| running.generation == entry.generation)
                .map(|running| running.request.clone());
            match joinable {
                Some(request) => {
                    tracing::debug!("Joining in-flight request: {}", key);
                    request
                }
                None => {
                    tracing::debug!("Cache miss: {}", key);
                    let request = self.start(key.clone(), options.retry, entry.generation);
                    entry.in_flight = Some(InFlight {
                        generation: entry.generation,
                        request: request.clone(),
                    });
                    request
                }
            }
        };

        // The outcome is recorded in the cache by the request itself
        let _ = request.await;
        self.snapshot(&key)
    }

    /// Typed read
    pub async fn fetch_as<T: DeserializeOwned>(
        &self,
        key: QueryKey,
        options: QueryOptions,
    ) -> QueryState<T> {
        self.fetch(key, options).await.decode()
    }

    /// Mark every identity under any of `paths` stale; returns how many
    pub fn invalidate<S: AsRef<str>>(&self, paths: &[S]) -> usize {
        if paths.is_empty() {
            return 0;
        }
        let mut cache = self.cache.lock();
        let mut count = 0;
        for (key, entry) in cache.iter_mut() {
            if paths.iter().any(|p| key.is_under(p.as_ref())) {
                entry.invalidated = true;
                entry.generation += 1;
                count += 1;
            }
        }
        tracing::debug!(
            "Invalidated {} cached reads under {:?}",
            count,
            paths.iter().map(AsRef::as_ref).collect::<Vec<_>>()
        );
        count
    }

    /// Drop everything (used on logout)
    pub fn clear(&self) {
        self.cache.lock().clear();
    }

    /// Remove entries nobody has used for `stale_time + gc_time`
    fn sweep(&self, cache: &mut HashMap<QueryKey, Entry>) {
        let keep = self.defaults.stale_time + self.gc_time;
        let before = cache.len();
        cache.retain(|_, e| e.in_flight.is_some() || e.last_used.elapsed() < keep);
        let swept = before - cache.len();
        if swept > 0 {
            tracing::debug!("Swept {} unused cached reads", swept);
        }
    }

    fn start(&self, key: QueryKey, retry: u32, generation: u64) -> SharedFetch {
        let backend = Arc::clone(&self.backend);
        let cache = Arc::clone(&self.cache);

        async move {
            let result = fetch_with_retry(backend.as_ref(), &key, retry).await;

            let mut cache = cache.lock();
            // Gone after a logout: nothing to record
            let Some(entry) = cache.get_mut(&key) else {
                return result;
            };
            if entry.in_flight.as_ref().map(|running| running.generation) == Some(generation) {
                entry.in_flight = None;
            }
            if entry.settled_generation.is_some_and(|settled| settled > generation) {
                tracing::debug!("Dropping superseded response for {}", key);
                return result;
            }
            entry.settled_generation = Some(generation);
            entry.last_used = Instant::now();
            match &result {
                Ok(value) => {
                    entry.data = Some(value.clone());
                    entry.error = None;
                    entry.updated_at = Some(Instant::now());
                    if entry.generation == generation {
                        entry.invalidated = false;
                    }
                }
                Err(err) => {
                    entry.error = Some(err.clone());
                }
            }
            result
        }
        .boxed()
        .shared()
    }
}

async fn fetch_with_retry(backend: &dyn Backend, key: &QueryKey, retry: u32) -> Result<Value, ApiError> {
    let mut attempt = 0;
    loop {
        match backend.fetch(&key.path, &key.params).await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < retry && !err.is_unauthorized() => {
                let delay = retry_delay(attempt);
                attempt += 1;
                tracing::warn!(
                    "Read {} failed ({}), retry {}/{} in {:?}",
                    key,
                    err,
                    attempt,
                    retry,
                    delay
                );
                tokio::time::sleep(delay).await;
            }
            Err(err) => return Err(err),
        }
    }
}

fn retry_delay(attempt: u32) -> Duration {
    let millis = 1000u64.saturating_mul(1u64 << attempt.min(16));
    Duration::from_millis(millis).min(MAX_RETRY_DELAY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{QueryParams, WriteMethod};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Answers reads with a counter after a short delay
    struct CountingBackend {
        calls: AtomicUsize,
        fail_first: usize,
    }

    impl CountingBackend {
        fn new(fail_first: usize) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                fail_first,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Backend for CountingBackend {
        async fn fetch(&self, path: &str, _params: &QueryParams) -> Result<Value, ApiError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            tokio::time::sleep(Duration::from_millis(50)).await;
            if path == "private" {
                return Err(ApiError::Unauthorized("nope".into()));
            }
            if n <= self.fail_first {
                return Err(ApiError::Transport("connection reset".into()));
            }
            Ok(json!({ "call": n }))
        }

        async fn write(&self, _: WriteMethod, _: &str, _: Option<&Value>) -> Result<Value, ApiError> {
            Ok(json!({}))
        }
    }

    fn products() -> QueryKey {
        QueryKey::new("products", QueryParams::new().with("offset", 0).with("limit", 10))
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_reads_share_one_request() {
        let backend = CountingBackend::new(0);
        let client = QueryClient::new(backend.clone());
        let opts = QueryOptions::default();

        let (a, b, c) = tokio::join!(
            client.fetch(products(), opts),
            client.fetch(products(), opts),
            client.fetch(products(), opts),
        );

        assert_eq!(backend.calls(), 1);
        for state in [a, b, c] {
            assert!(state.is_success);
            assert_eq!(state.data, Some(json!({ "call": 1 })));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fresh_data_served_from_cache() {
        let backend = CountingBackend::new(0);
        let client = QueryClient::new(backend.clone());
        let opts = QueryOptions::default();

        client.fetch(products(), opts).await;
        tokio::time::advance(Duration::from_secs(60)).await;
        client.fetch(products(), opts).await;
        assert_eq!(backend.calls(), 1);

        tokio::time::advance(DEFAULT_STALE_TIME).await;
        let state = client.fetch(products(), opts).await;
        assert_eq!(backend.calls(), 2);
        assert_eq!(state.data, Some(json!({ "call": 2 })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidation_forces_refetch() {
        let backend = CountingBackend::new(0);
        let client = QueryClient::new(backend.clone());
        let opts = QueryOptions::default();

        client.fetch(products(), opts).await;
        client.fetch(QueryKey::path("categories"), opts).await;
        assert_eq!(client.invalidate(&["products"]), 1);
        assert!(client.is_stale(&products(), opts));
        assert!(!client.is_stale(&QueryKey::path("categories"), opts));

        client.fetch(products(), opts).await;
        assert_eq!(backend.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_query_makes_no_request() {
        let backend = CountingBackend::new(0);
        let client = QueryClient::new(backend.clone());

        let state = client.fetch(products(), QueryOptions::default().enabled(false)).await;
        assert_eq!(backend.calls(), 0);
        assert!(state.data.is_none());
        assert!(!state.is_fetching);

        client.fetch(products(), QueryOptions::default()).await;
        client.invalidate(&["products"]);
        let state = client.fetch(products(), QueryOptions::default().enabled(false)).await;
        assert_eq!(backend.calls(), 1);
        assert_eq!(state.data, Some(json!({ "call": 1 })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_then_succeed() {
        let backend = CountingBackend::new(1);
        let client = QueryClient::new(backend.clone());

        let state = client.fetch(products(), QueryOptions::default().retry(1)).await;
        assert_eq!(backend.calls(), 2);
        assert!(state.is_success);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_retry_by_default() {
        let backend = CountingBackend::new(1);
        let client = QueryClient::new(backend.clone());

        let state = client.fetch(products(), QueryOptions::default()).await;
        assert_eq!(backend.calls(), 1);
        assert!(!state.is_success);
        assert!(matches!(state.error, Some(ApiError::Transport(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unauthorized_is_not_retried() {
        let backend = CountingBackend::new(0);
        let client = QueryClient::new(backend.clone());

        let state = client
            .fetch(QueryKey::path("private"), QueryOptions::default().retry(3))
            .await;
        assert_eq!(backend.calls(), 1);
        assert!(state.error.unwrap().is_unauthorized());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_refetch_keeps_data() {
        struct Flaky(AtomicUsize);

        #[async_trait]
        impl Backend for Flaky {
            async fn fetch(&self, _: &str, _: &QueryParams) -> Result<Value, ApiError> {
                match self.0.fetch_add(1, Ordering::SeqCst) {
                    0 => Ok(json!([1, 2, 3])),
                    _ => Err(ApiError::Transport("down".into())),
                }
            }

            async fn write(&self, _: WriteMethod, _: &str, _: Option<&Value>) -> Result<Value, ApiError> {
                Ok(json!({}))
            }
        }

        let client = QueryClient::new(Arc::new(Flaky(AtomicUsize::new(0))));
        client.fetch(products(), QueryOptions::default()).await;
        client.invalidate(&["products"]);

        let state = client.fetch(products(), QueryOptions::default()).await;
        assert_eq!(state.data, Some(json!([1, 2, 3])));
        assert!(state.error.is_some());
        assert!(!state.is_success);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidation_during_fetch_keeps_entry_stale() {
        let backend = CountingBackend::new(0);
        let client = QueryClient::new(backend.clone());

        let reader = {
            let client = client.clone();
            tokio::spawn(async move { client.fetch(products(), QueryOptions::default()).await })
        };
        tokio::task::yield_now().await;
        assert!(client.snapshot(&products()).is_loading);

        client.invalidate(&["products"]);
        reader.await.unwrap();

        assert!(client.is_stale(&products(), QueryOptions::default()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_after_invalidation_does_not_join_older_request() {
        let backend = CountingBackend::new(0);
        let client = QueryClient::new(backend.clone());

        let early = {
            let client = client.clone();
            tokio::spawn(async move { client.fetch(products(), QueryOptions::default()).await })
        };
        tokio::task::yield_now().await;
        assert_eq!(backend.calls(), 1);

        client.invalidate(&["products"]);
        let state = client.fetch(products(), QueryOptions::default()).await;
        assert_eq!(backend.calls(), 2);
        assert_eq!(state.data, Some(json!({ "call": 2 })));

        early.await.unwrap();
        assert_eq!(client.snapshot(&products()).data, Some(json!({ "call": 2 })));
        assert!(!client.is_stale(&products(), QueryOptions::default()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unused_entries_are_swept() {
        let backend = CountingBackend::new(0);
        let client = QueryClient::new(backend.clone());
        let search = |text: String| {
            QueryKey::new("products", QueryParams::new().with("searchedText", text).with("offset", 0))
        };

        for i in 0..200 {
            client.fetch(search(format!("shoe {}", i)), QueryOptions::default()).await;
        }
        assert_eq!(client.cache.lock().len(), 200);

        // Still inside stale + gc time: nothing goes
        tokio::time::advance(Duration::from_secs(9 * 60)).await;
        client.fetch(products(), QueryOptions::default()).await;
        assert_eq!(client.cache.lock().len(), 201);

        tokio::time::advance(Duration::from_secs(24 * 60 * 60)).await;
        client.fetch(products(), QueryOptions::default()).await;
        let cache = client.cache.lock();
        assert_eq!(cache.len(), 1);
        assert!(cache.contains_key(&products()));
    }

    #[test]
    fn test_decode_failure_becomes_error() {
        let state = QueryState {
            data: Some(json!({ "not": "a list" })),
            is_success: true,
            ..QueryState::default()
        };
        let typed: QueryState<Vec<u32>> = state.decode();
        assert!(typed.data.is_none());
        assert!(matches!(typed.error, Some(ApiError::Decode(_))));
    }
}
