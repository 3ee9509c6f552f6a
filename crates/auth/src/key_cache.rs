//! Process-wide cache of the issuer's signing key set.
//!
//! Reads never block on the network when the key id is already cached.
//! Refreshes are serialized: at most one fetch is in flight, and lookups that
//! queued behind a fetch share its outcome instead of starting their own.
//! Refreshes triggered by unknown key ids are spaced by
//! `min_refresh_interval` so a stream of forged `kid`s cannot hammer the
//! issuer; explicit [`KeySetCache::refresh`] calls are never throttled and do
//! not count against that interval.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::jwks::{KeySetError, KeySetSource, SigningKey, SigningKeySet};

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Default)]
struct RefreshState {
    /// Start of the last refresh caused by an unknown key id.
    last_miss_refresh: Option<Instant>,
    /// Reason the most recent fetch failed; cleared by a successful one.
    last_failure: Option<String>,
}

impl RefreshState {
    fn outcome_for(&self, kid: &str) -> KeySetError {
        match &self.last_failure {
            Some(reason) => KeySetError::Unavailable(reason.clone()),
            None => KeySetError::UnknownKey { kid: kid.to_string() },
        }
    }
}

pub struct KeySetCache {
    source: Arc<dyn KeySetSource>,
    current: RwLock<Option<Arc<SigningKeySet>>>,
    // Held across the fetch.
    refresh: Mutex<RefreshState>,
    completed_fetches: AtomicU64,
    fetch_timeout: Duration,
    min_refresh_interval: Duration,
}

impl KeySetCache {
    pub fn new(source: Arc<dyn KeySetSource>) -> Self {
        Self {
            source,
            current: RwLock::new(None),
            refresh: Mutex::new(RefreshState::default()),
            completed_fetches: AtomicU64::new(0),
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            min_refresh_interval: DEFAULT_MIN_REFRESH_INTERVAL,
        }
    }

    /// Upper bound on a single fetch; a slow issuer fails fast instead of
    /// holding requests.
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn with_min_refresh_interval(mut self, interval: Duration) -> Self {
        self.min_refresh_interval = interval;
        self
    }

    /// Currently cached key set, if any fetch has succeeded.
    pub fn snapshot(&self) -> Option<Arc<SigningKeySet>> {
        self.current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Fetch the key set now and replace the cached one.
    ///
    /// On failure the previously cached set stays in place.
    pub async fn refresh(&self) -> Result<Arc<SigningKeySet>, KeySetError> {
        let mut state = self.refresh.lock().await;
        self.fetch_and_store(&mut state).await
    }

    /// Look up the signing key for `kid`.
    ///
    /// A miss triggers one refresh unless another refresh caused by an unknown
    /// key id started less than `min_refresh_interval` ago. A key id still
    /// unknown afterwards is an error rather than an answer from the stale set.
    pub async fn key(&self, kid: &str) -> Result<Arc<SigningKey>, KeySetError> {
        let seen = self.completed_fetches.load(Ordering::Acquire);
        if let Some(key) = self.snapshot().and_then(|set| set.get(kid)) {
            return Ok(key);
        }

        let mut state = self.refresh.lock().await;

        if let Some(key) = self.snapshot().and_then(|set| set.get(kid)) {
            return Ok(key);
        }

        // A fetch finished while this lookup waited for the lock.
        if self.completed_fetches.load(Ordering::Acquire) != seen {
            return Err(state.outcome_for(kid));
        }

        let throttled = state
            .last_miss_refresh
            .is_some_and(|at| at.elapsed() < self.min_refresh_interval);
        if throttled {
            let err = state.outcome_for(kid);
            tracing::warn!(kid, error = %err, "unknown key id; refresh throttled");
            return Err(err);
        }

        state.last_miss_refresh = Some(Instant::now());
        let set = self.fetch_and_store(&mut state).await?;
        set.get(kid)
            .ok_or_else(|| KeySetError::UnknownKey { kid: kid.to_string() })
    }

    async fn fetch_and_store(
        &self,
        state: &mut RefreshState,
    ) -> Result<Arc<SigningKeySet>, KeySetError> {
        let fetched = tokio::time::timeout(self.fetch_timeout, self.source.fetch()).await;
        let result = match fetched {
            Ok(Ok(jwks)) => {
                let set = Arc::new(SigningKeySet::from_jwks(&jwks));
                tracing::info!(keys = set.len(), "signing key set refreshed");
                *self
                    .current
                    .write()
                    .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(set.clone());
                state.last_failure = None;
                Ok(set)
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "signing key set fetch failed");
                state.last_failure = Some(e.to_string());
                Err(e)
            }
            Err(_) => {
                let e = KeySetError::Timeout(self.fetch_timeout);
                tracing::warn!(timeout = ?self.fetch_timeout, "signing key set fetch timed out");
                state.last_failure = Some(e.to_string());
                Err(e)
            }
        };
        self.completed_fetches.fetch_add(1, Ordering::Release);
        result
    }
}

impl core::fmt::Debug for KeySetCache {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("KeySetCache")
            .field("current", &self.snapshot())
            .field("fetch_timeout", &self.fetch_timeout)
            .field("min_refresh_interval", &self.min_refresh_interval)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;

    use async_trait::async_trait;
    use jsonwebtoken::jwk::JwkSet;

    use crate::testutil::{TestKey, jwks};

    /// Source whose document can be swapped, counting fetches.
    struct RotatingSource {
        jwks: StdMutex<JwkSet>,
        fetches: AtomicUsize,
    }

    impl RotatingSource {
        fn new(jwks: JwkSet) -> Arc<Self> {
            Arc::new(Self {
                jwks: StdMutex::new(jwks),
                fetches: AtomicUsize::new(0),
            })
        }

        fn rotate(&self, jwks: JwkSet) {
            *self.jwks.lock().unwrap() = jwks;
        }

        fn fetches(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl KeySetSource for RotatingSource {
        async fn fetch(&self) -> Result<JwkSet, KeySetError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(self.jwks.lock().unwrap().clone())
        }
    }

    #[derive(Default)]
    struct HangingSource {
        fetches: AtomicUsize,
    }

    #[async_trait]
    impl KeySetSource for HangingSource {
        async fn fetch(&self) -> Result<JwkSet, KeySetError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn first_lookup_fetches_then_serves_from_cache() {
        let source = RotatingSource::new(jwks(&[("k1", &TestKey::primary())]));
        let cache = KeySetCache::new(source.clone());

        assert!(cache.snapshot().is_none());
        assert_eq!(cache.key("k1").await.unwrap().kid(), "k1");
        assert_eq!(cache.key("k1").await.unwrap().kid(), "k1");
        assert_eq!(source.fetches(), 1);
    }

    #[tokio::test]
    async fn unknown_kid_triggers_refresh_and_finds_rotated_key() {
        let source = RotatingSource::new(jwks(&[("k1", &TestKey::primary())]));
        let cache = KeySetCache::new(source.clone()).with_min_refresh_interval(Duration::ZERO);
        cache.key("k1").await.unwrap();

        source.rotate(jwks(&[("k2", &TestKey::secondary())]));

        assert_eq!(cache.key("k2").await.unwrap().kid(), "k2");
        assert_eq!(source.fetches(), 2);
    }

    #[tokio::test]
    async fn unknown_kid_is_an_error_after_refresh() {
        let source = RotatingSource::new(jwks(&[("k1", &TestKey::primary())]));
        let cache = KeySetCache::new(source.clone()).with_min_refresh_interval(Duration::ZERO);

        let err = cache.key("nope").await.unwrap_err();
        assert!(matches!(err, KeySetError::UnknownKey { ref kid } if kid == "nope"));
    }

    #[tokio::test]
    async fn refreshes_for_unknown_kids_are_throttled() {
        let source = RotatingSource::new(jwks(&[("k1", &TestKey::primary())]));
        let cache = KeySetCache::new(source.clone()).with_min_refresh_interval(Duration::from_secs(60));
        cache.key("k1").await.unwrap();

        for _ in 0..5 {
            assert!(cache.key("forged").await.is_err());
        }
        assert_eq!(source.fetches(), 1);
    }

    #[tokio::test]
    async fn explicit_refresh_ignores_throttle() {
        let source = RotatingSource::new(jwks(&[("k1", &TestKey::primary())]));
        let cache = KeySetCache::new(source.clone()).with_min_refresh_interval(Duration::from_secs(60));
        cache.key("k1").await.unwrap();

        source.rotate(jwks(&[("k2", &TestKey::secondary())]));
        let set = cache.refresh().await.unwrap();

        assert!(set.contains("k2"));
        assert!(!set.contains("k1"));
        assert_eq!(source.fetches(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_source_times_out() {
        let cache = KeySetCache::new(Arc::new(HangingSource::default()))
            .with_fetch_timeout(Duration::from_millis(50));

        let err = cache.key("k1").await.unwrap_err();
        assert!(matches!(err, KeySetError::Timeout(_)));
        assert!(cache.snapshot().is_none());
    }

    #[tokio::test]
    async fn concurrent_lookups_share_one_fetch() {
        let source = RotatingSource::new(jwks(&[("k1", &TestKey::primary())]));
        let cache = Arc::new(KeySetCache::new(source.clone()));

        let lookups = (0..16).map(|_| {
            let cache = cache.clone();
            tokio::spawn(async move { cache.key("k1").await.map(|k| k.kid().to_string()) })
        });
        for handle in lookups {
            assert_eq!(handle.await.unwrap().unwrap(), "k1");
        }
        assert_eq!(source.fetches(), 1);
    }

    #[tokio::test]
    async fn warm_up_refresh_does_not_throttle_rotation() {
        let source = RotatingSource::new(jwks(&[("k1", &TestKey::primary())]));
        let cache = KeySetCache::new(source.clone());
        cache.refresh().await.unwrap();

        source.rotate(jwks(&[("k1", &TestKey::primary()), ("k2", &TestKey::secondary())]));

        assert_eq!(cache.key("k2").await.unwrap().kid(), "k2");
        assert_eq!(source.fetches(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn queued_lookups_share_a_failed_fetch() {
        let source = Arc::new(HangingSource::default());
        let cache = Arc::new(
            KeySetCache::new(source.clone()).with_fetch_timeout(Duration::from_millis(50)),
        );

        let lookups: Vec<_> = (0..10)
            .map(|_| {
                let cache = cache.clone();
                tokio::spawn(async move {
                    let started = Instant::now();
                    let result = cache.key("k1").await;
                    (result.is_err(), started.elapsed())
                })
            })
            .collect();

        for handle in lookups {
            let (failed, elapsed) = handle.await.unwrap();
            assert!(failed);
            assert!(elapsed <= Duration::from_millis(100), "waited {elapsed:?}");
        }
        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_fetch_is_not_retried_within_interval() {
        let source = Arc::new(HangingSource::default());
        let cache = KeySetCache::new(source.clone())
            .with_fetch_timeout(Duration::from_millis(50))
            .with_min_refresh_interval(Duration::from_secs(30));

        assert!(matches!(cache.key("k1").await, Err(KeySetError::Timeout(_))));

        let started = Instant::now();
        assert!(matches!(cache.key("k1").await, Err(KeySetError::Unavailable(_))));
        assert_eq!(started.elapsed(), Duration::ZERO);
        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_secs(31)).await;
        assert!(matches!(cache.key("k1").await, Err(KeySetError::Timeout(_))));
        assert_eq!(source.fetches.load(Ordering::SeqCst), 2);
    }
}
