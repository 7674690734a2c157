//! Seams for the collaborators that deliver the engine's inputs.
//!
//! Fetching station observations and model profiles involves network I/O, retries and caching.
//! None of that belongs in the numeric engine, which only ever sees already resolved values.
//! The traits here are what a collaborator implements, the wrappers add retry and caching
//! around any implementation.
use crate::{
    error::{AnalysisError, Result},
    sounding::{ForecastSeries, SurfaceObservation},
};
use chrono::{Duration, NaiveDateTime, Utc};
use std::{collections::HashMap, hash::Hash, time};

/// Delivers forecast profiles.
pub trait ProfileSource {
    /// Fetch the hourly forecast snapshots for the analysis point.
    fn fetch_profiles(&mut self) -> Result<ForecastSeries>;
}

/// Delivers surface observations.
pub trait ObservationSource {
    /// Fetch the latest surface observation.
    fn fetch_observation(&mut self) -> Result<SurfaceObservation>;
}

/// Decides how often and how fast a failed fetch is retried.
pub trait RetryPolicy {
    /// Delay before retry number `attempt` (starting at 1), `None` to give up.
    fn delay(&self, attempt: u32) -> Option<time::Duration>;

    /// Wait out a delay.
    fn pause(&self, delay: time::Duration) {
        std::thread::sleep(delay);
    }
}

/// Retry with delays doubling every attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExponentialBackoff {
    max_attempts: u32,
    base_delay: time::Duration,
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        ExponentialBackoff {
            max_attempts: 3,
            base_delay: time::Duration::from_secs(1),
        }
    }
}

impl ExponentialBackoff {
    /// Builder method for the total number of attempts, including the first.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Builder method for the unit delay, the delay before retry `n` is `2^n` units.
    pub fn with_base_delay(mut self, base_delay: time::Duration) -> Self {
        self.base_delay = base_delay;
        self
    }
}

impl RetryPolicy for ExponentialBackoff {
    fn delay(&self, attempt: u32) -> Option<time::Duration> {
        if attempt >= self.max_attempts {
            return None;
        }

        self.base_delay.checked_mul(2u32.checked_pow(attempt)?)
    }
}

/// Run `fetch` until it succeeds or `policy` gives up, returning the last error.
pub fn fetch_with_retry<T, F>(policy: &dyn RetryPolicy, mut fetch: F) -> Result<T>
where
    F: FnMut() -> Result<T>,
{
    let mut attempt = 0;
    loop {
        match fetch() {
            Ok(val) => return Ok(val),
            Err(err) => {
                attempt += 1;
                match policy.delay(attempt) {
                    Some(delay) => {
                        log::warn!(
                            "fetch attempt {} failed ({}), retrying in {:?}",
                            attempt,
                            err,
                            delay
                        );
                        policy.pause(delay);
                    }
                    None => {
                        log::warn!("fetch failed after {} attempts: {}", attempt, err);
                        return Err(err);
                    }
                }
            }
        }
    }
}

/// Source of the current time.
pub trait Clock {
    /// The current time, UTC.
    fn now(&self) -> NaiveDateTime;
}

/// The system clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Utc::now().naive_utc()
    }
}

/// Default time to live of a cached forecast.
pub const DEFAULT_TTL_SECONDS: i64 = 600;

/// A map whose entries expire a fixed time after they were stored.
#[derive(Clone, Debug)]
pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: HashMap<K, (NaiveDateTime, V)>,
}

impl<K: Eq + Hash, V: Clone> TtlCache<K, V> {
    /// Create an empty cache.
    pub fn new(ttl: Duration) -> Self {
        TtlCache {
            ttl,
            entries: HashMap::new(),
        }
    }

    /// The time to live of an entry.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Get a copy of the value for `key` if it was stored less than the TTL before `now`.
    pub fn get(&self, key: &K, now: NaiveDateTime) -> Option<V> {
        self.entries
            .get(key)
            .filter(|(stored, _)| now - *stored < self.ttl)
            .map(|(_, val)| val.clone())
    }

    /// Store a value.
    pub fn insert(&mut self, key: K, val: V, now: NaiveDateTime) {
        self.entries.insert(key, (now, val));
    }

    /// Drop expired entries.
    pub fn purge(&mut self, now: NaiveDateTime) {
        let ttl = self.ttl;
        self.entries.retain(|_, (stored, _)| now - *stored < ttl);
    }
}

/// A `ProfileSource` wrapper that retries failed fetches and caches successful ones.
#[derive(Debug)]
pub struct CachedProfileSource<S, C = SystemClock, P = ExponentialBackoff> {
    inner: S,
    clock: C,
    policy: P,
    cache: TtlCache<(), ForecastSeries>,
}

impl<S: ProfileSource> CachedProfileSource<S> {
    /// Wrap `inner` with the system clock, the default TTL and the default retry policy.
    pub fn new(inner: S) -> Self {
        CachedProfileSource {
            inner,
            clock: SystemClock,
            policy: ExponentialBackoff::default(),
            cache: TtlCache::new(Duration::seconds(DEFAULT_TTL_SECONDS)),
        }
    }
}

impl<S, C, P> CachedProfileSource<S, C, P>
where
    S: ProfileSource,
    C: Clock,
    P: RetryPolicy,
{
    /// Builder method for the clock.
    pub fn with_clock<C2: Clock>(self, clock: C2) -> CachedProfileSource<S, C2, P> {
        CachedProfileSource {
            inner: self.inner,
            clock,
            policy: self.policy,
            cache: self.cache,
        }
    }

    /// Builder method for the retry policy.
    pub fn with_policy<P2: RetryPolicy>(self, policy: P2) -> CachedProfileSource<S, C, P2> {
        CachedProfileSource {
            inner: self.inner,
            clock: self.clock,
            policy,
            cache: self.cache,
        }
    }

    /// Builder method for the time to live.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.cache = TtlCache::new(ttl);
        self
    }
}

impl<S, C, P> ProfileSource for CachedProfileSource<S, C, P>
where
    S: ProfileSource,
    C: Clock,
    P: RetryPolicy,
{
    fn fetch_profiles(&mut self) -> Result<ForecastSeries> {
        let now = self.clock.now();
        if let Some(series) = self.cache.get(&(), now) {
            log::debug!("using cached forecast profiles");
            return Ok(series);
        }

        let inner = &mut self.inner;
        let series = fetch_with_retry(&self.policy, || inner.fetch_profiles())?;
        if series.snapshots().is_empty() {
            return Err(AnalysisError::Source(
                "forecast source returned no snapshots".to_owned(),
            ));
        }

        self.cache.insert((), series.clone(), now);
        Ok(series)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_data::convective_forecast;
    use chrono::NaiveDate;
    use std::{cell::Cell, rc::Rc};

    #[derive(Clone)]
    struct FakeClock(Rc<Cell<NaiveDateTime>>);

    impl FakeClock {
        fn new() -> Self {
            let start = NaiveDate::from_ymd_opt(2024, 7, 12)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap();
            FakeClock(Rc::new(Cell::new(start)))
        }

        fn advance(&self, seconds: i64) {
            self.0.set(self.0.get() + Duration::seconds(seconds));
        }
    }

    impl Clock for FakeClock {
        fn now(&self) -> NaiveDateTime {
            self.0.get()
        }
    }

    struct NoWait;

    impl RetryPolicy for NoWait {
        fn delay(&self, attempt: u32) -> Option<time::Duration> {
            ExponentialBackoff::default().delay(attempt)
        }

        fn pause(&self, _delay: time::Duration) {}
    }

    // Fails a set number of times before succeeding, counting the calls.
    struct FlakySource {
        failures: u32,
        calls: Rc<Cell<u32>>,
    }

    impl ProfileSource for FlakySource {
        fn fetch_profiles(&mut self) -> Result<ForecastSeries> {
            self.calls.set(self.calls.get() + 1);
            if self.calls.get() <= self.failures {
                Err(AnalysisError::Source("timeout".to_owned()))
            } else {
                Ok(ForecastSeries::new(vec![convective_forecast()]))
            }
        }
    }

    #[test]
    fn test_exponential_backoff() {
        let policy = ExponentialBackoff::default();
        assert_eq!(policy.delay(1), Some(time::Duration::from_secs(2)));
        assert_eq!(policy.delay(2), Some(time::Duration::from_secs(4)));
        assert_eq!(policy.delay(3), None);

        let policy = policy.with_max_attempts(5);
        assert_eq!(policy.delay(4), Some(time::Duration::from_secs(16)));
    }

    #[test]
    fn test_fetch_with_retry() {
        let mut calls = 0;
        let val = fetch_with_retry(&NoWait, || {
            calls += 1;
            if calls < 3 {
                Err(AnalysisError::Source("timeout".to_owned()))
            } else {
                Ok(calls)
            }
        });
        assert_eq!(val, Ok(3));

        let mut calls = 0;
        let val: Result<()> = fetch_with_retry(&NoWait, || {
            calls += 1;
            Err(AnalysisError::Source(format!("failure {}", calls)))
        });
        assert_eq!(val, Err(AnalysisError::Source("failure 3".to_owned())));
    }

    #[test]
    fn test_ttl_cache() {
        let clock = FakeClock::new();
        let mut cache = TtlCache::new(Duration::seconds(DEFAULT_TTL_SECONDS));
        cache.insert("a", 1, clock.now());

        clock.advance(599);
        assert_eq!(cache.get(&"a", clock.now()), Some(1));
        assert_eq!(cache.get(&"b", clock.now()), None);

        clock.advance(1);
        assert_eq!(cache.get(&"a", clock.now()), None);

        cache.purge(clock.now());
        assert!(cache.entries.is_empty());
    }

    #[test]
    fn test_cached_profile_source() {
        let clock = FakeClock::new();
        let calls = Rc::new(Cell::new(0));
        let mut source = CachedProfileSource::new(FlakySource {
            failures: 1,
            calls: Rc::clone(&calls),
        })
        .with_clock(clock.clone())
        .with_policy(NoWait);

        assert_eq!(source.fetch_profiles().unwrap().snapshots().len(), 1);
        assert_eq!(calls.get(), 2);

        // Served from the cache.
        clock.advance(300);
        assert!(source.fetch_profiles().is_ok());
        assert_eq!(calls.get(), 2);

        // Expired.
        clock.advance(300);
        assert!(source.fetch_profiles().is_ok());
        assert_eq!(calls.get(), 3);
    }
}
