//! Redis-based cache store.

use super::{CacheStore, KeyPattern};
use async_trait::async_trait;
use deadpool_redis::redis::{self, AsyncCommands, RedisError};
use deadpool_redis::{Config, Pool, PoolError, Runtime};
use parking_lot::Mutex;
use shaku::Component;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tidings_config::RedisConfig;
use tidings_core::{deadline, Clock, SystemClock, TidingsError, TidingsResult};
use tracing::{debug, error, info, warn};

/// Keys requested per `SCAN` round trip.
const SCAN_BATCH: usize = 100;

/// Connection lifecycle of the distributed cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No operation has completed yet.
    Connecting,
    /// The last operation succeeded.
    Connected,
    /// The last operation failed; waiting for the reconnect delay.
    Error,
    /// The reconnect delay elapsed; the next operation tries the server again.
    Retrying,
    /// Too many consecutive failures; no further attempts until restart.
    Exhausted,
}

/// Reconnect policy for [`ConnectionTracker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Consecutive failures after which the tracker gives up.
    pub max_failures: u32,
    /// Delay step multiplied by the failure count.
    pub delay_step: Duration,
    /// Upper bound for the reconnect delay.
    pub max_delay: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_failures: 5,
            delay_step: Duration::from_millis(500),
            max_delay: Duration::from_secs(2),
        }
    }
}

impl ReconnectPolicy {
    /// Delay before the next attempt after `failures` consecutive failures.
    #[must_use]
    pub fn delay_after(&self, failures: u32) -> Duration {
        self.delay_step.saturating_mul(failures).min(self.max_delay)
    }
}

impl From<&RedisConfig> for ReconnectPolicy {
    fn from(config: &RedisConfig) -> Self {
        Self {
            max_failures: config.max_reconnect_attempts,
            delay_step: config.reconnect_delay(),
            max_delay: config.max_reconnect_delay(),
        }
    }
}

#[derive(Debug)]
struct TrackerState {
    state: ConnectionState,
    failures: u32,
    retry_at: Option<Instant>,
}

/// Tracks connection health and decides whether an operation may be tried.
pub struct ConnectionTracker {
    policy: ReconnectPolicy,
    clock: Arc<dyn Clock>,
    inner: Mutex<TrackerState>,
}

impl ConnectionTracker {
    /// Creates a tracker in the `Connecting` state.
    #[must_use]
    pub fn new(policy: ReconnectPolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            policy,
            clock,
            inner: Mutex::new(TrackerState {
                state: ConnectionState::Connecting,
                failures: 0,
                retry_at: None,
            }),
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.inner.lock().state
    }

    /// Consecutive failures recorded since the last success.
    #[must_use]
    pub fn failures(&self) -> u32 {
        self.inner.lock().failures
    }

    /// Whether operations would currently be attempted.
    #[must_use]
    pub fn is_available(&self) -> bool {
        let inner = self.inner.lock();
        match inner.state {
            ConnectionState::Connecting | ConnectionState::Connected | ConnectionState::Retrying => {
                true
            }
            ConnectionState::Error => inner.retry_at.is_some_and(|at| self.clock.now() >= at),
            ConnectionState::Exhausted => false,
        }
    }

    /// Claims permission for one operation, moving `Error` to `Retrying` once
    /// the reconnect delay has elapsed.
    pub fn try_acquire(&self) -> bool {
        let mut inner = self.inner.lock();
        match inner.state {
            ConnectionState::Connecting | ConnectionState::Connected | ConnectionState::Retrying => {
                true
            }
            ConnectionState::Error => {
                if inner.retry_at.is_some_and(|at| self.clock.now() >= at) {
                    inner.state = ConnectionState::Retrying;
                    debug!("Retrying Redis connection (attempt {})", inner.failures + 1);
                    true
                } else {
                    false
                }
            }
            ConnectionState::Exhausted => false,
        }
    }

    /// Records a successful round trip.
    pub fn record_success(&self) {
        let mut inner = self.inner.lock();
        if inner.state == ConnectionState::Exhausted {
            return;
        }
        if inner.state != ConnectionState::Connected {
            info!("Redis connection established");
        }
        inner.state = ConnectionState::Connected;
        inner.failures = 0;
        inner.retry_at = None;
    }

    /// Records a connectivity failure.
    pub fn record_failure(&self) {
        let mut inner = self.inner.lock();
        if inner.state == ConnectionState::Exhausted {
            return;
        }

        inner.failures += 1;
        if inner.failures >= self.policy.max_failures {
            inner.state = ConnectionState::Exhausted;
            inner.retry_at = None;
            error!(
                "Max Redis reconnection attempts ({}) reached; serving from fallback store",
                self.policy.max_failures
            );
        } else {
            let delay = self.policy.delay_after(inner.failures);
            inner.state = ConnectionState::Error;
            inner.retry_at = Some(deadline(self.clock.now(), delay));
            warn!(
                "Redis connection failed ({} of {}); retrying in {:?}",
                inner.failures, self.policy.max_failures, delay
            );
        }
    }
}

impl Default for ConnectionTracker {
    fn default() -> Self {
        Self::new(ReconnectPolicy::default(), Arc::new(SystemClock))
    }
}

/// Redis-based cache store.
#[derive(Component)]
#[shaku(interface = CacheStore)]
pub struct RedisCacheClient {
    /// Redis connection pool; `None` when Redis is disabled.
    pool: Option<Pool>,
    tracker: ConnectionTracker,
}

impl RedisCacheClient {
    /// Builds a client from configuration.
    ///
    /// The pool connects lazily; a disabled configuration yields a client
    /// that is permanently unavailable.
    pub fn from_config(config: &RedisConfig) -> TidingsResult<Self> {
        if !config.enabled {
            info!("Redis disabled; cache traffic goes to the fallback store");
            return Ok(Self::disabled());
        }

        let pool = Config::from_url(config.connection_url())
            .builder()
            .map_err(|e| TidingsError::Configuration(format!("Invalid Redis config: {}", e)))?
            .max_size(config.pool_size)
            .runtime(Runtime::Tokio1)
            .wait_timeout(Some(config.connect_timeout()))
            .create_timeout(Some(config.connect_timeout()))
            .recycle_timeout(Some(config.connect_timeout()))
            .build()
            .map_err(|e| TidingsError::Configuration(format!("Failed to create Redis pool: {}", e)))?;

        Ok(Self::new(
            pool,
            ReconnectPolicy::from(config),
            Arc::new(SystemClock),
        ))
    }

    /// Component parameters for `config`.
    pub fn parameters(config: &RedisConfig) -> TidingsResult<RedisCacheClientParameters> {
        let client = Self::from_config(config)?;
        Ok(RedisCacheClientParameters {
            pool: client.pool,
            tracker: client.tracker,
        })
    }

    /// Creates a client over an existing pool.
    #[must_use]
    pub fn new(pool: Pool, policy: ReconnectPolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            pool: Some(pool),
            tracker: ConnectionTracker::new(policy, clock),
        }
    }

    /// Create a client that never accepts operations (for when Redis is disabled).
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            pool: None,
            tracker: ConnectionTracker::default(),
        }
    }

    /// Current connection state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        if self.pool.is_none() {
            return ConnectionState::Exhausted;
        }
        self.tracker.state()
    }

    /// Sends `PING`, updating the connection state.
    pub async fn ping(&self) -> TidingsResult<()> {
        let mut conn = self.conn().await?;
        let result = redis::cmd("PING").query_async::<String>(&mut *conn).await;
        self.track(result).map(|_| ())
    }

    /// Get a connection from the pool.
    async fn conn(&self) -> TidingsResult<deadpool_redis::Connection> {
        let Some(pool) = &self.pool else {
            return Err(TidingsError::cache_unavailable("Redis is disabled"));
        };
        if !self.tracker.try_acquire() {
            return Err(TidingsError::cache_unavailable(format!(
                "Redis unavailable ({:?})",
                self.tracker.state()
            )));
        }

        match pool.get().await {
            Ok(conn) => Ok(conn),
            Err(e) => {
                self.tracker.record_failure();
                Err(pool_error(&e))
            }
        }
    }

    /// Updates the tracker from a command result and maps the error.
    fn track<T>(&self, result: Result<T, RedisError>) -> TidingsResult<T> {
        match result {
            Ok(value) => {
                self.tracker.record_success();
                Ok(value)
            }
            Err(e) => {
                if is_connectivity_error(&e) {
                    self.tracker.record_failure();
                }
                Err(TidingsError::cache_unavailable(format!("Redis command failed: {}", e)))
            }
        }
    }
}

fn is_connectivity_error(e: &RedisError) -> bool {
    e.is_io_error() || e.is_connection_refusal() || e.is_connection_dropped() || e.is_timeout()
}

fn pool_error(e: &PoolError) -> TidingsError {
    TidingsError::cache_unavailable(format!("Failed to get Redis connection: {}", e))
}

#[async_trait]
impl CacheStore for RedisCacheClient {
    async fn get_raw(&self, key: &str) -> TidingsResult<Option<String>> {
        let mut conn = self.conn().await?;
        let value: Option<String> = self.track(conn.get(key).await)?;

        match &value {
            Some(_) => debug!("Cache hit for key '{}'", key),
            None => debug!("Cache miss for key '{}'", key),
        }

        Ok(value)
    }

    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> TidingsResult<()> {
        let mut conn = self.conn().await?;
        let ttl_secs = ttl.as_secs().max(1);

        self.track(conn.set_ex::<_, _, ()>(key, value, ttl_secs).await)?;

        debug!("Cached key '{}' with TTL {}s", key, ttl_secs);
        Ok(())
    }

    async fn delete_matching(&self, pattern: &str) -> TidingsResult<u64> {
        let pattern = KeyPattern::parse(pattern)?;
        let mut conn = self.conn().await?;

        if !pattern.is_prefix() {
            let deleted: u64 = self.track(conn.del(pattern.as_str()).await)?;
            return Ok(deleted);
        }

        let glob = pattern.to_redis_glob();
        let mut cursor: u64 = 0;
        let mut deleted: u64 = 0;

        loop {
            let (next, keys): (u64, Vec<String>) = self.track(
                redis::cmd("SCAN")
                    .arg(cursor)
                    .arg("MATCH")
                    .arg(&glob)
                    .arg("COUNT")
                    .arg(SCAN_BATCH)
                    .query_async(&mut *conn)
                    .await,
            )?;

            if !keys.is_empty() {
                let removed: u64 = self.track(conn.del(&keys).await)?;
                deleted += removed;
            }

            if next == 0 {
                break;
            }
            cursor = next;
        }

        debug!("Deleted {} keys matching pattern '{}'", deleted, pattern);
        Ok(deleted)
    }

    fn is_available(&self) -> bool {
        self.pool.is_some() && self.tracker.is_available()
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}
