//! Common test infrastructure for service integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;
use testcontainers::{runners::AsyncRunner, ContainerAsync};
use testcontainers_modules::redis::Redis;
use tidings_config::RedisConfig;
use tidings_resilience::RetryPolicy;
use tidings_service::{CacheStore, FetchPolicy, MemoryCacheStore, RedisCacheClient, ResilientCache};

/// Redis container wrapper.
///
/// Keeps the container alive for as long as the client is in use.
pub struct TestRedis {
    _container: ContainerAsync<Redis>,
    client: Arc<RedisCacheClient>,
}

impl TestRedis {
    /// Starts a fresh Redis container and waits until it answers `PING`.
    pub async fn new() -> Self {
        let container = Redis::default()
            .start()
            .await
            .expect("Failed to start Redis container");

        let port = container
            .get_host_port_ipv4(6379)
            .await
            .expect("Failed to get Redis port");

        let config = RedisConfig {
            host: "127.0.0.1".to_string(),
            port,
            ..Default::default()
        };

        let client = Self::connect_with_retry(&config, 30).await;

        Self {
            _container: container,
            client: Arc::new(client),
        }
    }

    pub fn client(&self) -> Arc<RedisCacheClient> {
        Arc::clone(&self.client)
    }

    async fn connect_with_retry(config: &RedisConfig, max_attempts: u32) -> RedisCacheClient {
        let mut attempts = 0;
        loop {
            attempts += 1;
            let client = RedisCacheClient::from_config(config).expect("Invalid Redis config");
            match client.ping().await {
                Ok(()) => return client,
                Err(e) => {
                    if attempts >= max_attempts {
                        panic!("Redis not ready after {} attempts: {}", max_attempts, e);
                    }
                    tokio::time::sleep(Duration::from_secs(1)).await;
                }
            }
        }
    }
}

/// A cache whose primary and fallback are both in-process stores.
pub fn memory_cache() -> (ResilientCache, Arc<MemoryCacheStore>) {
    let primary = Arc::new(MemoryCacheStore::new(1_000));
    let cache = ResilientCache::new(
        primary.clone() as Arc<dyn CacheStore>,
        Arc::new(MemoryCacheStore::new(1_000)),
    );
    (cache, primary)
}

/// Fetch settings with short retry delays.
pub fn fetch_policy() -> FetchPolicy {
    FetchPolicy {
        retry: RetryPolicy {
            max_attempts: 3,
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(40),
            backoff_factor: 2.0,
        },
        attempt_timeout: Duration::from_secs(2),
    }
}
