//! Server startup utilities.

use crate::di::AppModule;
use tidings_config::CacheConfig;
use tidings_service::spawn_stale_news_invalidation;
use tokio::task::JoinHandle;
use tracing::info;

/// Prints the startup banner.
pub fn print_banner() {
    info!(r#"
  _____ _     _ _
 |_   _(_) __| (_)_ __   __ _ ___
   | | | |/ _` | | '_ \ / _` / __|
   | | | | (_| | | | | | (_| \__ \
   |_| |_|\__,_|_|_| |_|\__, |___/
                        |___/
    "#);
}

/// Prints server startup information.
pub fn print_startup_info(addr: &str) {
    let separator = "=".repeat(60);
    info!("{}", separator);
    info!("REST API:  http://{}/api/v1", addr);
    info!("Health:    http://{}/health", addr);
    info!("API Docs:  http://{}/swagger-ui", addr);
    info!("{}", separator);
}

/// Starts the background maintenance tasks.
///
/// The fallback sweeper always runs; scheduled news invalidation runs only
/// when an interval is configured.
pub fn spawn_background_tasks(module: &AppModule, config: &CacheConfig) -> Vec<JoinHandle<()>> {
    let mut tasks = vec![module.fallback().spawn_sweeper(config.fallback_sweep_interval())];
    info!(
        "Fallback sweeper running every {:?}",
        config.fallback_sweep_interval()
    );

    match config.stale_news_invalidation() {
        Some(every) => {
            tasks.push(spawn_stale_news_invalidation(module.cache(), every));
            info!("Stale news invalidation running every {:?}", every);
        }
        None => info!("Stale news invalidation disabled"),
    }

    tasks
}
