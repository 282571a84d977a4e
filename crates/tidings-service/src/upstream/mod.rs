//! Clients for the third-party news and podcast APIs.
//!
//! Every failure leaves a client as a [`TidingsError::Upstream`] carrying a
//! classified [`NormalizedUpstreamError`], so the retry policy can decide
//! from the error kind alone.
//!
//! [`TidingsError::Upstream`]: tidings_core::TidingsError::Upstream
//! [`NormalizedUpstreamError`]: tidings_core::NormalizedUpstreamError

pub mod http;
mod news_client;
mod podcast_client;

pub use news_client::{NewsApiClient, NewsApiClientParameters, NewsProvider};
pub use podcast_client::{PodcastApiClient, PodcastApiClientParameters, PodcastProvider};

#[cfg(test)]
pub use news_client::MockNewsProvider;
#[cfg(test)]
pub use podcast_client::MockPodcastProvider;
