//! Rate limiting middleware using tower-governor
//!
//! Pairing codes are short, so the routes that issue and check them are
//! limited per client address.

use axum::{
    extract::{ConnectInfo, Request},
    Router,
};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::KeyExtractor, GovernorError, GovernorLayer,
};
use tracing::warn;

/// Keys requests by peer IP. Requests without connection info share one key.
#[derive(Clone)]
pub struct IpKeyExtractor;

impl KeyExtractor for IpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        Ok(req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip())
            .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED)))
    }
}

/// Allow a burst of `per_minute` requests per address, refilled evenly over
/// a minute. Over the limit the routes answer 429.
pub fn limit_per_minute(router: Router, per_minute: u32) -> Router {
    if per_minute == 0 {
        return router;
    }
    let period = Duration::from_millis((60_000 / u64::from(per_minute)).max(1));
    let Some(config) = GovernorConfigBuilder::default()
        .key_extractor(IpKeyExtractor)
        .period(period)
        .burst_size(per_minute)
        .finish()
    else {
        warn!("Invalid rate limit of {} per minute, not limiting", per_minute);
        return router;
    };
    router.layer(GovernorLayer::new(Arc::new(config)))
}
