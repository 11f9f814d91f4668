//! Outbound request throttling around governor.
//!
//! One throttle is shared by every endpoint of a gateway so a burst of
//! lookups cannot exceed the provider quota.

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use std::num::NonZeroU32;
use tracing::{debug, instrument};

/// Shared request throttle. A zero rate disables throttling.
pub struct RequestThrottle {
    limiter: Option<DefaultDirectRateLimiter>,
    requests_per_second: u32,
}

impl RequestThrottle {
    /// Create a throttle allowing `requests_per_second` requests.
    pub fn new(requests_per_second: u32) -> Self {
        let limiter = NonZeroU32::new(requests_per_second)
            .map(|rate| RateLimiter::direct(Quota::per_second(rate)));

        Self {
            limiter,
            requests_per_second,
        }
    }

    /// A throttle that never waits.
    pub fn unlimited() -> Self {
        Self::new(0)
    }

    /// Wait until a request may be sent.
    #[instrument(skip(self))]
    pub async fn acquire(&self) {
        if let Some(limiter) = &self.limiter {
            if limiter.check().is_err() {
                debug!("Rate limit reached, waiting for permit");
                limiter.until_ready().await;
            }
        }
    }

    pub fn requests_per_second(&self) -> u32 {
        self.requests_per_second
    }

    pub fn is_enabled(&self) -> bool {
        self.limiter.is_some()
    }
}
