//! Fixed-window rate limiter.
//!
//! Each provider gets `rate_limit_per_minute` admissions per 60-second window.
//! The window restarts on the first acquisition at least 60 seconds after it
//! began. A rejection is not a provider failure and touches no health state.

use dashmap::DashMap;
use relay_core::ProviderConfig;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Length of one rate window
pub const RATE_WINDOW: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy)]
struct RateWindow {
    limit: u32,
    count: u32,
    window_start: Instant,
}

impl RateWindow {
    fn new(limit: u32, now: Instant) -> Self {
        Self {
            limit,
            count: 0,
            window_start: now,
        }
    }

    fn roll(&mut self, now: Instant) {
        if now.duration_since(self.window_start) >= RATE_WINDOW {
            self.count = 0;
            self.window_start = now;
        }
    }
}

/// Per-provider fixed-window rate limiter
///
/// Ids that were never registered are not limited.
#[derive(Debug, Default)]
pub struct RateLimiter {
    windows: DashMap<String, RateWindow>,
}

impl RateLimiter {
    /// Create an empty limiter
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the per-minute limit of a provider
    ///
    /// Re-registering keeps the current window's count.
    pub fn register(&self, provider_id: impl Into<String>, limit_per_minute: u32) {
        let now = Instant::now();
        self.windows
            .entry(provider_id.into())
            .and_modify(|w| w.limit = limit_per_minute)
            .or_insert_with(|| RateWindow::new(limit_per_minute, now));
    }

    /// Register a provider with its configured limit
    pub fn register_provider(&self, provider: &ProviderConfig) {
        self.register(provider.id.clone(), provider.rate_limit_per_minute);
    }

    /// Try to take one admission from the provider's current window
    pub fn try_acquire(&self, provider_id: &str) -> bool {
        let Some(mut window) = self.windows.get_mut(provider_id) else {
            return true;
        };

        let now = Instant::now();
        window.roll(now);

        if window.count < window.limit {
            window.count += 1;
            true
        } else {
            debug!(
                provider = %provider_id,
                limit = window.limit,
                "Rate limit reached for current window"
            );
            false
        }
    }

    /// Admissions left in the provider's current window
    #[must_use]
    pub fn remaining(&self, provider_id: &str) -> Option<u32> {
        self.windows.get(provider_id).map(|window| {
            let mut window = *window;
            window.roll(Instant::now());
            window.limit.saturating_sub(window.count)
        })
    }

    /// Time until the provider's current window restarts
    #[must_use]
    pub fn resets_in(&self, provider_id: &str) -> Option<Duration> {
        self.windows.get(provider_id).map(|window| {
            (window.window_start + RATE_WINDOW).saturating_duration_since(Instant::now())
        })
    }

    /// Start a fresh window for a provider
    pub fn reset(&self, provider_id: &str) {
        if let Some(mut window) = self.windows.get_mut(provider_id) {
            *window = RateWindow::new(window.limit, Instant::now());
        }
    }
}
