use governor::{ DefaultDirectRateLimiter, Quota, RateLimiter };
use std::collections::{ HashMap, VecDeque };
use std::num::NonZeroU32;
use std::time::{ Duration, Instant };
use tokio::sync::Mutex;

/// Sliding-window limiter keyed by chat id: at most `max_events` accepted
/// within any `window`.
pub struct ChatRateLimiter {
    max_events: usize,
    window: Duration,
    windows: Mutex<HashMap<i64, VecDeque<Instant>>>,
}

impl ChatRateLimiter {
    pub fn new(max_events: usize, window: Duration) -> Self {
        Self {
            max_events,
            window,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Records an event for `chat_id` and reports whether it is allowed.
    pub async fn check(&self, chat_id: i64) -> bool {
        self.check_at(chat_id, Instant::now()).await
    }

    pub async fn check_at(&self, chat_id: i64, now: Instant) -> bool {
        let mut windows = self.windows.lock().await;
        let events = windows.entry(chat_id).or_default();
        while let Some(oldest) = events.front() {
            if now.saturating_duration_since(*oldest) >= self.window {
                events.pop_front();
            } else {
                break;
            }
        }
        if events.len() >= self.max_events {
            return false;
        }
        events.push_back(now);
        true
    }

    /// Drops chats whose window has fully expired.
    pub async fn prune(&self) {
        self.prune_at(Instant::now()).await;
    }

    async fn prune_at(&self, now: Instant) {
        let window = self.window;
        self.windows.lock().await.retain(|_, events| {
            events.back().map(|last| now.saturating_duration_since(*last) < window).unwrap_or(false)
        });
    }

    pub async fn tracked_chats(&self) -> usize {
        self.windows.lock().await.len()
    }
}

/// Process-wide limiter shedding inbound HTTP load.
pub fn global_limiter(requests_per_second: u32) -> DefaultDirectRateLimiter {
    let per_second = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);
    RateLimiter::direct(Quota::per_second(per_second))
}
