use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Default window length for the run-submission gate.
pub const RATE_LIMIT_WINDOW: Duration = Duration::from_secs(60);
/// Default number of admitted requests per window per session.
pub const RATE_LIMIT_MAX_REQUESTS: u32 = 5;

struct RateLimitEntry {
    count: u32,
    reset_at: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub remaining: u32,
}

/// Sliding-window request gate keyed by session id. The map is the one
/// piece of state shared across concurrent callers, so the read-modify-write
/// of a session's counter is serialized behind a single lock.
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    entries: Mutex<HashMap<String, RateLimitEntry>>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RATE_LIMIT_MAX_REQUESTS, RATE_LIMIT_WINDOW)
    }
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn check(&self, session_id: &str) -> RateLimitDecision {
        self.check_at(session_id, Instant::now())
    }

    /// Expired windows are swept on every check, so the map never holds
    /// entries past their reset time.
    pub fn check_at(&self, session_id: &str, now: Instant) -> RateLimitDecision {
        let mut entries = self.entries.lock();
        entries.retain(|_, entry| entry.reset_at > now);

        match entries.get_mut(session_id) {
            None => {
                entries.insert(
                    session_id.to_string(),
                    RateLimitEntry {
                        count: 1,
                        reset_at: now + self.window,
                    },
                );
                RateLimitDecision {
                    allowed: true,
                    remaining: self.max_requests - 1,
                }
            }
            Some(entry) if entry.count >= self.max_requests => RateLimitDecision {
                allowed: false,
                remaining: 0,
            },
            Some(entry) => {
                entry.count += 1;
                RateLimitDecision {
                    allowed: true,
                    remaining: self.max_requests - entry.count,
                }
            }
        }
    }
}
