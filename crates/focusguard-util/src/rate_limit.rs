//! Per-client request budgets for the IPC surface

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::ClientId;

/// Fixed-window request limiter keyed by client.
///
/// Each client may issue `max_requests` requests per `window`; the budget
/// resets in full once the window has elapsed.
#[derive(Debug)]
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    clients: HashMap<ClientId, Budget>,
}

#[derive(Debug)]
struct Budget {
    remaining: u32,
    window_start: Instant,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            clients: HashMap::new(),
        }
    }

    /// Record a request from `client_id`.
    ///
    /// Returns `true` if the request fits in the client's budget.
    pub fn check(&mut self, client_id: &ClientId) -> bool {
        self.check_at(client_id, Instant::now())
    }

    fn check_at(&mut self, client_id: &ClientId, now: Instant) -> bool {
        let max = self.max_requests;
        let budget = self.clients.entry(client_id.clone()).or_insert(Budget {
            remaining: max,
            window_start: now,
        });

        if now.duration_since(budget.window_start) >= self.window {
            budget.remaining = max;
            budget.window_start = now;
        }

        if budget.remaining == 0 {
            return false;
        }
        budget.remaining -= 1;
        true
    }

    /// Forget a client (called on disconnect)
    pub fn remove_client(&mut self, client_id: &ClientId) {
        self.clients.remove(client_id);
    }

    /// Number of clients currently tracked
    pub fn tracked_clients(&self) -> usize {
        self.clients.len()
    }
}
