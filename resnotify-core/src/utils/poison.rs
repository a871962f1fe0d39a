use std::collections::HashMap;
use tracing::warn;

/// Upper bound on the number of keys tracked at once.
const MAX_TRACKED_KEYS: usize = 10_000;

/// Outcome of recording a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureVerdict {
    /// Below the threshold; the message should be requeued.
    Retry { attempts: u32 },
    /// Threshold reached; the message should be dead-lettered.
    Exhausted { attempts: u32 },
}

/// Counts failed processing attempts per dedup key.
///
/// Counts live in process memory only and restart from zero after a restart.
#[derive(Debug)]
pub struct PoisonTracker {
    max_attempts: u32,
    attempts: HashMap<String, u32>,
}

impl PoisonTracker {
    /// `max_attempts == 0` disables the threshold entirely.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            attempts: HashMap::new(),
        }
    }

    pub fn record_failure(&mut self, key: &str) -> FailureVerdict {
        if self.max_attempts == 0 {
            return FailureVerdict::Retry { attempts: 0 };
        }

        if !self.attempts.contains_key(key) && self.attempts.len() >= MAX_TRACKED_KEYS {
            warn!(
                tracked = self.attempts.len(),
                "Poison tracker full, resetting attempt counters"
            );
            self.attempts.clear();
        }

        let count = self.attempts.entry(key.to_owned()).or_insert(0);
        *count = count.saturating_add(1);
        let attempts = *count;

        if attempts >= self.max_attempts {
            self.attempts.remove(key);
            FailureVerdict::Exhausted { attempts }
        } else {
            FailureVerdict::Retry { attempts }
        }
    }

    pub fn clear(&mut self, key: &str) {
        self.attempts.remove(key);
    }

    pub fn tracked(&self) -> usize {
        self.attempts.len()
    }
}
