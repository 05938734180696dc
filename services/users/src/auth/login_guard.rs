//! Failed-attempt lockout for Basic credentials
//!
//! Every verification first reserves a slot with [`LoginGuard::begin_attempt`].
//! Failures plus in-flight attempts never exceed `max_failed_attempts`, so a
//! burst of concurrent guesses cannot verify more passwords than the limit.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tracing::warn;

/// Lockout configuration
#[derive(Debug, Clone)]
pub struct LoginGuardConfig {
    /// Failures tolerated inside the window; 0 disables the guard
    pub max_failed_attempts: u32,
    /// Window over which failures are counted
    pub failure_window: Duration,
    /// How long a username stays locked
    pub lockout: Duration,
}

impl Default for LoginGuardConfig {
    fn default() -> Self {
        Self {
            max_failed_attempts: 5,
            failure_window: Duration::from_secs(300), // 5 minutes
            lockout: Duration::from_secs(900),        // 15 minutes
        }
    }
}

#[derive(Debug)]
struct AttemptEntry {
    failures: u32,
    pending: u32,
    first_failure: Instant,
    locked_until: Option<Instant>,
}

impl AttemptEntry {
    fn new(now: Instant) -> Self {
        Self {
            failures: 0,
            pending: 0,
            first_failure: now,
            locked_until: None,
        }
    }

    /// Forget failures whose window or lockout has run out
    fn expire(&mut self, now: Instant, config: &LoginGuardConfig) {
        let expired = match self.locked_until {
            Some(until) => now >= until,
            None => {
                self.failures > 0
                    && now.duration_since(self.first_failure) >= config.failure_window
            }
        };

        if expired {
            self.failures = 0;
            self.first_failure = now;
            self.locked_until = None;
        }
    }

    fn is_idle(&self) -> bool {
        self.failures == 0 && self.pending == 0 && self.locked_until.is_none()
    }
}

#[derive(Debug, Clone, Copy)]
enum Outcome {
    Succeeded,
    Failed,
    Abandoned,
}

/// Tracks failed verifications per username
#[derive(Debug, Clone)]
pub struct LoginGuard {
    config: LoginGuardConfig,
    entries: Arc<Mutex<HashMap<String, AttemptEntry>>>,
}

impl LoginGuard {
    /// Create a new login guard
    pub fn new(config: LoginGuardConfig) -> Self {
        Self {
            config,
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// A guard that never locks anyone out
    pub fn disabled() -> Self {
        Self::new(LoginGuardConfig {
            max_failed_attempts: 0,
            ..LoginGuardConfig::default()
        })
    }

    fn enabled(&self) -> bool {
        self.config.max_failed_attempts > 0
    }

    // The map is never left half-updated, so a poisoned lock is still usable.
    fn entries(&self) -> MutexGuard<'_, HashMap<String, AttemptEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reserve a verification slot for `username`
    ///
    /// Returns `None` while the username is locked, or while its failures
    /// plus in-flight attempts already reach the limit. The attempt is
    /// settled with [`LoginAttempt::succeeded`] or [`LoginAttempt::failed`];
    /// dropping it releases the slot without counting a failure.
    pub fn begin_attempt(&self, username: &str) -> Option<LoginAttempt> {
        if !self.enabled() {
            return Some(LoginAttempt {
                guard: None,
                username: String::new(),
            });
        }

        let now = Instant::now();
        let mut entries = self.entries();
        let entry = entries
            .entry(username.to_string())
            .or_insert_with(|| AttemptEntry::new(now));

        entry.expire(now, &self.config);

        if entry.locked_until.is_some()
            || entry.failures + entry.pending >= self.config.max_failed_attempts
        {
            return None;
        }

        entry.pending += 1;

        Some(LoginAttempt {
            guard: Some(self.clone()),
            username: username.to_string(),
        })
    }

    fn settle(&self, username: &str, outcome: Outcome) {
        let now = Instant::now();
        let mut entries = self.entries();

        let Some(entry) = entries.get_mut(username) else {
            return;
        };

        entry.pending = entry.pending.saturating_sub(1);
        entry.expire(now, &self.config);

        match outcome {
            // An active lockout outlives a success that was already in flight
            Outcome::Succeeded => entry.failures = 0,
            Outcome::Failed => {
                if entry.failures == 0 {
                    entry.first_failure = now;
                }
                entry.failures += 1;

                if entry.failures >= self.config.max_failed_attempts
                    && entry.locked_until.is_none()
                {
                    entry.locked_until = Some(now + self.config.lockout);
                    warn!(
                        "Locked username {} for {} seconds after {} failed attempts",
                        username,
                        self.config.lockout.as_secs(),
                        entry.failures
                    );
                }
            }
            Outcome::Abandoned => {}
        }

        if entry.is_idle() {
            entries.remove(username);
        }
    }

    /// Usernames with recorded state
    #[cfg(test)]
    pub(crate) fn tracked(&self) -> usize {
        self.entries().len()
    }
}

/// A reserved verification slot
#[derive(Debug)]
#[must_use = "an unsettled attempt is released without counting a failure"]
pub struct LoginAttempt {
    guard: Option<LoginGuard>,
    username: String,
}

impl LoginAttempt {
    /// The password matched; clears the failure count
    pub fn succeeded(mut self) {
        self.settle(Outcome::Succeeded);
    }

    /// The password did not match; locks the username once the limit is hit
    pub fn failed(mut self) {
        self.settle(Outcome::Failed);
    }

    fn settle(&mut self, outcome: Outcome) {
        if let Some(guard) = self.guard.take() {
            guard.settle(&self.username, outcome);
        }
    }
}

impl Drop for LoginAttempt {
    fn drop(&mut self) {
        self.settle(Outcome::Abandoned);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guard(max_failed_attempts: u32, lockout: Duration) -> LoginGuard {
        LoginGuard::new(LoginGuardConfig {
            max_failed_attempts,
            failure_window: Duration::from_secs(60),
            lockout,
        })
    }

    fn fail(guard: &LoginGuard, username: &str) {
        guard
            .begin_attempt(username)
            .expect("slot available")
            .failed();
    }

    #[test]
    fn test_locks_after_max_failures() {
        let guard = guard(3, Duration::from_secs(60));

        fail(&guard, "admin");
        fail(&guard, "admin");
        assert!(guard.begin_attempt("admin").is_some());

        fail(&guard, "admin");
        assert!(guard.begin_attempt("admin").is_none());
        assert!(guard.begin_attempt("user").is_some());
    }

    #[test]
    fn test_in_flight_attempts_count_against_the_limit() {
        let guard = guard(2, Duration::from_secs(60));

        let first = guard.begin_attempt("admin").unwrap();
        let second = guard.begin_attempt("admin").unwrap();
        assert!(guard.begin_attempt("admin").is_none());

        first.failed();
        assert!(guard.begin_attempt("admin").is_none());

        second.failed();
        assert!(guard.begin_attempt("admin").is_none());
        assert_eq!(guard.tracked(), 1);
    }

    #[test]
    fn test_success_resets_failures() {
        let guard = guard(2, Duration::from_secs(60));

        fail(&guard, "admin");
        guard.begin_attempt("admin").unwrap().succeeded();
        fail(&guard, "admin");

        assert!(guard.begin_attempt("admin").is_some());
    }

    #[test]
    fn test_dropped_attempt_releases_its_slot() {
        let guard = guard(1, Duration::from_secs(60));

        let attempt = guard.begin_attempt("admin").unwrap();
        assert!(guard.begin_attempt("admin").is_none());
        drop(attempt);

        assert_eq!(guard.tracked(), 0);
        assert!(guard.begin_attempt("admin").is_some());
    }

    #[tokio::test]
    async fn test_lockout_expires() {
        let guard = guard(1, Duration::from_millis(20));

        fail(&guard, "admin");
        assert!(guard.begin_attempt("admin").is_none());

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(guard.begin_attempt("admin").is_some());
    }

    #[test]
    fn test_disabled_guard_never_locks() {
        let guard = LoginGuard::disabled();

        for _ in 0..20 {
            fail(&guard, "admin");
        }

        assert!(guard.begin_attempt("admin").is_some());
        assert_eq!(guard.tracked(), 0);
    }
}
