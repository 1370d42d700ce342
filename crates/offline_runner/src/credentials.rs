//! Short-term credential acquisition and caching.
//!
//! Credentials are requested with the minimum session duration the provider
//! allows and reused for a fixed window shorter than that duration, so a
//! child process can never observe credentials past their real expiry. The
//! original background-timer invalidation is modeled as an explicit deadline
//! checked on every `get`, against an injected clock, which keeps expiry
//! testable without wall-clock waits.

use chrono::{DateTime, Duration, Utc};
use offline_core::contract::SessionCredentials;
use serde_json::json;

use crate::observe::log_runner_info;

/// Lower bound the provider accepts for a session; the cache never asks for
/// more.
pub const MIN_SESSION_DURATION_SECS: i32 = 900;

/// How long an acquired session is reused. Kept under the requested
/// duration so the margin absorbs clock skew and child-process runtime.
pub const CREDENTIAL_REUSE_WINDOW_SECS: i64 = 850;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Provider seam: acquire short-term credentials for a named profile.
/// Acquisition failures propagate untouched; retry policy belongs to the
/// caller.
pub trait CredentialSource: Send + Sync {
    fn acquire_session(
        &self,
        profile: &str,
        duration_secs: i32,
    ) -> Result<SessionCredentials, String>;
}

struct CachedSession {
    credentials: SessionCredentials,
    reuse_until: DateTime<Utc>,
}

/// One cached credential slot shared by every invocation on the same
/// harness instance.
pub struct CredentialCache {
    source: Box<dyn CredentialSource>,
    clock: Box<dyn Clock>,
    cached: Option<CachedSession>,
}

impl CredentialCache {
    pub fn new(source: Box<dyn CredentialSource>, clock: Box<dyn Clock>) -> Self {
        Self {
            source,
            clock,
            cached: None,
        }
    }

    /// Return the cached credentials while the reuse window is open,
    /// acquiring a fresh session otherwise. Idempotent while valid: at most
    /// one acquisition per expiry window.
    pub fn get(&mut self, profile: &str) -> Result<SessionCredentials, String> {
        let now = self.clock.now();

        if let Some(cached) = &self.cached {
            if now < cached.reuse_until {
                return Ok(cached.credentials.clone());
            }
            self.cached = None;
            log_runner_info("credentials_expired", json!({ "profile": profile }));
        }

        let credentials = self.source.acquire_session(profile, MIN_SESSION_DURATION_SECS)?;
        self.cached = Some(CachedSession {
            credentials: credentials.clone(),
            reuse_until: now + Duration::seconds(CREDENTIAL_REUSE_WINDOW_SECS),
        });
        log_runner_info(
            "credentials_acquired",
            json!({
                "profile": profile,
                "reuse_window_secs": CREDENTIAL_REUSE_WINDOW_SECS,
            }),
        );

        Ok(credentials)
    }

    /// Drop the cached session immediately. Safe to call when nothing is
    /// cached.
    pub fn clear(&mut self) {
        self.cached = None;
    }
}
