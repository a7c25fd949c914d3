//! Round-robin credential selection with per-outcome cooldowns.
//!
//! Selection is sticky: the scan starts at the credential that most recently
//! completed a request, so a healthy key keeps serving until it fails.
//!
//! | Outcome        | Effect on the credential           |
//! |----------------|------------------------------------|
//! | `Success`      | becomes the sticky credential      |
//! | `AuthFailure`  | permanently invalid                |
//! | `RateLimited`  | cooldown of [`RATE_LIMIT_COOLDOWN`] |
//! | `ServerError`  | cooldown of [`TRANSIENT_COOLDOWN`]  |
//! | `NetworkError` | cooldown of [`TRANSIENT_COOLDOWN`]  |
//!
//! Every time-dependent method has an `_at` variant that takes the current
//! instant explicitly, which keeps the pool deterministic under test.

use serde::Serialize;
use std::fmt;
use std::time::{Duration, Instant};

/// Cooldown applied after the provider reports a rate limit.
///
/// Provider quotas reset on an hourly window, so the key is parked for a
/// little longer than an hour.
pub const RATE_LIMIT_COOLDOWN: Duration = Duration::from_secs(65 * 60);

/// Cooldown applied after a server-side or network failure.
pub const TRANSIENT_COOLDOWN: Duration = Duration::from_secs(60);

/// Result of using a credential for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialOutcome {
    Success,
    /// HTTP 401/403: the key is not accepted by the provider.
    AuthFailure,
    /// HTTP 429.
    RateLimited,
    /// HTTP 5xx or any other non-success status.
    ServerError,
    /// Connection failure, timeout, or a stream that dropped mid-body.
    NetworkError,
}

impl CredentialOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialOutcome::Success => "success",
            CredentialOutcome::AuthFailure => "auth_failure",
            CredentialOutcome::RateLimited => "rate_limited",
            CredentialOutcome::ServerError => "server_error",
            CredentialOutcome::NetworkError => "network_error",
        }
    }

    /// Cooldown this outcome imposes, if any.
    ///
    /// `AuthFailure` returns `None` because it retires the credential instead.
    pub fn cooldown(&self) -> Option<Duration> {
        match self {
            CredentialOutcome::RateLimited => Some(RATE_LIMIT_COOLDOWN),
            CredentialOutcome::ServerError | CredentialOutcome::NetworkError => {
                Some(TRANSIENT_COOLDOWN)
            }
            CredentialOutcome::Success | CredentialOutcome::AuthFailure => None,
        }
    }
}

impl fmt::Display for CredentialOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One API key and its health.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    key: String,
    cooldown_until: Option<Instant>,
    invalid: bool,
}

impl Credential {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            cooldown_until: None,
            invalid: false,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn cooldown_until(&self) -> Option<Instant> {
        self.cooldown_until
    }

    pub fn is_invalid(&self) -> bool {
        self.invalid
    }

    /// A credential is eligible when it is valid and its cooldown (if any)
    /// has expired.
    pub fn is_eligible_at(&self, now: Instant) -> bool {
        !self.invalid && self.cooldown_until.is_none_or(|until| until <= now)
    }
}

// Keys never reach logs, even through `{:?}`.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("key", &redact(&self.key))
            .field("cooldown_until", &self.cooldown_until)
            .field("invalid", &self.invalid)
            .finish()
    }
}

fn redact(key: &str) -> String {
    let tail: String = key
        .chars()
        .rev()
        .take(4)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    format!("…{tail}")
}

/// Ordered set of credentials with sticky round-robin selection.
///
/// # Examples
///
/// ```
/// use std::time::Instant;
/// use tutor_domain::credential::{CredentialOutcome, CredentialPool};
///
/// let mut pool = CredentialPool::new(["key-a", "key-b"]);
/// let now = Instant::now();
///
/// let first = pool.select_next_at(now).unwrap();
/// pool.report_outcome_at(first, CredentialOutcome::RateLimited, now);
///
/// assert_eq!(pool.select_next_at(now), Some(1));
/// ```
#[derive(Debug, Clone, Default)]
pub struct CredentialPool {
    credentials: Vec<Credential>,
    last_used_index: usize,
}

impl CredentialPool {
    /// Build a pool from raw keys. Blank keys are skipped.
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let credentials = keys
            .into_iter()
            .map(Into::into)
            .map(|key: String| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .map(Credential::new)
            .collect();
        Self {
            credentials,
            last_used_index: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }

    pub fn credentials(&self) -> &[Credential] {
        &self.credentials
    }

    pub fn credential(&self, index: usize) -> Option<&Credential> {
        self.credentials.get(index)
    }

    /// Index of the credential that most recently completed a request.
    pub fn last_used_index(&self) -> usize {
        self.last_used_index
    }

    pub fn select_next(&self) -> Option<usize> {
        self.select_next_at(Instant::now())
    }

    /// Pick the first eligible credential, scanning cyclically from the
    /// sticky index. Returns `None` when every credential is cooling down
    /// or invalid.
    pub fn select_next_at(&self, now: Instant) -> Option<usize> {
        let len = self.credentials.len();
        (0..len)
            .map(|offset| (self.last_used_index + offset) % len)
            .find(|&index| self.credentials[index].is_eligible_at(now))
    }

    pub fn report_outcome(&mut self, index: usize, outcome: CredentialOutcome) {
        self.report_outcome_at(index, outcome, Instant::now());
    }

    /// Record the outcome of a request made with the credential at `index`.
    ///
    /// Unknown indices are ignored; the pool may have been rebuilt while the
    /// request was in flight.
    pub fn report_outcome_at(&mut self, index: usize, outcome: CredentialOutcome, now: Instant) {
        let Some(credential) = self.credentials.get_mut(index) else {
            return;
        };

        match outcome {
            CredentialOutcome::Success => {
                credential.cooldown_until = None;
                self.last_used_index = index;
            }
            CredentialOutcome::AuthFailure => {
                credential.invalid = true;
            }
            CredentialOutcome::RateLimited
            | CredentialOutcome::ServerError
            | CredentialOutcome::NetworkError => {
                credential.cooldown_until = outcome.cooldown().map(|cooldown| now + cooldown);
            }
        }
    }

    /// Number of credentials usable at `now`.
    pub fn eligible_count_at(&self, now: Instant) -> usize {
        self.credentials
            .iter()
            .filter(|credential| credential.is_eligible_at(now))
            .count()
    }

    /// Earliest instant at which a cooling-down credential becomes eligible
    /// again. `None` if nothing is cooling down.
    pub fn next_recovery_at(&self) -> Option<Instant> {
        self.credentials
            .iter()
            .filter(|credential| !credential.invalid)
            .filter_map(|credential| credential.cooldown_until)
            .min()
    }

    /// True when no credential can ever be used again without a rebuild.
    pub fn all_invalid(&self) -> bool {
        self.credentials.iter().all(|credential| credential.invalid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool3() -> CredentialPool {
        CredentialPool::new(["k1", "k2", "k3"])
    }

    // ==================== Construction ====================

    #[test]
    fn test_blank_keys_are_skipped() {
        let pool = CredentialPool::new(["  ", "k1", "", " k2 "]);
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.credentials()[1].key(), "k2");
    }

    #[test]
    fn test_empty_pool_selects_nothing() {
        let pool = CredentialPool::default();
        assert!(pool.is_empty());
        assert_eq!(pool.select_next_at(Instant::now()), None);
    }

    #[test]
    fn test_debug_redacts_key() {
        let credential = Credential::new("sk-secret-value-1234");
        let rendered = format!("{credential:?}");
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("1234"));
    }

    // ==================== Selection ====================

    #[test]
    fn test_fresh_pool_starts_at_first() {
        assert_eq!(pool3().select_next_at(Instant::now()), Some(0));
    }

    #[test]
    fn test_success_makes_selection_sticky() {
        let mut pool = pool3();
        let now = Instant::now();
        pool.report_outcome_at(2, CredentialOutcome::Success, now);
        assert_eq!(pool.last_used_index(), 2);
        assert_eq!(pool.select_next_at(now), Some(2));
    }

    #[test]
    fn test_scan_wraps_around_from_sticky_index() {
        let mut pool = pool3();
        let now = Instant::now();
        pool.report_outcome_at(2, CredentialOutcome::Success, now);
        pool.report_outcome_at(2, CredentialOutcome::ServerError, now);
        assert_eq!(pool.select_next_at(now), Some(0));
    }

    #[test]
    fn test_all_cooling_down_returns_none() {
        let mut pool = pool3();
        let now = Instant::now();
        for index in 0..3 {
            pool.report_outcome_at(index, CredentialOutcome::RateLimited, now);
        }
        assert_eq!(pool.select_next_at(now), None);
        assert_eq!(pool.eligible_count_at(now), 0);
    }

    // ==================== Outcomes ====================

    #[test]
    fn test_rate_limit_cooldown_is_sixty_five_minutes() {
        let mut pool = pool3();
        let now = Instant::now();
        pool.report_outcome_at(0, CredentialOutcome::RateLimited, now);

        let credential = pool.credential(0).unwrap();
        assert_eq!(credential.cooldown_until(), Some(now + RATE_LIMIT_COOLDOWN));
        assert!(!credential.is_eligible_at(now + Duration::from_secs(64 * 60)));
        assert!(credential.is_eligible_at(now + Duration::from_secs(65 * 60)));
    }

    #[test]
    fn test_transient_failures_cool_down_briefly() {
        let mut pool = pool3();
        let now = Instant::now();
        pool.report_outcome_at(0, CredentialOutcome::ServerError, now);
        pool.report_outcome_at(1, CredentialOutcome::NetworkError, now);

        assert_eq!(pool.select_next_at(now), Some(2));
        let later = now + TRANSIENT_COOLDOWN;
        assert_eq!(pool.select_next_at(later), Some(0));
        assert_eq!(pool.next_recovery_at(), Some(later));
    }

    #[test]
    fn test_auth_failure_is_permanent() {
        let mut pool = pool3();
        let now = Instant::now();
        pool.report_outcome_at(0, CredentialOutcome::AuthFailure, now);

        let far_future = now + Duration::from_secs(365 * 24 * 3600);
        assert!(pool.credential(0).unwrap().is_invalid());
        assert_eq!(pool.select_next_at(far_future), Some(1));
        assert_eq!(pool.next_recovery_at(), None);
    }

    #[test]
    fn test_all_invalid_is_detected() {
        let mut pool = CredentialPool::new(["k1", "k2"]);
        let now = Instant::now();
        assert!(!pool.all_invalid());
        pool.report_outcome_at(0, CredentialOutcome::AuthFailure, now);
        pool.report_outcome_at(1, CredentialOutcome::AuthFailure, now);
        assert!(pool.all_invalid());
    }

    #[test]
    fn test_out_of_range_report_is_ignored() {
        let mut pool = pool3();
        pool.report_outcome_at(9, CredentialOutcome::AuthFailure, Instant::now());
        assert!(pool.credentials().iter().all(|c| !c.is_invalid()));
    }

    #[test]
    fn test_failover_scenario_two_rate_limited() {
        let mut pool = pool3();
        let now = Instant::now();

        let first = pool.select_next_at(now).unwrap();
        pool.report_outcome_at(first, CredentialOutcome::RateLimited, now);
        let second = pool.select_next_at(now).unwrap();
        pool.report_outcome_at(second, CredentialOutcome::RateLimited, now);
        let third = pool.select_next_at(now).unwrap();
        pool.report_outcome_at(third, CredentialOutcome::Success, now);

        assert_eq!((first, second, third), (0, 1, 2));
        assert_eq!(pool.last_used_index(), 2);
        assert!(!pool.credential(0).unwrap().is_eligible_at(now));
        assert!(!pool.credential(1).unwrap().is_eligible_at(now));
    }
}
