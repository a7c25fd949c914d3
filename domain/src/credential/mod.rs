//! Credential rotation for the upstream chat provider.
//!
//! A [`CredentialPool`] holds every configured API key together with its
//! health. Keys that fail are parked for a cooldown that depends on the
//! failure class; keys that are rejected as unauthorized are retired for
//! the lifetime of the pool.

pub mod pool;

pub use pool::{
    Credential, CredentialOutcome, CredentialPool, RATE_LIMIT_COOLDOWN, TRANSIENT_COOLDOWN,
};
