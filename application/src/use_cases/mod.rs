//! Use cases (application services)
//!
//! - [`dispatch`]: streams one reply with credential failover
//! - [`chat_session`]: runs a learner-facing conversation on top of it

pub mod chat_session;
pub mod dispatch;

#[cfg(test)]
pub(crate) mod testing;
