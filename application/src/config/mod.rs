//! Application-level configuration.
//!
//! This module provides configuration types that control how use cases behave:
//!
//! - [`DispatchParams`]: failover, backoff and timeout control for dispatch
//! - [`AssistantParams`]: conversation and presentation behavior

pub mod assistant_params;
pub mod dispatch_params;

pub use assistant_params::AssistantParams;
pub use dispatch_params::DispatchParams;
