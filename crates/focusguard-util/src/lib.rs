//! Shared utilities for focusguard
//!
//! This crate provides:
//! - ID types (ClientId, RuleId)
//! - Wall-clock helpers (mock-able `now()`, calendar day keys)
//! - Rate limiting helpers
//! - Default paths for socket, data, config, and rule table files

mod ids;
mod paths;
mod rate_limit;
mod time;

pub use ids::*;
pub use paths::*;
pub use rate_limit::*;
pub use time::*;
