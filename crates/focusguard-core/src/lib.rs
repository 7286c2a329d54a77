//! Session lifecycle and rule reconciliation engine for focusguardd
//!
//! This crate is the heart of focusguardd, containing:
//! - Pattern normalization and rule compilation
//! - Block set aggregation (flat blocklist plus active groups)
//! - The rule synchronizer that owns the dynamic rule table
//! - Session state machine (Idle -> Active -> Idle) with hard-mode phrases
//! - Daily focus statistics
//! - A change reactor that resynchronizes on relevant storage writes

mod blocklist;
mod engine;
mod error;
mod events;
mod groups;
mod pattern;
mod reactor;
mod rules;
mod seed;
mod session;
mod state;
mod stats;
mod sync;

pub use blocklist::*;
pub use engine::*;
pub use error::*;
pub use events::*;
pub use groups::*;
pub use pattern::*;
pub use reactor::*;
pub use rules::*;
pub use seed::*;
pub use session::*;
pub use state::*;
pub use stats::*;
pub use sync::*;
