//! Local host implementations for focusguardd
//!
//! - [`JsonFileRuleTable`]: the rule table persisted as a JSON file that an
//!   enforcement agent (browser extension, proxy) watches and applies
//! - [`TokioAlarmScheduler`]: named one-shot alarms on tokio timers

mod rule_file;
mod scheduler;

pub use rule_file::*;
pub use scheduler::*;
