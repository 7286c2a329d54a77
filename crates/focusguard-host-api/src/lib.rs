//! Host interfaces for focusguardd
//!
//! This crate defines the boundary between the core and the external
//! facilities it drives: the URL-match rule table that enforces blocking and
//! the named one-shot alarm scheduler that ends sessions. It contains no
//! platform code itself; see `focusguard-host-local` for the on-disk and
//! tokio-backed implementations.

mod mock;
mod rules;
mod traits;

pub use mock::*;
pub use rules::*;
pub use traits::*;
