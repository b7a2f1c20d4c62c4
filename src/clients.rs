//! Clients for the external systems `propagate` drives.
//!
//! - [`git`]: the git CLI, run as a subprocess against the target working tree

pub mod git;
