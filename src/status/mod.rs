// src/status/mod.rs

//! Run status persistence.
//!
//! - [`record`] defines the per-node [`RunStatus`] and the nested
//!   [`ChainStatus`] reported for a whole run.
//! - [`store`] is the persistence seam ([`StatusStore`]) and its
//!   file-backed implementation.
//! - [`report`] rebuilds a [`ChainStatus`] from stored records.
//! - [`clock`] supplies timestamps.

pub mod clock;
pub mod record;
pub mod report;
pub mod store;

pub use clock::{Clock, SystemClock};
pub use record::{ChainStatus, RunStatus};
pub use report::collect_status;
pub use store::{log_file, status_file, FsStatusStore, StatusStore};
