//! Core moderation logic.
//!
//! This module contains:
//! - [`state`] - The censorship model (specific, mass, immune)
//! - [`store`] - Snapshot persistence for the model
//! - [`purge`] - History scanning and batch deletion
//! - [`duration`] - Packed time-span parsing (`3d4h`)

pub mod duration;
pub mod purge;
pub mod state;
pub mod store;

pub use duration::{parse_timedelta, span_before};
pub use purge::{DEFAULT_SCAN_CAP, PurgeReport, PurgeRequest, StopReason, purge};
pub use state::CensorshipState;
pub use store::{JsonStateStore, MemoryStateStore, StateStore};
