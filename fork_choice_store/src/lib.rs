//! The fork choice store for the lean chain.
//!
//! The store itself is a plain data structure with no locking and no clock.
//! Everything time- or concurrency-related lives in `fork_choice_control`,
//! which owns a store behind a lock and feeds it ticks and network objects.
//!
//! The state transition is injected as two function handles at construction
//! so that this crate never depends on the transition module directly.

pub use crate::{
    error::Error,
    head::{get_head, get_latest_justified},
    store::{ProcessBlockFn, ProcessSlotsFn, Store},
};

mod error;
mod head;
mod store;
