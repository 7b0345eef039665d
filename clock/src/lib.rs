//! A slot timer for the lean chain.
//!
//! Implemented with [`tokio::time::Interval`], which may produce items late
//! but does not let delays accumulate. Devnet 0 schedules all duties on slot
//! boundaries, so the stream yields one [`Tick`] per slot start.

use core::time::Duration;
use std::time::{Instant, SystemTime};

use anyhow::Result;
use futures::stream::{Stream, StreamExt as _};
use thiserror::Error;
use tokio_stream::wrappers::IntervalStream;
use types::{
    consts::{GENESIS_SLOT, SECONDS_PER_SLOT},
    primitives::{Slot, UnixSeconds},
};

/// The start of a slot.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct Tick {
    pub slot: Slot,
}

#[derive(Debug, Error)]
pub enum ClockError {
    #[error("time of next tick overflowed")]
    NextInstantOverflow,
}

#[must_use]
pub const fn slot_to_time(slot: Slot, genesis_time: UnixSeconds) -> UnixSeconds {
    genesis_time + slot * SECONDS_PER_SLOT
}

/// Times before genesis count as slot 0.
#[must_use]
pub const fn time_to_slot(time: UnixSeconds, genesis_time: UnixSeconds) -> Slot {
    if time < genesis_time {
        return 0;
    }

    (time - genesis_time) / SECONDS_PER_SLOT
}

/// A wall-clock view of the chain's slot schedule.
#[derive(Clone, Copy, Debug)]
pub struct SlotClock {
    genesis_time: UnixSeconds,
}

impl SlotClock {
    #[must_use]
    pub const fn new(genesis_time: UnixSeconds) -> Self {
        Self { genesis_time }
    }

    #[must_use]
    pub const fn genesis_time(self) -> UnixSeconds {
        self.genesis_time
    }

    pub fn current_slot(self) -> Result<Slot> {
        let now = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)?
            .as_secs();

        Ok(time_to_slot(now, self.genesis_time))
    }
}

/// A stream of slot-start ticks, beginning with the next slot boundary.
/// Before genesis the first tick is slot 0 at genesis time.
pub fn ticks(genesis_time: UnixSeconds) -> Result<impl Stream<Item = Tick>> {
    // We assume the `Instant` and `SystemTime` obtained here correspond to
    // the same point in time. The error is negligible compared to clock
    // differences between nodes.
    let now_instant = Instant::now();
    let now_system_time = SystemTime::now();

    let unix_epoch_to_now = now_system_time.duration_since(SystemTime::UNIX_EPOCH)?;
    let unix_epoch_to_genesis = Duration::from_secs(genesis_time);
    let slot_duration = Duration::from_secs(SECONDS_PER_SLOT);

    let (mut next_slot, now_to_next_tick) = if unix_epoch_to_now <= unix_epoch_to_genesis {
        (GENESIS_SLOT, unix_epoch_to_genesis - unix_epoch_to_now)
    } else {
        let genesis_to_now = unix_epoch_to_now - unix_epoch_to_genesis;
        let slots_since_genesis = genesis_to_now.as_secs() / SECONDS_PER_SLOT;
        let genesis_to_current_slot =
            Duration::from_secs(slots_since_genesis * SECONDS_PER_SLOT);

        if genesis_to_now == genesis_to_current_slot {
            (slots_since_genesis, Duration::ZERO)
        } else {
            let next_slot = slots_since_genesis + 1;
            let genesis_to_next_slot = Duration::from_secs(next_slot * SECONDS_PER_SLOT);
            (next_slot, genesis_to_next_slot - genesis_to_now)
        }
    };

    let next_instant = now_instant
        .checked_add(now_to_next_tick)
        .ok_or(ClockError::NextInstantOverflow)?;

    let interval = tokio::time::interval_at(next_instant.into(), slot_duration);

    Ok(IntervalStream::new(interval).map(move |_| {
        let tick = Tick { slot: next_slot };
        next_slot += 1;
        tick
    }))
}
