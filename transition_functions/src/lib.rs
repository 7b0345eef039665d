pub use crate::{
    block_processing::{process_attestations, process_block, process_block_header},
    error::Error,
    slot_processing::{process_slot, process_slots},
    state_transition::state_transition,
};

mod block_processing;
mod error;
mod slot_processing;
mod state_transition;
