use ssz::SszHash as _;
use types::{primitives::Slot, state::State};

use crate::error::Error;

/// Per-slot maintenance: commit the post-state root of the just-applied
/// block into its header, exactly once, at the next slot boundary.
#[must_use]
pub fn process_slot(state: &State) -> State {
    let mut post = state.clone();
    fill_state_root(&mut post);
    post
}

/// Advances the state through empty slots up to `target`.
pub fn process_slots(state: &State, target: Slot) -> Result<State, Error> {
    if state.slot >= target {
        return Err(Error::TargetSlotNotAfterCurrent {
            current: state.slot,
            target,
        });
    }

    let mut post = state.clone();

    while post.slot < target {
        fill_state_root(&mut post);
        post.slot += 1;
    }

    Ok(post)
}

fn fill_state_root(state: &mut State) {
    if state.latest_block_header.state_root.is_zero() {
        // The header still carries a zero state root here,
        // so this hashes the state the previous block committed to.
        state.latest_block_header.state_root = state.hash_tree_root();
    }
}
