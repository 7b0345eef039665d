use ssz::SszHash as _;
use types::{containers::SignedBlock, state::State};

use crate::{block_processing, error::Error, slot_processing};

/// The complete transition for a signed block.
///
/// Devnet 0 treats all signatures as valid, so the wrapper's signature is
/// never inspected. With `validate_result` the post-state root is checked
/// against the block's commitment.
pub fn state_transition(
    state: &State,
    signed_block: &SignedBlock,
    validate_result: bool,
) -> Result<State, Error> {
    let block = &signed_block.message;

    let state = slot_processing::process_slots(state, block.slot)?;
    let post = block_processing::process_block(&state, block)?;

    if validate_result {
        let computed = post.hash_tree_root();

        if block.state_root != computed {
            return Err(Error::StateRootMismatch {
                in_block: block.state_root,
                computed,
            });
        }
    }

    Ok(post)
}
