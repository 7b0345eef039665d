//! Block and vote production for the lean chain.
//!
//! Functions in this crate are pure: they take inputs, produce outputs, and
//! manage no locks or shared state. The caller (the fork choice control
//! layer) is responsible for snapshotting the correct inputs and installing
//! the results.

use ssz::SszHash as _;
use thiserror::Error;
use types::{
    containers::{Block, BlockBody, Checkpoint, SignedVote, Vote},
    primitives::{Slot, ValidatorIndex, H256},
    state::State,
};

#[derive(Clone, Copy, PartialEq, Eq, Debug, Error)]
#[error("validator {validator_index} is not the proposer for slot {slot} (expected {expected})")]
pub struct NotTheProposer {
    pub slot: Slot,
    pub validator_index: ValidatorIndex,
    pub expected: ValidatorIndex,
}

/// Checks whether the given validator is the proposer for the slot.
pub fn validate_proposer(
    slot: Slot,
    validator_index: ValidatorIndex,
    num_validators: u64,
) -> Result<(), NotTheProposer> {
    let expected = helper_functions::misc::proposer_index(slot, num_validators);

    if validator_index != expected {
        return Err(NotTheProposer {
            slot,
            validator_index,
            expected,
        });
    }

    Ok(())
}

/// Gathers the known votes into attestations for block inclusion.
///
/// Votes without a known block are left out; the proposer can only vouch for
/// checkpoints it can resolve. Every surviving vote is lifted into a
/// [`SignedVote`] sourced at the head state's justified checkpoint.
pub fn collect_attestations(
    known_votes: &[Option<Checkpoint>],
    block_exists: impl Fn(H256) -> bool,
    latest_justified: Checkpoint,
) -> Vec<SignedVote> {
    known_votes
        .iter()
        .enumerate()
        .filter_map(|(validator_id, checkpoint)| {
            let checkpoint = (*checkpoint)?;

            if checkpoint.root.is_zero() || !block_exists(checkpoint.root) {
                return None;
            }

            Some(SignedVote {
                data: Vote {
                    validator_id: validator_id as ValidatorIndex,
                    slot: checkpoint.slot,
                    head: checkpoint,
                    target: checkpoint,
                    source: latest_justified,
                },
                signature: H256::zero(),
            })
        })
        .collect()
}

/// Assembles a block at `slot` on top of `head_state`, runs it through the
/// transition, and backfills the state root commitment from the post-state.
/// Returns the finished block together with its post-state.
pub fn build_block(
    slot: Slot,
    validator_index: ValidatorIndex,
    parent_root: H256,
    head_state: &State,
    attestations: Vec<SignedVote>,
) -> Result<(Block, State), transition_functions::Error> {
    let state = transition_functions::process_slots(head_state, slot)?;

    let mut block = Block {
        slot,
        proposer_index: validator_index,
        parent_root,
        state_root: H256::zero(),
        body: BlockBody { attestations },
    };

    let post_state = transition_functions::process_block(&state, &block)?;
    block.state_root = post_state.hash_tree_root();

    Ok((block, post_state))
}

/// An attestation vote for the given slot and validator.
#[must_use]
pub const fn build_vote(
    slot: Slot,
    validator_index: ValidatorIndex,
    head: Checkpoint,
    target: Checkpoint,
    source: Checkpoint,
) -> Vote {
    Vote {
        validator_id: validator_index,
        slot,
        head,
        target,
        source,
    }
}
