use helper_functions::{accessors, misc, mutators, predicates};
use ssz::{BitVector, SszHash as _};
use types::{
    containers::{Block, BlockHeader, SignedVote},
    primitives::H256,
    state::State,
};

use crate::error::Error;

pub fn process_block_header(state: &State, block: &Block) -> Result<State, Error> {
    if block.slot != state.slot {
        return Err(Error::SlotMismatch {
            state: state.slot,
            block: block.slot,
        });
    }

    if block.slot <= state.latest_block_header.slot {
        return Err(Error::StaleBlock {
            latest: state.latest_block_header.slot,
            block: block.slot,
        });
    }

    let expected = misc::proposer_index(block.slot, state.config.num_validators);

    if block.proposer_index != expected {
        return Err(Error::WrongProposer {
            slot: block.slot,
            expected,
            actual: block.proposer_index,
        });
    }

    let computed = state.latest_block_header.hash_tree_root();

    if block.parent_root != computed {
        return Err(Error::BadParent {
            in_block: block.parent_root,
            computed,
        });
    }

    let mut post = state.clone();
    let parent_slot = state.latest_block_header.slot;

    // The first block after genesis anchors both checkpoints to genesis.
    // Only the roots are set; the slots stay 0.
    if parent_slot == 0 {
        post.latest_justified.root = block.parent_root;
        post.latest_finalized.root = block.parent_root;
    }

    post.historical_block_hashes.push(block.parent_root);
    post.justified_slots
        .set_extending(parent_slot as usize, parent_slot == 0);

    // Empty slots between the parent and this block get zero roots.
    for empty_slot in parent_slot + 1..block.slot {
        post.historical_block_hashes.push(H256::zero());
        post.justified_slots.set_extending(empty_slot as usize, false);
    }

    // The state root stays zero until the next slot boundary.
    post.latest_block_header = BlockHeader {
        slot: block.slot,
        proposer_index: block.proposer_index,
        parent_root: block.parent_root,
        state_root: H256::zero(),
        body_root: block.body.hash_tree_root(),
    };

    Ok(post)
}

/// Applies attestation votes under the 2/3-supermajority rule.
///
/// Votes that fail any precondition are dropped silently: a malformed
/// attestation inside an otherwise valid block must not invalidate the block.
#[must_use]
pub fn process_attestations(state: &State, attestations: &[SignedVote]) -> State {
    let mut post = state.clone();
    let num_validators = post.config.num_validators;
    let mut pending = accessors::pending_justifications(&post);

    for signed_vote in attestations {
        let vote = signed_vote.data;

        if vote.source.slot >= vote.target.slot {
            continue;
        }

        let source_slot = vote.source.slot as usize;
        let target_slot = vote.target.slot as usize;

        if !post.justified_slots.get(source_slot) {
            continue;
        }

        if post.justified_slots.get(target_slot) {
            continue;
        }

        if post.historical_block_hashes.get(source_slot) != Some(&vote.source.root) {
            continue;
        }

        if post.historical_block_hashes.get(target_slot) != Some(&vote.target.root) {
            continue;
        }

        if !predicates::is_justifiable_slot(post.latest_finalized.slot, vote.target.slot) {
            continue;
        }

        if vote.validator_id >= num_validators {
            continue;
        }

        let mask = pending
            .entry(vote.target.root)
            .or_insert_with(|| BitVector::new(num_validators as usize));

        mask.set(vote.validator_id as usize, true);

        let count = mask.count_ones() as u64;

        if 3 * count >= 2 * num_validators {
            post.latest_justified = vote.target;
            post.justified_slots.set_extending(target_slot, true);
            pending.remove(&vote.target.root);

            // Finalize the source unless a slot strictly between source and
            // target could still be justified.
            let can_finalize = (vote.source.slot + 1..vote.target.slot)
                .all(|slot| !predicates::is_justifiable_slot(post.latest_finalized.slot, slot));

            if can_finalize {
                post.latest_finalized = vote.source;
            }
        }
    }

    mutators::set_pending_justifications(&mut post, &pending);

    post
}

pub fn process_block(state: &State, block: &Block) -> Result<State, Error> {
    let post = process_block_header(state, block)?;
    Ok(process_attestations(&post, &block.body.attestations))
}

#[cfg(test)]
mod tests {
    use types::{
        config::Config,
        containers::{BlockBody, Checkpoint, Vote},
    };

    use crate::slot_processing::process_slots;

    use super::*;

    fn genesis_state() -> State {
        let config = Config {
            num_validators: 8,
            genesis_time: 1_700_000_000,
        };

        let header = BlockHeader {
            body_root: BlockBody::default().hash_tree_root(),
            ..BlockHeader::default()
        };

        State::empty(config, header)
    }

    fn block_at(state_at_slot: &State, attestations: Vec<SignedVote>) -> Block {
        Block {
            slot: state_at_slot.slot,
            proposer_index: state_at_slot.slot % 8,
            parent_root: state_at_slot.latest_block_header.hash_tree_root(),
            state_root: H256::zero(),
            body: BlockBody { attestations },
        }
    }

    #[test]
    fn the_first_block_anchors_genesis_as_justified_and_finalized() {
        let genesis = genesis_state();
        let advanced = process_slots(&genesis, 1).expect("1 is after slot 0");
        let block = block_at(&advanced, vec![]);

        let post = process_block(&advanced, &block).expect("block is valid");

        assert_eq!(post.historical_block_hashes, vec![block.parent_root]);
        assert!(post.justified_slots.get(0));
        assert_eq!(post.justified_slots.len(), 1);
        assert_eq!(post.latest_justified.root, block.parent_root);
        assert_eq!(post.latest_finalized.root, block.parent_root);
        assert_eq!(post.latest_justified.slot, 0);
    }

    #[test]
    fn a_block_with_the_wrong_proposer_is_rejected() {
        let genesis = genesis_state();
        let advanced = process_slots(&genesis, 1).expect("1 is after slot 0");

        let block = Block {
            proposer_index: 2,
            ..block_at(&advanced, vec![])
        };

        assert_eq!(
            process_block(&advanced, &block),
            Err(Error::WrongProposer {
                slot: 1,
                expected: 1,
                actual: 2,
            }),
        );
    }

    #[test]
    fn a_block_with_the_wrong_parent_is_rejected() {
        let genesis = genesis_state();
        let advanced = process_slots(&genesis, 1).expect("1 is after slot 0");

        let block = Block {
            parent_root: H256::repeat_byte(0xee),
            ..block_at(&advanced, vec![])
        };

        assert!(matches!(
            process_block(&advanced, &block),
            Err(Error::BadParent { .. }),
        ));
    }

    #[test]
    fn empty_slots_are_backfilled_with_zero_roots() {
        let genesis = genesis_state();
        let advanced = process_slots(&genesis, 3).expect("3 is after slot 0");
        let block = block_at(&advanced, vec![]);

        let post = process_block(&advanced, &block).expect("block is valid");

        assert_eq!(
            post.historical_block_hashes,
            vec![block.parent_root, H256::zero(), H256::zero()],
        );
        assert_eq!(post.justified_slots.len(), 3);
        assert!(post.justified_slots.get(0));
        assert!(!post.justified_slots.get(1));
        assert!(!post.justified_slots.get(2));
    }

    #[test]
    fn a_supermajority_justifies_and_finalizes() {
        // Slot 1 gets a block, slot 2 gets a block whose attestations carry
        // six of eight validators voting genesis -> block 1.
        let genesis = genesis_state();
        let at_slot_1 = process_slots(&genesis, 1).expect("1 is after slot 0");
        let block_1 = block_at(&at_slot_1, vec![]);
        let after_block_1 = process_block(&at_slot_1, &block_1).expect("block 1 is valid");

        let at_slot_2 = process_slots(&after_block_1, 2).expect("2 is after slot 1");
        let block_2 = block_at(&at_slot_2, vec![]);
        let headered = process_block_header(&at_slot_2, &block_2).expect("block 2 is valid");

        let source = Checkpoint {
            root: headered.historical_block_hashes[0],
            slot: 0,
        };
        let target = Checkpoint {
            root: headered.historical_block_hashes[1],
            slot: 1,
        };

        let votes = (0..6)
            .map(|validator_id| SignedVote {
                data: Vote {
                    validator_id,
                    slot: 1,
                    head: target,
                    target,
                    source,
                },
                signature: H256::zero(),
            })
            .collect::<Vec<_>>();

        let post = process_attestations(&headered, &votes);

        assert_eq!(post.latest_justified, target);
        assert!(post.justified_slots.get(1));
        assert_eq!(post.latest_finalized, source);
        assert!(post.justification_roots.is_empty());
    }

    #[test]
    fn five_votes_out_of_eight_stay_pending() {
        let genesis = genesis_state();
        let at_slot_1 = process_slots(&genesis, 1).expect("1 is after slot 0");
        let block_1 = block_at(&at_slot_1, vec![]);
        let after_block_1 = process_block(&at_slot_1, &block_1).expect("block 1 is valid");

        let at_slot_2 = process_slots(&after_block_1, 2).expect("2 is after slot 1");
        let block_2 = block_at(&at_slot_2, vec![]);
        let headered = process_block_header(&at_slot_2, &block_2).expect("block 2 is valid");

        let source = Checkpoint {
            root: headered.historical_block_hashes[0],
            slot: 0,
        };
        let target = Checkpoint {
            root: headered.historical_block_hashes[1],
            slot: 1,
        };

        let votes = (0..5)
            .map(|validator_id| SignedVote {
                data: Vote {
                    validator_id,
                    slot: 1,
                    head: target,
                    target,
                    source,
                },
                signature: H256::zero(),
            })
            .collect::<Vec<_>>();

        let post = process_attestations(&headered, &votes);

        assert!(!post.justified_slots.get(1));
        assert_eq!(post.justification_roots, vec![target.root]);
        assert_eq!(post.justification_validators.count_ones(), 5);
    }

    #[test]
    fn a_vote_with_equal_source_and_target_slots_is_dropped() {
        let genesis = genesis_state();
        let at_slot_1 = process_slots(&genesis, 1).expect("1 is after slot 0");
        let block_1 = block_at(&at_slot_1, vec![]);
        let after_block_1 = process_block(&at_slot_1, &block_1).expect("block 1 is valid");

        let checkpoint = Checkpoint {
            root: after_block_1.historical_block_hashes[0],
            slot: 0,
        };

        let vote = SignedVote {
            data: Vote {
                validator_id: 0,
                slot: 0,
                head: checkpoint,
                target: checkpoint,
                source: checkpoint,
            },
            signature: H256::zero(),
        };

        let post = process_attestations(&after_block_1, &[vote]);

        assert_eq!(post, after_block_1);
    }

    #[test]
    fn duplicate_votes_from_one_validator_count_once() {
        let genesis = genesis_state();
        let at_slot_1 = process_slots(&genesis, 1).expect("1 is after slot 0");
        let block_1 = block_at(&at_slot_1, vec![]);
        let after_block_1 = process_block(&at_slot_1, &block_1).expect("block 1 is valid");

        let at_slot_2 = process_slots(&after_block_1, 2).expect("2 is after slot 1");
        let block_2 = block_at(&at_slot_2, vec![]);
        let headered = process_block_header(&at_slot_2, &block_2).expect("block 2 is valid");

        let source = Checkpoint {
            root: headered.historical_block_hashes[0],
            slot: 0,
        };
        let target = Checkpoint {
            root: headered.historical_block_hashes[1],
            slot: 1,
        };

        let vote = SignedVote {
            data: Vote {
                validator_id: 3,
                slot: 1,
                head: target,
                target,
                source,
            },
            signature: H256::zero(),
        };

        let post = process_attestations(&headered, &[vote; 6]);

        assert!(!post.justified_slots.get(1));
        assert_eq!(post.justification_validators.count_ones(), 1);
    }
}
