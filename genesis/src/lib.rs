pub mod quickstart;

use ssz::SszHash as _;
use types::{
    config::Config,
    containers::{Block, BlockBody, BlockHeader},
    primitives::{UnixSeconds, H256},
    state::State,
};

/// The genesis state: slot 0, empty history and justification containers,
/// zero checkpoints, and a header committing to the empty body.
#[must_use]
pub fn generate_genesis(genesis_time: UnixSeconds, num_validators: u64) -> State {
    let config = Config {
        num_validators,
        genesis_time,
    };

    let latest_block_header = BlockHeader {
        slot: 0,
        proposer_index: 0,
        parent_root: H256::zero(),
        state_root: H256::zero(),
        body_root: BlockBody::default().hash_tree_root(),
    };

    State::empty(config, latest_block_header)
}

/// The anchor block the fork choice store is constructed around.
///
/// Its root equals the root of the genesis header once the first
/// `process_slot` has backfilled the header's state root, so the first
/// proposed block's parent lookup lands on the anchor.
#[must_use]
pub fn genesis_anchor(state: &State) -> Block {
    Block {
        slot: 0,
        proposer_index: 0,
        parent_root: H256::zero(),
        state_root: state.hash_tree_root(),
        body: BlockBody::default(),
    }
}
