use ssz::BitList;

use crate::{
    config::Config,
    consts::{HISTORICAL_ROOTS_LIMIT, JUSTIFICATION_VALIDATORS_LIMIT},
    containers::{BlockHeader, Checkpoint},
    primitives::{Slot, H256},
};

/// The replicated chain state.
///
/// States are treated as immutable once handed to the fork choice store:
/// every transition clones and returns a fresh value. `Clone` copies the
/// three large sequences outright, which is the observable contract.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct State {
    pub config: Config,
    pub slot: Slot,
    pub latest_block_header: BlockHeader,
    pub latest_justified: Checkpoint,
    pub latest_finalized: Checkpoint,
    /// One entry per slot. Empty slots hold the zero root.
    pub historical_block_hashes: Vec<H256>,
    /// Bit per slot, set iff that slot's block is justified.
    pub justified_slots: BitList,
    /// Target roots with in-flight vote tallies, in lexicographic root order.
    pub justification_roots: Vec<H256>,
    /// Per-root validator bit masks laid out contiguously,
    /// `justification_roots.len() * config.num_validators` bits in total.
    pub justification_validators: BitList,
}

impl State {
    /// A state with empty history and justification containers.
    /// The caller fills in the header; see the genesis crate.
    #[must_use]
    pub fn empty(config: Config, latest_block_header: BlockHeader) -> Self {
        Self {
            config,
            slot: 0,
            latest_block_header,
            latest_justified: Checkpoint::default(),
            latest_finalized: Checkpoint::default(),
            historical_block_hashes: vec![],
            justified_slots: BitList::new(HISTORICAL_ROOTS_LIMIT),
            justification_roots: vec![],
            justification_validators: BitList::new(JUSTIFICATION_VALIDATORS_LIMIT),
        }
    }
}
