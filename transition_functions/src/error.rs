use thiserror::Error;
use types::primitives::{Slot, ValidatorIndex, H256};

#[derive(Clone, Copy, PartialEq, Eq, Debug, Error)]
pub enum Error {
    #[error("target slot {target} is not after current slot {current}")]
    TargetSlotNotAfterCurrent { current: Slot, target: Slot },
    #[error("block slot {block} does not match state slot {state}")]
    SlotMismatch { state: Slot, block: Slot },
    #[error("block slot {block} is not after the latest header slot {latest}")]
    StaleBlock { latest: Slot, block: Slot },
    #[error("wrong proposer {actual} for slot {slot}, expected {expected}")]
    WrongProposer {
        slot: Slot,
        expected: ValidatorIndex,
        actual: ValidatorIndex,
    },
    #[error("parent root mismatch (in block: {in_block:?}, computed: {computed:?})")]
    BadParent { in_block: H256, computed: H256 },
    #[error("state root mismatch (in block: {in_block:?}, computed: {computed:?})")]
    StateRootMismatch { in_block: H256, computed: H256 },
}
