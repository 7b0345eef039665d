use thiserror::Error;
use types::primitives::{Slot, H256};

#[derive(Clone, Copy, PartialEq, Eq, Debug, Error)]
pub enum Error {
    #[error("block parent not found (parent root: {parent_root:?})")]
    ParentNotFound { parent_root: H256 },
    #[error("block state root mismatch (in block: {in_block:?}, computed: {computed:?})")]
    InvalidStateRoot { in_block: H256, computed: H256 },
    #[error("anchor block does not commit to the anchor state (in block: {in_block:?}, computed: {computed:?})")]
    AnchorStateRootMismatch { in_block: H256, computed: H256 },
    #[error("vote names an unknown source block (root: {root:?})")]
    SourceNotFound { root: H256 },
    #[error("vote names an unknown target block (root: {root:?})")]
    TargetNotFound { root: H256 },
    #[error("vote checkpoint slot {claimed} does not match block slot {actual}")]
    SlotMismatch { claimed: Slot, actual: Slot },
    #[error("vote slot {vote} is ahead of the current slot {current}")]
    FutureVote { vote: Slot, current: Slot },
}
