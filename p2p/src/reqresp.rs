//! Request/response protocols over the fork choice store.

use std::sync::Arc;

use fork_choice_control::Controller;
use thiserror::Error;
use types::{
    consts::MAX_REQUEST_BLOCKS,
    containers::{BlocksByRootRequest, SignedBlock, Status},
    primitives::H256,
};

pub const STATUS_PROTOCOL_V1: &str = "/leanconsensus/req/status/1/";
pub const BLOCKS_BY_ROOT_PROTOCOL_V1: &str = "/leanconsensus/req/blocks_by_root/1/";

#[derive(Clone, Copy, PartialEq, Eq, Debug, Error)]
pub enum ReqRespError {
    /// The transport turns this into a disconnect-and-ban decision.
    #[error("invalid peer status")]
    InvalidStatus,
}

/// Handles request/response protocol messages against a read snapshot of the
/// store.
pub struct Handler {
    controller: Arc<Controller>,
}

impl Handler {
    #[must_use]
    pub const fn new(controller: Arc<Controller>) -> Self {
        Self { controller }
    }

    /// Our side of the status exchange.
    #[must_use]
    pub fn status(&self) -> Status {
        self.controller.status()
    }

    /// Returns the requested blocks that are locally available, preserving
    /// request order and skipping unknown roots silently. At most
    /// [`MAX_REQUEST_BLOCKS`] blocks are returned.
    #[must_use]
    pub fn blocks_by_root(&self, request: &BlocksByRootRequest) -> Vec<SignedBlock> {
        request
            .roots
            .iter()
            .filter_map(|root| self.controller.block_by_root(*root))
            .take(MAX_REQUEST_BLOCKS)
            .map(|block| SignedBlock {
                message: block,
                signature: H256::zero(),
            })
            .collect()
    }

    /// A peer is on a different chain iff it claims a non-genesis finalized
    /// checkpoint whose root we hold locally under a different slot.
    pub fn validate_peer_status(&self, peer_status: &Status) -> Result<(), ReqRespError> {
        if peer_status.finalized.slot > 0 {
            if let Some(block) = self.controller.block_by_root(peer_status.finalized.root) {
                if block.slot != peer_status.finalized.slot {
                    return Err(ReqRespError::InvalidStatus);
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use ssz::SszHash as _;
    use types::{
        containers::{Block, Checkpoint},
        primitives::Slot,
        state::State,
    };

    use super::*;

    fn process_slots_handle(state: &State, slot: Slot) -> Result<State> {
        transition_functions::process_slots(state, slot).map_err(Into::into)
    }

    fn process_block_handle(state: &State, block: &Block) -> Result<State> {
        transition_functions::process_block(state, block).map_err(Into::into)
    }

    fn handler_at_genesis() -> (Handler, Arc<Controller>) {
        let state = genesis::generate_genesis(1_700_000_000, 8);
        let anchor = genesis::genesis_anchor(&state);

        let controller = Arc::new(
            Controller::new(state, anchor, process_slots_handle, process_block_handle)
                .expect("the anchor commits to the genesis state"),
        );

        (Handler::new(Arc::clone(&controller)), controller)
    }

    #[test]
    fn the_status_reflects_the_store() {
        let (handler, controller) = handler_at_genesis();

        assert_eq!(handler.status().head, controller.head());
        assert_eq!(handler.status().finalized, Checkpoint::default());
    }

    #[test]
    fn blocks_by_root_preserves_request_order_and_skips_unknowns() {
        let (handler, controller) = handler_at_genesis();

        let block_1 = controller
            .produce_block(1, 1)
            .expect("validator 1 proposes at slot 1");
        let block_2 = controller
            .produce_block(2, 2)
            .expect("validator 2 proposes at slot 2");

        let root_1 = block_1.hash_tree_root();
        let root_2 = block_2.hash_tree_root();

        let request = BlocksByRootRequest {
            roots: vec![root_2, H256::repeat_byte(0xee), root_1],
        };

        let response = handler.blocks_by_root(&request);

        assert_eq!(response.len(), 2);
        assert_eq!(response[0].message, block_2);
        assert_eq!(response[1].message, block_1);
        assert!(response.iter().all(|block| block.signature.is_zero()));
    }

    #[test]
    fn peers_claiming_a_mismatched_finalized_slot_are_invalid() {
        let (handler, controller) = handler_at_genesis();

        let block = controller
            .produce_block(1, 1)
            .expect("validator 1 proposes at slot 1");
        let root = block.hash_tree_root();

        // A finalized checkpoint we cannot resolve is fine.
        let unknown = Status {
            finalized: Checkpoint {
                root: H256::repeat_byte(0xee),
                slot: 7,
            },
            head: Checkpoint::default(),
        };
        assert_eq!(handler.validate_peer_status(&unknown), Ok(()));

        // Genesis checkpoints are always fine.
        assert_eq!(handler.validate_peer_status(&Status::default()), Ok(()));

        // A known root under the wrong slot is not.
        let lying = Status {
            finalized: Checkpoint { root, slot: 2 },
            head: Checkpoint::default(),
        };
        assert_eq!(
            handler.validate_peer_status(&lying),
            Err(ReqRespError::InvalidStatus),
        );

        // The same root under the right slot is.
        let honest = Status {
            finalized: Checkpoint { root, slot: 1 },
            head: Checkpoint::default(),
        };
        assert_eq!(handler.validate_peer_status(&honest), Ok(()));
    }
}
