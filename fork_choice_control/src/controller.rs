use anyhow::{ensure, Result};
use clock::{SlotClock, Tick};
use fork_choice_store::{ProcessBlockFn, ProcessSlotsFn, Store};
use log::{debug, warn};
use parking_lot::RwLock;
use thiserror::Error;
use types::{
    containers::{Block, Checkpoint, SignedBlock, SignedVote, Status, Vote},
    primitives::{Slot, ValidatorIndex, H256},
    state::State,
};

#[derive(Clone, Copy, PartialEq, Eq, Debug, Error)]
pub enum Error {
    #[error("sync in progress")]
    SyncInProgress,
}

/// Owns the fork choice store behind a read-write lock and drives it with
/// ticks and network objects.
///
/// Reads take the shared lock. Ingestion, vote absorption, and head
/// recomputation take the exclusive lock. Block production holds the
/// exclusive lock only to snapshot inputs and to install the result; the
/// transition itself runs unlocked, which is safe because it is
/// deterministic and the parent is re-checked at installation.
pub struct Controller {
    clock: SlotClock,
    store: RwLock<Store>,
}

impl Controller {
    pub fn new(
        anchor_state: State,
        anchor_block: Block,
        process_slots: ProcessSlotsFn,
        process_block: ProcessBlockFn,
    ) -> Result<Self> {
        let clock = SlotClock::new(anchor_state.config.genesis_time);
        let store = Store::new(anchor_state, anchor_block, process_slots, process_block)?;

        Ok(Self {
            clock,
            store: RwLock::new(store),
        })
    }

    #[must_use]
    pub const fn clock(&self) -> SlotClock {
        self.clock
    }

    /// The canonical head as a checkpoint.
    #[must_use]
    pub fn head(&self) -> Checkpoint {
        let store = self.store.read();
        let root = store.head();
        let slot = store
            .block(root)
            .expect("the head block is always present")
            .slot;

        Checkpoint { root, slot }
    }

    #[must_use]
    pub fn latest_justified(&self) -> Checkpoint {
        self.store.read().latest_justified()
    }

    #[must_use]
    pub fn latest_finalized(&self) -> Checkpoint {
        self.store.read().latest_finalized()
    }

    #[must_use]
    pub fn contains_block(&self, root: H256) -> bool {
        self.store.read().contains_block(root)
    }

    #[must_use]
    pub fn block_by_root(&self, root: H256) -> Option<Block> {
        self.store.read().block(root).cloned()
    }

    #[must_use]
    pub fn status(&self) -> Status {
        let store = self.store.read();
        let root = store.head();
        let slot = store
            .block(root)
            .expect("the head block is always present")
            .slot;

        Status {
            finalized: store.latest_finalized(),
            head: Checkpoint { root, slot },
        }
    }

    /// Marks initial sync as finished (or not), gating the produce paths.
    pub fn set_synced(&self, synced: bool) {
        self.store.write().set_finished_initial_sync(synced);
    }

    /// Ingests a block received from gossip, req/resp, or local production
    /// on another node.
    pub fn on_block(&self, signed_block: &SignedBlock) -> Result<()> {
        let slot = signed_block.message.slot;
        let result = self.store.write().process_block(signed_block.message.clone());

        match &result {
            Ok(()) => debug!("processed block at slot {slot}"),
            Err(error) => warn!("failed to process block at slot {slot}: {error}"),
        }

        result
    }

    /// Absorbs a gossip vote. The vote affects fork choice at the next tick.
    pub fn on_gossip_vote(&self, signed_vote: &SignedVote) -> Result<()> {
        let current_slot = self.clock.current_slot()?;
        self.store.write().on_gossip_vote(signed_vote, current_slot)
    }

    /// Drives the store across a slot boundary.
    pub fn on_tick(&self, tick: Tick) {
        debug!("slot {} started", tick.slot);
        self.store.write().accept_new_votes();
    }

    /// Produces, installs, and returns a block for the given slot.
    pub fn produce_block(&self, slot: Slot, validator_index: ValidatorIndex) -> Result<Block> {
        let (parent_root, head_state, attestations) = {
            let mut store = self.store.write();

            ensure!(store.finished_initial_sync(), Error::SyncInProgress);

            validator::validate_proposer(slot, validator_index, store.config().num_validators)?;

            store.accept_new_votes();

            let parent_root = store.head();
            let head_state = store
                .state(parent_root)
                .expect("the head state is always present")
                .clone();

            let attestations = validator::collect_attestations(
                store.latest_known_votes(),
                |root| store.contains_block(root),
                head_state.latest_justified,
            );

            (parent_root, head_state, attestations)
        };

        let (block, post_state) =
            validator::build_block(slot, validator_index, parent_root, &head_state, attestations)?;

        self.store
            .write()
            .insert_produced_block(block.clone(), post_state)?;

        debug!("produced block at slot {slot}");

        Ok(block)
    }

    /// Produces an attestation vote for the given slot.
    pub fn produce_attestation_vote(
        &self,
        slot: Slot,
        validator_index: ValidatorIndex,
    ) -> Result<Vote> {
        let (head, target, source) = {
            let mut store = self.store.write();

            ensure!(store.finished_initial_sync(), Error::SyncInProgress);

            store.accept_new_votes();

            let head_root = store.head();
            let head_slot = store
                .block(head_root)
                .expect("the head block is always present")
                .slot;

            let head = Checkpoint {
                root: head_root,
                slot: head_slot,
            };

            (head, store.vote_target(), store.latest_justified())
        };

        Ok(validator::build_vote(
            slot,
            validator_index,
            head,
            target,
            source,
        ))
    }
}
