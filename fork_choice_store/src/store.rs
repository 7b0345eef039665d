use anyhow::{ensure, Result};
use helper_functions::predicates;
use im::HashMap;
use itertools::izip;
use ssz::SszHash as _;
use types::{
    config::Config,
    containers::{Block, Checkpoint, SignedVote, Vote},
    primitives::{Slot, H256},
    state::State,
};

use crate::{
    error::Error,
    head::{get_head, get_latest_justified},
};

/// Applies per-slot processing up to a target slot.
pub type ProcessSlotsFn = fn(&State, Slot) -> Result<State>;

/// Applies block processing to a state.
pub type ProcessBlockFn = fn(&State, &Block) -> Result<State>;

/// The block/state DAG with latest-vote bookkeeping and head selection.
#[derive(Clone, Debug)]
pub struct Store {
    config: Config,
    head: H256,
    safe_target: H256,
    latest_justified: Checkpoint,
    latest_finalized: Checkpoint,
    blocks: HashMap<H256, Block>,
    states: HashMap<H256, State>,
    /// Latest vote targets already baked into blocks, indexed by validator.
    latest_known_votes: Vec<Option<Checkpoint>>,
    /// Latest vote targets seen on gossip but not yet baked into blocks.
    latest_new_votes: Vec<Option<Checkpoint>>,
    finished_initial_sync: bool,
    process_slots: ProcessSlotsFn,
    process_block: ProcessBlockFn,
}

impl Store {
    /// Seeds the store with a genesis (or other trusted) state and the
    /// anchor block committing to it. The checkpoints come from the state,
    /// not from the anchor block, to respect the state's own view.
    pub fn new(
        anchor_state: State,
        anchor_block: Block,
        process_slots: ProcessSlotsFn,
        process_block: ProcessBlockFn,
    ) -> Result<Self> {
        let state_root = anchor_state.hash_tree_root();

        ensure!(
            anchor_block.state_root == state_root,
            Error::AnchorStateRootMismatch {
                in_block: anchor_block.state_root,
                computed: state_root,
            },
        );

        let anchor_root = anchor_block.hash_tree_root();
        let num_validators = anchor_state.config.num_validators as usize;

        // An anchor above genesis means the chain ran without us and initial
        // sync has to catch up before this node may produce.
        let finished_initial_sync = anchor_block.slot == 0;

        Ok(Self {
            config: anchor_state.config,
            head: anchor_root,
            safe_target: anchor_root,
            latest_justified: anchor_state.latest_justified,
            latest_finalized: anchor_state.latest_finalized,
            blocks: HashMap::unit(anchor_root, anchor_block),
            states: HashMap::unit(anchor_root, anchor_state),
            latest_known_votes: vec![None; num_validators],
            latest_new_votes: vec![None; num_validators],
            finished_initial_sync,
            process_slots,
            process_block,
        })
    }

    #[must_use]
    pub const fn config(&self) -> Config {
        self.config
    }

    #[must_use]
    pub const fn head(&self) -> H256 {
        self.head
    }

    #[must_use]
    pub const fn safe_target(&self) -> H256 {
        self.safe_target
    }

    #[must_use]
    pub const fn latest_justified(&self) -> Checkpoint {
        self.latest_justified
    }

    #[must_use]
    pub const fn latest_finalized(&self) -> Checkpoint {
        self.latest_finalized
    }

    #[must_use]
    pub fn contains_block(&self, root: H256) -> bool {
        self.blocks.contains_key(&root)
    }

    #[must_use]
    pub fn block(&self, root: H256) -> Option<&Block> {
        self.blocks.get(&root)
    }

    #[must_use]
    pub fn state(&self, root: H256) -> Option<&State> {
        self.states.get(&root)
    }

    #[must_use]
    pub fn latest_known_votes(&self) -> &[Option<Checkpoint>] {
        &self.latest_known_votes
    }

    #[must_use]
    pub const fn finished_initial_sync(&self) -> bool {
        self.finished_initial_sync
    }

    pub fn set_finished_initial_sync(&mut self, finished: bool) {
        self.finished_initial_sync = finished;
    }

    /// Ingests a block: derives the post-state through the injected
    /// transition, validates the block's state root commitment, absorbs the
    /// attestations it carries, and recomputes head and safe target.
    ///
    /// Transition failures bubble verbatim; the store is never left
    /// half-updated.
    pub fn process_block(&mut self, block: Block) -> Result<()> {
        let root = block.hash_tree_root();

        if self.blocks.contains_key(&root) {
            return Ok(());
        }

        let parent_state = self
            .states
            .get(&block.parent_root)
            .ok_or(Error::ParentNotFound {
                parent_root: block.parent_root,
            })?;

        let state = (self.process_slots)(parent_state, block.slot)?;
        let state = (self.process_block)(&state, &block)?;

        let computed = state.hash_tree_root();

        ensure!(
            block.state_root == computed,
            Error::InvalidStateRoot {
                in_block: block.state_root,
                computed,
            },
        );

        for signed_vote in &block.body.attestations {
            absorb(&mut self.latest_known_votes, signed_vote.data);
        }

        self.blocks.insert(root, block);
        self.states.insert(root, state);

        self.update_head();

        Ok(())
    }

    /// Installs a locally produced block along with its already-computed
    /// post-state. The parent must still be present; production released the
    /// lock between snapshotting and installation.
    pub fn insert_produced_block(&mut self, block: Block, post_state: State) -> Result<()> {
        ensure!(
            self.blocks.contains_key(&block.parent_root),
            Error::ParentNotFound {
                parent_root: block.parent_root,
            },
        );

        let root = block.hash_tree_root();

        self.blocks.insert(root, block);
        self.states.insert(root, post_state);

        self.update_head();

        Ok(())
    }

    /// Validates and absorbs a gossip vote into the new-vote array.
    /// Absorbed votes do not affect the head until [`Self::accept_new_votes`].
    pub fn on_gossip_vote(&mut self, signed_vote: &SignedVote, current_slot: Slot) -> Result<()> {
        let vote = signed_vote.data;

        ensure!(
            vote.slot <= current_slot,
            Error::FutureVote {
                vote: vote.slot,
                current: current_slot,
            },
        );

        let source = self
            .blocks
            .get(&vote.source.root)
            .ok_or(Error::SourceNotFound {
                root: vote.source.root,
            })?;

        ensure!(
            source.slot == vote.source.slot,
            Error::SlotMismatch {
                claimed: vote.source.slot,
                actual: source.slot,
            },
        );

        let target = self
            .blocks
            .get(&vote.target.root)
            .ok_or(Error::TargetNotFound {
                root: vote.target.root,
            })?;

        ensure!(
            target.slot == vote.target.slot,
            Error::SlotMismatch {
                claimed: vote.target.slot,
                actual: target.slot,
            },
        );

        absorb(&mut self.latest_new_votes, vote);

        Ok(())
    }

    /// Folds gossip-observed votes into the known-vote array and recomputes
    /// head and safe target. Called at slot boundaries.
    ///
    /// The safe target is computed before draining: it measures the support
    /// observed since the previous boundary.
    pub fn accept_new_votes(&mut self) {
        self.update_safe_target();

        for (known, new) in izip!(&mut self.latest_known_votes, &mut self.latest_new_votes) {
            if let Some(checkpoint) = new.take() {
                if newer(known.as_ref(), checkpoint) {
                    *known = Some(checkpoint);
                }
            }
        }

        self.update_head();
    }

    /// The checkpoint a validator should vote for: the first block at or
    /// below the safe target, walked further back until its slot is
    /// justifiable after the finalized slot.
    #[must_use]
    pub fn vote_target(&self) -> Checkpoint {
        let safe_target_slot = self
            .blocks
            .get(&self.safe_target)
            .map_or(0, |block| block.slot);

        let mut root = self.head;
        let mut block = self
            .blocks
            .get(&root)
            .expect("the head is always present in the block map");

        while block.slot > safe_target_slot {
            root = block.parent_root;
            block = self
                .blocks
                .get(&root)
                .expect("ancestors of the head down to the anchor are present");
        }

        while !predicates::is_justifiable_slot(self.latest_finalized.slot, block.slot) {
            root = block.parent_root;
            block = self
                .blocks
                .get(&root)
                .expect("ancestors of the head down to the anchor are present");
        }

        Checkpoint {
            root,
            slot: block.slot,
        }
    }

    /// Adopts the best justified checkpoint visible in any known state, then
    /// recomputes the head from the known votes. Checkpoints are only
    /// adopted when their block is present in the store.
    fn update_head(&mut self) {
        if let Some(latest) = get_latest_justified(&self.states) {
            if self.blocks.contains_key(&latest.root) {
                self.latest_justified = latest;
            }
        }

        self.head = get_head(
            &self.blocks,
            self.latest_justified.root,
            &self.latest_known_votes,
            0,
        );

        if let Some(state) = self.states.get(&self.head) {
            if self.blocks.contains_key(&state.latest_finalized.root) {
                self.latest_finalized = state.latest_finalized;
            }
        }
    }

    fn update_safe_target(&mut self) {
        let min_score = (self.config.num_validators * 2).div_ceil(3);

        self.safe_target = get_head(
            &self.blocks,
            self.latest_justified.root,
            &self.latest_new_votes,
            min_score,
        );
    }
}

/// Later votes win; ties keep the existing entry so that every replica
/// resolves them identically.
fn absorb(votes: &mut [Option<Checkpoint>], vote: Vote) {
    let Some(entry) = votes.get_mut(vote.validator_id as usize) else {
        return;
    };

    if newer(entry.as_ref(), vote.target) {
        *entry = Some(vote.target);
    }
}

fn newer(existing: Option<&Checkpoint>, candidate: Checkpoint) -> bool {
    existing.is_none_or(|existing| candidate.slot > existing.slot)
}

#[cfg(test)]
mod tests {
    use types::containers::BlockBody;

    use super::*;

    fn process_slots_handle(state: &State, slot: Slot) -> Result<State> {
        transition_functions::process_slots(state, slot).map_err(Into::into)
    }

    fn process_block_handle(state: &State, block: &Block) -> Result<State> {
        transition_functions::process_block(state, block).map_err(Into::into)
    }

    fn store_at_genesis() -> Store {
        let state = genesis::generate_genesis(1_700_000_000, 8);
        let anchor = genesis::genesis_anchor(&state);

        Store::new(state, anchor, process_slots_handle, process_block_handle)
            .expect("the anchor commits to the genesis state")
    }

    fn build_block(store: &Store, parent_root: H256, slot: Slot, body: BlockBody) -> Block {
        let parent_state = store.state(parent_root).expect("parent state is present");
        let state = transition_functions::process_slots(parent_state, slot)
            .expect("slot is after the parent's");

        let mut block = Block {
            slot,
            proposer_index: slot % store.config().num_validators,
            parent_root: state.latest_block_header.hash_tree_root(),
            state_root: H256::zero(),
            body,
        };

        let post =
            transition_functions::process_block(&state, &block).expect("the block is valid");
        block.state_root = post.hash_tree_root();

        block
    }

    /// An attestation every precondition drops, for forcing distinct block
    /// roots with identical post-states.
    fn ignored_attestation() -> SignedVote {
        SignedVote {
            data: Vote {
                validator_id: 0,
                slot: 0,
                head: Checkpoint::default(),
                target: Checkpoint::default(),
                source: Checkpoint::default(),
            },
            signature: H256::zero(),
        }
    }

    fn gossip_vote(validator_id: u64, target: Checkpoint, source: Checkpoint) -> SignedVote {
        SignedVote {
            data: Vote {
                validator_id,
                slot: target.slot,
                head: target,
                target,
                source,
            },
            signature: H256::zero(),
        }
    }

    #[test]
    fn construction_seeds_head_and_safe_target_with_the_anchor() {
        let store = store_at_genesis();
        let anchor_root = store.head();

        assert_eq!(store.safe_target(), anchor_root);
        assert!(store.contains_block(anchor_root));
        assert_eq!(store.latest_justified(), Checkpoint::default());
        assert_eq!(store.latest_finalized(), Checkpoint::default());
        assert!(store.finished_initial_sync());
    }

    #[test]
    fn construction_rejects_an_anchor_with_a_foreign_state_root() {
        let state = genesis::generate_genesis(1_700_000_000, 8);
        let mut anchor = genesis::genesis_anchor(&state);
        anchor.state_root = H256::repeat_byte(0xee);

        let result = Store::new(state, anchor, process_slots_handle, process_block_handle);

        assert!(matches!(
            result
                .expect_err("the state root does not match")
                .downcast_ref::<Error>(),
            Some(Error::AnchorStateRootMismatch { .. }),
        ));
    }

    #[test]
    fn ingesting_a_block_moves_the_head_to_it() {
        let mut store = store_at_genesis();
        let anchor_root = store.head();
        let block = build_block(&store, anchor_root, 1, BlockBody::default());
        let root = block.hash_tree_root();

        store.process_block(block).expect("the block is valid");

        assert_eq!(store.head(), root);
        assert!(store.contains_block(root));
        assert!(store.state(root).is_some());
    }

    #[test]
    fn ingesting_a_known_block_is_a_no_op() {
        let mut store = store_at_genesis();
        let block = build_block(&store, store.head(), 1, BlockBody::default());

        store.process_block(block.clone()).expect("the block is valid");
        store.process_block(block).expect("duplicates succeed silently");
    }

    #[test]
    fn a_block_with_an_unknown_parent_is_rejected() {
        let mut store = store_at_genesis();

        let block = Block {
            slot: 1,
            proposer_index: 1,
            parent_root: H256::repeat_byte(0xee),
            state_root: H256::zero(),
            body: BlockBody::default(),
        };

        assert!(matches!(
            store
                .process_block(block)
                .expect_err("the parent is unknown")
                .downcast_ref::<Error>(),
            Some(Error::ParentNotFound { .. }),
        ));
    }

    #[test]
    fn a_block_with_a_wrong_state_root_commitment_is_rejected() {
        let mut store = store_at_genesis();
        let mut block = build_block(&store, store.head(), 1, BlockBody::default());
        block.state_root = H256::repeat_byte(0xee);

        assert!(matches!(
            store
                .process_block(block)
                .expect_err("the state root does not match")
                .downcast_ref::<Error>(),
            Some(Error::InvalidStateRoot { .. }),
        ));
    }

    #[test]
    fn an_unvoted_fork_is_resolved_towards_the_greater_root() {
        let mut store = store_at_genesis();
        let anchor_root = store.head();

        let block_a = build_block(&store, anchor_root, 1, BlockBody::default());
        let block_b = build_block(
            &store,
            anchor_root,
            1,
            BlockBody {
                attestations: vec![ignored_attestation()],
            },
        );

        let root_a = block_a.hash_tree_root();
        let root_b = block_b.hash_tree_root();
        assert_ne!(root_a, root_b);

        store.process_block(block_a).expect("fork A is valid");
        store.process_block(block_b).expect("fork B is valid");

        assert_eq!(store.head(), root_a.max(root_b));
    }

    #[test]
    fn votes_outweigh_the_root_tiebreak() {
        let mut store = store_at_genesis();
        let anchor_root = store.head();
        let anchor_slot_checkpoint = Checkpoint {
            root: anchor_root,
            slot: 0,
        };

        let block_a = build_block(&store, anchor_root, 1, BlockBody::default());
        let block_b = build_block(
            &store,
            anchor_root,
            1,
            BlockBody {
                attestations: vec![ignored_attestation()],
            },
        );

        let root_a = block_a.hash_tree_root();
        let root_b = block_b.hash_tree_root();
        let smaller = root_a.min(root_b);

        store.process_block(block_a).expect("fork A is valid");
        store.process_block(block_b).expect("fork B is valid");
        assert_ne!(store.head(), smaller);

        let target = Checkpoint {
            root: smaller,
            slot: 1,
        };

        store
            .on_gossip_vote(&gossip_vote(0, target, anchor_slot_checkpoint), 1)
            .expect("the vote names known blocks");
        store.accept_new_votes();

        assert_eq!(store.head(), smaller);
    }

    #[test]
    fn the_safe_target_needs_a_two_thirds_supermajority() {
        let mut store = store_at_genesis();
        let anchor_root = store.head();
        let source = Checkpoint {
            root: anchor_root,
            slot: 0,
        };

        let block = build_block(&store, anchor_root, 1, BlockBody::default());
        let root = block.hash_tree_root();
        store.process_block(block).expect("the block is valid");

        let target = Checkpoint { root, slot: 1 };

        // Five votes out of eight fall short of ⌈2·8/3⌉ = 6.
        for validator_id in 0..5 {
            store
                .on_gossip_vote(&gossip_vote(validator_id, target, source), 1)
                .expect("the vote names known blocks");
        }

        store.accept_new_votes();
        assert_eq!(store.safe_target(), store.latest_justified().root);

        for validator_id in 0..6 {
            store
                .on_gossip_vote(&gossip_vote(validator_id, target, source), 1)
                .expect("the vote names known blocks");
        }

        store.accept_new_votes();
        assert_eq!(store.safe_target(), root);
    }

    #[test]
    fn gossip_votes_from_the_future_are_rejected() {
        let mut store = store_at_genesis();
        let anchor_root = store.head();
        let checkpoint = Checkpoint {
            root: anchor_root,
            slot: 0,
        };

        let mut vote = gossip_vote(0, checkpoint, checkpoint);
        vote.data.slot = 5;

        assert!(matches!(
            store
                .on_gossip_vote(&vote, 1)
                .expect_err("slot 5 is ahead of slot 1")
                .downcast_ref::<Error>(),
            Some(Error::FutureVote { vote: 5, current: 1 }),
        ));
    }

    #[test]
    fn gossip_votes_naming_unknown_blocks_are_rejected() {
        let mut store = store_at_genesis();
        let anchor_root = store.head();
        let known = Checkpoint {
            root: anchor_root,
            slot: 0,
        };
        let unknown = Checkpoint {
            root: H256::repeat_byte(0xee),
            slot: 0,
        };

        assert!(matches!(
            store
                .on_gossip_vote(&gossip_vote(0, unknown, known), 1)
                .expect_err("the target is unknown")
                .downcast_ref::<Error>(),
            Some(Error::TargetNotFound { .. }),
        ));

        assert!(matches!(
            store
                .on_gossip_vote(&gossip_vote(0, known, unknown), 1)
                .expect_err("the source is unknown")
                .downcast_ref::<Error>(),
            Some(Error::SourceNotFound { .. }),
        ));
    }

    #[test]
    fn gossip_votes_with_lying_checkpoint_slots_are_rejected() {
        let mut store = store_at_genesis();
        let anchor_root = store.head();
        let correct = Checkpoint {
            root: anchor_root,
            slot: 0,
        };
        let lying = Checkpoint {
            root: anchor_root,
            slot: 3,
        };

        let mut vote = gossip_vote(0, lying, correct);
        vote.data.slot = 3;

        assert!(matches!(
            store
                .on_gossip_vote(&vote, 3)
                .expect_err("the claimed slot does not match the block")
                .downcast_ref::<Error>(),
            Some(Error::SlotMismatch {
                claimed: 3,
                actual: 0,
            }),
        ));
    }

    #[test]
    fn later_votes_win_and_ties_keep_the_existing_entry() {
        let mut store = store_at_genesis();
        let anchor_root = store.head();
        let source = Checkpoint {
            root: anchor_root,
            slot: 0,
        };

        let block_a = build_block(&store, anchor_root, 1, BlockBody::default());
        let block_b = build_block(
            &store,
            anchor_root,
            1,
            BlockBody {
                attestations: vec![ignored_attestation()],
            },
        );

        let root_a = block_a.hash_tree_root();
        let root_b = block_b.hash_tree_root();

        store.process_block(block_a).expect("fork A is valid");
        store.process_block(block_b).expect("fork B is valid");

        let target_a = Checkpoint {
            root: root_a,
            slot: 1,
        };
        let target_b = Checkpoint {
            root: root_b,
            slot: 1,
        };

        store
            .on_gossip_vote(&gossip_vote(0, target_a, source), 1)
            .expect("the vote names known blocks");
        store
            .on_gossip_vote(&gossip_vote(0, target_b, source), 1)
            .expect("the vote names known blocks");
        store.accept_new_votes();

        // The tie at slot 1 kept the first vote.
        assert_eq!(store.head(), root_a);

        // A strictly later vote replaces it.
        let block_c = build_block(&store, root_b, 2, BlockBody::default());
        let root_c = block_c.hash_tree_root();
        store.process_block(block_c).expect("the block is valid");

        let target_c = Checkpoint {
            root: root_c,
            slot: 2,
        };

        store
            .on_gossip_vote(&gossip_vote(0, target_c, source), 2)
            .expect("the vote names known blocks");
        store.accept_new_votes();

        assert_eq!(store.head(), root_c);
    }

    #[test]
    fn the_vote_target_walks_back_to_a_justifiable_slot() {
        let mut store = store_at_genesis();
        let anchor_root = store.head();

        // A chain with no votes keeps the safe target at the anchor,
        // so the vote target walks all the way back.
        let block_1 = build_block(&store, anchor_root, 1, BlockBody::default());
        let root_1 = block_1.hash_tree_root();
        store.process_block(block_1).expect("the block is valid");

        let target = store.vote_target();

        assert_eq!(
            target,
            Checkpoint {
                root: anchor_root,
                slot: 0,
            },
        );

        // With the whole committee behind block 1 the safe target advances
        // and so does the vote target.
        let source = Checkpoint {
            root: anchor_root,
            slot: 0,
        };
        let checkpoint_1 = Checkpoint {
            root: root_1,
            slot: 1,
        };

        for validator_id in 0..8 {
            store
                .on_gossip_vote(&gossip_vote(validator_id, checkpoint_1, source), 1)
                .expect("the vote names known blocks");
        }

        store.accept_new_votes();

        assert_eq!(store.vote_target(), checkpoint_1);
    }
}
