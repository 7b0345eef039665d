use im::HashMap;
use types::{
    containers::{Block, Checkpoint},
    primitives::H256,
    state::State,
};

/// The maximum justified checkpoint across all known states, by slot with
/// ties broken by the lexicographically greater root. The caller is
/// responsible for only adopting checkpoints whose block it holds.
#[must_use]
pub fn get_latest_justified(states: &HashMap<H256, State>) -> Option<Checkpoint> {
    states
        .values()
        .map(|state| state.latest_justified)
        .max_by_key(|checkpoint| (checkpoint.slot, checkpoint.root))
}

/// Latest-vote head selection over the subtree rooted at `justified_root`.
///
/// Each vote credits one unit of weight to the voted block and to every one
/// of its ancestors up to `justified_root`. Descent picks the heaviest child
/// at every level, breaking ties by the greater root interpreted as a
/// big-endian integer, and stops at the first node with no qualifying child.
///
/// `min_score` restricts descent to children with at least that much weight;
/// with no qualifying child at the first level the result falls back to
/// `justified_root` itself.
#[must_use]
pub fn get_head(
    blocks: &HashMap<H256, Block>,
    justified_root: H256,
    votes: &[Option<Checkpoint>],
    min_score: u64,
) -> H256 {
    let mut weights = HashMap::<H256, u64>::new();

    for checkpoint in votes.iter().flatten() {
        if !blocks.contains_key(&checkpoint.root) {
            continue;
        }

        let mut root = checkpoint.root;

        loop {
            *weights.entry(root).or_default() += 1;

            if root == justified_root {
                break;
            }

            match blocks.get(&root) {
                Some(block) => root = block.parent_root,
                None => break,
            }
        }
    }

    let mut children = HashMap::<H256, Vec<H256>>::new();

    for (root, block) in blocks {
        children.entry(block.parent_root).or_default().push(*root);
    }

    let mut head = justified_root;

    loop {
        let Some(candidates) = children.get(&head) else {
            break head;
        };

        let best = candidates
            .iter()
            .filter(|root| weights.get(*root).copied().unwrap_or_default() >= min_score)
            .max_by_key(|root| (weights.get(*root).copied().unwrap_or_default(), **root));

        match best {
            Some(root) => head = *root,
            None => break head,
        }
    }
}
