use std::collections::BTreeMap;

use ssz::BitVector;
use types::{primitives::H256, state::State};

/// Reconstructs the in-flight justification tallies from their flattened
/// form: one bit mask of `num_validators` bits per pending target root.
///
/// A `BTreeMap` keyed by root keeps the map in lexicographic byte order,
/// which is the order the flattened form is required to use.
#[must_use]
pub fn pending_justifications(state: &State) -> BTreeMap<H256, BitVector> {
    let num_validators = state.config.num_validators as usize;

    state
        .justification_roots
        .iter()
        .enumerate()
        .map(|(index, root)| {
            let start = index * num_validators;
            let mut mask = BitVector::new(num_validators);

            for validator in 0..num_validators {
                mask.set(validator, state.justification_validators.get(start + validator));
            }

            (*root, mask)
        })
        .collect()
}
