use std::collections::BTreeMap;

use ssz::{BitList, BitVector};
use types::{consts::JUSTIFICATION_VALIDATORS_LIMIT, primitives::H256, state::State};

/// Flattens the in-flight justification tallies back into the state.
///
/// Roots are laid out in lexicographic byte order (the `BTreeMap` iteration
/// order) so that every replica computes the same state root. The bit
/// container is padded to a whole byte, matching its serialized granularity.
pub fn set_pending_justifications(state: &mut State, pending: &BTreeMap<H256, BitVector>) {
    let num_validators = state.config.num_validators as usize;

    let mut validators = BitList::new(JUSTIFICATION_VALIDATORS_LIMIT);

    for (index, mask) in pending.values().enumerate() {
        let start = index * num_validators;

        for validator in 0..num_validators {
            if mask.get(validator) {
                validators.set_extending(start + validator, true);
            }
        }
    }

    let padded_bits = (pending.len() * num_validators).div_ceil(ssz::BITS_PER_BYTE)
        * ssz::BITS_PER_BYTE;

    if padded_bits > 0 {
        validators.set_extending(padded_bits - 1, validators.get(padded_bits - 1));
    }

    state.justification_roots = pending.keys().copied().collect();
    state.justification_validators = validators;
}
