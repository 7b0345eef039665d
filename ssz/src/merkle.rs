use ethereum_types::H256;
use hashing::ZERO_HASHES;

use crate::consts::BYTES_PER_CHUNK;

/// [`merkleize`](https://github.com/ethereum/consensus-specs/blob/4c54bddb6cd144ca8a0a01b7155f43b295c70458/ssz/simple-serialize.md#merkleization)
///
/// The tree width is the next power of two of `max(chunks.len(), limit)`.
/// A `limit` of 0 means the type has a fixed chunk count equal to the number
/// of chunks present. Padding chunks are never materialized: each level is
/// padded with the zero-subtree root of its height.
#[must_use]
pub fn merkleize(chunks: &[H256], limit: usize) -> H256 {
    if chunks.is_empty() {
        if limit > 0 {
            return ZERO_HASHES[depth(next_power_of_two(limit))];
        }

        return H256::zero();
    }

    let mut width = next_power_of_two(chunks.len());

    if limit > 0 && limit >= chunks.len() {
        width = next_power_of_two(limit);
    }

    if width == 1 {
        return chunks[0];
    }

    let mut level = chunks.to_vec();

    for height in 0..depth(width) {
        if level.len() % 2 == 1 {
            level.push(ZERO_HASHES[height]);
        }

        level = level
            .chunks_exact(2)
            .map(|pair| hashing::hash_256_256(pair[0], pair[1]))
            .collect();
    }

    level[0]
}

/// Packs `bytes` into zero-padded 32-byte chunks and Merkleizes them.
///
/// `limit` is in chunks, like the `limit` of [`merkleize`].
#[must_use]
pub fn merkleize_bytes(bytes: impl AsRef<[u8]>, limit: usize) -> H256 {
    let chunks = bytes
        .as_ref()
        .chunks(BYTES_PER_CHUNK)
        .map(|partial_chunk| {
            let mut chunk = H256::zero();
            chunk[..partial_chunk.len()].copy_from_slice(partial_chunk);
            chunk
        })
        .collect::<Vec<_>>();

    merkleize(chunks.as_slice(), limit)
}

/// [`mix_in_length`](https://github.com/ethereum/consensus-specs/blob/4c54bddb6cd144ca8a0a01b7155f43b295c70458/ssz/simple-serialize.md#merkleization)
///
/// The SSZ specification does not state that `length` should be limited to `u64`.
/// Using `usize` simplifies the implementation of this crate.
#[must_use]
pub fn mix_in_length(root: H256, length: usize) -> H256 {
    hashing::hash_256_256(root, hash_of_length(length))
}

#[must_use]
pub fn next_power_of_two(x: usize) -> usize {
    x.max(1).next_power_of_two()
}

fn hash_of_length(length: usize) -> H256 {
    let mut hash = H256::zero();
    hash[..size_of::<usize>()].copy_from_slice(&length.to_le_bytes());
    hash
}

fn depth(width: usize) -> usize {
    width.trailing_zeros() as usize
}
