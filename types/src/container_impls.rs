//! Hand-written SSZ impls for the wire containers and the state.
//!
//! Field roots are Merkleized in declaration order with a limit of 0.
//! Variable-size fields use the 4-byte offset convention. Offsets are
//! relative to the start of the enclosing container's serialization.

use ssz::{
    merkleize, mix_in_length, read_offset, read_u64, subslice, write_offset, ReadError, Size,
    SszHash, SszRead, SszSize, SszWrite, WriteError, BYTES_PER_LENGTH_OFFSET,
};

use crate::{
    config::Config,
    consts::{HISTORICAL_ROOTS_LIMIT, MAX_REQUEST_BLOCKS, VALIDATOR_REGISTRY_LIMIT},
    containers::{
        Block, BlockBody, BlockHeader, BlocksByRootRequest, Checkpoint, SignedBlock, SignedVote,
        Status, Vote,
    },
    primitives::{Slot, H256},
};

const ROOT_SIZE: usize = H256::len_bytes();
const SCALAR_SIZE: usize = size_of::<Slot>();
const CHECKPOINT_SIZE: usize = ROOT_SIZE + SCALAR_SIZE;

impl SszSize for Checkpoint {
    const SIZE: Size = Size::Fixed {
        size: CHECKPOINT_SIZE,
    };
}

impl SszRead for Checkpoint {
    fn from_ssz_unchecked(bytes: &[u8]) -> Result<Self, ReadError> {
        let root = H256::from_slice(subslice(bytes, 0, ROOT_SIZE)?);
        let slot = read_u64(bytes, ROOT_SIZE)?;
        Ok(Self { root, slot })
    }
}

impl SszWrite for Checkpoint {
    fn write_fixed(&self, bytes: &mut [u8]) {
        self.root.write_fixed(&mut bytes[..ROOT_SIZE]);
        self.slot.write_fixed(&mut bytes[ROOT_SIZE..]);
    }
}

impl SszHash for Checkpoint {
    fn hash_tree_root(&self) -> H256 {
        merkleize(&[self.root, self.slot.hash_tree_root()], 0)
    }
}

impl SszSize for BlockHeader {
    const SIZE: Size = Size::Fixed {
        size: 2 * SCALAR_SIZE + 3 * ROOT_SIZE,
    };
}

impl SszRead for BlockHeader {
    fn from_ssz_unchecked(bytes: &[u8]) -> Result<Self, ReadError> {
        Ok(Self {
            slot: read_u64(bytes, 0)?,
            proposer_index: read_u64(bytes, SCALAR_SIZE)?,
            parent_root: H256::from_slice(subslice(bytes, 16, 48)?),
            state_root: H256::from_slice(subslice(bytes, 48, 80)?),
            body_root: H256::from_slice(subslice(bytes, 80, 112)?),
        })
    }
}

impl SszWrite for BlockHeader {
    fn write_fixed(&self, bytes: &mut [u8]) {
        self.slot.write_fixed(&mut bytes[..8]);
        self.proposer_index.write_fixed(&mut bytes[8..16]);
        self.parent_root.write_fixed(&mut bytes[16..48]);
        self.state_root.write_fixed(&mut bytes[48..80]);
        self.body_root.write_fixed(&mut bytes[80..112]);
    }
}

impl SszHash for BlockHeader {
    fn hash_tree_root(&self) -> H256 {
        merkleize(
            &[
                self.slot.hash_tree_root(),
                self.proposer_index.hash_tree_root(),
                self.parent_root,
                self.state_root,
                self.body_root,
            ],
            0,
        )
    }
}

impl SszSize for Vote {
    const SIZE: Size = Size::Fixed {
        size: 2 * SCALAR_SIZE + 3 * CHECKPOINT_SIZE,
    };
}

impl SszRead for Vote {
    fn from_ssz_unchecked(bytes: &[u8]) -> Result<Self, ReadError> {
        Ok(Self {
            validator_id: read_u64(bytes, 0)?,
            slot: read_u64(bytes, SCALAR_SIZE)?,
            head: Checkpoint::from_ssz_unchecked(subslice(bytes, 16, 56)?)?,
            target: Checkpoint::from_ssz_unchecked(subslice(bytes, 56, 96)?)?,
            source: Checkpoint::from_ssz_unchecked(subslice(bytes, 96, 136)?)?,
        })
    }
}

impl SszWrite for Vote {
    fn write_fixed(&self, bytes: &mut [u8]) {
        self.validator_id.write_fixed(&mut bytes[..8]);
        self.slot.write_fixed(&mut bytes[8..16]);
        self.head.write_fixed(&mut bytes[16..56]);
        self.target.write_fixed(&mut bytes[56..96]);
        self.source.write_fixed(&mut bytes[96..136]);
    }
}

impl SszHash for Vote {
    fn hash_tree_root(&self) -> H256 {
        merkleize(
            &[
                self.validator_id.hash_tree_root(),
                self.slot.hash_tree_root(),
                self.head.hash_tree_root(),
                self.target.hash_tree_root(),
                self.source.hash_tree_root(),
            ],
            0,
        )
    }
}

impl SszSize for SignedVote {
    const SIZE: Size = Size::Fixed {
        size: 2 * SCALAR_SIZE + 3 * CHECKPOINT_SIZE + ROOT_SIZE,
    };
}

impl SszRead for SignedVote {
    fn from_ssz_unchecked(bytes: &[u8]) -> Result<Self, ReadError> {
        Ok(Self {
            data: Vote::from_ssz_unchecked(subslice(bytes, 0, 136)?)?,
            signature: H256::from_slice(subslice(bytes, 136, 168)?),
        })
    }
}

impl SszWrite for SignedVote {
    fn write_fixed(&self, bytes: &mut [u8]) {
        self.data.write_fixed(&mut bytes[..136]);
        self.signature.write_fixed(&mut bytes[136..168]);
    }
}

impl SszHash for SignedVote {
    fn hash_tree_root(&self) -> H256 {
        merkleize(&[self.data.hash_tree_root(), self.signature], 0)
    }
}

impl SszSize for BlockBody {
    const SIZE: Size = Size::Variable {
        minimum_size: BYTES_PER_LENGTH_OFFSET,
    };
}

impl SszRead for BlockBody {
    fn from_ssz_unchecked(bytes: &[u8]) -> Result<Self, ReadError> {
        let offset = read_offset(bytes, 0)?;
        let data = subslice(bytes, offset, bytes.len())?;
        let attestations = read_fixed_list(data, VALIDATOR_REGISTRY_LIMIT)?;
        Ok(Self { attestations })
    }
}

impl SszWrite for BlockBody {
    fn write_variable(&self, bytes: &mut Vec<u8>) -> Result<(), WriteError> {
        let start = bytes.len();
        bytes.resize(start + BYTES_PER_LENGTH_OFFSET, 0);
        write_offset(bytes, start, BYTES_PER_LENGTH_OFFSET)?;
        write_fixed_list(bytes, &self.attestations);
        Ok(())
    }
}

impl SszHash for BlockBody {
    fn hash_tree_root(&self) -> H256 {
        let attestation_roots = self
            .attestations
            .iter()
            .map(SszHash::hash_tree_root)
            .collect::<Vec<_>>();

        let attestations_root = mix_in_length(
            merkleize(&attestation_roots, VALIDATOR_REGISTRY_LIMIT),
            self.attestations.len(),
        );

        merkleize(&[attestations_root], 0)
    }
}

impl SszSize for Block {
    const SIZE: Size = Size::Variable {
        minimum_size: 2 * SCALAR_SIZE + 2 * ROOT_SIZE + BYTES_PER_LENGTH_OFFSET,
    };
}

impl SszRead for Block {
    fn from_ssz_unchecked(bytes: &[u8]) -> Result<Self, ReadError> {
        let offset = read_offset(bytes, 80)?;

        Ok(Self {
            slot: read_u64(bytes, 0)?,
            proposer_index: read_u64(bytes, SCALAR_SIZE)?,
            parent_root: H256::from_slice(subslice(bytes, 16, 48)?),
            state_root: H256::from_slice(subslice(bytes, 48, 80)?),
            body: BlockBody::from_ssz_unchecked(subslice(bytes, offset, bytes.len())?)?,
        })
    }
}

impl SszWrite for Block {
    fn write_variable(&self, bytes: &mut Vec<u8>) -> Result<(), WriteError> {
        let start = bytes.len();
        let fixed_part = Self::SIZE.fixed_part();

        bytes.resize(start + fixed_part, 0);
        self.slot.write_fixed(&mut bytes[start..start + 8]);
        self.proposer_index
            .write_fixed(&mut bytes[start + 8..start + 16]);
        self.parent_root
            .write_fixed(&mut bytes[start + 16..start + 48]);
        self.state_root
            .write_fixed(&mut bytes[start + 48..start + 80]);
        write_offset(bytes, start + 80, fixed_part)?;

        self.body.write_variable(bytes)
    }
}

impl SszHash for Block {
    fn hash_tree_root(&self) -> H256 {
        merkleize(
            &[
                self.slot.hash_tree_root(),
                self.proposer_index.hash_tree_root(),
                self.parent_root,
                self.state_root,
                self.body.hash_tree_root(),
            ],
            0,
        )
    }
}

impl SszSize for SignedBlock {
    const SIZE: Size = Size::Variable {
        minimum_size: BYTES_PER_LENGTH_OFFSET + ROOT_SIZE,
    };
}

impl SszRead for SignedBlock {
    fn from_ssz_unchecked(bytes: &[u8]) -> Result<Self, ReadError> {
        let offset = read_offset(bytes, 0)?;

        Ok(Self {
            message: Block::from_ssz_unchecked(subslice(bytes, offset, bytes.len())?)?,
            signature: H256::from_slice(subslice(bytes, BYTES_PER_LENGTH_OFFSET, 36)?),
        })
    }
}

impl SszWrite for SignedBlock {
    fn write_variable(&self, bytes: &mut Vec<u8>) -> Result<(), WriteError> {
        let start = bytes.len();
        let fixed_part = Self::SIZE.fixed_part();

        bytes.resize(start + fixed_part, 0);
        write_offset(bytes, start, fixed_part)?;
        self.signature
            .write_fixed(&mut bytes[start + BYTES_PER_LENGTH_OFFSET..start + fixed_part]);

        self.message.write_variable(bytes)
    }
}

impl SszHash for SignedBlock {
    fn hash_tree_root(&self) -> H256 {
        merkleize(&[self.message.hash_tree_root(), self.signature], 0)
    }
}

impl SszSize for Status {
    const SIZE: Size = Size::Fixed {
        size: 2 * CHECKPOINT_SIZE,
    };
}

impl SszRead for Status {
    fn from_ssz_unchecked(bytes: &[u8]) -> Result<Self, ReadError> {
        Ok(Self {
            finalized: Checkpoint::from_ssz_unchecked(subslice(bytes, 0, 40)?)?,
            head: Checkpoint::from_ssz_unchecked(subslice(bytes, 40, 80)?)?,
        })
    }
}

impl SszWrite for Status {
    fn write_fixed(&self, bytes: &mut [u8]) {
        self.finalized.write_fixed(&mut bytes[..40]);
        self.head.write_fixed(&mut bytes[40..80]);
    }
}

impl SszHash for Status {
    fn hash_tree_root(&self) -> H256 {
        merkleize(
            &[self.finalized.hash_tree_root(), self.head.hash_tree_root()],
            0,
        )
    }
}

impl SszSize for BlocksByRootRequest {
    const SIZE: Size = Size::Variable {
        minimum_size: BYTES_PER_LENGTH_OFFSET,
    };
}

impl SszRead for BlocksByRootRequest {
    fn from_ssz_unchecked(bytes: &[u8]) -> Result<Self, ReadError> {
        let offset = read_offset(bytes, 0)?;
        let data = subslice(bytes, offset, bytes.len())?;
        let roots = read_fixed_list(data, MAX_REQUEST_BLOCKS)?;
        Ok(Self { roots })
    }
}

impl SszWrite for BlocksByRootRequest {
    fn write_variable(&self, bytes: &mut Vec<u8>) -> Result<(), WriteError> {
        let start = bytes.len();
        bytes.resize(start + BYTES_PER_LENGTH_OFFSET, 0);
        write_offset(bytes, start, BYTES_PER_LENGTH_OFFSET)?;
        write_fixed_list(bytes, &self.roots);
        Ok(())
    }
}

impl SszHash for Config {
    fn hash_tree_root(&self) -> H256 {
        merkleize(
            &[
                self.num_validators.hash_tree_root(),
                self.genesis_time.hash_tree_root(),
            ],
            0,
        )
    }
}

impl SszHash for crate::state::State {
    fn hash_tree_root(&self) -> H256 {
        let historical_block_hashes_root = mix_in_length(
            merkleize(&self.historical_block_hashes, HISTORICAL_ROOTS_LIMIT),
            self.historical_block_hashes.len(),
        );

        let justification_roots_root = mix_in_length(
            merkleize(&self.justification_roots, HISTORICAL_ROOTS_LIMIT),
            self.justification_roots.len(),
        );

        merkleize(
            &[
                self.config.hash_tree_root(),
                self.slot.hash_tree_root(),
                self.latest_block_header.hash_tree_root(),
                self.latest_justified.hash_tree_root(),
                self.latest_finalized.hash_tree_root(),
                historical_block_hashes_root,
                self.justified_slots.hash_tree_root(),
                justification_roots_root,
                self.justification_validators.hash_tree_root(),
            ],
            0,
        )
    }
}

fn read_fixed_list<T: SszRead>(bytes: &[u8], maximum: usize) -> Result<Vec<T>, ReadError> {
    let size = T::SIZE.fixed_part();
    let remainder = bytes.len() % size;

    if remainder != 0 {
        return Err(ReadError::ListNotAMultipleOfElementSize { remainder });
    }

    let actual = bytes.len() / size;

    if actual > maximum {
        return Err(ReadError::ListTooLong { maximum, actual });
    }

    bytes.chunks_exact(size).map(T::from_ssz_unchecked).collect()
}

fn write_fixed_list<T: SszWrite>(bytes: &mut Vec<u8>, elements: &[T]) {
    let size = T::SIZE.fixed_part();

    for element in elements {
        let position = bytes.len();
        bytes.resize(position + size, 0);
        element.write_fixed(&mut bytes[position..]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_vote(validator_id: u64) -> SignedVote {
        SignedVote {
            data: Vote {
                validator_id,
                slot: 3,
                head: Checkpoint {
                    root: H256::repeat_byte(0xaa),
                    slot: 3,
                },
                target: Checkpoint {
                    root: H256::repeat_byte(0xaa),
                    slot: 3,
                },
                source: Checkpoint {
                    root: H256::repeat_byte(0xbb),
                    slot: 0,
                },
            },
            signature: H256::zero(),
        }
    }

    #[test]
    fn signed_vote_serialization_has_the_declared_size() {
        let bytes = sample_vote(1).to_ssz().expect("SignedVote is fixed-size");
        assert_eq!(bytes.len(), SignedVote::SIZE.fixed_part());
        assert_eq!(SignedVote::from_ssz(&bytes), Ok(sample_vote(1)));
    }

    #[test]
    fn signed_block_round_trips_with_attestations() {
        let block = SignedBlock {
            message: Block {
                slot: 3,
                proposer_index: 3,
                parent_root: H256::repeat_byte(0xaa),
                state_root: H256::repeat_byte(0xcc),
                body: BlockBody {
                    attestations: vec![sample_vote(1), sample_vote(2)],
                },
            },
            signature: H256::zero(),
        };

        let bytes = block.to_ssz().expect("offsets fit in u32");
        assert_eq!(SignedBlock::from_ssz(&bytes), Ok(block));
    }

    #[test]
    fn blocks_by_root_request_round_trips() {
        let request = BlocksByRootRequest {
            roots: vec![H256::repeat_byte(1), H256::repeat_byte(2)],
        };

        let bytes = request.to_ssz().expect("offsets fit in u32");
        assert_eq!(bytes.len(), 4 + 64);
        assert_eq!(BlocksByRootRequest::from_ssz(&bytes), Ok(request));
    }

    #[test]
    fn container_roots_commit_to_every_field() {
        let vote = sample_vote(1);
        let mut changed = vote;
        changed.data.source.slot = 1;

        assert_ne!(vote.hash_tree_root(), changed.hash_tree_root());
    }

    #[test]
    fn an_empty_body_has_a_stable_nonzero_root() {
        let body = BlockBody::default();
        assert_ne!(body.hash_tree_root(), H256::zero());
        assert_eq!(body.hash_tree_root(), BlockBody::default().hash_tree_root());
    }
}
