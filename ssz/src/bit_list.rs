use core::fmt::{Debug, Formatter, Result as FmtResult};

use bit_field::BitArray as _;
use bitvec::{order::Lsb0, vec::BitVec};
use ethereum_types::H256;

use crate::{
    bit_vector::chunk_count,
    consts::BITS_PER_BYTE,
    error::ReadError,
    merkle::{merkleize_bytes, mix_in_length},
    porcelain::SszHash,
};

/// A variable-length bit array with a maximum capacity.
///
/// The serialized form carries a delimiting bit one position past the last
/// real bit, so the empty list serializes to the single byte `0x01`.
/// Bit order is Lsb0, like [`BitVector`](crate::BitVector).
#[derive(Clone, PartialEq, Eq)]
pub struct BitList {
    bits: BitVec<u8, Lsb0>,
    limit: usize,
}

// This sort of code arguably belongs in an impl of `core::fmt::Binary` rather than `Debug`,
// but we don't ever format bit lists directly and we need a `Debug` impl anyway.
impl Debug for BitList {
    fn fmt(&self, formatter: &mut Formatter) -> FmtResult {
        formatter.write_str("0b")?;

        for bit in self.bits.iter().by_vals() {
            formatter.write_str(if bit { "1" } else { "0" })?;
        }

        Ok(())
    }
}

impl SszHash for BitList {
    fn hash_tree_root(&self) -> H256 {
        let root = merkleize_bytes(self.bits.as_raw_slice(), chunk_count(self.limit));
        mix_in_length(root, self.len())
    }
}

impl BitList {
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self {
            bits: BitVec::new(),
            limit,
        }
    }

    pub fn from_bits(
        bits: impl IntoIterator<Item = bool>,
        limit: usize,
    ) -> Result<Self, ReadError> {
        let bits = bits.into_iter().collect::<BitVec<u8, Lsb0>>();

        if bits.len() > limit {
            return Err(ReadError::BitListTooLong {
                maximum: limit,
                actual: bits.len(),
            });
        }

        Ok(Self { bits, limit })
    }

    /// Deserializes the delimited wire form.
    pub fn from_ssz_bytes(bytes: impl AsRef<[u8]>, limit: usize) -> Result<Self, ReadError> {
        let bytes = bytes.as_ref();
        let length = measure_length(bytes)?;

        if length > limit {
            return Err(ReadError::BitListTooLong {
                maximum: limit,
                actual: length,
            });
        }

        let mut bits = BitVec::repeat(false, length);

        for index in 0..length {
            if bytes.get_bit(index) {
                bits.set(index, true);
            }
        }

        Ok(Self { bits, limit })
    }

    /// Serializes to the delimited wire form.
    #[must_use]
    pub fn to_ssz_bytes(&self) -> Vec<u8> {
        let length = self.len();
        let mut bytes = self.bits.as_raw_slice().to_vec();
        bytes.resize(length / BITS_PER_BYTE + 1, 0);
        bytes.set_bit(length, true);
        bytes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    #[must_use]
    pub const fn limit(&self) -> usize {
        self.limit
    }

    /// Out-of-range reads are `false`.
    #[must_use]
    pub fn get(&self, index: usize) -> bool {
        self.bits.get(index).is_some_and(|bit| *bit)
    }

    /// Out-of-range writes are no-ops. See [`Self::set_extending`] for the
    /// growing variant.
    pub fn set(&mut self, index: usize, value: bool) {
        if index < self.bits.len() {
            self.bits.set(index, value);
        }
    }

    /// Sets the bit at `index`, first growing the list with `false` bits so
    /// that `index` is in range. The limit is enforced at construction and
    /// deserialization, not here; callers append one bit per slot and run out
    /// of chain long before they run out of capacity.
    pub fn set_extending(&mut self, index: usize, value: bool) {
        if self.bits.len() <= index {
            self.bits.resize(index + 1, false);
        }

        self.bits.set(index, value);
    }

    #[must_use]
    pub fn count_ones(&self) -> usize {
        self.bits.count_ones()
    }
}

/// The position of the delimiting bit, which doubles as the length.
fn measure_length(bytes: &[u8]) -> Result<usize, ReadError> {
    let last_byte = *bytes.last().ok_or(ReadError::BitListEmptySlice)?;

    if last_byte == 0 {
        return Err(ReadError::BitListNoDelimitingBit);
    }

    let leading_zeros = last_byte.leading_zeros() as usize;
    let bits_in_last_byte = BITS_PER_BYTE - 1 - leading_zeros;

    Ok((bytes.len() - 1) * BITS_PER_BYTE + bits_in_last_byte)
}
