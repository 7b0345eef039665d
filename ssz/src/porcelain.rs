use ethereum_types::H256;

use crate::{
    error::{ReadError, WriteError},
    size::Size,
};

pub trait SszSize {
    const SIZE: Size;
}

pub trait SszRead: SszSize + Sized {
    /// Attempts to deserialize `bytes` into `Self` without checking the length of `bytes`.
    ///
    /// This is safe in the Rust sense of the word but may panic if called directly.
    /// This should only be called as an optimization inside [`SszRead`] impls for fixed-size types.
    /// For variable-size types [`SszRead::from_ssz`] is equivalent and should be used instead.
    fn from_ssz_unchecked(bytes: &[u8]) -> Result<Self, ReadError>;

    /// Attempts to deserialize `bytes` into `Self` with full validation.
    fn from_ssz(bytes: impl AsRef<[u8]>) -> Result<Self, ReadError> {
        let bytes = bytes.as_ref();

        if let Size::Fixed { size: expected } = Self::SIZE {
            let actual = bytes.len();

            if actual != expected {
                return Err(ReadError::FixedSizeMismatch { expected, actual });
            }
        }

        Self::from_ssz_unchecked(bytes)
    }
}

pub trait SszWrite: SszSize {
    // The panics could be avoided with some type-level programming, but it's not worth the trouble.
    fn write_fixed(&self, _bytes: &mut [u8]) {
        panic!("SszWrite::write_fixed must be implemented for fixed-size types");
    }

    fn write_variable(&self, _bytes: &mut Vec<u8>) -> Result<(), WriteError> {
        panic!("SszWrite::write_variable must be implemented for variable-size types");
    }

    fn to_ssz(&self) -> Result<Vec<u8>, WriteError> {
        match Self::SIZE {
            Size::Fixed { size } => {
                let mut bytes = vec![0; size];
                self.write_fixed(bytes.as_mut_slice());
                Ok(bytes)
            }
            Size::Variable { minimum_size } => {
                let mut bytes = Vec::with_capacity(minimum_size);
                self.write_variable(&mut bytes)?;
                Ok(bytes)
            }
        }
    }
}

pub trait SszHash {
    fn hash_tree_root(&self) -> H256;
}

impl SszSize for u64 {
    const SIZE: Size = Size::Fixed {
        size: size_of::<Self>(),
    };
}

impl SszRead for u64 {
    fn from_ssz_unchecked(bytes: &[u8]) -> Result<Self, ReadError> {
        let mut le_bytes = [0; size_of::<Self>()];
        le_bytes.copy_from_slice(bytes);
        Ok(Self::from_le_bytes(le_bytes))
    }
}

impl SszWrite for u64 {
    fn write_fixed(&self, bytes: &mut [u8]) {
        bytes.copy_from_slice(&self.to_le_bytes());
    }
}

impl SszHash for u64 {
    fn hash_tree_root(&self) -> H256 {
        let mut hash = H256::zero();
        hash[..size_of::<Self>()].copy_from_slice(&self.to_le_bytes());
        hash
    }
}

impl SszSize for H256 {
    const SIZE: Size = Size::Fixed {
        size: Self::len_bytes(),
    };
}

impl SszRead for H256 {
    fn from_ssz_unchecked(bytes: &[u8]) -> Result<Self, ReadError> {
        Ok(Self::from_slice(bytes))
    }
}

impl SszWrite for H256 {
    fn write_fixed(&self, bytes: &mut [u8]) {
        bytes.copy_from_slice(self.as_bytes());
    }
}

impl SszHash for H256 {
    fn hash_tree_root(&self) -> H256 {
        *self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn u64_hash_tree_root_is_little_endian_in_the_low_bytes() {
        let root = 100_u64.hash_tree_root();
        assert_eq!(root[0], 100);
        assert_eq!(&root[1..], [0; 31]);
    }

    #[test]
    fn u64_round_trips_through_ssz() {
        let bytes = 0x0807_0605_0403_0201_u64.to_ssz().expect("u64 is fixed-size");
        assert_eq!(bytes, [1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(u64::from_ssz(&bytes), Ok(0x0807_0605_0403_0201));
    }
}
