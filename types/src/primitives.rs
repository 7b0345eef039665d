pub use ethereum_types::H256;

pub type Slot = u64;
pub type Epoch = u64;
pub type ValidatorIndex = u64;
pub type UnixSeconds = u64;

/// Message-id domain separators and other 4-byte protocol fields.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Debug)]
pub struct Bytes4(pub [u8; 4]);

#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Debug)]
pub struct Bytes20(pub [u8; 20]);

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Bytes48(pub [u8; 48]);

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Bytes52(pub [u8; 52]);

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Bytes96(pub [u8; 96]);

// `Default` is only derivable for arrays of up to 32 elements.

impl Default for Bytes48 {
    fn default() -> Self {
        Self([0; 48])
    }
}

impl Default for Bytes52 {
    fn default() -> Self {
        Self([0; 52])
    }
}

impl Default for Bytes96 {
    fn default() -> Self {
        Self([0; 96])
    }
}
