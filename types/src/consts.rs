use crate::primitives::Slot;

pub const GENESIS_SLOT: Slot = 0;

pub const SECONDS_PER_SLOT: u64 = 4;
pub const JUSTIFICATION_LOOKBACK_SLOTS: u64 = 3;

/// 2¹⁰
pub const MAX_REQUEST_BLOCKS: usize = 1024;

/// Chunk limits for the state's variable-length containers.
/// `justification_validators` holds one bit mask per pending target root,
/// hence the product limit.
pub const HISTORICAL_ROOTS_LIMIT: usize = 1 << 18;
pub const VALIDATOR_REGISTRY_LIMIT: usize = 1 << 12;
pub const JUSTIFICATION_VALIDATORS_LIMIT: usize = HISTORICAL_ROOTS_LIMIT * VALIDATOR_REGISTRY_LIMIT;
