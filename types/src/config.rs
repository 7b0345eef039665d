use serde::{Deserialize, Serialize};

use crate::primitives::UnixSeconds;

/// Chain parameters fixed at genesis.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub num_validators: u64,
    pub genesis_time: UnixSeconds,
}
