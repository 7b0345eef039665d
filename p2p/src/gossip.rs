//! Gossipsub parameters for Devnet 0.

use core::time::Duration;

use types::{
    consts::{JUSTIFICATION_LOOKBACK_SLOTS, SECONDS_PER_SLOT},
    primitives::Bytes4,
};

/// Message-id domains separating valid from invalid snappy-framed payloads.
pub const MESSAGE_DOMAIN_INVALID_SNAPPY: Bytes4 = Bytes4([0x00, 0x00, 0x00, 0x00]);
pub const MESSAGE_DOMAIN_VALID_SNAPPY: Bytes4 = Bytes4([0x01, 0x00, 0x00, 0x00]);

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ValidationMode {
    /// Messages are unsigned and validated by content only.
    StrictNoSign,
}

impl ValidationMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::StrictNoSign => "strict_no_sign",
        }
    }
}

/// The canonical gossipsub parameters.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Params {
    pub protocol_id: &'static str,
    /// Target mesh peers.
    pub d: usize,
    pub d_low: usize,
    pub d_high: usize,
    /// Gossip-only peers.
    pub d_lazy: usize,
    pub heartbeat_interval: Duration,
    pub fanout_ttl: Duration,
    /// Message cache windows, and how many of them gossip covers.
    pub mcache_len: usize,
    pub mcache_gossip: usize,
    pub seen_ttl: Duration,
    pub validation_mode: ValidationMode,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            protocol_id: "/meshsub/1.0.0",
            d: 8,
            d_low: 6,
            d_high: 12,
            d_lazy: 6,
            heartbeat_interval: Duration::from_millis(700),
            fanout_ttl: Duration::from_secs(60),
            mcache_len: 6,
            mcache_gossip: 3,
            // Long enough to cover the justification lookback twice over.
            seen_ttl: Duration::from_secs(SECONDS_PER_SLOT * JUSTIFICATION_LOOKBACK_SLOTS * 2),
            validation_mode: ValidationMode::StrictNoSign,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn the_default_parameters_match_the_networking_profile() {
        let params = Params::default();

        assert_eq!(params.d, 8);
        assert_eq!(params.d_low, 6);
        assert_eq!(params.d_high, 12);
        assert_eq!(params.d_lazy, 6);
        assert_eq!(params.heartbeat_interval, Duration::from_millis(700));
        assert_eq!(params.seen_ttl, Duration::from_secs(24));
        assert_eq!(params.validation_mode.as_str(), "strict_no_sign");
    }

    #[test]
    fn the_message_domains_are_distinct() {
        assert_ne!(MESSAGE_DOMAIN_VALID_SNAPPY, MESSAGE_DOMAIN_INVALID_SNAPPY);
    }
}
