pub mod gossip;
pub mod reqresp;
