//! Build-time node configuration
//!
//! Constants are generated by build.rs from node.toml.

use core::net::Ipv4Addr;

use watchpost_core::{NodeIdentity, NodeRole};
use watchpost_protocol::Endpoint;

include!(concat!(env!("OUT_DIR"), "/node_config.rs"));

pub const IDENTITY: NodeIdentity = NodeIdentity::new(DEVICE_NAME, ROLE);
