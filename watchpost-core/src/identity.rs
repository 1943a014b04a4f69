//! Node identity
//!
//! Fixed at build time from the firmware's `node.toml`.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NodeRole {
    /// Touchscreen node; arm/disarm authority and provisioning access point
    Display,
    /// Ultrasonic motion sensor
    Sensor,
}

impl NodeRole {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeRole::Display => "display",
            NodeRole::Sensor => "sensor",
        }
    }

    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "display" => Some(NodeRole::Display),
            "sensor" => Some(NodeRole::Sensor),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NodeIdentity {
    pub device_name: &'static str,
    pub role: NodeRole,
}

impl NodeIdentity {
    pub const fn new(device_name: &'static str, role: NodeRole) -> Self {
        Self { device_name, role }
    }
}
