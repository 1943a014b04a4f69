//! Node addressing

use core::net::Ipv4Addr;

/// Port every node listens on for commands and alerts
pub const UDP_PORT: u16 = 5005;

/// An IPv4 address and UDP port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Endpoint {
    pub ip: Ipv4Addr,
    pub port: u16,
}

impl Endpoint {
    pub const fn new(ip: Ipv4Addr, port: u16) -> Self {
        Self { ip, port }
    }

    /// Endpoint on the standard command port
    pub const fn node(a: u8, b: u8, c: u8, d: u8) -> Self {
        Self::new(Ipv4Addr::new(a, b, c, d), UDP_PORT)
    }

    /// Parse a dotted-quad address, optionally followed by `:port`.
    /// A bare address uses [`UDP_PORT`].
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let (host, port) = match text.split_once(':') {
            Some((host, port)) => (host, port.parse::<u16>().ok()?),
            None => (text, UDP_PORT),
        };
        let ip = host.parse::<Ipv4Addr>().ok()?;
        Some(Self::new(ip, port))
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Endpoint {
    fn format(&self, f: defmt::Formatter) {
        let [a, b, c, d] = self.ip.octets();
        defmt::write!(f, "{}.{}.{}.{}:{}", a, b, c, d, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_address_uses_default_port() {
        let ep = Endpoint::parse("192.168.1.69").unwrap();
        assert_eq!(ep, Endpoint::node(192, 168, 1, 69));
    }

    #[test]
    fn test_parse_with_port() {
        let ep = Endpoint::parse(" 10.0.0.7:6000 ").unwrap();
        assert_eq!(ep.ip, Ipv4Addr::new(10, 0, 0, 7));
        assert_eq!(ep.port, 6000);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(Endpoint::parse("").is_none());
        assert!(Endpoint::parse("display.local").is_none());
        assert!(Endpoint::parse("192.168.1.300").is_none());
        assert!(Endpoint::parse("192.168.1.2:port").is_none());
    }
}
