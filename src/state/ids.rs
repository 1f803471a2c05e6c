use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies an inter-domain link by its local name and the ISP on the far end
#[derive(Debug, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct LinkId {
    pub local_id: String,
    pub isp: String,
}

impl LinkId {
    pub fn new(local_id: impl Into<String>, isp: impl Into<String>) -> Self {
        Self {
            local_id: local_id.into(),
            isp: isp.into(),
        }
    }
}

impl fmt::Display for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.local_id, self.isp)
    }
}

/// Identifies a tunnel; every tunnel is carried over exactly one link
#[derive(Debug, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct TunnelId {
    pub name: String,
    pub link: LinkId,
}

impl TunnelId {
    pub fn new(name: impl Into<String>, link: LinkId) -> Self {
        Self {
            name: name.into(),
            link,
        }
    }
}

impl fmt::Display for TunnelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} via {}", self.name, self.link)
    }
}

/// Direction of traffic for a data center pair, seen from the local DC
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub enum Direction {
    Inbound,
    Outbound,
}

/// Identifies a communication between a local and a remote cloud data center
#[derive(Debug, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct Dc2DcCommunicationId {
    pub sequence: u32,
    pub direction: Direction,
    pub local_as: u32,
    pub local_dc: String,
    pub remote_as: u32,
    pub remote_dc: String,
}

impl fmt::Display for Dc2DcCommunicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let arrow = match self.direction {
            Direction::Inbound => "<-",
            Direction::Outbound => "->",
        };
        write!(
            f,
            "#{} AS{}:{} {} AS{}:{}",
            self.sequence, self.local_as, self.local_dc, arrow, self.remote_as, self.remote_dc
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_link_id_value_equality() {
        let a = LinkId::new("link1", "isp1");
        let b = LinkId::new(String::from("link1"), "isp1");
        assert_eq!(a, b);

        let set: HashSet<_> = [a, b, LinkId::new("link2", "isp1")].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_tunnel_id_display() {
        let tunnel = TunnelId::new("tunnel1", LinkId::new("link1", "isp1"));
        assert_eq!(tunnel.to_string(), "tunnel1 via link1@isp1");
    }
}
