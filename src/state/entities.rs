use ipnetwork::IpNetwork;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

use crate::state::{Dc2DcCommunicationId, LinkId, TunnelId};

/// A remote SBox reachable over the inter-SBox interface
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct SBox {
    pub management_address: IpNetwork,
    /// Autonomous systems this SBox manages traffic for
    pub as_numbers: Vec<u32>,
}

impl SBox {
    pub fn new(management_address: IpNetwork, as_numbers: Vec<u32>) -> Self {
        Self {
            management_address,
            as_numbers,
        }
    }

    pub fn serves(&self, as_number: u32) -> bool {
        self.as_numbers.contains(&as_number)
    }
}

/// An SDN controller programming tunnels inside a local data center
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct SdnController {
    pub id: String,
    pub rest_host: IpAddr,
    pub rest_port: u16,
}

/// Link metadata kept in storage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub id: LinkId,
    pub address: IpNetwork,
}

/// A tunnel between two data centers, carried over one of the links
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tunnel {
    pub id: TunnelId,
    pub source: IpAddr,
    pub destination: IpAddr,
}

/// A communication between a local and a remote data center, together with
/// the controller owning the local end and the tunnels serving it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dc2DcCommunication {
    pub id: Dc2DcCommunicationId,
    pub controller: SdnController,
    pub tunnels: Vec<Tunnel>,
}

/// How inter-domain traffic is billed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChargingRule {
    /// Total volume transferred during the accounting period
    Volume,
    /// 95th percentile of the samples collected during the period
    Percentile95,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemControlParameters {
    pub charging_rule: ChargingRule,
}

/// Configuration pushed to an SDN controller: the communications it owns
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigData {
    pub entries: Vec<ConfigDataEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigDataEntry {
    pub communication: Dc2DcCommunicationId,
    pub tunnels: Vec<Tunnel>,
}

impl ConfigData {
    pub fn from_communications<'a>(
        communications: impl IntoIterator<Item = &'a Dc2DcCommunication>,
    ) -> Self {
        Self {
            entries: communications
                .into_iter()
                .map(|c| ConfigDataEntry {
                    communication: c.id.clone(),
                    tunnels: c.tunnels.clone(),
                })
                .collect(),
        }
    }
}
