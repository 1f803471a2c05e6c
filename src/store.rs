//! Storage collaborator.
//!
//! The core only reads from storage at runtime. [`InMemoryStore`] backs
//! embedded deployments and tests; a database-backed implementation lives
//! with the surrounding process.

use anyhow::Result;
use ipnetwork::IpNetwork;
use parking_lot::RwLock;
use std::collections::HashMap;

use crate::state::{Dc2DcCommunication, Link, LinkId, SBox, SystemControlParameters};

/// Read access to the SBox configuration database
pub trait Store: Send + Sync {
    /// Remote SBoxes serving the given AS, in configuration order
    fn find_remote_sboxes(&self, as_number: u32) -> Result<Vec<SBox>>;

    /// Every configured data center to data center communication
    fn find_all_dc2dc_communications(&self) -> Result<Vec<Dc2DcCommunication>>;

    fn find_link(&self, id: &LinkId) -> Result<Option<Link>>;

    /// Most recently stored system control parameters
    fn find_last_control_parameters(&self) -> Result<Option<SystemControlParameters>>;
}

/// Store keeping everything in memory
#[derive(Default)]
pub struct InMemoryStore {
    sboxes: RwLock<Vec<SBox>>,
    communications: RwLock<Vec<Dc2DcCommunication>>,
    links: RwLock<HashMap<LinkId, Link>>,
    control_parameters: RwLock<Vec<SystemControlParameters>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the SBox with the same management address
    pub fn put_sbox(&self, sbox: SBox) {
        let mut sboxes = self.sboxes.write();
        match sboxes
            .iter_mut()
            .find(|s| s.management_address == sbox.management_address)
        {
            Some(existing) => *existing = sbox,
            None => sboxes.push(sbox),
        }
    }

    pub fn delete_sbox(&self, management_address: &IpNetwork) -> bool {
        let mut sboxes = self.sboxes.write();
        let before = sboxes.len();
        sboxes.retain(|s| &s.management_address != management_address);
        sboxes.len() != before
    }

    /// Insert or replace the communication with the same identifier
    pub fn put_communication(&self, communication: Dc2DcCommunication) {
        let mut communications = self.communications.write();
        match communications.iter_mut().find(|c| c.id == communication.id) {
            Some(existing) => *existing = communication,
            None => communications.push(communication),
        }
    }

    pub fn put_link(&self, link: Link) {
        self.links.write().insert(link.id.clone(), link);
    }

    pub fn delete_link(&self, id: &LinkId) -> Option<Link> {
        self.links.write().remove(id)
    }

    pub fn push_control_parameters(&self, parameters: SystemControlParameters) {
        self.control_parameters.write().push(parameters);
    }
}

impl Store for InMemoryStore {
    fn find_remote_sboxes(&self, as_number: u32) -> Result<Vec<SBox>> {
        Ok(self
            .sboxes
            .read()
            .iter()
            .filter(|s| s.serves(as_number))
            .cloned()
            .collect())
    }

    fn find_all_dc2dc_communications(&self) -> Result<Vec<Dc2DcCommunication>> {
        Ok(self.communications.read().clone())
    }

    fn find_link(&self, id: &LinkId) -> Result<Option<Link>> {
        Ok(self.links.read().get(id).cloned())
    }

    fn find_last_control_parameters(&self) -> Result<Option<SystemControlParameters>> {
        Ok(self.control_parameters.read().last().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ChargingRule;

    fn sbox(address: &str, as_numbers: Vec<u32>) -> SBox {
        SBox::new(address.parse().unwrap(), as_numbers)
    }

    #[test]
    fn test_remote_sboxes_filtered_by_as() {
        let store = InMemoryStore::new();
        store.put_sbox(sbox("1.1.1.1/32", vec![1]));
        store.put_sbox(sbox("2.2.2.2/32", vec![1, 2]));
        store.put_sbox(sbox("3.3.3.3/32", vec![2]));

        let found = store.find_remote_sboxes(1).unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(
            found[0].management_address,
            "1.1.1.1/32".parse::<IpNetwork>().unwrap()
        );
        assert!(store.find_remote_sboxes(7).unwrap().is_empty());
    }

    #[test]
    fn test_put_replaces_and_delete_removes() {
        let store = InMemoryStore::new();
        store.put_sbox(sbox("1.1.1.1/32", vec![1]));
        store.put_sbox(sbox("1.1.1.1/32", vec![2]));
        assert!(store.find_remote_sboxes(1).unwrap().is_empty());
        assert_eq!(store.find_remote_sboxes(2).unwrap().len(), 1);

        assert!(store.delete_sbox(&"1.1.1.1/32".parse().unwrap()));
        assert!(!store.delete_sbox(&"1.1.1.1/32".parse().unwrap()));
    }

    #[test]
    fn test_links_and_control_parameters() {
        let store = InMemoryStore::new();
        let id = LinkId::new("link1", "isp1");
        assert!(store.find_link(&id).unwrap().is_none());
        assert!(store.find_last_control_parameters().unwrap().is_none());

        store.put_link(Link {
            id: id.clone(),
            address: "10.10.10.10/24".parse().unwrap(),
        });
        store.push_control_parameters(SystemControlParameters {
            charging_rule: ChargingRule::Volume,
        });
        store.push_control_parameters(SystemControlParameters {
            charging_rule: ChargingRule::Percentile95,
        });

        assert!(store.find_link(&id).unwrap().is_some());
        assert_eq!(
            store.find_last_control_parameters().unwrap().unwrap().charging_rule,
            ChargingRule::Percentile95
        );
        assert!(store.delete_link(&id).is_some());
    }
}
