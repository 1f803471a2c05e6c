//! Raw counter deltas handed over by the counter collection layer.
//!
//! Deltas arrive already resolved to a link or a tunnel. A collection round
//! may report the same link from several routers, so values can either be
//! stored (replace) or added (accumulate).

use std::collections::HashMap;

use crate::state::{LinkId, TunnelId, XVector, ZVector};

/// 64-bit counter deltas per link and per tunnel
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CounterValues {
    links: HashMap<LinkId, u64>,
    tunnels: HashMap<TunnelId, u64>,
}

impl CounterValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a link value, replacing any previous one
    pub fn store_link(&mut self, link: LinkId, value: u64) {
        self.links.insert(link, value);
    }

    /// Store a tunnel value, replacing any previous one
    pub fn store_tunnel(&mut self, tunnel: TunnelId, value: u64) {
        self.tunnels.insert(tunnel, value);
    }

    /// Add to the existing link entry or create it
    pub fn add_link(&mut self, link: LinkId, value: u64) {
        let entry = self.links.entry(link).or_insert(0);
        *entry = entry.wrapping_add(value);
    }

    /// Fold another round into this one, summing entries present in both
    pub fn merge(&mut self, other: &CounterValues) {
        for (link, value) in &other.links {
            self.add_link(link.clone(), *value);
        }
        for (tunnel, value) in &other.tunnels {
            let entry = self.tunnels.entry(tunnel.clone()).or_insert(0);
            *entry = entry.wrapping_add(*value);
        }
    }

    pub fn link_value(&self, link: &LinkId) -> Option<u64> {
        self.links.get(link).copied()
    }

    pub fn tunnel_value(&self, tunnel: &TunnelId) -> Option<u64> {
        self.tunnels.get(tunnel).copied()
    }

    pub fn link_ids(&self) -> impl Iterator<Item = &LinkId> {
        self.links.keys()
    }

    pub fn tunnel_ids(&self) -> impl Iterator<Item = &TunnelId> {
        self.tunnels.keys()
    }

    /// Link traffic vector for one collection round
    pub fn to_x_vector(&self, source_as: u32) -> XVector {
        XVector::from_values(
            source_as,
            self.links
                .iter()
                .map(|(link, value)| (link.clone(), clamp(*value))),
        )
    }

    /// Tunnel traffic vector, tunnel deltas summed per carrying link
    pub fn to_z_vector(&self, source_as: u32) -> ZVector {
        let mut per_link: HashMap<&LinkId, u64> = HashMap::new();
        for (tunnel, value) in &self.tunnels {
            let entry = per_link.entry(&tunnel.link).or_insert(0);
            *entry = entry.saturating_add(*value);
        }
        ZVector::from_values(
            source_as,
            per_link
                .into_iter()
                .map(|(link, value)| (link.clone(), clamp(value))),
        )
    }
}

fn clamp(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
