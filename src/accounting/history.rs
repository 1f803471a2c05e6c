use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::state::LinkId;

/// One traffic sample; `number` is the position within the accounting period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrafficSample {
    pub number: u64,
    pub value: i64,
}

/// All samples collected for one link during one period
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkSamples {
    pub link: LinkId,
    pub samples: Vec<TrafficSample>,
}

/// Samples of a closed accounting period
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodSnapshot {
    pub closed_at: DateTime<Utc>,
    pub links: Vec<LinkSamples>,
    pub tunnels: Vec<LinkSamples>,
}

impl PeriodSnapshot {
    pub fn link_samples(&self, link: &LinkId) -> Option<&[TrafficSample]> {
        find(&self.links, link)
    }

    pub fn tunnel_samples(&self, link: &LinkId) -> Option<&[TrafficSample]> {
        find(&self.tunnels, link)
    }
}

fn find<'a>(entries: &'a [LinkSamples], link: &LinkId) -> Option<&'a [TrafficSample]> {
    entries
        .iter()
        .find(|e| &e.link == link)
        .map(|e| e.samples.as_slice())
}

/// Samples of all previous accounting periods, oldest first
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SamplesHistory {
    periods: Vec<PeriodSnapshot>,
}

impl SamplesHistory {
    /// Archive the samples of a period that has just ended
    pub fn store(
        &mut self,
        links: HashMap<LinkId, Vec<TrafficSample>>,
        tunnels: HashMap<LinkId, Vec<TrafficSample>>,
    ) {
        self.periods.push(PeriodSnapshot {
            closed_at: Utc::now(),
            links: sorted(links),
            tunnels: sorted(tunnels),
        });
    }

    pub fn periods(&self) -> &[PeriodSnapshot] {
        &self.periods
    }

    pub fn latest(&self) -> Option<&PeriodSnapshot> {
        self.periods.last()
    }

    pub fn len(&self) -> usize {
        self.periods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }
}

fn sorted(samples: HashMap<LinkId, Vec<TrafficSample>>) -> Vec<LinkSamples> {
    let mut entries: Vec<LinkSamples> = samples
        .into_iter()
        .map(|(link, samples)| LinkSamples { link, samples })
        .collect();
    entries.sort_by(|a, b| a.link.cmp(&b.link));
    entries
}
