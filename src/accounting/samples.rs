//! 95th percentile accounting over an accounting period.
//!
//! A container tracks the two inter-domain links of one SBox. Every
//! collection round stores one link sample and one tunnel sample per link.
//! The 95th percentile of the link samples is the billing estimate handed to
//! the Economic Analyzer. Once a reference vector is installed, the container
//! also detects when a link has stayed at or below its reference value for
//! 95% of the samples the period will contain.

use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::{debug, info};

use crate::accounting::{SamplesHistory, TrafficSample};
use crate::config::Config;
use crate::error::{DtmError, Result};
use crate::state::{LinkId, LocalRVector, XVector, ZVector};

/// Rank of the 95th percentile sample in an ascending list of `sample_count`
/// samples: `floor(N * 0.95) - 1`, clamped to the first sample when fewer
/// than 20 samples make the formula negative.
pub fn percentile_index(sample_count: u64) -> usize {
    let rank = sample_count.saturating_mul(19) / 20;
    usize::try_from(rank).unwrap_or(usize::MAX).saturating_sub(1)
}

/// Number of at-or-below-reference samples needed for achievement:
/// `ceil(samples_in_period * 0.95)`
pub fn achievement_threshold(samples_in_period: u32) -> u32 {
    let n = u64::from(samples_in_period);
    u32::try_from((n * 19).div_ceil(20)).unwrap_or(u32::MAX)
}

/// Mutable state of the current accounting period
#[derive(Default)]
struct PeriodState {
    sample_counter: u64,
    link_samples: HashMap<LinkId, Vec<TrafficSample>>,
    tunnel_samples: HashMap<LinkId, Vec<TrafficSample>>,
    current_r_vector: Option<LocalRVector>,
    below_reference: HashMap<LinkId, u32>,
    achieved: Vec<LinkId>,
    achieved_changed: bool,
    history: SamplesHistory,
}

/// Traffic samples of the two monitored links for the running period
pub struct SamplesContainer {
    links: [LinkId; 2],
    threshold: u32,
    state: Mutex<PeriodState>,
}

impl SamplesContainer {
    pub fn new(link1: LinkId, link2: LinkId, samples_in_accounting_period: u32) -> Self {
        Self {
            links: [link1, link2],
            threshold: achievement_threshold(samples_in_accounting_period),
            state: Mutex::new(PeriodState::default()),
        }
    }

    /// Container sized for the configured accounting period
    pub fn with_config(link1: LinkId, link2: LinkId, config: &Config) -> Self {
        Self::new(link1, link2, config.samples_in_accounting_period)
    }

    pub fn tracked_links(&self) -> &[LinkId; 2] {
        &self.links
    }

    /// Store one collection round: the link traffic vector and exactly one
    /// tunnel traffic vector
    pub fn store_traffic_values(&self, x_vector: &XVector, z_vectors: &[ZVector]) -> Result<()> {
        debug!("storing new traffic samples");
        if x_vector.values.is_none() {
            return Err(DtmError::MissingValues {
                as_number: x_vector.source_as,
            });
        }
        let [z_vector] = z_vectors else {
            return Err(DtmError::TunnelVectorCount(z_vectors.len()));
        };
        if z_vector.values.is_none() {
            return Err(DtmError::MissingValues {
                as_number: z_vector.source_as,
            });
        }

        let mut state = self.state.lock();
        state.sample_counter += 1;
        let number = state.sample_counter;

        for (link, value) in x_vector.entries() {
            state
                .link_samples
                .entry(link.clone())
                .or_default()
                .push(TrafficSample { number, value });
            self.recalculate_below_reference(&mut state, link, value);
        }

        for (link, value) in z_vector.entries() {
            state
                .tunnel_samples
                .entry(link.clone())
                .or_default()
                .push(TrafficSample { number, value });
        }

        Ok(())
    }

    fn recalculate_below_reference(&self, state: &mut PeriodState, link: &LinkId, value: i64) {
        let Some(reference) = state
            .current_r_vector
            .as_ref()
            .and_then(|r| r.value_for(link))
        else {
            return;
        };
        if value > reference {
            return;
        }

        let count = state.below_reference.entry(link.clone()).or_insert(0);
        *count += 1;
        if *count == self.threshold {
            debug!(%link, "reference vector achieved");
            state.achieved_changed = true;
            state.achieved.push(link.clone());
        }
    }

    /// 95th percentile link samples for the two tracked links.
    ///
    /// `None` until both links have at least one sample in this period.
    pub fn traffic_values_for_links(&self) -> Option<[i64; 2]> {
        let state = self.state.lock();
        let values = self.percentiles(&state.link_samples, state.sample_counter)?;
        info!(x1 = values[0], x2 = values[1], "returned 95th percentile link samples");
        Some(values)
    }

    /// 95th percentile tunnel samples for the two tracked links
    pub fn traffic_values_for_tunnels(&self) -> Option<[i64; 2]> {
        let state = self.state.lock();
        let values = self.percentiles(&state.tunnel_samples, state.sample_counter)?;
        info!(z1 = values[0], z2 = values[1], "returned 95th percentile tunnel samples");
        Some(values)
    }

    fn percentiles(
        &self,
        samples: &HashMap<LinkId, Vec<TrafficSample>>,
        sample_counter: u64,
    ) -> Option<[i64; 2]> {
        let first = percentile_value(samples.get(&self.links[0])?, sample_counter)?;
        let second = percentile_value(samples.get(&self.links[1])?, sample_counter)?;
        Some([first, second])
    }

    /// Close the accounting period: archive its samples and start over
    pub fn reset_traffic_values(&self) {
        let mut state = self.state.lock();
        let links = std::mem::take(&mut state.link_samples);
        let tunnels = std::mem::take(&mut state.tunnel_samples);
        state.history.store(links, tunnels);

        state.sample_counter = 0;
        state.achieved_changed = false;
        state.achieved.clear();
        state.below_reference.clear();
        info!(periods = state.history.len(), "accounting period closed");
    }

    /// Reference vector for the samples stored from now on
    pub fn set_current_r_vector(&self, r_vector: LocalRVector) {
        self.state.lock().current_r_vector = Some(r_vector);
    }

    /// Whether new links achieved the reference since the last call
    pub fn is_change_in_links_with_r_vector_achieved(&self) -> bool {
        std::mem::take(&mut self.state.lock().achieved_changed)
    }

    /// Links that achieved the reference during this period
    pub fn links_with_r_vector_achieved(&self) -> Vec<LinkId> {
        self.state.lock().achieved.clone()
    }

    pub fn sample_counter(&self) -> u64 {
        self.state.lock().sample_counter
    }

    /// Link samples of the running period, in arrival order
    pub fn link_samples(&self, link: &LinkId) -> Vec<TrafficSample> {
        self.state
            .lock()
            .link_samples
            .get(link)
            .cloned()
            .unwrap_or_default()
    }

    pub fn tunnel_samples(&self, link: &LinkId) -> Vec<TrafficSample> {
        self.state
            .lock()
            .tunnel_samples
            .get(link)
            .cloned()
            .unwrap_or_default()
    }

    /// Samples of all closed periods
    pub fn history(&self) -> SamplesHistory {
        self.state.lock().history.clone()
    }
}

/// The percentile rank is taken over the period sample counter; a link that
/// missed some rounds has a shorter list, so the rank is capped at its end.
fn percentile_value(samples: &[TrafficSample], sample_counter: u64) -> Option<i64> {
    if samples.is_empty() {
        return None;
    }
    let mut values: Vec<i64> = samples.iter().map(|s| s.value).collect();
    values.sort_unstable();
    let index = percentile_index(sample_counter).min(values.len() - 1);
    Some(values[index])
}
