//! Suppression of redundant compensation updates.
//!
//! The record of what was last sent is scoped per AS number (the source AS
//! of the compensation vector), so vectors of independent domains never
//! suppress each other. Checking and recording happen under one lock in
//! [`SuppressionGate::claim`]; two units racing with the same vector cannot
//! both decide to send it.

use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::debug;

use crate::config::SuppressionPolicy;
use crate::state::CVector;

/// Decides whether a compensation vector still has to go out
pub trait SuppressionGate: Send + Sync {
    /// Whether `candidate` differs from what was last sent for its AS
    fn update_required(&self, candidate: &CVector) -> bool;

    /// Record `vector` as the last one sent for its AS
    fn sent(&self, vector: &CVector);

    /// Check and record in one step. Returns `true` when the caller now owns
    /// sending `candidate`.
    fn claim(&self, candidate: &CVector) -> bool;
}

/// Last-sent record per AS compared under a [`SuppressionPolicy`]
pub struct UpdateSuppressor {
    policy: SuppressionPolicy,
    last_sent: Mutex<HashMap<u32, CVector>>,
}

impl UpdateSuppressor {
    pub fn new(policy: SuppressionPolicy) -> Self {
        Self {
            policy,
            last_sent: Mutex::new(HashMap::new()),
        }
    }

    pub fn policy(&self) -> SuppressionPolicy {
        self.policy
    }

    pub fn last_sent(&self, as_number: u32) -> Option<CVector> {
        self.last_sent.lock().get(&as_number).cloned()
    }

    /// Drop the record for an AS so its next vector is sent unconditionally
    pub fn forget(&self, as_number: u32) {
        self.last_sent.lock().remove(&as_number);
    }

    fn differs(&self, last: &CVector, candidate: &CVector) -> bool {
        if !last.same_links(candidate) {
            return true;
        }
        match self.policy {
            SuppressionPolicy::Exact => last.values != candidate.values,
            SuppressionPolicy::Threshold { threshold } => last
                .entries()
                .zip(candidate.entries())
                .any(|((_, a), (_, b))| a.abs_diff(b) > threshold),
        }
    }

    fn required(&self, last_sent: &HashMap<u32, CVector>, candidate: &CVector) -> bool {
        match last_sent.get(&candidate.source_as) {
            Some(last) => self.differs(last, candidate),
            None => true,
        }
    }
}

impl SuppressionGate for UpdateSuppressor {
    fn update_required(&self, candidate: &CVector) -> bool {
        self.required(&self.last_sent.lock(), candidate)
    }

    fn sent(&self, vector: &CVector) {
        self.last_sent
            .lock()
            .insert(vector.source_as, vector.clone());
    }

    fn claim(&self, candidate: &CVector) -> bool {
        let mut last_sent = self.last_sent.lock();
        if !self.required(&last_sent, candidate) {
            debug!(as_number = candidate.source_as, "compensation vector already sent");
            return false;
        }
        last_sent.insert(candidate.source_as, candidate.clone());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::LinkId;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn c(as_number: u32, c1: i64, c2: i64) -> CVector {
        CVector::from_values(
            as_number,
            [
                (LinkId::new("link1", "isp1"), c1),
                (LinkId::new("link2", "isp1"), c2),
            ],
        )
    }

    #[test]
    fn test_first_vector_always_required() {
        let gate = UpdateSuppressor::new(SuppressionPolicy::Exact);
        assert!(gate.update_required(&c(1, 0, 0)));
        assert!(gate.last_sent(1).is_none());
    }

    #[test]
    fn test_exact_policy() {
        let gate = UpdateSuppressor::new(SuppressionPolicy::Exact);
        gate.sent(&c(1, 100, -100));

        assert!(!gate.update_required(&c(1, 100, -100)));
        assert!(gate.update_required(&c(1, 101, -101)));

        let mut fewer_links = CVector::new(1);
        fewer_links.add(LinkId::new("link1", "isp1"), 100);
        assert!(gate.update_required(&fewer_links));
    }

    #[test]
    fn test_threshold_policy() {
        let gate = UpdateSuppressor::new(SuppressionPolicy::Threshold { threshold: 10 });
        gate.sent(&c(1, 100, -100));

        assert!(!gate.update_required(&c(1, 110, -90)));
        assert!(gate.update_required(&c(1, 111, -100)));
    }

    #[test]
    fn test_scoped_per_as() {
        let gate = UpdateSuppressor::new(SuppressionPolicy::Exact);
        assert!(gate.claim(&c(1, 5, -5)));
        // Same values for another AS are still sent
        assert!(gate.claim(&c(2, 5, -5)));
        assert!(!gate.claim(&c(1, 5, -5)));

        gate.forget(1);
        assert!(gate.claim(&c(1, 5, -5)));
    }

    #[test]
    fn test_claim_records_before_returning() {
        let gate = UpdateSuppressor::new(SuppressionPolicy::Exact);
        assert!(gate.claim(&c(1, 1, 1)));
        assert_eq!(gate.last_sent(1), Some(c(1, 1, 1)));
        assert!(!gate.claim(&c(1, 1, 1)));
        assert!(gate.claim(&c(1, 2, 2)));
    }

    #[test]
    fn test_concurrent_claims_single_winner() {
        let gate = UpdateSuppressor::new(SuppressionPolicy::Exact);
        let winners = AtomicUsize::new(0);

        std::thread::scope(|s| {
            for _ in 0..16 {
                s.spawn(|| {
                    if gate.claim(&c(1, 42, -42)) {
                        winners.fetch_add(1, Ordering::SeqCst);
                    }
                });
            }
        });

        assert_eq!(winners.load(Ordering::SeqCst), 1);
    }
}
