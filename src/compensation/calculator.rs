//! Compensation from a full reference vector.
//!
//! The reference vector describes how the traffic of the period should be
//! split across the links. The compensation for a link is the traffic it
//! carries above its share of the measured total:
//!
//! ```text
//! c_i = x_i - round(r_i * sum(x) / sum(r))
//! ```
//!
//! Components always sum to (almost, after rounding) zero: what one link
//! should shed, the others should take over.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::state::{CVector, Dc2DcCommunicationId, LocalRVector, RVector, ThetaCoefficient, XVector};

/// Part of the shifted traffic attributed to one data center pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairShare {
    pub pair: Dc2DcCommunicationId,
    pub traffic: i64,
}

/// Result of a direct calculation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Compensation {
    pub vector: CVector,
    /// Shift volume split by the theta coefficients of the reference
    pub shares: Vec<PairShare>,
}

/// Calculates compensation from a measured and a full reference vector
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectCalculator;

impl DirectCalculator {
    pub fn new() -> Self {
        Self
    }

    /// Returns `None` when there is nothing to compensate against: vectors of
    /// different ASes, different link sets, missing values or a reference that
    /// does not sum to a positive total.
    pub fn calculate(&self, x_vector: &XVector, r_vector: &RVector) -> Option<Compensation> {
        if x_vector.source_as != r_vector.source_as() {
            debug!(
                x_as = x_vector.source_as,
                r_as = r_vector.source_as(),
                "measured and reference vectors belong to different ASes"
            );
            return None;
        }
        if x_vector.values.is_none() || !x_vector.same_links(&r_vector.vector) {
            debug!(as_number = x_vector.source_as, "measured and reference links differ");
            return None;
        }

        let vector = proportional(x_vector, &r_vector.vector)?;
        let shares = split_by_theta(&vector, &r_vector.thetas);
        Some(Compensation { vector, shares })
    }
}

/// Per-link traffic above the link's proportional share of the measured
/// total. `None` when the reference total is not positive or a reference
/// link has no measurement.
pub(crate) fn proportional(x_vector: &XVector, r_vector: &LocalRVector) -> Option<CVector> {
    let r_total = r_vector.total();
    if r_total <= 0 {
        return None;
    }
    let x_total = x_vector.total() as f64;

    let mut c_vector = CVector::new(x_vector.source_as);
    for (link, r_value) in r_vector.entries() {
        let x_value = x_vector.value_for(link)?;
        let target = (r_value as f64 * x_total / r_total as f64).round() as i64;
        c_vector.add(link.clone(), x_value.saturating_sub(target));
    }
    Some(c_vector)
}

/// Distribute the shift volume (sum of positive components) over the data
/// center pairs according to their theta weights
pub fn split_by_theta(c_vector: &CVector, thetas: &[ThetaCoefficient]) -> Vec<PairShare> {
    let shift: i64 = c_vector
        .entries()
        .map(|(_, v)| v.max(0))
        .fold(0, i64::saturating_add);

    thetas
        .iter()
        .map(|theta| PairShare {
            pair: theta.pair.clone(),
            traffic: (theta.value * shift as f64).round() as i64,
        })
        .collect()
}
