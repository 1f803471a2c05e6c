//! Compensation from a local reference vector.
//!
//! A receiving SBox only knows the local form of the reference, without the
//! theta coefficients. It combines it with the charging rule and the link
//! metadata from its own database.

use std::collections::HashMap;
use tracing::debug;

use crate::compensation::calculator::proportional;
use crate::error::{DtmError, Result};
use crate::state::{CVector, ChargingRule, Link, LinkId, LocalRVector, XVector};
use crate::store::Store;

/// Billing parameters the local constructor needs
#[derive(Debug, Clone, PartialEq)]
pub struct BillingParameters {
    pub rule: ChargingRule,
    pub links: HashMap<LinkId, Link>,
}

impl BillingParameters {
    /// Read the active charging rule and the metadata of every reference link.
    ///
    /// Links without metadata are left out; [`LocalConstructor::construct`]
    /// reports them.
    pub fn resolve(store: &dyn Store, reference: &LocalRVector) -> Result<Self> {
        let rule = store
            .find_last_control_parameters()
            .map_err(DtmError::Storage)?
            .ok_or(DtmError::MissingBillingParameters)?
            .charging_rule;

        let mut links = HashMap::new();
        for id in reference.links() {
            if let Some(link) = store.find_link(id).map_err(DtmError::Storage)? {
                links.insert(id.clone(), link);
            }
        }
        Ok(Self { rule, links })
    }
}

/// Builds a compensation vector without cross-domain theta information
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalConstructor;

impl LocalConstructor {
    pub fn new() -> Self {
        Self
    }

    pub fn construct(
        &self,
        x_vector: &XVector,
        r_vector: &LocalRVector,
        params: &BillingParameters,
    ) -> Result<CVector> {
        x_vector.validate()?;
        r_vector.validate()?;

        for link in r_vector.links() {
            if !params.links.contains_key(link) {
                return Err(DtmError::MissingLink(link.clone()));
            }
            if x_vector.value_for(link).is_none() {
                return Err(DtmError::MissingMeasurement(link.clone()));
            }
        }

        let c_vector = match params.rule {
            ChargingRule::Volume => {
                proportional(x_vector, r_vector).unwrap_or_else(|| absolute(x_vector, r_vector))
            }
            ChargingRule::Percentile95 => absolute(x_vector, r_vector),
        };
        debug!(
            as_number = c_vector.source_as,
            rule = ?params.rule,
            "constructed compensation vector"
        );
        Ok(c_vector)
    }
}

/// Per-link traffic above the link's own reference value
fn absolute(x_vector: &XVector, r_vector: &LocalRVector) -> CVector {
    CVector::from_values(
        x_vector.source_as,
        r_vector.entries().map(|(link, r_value)| {
            let x_value = x_vector.value_for(link).unwrap_or(r_value);
            (link.clone(), x_value.saturating_sub(r_value))
        }),
    )
}
