use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::marker::PhantomData;

use crate::error::{DtmError, Result};
use crate::state::{Dc2DcCommunicationId, LinkId};

/// Per-link traffic values, ordered by link for deterministic iteration
pub type VectorValues = BTreeMap<LinkId, i64>;

/// Measured link traffic (X vector)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkTraffic {}

/// Measured tunnel traffic aggregated per link (Z vector)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TunnelTraffic {}

/// Reference traffic without cost-sharing weights (local R vector)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetTraffic {}

/// Compensation signal (C vector)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompensationSignal {}

/// A traffic vector owned by one autonomous system.
///
/// `values` is `None` when the sender supplied no value mapping at all; such
/// a vector is rejected by [`Vector::validate`]. An empty mapping is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Vector<R> {
    pub source_as: u32,
    #[serde(default, with = "value_list")]
    pub values: Option<VectorValues>,
    #[serde(skip)]
    role: PhantomData<R>,
}

pub type XVector = Vector<LinkTraffic>;
pub type ZVector = Vector<TunnelTraffic>;
pub type LocalRVector = Vector<TargetTraffic>;
pub type CVector = Vector<CompensationSignal>;

impl<R> Vector<R> {
    /// Empty vector for the given AS
    pub fn new(source_as: u32) -> Self {
        Self {
            source_as,
            values: Some(VectorValues::new()),
            role: PhantomData,
        }
    }

    /// Vector without a value mapping, as decoded from an incomplete message
    pub fn without_values(source_as: u32) -> Self {
        Self {
            source_as,
            values: None,
            role: PhantomData,
        }
    }

    pub fn from_values(source_as: u32, values: impl IntoIterator<Item = (LinkId, i64)>) -> Self {
        Self {
            source_as,
            values: Some(values.into_iter().collect()),
            role: PhantomData,
        }
    }

    /// Set the value for a link, replacing any previous one
    pub fn add(&mut self, link: LinkId, value: i64) {
        self.values
            .get_or_insert_with(VectorValues::new)
            .insert(link, value);
    }

    pub fn value_for(&self, link: &LinkId) -> Option<i64> {
        self.values.as_ref().and_then(|v| v.get(link).copied())
    }

    /// Iterate over (link, value) pairs in link order
    pub fn entries(&self) -> impl Iterator<Item = (&LinkId, i64)> {
        self.values.iter().flatten().map(|(link, value)| (link, *value))
    }

    pub fn links(&self) -> impl Iterator<Item = &LinkId> {
        self.values.iter().flat_map(|v| v.keys())
    }

    pub fn len(&self) -> usize {
        self.values.as_ref().map_or(0, |v| v.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sum of all components
    pub fn total(&self) -> i64 {
        self.entries().fold(0i64, |acc, (_, v)| acc.saturating_add(v))
    }

    /// Whether both vectors cover exactly the same links
    pub fn same_links<S>(&self, other: &Vector<S>) -> bool {
        self.len() == other.len() && self.links().eq(other.links())
    }

    /// Reject vectors that can never be processed
    pub fn validate(&self) -> Result<()> {
        if self.source_as == 0 {
            return Err(DtmError::InvalidAsNumber(self.source_as));
        }
        if self.values.is_none() {
            return Err(DtmError::MissingValues {
                as_number: self.source_as,
            });
        }
        Ok(())
    }
}

/// Weight in [0, 1] describing the cost share of one data center pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThetaCoefficient {
    pub value: f64,
    pub pair: Dc2DcCommunicationId,
}

impl ThetaCoefficient {
    pub fn new(value: f64, pair: Dc2DcCommunicationId) -> Self {
        Self { value, pair }
    }
}

/// Full reference vector as produced by the Economic Analyzer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RVector {
    #[serde(flatten)]
    pub vector: LocalRVector,
    #[serde(default)]
    pub thetas: Vec<ThetaCoefficient>,
}

impl RVector {
    pub fn new(source_as: u32) -> Self {
        Self {
            vector: LocalRVector::new(source_as),
            thetas: Vec::new(),
        }
    }

    pub fn from_parts(vector: LocalRVector, thetas: Vec<ThetaCoefficient>) -> Self {
        Self { vector, thetas }
    }

    pub fn source_as(&self) -> u32 {
        self.vector.source_as
    }

    pub fn add(&mut self, link: LinkId, value: i64) {
        self.vector.add(link, value);
    }

    pub fn add_theta(&mut self, theta: ThetaCoefficient) {
        self.thetas.push(theta);
    }

    pub fn value_for(&self, link: &LinkId) -> Option<i64> {
        self.vector.value_for(link)
    }

    /// Drop the cost-sharing weights
    pub fn local(&self) -> LocalRVector {
        self.vector.clone()
    }

    pub fn validate(&self) -> Result<()> {
        self.vector.validate()?;
        if let Some(theta) = self
            .thetas
            .iter()
            .find(|t| !t.value.is_finite() || !(0.0..=1.0).contains(&t.value))
        {
            return Err(DtmError::InvalidTheta { value: theta.value });
        }
        Ok(())
    }
}

/// A reference vector in either of its two forms
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ReferenceVector {
    Full(RVector),
    Local(LocalRVector),
}

impl ReferenceVector {
    pub fn source_as(&self) -> u32 {
        match self {
            ReferenceVector::Full(r) => r.source_as(),
            ReferenceVector::Local(r) => r.source_as,
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            ReferenceVector::Full(r) => r.validate(),
            ReferenceVector::Local(r) => r.validate(),
        }
    }
}

impl From<RVector> for ReferenceVector {
    fn from(r: RVector) -> Self {
        ReferenceVector::Full(r)
    }
}

impl From<LocalRVector> for ReferenceVector {
    fn from(r: LocalRVector) -> Self {
        ReferenceVector::Local(r)
    }
}

/// Serde helper: vector values travel as a list of {link, value} records
mod value_list {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::VectorValues;
    use crate::state::LinkId;

    #[derive(Serialize, Deserialize)]
    struct Entry {
        link: LinkId,
        value: i64,
    }

    pub fn serialize<S>(values: &Option<VectorValues>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        values
            .as_ref()
            .map(|values| {
                values
                    .iter()
                    .map(|(link, value)| Entry {
                        link: link.clone(),
                        value: *value,
                    })
                    .collect::<Vec<_>>()
            })
            .serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<VectorValues>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let entries = Option::<Vec<Entry>>::deserialize(deserializer)?;
        Ok(entries.map(|entries| entries.into_iter().map(|e| (e.link, e.value)).collect()))
    }
}
