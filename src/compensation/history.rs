use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::compensation::PairShare;
use crate::state::CVector;

/// A compensation vector as it was computed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompensationRecord {
    pub recorded_at: DateTime<Utc>,
    pub vector: CVector,
    #[serde(default)]
    pub shares: Vec<PairShare>,
}

/// Log of computed compensation vectors, oldest first
#[derive(Debug, Default)]
pub struct CompensationHistory {
    records: Mutex<Vec<CompensationRecord>>,
}

impl CompensationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&self, vector: &CVector, shares: &[PairShare]) {
        self.records.lock().push(CompensationRecord {
            recorded_at: Utc::now(),
            vector: vector.clone(),
            shares: shares.to_vec(),
        });
    }

    pub fn records(&self) -> Vec<CompensationRecord> {
        self.records.lock().clone()
    }

    pub fn latest(&self) -> Option<CompensationRecord> {
        self.records.lock().last().cloned()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}
