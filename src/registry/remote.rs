use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{DtmError, Result};
use crate::state::SBox;
use crate::store::Store;

/// Remote SBoxes per AS number, cached from storage
pub struct RemoteSBoxContainer {
    store: Arc<dyn Store>,
    cache: RwLock<HashMap<u32, Vec<SBox>>>,
}

impl RemoteSBoxContainer {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Remote SBoxes to update for the given AS, loaded on first use.
    ///
    /// A storage failure here is logged and yields an empty list; use
    /// [`RemoteSBoxContainer::load`] to see the error.
    pub fn get_remote_sboxes(&self, as_number: u32) -> Vec<SBox> {
        // Check cache first
        {
            let cache = self.cache.read();
            if let Some(sboxes) = cache.get(&as_number) {
                return sboxes.clone();
            }
        }

        match self.load(as_number) {
            Ok(sboxes) => sboxes,
            Err(e) => {
                warn!(as_number, error = %e, "failed to load remote SBoxes");
                Vec::new()
            }
        }
    }

    /// Load the SBoxes of one AS from storage, replacing the cached entry
    pub fn load(&self, as_number: u32) -> Result<Vec<SBox>> {
        let sboxes = self
            .store
            .find_remote_sboxes(as_number)
            .map_err(DtmError::Storage)?;
        debug!(as_number, count = sboxes.len(), "loaded remote SBoxes");
        self.cache.write().insert(as_number, sboxes.clone());
        Ok(sboxes)
    }

    /// Reload every AS seen so far. On failure the previous entries stay.
    pub fn refresh(&self) -> Result<()> {
        let as_numbers: Vec<u32> = self.cache.read().keys().copied().collect();
        let mut fresh = HashMap::with_capacity(as_numbers.len());
        for as_number in as_numbers {
            let sboxes = self
                .store
                .find_remote_sboxes(as_number)
                .map_err(DtmError::Storage)?;
            fresh.insert(as_number, sboxes);
        }
        *self.cache.write() = fresh;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use crate::testing::FailingStore;

    fn sbox(address: &str, as_number: u32) -> SBox {
        SBox::new(address.parse().unwrap(), vec![as_number])
    }

    #[test]
    fn test_loads_on_first_use_and_caches() {
        let store = Arc::new(InMemoryStore::new());
        store.put_sbox(sbox("1.1.1.1/32", 1));
        store.put_sbox(sbox("2.2.2.2/32", 1));
        let container = RemoteSBoxContainer::new(store.clone());

        assert_eq!(container.get_remote_sboxes(1).len(), 2);

        // Cached: a new row is not visible until refresh
        store.put_sbox(sbox("3.3.3.3/32", 1));
        assert_eq!(container.get_remote_sboxes(1).len(), 2);

        container.refresh().unwrap();
        let sboxes = container.get_remote_sboxes(1);
        assert_eq!(sboxes.len(), 3);
        assert_eq!(sboxes[2].management_address.ip().to_string(), "3.3.3.3");
    }

    #[test]
    fn test_unknown_as_gives_empty_list() {
        let container = RemoteSBoxContainer::new(Arc::new(InMemoryStore::new()));
        assert!(container.get_remote_sboxes(42).is_empty());
    }

    #[test]
    fn test_storage_failure() {
        let container = RemoteSBoxContainer::new(Arc::new(FailingStore));
        assert!(container.get_remote_sboxes(1).is_empty());
        let err = container.load(1).unwrap_err();
        assert!(matches!(err, DtmError::Storage(_)));
    }
}
