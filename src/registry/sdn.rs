use parking_lot::RwLock;
use std::sync::Arc;
use tracing::info;

use crate::error::{DtmError, Result};
use crate::state::{ConfigData, Dc2DcCommunication, SdnController};
use crate::store::Store;

/// A controller together with the communications it owns
struct ControllerEntry {
    controller: SdnController,
    communications: Vec<Dc2DcCommunication>,
}

/// SDN controllers of the local domain, grouped from the configured
/// data center communications
pub struct SdnControllerContainer {
    store: Arc<dyn Store>,
    entries: RwLock<Vec<ControllerEntry>>,
}

impl SdnControllerContainer {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Load all communications and group them by owning controller.
    ///
    /// Replaces the previous content, so loading twice never duplicates a
    /// controller.
    pub fn populate_controllers_from_db(&self) -> Result<()> {
        let communications = self
            .store
            .find_all_dc2dc_communications()
            .map_err(DtmError::Storage)?;

        let mut entries: Vec<ControllerEntry> = Vec::new();
        for communication in communications {
            match entries
                .iter_mut()
                .find(|e| e.controller.id == communication.controller.id)
            {
                Some(entry) => entry.communications.push(communication),
                None => entries.push(ControllerEntry {
                    controller: communication.controller.clone(),
                    communications: vec![communication],
                }),
            }
        }

        info!(controllers = entries.len(), "loaded SDN controllers");
        *self.entries.write() = entries;
        Ok(())
    }

    pub fn get_all_controllers(&self) -> Vec<SdnController> {
        self.entries
            .read()
            .iter()
            .map(|e| e.controller.clone())
            .collect()
    }

    pub fn communications_for(&self, controller_id: &str) -> Vec<Dc2DcCommunication> {
        self.entries
            .read()
            .iter()
            .find(|e| e.controller.id == controller_id)
            .map(|e| e.communications.clone())
            .unwrap_or_default()
    }

    /// Configuration to push to the controller
    pub fn config_data_for(&self, controller_id: &str) -> ConfigData {
        ConfigData::from_communications(&self.communications_for(controller_id))
    }
}
