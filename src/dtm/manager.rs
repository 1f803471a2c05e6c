use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

use crate::compensation::CompensationHistory;
use crate::config::Config;
use crate::dtm::{SuppressionGate, UnitContext, UpdateSuppressor, VectorScheduler, VectorTask};
use crate::error::Result;
use crate::registry::{RemoteSBoxContainer, SdnControllerContainer};
use crate::state::{CVector, RVector, ReferenceVector, XVector};
use crate::store::Store;
use crate::transport::Transport;

/// Most recent vectors received for one AS
#[derive(Debug, Default)]
struct LatestVectors {
    x_vector: Option<XVector>,
    r_vector: Option<ReferenceVector>,
}

/// Entry point for vector updates.
///
/// Every update is validated on the caller's thread; invalid input returns an
/// error and schedules nothing. Valid updates turn into [`VectorTask`]s that
/// run on the scheduler, so no entry point waits on network I/O.
pub struct TrafficManager {
    scheduler: VectorScheduler,
    context: Arc<UnitContext>,
    remote_sboxes: RemoteSBoxContainer,
    controllers: SdnControllerContainer,
    latest: Mutex<HashMap<u32, LatestVectors>>,
}

impl TrafficManager {
    pub fn new(
        config: &Config,
        handle: Handle,
        store: Arc<dyn Store>,
        transport: Arc<dyn Transport>,
    ) -> Result<Self> {
        let gate = Arc::new(UpdateSuppressor::new(config.suppression));
        Self::with_gate(config, handle, store, transport, gate)
    }

    /// Like [`TrafficManager::new`] with a caller supplied suppression gate
    pub fn with_gate(
        config: &Config,
        handle: Handle,
        store: Arc<dyn Store>,
        transport: Arc<dyn Transport>,
        gate: Arc<dyn SuppressionGate>,
    ) -> Result<Self> {
        config.validate()?;

        let context = Arc::new(UnitContext::new(
            transport,
            gate,
            Arc::new(CompensationHistory::new()),
            store.clone(),
        ));
        Ok(Self {
            scheduler: VectorScheduler::new(config.pool_size, handle, context.clone()),
            context,
            remote_sboxes: RemoteSBoxContainer::new(store.clone()),
            controllers: SdnControllerContainer::new(store),
            latest: Mutex::new(HashMap::new()),
        })
    }

    /// Load both registries and push configuration to every SDN controller.
    ///
    /// Storage failures are returned; a controller rejecting its
    /// configuration is logged and the remaining ones are still configured.
    pub async fn initialize(&self) -> Result<()> {
        self.controllers.populate_controllers_from_db()?;
        self.remote_sboxes.refresh()?;

        let jobs: Vec<_> = self
            .controllers
            .get_all_controllers()
            .into_iter()
            .map(|controller| {
                let config = self.controllers.config_data_for(&controller.id);
                (controller, config)
            })
            .collect();

        // Configure all controllers concurrently
        let futures: Vec<_> = jobs
            .iter()
            .map(|(controller, config)| async move {
                (
                    controller,
                    config,
                    self.context.transport.configure(controller, config).await,
                )
            })
            .collect();
        let results = futures::future::join_all(futures).await;

        for (controller, config, result) in results {
            match result {
                Ok(()) => info!(
                    controller = %controller.id,
                    communications = config.entries.len(),
                    "configured SDN controller"
                ),
                Err(e) => warn!(
                    controller = %controller.id,
                    error = %e,
                    "failed to configure SDN controller"
                ),
            }
        }
        Ok(())
    }

    /// New measured traffic for an AS
    pub fn update_x_vector(&self, x_vector: XVector) -> Result<()> {
        x_vector.validate()?;
        let as_number = x_vector.source_as;
        info!(as_number, "received new link traffic vector");

        let reference = {
            let mut latest = self.latest.lock();
            let entry = latest.entry(as_number).or_default();
            entry.x_vector = Some(x_vector.clone());
            entry.r_vector.clone()
        };

        match reference {
            Some(r_vector) => self.schedule(x_vector, r_vector),
            None => debug!(as_number, "no reference vector yet"),
        }
        Ok(())
    }

    /// New reference for an AS, either full (with theta coefficients) or local
    pub fn update_r_vector(&self, r_vector: impl Into<ReferenceVector>) -> Result<()> {
        let r_vector = r_vector.into();
        r_vector.validate()?;
        let as_number = r_vector.source_as();
        info!(as_number, "received new reference vector");

        let measured = {
            let mut latest = self.latest.lock();
            let entry = latest.entry(as_number).or_default();
            entry.r_vector = Some(r_vector.clone());
            entry.x_vector.clone()
        };

        match measured {
            Some(x_vector) => self.schedule(x_vector, r_vector),
            None => debug!(as_number, "no link traffic vector yet"),
        }
        Ok(())
    }

    /// Compensation vector computed elsewhere, to be sent to the peers
    pub fn update_c_vector(&self, c_vector: CVector) -> Result<()> {
        c_vector.validate()?;
        let peers = self.remote_sboxes.get_remote_sboxes(c_vector.source_as);
        self.scheduler
            .submit(VectorTask::SendPrepared { c_vector, peers });
        Ok(())
    }

    /// Vectors received from a remote SBox, forwarded to the local SDN
    /// controllers
    pub fn update_vectors_from_peer(
        &self,
        c_vector: CVector,
        r_vector: Option<RVector>,
    ) -> Result<()> {
        c_vector.validate()?;
        if let Some(r_vector) = &r_vector {
            r_vector.validate()?;
        }
        let controllers = self.controllers.get_all_controllers();
        self.scheduler.submit(VectorTask::ForwardToControllers {
            c_vector,
            r_vector,
            controllers,
        });
        Ok(())
    }

    fn schedule(&self, x_vector: XVector, r_vector: ReferenceVector) {
        let peers = self.remote_sboxes.get_remote_sboxes(x_vector.source_as);
        let task = match r_vector {
            ReferenceVector::Full(r_vector) => VectorTask::ShareWithReference {
                x_vector,
                r_vector,
                peers,
            },
            ReferenceVector::Local(r_vector) => VectorTask::CompensateLocally {
                x_vector,
                r_vector,
                peers,
            },
        };
        self.scheduler.submit(task);
    }

    /// Wait until every scheduled unit has finished
    pub async fn drain(&self) {
        self.scheduler.drain().await;
    }

    pub async fn shutdown(&self) {
        self.scheduler.shutdown().await;
    }

    pub fn scheduler(&self) -> &VectorScheduler {
        &self.scheduler
    }

    pub fn history(&self) -> &CompensationHistory {
        &self.context.history
    }

    pub fn remote_sboxes(&self) -> &RemoteSBoxContainer {
        &self.remote_sboxes
    }

    pub fn controllers(&self) -> &SdnControllerContainer {
        &self.controllers
    }
}
