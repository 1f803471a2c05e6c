use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::compensation::{BillingParameters, CompensationHistory, DirectCalculator, LocalConstructor};
use crate::dtm::SuppressionGate;
use crate::error::Result;
use crate::state::{CVector, LocalRVector, RVector, SBox, SdnController, XVector};
use crate::store::Store;
use crate::transport::{Destination, Transport};

/// Collaborators shared by every unit of work
pub struct UnitContext {
    pub transport: Arc<dyn Transport>,
    pub gate: Arc<dyn SuppressionGate>,
    pub history: Arc<CompensationHistory>,
    pub store: Arc<dyn Store>,
    pub calculator: DirectCalculator,
    pub constructor: LocalConstructor,
}

impl UnitContext {
    pub fn new(
        transport: Arc<dyn Transport>,
        gate: Arc<dyn SuppressionGate>,
        history: Arc<CompensationHistory>,
        store: Arc<dyn Store>,
    ) -> Self {
        Self {
            transport,
            gate,
            history,
            store,
            calculator: DirectCalculator::new(),
            constructor: LocalConstructor::new(),
        }
    }
}

/// One independent unit of vector processing
#[derive(Debug, Clone)]
pub enum VectorTask {
    /// Compute compensation from a full reference and share both vectors
    ShareWithReference {
        x_vector: XVector,
        r_vector: RVector,
        peers: Vec<SBox>,
    },
    /// Build compensation from a local reference and the billing parameters
    CompensateLocally {
        x_vector: XVector,
        r_vector: LocalRVector,
        peers: Vec<SBox>,
    },
    /// Send a compensation vector computed elsewhere
    SendPrepared { c_vector: CVector, peers: Vec<SBox> },
    /// Push vectors received from a remote SBox to the local SDN controllers
    ForwardToControllers {
        c_vector: CVector,
        r_vector: Option<RVector>,
        controllers: Vec<SdnController>,
    },
}

/// How a unit ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitOutcome {
    /// No compensation could be calculated from the inputs
    NothingToSend,
    /// Building the compensation vector failed
    Failed,
    /// The same vector was already sent
    Suppressed,
    Delivered { delivered: usize, failed: usize },
}

impl VectorTask {
    pub fn as_number(&self) -> u32 {
        match self {
            VectorTask::ShareWithReference { x_vector, .. }
            | VectorTask::CompensateLocally { x_vector, .. } => x_vector.source_as,
            VectorTask::SendPrepared { c_vector, .. }
            | VectorTask::ForwardToControllers { c_vector, .. } => c_vector.source_as,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            VectorTask::ShareWithReference { .. } => "share_with_reference",
            VectorTask::CompensateLocally { .. } => "compensate_locally",
            VectorTask::SendPrepared { .. } => "send_prepared",
            VectorTask::ForwardToControllers { .. } => "forward_to_controllers",
        }
    }

    /// Execute the unit. Failures end the unit and are logged, never returned.
    pub async fn run(self, ctx: &UnitContext) -> UnitOutcome {
        let as_number = self.as_number();
        match self {
            VectorTask::ShareWithReference {
                x_vector,
                r_vector,
                peers,
            } => {
                info!(as_number, "running compensation vector calculation");
                let Some(compensation) = ctx.calculator.calculate(&x_vector, &r_vector) else {
                    info!(as_number, "no compensation vector for these inputs");
                    return UnitOutcome::NothingToSend;
                };
                ctx.history.store(&compensation.vector, &compensation.shares);

                let destinations: Vec<Destination> =
                    peers.into_iter().map(Destination::Peer).collect();
                deliver(ctx, &destinations, &compensation.vector, Some(&r_vector)).await
            }
            VectorTask::CompensateLocally {
                x_vector,
                r_vector,
                peers,
            } => {
                info!(as_number, "constructing compensation vector from local reference");
                let c_vector = match construct(ctx, &x_vector, &r_vector) {
                    Ok(c_vector) => c_vector,
                    Err(e) => {
                        error!(as_number, error = %e, "compensation vector was not constructed");
                        return UnitOutcome::Failed;
                    }
                };
                send_gated(ctx, c_vector, peers).await
            }
            VectorTask::SendPrepared { c_vector, peers } => {
                info!(as_number, "using prepared compensation vector");
                send_gated(ctx, c_vector, peers).await
            }
            VectorTask::ForwardToControllers {
                c_vector,
                r_vector,
                controllers,
            } => {
                let destinations: Vec<Destination> = controllers
                    .into_iter()
                    .map(Destination::Controller)
                    .collect();
                deliver(ctx, &destinations, &c_vector, r_vector.as_ref()).await
            }
        }
    }
}

fn construct(ctx: &UnitContext, x_vector: &XVector, r_vector: &LocalRVector) -> Result<CVector> {
    let params = BillingParameters::resolve(ctx.store.as_ref(), r_vector)?;
    ctx.constructor.construct(x_vector, r_vector, &params)
}

async fn send_gated(ctx: &UnitContext, c_vector: CVector, peers: Vec<SBox>) -> UnitOutcome {
    ctx.history.store(&c_vector, &[]);
    if !ctx.gate.claim(&c_vector) {
        info!(
            as_number = c_vector.source_as,
            "update not required, will not send any updates"
        );
        return UnitOutcome::Suppressed;
    }
    let destinations: Vec<Destination> = peers.into_iter().map(Destination::Peer).collect();
    deliver(ctx, &destinations, &c_vector, None).await
}

/// Send to each destination in turn; one failure never stops the rest
async fn deliver(
    ctx: &UnitContext,
    destinations: &[Destination],
    c_vector: &CVector,
    r_vector: Option<&RVector>,
) -> UnitOutcome {
    if destinations.is_empty() {
        warn!(
            as_number = c_vector.source_as,
            "no destinations found, will not send any updates"
        );
    }

    let mut delivered = 0;
    let mut failed = 0;
    for destination in destinations {
        debug!(%destination, with_reference = r_vector.is_some(), "sending vectors");
        match ctx.transport.send(destination, c_vector, r_vector).await {
            Ok(()) => delivered += 1,
            Err(e) => {
                warn!(%destination, error = %e, "failed to send vectors");
                failed += 1;
            }
        }
    }
    UnitOutcome::Delivered { delivered, failed }
}
