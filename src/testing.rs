//! Shared test doubles and fixtures.

use anyhow::{Result, bail};
use futures::FutureExt;
use futures::future::BoxFuture;
use parking_lot::Mutex;
use std::collections::HashSet;

use crate::state::{
    CVector, ConfigData, Dc2DcCommunication, Dc2DcCommunicationId, Direction, Link, LinkId,
    RVector, SBox, SdnController, SystemControlParameters, Tunnel, TunnelId,
};
use crate::store::Store;
use crate::transport::{Destination, Transport};

/// Store whose every read fails
pub struct FailingStore;

impl Store for FailingStore {
    fn find_remote_sboxes(&self, _as_number: u32) -> Result<Vec<SBox>> {
        bail!("storage unavailable")
    }

    fn find_all_dc2dc_communications(&self) -> Result<Vec<Dc2DcCommunication>> {
        bail!("storage unavailable")
    }

    fn find_link(&self, _id: &LinkId) -> Result<Option<Link>> {
        bail!("storage unavailable")
    }

    fn find_last_control_parameters(&self) -> Result<Option<SystemControlParameters>> {
        bail!("storage unavailable")
    }
}

/// One successful delivery seen by [`RecordingTransport`]
#[derive(Debug, Clone)]
pub struct SentVector {
    pub destination: Destination,
    pub c_vector: CVector,
    pub r_vector: Option<RVector>,
}

/// Transport recording every call; destinations can be told to fail
#[derive(Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<SentVector>>,
    attempts: Mutex<usize>,
    configured: Mutex<Vec<(String, ConfigData)>>,
    failing: Mutex<HashSet<String>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make deliveries to the destination with this display name fail
    pub fn fail_for(&self, destination: &str) {
        self.failing.lock().insert(destination.to_string());
    }

    pub fn sent(&self) -> Vec<SentVector> {
        self.sent.lock().clone()
    }

    pub fn send_count(&self) -> usize {
        self.sent.lock().len()
    }

    pub fn attempts(&self) -> usize {
        *self.attempts.lock()
    }

    pub fn configured(&self) -> Vec<(String, ConfigData)> {
        self.configured.lock().clone()
    }
}

impl Transport for RecordingTransport {
    fn send<'a>(
        &'a self,
        destination: &'a Destination,
        c_vector: &'a CVector,
        r_vector: Option<&'a RVector>,
    ) -> BoxFuture<'a, Result<()>> {
        async move {
            *self.attempts.lock() += 1;
            if self.failing.lock().contains(&destination.to_string()) {
                bail!("connection refused by {}", destination);
            }
            self.sent.lock().push(SentVector {
                destination: destination.clone(),
                c_vector: c_vector.clone(),
                r_vector: r_vector.cloned(),
            });
            Ok(())
        }
        .boxed()
    }

    fn configure<'a>(
        &'a self,
        controller: &'a SdnController,
        config: &'a ConfigData,
    ) -> BoxFuture<'a, Result<()>> {
        async move {
            if self.failing.lock().contains(&controller.id) {
                bail!("controller {} rejected configuration", controller.id);
            }
            self.configured
                .lock()
                .push((controller.id.clone(), config.clone()));
            Ok(())
        }
        .boxed()
    }
}

pub fn link1() -> LinkId {
    LinkId::new("link1", "isp1")
}

pub fn link2() -> LinkId {
    LinkId::new("link2", "isp1")
}

pub fn sbox(address: &str, as_number: u32) -> SBox {
    SBox::new(address.parse().unwrap(), vec![as_number])
}

pub fn controller(id: &str, host: &str) -> SdnController {
    SdnController {
        id: id.to_string(),
        rest_host: host.parse().unwrap(),
        rest_port: 9090,
    }
}

/// Outbound communication from AS 1 to AS 2 with one tunnel over link1
pub fn communication(sequence: u32, controller: SdnController) -> Dc2DcCommunication {
    Dc2DcCommunication {
        id: Dc2DcCommunicationId {
            sequence,
            direction: Direction::Outbound,
            local_as: 1,
            local_dc: "dc1".into(),
            remote_as: 2,
            remote_dc: "dc2".into(),
        },
        controller,
        tunnels: vec![Tunnel {
            id: TunnelId::new(format!("tunnel{}", sequence), link1()),
            source: "10.1.1.1".parse().unwrap(),
            destination: "10.2.2.2".parse().unwrap(),
        }],
    }
}
