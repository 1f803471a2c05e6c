//! Transport collaborator delivering vectors and configuration.
//!
//! Implementations own the wire protocol (inter-SBox client, SDN REST
//! client). Every call reports its own outcome so a failed destination never
//! stops delivery to the remaining ones.

use anyhow::Result;
use futures::future::BoxFuture;
use std::fmt;

use crate::state::{CVector, ConfigData, RVector, SBox, SdnController};

/// Where a compensation vector goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// SBox of a remote domain
    Peer(SBox),
    /// SDN controller inside the local domain
    Controller(SdnController),
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Destination::Peer(sbox) => write!(f, "sbox {}", sbox.management_address.ip()),
            Destination::Controller(c) => {
                write!(f, "sdn controller {} ({}:{})", c.id, c.rest_host, c.rest_port)
            }
        }
    }
}

pub trait Transport: Send + Sync {
    /// Deliver a compensation vector, optionally with its reference vector
    fn send<'a>(
        &'a self,
        destination: &'a Destination,
        c_vector: &'a CVector,
        r_vector: Option<&'a RVector>,
    ) -> BoxFuture<'a, Result<()>>;

    /// Push configuration to an SDN controller
    fn configure<'a>(
        &'a self,
        controller: &'a SdnController,
        config: &'a ConfigData,
    ) -> BoxFuture<'a, Result<()>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RecordingTransport, controller, link1, sbox};

    #[test]
    fn test_recording_transport_outcomes() {
        let transport = RecordingTransport::new();
        transport.fail_for("sbox 2.2.2.2");
        let c_vector = CVector::from_values(1, [(link1(), 1)]);
        let ok = Destination::Peer(sbox("1.1.1.1/32", 1));
        let refused = Destination::Peer(sbox("2.2.2.2/32", 1));

        tokio_test::assert_ok!(tokio_test::block_on(transport.send(&ok, &c_vector, None)));
        tokio_test::assert_err!(tokio_test::block_on(transport.send(
            &refused, &c_vector, None
        )));
        tokio_test::assert_ok!(tokio_test::block_on(
            transport.configure(&controller("sdn1", "98.33.33.33"), &ConfigData::default())
        ));

        assert_eq!(transport.attempts(), 2);
        assert_eq!(transport.send_count(), 1);
        assert_eq!(transport.configured().len(), 1);
    }

    #[test]
    fn test_destination_display() {
        let peer = Destination::Peer(SBox::new("1.1.1.1/32".parse().unwrap(), vec![1]));
        assert_eq!(peer.to_string(), "sbox 1.1.1.1");

        let controller = Destination::Controller(SdnController {
            id: "sdn1".into(),
            rest_host: "98.33.33.33".parse().unwrap(),
            rest_port: 9090,
        });
        assert_eq!(controller.to_string(), "sdn controller sdn1 (98.33.33.33:9090)");
    }
}
