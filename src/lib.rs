// Public API - data types, engines and the traffic manager
pub mod accounting;
pub mod compensation;
pub mod config;
pub mod dtm;
pub mod error;
pub mod export;
pub mod registry;
pub mod state;
pub mod store;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use config::Config;
pub use dtm::TrafficManager;
pub use error::{DtmError, Result};
