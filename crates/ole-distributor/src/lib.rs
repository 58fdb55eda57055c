//! Epoch-based reward distribution with linear vesting, penalty exit, and
//! conversion into governance locks.
//!
//! [`Distributor`] owns all persistent state. Collaborators (token ledgers,
//! membership verifier, price oracle, governance lock) are injected as trait
//! objects from `ole-core`; the exit curve defaults to
//! [`ole_curve::PenaltyCurve`].
//!
//! Every state-changing operation is all-or-nothing: on any error the state
//! and event log are exactly as they were before the call.

pub mod config;
pub mod convert;
pub mod distributor;
pub mod events;
pub mod exit;
pub mod ledger;
pub mod logging;
pub mod registry;
pub mod state;
pub mod vesting;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use config::{ConfigError, DistributorConfig, Settings};
pub use convert::Conversion;
pub use distributor::{Collaborators, Distributor};
pub use events::DistributorEvent;
pub use registry::NewEpoch;
pub use state::DistributorState;
