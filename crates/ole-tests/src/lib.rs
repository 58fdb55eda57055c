//! Cross-crate test suite for the OLE reward distributor.
//!
//! Scenario tests in `tests/e2e.rs` replay full epoch lifecycles against the
//! in-memory collaborators; `tests/adversarial.rs` drives randomized
//! operation sequences and checks the accounting invariants after each step.

pub mod helpers;
