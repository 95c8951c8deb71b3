//! Integration test crate for the dtranche deployment tooling.
//!
//! This crate has no library code. Its tests drive whole orchestrator
//! runs against the in-memory ledger, including aborted runs that are
//! resumed by a fresh process reading the same deployment record.
//!
//! Run all integration tests:
//! ```sh
//! cargo test -p dtranche-integration-tests
//! ```
