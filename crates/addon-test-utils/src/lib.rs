//! Shared test utilities for the add-on checker workspace.
//!
//! This crate provides standardised fixtures to eliminate duplication across
//! crate test suites. It is a dev-dependency only — never published.
//!
//! # Modules
//!
//! - [`catalog`] — in-memory add-ons, snapshots and the circular-dependency fixture
//! - [`repo`] — [`TestRepo`](repo::TestRepo) builder for add-on directories and catalog files

pub mod catalog;
pub mod repo;

pub use catalog::{addon, branch, circular_fixture, record, snapshot, snapshots};
pub use repo::TestRepo;
