//! fizzquirk-core: Core logic library for fizzquirk.
//!
//! This crate contains the durable theme queue, the generation policy and the
//! pipeline orchestrator. No CLI, no process bootstrapping and no concrete
//! platform clients live here; those belong to the `fizzquirk` binary crate,
//! which plugs its adapters into the traits defined in [`contract`].
//!
//! # Usage
//! Add this crate as a dependency and implement the [`contract`] traits for
//! your collaborators, or use the mocks exported under the
//! `test-export-mocks` feature in tests.

pub mod contract;
pub mod error;
pub mod generate;
pub mod pipeline;
pub mod queue;
pub mod store;
pub mod theme;
