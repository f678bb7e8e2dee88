//! Pluggable distributed MapReduce for Rust.
//!
//! A deployment is made of four kinds of stateless-over-HTTP services:
//! - **Orchestrator**: accepts jobs, drives their pipelines and keeps their
//!   records.
//! - **Mapper**: applies an algorithm's `map` to a chunk of input lines.
//! - **Partitioner**: buckets mapped records by a hash of their key.
//! - **Reducer**: applies an algorithm's `reduce` to each run of equal keys in
//!   a partition.
//!
//! All services are generic over an [`AlgorithmKind`](crate::algorithm::AlgorithmKind),
//! a registry that maps algorithm names to statically linked implementations
//! of the [`Algorithm`](crate::algorithm::Algorithm) interface. A job names
//! the algorithm it wants to run and every service resolves that name against
//! its registry.
//!
//! # How to use this crate
//!
//! ## Defining algorithms
//!
//! ```
//! use anyhow::Result;
//! use mapreduce::{
//!     algorithm::{Algorithm, AlgorithmKind, Emitter},
//!     algorithm_derive::AlgorithmKind,
//! };
//!
//! #[derive(Debug, Default, Clone, Copy)]
//! struct CharCount;
//!
//! impl Algorithm for CharCount {
//!     fn map(&self, line: &str, emit: &mut Emitter) -> Result<()> {
//!         for c in line.chars().filter(|c| !c.is_whitespace()) {
//!             emit.emit(c, 1);
//!         }
//!         Ok(())
//!     }
//!
//!     fn reduce(&self, key: &str, values: Vec<String>) -> Result<Option<Vec<String>>> {
//!         Ok(Some(vec![format!("{key}\t{}", values.len())]))
//!     }
//! }
//!
//! #[derive(AlgorithmKind, Debug, Clone, Copy)]
//! enum Registry {
//!     #[algorithm(name = "charcount")]
//!     CharCount(CharCount),
//! }
//!
//! # fn main() {
//! assert!(Registry::resolve("charcount").is_some());
//! # }
//! ```
//!
//! ## Serving
//!
//! Workers and the orchestrator are plain [`axum`] routers, see
//! [`service`]. The orchestrator can also be driven in-process through
//! [`Orchestrator`](crate::orchestrator::Orchestrator) paired with
//! [`InMemoryWorkers`](crate::client::InMemoryWorkers), which runs the full
//! pipeline without sockets.
pub mod algorithm;
pub mod api;
pub mod client;
pub mod config;
pub mod job;
pub mod mapper;
pub mod orchestrator;
pub mod output;
pub mod partition;
pub mod record;
pub mod reducer;
pub mod service;
pub mod algorithm_derive {
    pub use mapreduce_algorithm_derive::*;
}
pub use async_trait::async_trait;
pub use tracing;

#[doc(hidden)]
pub mod __private {
    pub use anyhow;
}

#[cfg(test)]
mod testing;
