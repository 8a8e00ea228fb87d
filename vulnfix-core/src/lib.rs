//! Embeddable fix orchestration for vulnfix.
//!
//! The entry point is [`fix`]: group entities by ecosystem, dispatch each
//! group with bounded concurrency, fold the immutable partial results, and
//! render the run summary. All I/O happens through the per-entity
//! `Workspace` capability; this crate is CLI-free and installs no tracing
//! subscriber.

mod ecosystems;
mod npm;
mod orchestrator;

pub use ecosystems::{EcosystemKind, UnknownEcosystem};
pub use orchestrator::{ECOSYSTEM_CONCURRENCY, FixReport, fix, group_entities_by_ecosystem};
