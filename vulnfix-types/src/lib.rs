//! Shared data model for the vulnfix engine.
//!
//! This crate owns the types that cross component boundaries: the entities a
//! fix run acts on, the remediation advice attached to them, the change
//! records and outcomes flowing back up, and the `Workspace` capability all
//! file I/O goes through.

mod entity;
mod error;
mod outcome;
mod remediation;
mod workspace;

pub use entity::{EntityToFix, FixOptions, Identity, MISSING_TYPE};
pub use error::FixError;
pub use outcome::{
    ChangeRecord, EcosystemResult, FailedEntity, FailedToFix, FixMeta, FixedEntity, SkippedEntity,
};
pub use remediation::{
    PackageVersion, ParsePackageVersionError, PinEntry, PinInstruction, RemediationAdvice,
};
pub use workspace::{FsWorkspace, MemoryWorkspace, Workspace};
