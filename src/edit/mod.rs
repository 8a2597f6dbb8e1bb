// mass-file-edit: batch file edits across hosted repositories
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Batch edit engine.
//!
//! # Architecture
//!
//! ```text
//! EditRequest
//!      |
//!      v
//!  resolver ----> [RepositoryTarget]      (explicit + topic search, dedup)
//!      |
//!      v
//!  MassFileEditor (Semaphore + JoinSet, CancellationToken)
//!      |
//!      +--> pipeline (per repository)
//!      |       branch -> executor x N ops -> pull request?
//!      v
//!  BatchSummary
//! ```
//!
//! # Key Types
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`EditRequest`] | Validated selectors, operations and commit settings |
//! | [`FileOperation`] | Replace, append, prepend or delete one file |
//! | [`MassFileEditor`] | Runs a request across all resolved repositories |
//! | [`RepoEditOutcome`] | What happened in one repository |
//! | [`BatchSummary`] | Counters plus every outcome, serializable as JSON |
//!
//! Operations in one repository run strictly in order on one working branch;
//! repositories are independent of each other.

pub mod batch;
pub mod executor;
pub mod model;
pub mod pipeline;
pub mod request;
pub mod resolver;

#[cfg(test)]
pub(crate) mod fake;


pub use batch::{BatchEvent, MassFileEditor};
pub use model::{
    BatchMessage, BatchMessageKind, BatchSummary, BranchAction, FileErrorKind, FileOutcome,
    FileStatus, RepoEditOutcome, RepoFailureKind, RepositoryTarget,
};
pub use request::{
    EditRequest, FileOperation, OperationKind, RawEditRequest, RawFileOperation,
    RepositorySelectors,
};
pub use resolver::Resolution;
