//! # Declarative
//!
//! A framework for reconciling declared configuration with objects that live
//! behind a remote API.
//!
//! ## Core Concepts
//!
//! - **ResourceSchema**: Field declarations (required, optional, defaults)
//! - **ResourceCodec**: Pure encode/decode between a typed config record and the API entity
//! - **RemoteApi**: Batch create/get/update/delete, implemented by an API client
//! - **Reconciler**: Create/Read/Update/Delete with exactly-one-match reads and a
//!   re-read after every write
//! - **ExecutionPlan**: Per-address actions computed by diffing against the server
//! - **Executor**: Applies a plan with bounded parallelism
//!
//! ## Example
//!
//! ```ignore
//! use declarative::{Reconciler, build_plan, execute, ExecuteOptions, NoProgress, AutoConfirm};
//!
//! let reconciler = Reconciler::new(&codec, &api);
//!
//! // Single object
//! let state = reconciler.create(&config)?;
//! let config = reconciler.read(state.id().unwrap())?;
//!
//! // Many objects, keyed by address
//! let plan = build_plan(&reconciler, &desired, &tracked)?;
//! let report = execute(&reconciler, plan, &ExecuteOptions::default(), &mut NoProgress, &mut AutoConfirm);
//! ```
//!
//! ## Provider Traits
//!
//! The crate uses traits for dependency injection:
//!
//! - [`RemoteApi`]: Remote CRUD transport
//! - [`ProgressCallback`]: Receives progress updates
//! - [`ConfirmCallback`]: Handles user confirmations
//!
//! [`mock::MockApi`] is an in-memory [`RemoteApi`] for tests.

pub mod client;
pub mod codec;
pub mod context;
pub mod diff;
pub mod error;
pub mod executor;
pub mod mock;
pub mod planner;
pub mod reconciler;
pub mod schema;
pub mod types;

// Re-export main types at crate root
pub use client::{GetQuery, RemoteApi, RemoteEntity};
pub use codec::{EnumTable, ResourceCodec, decode_flag, encode_flag};
pub use context::{AutoConfirm, AutoDecline, ConfirmCallback, NoProgress, ProgressCallback};
pub use diff::{FieldChange, diff_fields};
pub use error::{Error, Operation, Result};
pub use executor::{ChangeOutcome, ExecuteReport, StateUpdate, execute};
pub use planner::{Action, ExecutionPlan, PlanSummary, PlannedChange, build_plan};
pub use reconciler::Reconciler;
pub use schema::{DefaultValue, FieldKind, FieldSpec, ResourceSchema};
pub use types::{ApplyResult, ExecuteOptions, ExecuteSummary, ReadOutcome, ResourceState};
