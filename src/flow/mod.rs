//! Saga-style flow engine.
//!
//! A flow is a named, immutable graph of nodes. Each node runs a step
//! processor against a shared context, classifies the remote outcome into a
//! [`ResultStatus`], and applies a transition rule that either continues to
//! the next node, suspends the execution, or ends the flow.
//!
//! # Execution model
//!
//! ```text
//! execute ──▶ start ──▶ phase ──▶ ... ──▶ end (stamp final status)
//!               │          │
//!               ▼          ▼
//!            suspend    suspend ──▶ resume (external trigger)
//! ```
//!
//! # Safety Invariants
//!
//! 1. **Persist-Before-Call**: the context is snapshotted to the store
//!    before every processor invocation and after every transition
//! 2. **Indeterminate ≠ Failed**: a `Processing` outcome suspends the
//!    execution, it never settles it
//! 3. **Terminal Is Final**: a finished context is returned untouched, no
//!    further remote calls are issued for it
//! 4. **Defects Escape, Outcomes Don't**: business results flow through
//!    `ResultStatus`; only programmer errors surface as `Err`

pub mod definition;
pub mod engine;
pub mod error;
pub mod processor;
pub mod store;

// Re-exports for convenience
pub use definition::{FlowBuilder, FlowDefinition, NodeKind, Transition, TransitionFn};
pub use engine::FlowEngine;
pub use error::{FlowError, StoreError};
pub use processor::{ResultStatus, StepProcessor};
pub use store::{ContextStore, MemoryStore, StoredContext};

use std::fmt;

/// Unit of work driven through a flow.
///
/// Persistence snapshots are explicit clones, never aliases shared with the
/// caller after `execute` returns.
pub trait FlowContext: Clone + fmt::Debug + Send + Sync + 'static {
    /// Instance identifier, unique per saga instance; the persistence key.
    fn biz_no(&self) -> &str;

    /// Whether the instance already reached a terminal status.
    fn finished(&self) -> bool;
}
