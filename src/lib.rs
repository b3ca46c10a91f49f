//! ledgerflow - Saga-style flow engine for cross-system transfers
//!
//! Drives a multi-step financial transfer to a consistent terminal outcome
//! against a remote ledger that can reply success, failure, "still
//! processing", or time out entirely.
//!
//! # Modules
//!
//! - [`flow`] - The flow engine: definitions, step processors, context
//!   store, suspension and resumption
//! - [`ledger`] - Remote ledger collaborator contract and injectable mocks
//! - [`transfer`] - The transfer saga built on top of the engine
//! - [`config`] - YAML application configuration
//! - [`logging`] - Tracing initialization

pub mod config;
pub mod flow;
pub mod ledger;
pub mod logging;
pub mod transfer;

// Convenient re-exports at crate root
pub use flow::{
    ContextStore, FlowContext, FlowDefinition, FlowEngine, FlowError, MemoryStore, ResultStatus,
    StepProcessor, StoreError, StoredContext, Transition,
};
pub use ledger::{LedgerClient, LedgerTimeout, ScriptedLedger, SeededLedger};
pub use transfer::{
    ModifyAccountContext, ModifyAccountType, RecoveryWorker, TransferContext, TransferError,
    TransferOrder, TransferReceipt, TransferService, TransferStatus, WorkerConfig,
};
