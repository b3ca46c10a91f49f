//! Transfer saga.
//!
//! Drives a cross-system money transfer to a consistent terminal outcome:
//! debit the payer on the remote ledger, credit the payee, and reverse the
//! debit when the credit is rejected.
//!
//! # State Machine
//!
//! ```text
//! DOWN_PAYER → UP_PAYEE → SUCCESS
//!      ↓           ↓
//!    FAIL     compensate → FAIL
//! ```
//!
//! # Safety Invariants
//!
//! 1. **Never Half-Applied**: the payer is never left debited without the
//!    payee credited or the debit reversed
//! 2. **Timeout ≠ Fail**: an indeterminate outcome suspends the saga; only
//!    an explicit rejection settles or compensates
//! 3. **Stable Keys On Resume**: the debit/credit legs derive their
//!    idempotency keys from `order_no`, so a resumed step replays the
//!    identical key
//! 4. **Fresh Keys On Retry**: a rejected MUST_SUCCEED compensation mints a
//!    new key per attempt, since the ledger treats a repeated key as an
//!    already-completed no-op

pub mod flows;
pub mod processors;
pub mod service;
pub mod types;
pub mod worker;

#[cfg(test)]
mod integration_tests;

// Re-exports for convenience
pub use flows::{MODIFY_ACCOUNT_FLOW, TRANSFER_FLOW, modify_account_flow, transfer_flow};
pub use service::{TransferError, TransferOrder, TransferReceipt, TransferService};
pub use types::{
    LedgerOp, ModifyAccountContext, ModifyAccountType, ModifyStatus, TransferContext,
    TransferStatus,
};
pub use worker::{RecoveryWorker, WorkerConfig};
