//! Remote ledger collaborator.
//!
//! User accounts live in a separate accounting system; this module is the
//! narrow request/response contract the saga reaches it through. Every call
//! carries an idempotency key: two calls with the same key against the same
//! account and amount have the effect of one.

pub mod mock;

// Re-exports for convenience
pub use mock::{CallKind, LedgerCall, LedgerOutcome, ScriptedLedger, SeededLedger};

use async_trait::async_trait;
use thiserror::Error;

use crate::flow::ResultStatus;

/// The ledger call did not come back in time.
///
/// The outcome is unknown, not negative: callers map this to
/// [`ResultStatus::Processing`] and retry later under the same key.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("ledger call timed out, outcome unknown")]
pub struct LedgerTimeout;

/// Balance operations against the remote accounting system.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Remove `amount` from `account_no`.
    ///
    /// # Idempotency
    /// At-most-once effect per `ref_order_no`; a repeated key is a
    /// completed no-op to the ledger.
    async fn debit(
        &self,
        ref_order_no: &str,
        account_no: &str,
        amount: u64,
    ) -> Result<ResultStatus, LedgerTimeout>;

    /// Add `amount` to `account_no`.
    ///
    /// # Idempotency
    /// At-most-once effect per `ref_order_no`; a repeated key is a
    /// completed no-op to the ledger.
    async fn credit(
        &self,
        ref_order_no: &str,
        account_no: &str,
        amount: u64,
    ) -> Result<ResultStatus, LedgerTimeout>;
}
