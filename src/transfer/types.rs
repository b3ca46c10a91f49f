//! Transfer saga contexts and statuses.

use std::fmt;

use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::flow::FlowContext;

/// Transfer saga status.
///
/// ```text
/// DOWN_PAYER --(debit ok)--> UP_PAYEE --(credit ok)--> SUCCESS
/// DOWN_PAYER --(debit fail)--> FAIL
/// UP_PAYEE --(credit fail)--> [compensate: re-credit payer] --> FAIL
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransferStatus {
    /// Debiting the payer.
    DownPayer,
    /// Payer debited; crediting the payee.
    UpPayee,
    /// Terminal: both legs applied.
    Success,
    /// Terminal: nothing applied, or the payer's debit was reversed.
    Fail,
}

impl TransferStatus {
    /// Terminal statuses are immutable: no further remote calls are issued.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransferStatus::Success | TransferStatus::Fail)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransferStatus::DownPayer => "DOWN_PAYER",
            TransferStatus::UpPayee => "UP_PAYEE",
            TransferStatus::Success => "SUCCESS",
            TransferStatus::Fail => "FAIL",
        }
    }
}

impl fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The transfer saga's unit of work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferContext {
    /// Externally supplied identifier, unique per business request; the
    /// basis for the per-step idempotency keys.
    pub order_no: String,
    /// Internally generated identifier, unique per saga instance.
    pub biz_no: String,
    pub payer_account_no: String,
    pub payee_account_no: String,
    /// Positive minor-currency-unit value; immutable after creation.
    pub amount: u64,
    /// Advanced only as the flow engine walks the nodes.
    pub status: TransferStatus,
    /// Created timestamp (epoch millis).
    pub created_at: i64,
}

impl TransferContext {
    pub fn new(order_no: &str, payer_account_no: &str, payee_account_no: &str, amount: u64) -> Self {
        Self {
            order_no: order_no.to_string(),
            biz_no: Ulid::new().to_string(),
            payer_account_no: payer_account_no.to_string(),
            payee_account_no: payee_account_no.to_string(),
            amount,
            status: TransferStatus::DownPayer,
            created_at: chrono::Utc::now().timestamp_millis(),
        }
    }
}

impl FlowContext for TransferContext {
    fn biz_no(&self) -> &str {
        &self.biz_no
    }

    fn finished(&self) -> bool {
        self.status.is_terminal()
    }
}

impl fmt::Display for TransferContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Transfer[{}] order={} {} -> {} amount={} status={}",
            self.biz_no,
            self.order_no,
            self.payer_account_no,
            self.payee_account_no,
            self.amount,
            self.status
        )
    }
}

/// Whether a FAIL outcome settles a modify-account attempt or forces a
/// retry under a fresh idempotency key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModifyAccountType {
    /// FAIL is a terminal sub-outcome.
    Normal,
    /// FAIL is retried with a regenerated key until the ledger confirms.
    MustSucceed,
}

impl ModifyAccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModifyAccountType::Normal => "NORMAL",
            ModifyAccountType::MustSucceed => "MUST_SUCCEED",
        }
    }
}

impl fmt::Display for ModifyAccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Direction of a modify-account operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerOp {
    Debit,
    Credit,
}

/// Modify-account sub-flow status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModifyStatus {
    Pending,
    Success,
    Fail,
}

impl ModifyStatus {
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, ModifyStatus::Success | ModifyStatus::Fail)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ModifyStatus::Pending => "PENDING",
            ModifyStatus::Success => "SUCCESS",
            ModifyStatus::Fail => "FAIL",
        }
    }
}

impl fmt::Display for ModifyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-attempt sub-context of the modify-account flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModifyAccountContext {
    pub biz_no: String,
    pub account_no: String,
    pub amount: u64,
    pub op: LedgerOp,
    pub kind: ModifyAccountType,
    /// Idempotency key of the *current* attempt. Regenerated, never
    /// reused, when a MUST_SUCCEED attempt is rejected: the ledger treats
    /// a repeated key as an already-completed no-op.
    pub ref_order_no: String,
    pub status: ModifyStatus,
}

impl ModifyAccountContext {
    pub fn new(
        biz_no: &str,
        account_no: &str,
        amount: u64,
        op: LedgerOp,
        kind: ModifyAccountType,
    ) -> Self {
        Self {
            biz_no: biz_no.to_string(),
            account_no: account_no.to_string(),
            amount,
            op,
            kind,
            ref_order_no: Ulid::new().to_string(),
            status: ModifyStatus::Pending,
        }
    }

    /// Mint a fresh idempotency key for the next attempt.
    pub fn regenerate_ref_order_no(&mut self) {
        self.ref_order_no = Ulid::new().to_string();
    }
}

impl FlowContext for ModifyAccountContext {
    fn biz_no(&self) -> &str {
        &self.biz_no
    }

    fn finished(&self) -> bool {
        self.status.is_terminal()
    }
}
