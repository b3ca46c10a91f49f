//! Orchestrating transfer service.
//!
//! Accepts a transfer order, creates and persists the saga context, and
//! drives it through the transfer flow. Business outcomes surface in the
//! receipt; only validation failures and engine defects are errors.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use super::flows::{TRANSFER_FLOW, modify_account_flow, transfer_flow};
use super::types::{ModifyAccountContext, TransferContext, TransferStatus};
use crate::flow::{ContextStore, FlowEngine, FlowError, MemoryStore, StoreError};
use crate::ledger::LedgerClient;

/// Transfer service errors.
#[derive(Error, Debug, Clone)]
pub enum TransferError {
    // === Validation ===
    #[error("amount must be greater than zero")]
    InvalidAmount,

    #[error("payer and payee account cannot be the same")]
    SameAccount,

    #[error("order number must not be empty")]
    EmptyOrderNo,

    // === Lookup ===
    #[error("transfer not found: {0}")]
    TransferNotFound(String),

    // === Defects ===
    #[error("context store error: {0}")]
    Store(String),

    #[error("flow engine defect: {0}")]
    Engine(String),
}

impl From<FlowError> for TransferError {
    fn from(e: FlowError) -> Self {
        TransferError::Engine(e.to_string())
    }
}

impl From<StoreError> for TransferError {
    fn from(e: StoreError) -> Self {
        TransferError::Store(e.to_string())
    }
}

/// An incoming transfer request.
#[derive(Debug, Clone)]
pub struct TransferOrder {
    /// Externally supplied, unique per business request.
    pub order_no: String,
    pub payer_account_no: String,
    pub payee_account_no: String,
    /// Minor currency units.
    pub amount: u64,
}

/// Outcome of one service call. `status` is the domain-level signal:
/// `Success`/`Fail` are settled, anything else is still in flight.
#[derive(Debug, Clone)]
pub struct TransferReceipt {
    pub order_no: String,
    pub biz_no: String,
    pub status: TransferStatus,
}

impl TransferReceipt {
    pub fn settled(&self) -> bool {
        self.status.is_terminal()
    }

    fn from_context(ctx: &TransferContext) -> Self {
        Self {
            order_no: ctx.order_no.clone(),
            biz_no: ctx.biz_no.clone(),
            status: ctx.status,
        }
    }
}

/// Transfer saga orchestrator.
pub struct TransferService {
    engine: FlowEngine<TransferContext>,
    store: Arc<MemoryStore<TransferContext>>,
}

impl TransferService {
    /// Wire the full saga: stores, the compensation engine, the transfer
    /// engine, and the service itself.
    pub fn assemble(ledger: Arc<dyn LedgerClient>) -> Result<Self, TransferError> {
        let modify_store: Arc<MemoryStore<ModifyAccountContext>> = Arc::new(MemoryStore::new());
        let mut modify_engine: FlowEngine<ModifyAccountContext> = FlowEngine::new(modify_store);
        modify_engine.register(modify_account_flow(ledger.clone())?);

        let store: Arc<MemoryStore<TransferContext>> = Arc::new(MemoryStore::new());
        let mut engine: FlowEngine<TransferContext> = FlowEngine::new(store.clone());
        engine.register(transfer_flow(ledger, Arc::new(modify_engine))?);

        Ok(Self { engine, store })
    }

    /// The transfer context store; the recovery worker scans it.
    pub fn store(&self) -> &Arc<MemoryStore<TransferContext>> {
        &self.store
    }

    /// Run a new transfer to settlement or suspension.
    pub async fn transfer(&self, order: TransferOrder) -> Result<TransferReceipt, TransferError> {
        if order.amount == 0 {
            return Err(TransferError::InvalidAmount);
        }
        if order.payer_account_no == order.payee_account_no {
            return Err(TransferError::SameAccount);
        }
        if order.order_no.is_empty() {
            return Err(TransferError::EmptyOrderNo);
        }

        let ctx = TransferContext::new(
            &order.order_no,
            &order.payer_account_no,
            &order.payee_account_no,
            order.amount,
        );
        info!(
            order_no = %ctx.order_no,
            biz_no = %ctx.biz_no,
            amount = ctx.amount,
            "transfer accepted: {} -> {}",
            ctx.payer_account_no,
            ctx.payee_account_no
        );

        // Persist before the first engine execution so a crash can still
        // resume the instance.
        self.store.save(&ctx, None).await?;
        let ctx = self.engine.execute(TRANSFER_FLOW, ctx).await?;

        Ok(TransferReceipt::from_context(&ctx))
    }

    /// Re-enter a suspended transfer at its recorded node.
    ///
    /// Resuming a settled transfer is a no-op returning its receipt.
    pub async fn resume(&self, biz_no: &str) -> Result<TransferReceipt, TransferError> {
        let stored = self
            .store
            .load(biz_no)
            .await?
            .ok_or_else(|| TransferError::TransferNotFound(biz_no.to_string()))?;

        let ctx = match stored.resume_at {
            Some(node) => {
                self.engine
                    .resume(TRANSFER_FLOW, stored.context, &node)
                    .await?
            }
            None => stored.context,
        };

        Ok(TransferReceipt::from_context(&ctx))
    }

    /// Last persisted status of a transfer.
    pub async fn status(&self, biz_no: &str) -> Result<TransferStatus, TransferError> {
        let stored = self
            .store
            .load(biz_no)
            .await?
            .ok_or_else(|| TransferError::TransferNotFound(biz_no.to_string()))?;
        Ok(stored.context.status)
    }
}
