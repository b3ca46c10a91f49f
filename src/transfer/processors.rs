//! Step processors for the transfer saga.
//!
//! Each processor performs one unit of remote work and collapses the raw
//! ledger reply (including timeouts) into a normalized [`ResultStatus`].

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::flows::MODIFY_ACCOUNT_FLOW;
use super::types::{
    LedgerOp, ModifyAccountContext, ModifyAccountType, ModifyStatus, TransferContext,
};
use crate::flow::{FlowEngine, FlowError, ResultStatus, StepProcessor};
use crate::ledger::{LedgerClient, LedgerTimeout};

/// Idempotency key of the payer-debit leg. Derived, not minted: a resumed
/// execution re-issues the identical key.
pub(crate) fn debit_order_no(order_no: &str) -> String {
    format!("{order_no}-down")
}

/// Idempotency key of the payee-credit leg.
pub(crate) fn credit_order_no(order_no: &str) -> String {
    format!("{order_no}-up")
}

/// Instance id of the compensation sub-flow, derived from the transfer's so
/// a resumed compensation finds its suspended sub-context.
pub(crate) fn refund_biz_no(biz_no: &str) -> String {
    format!("{biz_no}-refund")
}

/// Collapse a ledger reply into the normalized step outcome.
///
/// A timeout means the true outcome is unknown; it maps to `Processing` so
/// the step is retried later under the same key. Converting it to `Fail`
/// would make the inconsistency unrecoverable.
fn normalize(
    reply: Result<ResultStatus, LedgerTimeout>,
    step: &'static str,
    ref_order_no: &str,
) -> ResultStatus {
    match reply {
        Ok(status) => status,
        Err(LedgerTimeout) => {
            warn!(
                step,
                ref_order_no, "ledger timed out, treating as still processing"
            );
            ResultStatus::Processing
        }
    }
}

/// Debits the payer on the remote ledger.
pub struct DownPayerProcessor {
    ledger: Arc<dyn LedgerClient>,
}

impl DownPayerProcessor {
    pub fn new(ledger: Arc<dyn LedgerClient>) -> Self {
        Self { ledger }
    }
}

#[async_trait]
impl StepProcessor<TransferContext> for DownPayerProcessor {
    fn name(&self) -> &'static str {
        "down_payer"
    }

    async fn execute(&self, ctx: &mut TransferContext) -> Result<ResultStatus, FlowError> {
        let ref_no = debit_order_no(&ctx.order_no);
        debug!(
            biz_no = %ctx.biz_no,
            ref_order_no = %ref_no,
            account_no = %ctx.payer_account_no,
            amount = ctx.amount,
            "debiting payer"
        );
        let reply = self
            .ledger
            .debit(&ref_no, &ctx.payer_account_no, ctx.amount)
            .await;
        Ok(normalize(reply, "down_payer", &ref_no))
    }
}

/// Credits the payee on the remote ledger.
pub struct UpPayeeProcessor {
    ledger: Arc<dyn LedgerClient>,
}

impl UpPayeeProcessor {
    pub fn new(ledger: Arc<dyn LedgerClient>) -> Self {
        Self { ledger }
    }
}

#[async_trait]
impl StepProcessor<TransferContext> for UpPayeeProcessor {
    fn name(&self) -> &'static str {
        "up_payee"
    }

    async fn execute(&self, ctx: &mut TransferContext) -> Result<ResultStatus, FlowError> {
        let ref_no = credit_order_no(&ctx.order_no);
        debug!(
            biz_no = %ctx.biz_no,
            ref_order_no = %ref_no,
            account_no = %ctx.payee_account_no,
            amount = ctx.amount,
            "crediting payee"
        );
        let reply = self
            .ledger
            .credit(&ref_no, &ctx.payee_account_no, ctx.amount)
            .await;
        Ok(normalize(reply, "up_payee", &ref_no))
    }
}

/// Runs one modify-account attempt with the sub-context's current key.
pub struct ModifyProcessor {
    ledger: Arc<dyn LedgerClient>,
}

impl ModifyProcessor {
    pub fn new(ledger: Arc<dyn LedgerClient>) -> Self {
        Self { ledger }
    }
}

#[async_trait]
impl StepProcessor<ModifyAccountContext> for ModifyProcessor {
    fn name(&self) -> &'static str {
        "modify"
    }

    async fn execute(&self, ctx: &mut ModifyAccountContext) -> Result<ResultStatus, FlowError> {
        debug!(
            biz_no = %ctx.biz_no,
            ref_order_no = %ctx.ref_order_no,
            account_no = %ctx.account_no,
            amount = ctx.amount,
            op = ?ctx.op,
            "modifying account"
        );
        let reply = match ctx.op {
            LedgerOp::Debit => {
                self.ledger
                    .debit(&ctx.ref_order_no, &ctx.account_no, ctx.amount)
                    .await
            }
            LedgerOp::Credit => {
                self.ledger
                    .credit(&ctx.ref_order_no, &ctx.account_no, ctx.amount)
                    .await
            }
        };
        Ok(normalize(reply, "modify", &ctx.ref_order_no))
    }
}

/// Mints a fresh idempotency key for the next modify attempt.
///
/// Key generation is local and cannot plausibly fail or stay in flight;
/// its node declares SUCCESS only.
pub struct GenerateRefOrderNoProcessor;

#[async_trait]
impl StepProcessor<ModifyAccountContext> for GenerateRefOrderNoProcessor {
    fn name(&self) -> &'static str {
        "generate_ref_order_no"
    }

    async fn execute(&self, ctx: &mut ModifyAccountContext) -> Result<ResultStatus, FlowError> {
        let stale = ctx.ref_order_no.clone();
        ctx.regenerate_ref_order_no();
        debug!(
            biz_no = %ctx.biz_no,
            stale_ref_order_no = %stale,
            ref_order_no = %ctx.ref_order_no,
            "regenerated modify-account key"
        );
        Ok(ResultStatus::Success)
    }
}

/// Reverses the payer's debit by driving the modify-account sub-flow.
///
/// The sub-context runs MUST_SUCCEED: an un-reversed debit is a stronger
/// violation than a transient remote failure, so there is no abandonment,
/// only suspension while an attempt is in flight.
pub struct CompensateProcessor {
    modify_engine: Arc<FlowEngine<ModifyAccountContext>>,
}

impl CompensateProcessor {
    pub fn new(modify_engine: Arc<FlowEngine<ModifyAccountContext>>) -> Self {
        Self { modify_engine }
    }
}

#[async_trait]
impl StepProcessor<TransferContext> for CompensateProcessor {
    fn name(&self) -> &'static str {
        "compensate"
    }

    async fn execute(&self, ctx: &mut TransferContext) -> Result<ResultStatus, FlowError> {
        let sub_no = refund_biz_no(&ctx.biz_no);

        let stored = self.modify_engine.store().load(&sub_no).await?;
        let refund = match stored {
            // A previous attempt suspended mid-flight: pick it up where it
            // stopped, with the key it already presented.
            Some(stored) => match stored.resume_at {
                Some(node) => {
                    self.modify_engine
                        .resume(MODIFY_ACCOUNT_FLOW, stored.context, &node)
                        .await?
                }
                None => stored.context,
            },
            None => {
                debug!(
                    biz_no = %ctx.biz_no,
                    refund_biz_no = %sub_no,
                    account_no = %ctx.payer_account_no,
                    amount = ctx.amount,
                    "starting compensation sub-flow"
                );
                let sub = ModifyAccountContext::new(
                    &sub_no,
                    &ctx.payer_account_no,
                    ctx.amount,
                    LedgerOp::Credit,
                    ModifyAccountType::MustSucceed,
                );
                self.modify_engine.execute(MODIFY_ACCOUNT_FLOW, sub).await?
            }
        };

        Ok(match refund.status {
            ModifyStatus::Success => ResultStatus::Success,
            ModifyStatus::Fail => ResultStatus::Fail,
            ModifyStatus::Pending => ResultStatus::Processing,
        })
    }
}
