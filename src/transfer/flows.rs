//! Static flow definitions for the transfer saga.
//!
//! Both graphs are built once at startup; the node tables are read-only
//! afterwards. Transition rules declare exactly the statuses each node can
//! legally see; anything else is a defect the engine raises.

use std::sync::Arc;

use super::processors::{
    CompensateProcessor, DownPayerProcessor, GenerateRefOrderNoProcessor, ModifyProcessor,
    UpPayeeProcessor,
};
use super::types::{
    ModifyAccountContext, ModifyAccountType, ModifyStatus, TransferContext, TransferStatus,
};
use crate::flow::{FlowDefinition, FlowEngine, FlowError, ResultStatus, Transition};
use crate::ledger::LedgerClient;

pub const TRANSFER_FLOW: &str = "transfer";
pub const MODIFY_ACCOUNT_FLOW: &str = "modify_account";

/// The outer transfer flow: debit the payer, credit the payee, compensate
/// when the credit is rejected.
pub fn transfer_flow(
    ledger: Arc<dyn LedgerClient>,
    modify_engine: Arc<FlowEngine<ModifyAccountContext>>,
) -> Result<FlowDefinition<TransferContext>, FlowError> {
    FlowDefinition::builder(TRANSFER_FLOW)
        .start(
            "down_payer",
            Arc::new(DownPayerProcessor::new(ledger.clone())),
            down_payer_transition,
        )
        .phase(
            "up_payee",
            Arc::new(UpPayeeProcessor::new(ledger)),
            up_payee_transition,
        )
        .phase(
            "compensate",
            Arc::new(CompensateProcessor::new(modify_engine)),
            compensate_transition,
        )
        .end("success", stamp_success)
        .end("fail", stamp_fail)
        .build()
}

fn down_payer_transition(status: ResultStatus, ctx: &mut TransferContext) -> Option<Transition> {
    match status {
        ResultStatus::Success => {
            ctx.status = TransferStatus::UpPayee;
            Some(Transition::Goto("up_payee"))
        }
        ResultStatus::Fail => Some(Transition::Goto("fail")),
        ResultStatus::Processing => Some(Transition::Suspend),
    }
}

fn up_payee_transition(status: ResultStatus, _ctx: &mut TransferContext) -> Option<Transition> {
    match status {
        ResultStatus::Success => Some(Transition::Goto("success")),
        // The payer is already debited: reverse it before settling FAIL.
        ResultStatus::Fail => Some(Transition::Goto("compensate")),
        ResultStatus::Processing => Some(Transition::Suspend),
    }
}

fn compensate_transition(status: ResultStatus, _ctx: &mut TransferContext) -> Option<Transition> {
    match status {
        // Reversal confirmed: the transfer settles as failed.
        ResultStatus::Success => Some(Transition::Goto("fail")),
        ResultStatus::Processing => Some(Transition::Suspend),
        // A MUST_SUCCEED reversal never reports a terminal failure.
        ResultStatus::Fail => None,
    }
}

fn stamp_success(ctx: &mut TransferContext) {
    ctx.status = TransferStatus::Success;
}

fn stamp_fail(ctx: &mut TransferContext) {
    ctx.status = TransferStatus::Fail;
}

/// The modify-account sub-flow: one remote account modification, retried
/// under fresh keys when it MUST_SUCCEED.
pub fn modify_account_flow(
    ledger: Arc<dyn LedgerClient>,
) -> Result<FlowDefinition<ModifyAccountContext>, FlowError> {
    FlowDefinition::builder(MODIFY_ACCOUNT_FLOW)
        .start(
            "modify",
            Arc::new(ModifyProcessor::new(ledger)),
            modify_transition,
        )
        .phase(
            "generate_ref_order_no",
            Arc::new(GenerateRefOrderNoProcessor),
            generate_ref_order_no_transition,
        )
        .end("success", stamp_modify_success)
        .end("fail", stamp_modify_fail)
        .build()
}

fn modify_transition(status: ResultStatus, ctx: &mut ModifyAccountContext) -> Option<Transition> {
    match status {
        ResultStatus::Success => Some(Transition::Goto("success")),
        ResultStatus::Processing => Some(Transition::Suspend),
        ResultStatus::Fail => match ctx.kind {
            ModifyAccountType::Normal => Some(Transition::Goto("fail")),
            // The ledger treats a repeated key as an already-completed
            // no-op, so the retry must present a fresh one.
            ModifyAccountType::MustSucceed => Some(Transition::Goto("generate_ref_order_no")),
        },
    }
}

fn generate_ref_order_no_transition(
    status: ResultStatus,
    _ctx: &mut ModifyAccountContext,
) -> Option<Transition> {
    match status {
        ResultStatus::Success => Some(Transition::Goto("modify")),
        // Key regeneration cannot fail or stay in flight.
        _ => None,
    }
}

fn stamp_modify_success(ctx: &mut ModifyAccountContext) {
    ctx.status = ModifyStatus::Success;
}

fn stamp_modify_fail(ctx: &mut ModifyAccountContext) {
    ctx.status = ModifyStatus::Fail;
}
