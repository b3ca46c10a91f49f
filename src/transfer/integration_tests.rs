//! Transfer saga scenario tests.
//!
//! Every scenario runs the full stack (service, both flow engines, the
//! in-memory stores) against a scripted ledger, and asserts on the calls
//! and balance movements the ledger observed.

use std::sync::Arc;

use crate::ledger::{CallKind, LedgerOutcome, ScriptedLedger};
use crate::transfer::service::{TransferOrder, TransferService};
use crate::transfer::types::TransferStatus;
use crate::transfer::worker::{RecoveryWorker, WorkerConfig};

const PAYER: &str = "acct-payer";
const PAYEE: &str = "acct-payee";
const AMOUNT: u64 = 500;

struct TestHarness {
    service: Arc<TransferService>,
    ledger: Arc<ScriptedLedger>,
}

impl TestHarness {
    fn new(script: impl IntoIterator<Item = LedgerOutcome>) -> Self {
        let ledger = Arc::new(ScriptedLedger::with_script(script));
        let service = Arc::new(TransferService::assemble(ledger.clone()).unwrap());
        Self { service, ledger }
    }

    fn order(&self, order_no: &str) -> TransferOrder {
        TransferOrder {
            order_no: order_no.to_string(),
            payer_account_no: PAYER.to_string(),
            payee_account_no: PAYEE.to_string(),
            amount: AMOUNT,
        }
    }

    fn debits(&self) -> Vec<crate::ledger::LedgerCall> {
        self.ledger.calls_against(CallKind::Debit, PAYER)
    }

    fn payee_credits(&self) -> Vec<crate::ledger::LedgerCall> {
        self.ledger.calls_against(CallKind::Credit, PAYEE)
    }

    fn refunds(&self) -> Vec<crate::ledger::LedgerCall> {
        self.ledger.calls_against(CallKind::Credit, PAYER)
    }
}

// ========================================================================
// Happy Path
// ========================================================================

/// Both legs succeed: SUCCESS, one call each, no compensation.
#[tokio::test]
async fn test_happy_path() {
    let h = TestHarness::new([LedgerOutcome::Success, LedgerOutcome::Success]);

    let receipt = h.service.transfer(h.order("order-1")).await.unwrap();

    assert_eq!(receipt.status, TransferStatus::Success);
    assert!(receipt.settled());
    assert_eq!(h.debits().len(), 1);
    assert_eq!(h.payee_credits().len(), 1);
    assert!(h.refunds().is_empty());
    assert_eq!(h.ledger.balance(PAYER), -(AMOUNT as i64));
    assert_eq!(h.ledger.balance(PAYEE), AMOUNT as i64);
}

// ========================================================================
// Failure & Compensation
// ========================================================================

/// Debit rejected: FAIL, the credit leg is never reached.
#[tokio::test]
async fn test_debit_fail_short_circuits() {
    let h = TestHarness::new([LedgerOutcome::Fail]);

    let receipt = h.service.transfer(h.order("order-1")).await.unwrap();

    assert_eq!(receipt.status, TransferStatus::Fail);
    assert!(h.payee_credits().is_empty());
    assert!(h.refunds().is_empty());
    assert_eq!(h.ledger.balance(PAYER), 0);
    assert_eq!(h.ledger.balance(PAYEE), 0);
}

/// Credit rejected: the payer's debit is reversed before FAIL settles.
#[tokio::test]
async fn test_credit_fail_compensates() {
    let h = TestHarness::new([
        LedgerOutcome::Success, // debit payer
        LedgerOutcome::Fail,    // credit payee rejected
        LedgerOutcome::Success, // re-credit payer
    ]);

    let receipt = h.service.transfer(h.order("order-1")).await.unwrap();

    assert_eq!(receipt.status, TransferStatus::Fail);
    assert_eq!(h.refunds().len(), 1);
    assert_eq!(h.refunds()[0].amount, AMOUNT);
    // Fully rolled back: no net movement on either account.
    assert_eq!(h.ledger.balance(PAYER), 0);
    assert_eq!(h.ledger.balance(PAYEE), 0);
}

/// Scenario: compensation rejected once, then confirmed under a fresh key.
#[tokio::test]
async fn test_compensation_retries_with_fresh_key() {
    let h = TestHarness::new([
        LedgerOutcome::Success, // debit payer
        LedgerOutcome::Fail,    // credit payee rejected
        LedgerOutcome::Fail,    // re-credit attempt 1 rejected
        LedgerOutcome::Success, // re-credit attempt 2 confirmed
    ]);

    let receipt = h.service.transfer(h.order("order-1")).await.unwrap();

    assert_eq!(receipt.status, TransferStatus::Fail);

    // Two compensation attempts, each under its own idempotency key.
    let refunds = h.refunds();
    assert_eq!(refunds.len(), 2);
    assert_ne!(refunds[0].ref_order_no, refunds[1].ref_order_no);

    assert_eq!(h.ledger.balance(PAYER), 0);
    assert_eq!(h.ledger.balance(PAYEE), 0);
}

/// Compensation stuck in flight: the saga suspends and finishes on resume,
/// replaying the same key (no rejection happened, so no fresh key).
#[tokio::test]
async fn test_compensation_suspends_on_processing() {
    let h = TestHarness::new([
        LedgerOutcome::Success,    // debit payer
        LedgerOutcome::Fail,       // credit payee rejected
        LedgerOutcome::Processing, // re-credit in flight
        LedgerOutcome::Success,    // re-credit confirmed on resume
    ]);

    let receipt = h.service.transfer(h.order("order-1")).await.unwrap();
    assert_eq!(receipt.status, TransferStatus::UpPayee);
    assert!(!receipt.settled());

    let receipt = h.service.resume(&receipt.biz_no).await.unwrap();
    assert_eq!(receipt.status, TransferStatus::Fail);

    let refunds = h.refunds();
    assert_eq!(refunds.len(), 2);
    assert_eq!(refunds[0].ref_order_no, refunds[1].ref_order_no);
    assert_eq!(h.ledger.balance(PAYER), 0);
}

// ========================================================================
// Suspension & Resume
// ========================================================================

/// Debit in flight: the saga suspends without touching `status`, and the
/// resumed step re-issues the identical idempotency key.
#[tokio::test]
async fn test_debit_processing_suspends_and_resumes() {
    let h = TestHarness::new([
        LedgerOutcome::Processing,
        LedgerOutcome::Success, // debit on resume
        LedgerOutcome::Success, // credit
    ]);

    let receipt = h.service.transfer(h.order("order-1")).await.unwrap();
    assert_eq!(receipt.status, TransferStatus::DownPayer);
    assert!(!receipt.settled());
    assert_eq!(h.debits().len(), 1);

    let receipt = h.service.resume(&receipt.biz_no).await.unwrap();
    assert_eq!(receipt.status, TransferStatus::Success);

    let debits = h.debits();
    assert_eq!(debits.len(), 2);
    assert_eq!(debits[0].ref_order_no, debits[1].ref_order_no);
    // Applied exactly once despite two calls.
    assert_eq!(h.ledger.balance(PAYER), -(AMOUNT as i64));
}

/// Scenario: amount=500, debit SUCCESS, credit PROCESSING then resumed with
/// SUCCESS: two credit invocations, one debit, final status SUCCESS.
#[tokio::test]
async fn test_credit_processing_suspends_and_resumes() {
    let h = TestHarness::new([
        LedgerOutcome::Success,
        LedgerOutcome::Processing,
        LedgerOutcome::Success,
    ]);

    let receipt = h.service.transfer(h.order("order-1")).await.unwrap();
    assert_eq!(receipt.status, TransferStatus::UpPayee);

    let receipt = h.service.resume(&receipt.biz_no).await.unwrap();
    assert_eq!(receipt.status, TransferStatus::Success);

    assert_eq!(h.debits().len(), 1);
    let credits = h.payee_credits();
    assert_eq!(credits.len(), 2);
    assert_eq!(credits[0].ref_order_no, credits[1].ref_order_no);
    assert_eq!(h.ledger.balance(PAYEE), AMOUNT as i64);
}

/// A settled transfer is immutable: resuming it issues no remote calls.
#[tokio::test]
async fn test_settled_transfer_resume_is_a_no_op() {
    let h = TestHarness::new([LedgerOutcome::Success, LedgerOutcome::Success]);

    let receipt = h.service.transfer(h.order("order-1")).await.unwrap();
    assert_eq!(receipt.status, TransferStatus::Success);
    let calls_before = h.ledger.calls().len();

    let receipt = h.service.resume(&receipt.biz_no).await.unwrap();
    assert_eq!(receipt.status, TransferStatus::Success);
    assert_eq!(h.ledger.calls().len(), calls_before);
}

// ========================================================================
// Recovery Worker
// ========================================================================

/// A suspended saga is picked up by the scan and driven to settlement.
#[tokio::test]
async fn test_worker_settles_suspended_transfer() {
    let h = TestHarness::new([
        LedgerOutcome::Processing,
        LedgerOutcome::Success,
        LedgerOutcome::Success,
    ]);

    let receipt = h.service.transfer(h.order("order-1")).await.unwrap();
    assert!(!receipt.settled());

    let worker = RecoveryWorker::new(h.service.clone(), WorkerConfig {
        stale_threshold: std::time::Duration::ZERO,
        ..WorkerConfig::default()
    });

    let settled = worker.scan_and_recover().await.unwrap();
    assert_eq!(settled, 1);
    assert_eq!(
        h.service.status(&receipt.biz_no).await.unwrap(),
        TransferStatus::Success
    );
    assert!(h.service.store().suspended().is_empty());
}

/// Nothing suspended, nothing to do.
#[tokio::test]
async fn test_worker_idle_scan() {
    let h = TestHarness::new([LedgerOutcome::Success, LedgerOutcome::Success]);
    h.service.transfer(h.order("order-1")).await.unwrap();

    let worker = RecoveryWorker::with_defaults(h.service.clone());
    assert_eq!(worker.scan_and_recover().await.unwrap(), 0);
}

// ========================================================================
// Independent Instances
// ========================================================================

/// Sagas are independent: one suspending does not block another settling.
#[tokio::test]
async fn test_instances_are_independent() {
    let h = TestHarness::new([
        LedgerOutcome::Processing, // order-1 debit in flight
        LedgerOutcome::Success,    // order-2 debit
        LedgerOutcome::Success,    // order-2 credit
        LedgerOutcome::Success,    // order-1 debit on resume
        LedgerOutcome::Success,    // order-1 credit
    ]);

    let first = h.service.transfer(h.order("order-1")).await.unwrap();
    assert!(!first.settled());

    let second = h.service.transfer(h.order("order-2")).await.unwrap();
    assert_eq!(second.status, TransferStatus::Success);

    let first = h.service.resume(&first.biz_no).await.unwrap();
    assert_eq!(first.status, TransferStatus::Success);

    assert_eq!(h.ledger.balance(PAYER), -2 * AMOUNT as i64);
    assert_eq!(h.ledger.balance(PAYEE), 2 * AMOUNT as i64);
}
