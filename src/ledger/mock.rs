//! Injectable ledger doubles.
//!
//! [`ScriptedLedger`] replays a fixed outcome sequence for deterministic
//! tests and records every call; [`SeededLedger`] draws outcomes from an
//! explicitly seeded RNG for demo runs. Both honor the idempotency
//! contract: a key that already completed is a no-op returning the original
//! outcome.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use super::{LedgerClient, LedgerTimeout};
use crate::flow::ResultStatus;

/// One scripted remote outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerOutcome {
    Success,
    Fail,
    Processing,
    Timeout,
}

/// Direction of a recorded ledger call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Debit,
    Credit,
}

/// A recorded ledger call, for test assertions.
#[derive(Debug, Clone)]
pub struct LedgerCall {
    pub kind: CallKind,
    pub ref_order_no: String,
    pub account_no: String,
    pub amount: u64,
    pub outcome: LedgerOutcome,
}

#[derive(Default)]
struct LedgerState {
    script: VecDeque<LedgerOutcome>,
    /// Completed operations by idempotency key.
    applied: HashMap<String, ResultStatus>,
    /// Net balance movement per account (signed minor units).
    balances: HashMap<String, i64>,
    calls: Vec<LedgerCall>,
}

impl LedgerState {
    fn settle(
        &mut self,
        kind: CallKind,
        ref_order_no: &str,
        account_no: &str,
        amount: u64,
        outcome: LedgerOutcome,
    ) -> Result<ResultStatus, LedgerTimeout> {
        // A key that already completed is a no-op: return the recorded
        // outcome without touching the balance or the script.
        let replay = self.applied.get(ref_order_no).copied();
        if let Some(recorded) = replay {
            self.record(kind, ref_order_no, account_no, amount, match recorded {
                ResultStatus::Success => LedgerOutcome::Success,
                ResultStatus::Fail => LedgerOutcome::Fail,
                ResultStatus::Processing => LedgerOutcome::Processing,
            });
            return Ok(recorded);
        }

        self.record(kind, ref_order_no, account_no, amount, outcome);
        match outcome {
            LedgerOutcome::Success => {
                let delta = match kind {
                    CallKind::Debit => -(amount as i64),
                    CallKind::Credit => amount as i64,
                };
                *self.balances.entry(account_no.to_string()).or_default() += delta;
                self.applied
                    .insert(ref_order_no.to_string(), ResultStatus::Success);
                Ok(ResultStatus::Success)
            }
            LedgerOutcome::Fail => {
                // Rejected operations complete too: retrying the same key
                // keeps failing, which is why must-succeed retries mint a
                // fresh key.
                self.applied
                    .insert(ref_order_no.to_string(), ResultStatus::Fail);
                Ok(ResultStatus::Fail)
            }
            // In-flight or unknown: the key is not committed either way.
            LedgerOutcome::Processing => Ok(ResultStatus::Processing),
            LedgerOutcome::Timeout => Err(LedgerTimeout),
        }
    }

    fn record(
        &mut self,
        kind: CallKind,
        ref_order_no: &str,
        account_no: &str,
        amount: u64,
        outcome: LedgerOutcome,
    ) {
        self.calls.push(LedgerCall {
            kind,
            ref_order_no: ref_order_no.to_string(),
            account_no: account_no.to_string(),
            amount,
            outcome,
        });
    }
}

/// Deterministic ledger double replaying a scripted outcome sequence.
///
/// Outcomes are consumed in call order; an exhausted script keeps
/// returning `Success`.
#[derive(Default)]
pub struct ScriptedLedger {
    state: Mutex<LedgerState>,
}

impl ScriptedLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_script(outcomes: impl IntoIterator<Item = LedgerOutcome>) -> Self {
        let ledger = Self::new();
        ledger.push_all(outcomes);
        ledger
    }

    pub fn push_all(&self, outcomes: impl IntoIterator<Item = LedgerOutcome>) {
        self.state.lock().unwrap().script.extend(outcomes);
    }

    /// Net balance movement observed for an account.
    pub fn balance(&self, account_no: &str) -> i64 {
        self.state
            .lock()
            .unwrap()
            .balances
            .get(account_no)
            .copied()
            .unwrap_or(0)
    }

    /// Every call received so far, in order.
    pub fn calls(&self) -> Vec<LedgerCall> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Calls of one direction against one account, in order.
    pub fn calls_against(&self, kind: CallKind, account_no: &str) -> Vec<LedgerCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.kind == kind && c.account_no == account_no)
            .collect()
    }

    fn invoke(
        &self,
        kind: CallKind,
        ref_order_no: &str,
        account_no: &str,
        amount: u64,
    ) -> Result<ResultStatus, LedgerTimeout> {
        let mut state = self.state.lock().unwrap();
        let outcome = state
            .script
            .front()
            .copied()
            .unwrap_or(LedgerOutcome::Success);
        // Only a fresh key consumes the script; replays are no-ops.
        if !state.applied.contains_key(ref_order_no) {
            state.script.pop_front();
        }
        state.settle(kind, ref_order_no, account_no, amount, outcome)
    }
}

#[async_trait]
impl LedgerClient for ScriptedLedger {
    async fn debit(
        &self,
        ref_order_no: &str,
        account_no: &str,
        amount: u64,
    ) -> Result<ResultStatus, LedgerTimeout> {
        self.invoke(CallKind::Debit, ref_order_no, account_no, amount)
    }

    async fn credit(
        &self,
        ref_order_no: &str,
        account_no: &str,
        amount: u64,
    ) -> Result<ResultStatus, LedgerTimeout> {
        self.invoke(CallKind::Credit, ref_order_no, account_no, amount)
    }
}

/// Ledger double with an explicitly seeded outcome distribution:
/// 80% success, 10% fail, 5% processing, 5% timeout.
pub struct SeededLedger {
    rng: Mutex<StdRng>,
    state: Mutex<LedgerState>,
}

impl SeededLedger {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            state: Mutex::new(LedgerState::default()),
        }
    }

    fn draw(&self) -> LedgerOutcome {
        let roll: u32 = self.rng.lock().unwrap().gen_range(0..100);
        let outcome = match roll {
            0..=79 => LedgerOutcome::Success,
            80..=89 => LedgerOutcome::Fail,
            90..=94 => LedgerOutcome::Processing,
            _ => LedgerOutcome::Timeout,
        };
        debug!(roll, outcome = ?outcome, "mock ledger outcome drawn");
        outcome
    }

    fn invoke(
        &self,
        kind: CallKind,
        ref_order_no: &str,
        account_no: &str,
        amount: u64,
    ) -> Result<ResultStatus, LedgerTimeout> {
        let mut state = self.state.lock().unwrap();
        if state.applied.contains_key(ref_order_no) {
            return state.settle(kind, ref_order_no, account_no, amount, LedgerOutcome::Success);
        }
        let outcome = self.draw();
        state.settle(kind, ref_order_no, account_no, amount, outcome)
    }
}

#[async_trait]
impl LedgerClient for SeededLedger {
    async fn debit(
        &self,
        ref_order_no: &str,
        account_no: &str,
        amount: u64,
    ) -> Result<ResultStatus, LedgerTimeout> {
        self.invoke(CallKind::Debit, ref_order_no, account_no, amount)
    }

    async fn credit(
        &self,
        ref_order_no: &str,
        account_no: &str,
        amount: u64,
    ) -> Result<ResultStatus, LedgerTimeout> {
        self.invoke(CallKind::Credit, ref_order_no, account_no, amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_order() {
        let ledger = ScriptedLedger::with_script([
            LedgerOutcome::Fail,
            LedgerOutcome::Processing,
            LedgerOutcome::Success,
        ]);

        assert_eq!(
            ledger.debit("k1", "acct-1", 500).await,
            Ok(ResultStatus::Fail)
        );
        assert_eq!(
            ledger.debit("k2", "acct-1", 500).await,
            Ok(ResultStatus::Processing)
        );
        assert_eq!(
            ledger.debit("k3", "acct-1", 500).await,
            Ok(ResultStatus::Success)
        );
        // Exhausted script defaults to success.
        assert_eq!(
            ledger.debit("k4", "acct-1", 500).await,
            Ok(ResultStatus::Success)
        );
    }

    #[tokio::test]
    async fn test_repeated_key_is_a_no_op() {
        let ledger = ScriptedLedger::new();

        assert_eq!(
            ledger.credit("k1", "acct-1", 500).await,
            Ok(ResultStatus::Success)
        );
        assert_eq!(
            ledger.credit("k1", "acct-1", 500).await,
            Ok(ResultStatus::Success)
        );

        // Applied exactly once.
        assert_eq!(ledger.balance("acct-1"), 500);
        assert_eq!(ledger.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_key_stays_failed() {
        let ledger = ScriptedLedger::with_script([LedgerOutcome::Fail, LedgerOutcome::Success]);

        assert_eq!(
            ledger.credit("k1", "acct-1", 500).await,
            Ok(ResultStatus::Fail)
        );
        // Same key: still the recorded rejection, script untouched.
        assert_eq!(
            ledger.credit("k1", "acct-1", 500).await,
            Ok(ResultStatus::Fail)
        );
        // A fresh key consumes the next scripted outcome.
        assert_eq!(
            ledger.credit("k2", "acct-1", 500).await,
            Ok(ResultStatus::Success)
        );
        assert_eq!(ledger.balance("acct-1"), 500);
    }

    #[tokio::test]
    async fn test_processing_does_not_commit_the_key() {
        let ledger = ScriptedLedger::with_script([LedgerOutcome::Processing, LedgerOutcome::Success]);

        assert_eq!(
            ledger.debit("k1", "acct-1", 500).await,
            Ok(ResultStatus::Processing)
        );
        assert_eq!(ledger.balance("acct-1"), 0);

        // Retrying the same key reaches the remote again.
        assert_eq!(
            ledger.debit("k1", "acct-1", 500).await,
            Ok(ResultStatus::Success)
        );
        assert_eq!(ledger.balance("acct-1"), -500);
    }

    #[tokio::test]
    async fn test_timeout_is_an_error() {
        let ledger = ScriptedLedger::with_script([LedgerOutcome::Timeout]);
        assert_eq!(ledger.debit("k1", "acct-1", 500).await, Err(LedgerTimeout));
        assert_eq!(ledger.balance("acct-1"), 0);
    }

    #[tokio::test]
    async fn test_seeded_ledger_is_deterministic() {
        let a = SeededLedger::new(42);
        let b = SeededLedger::new(42);

        for i in 0..32 {
            let key = format!("k{i}");
            let ra = a.debit(&key, "acct-1", 100).await;
            let rb = b.debit(&key, "acct-1", 100).await;
            assert_eq!(ra, rb);
        }
    }
}
