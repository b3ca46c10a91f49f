//! Step processors and the normalized step outcome.

use std::fmt;

use async_trait::async_trait;

use super::FlowContext;
use super::error::FlowError;

/// Normalized outcome of a remote step.
///
/// A collaborator timeout is never surfaced as a fourth status: the true
/// outcome is unknown, not negative, so processors map it to `Processing`
/// and the step is retried later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultStatus {
    /// The remote operation completed.
    Success,
    /// The remote operation was explicitly rejected (safe to settle or
    /// compensate).
    Fail,
    /// The remote operation is still in flight; suspend and retry later.
    Processing,
}

impl ResultStatus {
    #[inline]
    pub fn is_success(&self) -> bool {
        matches!(self, ResultStatus::Success)
    }

    #[inline]
    pub fn is_fail(&self) -> bool {
        matches!(self, ResultStatus::Fail)
    }

    /// Unknown outcome; must not be conflated with `Fail`.
    #[inline]
    pub fn is_processing(&self) -> bool {
        matches!(self, ResultStatus::Processing)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResultStatus::Success => "SUCCESS",
            ResultStatus::Fail => "FAIL",
            ResultStatus::Processing => "PROCESSING",
        }
    }
}

impl fmt::Display for ResultStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One unit of remote work inside a flow node.
///
/// Expected remote outcomes (including timeouts) flow through
/// [`ResultStatus`]; only unexpected programmer/collaborator errors are
/// returned as `Err`.
#[async_trait]
pub trait StepProcessor<C: FlowContext>: Send + Sync {
    /// Processor name for logging.
    fn name(&self) -> &'static str;

    /// Run the step against the live context.
    async fn execute(&self, ctx: &mut C) -> Result<ResultStatus, FlowError>;
}
