//! Recovery worker.
//!
//! The engine never drives its own retries: resumption belongs to an
//! external trigger. This worker is that trigger for deployments without an
//! inbound callback: it periodically scans the store for stale suspensions
//! and resumes them in batches.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info};

use super::service::{TransferError, TransferService};

/// Configuration for the recovery worker.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// How often to scan for stale suspensions.
    pub scan_interval: Duration,
    /// How long an instance must sit suspended to be considered stale.
    pub stale_threshold: Duration,
    /// Maximum instances to resume per scan.
    pub batch_size: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            scan_interval: Duration::from_secs(30),
            stale_threshold: Duration::from_secs(60),
            batch_size: 100,
        }
    }
}

pub struct RecoveryWorker {
    service: Arc<TransferService>,
    config: WorkerConfig,
}

impl RecoveryWorker {
    pub fn new(service: Arc<TransferService>, config: WorkerConfig) -> Self {
        Self { service, config }
    }

    pub fn with_defaults(service: Arc<TransferService>) -> Self {
        Self::new(service, WorkerConfig::default())
    }

    /// Run the recovery loop forever.
    pub async fn run(&self) -> ! {
        info!(
            scan_interval_secs = self.config.scan_interval.as_secs(),
            stale_threshold_secs = self.config.stale_threshold.as_secs(),
            "starting recovery worker"
        );

        loop {
            if let Err(e) = self.scan_and_recover().await {
                error!(error = %e, "recovery scan failed");
            }
            tokio::time::sleep(self.config.scan_interval).await;
        }
    }

    /// Run a single scan cycle; returns how many transfers settled.
    pub async fn scan_and_recover(&self) -> Result<usize, TransferError> {
        let stale = self
            .service
            .store()
            .suspended_since(self.config.stale_threshold);

        if stale.is_empty() {
            debug!("no stale transfers found");
            return Ok(0);
        }

        info!(count = stale.len(), "found stale transfers to resume");

        let mut settled = 0;
        for stored in stale.iter().take(self.config.batch_size) {
            let biz_no = stored.context.biz_no.clone();
            debug!(
                biz_no = %biz_no,
                status = %stored.context.status,
                resume_at = stored.resume_at.as_deref().unwrap_or("-"),
                "resuming transfer"
            );

            match self.service.resume(&biz_no).await {
                Ok(receipt) if receipt.settled() => {
                    info!(biz_no = %biz_no, status = %receipt.status, "transfer settled");
                    settled += 1;
                }
                Ok(receipt) => {
                    debug!(
                        biz_no = %biz_no,
                        status = %receipt.status,
                        "transfer still suspended"
                    );
                }
                Err(e) => {
                    error!(biz_no = %biz_no, error = %e, "failed to resume transfer");
                }
            }
        }

        if settled > 0 {
            info!(count = settled, "settled transfers this scan");
        }

        Ok(settled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_config_default() {
        let config = WorkerConfig::default();
        assert_eq!(config.scan_interval, Duration::from_secs(30));
        assert_eq!(config.stale_threshold, Duration::from_secs(60));
        assert_eq!(config.batch_size, 100);
    }
}
