//! Transfer saga demo driver.
//!
//! Runs a handful of randomized transfers against the seeded mock ledger
//! and drives suspended ones to settlement through the recovery worker.
//!
//! ```text
//! ┌─────────┐    ┌──────────────┐    ┌─────────────┐    ┌────────────┐
//! │  Order  │───▶│TransferService│──▶│ Flow Engine │───▶│ Mock Ledger│
//! └─────────┘    └──────────────┘    └─────────────┘    └────────────┘
//!                        ▲                  │ suspend
//!                        └── RecoveryWorker ┘
//! ```

use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{error, info, warn};

use ledgerflow::config::AppConfig;
use ledgerflow::ledger::SeededLedger;
use ledgerflow::logging::init_logging;
use ledgerflow::transfer::{RecoveryWorker, TransferOrder, TransferService, WorkerConfig};

fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if args[i] == "--env" && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "dev".to_string()
}

#[tokio::main]
async fn main() {
    let env = get_env();
    let config = AppConfig::load_or_default(&env);
    let _guard = init_logging(&config);

    info!(env = %env, seed = config.ledger.seed, "starting transfer demo");

    let ledger = Arc::new(SeededLedger::new(config.ledger.seed));
    let service =
        Arc::new(TransferService::assemble(ledger).expect("flow definitions are static"));

    let worker = RecoveryWorker::new(service.clone(), WorkerConfig {
        scan_interval: Duration::from_secs(config.worker.scan_interval_secs),
        // Demo: resume as soon as we scan.
        stale_threshold: Duration::ZERO,
        batch_size: config.worker.batch_size,
    });

    let mut rng = StdRng::seed_from_u64(config.ledger.seed);
    for i in 0..5 {
        let order = TransferOrder {
            order_no: format!("order-{i:04}"),
            payer_account_no: format!("acct-{}", rng.gen_range(1000..2000)),
            payee_account_no: format!("acct-{}", rng.gen_range(2000..3000)),
            amount: rng.gen_range(1..10_000),
        };

        match service.transfer(order).await {
            Ok(receipt) if receipt.settled() => {
                info!(
                    order_no = %receipt.order_no,
                    biz_no = %receipt.biz_no,
                    status = %receipt.status,
                    "transfer settled"
                );
            }
            Ok(receipt) => {
                warn!(
                    order_no = %receipt.order_no,
                    biz_no = %receipt.biz_no,
                    status = %receipt.status,
                    "transfer suspended, recovery will resume it"
                );
            }
            Err(e) => error!(error = %e, "transfer rejected"),
        }
    }

    // Drive any suspended sagas to settlement.
    for _ in 0..32 {
        if service.store().suspended().is_empty() {
            break;
        }
        if let Err(e) = worker.scan_and_recover().await {
            error!(error = %e, "recovery scan failed");
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    info!(
        remaining = service.store().suspended().len(),
        "transfer demo finished"
    );
}
