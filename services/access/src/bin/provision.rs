//! Operator tool: append freshly generated access codes to the code table.
//!
//! ```bash
//! CODES_PATH=data/valid_codes.csv provision --count 500
//! ```

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

use pulse_access::config::AccessConfig;
use pulse_access::infra::csv_ledger::CsvLedgerStore;
use pulse_access::usecase::ledger::CodeLedger;
use pulse_access::usecase::provision::ProvisionCodesUseCase;
use pulse_core::config::Config;
use pulse_core::tracing::init_tracing;

#[derive(Parser)]
#[command(about = "Provision one-time access codes")]
struct Args {
    /// Number of new codes to append
    #[arg(long)]
    count: usize,

    /// Print the new codes to stdout
    #[arg(long)]
    print: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    let config = AccessConfig::from_env();

    // Shares the service's lock file, so running this against a live
    // service is safe.
    let store = CsvLedgerStore::new(
        &config.codes_path,
        &config.issuance_log_path,
        &config.usage_log_path,
    );
    let usecase = ProvisionCodesUseCase {
        ledger: Arc::new(CodeLedger::new(store)),
    };
    let added = usecase.execute(args.count).await?;

    if args.print {
        for code in &added {
            println!("{code}");
        }
    }
    eprintln!(
        "Added {} code(s) to {}",
        added.len(),
        config.codes_path.display()
    );
    Ok(())
}
