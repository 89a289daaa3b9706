use anyhow::Result;
use clap::{CommandFactory, Parser};
use std::path::PathBuf;

use balance_tracker::{logging, Config};

#[derive(Parser, Debug)]
#[command(name = "balance-tracker")]
#[command(about = "Aggregate native balances and USD value across chains", long_about = None)]
struct Args {
    /// Wallets to query: a bare address (chain inferred) or `chain:address`
    wallets: Vec<String>,

    /// JSON config file replacing the built-in chain table
    #[arg(short, long, env = "BALANCE_TRACKER_CONFIG")]
    config: Option<PathBuf>,

    /// Always print per-native-unit subtotals
    #[arg(long)]
    native_totals: bool,

    /// Log level when RUST_LOG is unset
    #[arg(long, default_value = logging::DEFAULT_LEVEL)]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.wallets.is_empty() {
        eprintln!("{}", Args::command().render_usage());
        eprintln!("Example: balance-tracker 0x742d35Cc6634C0532925a3b844Bc454e4438f44e sol:8vJ1EEeJBSX8UZetuHY7d2SiGjdw2AhfamzfxokPsCF4");
        std::process::exit(1);
    }

    logging::init_logging(&args.log_level);

    let config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::load()?,
    };
    let native_subtotals = args.native_totals || config.native_subtotals;

    let report = balance_tracker::check_wallets(&config, &args.wallets).await?;
    println!("{}", report.render(native_subtotals));

    Ok(())
}
