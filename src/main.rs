// src/main.rs

use colored::Colorize;
use gitgate::{cli, logging, run};

#[tokio::main]
async fn main() {
    // The only place the process exits on failure.
    if let Err(err) = run_main().await {
        eprintln!("{}", err.to_string().red());
        std::process::exit(1);
    }
}

async fn run_main() -> gitgate::errors::Result<()> {
    let args = cli::parse();
    logging::init_logging(args.effective_log_level())?;
    run(args).await
}
