// src/main.rs

use stagehand::{cli, logging};

#[tokio::main]
async fn main() {
    let args = cli::parse();

    if let Err(err) = logging::init_logging(args.log_level) {
        eprintln!("stagehand: failed to initialise logging: {err}");
        std::process::exit(1);
    }

    if let Err(err) = stagehand::run(args).await {
        eprintln!("stagehand error: {err}");
        std::process::exit(err.exit_code());
    }
}
