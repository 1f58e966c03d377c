mod cli;
mod commands;
mod git;

use clap::Parser;
use cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_dir = if cli.no_log_file {
        None
    } else {
        commitpod_core::get_config_home().map(|home| home.join("logs"))
    };
    let _guard = match commitpod_core::init_logging(&cli.log_level, log_dir.as_deref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = commands::execute(cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
