use anyhow::Result;
use std::process::ExitCode;
use tracing::{error, info};

mod browser;
mod cli;
mod crawler;
mod storage;
mod utils;

/// Exit status for a failed command, a missing start URL included
const FAILURE_EXIT_CODE: u8 = 1;

/// Process exit status for the outcome of a command
fn exit_status(result: &Result<()>) -> u8 {
    match result {
        Ok(()) => 0,
        Err(_) => FAILURE_EXIT_CODE,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = cli::parse_args();

    if let Err(e) = utils::init_logging(args.verbose, args.log_file.clone()) {
        eprintln!("Failed to initialize logging: {:#}", e);
        return ExitCode::from(FAILURE_EXIT_CODE);
    }

    info!("Starting Article Crawler v{}", env!("CARGO_PKG_VERSION"));

    let result = cli::process_command(args).await;
    match &result {
        Ok(()) => info!("Command completed successfully"),
        Err(e) => error!("Command failed: {:#}", e),
    }

    ExitCode::from(exit_status(&result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::error::CrawlError;
    use clap::Parser;

    #[test]
    fn test_exit_status() {
        assert_eq!(exit_status(&Ok(())), 0);

        let missing_seed: Result<()> = Err(CrawlError::MissingStartUrl.into());
        assert_eq!(exit_status(&missing_seed), 1);

        let bad_config: Result<()> = Err(anyhow::anyhow!("Failed to parse configuration file"));
        assert_eq!(exit_status(&bad_config), 1);
    }

    #[tokio::test]
    async fn test_missing_start_url_exits_with_status_one() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("site.yaml");
        std::fs::write(&config_path, "start_role: LISTING\n").unwrap();

        let cli = cli::Cli::try_parse_from([
            "crawler",
            "crawl",
            "--config",
            config_path.to_str().unwrap(),
        ])
        .unwrap();

        assert_eq!(exit_status(&cli::process_command(cli).await), 1);
    }
}
