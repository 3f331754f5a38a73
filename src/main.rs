use clap::Parser;
use users_api::cli::{self, Cli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = cli::load_and_merge_config(&cli)?;
    let log_handle = cli::init_logger_from_settings(&settings)?;

    #[cfg(unix)]
    if cli.runs_server() {
        cli::watch_log_level(cli.clone(), log_handle)?;
    }
    #[cfg(not(unix))]
    drop(log_handle);

    cli::execute_command(&cli, settings).await.inspect_err(|e| {
        tracing::error!(error = %e, "Command failed");
    })
}
