use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, error, info};

use modx_remote::config::{AppConfig, ConfigManager};
use modx_remote::{logging, RemoteHandler, TIMEOUT_EXIT_CODE};

/// Shell status used for timeouts, same as coreutils `timeout`.
const TIMEOUT_STATUS: i32 = 124;
const LAUNCH_FAILURE_STATUS: i32 = 127;

#[derive(Debug, Parser)]
#[command(
    name = "modx-remote",
    version,
    about = "Run a modx command on a remote host over ssh"
)]
struct Cli {
    /// ssh client config used to recognise host aliases
    #[arg(long, value_name = "PATH")]
    ssh_config: Option<PathBuf>,

    /// Seconds before the remote command is killed
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Print the ssh command line instead of running it
    #[arg(long)]
    dry_run: bool,

    /// [user@]host[:port][path], or an ssh config alias
    connection: String,

    /// modx command to run, e.g. cache:clear
    command: String,

    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let app_config = match ConfigManager::new() {
        Ok(config_manager) => {
            // Setup logging
            match logging::init(&config_manager.log_dir()) {
                Ok(log_file) => debug!("Logging to {}", log_file.display()),
                Err(e) => eprintln!("Warning: logging disabled: {:#}", e),
            }
            config_manager.load_or_default()
        }
        Err(e) => {
            eprintln!("Warning: no config directory, using defaults: {:#}", e);
            AppConfig::default()
        }
    };

    let ssh_config = cli.ssh_config.or_else(|| app_config.ssh_config_path());
    let timeout = cli
        .timeout
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
        .unwrap_or_else(|| app_config.timeout());

    let handler = RemoteHandler::new()
        .ssh_config(ssh_config)
        .program(app_config.remote_program.as_str())
        .timeout(timeout);

    if cli.dry_run {
        let descriptor = handler.descriptor(&cli.connection);
        println!(
            "{}",
            handler
                .proxy(&descriptor, &cli.command, &cli.args)
                .command_line()
        );
        return Ok(());
    }

    info!("Remote {} on {}", cli.command, cli.connection);

    let code = match handler.execute(&cli.connection, &cli.command, &cli.args).await {
        Ok(TIMEOUT_EXIT_CODE) => TIMEOUT_STATUS,
        Ok(code) => code,
        Err(e) => {
            error!("Failed to run remote command: {}", e);
            eprintln!("Error: {}", e);
            LAUNCH_FAILURE_STATUS
        }
    };

    std::process::exit(code);
}
