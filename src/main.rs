use bridgeport::cli::{handle_completions, serve::run_serve, Cli, Commands};
use bridgeport::config::ConfigError;
use clap::Parser;

/// Exit status for an unusable listen port, matching clap's usage-error code.
const EXIT_INVALID_PORT: i32 = 2;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Completions(args)) => {
            handle_completions(&args);
            Ok(())
        }
        None => run_serve(cli.serve).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        let invalid_port = e
            .downcast_ref::<ConfigError>()
            .is_some_and(ConfigError::is_invalid_port);
        std::process::exit(if invalid_port { EXIT_INVALID_PORT } else { 1 });
    }
}
