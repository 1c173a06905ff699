// admin-client/src/main.rs
use admin_client::cli::{run, Cli};
use clap::Parser;
use common::{setup_tracing, Config};
use std::process::ExitCode;

#[actix::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Load configuration, then let flags override it
    let mut config = Config::from_env();
    cli.apply(&mut config);

    setup_tracing(&config.log_level);
    tracing::debug!("Using clinic service at {}", config.api_base_url);

    let code = run(cli, config).await;
    actix::System::current().stop();
    code
}
