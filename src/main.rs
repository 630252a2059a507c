mod cli;
mod config;
mod output;

use clap::Parser;
use cli::{Cli, Commands, OutputFormat};
use deployer::{
    run_address, run_deploy, DeployError, DeployPlan, Result, TactContract, TonhubLinkDeployer,
};
use serde_json::json;
use std::io::Write;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if !err.use_stderr() => err.exit(),
        Err(err) => {
            err.print().ok();
            let usage = DeployError::CliError(err.kind().to_string());
            std::process::exit(usage.exit_code());
        }
    };
    let command = cli.command.unwrap_or(Commands::Deploy);

    if let Err(err) = run(&cli, command).await {
        error!("{} failed: {}", command.name(), err);
        output::emit_error(&cli.output, command.name(), &err);
        std::process::exit(err.exit_code());
    }
}

async fn run(cli: &Cli, command: Commands) -> Result<()> {
    let config = config::load_config(cli.config.clone(), cli.build_dir.clone()).await?;
    let plan = DeployPlan::simple_storage()?;
    let contract = TactContract::simple_storage(config.build_dir.clone());

    // JSON mode keeps stdout for the envelope.
    let mut diagnostics: Box<dyn Write> = match cli.output {
        OutputFormat::Text => Box::new(std::io::stdout()),
        OutputFormat::Json => Box::new(std::io::stderr()),
    };

    match command {
        Commands::Address => {
            let report = run_address(&plan, &contract, diagnostics.as_mut()).await?;
            let mut payload = serde_json::to_value(&report)?;
            payload["message"] = json!(format!("Raw address: {}", report.raw_address));
            output::emit_output(&cli.output, command.name(), payload);
        }
        Commands::Deploy => {
            let deployer = TonhubLinkDeployer::new(config.tonhub_host);
            let report = run_deploy(&plan, &contract, &deployer, diagnostics.as_mut()).await?;
            info!("Deploy link ready for {}", report.address);
            let mut payload = serde_json::to_value(&report)?;
            payload["message"] = json!(format!("Deploy: {}", report.link));
            output::emit_output(&cli.output, command.name(), payload);
        }
    }

    Ok(())
}
