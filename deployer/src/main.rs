// deployer/src/main.rs

use chrono::Utc;
use eyre::Result;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use fimbo_deploy::{connect, load_config, run_deployment, DeploymentSummary, EthersDeployer};

fn setup_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // Logs go to stderr; stdout only carries the deployment summary.
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run() -> Result<DeploymentSummary> {
    let config = load_config()?;
    let now = Utc::now();

    let client = connect(&config).await?;
    let deployer = EthersDeployer::from_config(client, &config);

    let mut stdout = std::io::stdout().lock();
    run_deployment(&deployer, &config, now, &mut stdout).await
}

#[tokio::main]
async fn main() -> ExitCode {
    setup_tracing();

    match run().await {
        Ok(summary) => {
            info!(address = ?summary.address, "Deployment complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Deployment failed: {:?}", e);
            ExitCode::FAILURE
        }
    }
}
