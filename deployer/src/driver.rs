// deployer/src/driver.rs

use chrono::{DateTime, Utc};
use ethers::{
    types::{Address, U256},
    utils::to_checksum,
};
use eyre::Result;
use std::{fmt, io::Write};
use tracing::info;

use crate::config::Config;
use crate::deploy::{ContractDeployer, DeploymentRequest};
use crate::lock::LockPlan;
use crate::units::format_ether;

/// The line printed after a confirmed deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentSummary {
    pub locked_amount: String,
    pub unlock_time: u64,
    pub address: Address,
}

impl fmt::Display for DeploymentSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Lock with {}ETH and unlock timestamp {} deployed to {}",
            self.locked_amount,
            self.unlock_time,
            to_checksum(&self.address, None)
        )
    }
}

/// Runs one deployment and writes the summary to `out`. Nothing is written unless the deployment is confirmed.
pub async fn run_deployment<D, W>(
    deployer: &D,
    config: &Config,
    now: DateTime<Utc>,
    out: &mut W,
) -> Result<DeploymentSummary>
where
    D: ContractDeployer,
    W: Write,
{
    let plan = LockPlan::at(now, config)?;
    info!(unlock_time = plan.unlock_time, locked_wei = %plan.locked_amount, "Lock plan ready");

    let request = DeploymentRequest {
        contract_name: config.contract_name.clone(),
        unlock_time: U256::from(plan.unlock_time),
        value: plan.locked_amount,
    };
    let deployed = deployer.deploy(&request).await?;

    let summary = DeploymentSummary {
        locked_amount: format_ether(request.value)?,
        unlock_time: plan.unlock_time,
        address: deployed.address,
    };
    writeln!(out, "{}", summary)?;
    Ok(summary)
}
