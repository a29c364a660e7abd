// deployer/src/deploy.rs

use ethers::{
    abi::Token,
    prelude::{ContractFactory, Http, LocalWallet, Middleware, Provider, Signer, SignerMiddleware},
    types::{Address, TransactionReceipt, TxHash, U256, U64},
};
use eyre::{eyre, Result, WrapErr};
use std::{future::Future, sync::Arc, time::Duration};
use tracing::{debug, info, instrument, warn};

use crate::artifacts::ArtifactStore;
use crate::config::Config;

pub type DeployClient = SignerMiddleware<Provider<Http>, LocalWallet>;

const TX_SUCCESS_STATUS: U64 = U64([1]);

/// What to deploy: a named contract, its `uint256` constructor argument and the attached value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentRequest {
    pub contract_name: String,
    pub unlock_time: U256,
    pub value: U256,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployedContract {
    pub address: Address,
    pub transaction_hash: TxHash,
    pub block_number: Option<U64>,
    pub gas_used: Option<U256>,
}

/// Looks up a contract factory, submits the deployment and waits until it is confirmed.
#[allow(async_fn_in_trait)]
pub trait ContractDeployer {
    async fn deploy(&self, request: &DeploymentRequest) -> Result<DeployedContract>;
}

pub struct EthersDeployer<M> {
    client: Arc<M>,
    artifacts: ArtifactStore,
    confirmations: usize,
    confirmation_timeout: Option<Duration>,
}

impl<M: Middleware + 'static> EthersDeployer<M> {
    pub fn new(client: Arc<M>, artifacts: ArtifactStore) -> Self {
        Self {
            client,
            artifacts,
            confirmations: 1,
            confirmation_timeout: None,
        }
    }

    pub fn from_config(client: Arc<M>, config: &Config) -> Self {
        Self::new(client, ArtifactStore::new(&config.artifacts_dir))
            .confirmations(config.confirmations)
            .confirmation_timeout(config.confirmation_timeout)
    }

    pub fn confirmations(mut self, confirmations: usize) -> Self {
        self.confirmations = confirmations.max(1);
        self
    }

    pub fn confirmation_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.confirmation_timeout = timeout;
        self
    }
}

impl<M: Middleware + 'static> ContractDeployer for EthersDeployer<M> {
    #[instrument(skip(self), fields(contract = %request.contract_name))]
    async fn deploy(&self, request: &DeploymentRequest) -> Result<DeployedContract> {
        // 1. Factory lookup
        let artifact = self.artifacts.load(&request.contract_name).wrap_err_with(|| {
            format!(
                "Failed to get contract factory for {} (artifacts at {})",
                request.contract_name,
                self.artifacts.root().display()
            )
        })?;
        debug!(
            artifact = %artifact.fully_qualified_name(),
            bytecode_len = artifact.bytecode.len(),
            "Contract artifact loaded"
        );
        let factory = ContractFactory::new(artifact.abi, artifact.bytecode, self.client.clone());

        // 2. Encode constructor and attach value
        let mut deployer = factory
            .deploy_tokens(vec![Token::Uint(request.unlock_time)])
            .map_err(|e| eyre!("Failed to construct deployment call: {}", e))?
            .confirmations(self.confirmations);
        deployer.tx.set_value(request.value);

        // 3. Submit and wait for the receipt
        info!(
            unlock_time = %request.unlock_time,
            value = %request.value,
            confirmations = self.confirmations,
            "Sending deployment transaction..."
        );
        let outcome = await_confirmation(self.confirmation_timeout, deployer.send_with_receipt()).await?;
        let (contract, receipt) = outcome.map_err(|e| eyre!("Deployment transaction failed: {}", e))?;
        ensure_success(&receipt)?;

        let deployed = DeployedContract {
            address: contract.address(),
            transaction_hash: receipt.transaction_hash,
            block_number: receipt.block_number,
            gas_used: receipt.gas_used,
        };
        info!(
            address = ?deployed.address,
            tx = ?deployed.transaction_hash,
            block = ?deployed.block_number,
            gas_used = ?deployed.gas_used,
            "Deployment confirmed"
        );
        Ok(deployed)
    }
}

/// Awaits `pending`, bounded by `limit` when one is configured.
async fn await_confirmation<F: Future>(limit: Option<Duration>, pending: F) -> Result<F::Output> {
    match limit {
        Some(limit) => tokio::time::timeout(limit, pending).await.map_err(|_| {
            eyre!("Timed out after {}s waiting for deployment confirmation", limit.as_secs())
        }),
        None => Ok(pending.await),
    }
}

fn ensure_success(receipt: &TransactionReceipt) -> Result<()> {
    if receipt.status == Some(TX_SUCCESS_STATUS) {
        return Ok(());
    }
    warn!(tx = ?receipt.transaction_hash, status = ?receipt.status, "Deployment reverted");
    Err(eyre!(
        "Deployment transaction {:?} reverted (status {:?})",
        receipt.transaction_hash,
        receipt.status
    ))
}

/// HTTP provider plus local wallet bound to the node's chain id.
pub async fn connect(config: &Config) -> Result<Arc<DeployClient>> {
    let provider = Provider::<Http>::try_from(config.rpc_url.as_str())
        .wrap_err_with(|| format!("Invalid RPC_URL: {}", config.rpc_url))?
        .interval(config.poll_interval);
    let chain_id = provider
        .get_chainid()
        .await
        .wrap_err_with(|| format!("Failed to reach node at {}", config.rpc_url))?
        .as_u64();
    let wallet = config
        .deployer_private_key
        .parse::<LocalWallet>()
        .wrap_err("DEPLOYER_PRIVATE_KEY is not a valid private key")?
        .with_chain_id(chain_id);
    info!(chain_id, deployer = ?wallet.address(), "Provider & signer ready");

    Ok(Arc::new(SignerMiddleware::new(provider, wallet)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::fixtures::{write_artifact, ScratchDir};
    use ethers::providers::MockProvider;

    fn mocked_client() -> Arc<SignerMiddleware<Provider<MockProvider>, LocalWallet>> {
        let (provider, _mock) = Provider::mocked();
        let wallet: LocalWallet = crate::config::DEFAULT_DEPLOYER_KEY.parse().unwrap();
        Arc::new(SignerMiddleware::new(provider, wallet.with_chain_id(31337u64)))
    }

    fn request(name: &str) -> DeploymentRequest {
        DeploymentRequest {
            contract_name: name.to_string(),
            unlock_time: U256::from(1_700_000_060u64),
            value: U256::exp10(15),
        }
    }

    fn receipt_with_status(status: Option<u64>) -> TransactionReceipt {
        TransactionReceipt {
            transaction_hash: TxHash::repeat_byte(0x11),
            status: status.map(U64::from),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn missing_artifact_fails_before_touching_the_node() {
        let scratch = ScratchDir::new();
        let deployer = EthersDeployer::new(mocked_client(), ArtifactStore::new(scratch.path()));

        let err = deployer.deploy(&request("FimboToken")).await.unwrap_err();
        assert!(err.to_string().contains("Failed to get contract factory for FimboToken"));
    }

    #[tokio::test]
    async fn node_errors_surface_as_deployment_failure() {
        let scratch = ScratchDir::new();
        write_artifact(scratch.path(), "contracts/FimboToken.sol", "FimboToken", "0x6080604052", "{}");
        // The mock has no queued responses, so the first RPC call fails.
        let deployer = EthersDeployer::new(mocked_client(), ArtifactStore::new(scratch.path()));

        let err = deployer.deploy(&request("FimboToken")).await.unwrap_err();
        assert!(err.to_string().contains("Deployment transaction failed"));
    }

    #[test]
    fn at_least_one_confirmation_is_awaited() {
        let deployer = EthersDeployer::new(mocked_client(), ArtifactStore::new("artifacts")).confirmations(0);
        assert_eq!(deployer.confirmations, 1);
    }

    #[test]
    fn successful_receipt_passes() {
        assert!(ensure_success(&receipt_with_status(Some(1))).is_ok());
    }

    #[test]
    fn reverted_receipt_is_a_failure() {
        let err = ensure_success(&receipt_with_status(Some(0))).unwrap_err();
        assert!(err.to_string().contains("reverted"));
    }

    #[test]
    fn receipt_without_status_is_a_failure() {
        assert!(ensure_success(&receipt_with_status(None)).is_err());
    }

    #[tokio::test]
    async fn stalled_confirmation_times_out() {
        let stalled = std::future::pending::<()>();
        let err = await_confirmation(Some(Duration::from_millis(20)), stalled).await.unwrap_err();
        assert!(err.to_string().contains("Timed out"));
    }

    #[tokio::test]
    async fn confirmation_within_limit_is_returned() {
        let outcome = await_confirmation(Some(Duration::from_secs(5)), async { 7 }).await.unwrap();
        assert_eq!(outcome, 7);
        assert_eq!(await_confirmation(None, async { 8 }).await.unwrap(), 8);
    }
}
