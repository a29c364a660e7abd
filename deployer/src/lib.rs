// deployer/src/lib.rs
// Library interface shared by the binary and the integration tests

pub mod artifacts;
pub mod config;
pub mod deploy;
pub mod driver;
pub mod lock;
pub mod units;

pub use artifacts::{ArtifactError, ArtifactStore, ContractArtifact};
pub use config::{load_config, Config, ConfigError};
pub use deploy::{connect, ContractDeployer, DeployClient, DeployedContract, DeploymentRequest, EthersDeployer};
pub use driver::{run_deployment, DeploymentSummary};
pub use lock::{unlock_time_at, LockPlan};
