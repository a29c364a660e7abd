// deployer/src/artifacts.rs
// Resolves compiled Hardhat artifacts by contract name.

use ethers::{abi::Abi, types::Bytes};
use serde::Deserialize;
use serde_json::Value;
use std::{
    collections::BTreeMap,
    fs, io,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::debug;

const BUILD_INFO_DIR: &str = "build-info";
const DEBUG_SUFFIX: &str = ".dbg.json";

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("artifact for contract {name:?} not found under {dir}")]
    NotFound { name: String, dir: PathBuf },
    #[error("contract name {name:?} is ambiguous, use a fully qualified name: {}", candidates.join(", "))]
    Ambiguous { name: String, candidates: Vec<String> },
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed artifact {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("contract {0} has no bytecode (abstract contract or interface)")]
    NoBytecode(String),
    #[error("contract {name} has invalid bytecode: {source}")]
    InvalidBytecode {
        name: String,
        #[source]
        source: hex::FromHexError,
    },
    #[error("contract {name} must be linked to libraries first: {}", libraries.join(", "))]
    NeedsLinking { name: String, libraries: Vec<String> },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawArtifact {
    contract_name: String,
    source_name: String,
    abi: Abi,
    bytecode: String,
    #[serde(default)]
    link_references: BTreeMap<String, BTreeMap<String, Value>>,
}

/// ABI and creation bytecode of a compiled contract.
#[derive(Debug, Clone)]
pub struct ContractArtifact {
    pub contract_name: String,
    pub source_name: String,
    pub abi: Abi,
    pub bytecode: Bytes,
}

impl ContractArtifact {
    pub fn fully_qualified_name(&self) -> String {
        format!("{}:{}", self.source_name, self.contract_name)
    }
}

#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Accepts either a bare name (`FimboToken`) or a fully qualified one
    /// (`contracts/FimboToken.sol:FimboToken`).
    pub fn load(&self, name: &str) -> Result<ContractArtifact, ArtifactError> {
        let path = self.resolve(name)?;
        debug!(path = %path.display(), "Reading contract artifact");
        let raw = fs::read_to_string(&path).map_err(|source| ArtifactError::Io {
            path: path.clone(),
            source,
        })?;
        let artifact: RawArtifact =
            serde_json::from_str(&raw).map_err(|source| ArtifactError::Json { path, source })?;
        artifact.into_contract()
    }

    fn resolve(&self, name: &str) -> Result<PathBuf, ArtifactError> {
        if let Some((source, contract)) = name.rsplit_once(':') {
            let path = self.root.join(source).join(format!("{}.json", contract));
            return if path.is_file() {
                Ok(path)
            } else {
                Err(ArtifactError::NotFound {
                    name: name.to_string(),
                    dir: self.root.clone(),
                })
            };
        }

        let file_name = format!("{}.json", name);
        let mut matches = Vec::new();
        self.collect(&self.root, &file_name, &mut matches)?;
        matches.sort();

        match matches.len() {
            0 => Err(ArtifactError::NotFound {
                name: name.to_string(),
                dir: self.root.clone(),
            }),
            1 => Ok(matches.remove(0)),
            _ => Err(ArtifactError::Ambiguous {
                name: name.to_string(),
                candidates: matches.iter().map(|p| self.qualified_name(p, name)).collect(),
            }),
        }
    }

    fn collect(&self, dir: &Path, file_name: &str, out: &mut Vec<PathBuf>) -> Result<(), ArtifactError> {
        let entries = fs::read_dir(dir).map_err(|source| ArtifactError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        for entry in entries {
            let entry = entry.map_err(|source| ArtifactError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
            let path = entry.path();
            let entry_name = entry.file_name();
            let entry_name = entry_name.to_string_lossy();

            if path.is_dir() {
                if entry_name != BUILD_INFO_DIR {
                    self.collect(&path, file_name, out)?;
                }
            } else if entry_name == file_name
                && !entry_name.ends_with(DEBUG_SUFFIX)
                && in_source_dir(&path)
            {
                out.push(path);
            }
        }
        Ok(())
    }

    fn qualified_name(&self, path: &Path, contract: &str) -> String {
        let source = path
            .parent()
            .and_then(|p| p.strip_prefix(&self.root).ok())
            .map(|p| p.to_string_lossy().replace('\\', "/"))
            .unwrap_or_default();
        format!("{}:{}", source, contract)
    }
}

fn in_source_dir(path: &Path) -> bool {
    path.parent()
        .and_then(|p| p.extension())
        .map_or(false, |ext| ext == "sol")
}

impl RawArtifact {
    fn into_contract(self) -> Result<ContractArtifact, ArtifactError> {
        let libraries: Vec<String> = self
            .link_references
            .iter()
            .flat_map(|(source, libs)| libs.keys().map(move |lib| format!("{}:{}", source, lib)))
            .collect();
        if !libraries.is_empty() {
            return Err(ArtifactError::NeedsLinking {
                name: self.contract_name,
                libraries,
            });
        }

        let cleaned = self.bytecode.trim().trim_start_matches("0x");
        if cleaned.is_empty() {
            return Err(ArtifactError::NoBytecode(self.contract_name));
        }
        let bytecode = hex::decode(cleaned).map_err(|source| ArtifactError::InvalidBytecode {
            name: self.contract_name.clone(),
            source,
        })?;

        Ok(ContractArtifact {
            contract_name: self.contract_name,
            source_name: self.source_name,
            abi: self.abi,
            bytecode: Bytes::from(bytecode),
        })
    }
}
