//! Contract initializers backed by Tact compiler output.
//!
//! The Tact build writes `<project>_<Contract>.pkg` (a JSON package with the
//! code BoC and init layout) and `<project>_<Contract>.code.boc` into the
//! build directory.

use crate::cell::{Cell, CellBuilder};
use crate::error::{DeployError, Result};
use crate::ports::{ContractInitializer, PortFuture};
use crate::state_init::StateInit;
use serde::Deserialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const DEFAULT_BUILD_DIR: &str = "build";
pub const SAMPLE_PROJECT: &str = "sample";
pub const SIMPLE_STORAGE: &str = "SimpleStorage";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TactArtifacts {
    build_dir: PathBuf,
    project: String,
    contract: String,
}

impl TactArtifacts {
    #[must_use]
    pub fn new(
        build_dir: impl Into<PathBuf>,
        project: impl Into<String>,
        contract: impl Into<String>,
    ) -> Self {
        Self {
            build_dir: build_dir.into(),
            project: project.into(),
            contract: contract.into(),
        }
    }

    #[must_use]
    pub fn build_dir(&self) -> &Path {
        &self.build_dir
    }

    #[must_use]
    pub fn contract(&self) -> &str {
        &self.contract
    }

    #[must_use]
    pub fn package_path(&self) -> PathBuf {
        self.build_dir
            .join(format!("{}_{}.pkg", self.project, self.contract))
    }

    #[must_use]
    pub fn code_boc_path(&self) -> PathBuf {
        self.build_dir
            .join(format!("{}_{}.code.boc", self.project, self.contract))
    }
}

#[derive(Debug, Deserialize)]
struct TactPackage {
    name: String,
    code: String,
    init: Option<PackageInit>,
}

#[derive(Debug, Deserialize)]
struct PackageInit {
    kind: String,
    #[serde(default)]
    args: Vec<serde_json::Value>,
    prefix: Option<InitPrefix>,
    deployment: Option<PackageDeployment>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct InitPrefix {
    bits: usize,
    value: u64,
}

/// Tact stores a single `0` bit in front of the init arguments.
const LAZY_INIT_PREFIX: InitPrefix = InitPrefix { bits: 1, value: 0 };

#[derive(Debug, Deserialize)]
struct PackageDeployment {
    kind: String,
    system: Option<String>,
}

/// A parameterless Tact contract whose `init()` is read from the build output.
#[derive(Debug, Clone)]
pub struct TactContract {
    artifacts: TactArtifacts,
}

impl TactContract {
    #[must_use]
    pub const fn new(artifacts: TactArtifacts) -> Self {
        Self { artifacts }
    }

    /// The `SimpleStorage` contract of the `sample` project.
    #[must_use]
    pub fn simple_storage(build_dir: impl Into<PathBuf>) -> Self {
        Self::new(TactArtifacts::new(build_dir, SAMPLE_PROJECT, SIMPLE_STORAGE))
    }

    #[must_use]
    pub const fn artifacts(&self) -> &TactArtifacts {
        &self.artifacts
    }

    async fn load(&self) -> Result<StateInit> {
        let package_path = self.artifacts.package_path();
        match tokio::fs::read_to_string(&package_path).await {
            Ok(content) => {
                debug!("Loading Tact package {}", package_path.display());
                let package: TactPackage = serde_json::from_str(&content)?;
                return self.init_from_package(&package);
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("No Tact package at {}", package_path.display());
            }
            Err(err) => return Err(err.into()),
        }

        let code_path = self.artifacts.code_boc_path();
        match tokio::fs::read(&code_path).await {
            Ok(bytes) => {
                info!("Loading contract code from {}", code_path.display());
                let code = Cell::from_boc(&bytes)?;
                Ok(StateInit::new(code, build_data(None, LAZY_INIT_PREFIX)?))
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Err(DeployError::InitError(format!(
                "no compiled artifacts for {} in {}; run the Tact build first",
                self.artifacts.contract(),
                self.artifacts.build_dir().display()
            ))),
            Err(err) => Err(err.into()),
        }
    }

    fn init_from_package(&self, package: &TactPackage) -> Result<StateInit> {
        if package.name != self.artifacts.contract() {
            warn!(
                "Package declares contract {} but {} was requested",
                package.name,
                self.artifacts.contract()
            );
        }
        let code = Cell::from_boc_base64(&package.code)?;

        let Some(init) = &package.init else {
            return Ok(StateInit::new(code, build_data(None, LAZY_INIT_PREFIX)?));
        };
        if init.kind != "direct" {
            return Err(DeployError::InitError(format!(
                "unsupported init kind '{}'",
                init.kind
            )));
        }
        if !init.args.is_empty() {
            return Err(DeployError::InitError(format!(
                "{} expects {} init arguments; only parameterless contracts are supported",
                package.name,
                init.args.len()
            )));
        }

        let system = match &init.deployment {
            Some(deployment) if deployment.kind == "system-cell" => deployment
                .system
                .as_deref()
                .map(Cell::from_boc_base64)
                .transpose()?,
            Some(deployment) => {
                return Err(DeployError::InitError(format!(
                    "unsupported deployment kind '{}'",
                    deployment.kind
                )))
            }
            None => None,
        };

        let prefix = init.prefix.unwrap_or(LAZY_INIT_PREFIX);
        Ok(StateInit::new(code, build_data(system, prefix)?))
    }
}

fn build_data(system: Option<Cell>, prefix: InitPrefix) -> Result<Cell> {
    let mut builder = CellBuilder::new();
    if let Some(system) = system {
        builder.store_ref(system)?;
    }
    builder.store_uint(prefix.value, prefix.bits)?;
    builder.build()
}

impl ContractInitializer for TactContract {
    fn name(&self) -> &str {
        self.artifacts.contract()
    }

    fn init(&self) -> PortFuture<'_, StateInit> {
        Box::pin(self.load())
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::cell::{serialize_boc, BocOptions};
    use serde_json::json;

    fn code_cell() -> Cell {
        let mut code = CellBuilder::new();
        code.store_bytes(&hex::decode("ff00f4a413f4bcf2c80b").unwrap())
            .unwrap();
        code.build().unwrap()
    }

    fn system_cell() -> Cell {
        let mut system = CellBuilder::new();
        system.store_bytes(&[0x01, 0x02]).unwrap();
        system.build().unwrap()
    }

    #[test]
    fn artifact_paths_follow_tact_naming() {
        let artifacts = TactArtifacts::new("build", SAMPLE_PROJECT, SIMPLE_STORAGE);
        assert_eq!(
            artifacts.package_path(),
            PathBuf::from("build/sample_SimpleStorage.pkg")
        );
        assert_eq!(
            artifacts.code_boc_path(),
            PathBuf::from("build/sample_SimpleStorage.code.boc")
        );
    }

    #[tokio::test]
    async fn package_with_system_cell_builds_tact_data_layout() {
        let dir = tempfile::TempDir::new().unwrap();
        let package = json!({
            "name": "SimpleStorage",
            "code": code_cell().to_boc_base64().unwrap(),
            "init": {
                "kind": "direct",
                "args": [],
                "prefix": { "bits": 1, "value": 0 },
                "deployment": {
                    "kind": "system-cell",
                    "system": system_cell().to_boc_base64().unwrap()
                }
            }
        });
        tokio::fs::write(dir.path().join("sample_SimpleStorage.pkg"), package.to_string())
            .await
            .unwrap();

        let contract = TactContract::simple_storage(dir.path());
        let init = contract.init().await.unwrap();

        assert_eq!(contract.name(), "SimpleStorage");
        assert_eq!(*init.code(), code_cell());
        assert_eq!(init.data().bit_len(), 1);
        assert_eq!(init.data().refs(), &[system_cell()]);
        assert_eq!(
            init.to_cell().unwrap().hash_hex(),
            "3c3c2a6f8f8d247f1e5e12efca3d7fe40a83ded3df1f9b99113977c53d18b81b"
        );
    }

    #[tokio::test]
    async fn code_boc_fallback_uses_lazy_init_bit() {
        let dir = tempfile::TempDir::new().unwrap();
        let bytes = serialize_boc(&[code_cell()], BocOptions::default()).unwrap();
        tokio::fs::write(dir.path().join("sample_SimpleStorage.code.boc"), bytes)
            .await
            .unwrap();

        let init = TactContract::simple_storage(dir.path())
            .init()
            .await
            .unwrap();
        assert_eq!(
            init.to_cell().unwrap().hash_hex(),
            "11dca000bc12717fba5a163b48882cd8648d56bc18e470be753e36ca7f1bb2d1"
        );
    }

    #[tokio::test]
    async fn missing_artifacts_fail_with_init_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = TactContract::simple_storage(dir.path())
            .init()
            .await
            .unwrap_err();
        assert!(matches!(err, DeployError::InitError(_)));
        assert!(err.to_string().contains("run the Tact build"));
    }

    #[tokio::test]
    async fn contracts_with_init_arguments_are_rejected() {
        let dir = tempfile::TempDir::new().unwrap();
        let package = json!({
            "name": "SimpleStorage",
            "code": code_cell().to_boc_base64().unwrap(),
            "init": {
                "kind": "direct",
                "args": [{ "name": "owner", "type": { "kind": "simple", "type": "address" } }],
                "prefix": { "bits": 1, "value": 0 },
                "deployment": { "kind": "system-cell", "system": null }
            }
        });
        tokio::fs::write(dir.path().join("sample_SimpleStorage.pkg"), package.to_string())
            .await
            .unwrap();

        let err = TactContract::simple_storage(dir.path())
            .init()
            .await
            .unwrap_err();
        assert!(matches!(err, DeployError::InitError(_)));
    }

    #[tokio::test]
    async fn malformed_package_is_a_serialization_error() {
        let dir = tempfile::TempDir::new().unwrap();
        tokio::fs::write(dir.path().join("sample_SimpleStorage.pkg"), "{ not json")
            .await
            .unwrap();

        let err = TactContract::simple_storage(dir.path())
            .init()
            .await
            .unwrap_err();
        assert!(matches!(err, DeployError::SerializationError(_)));
    }
}
