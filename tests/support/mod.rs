#![allow(dead_code)]

use deployer::cell::{serialize_boc, BocOptions, CellBuilder};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const EXPECTED_TESTNET_ADDRESS: &str = "kQAR3KAAvBJxf7paFjtIiCzYZI1WvBjkcL51PjbKfxuy0bzT";
pub const EXPECTED_RAW_ADDRESS: &str =
    "0:11dca000bc12717fba5a163b48882cd8648d56bc18e470be753e36ca7f1bb2d1";

/// Scratch workspace with a compiled `SimpleStorage` code BoC under `build/`.
pub struct BuildFixture {
    root: TempDir,
}

impl BuildFixture {
    pub fn new() -> Result<Self, String> {
        let root = TempDir::new().map_err(|e| e.to_string())?;
        let build = root.path().join("build");
        std::fs::create_dir_all(&build).map_err(|e| e.to_string())?;

        let mut code = CellBuilder::new();
        code.store_bytes(&[0xff, 0x00, 0xf4, 0xa4, 0x13, 0xf4, 0xbc, 0xf2, 0xc8, 0x0b])
            .map_err(|e| e.to_string())?;
        let code = code.build().map_err(|e| e.to_string())?;
        let bytes = serialize_boc(&[code], BocOptions::default()).map_err(|e| e.to_string())?;
        std::fs::write(build.join("sample_SimpleStorage.code.boc"), bytes)
            .map_err(|e| e.to_string())?;

        Ok(Self { root })
    }

    pub fn empty() -> Result<Self, String> {
        let root = TempDir::new().map_err(|e| e.to_string())?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        self.root.path()
    }

    pub fn build_dir(&self) -> PathBuf {
        self.root.path().join("build")
    }

    pub fn command(&self) -> Result<assert_cmd::Command, String> {
        let mut cmd = assert_cmd::Command::cargo_bin("deploy").map_err(|e| e.to_string())?;
        cmd.current_dir(self.root())
            .env_remove("DEPLOY_BUILD_DIR")
            .env_remove("DEPLOY_TONHUB_HOST")
            .env("RUST_LOG", "off");
        Ok(cmd)
    }
}
