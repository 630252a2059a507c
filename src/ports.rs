use crate::address::{Address, BASECHAIN};
use crate::coins::Coins;
use crate::error::Result;
use crate::state_init::StateInit;
use futures_util::future::BoxFuture;
use serde::Serialize;

pub type PortFuture<'a, T> = BoxFuture<'a, Result<T>>;

/// Source of a contract's initialization data.
pub trait ContractInitializer: Send + Sync {
    fn name(&self) -> &str;

    fn init(&self) -> PortFuture<'_, StateInit>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployRequest {
    init: StateInit,
    amount: Coins,
    label: String,
    testnet: bool,
    workchain: i8,
}

impl DeployRequest {
    #[must_use]
    pub fn new(init: StateInit, amount: Coins, label: impl Into<String>, testnet: bool) -> Self {
        Self {
            init,
            amount,
            label: label.into(),
            testnet,
            workchain: BASECHAIN,
        }
    }

    /// Targets `workchain` instead of the basechain.
    #[must_use]
    pub fn with_workchain(mut self, workchain: i8) -> Self {
        self.workchain = workchain;
        self
    }

    #[must_use]
    pub const fn init(&self) -> &StateInit {
        &self.init
    }

    #[must_use]
    pub const fn amount(&self) -> Coins {
        self.amount
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub const fn testnet(&self) -> bool {
        self.testnet
    }

    #[must_use]
    pub const fn workchain(&self) -> i8 {
        self.workchain
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeployOutcome {
    address: Address,
    link: String,
}

impl DeployOutcome {
    #[must_use]
    pub fn new(address: Address, link: impl Into<String>) -> Self {
        Self {
            address,
            link: link.into(),
        }
    }

    #[must_use]
    pub const fn address(&self) -> &Address {
        &self.address
    }

    #[must_use]
    pub fn link(&self) -> &str {
        &self.link
    }
}

/// Performs (or prepares) the on-chain deployment of a contract.
pub trait Deployer: Send + Sync {
    fn deploy<'a>(&'a self, request: &'a DeployRequest) -> PortFuture<'a, DeployOutcome>;
}
