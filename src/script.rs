//! The SimpleStorage deployment sequence.
//!
//! Obtain the `StateInit`, derive the address, print diagnostics, then hand
//! the deployment to a [`Deployer`]. Diagnostics are always written before
//! the deployer is invoked. Failures are returned to the caller as-is.

use crate::address::{contract_address, Address, FriendlyFormat};
use crate::coins::{to_nano, Coins};
use crate::error::Result;
use crate::ports::{ContractInitializer, DeployRequest, Deployer};
use crate::print::{print_address, print_header};
use crate::state_init::StateInit;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;
use tracing::{debug, info};

pub const DEPLOY_WORKCHAIN: i8 = 0;
pub const DEPLOY_AMOUNT: &str = "0.1";
pub const DEPLOY_TESTNET: bool = true;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployPlan {
    contract_name: String,
    workchain: i8,
    amount: Coins,
    testnet: bool,
    label: String,
}

impl DeployPlan {
    /// # Errors
    /// Returns `DeployError::AmountError` if `amount` is not a valid decimal.
    pub fn new(
        contract_name: impl Into<String>,
        workchain: i8,
        amount: &str,
        testnet: bool,
    ) -> Result<Self> {
        let contract_name = contract_name.into();
        Ok(Self {
            label: format!("Deploy {contract_name}"),
            contract_name,
            workchain,
            amount: to_nano(amount)?,
            testnet,
        })
    }

    /// Workchain 0, 0.1 TON, test network.
    ///
    /// # Errors
    /// Only fails if the built-in amount constant is malformed.
    pub fn simple_storage() -> Result<Self> {
        Self::new(
            crate::contract::SIMPLE_STORAGE,
            DEPLOY_WORKCHAIN,
            DEPLOY_AMOUNT,
            DEPLOY_TESTNET,
        )
    }

    #[must_use]
    pub fn contract_name(&self) -> &str {
        &self.contract_name
    }

    #[must_use]
    pub const fn workchain(&self) -> i8 {
        self.workchain
    }

    #[must_use]
    pub const fn amount(&self) -> Coins {
        self.amount
    }

    #[must_use]
    pub const fn testnet(&self) -> bool {
        self.testnet
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }
}

/// Result of the address stage: what will be deployed and where.
#[derive(Debug, Clone)]
pub struct PreparedDeploy {
    init: StateInit,
    address: Address,
}

impl PreparedDeploy {
    #[must_use]
    pub const fn init(&self) -> &StateInit {
        &self.init
    }

    #[must_use]
    pub const fn address(&self) -> &Address {
        &self.address
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddressReport {
    pub contract: String,
    pub address: String,
    pub raw_address: String,
    pub testnet: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeployReport {
    pub contract: String,
    pub address: String,
    pub raw_address: String,
    pub amount_nano: String,
    pub amount: String,
    pub testnet: bool,
    pub label: String,
    pub link: String,
    pub prepared_at: DateTime<Utc>,
}

/// Obtains the init data, derives the address and prints the header and
/// address diagnostics.
///
/// # Errors
/// Propagates initializer, address derivation and output failures.
pub async fn prepare<I, W>(plan: &DeployPlan, initializer: &I, out: &mut W) -> Result<PreparedDeploy>
where
    I: ContractInitializer + ?Sized,
    W: Write + ?Sized,
{
    debug!("Initializing {}", initializer.name());
    let init = initializer.init().await?;
    let address = contract_address(plan.workchain(), &init)?;
    debug!(address = %address.to_raw(), "Derived contract address");

    print_header(out, plan.contract_name())?;
    print_address(out, &address, plan.testnet())?;
    out.flush()?;

    Ok(PreparedDeploy { init, address })
}

/// Runs the address stage only and reports the derived address.
///
/// # Errors
/// Propagates initializer, address derivation and output failures.
pub async fn run_address<I, W>(plan: &DeployPlan, initializer: &I, out: &mut W) -> Result<AddressReport>
where
    I: ContractInitializer + ?Sized,
    W: Write + ?Sized,
{
    let prepared = prepare(plan, initializer, out).await?;
    Ok(AddressReport {
        contract: plan.contract_name().to_string(),
        address: prepared
            .address
            .to_friendly(FriendlyFormat::for_network(plan.testnet())),
        raw_address: prepared.address.to_raw(),
        testnet: plan.testnet(),
    })
}

/// Runs the full deployment sequence once.
///
/// # Errors
/// Propagates every failure, including a rejected deploy.
pub async fn run_deploy<I, D, W>(
    plan: &DeployPlan,
    initializer: &I,
    deployer: &D,
    out: &mut W,
) -> Result<DeployReport>
where
    I: ContractInitializer + ?Sized,
    D: Deployer + ?Sized,
    W: Write + ?Sized,
{
    let prepared = prepare(plan, initializer, out).await?;

    let request = DeployRequest::new(
        prepared.init.clone(),
        plan.amount(),
        plan.label(),
        plan.testnet(),
    )
    .with_workchain(plan.workchain());
    info!(
        contract = plan.contract_name(),
        amount = %plan.amount(),
        testnet = plan.testnet(),
        "Deploying"
    );
    let outcome = deployer.deploy(&request).await?;

    Ok(DeployReport {
        contract: plan.contract_name().to_string(),
        address: prepared
            .address
            .to_friendly(FriendlyFormat::for_network(plan.testnet())),
        raw_address: prepared.address.to_raw(),
        amount_nano: plan.amount().nano().to_string(),
        amount: crate::coins::from_nano(plan.amount()),
        testnet: plan.testnet(),
        label: plan.label().to_string(),
        link: outcome.link().to_string(),
        prepared_at: Utc::now(),
    })
}
