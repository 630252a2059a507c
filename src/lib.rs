pub mod address;
pub mod cell;
pub mod coins;
pub mod contract;
pub mod deploy;
pub mod error;
pub mod ports;
pub mod print;
pub mod script;
pub mod state_init;

pub use address::{contract_address, Address, FriendlyFormat};
pub use cell::{Cell, CellBuilder};
pub use coins::{from_nano, to_nano, Coins};
pub use contract::TactContract;
pub use deploy::TonhubLinkDeployer;
pub use error::{DeployError, Result};
pub use ports::{ContractInitializer, DeployOutcome, DeployRequest, Deployer, PortFuture};
pub use script::{run_address, run_deploy, DeployPlan, DeployReport};
pub use state_init::StateInit;
