#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

use crate::address::{contract_address, FriendlyFormat};
use crate::error::Result;
use crate::ports::{DeployOutcome, DeployRequest, Deployer, PortFuture};
use tracing::info;
use url::Url;

pub const DEFAULT_TONHUB_HOST: &str = "tonhub.com";

/// Deploys by handing a transfer deep link to a wallet app.
///
/// The link carries the target address, the attached amount, a comment and
/// the serialized `StateInit`; the wallet signs and sends the deploy message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TonhubLinkDeployer {
    host: String,
}

impl Default for TonhubLinkDeployer {
    fn default() -> Self {
        Self::new(DEFAULT_TONHUB_HOST)
    }
}

impl TonhubLinkDeployer {
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self { host: host.into() }
    }

    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// # Errors
    /// Propagates address derivation, BoC or URL construction failures.
    pub fn transfer_link(&self, request: &DeployRequest) -> Result<DeployOutcome> {
        let address = contract_address(request.workchain(), request.init())?;
        let init = request.init().to_boc_base64()?;
        let host = if request.testnet() {
            format!("test.{}", self.host)
        } else {
            self.host.clone()
        };
        let target = address.to_friendly(FriendlyFormat::for_network(request.testnet()));

        let mut link = Url::parse(&format!("https://{host}/transfer/{target}"))?;
        link.query_pairs_mut()
            .append_pair("text", request.label())
            .append_pair("amount", &request.amount().nano().to_string())
            .append_pair("init", &init);

        Ok(DeployOutcome::new(address, link.to_string()))
    }
}

impl Deployer for TonhubLinkDeployer {
    fn deploy<'a>(&'a self, request: &'a DeployRequest) -> PortFuture<'a, DeployOutcome> {
        Box::pin(async move {
            let outcome = self.transfer_link(request)?;
            info!(
                address = %outcome.address().to_raw(),
                testnet = request.testnet(),
                "Prepared deploy link"
            );
            Ok(outcome)
        })
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::address::{BASECHAIN, MASTERCHAIN};
    use crate::cell::{Cell, CellBuilder};
    use crate::coins::to_nano;
    use crate::state_init::StateInit;
    use std::collections::HashMap;

    fn request(testnet: bool) -> DeployRequest {
        let mut data = CellBuilder::new();
        data.store_bit(false).unwrap();
        let init = StateInit::new(Cell::empty(), data.build().unwrap());
        DeployRequest::new(init, to_nano("0.1").unwrap(), "Deploy SimpleStorage", testnet)
    }

    fn query(link: &str) -> HashMap<String, String> {
        Url::parse(link)
            .unwrap()
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    #[tokio::test]
    async fn testnet_link_targets_test_host_and_carries_init() {
        let request = request(true);
        let outcome = TonhubLinkDeployer::default().deploy(&request).await.unwrap();
        let expected_address = contract_address(BASECHAIN, request.init()).unwrap();

        assert_eq!(*outcome.address(), expected_address);
        let url = Url::parse(outcome.link()).unwrap();
        assert_eq!(url.host_str(), Some("test.tonhub.com"));
        assert_eq!(
            url.path(),
            format!(
                "/transfer/{}",
                expected_address.to_friendly(FriendlyFormat::for_network(true))
            )
        );

        let params = query(outcome.link());
        assert_eq!(params["text"], "Deploy SimpleStorage");
        assert_eq!(params["amount"], "100000000");
        let init = Cell::from_boc_base64(&params["init"]).unwrap();
        assert_eq!(init, request.init().to_cell().unwrap());
    }

    #[test]
    fn mainnet_link_uses_plain_host() {
        let outcome = TonhubLinkDeployer::new("wallet.example")
            .transfer_link(&request(false))
            .unwrap();
        let url = Url::parse(outcome.link()).unwrap();
        assert_eq!(url.host_str(), Some("wallet.example"));
        assert!(url.path().starts_with("/transfer/EQ"));
    }

    #[test]
    fn link_targets_the_requested_workchain() {
        let request = request(true).with_workchain(MASTERCHAIN);
        let outcome = TonhubLinkDeployer::default()
            .transfer_link(&request)
            .unwrap();
        let expected = contract_address(MASTERCHAIN, request.init()).unwrap();

        assert_eq!(outcome.address().workchain(), MASTERCHAIN);
        assert_eq!(*outcome.address(), expected);
        assert!(outcome.link().contains(&format!(
            "/transfer/{}",
            expected.to_friendly(FriendlyFormat::for_network(true))
        )));
    }
}
