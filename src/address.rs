#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

use crate::cell::CellHash;
use crate::error::{DeployError, Result};
use crate::state_init::StateInit;
use base64::{
    engine::general_purpose::{STANDARD, URL_SAFE},
    Engine as _,
};
use crc::{Crc, CRC_16_XMODEM};
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

pub const BASECHAIN: i8 = 0;
pub const MASTERCHAIN: i8 = -1;

const CRC16: Crc<u16> = Crc::<u16>::new(&CRC_16_XMODEM);
const TAG_BOUNCEABLE: u8 = 0x11;
const TAG_NON_BOUNCEABLE: u8 = 0x51;
const TAG_TEST_ONLY: u8 = 0x80;

/// Derives the address a contract with this `StateInit` is deployed to.
///
/// # Errors
/// Propagates cell construction failures.
pub fn contract_address(workchain: i8, init: &StateInit) -> Result<Address> {
    let cell = init.to_cell()?;
    Ok(Address::new(workchain, cell.hash()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address {
    workchain: i8,
    hash: CellHash,
}

/// Encoding switches for the user-friendly address form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FriendlyFormat {
    pub bounceable: bool,
    pub test_only: bool,
    pub url_safe: bool,
}

impl Default for FriendlyFormat {
    fn default() -> Self {
        Self {
            bounceable: true,
            test_only: false,
            url_safe: true,
        }
    }
}

impl FriendlyFormat {
    #[must_use]
    pub fn for_network(testnet: bool) -> Self {
        Self {
            test_only: testnet,
            ..Self::default()
        }
    }
}

impl Address {
    #[must_use]
    pub const fn new(workchain: i8, hash: CellHash) -> Self {
        Self { workchain, hash }
    }

    #[must_use]
    pub const fn workchain(&self) -> i8 {
        self.workchain
    }

    #[must_use]
    pub const fn hash(&self) -> &CellHash {
        &self.hash
    }

    #[must_use]
    pub fn to_raw(&self) -> String {
        format!("{}:{}", self.workchain, hex::encode(self.hash))
    }

    #[must_use]
    pub fn to_friendly(&self, format: FriendlyFormat) -> String {
        let mut tag = if format.bounceable {
            TAG_BOUNCEABLE
        } else {
            TAG_NON_BOUNCEABLE
        };
        if format.test_only {
            tag |= TAG_TEST_ONLY;
        }

        let mut bytes = Vec::with_capacity(36);
        bytes.push(tag);
        bytes.extend_from_slice(&self.workchain.to_be_bytes());
        bytes.extend_from_slice(&self.hash);
        let checksum = CRC16.checksum(&bytes);
        bytes.extend_from_slice(&checksum.to_be_bytes());

        if format.url_safe {
            URL_SAFE.encode(bytes)
        } else {
            STANDARD.encode(bytes)
        }
    }

    fn parse_raw(value: &str) -> Result<Self> {
        let (workchain, hash) = value
            .split_once(':')
            .ok_or_else(|| DeployError::AddressError(format!("not a raw address: {value}")))?;
        let workchain = workchain
            .parse::<i8>()
            .map_err(|e| DeployError::AddressError(format!("invalid workchain: {e}")))?;
        let hash = hex::decode(hash)
            .map_err(|e| DeployError::AddressError(format!("invalid hash hex: {e}")))?;
        let hash = CellHash::try_from(hash.as_slice())
            .map_err(|_| DeployError::AddressError("hash must be 32 bytes".to_string()))?;
        Ok(Self::new(workchain, hash))
    }

    fn parse_friendly(value: &str) -> Result<(Self, FriendlyFormat)> {
        let url_safe = value.contains(['-', '_']);
        let bytes = if url_safe {
            URL_SAFE.decode(value)
        } else {
            STANDARD.decode(value)
        }
        .map_err(|e| DeployError::AddressError(format!("invalid base64: {e}")))?;

        let bytes: [u8; 36] = bytes
            .try_into()
            .map_err(|_| DeployError::AddressError("friendly address must be 36 bytes".to_string()))?;
        let (body, checksum) = bytes.split_at(34);
        if CRC16.checksum(body).to_be_bytes() != checksum {
            return Err(DeployError::AddressError("address checksum mismatch".to_string()));
        }

        let tag = bytes[0];
        let test_only = tag & TAG_TEST_ONLY != 0;
        let bounceable = match tag & !TAG_TEST_ONLY {
            TAG_BOUNCEABLE => true,
            TAG_NON_BOUNCEABLE => false,
            other => {
                return Err(DeployError::AddressError(format!(
                    "unknown address tag {other:#04x}"
                )))
            }
        };
        let workchain = i8::from_be_bytes([bytes[1]]);
        let mut hash = [0u8; 32];
        hash.copy_from_slice(&bytes[2..34]);

        Ok((
            Self::new(workchain, hash),
            FriendlyFormat {
                bounceable,
                test_only,
                url_safe,
            },
        ))
    }

    /// Parses a user-friendly address and reports the flags it was encoded
    /// with.
    ///
    /// # Errors
    /// Returns `DeployError::AddressError` for malformed input or a bad
    /// checksum.
    pub fn from_friendly(value: &str) -> Result<(Self, FriendlyFormat)> {
        Self::parse_friendly(value.trim())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_friendly(FriendlyFormat::default()))
    }
}

impl FromStr for Address {
    type Err = DeployError;

    fn from_str(value: &str) -> Result<Self> {
        let value = value.trim();
        if value.contains(':') {
            Self::parse_raw(value)
        } else {
            Self::parse_friendly(value).map(|(address, _)| address)
        }
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_raw())
    }
}
