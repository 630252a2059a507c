use crate::error::{DeployError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const NANO_DECIMALS: usize = 9;
pub const NANO_PER_TON: u128 = 1_000_000_000;
/// Largest value representable as `VarUInteger 16`.
pub const MAX_COINS: u128 = (1 << 120) - 1;

/// An amount of the native currency in nanotons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Coins(u128);

impl Coins {
    #[must_use]
    pub const fn from_nano(nano: u128) -> Self {
        Self(nano)
    }

    #[must_use]
    pub const fn nano(self) -> u128 {
        self.0
    }
}

/// Parses a decimal amount of TON into nanotons, e.g. `"0.1"` → `100000000`.
///
/// # Errors
/// Returns `DeployError::AmountError` for malformed input, more than nine
/// fractional digits, or amounts above [`MAX_COINS`].
pub fn to_nano(amount: &str) -> Result<Coins> {
    let trimmed = amount.trim();
    let (whole, fraction) = trimmed.split_once('.').unwrap_or((trimmed, ""));

    if whole.is_empty() && fraction.is_empty() {
        return Err(DeployError::AmountError(format!("invalid amount '{amount}'")));
    }
    if !whole.chars().chain(fraction.chars()).all(|c| c.is_ascii_digit()) {
        return Err(DeployError::AmountError(format!(
            "invalid amount '{amount}': only unsigned decimal numbers are accepted"
        )));
    }
    if fraction.len() > NANO_DECIMALS {
        return Err(DeployError::AmountError(format!(
            "invalid amount '{amount}': at most {NANO_DECIMALS} decimal places"
        )));
    }

    let overflow = || DeployError::AmountError(format!("amount '{amount}' is too large"));
    let whole_nano = if whole.is_empty() {
        0
    } else {
        whole
            .parse::<u128>()
            .map_err(|_| overflow())?
            .checked_mul(NANO_PER_TON)
            .ok_or_else(overflow)?
    };
    let fraction_nano = if fraction.is_empty() {
        0
    } else {
        format!("{fraction:0<NANO_DECIMALS$}")
            .parse::<u128>()
            .map_err(|_| overflow())?
    };

    let nano = whole_nano.checked_add(fraction_nano).ok_or_else(overflow)?;
    if nano > MAX_COINS {
        return Err(overflow());
    }
    Ok(Coins(nano))
}

/// Renders nanotons as a decimal TON amount without trailing zeros.
#[must_use]
pub fn from_nano(amount: Coins) -> String {
    let whole = amount.0 / NANO_PER_TON;
    let fraction = amount.0 % NANO_PER_TON;
    if fraction == 0 {
        return whole.to_string();
    }
    let fraction = format!("{fraction:0>NANO_DECIMALS$}");
    format!("{whole}.{}", fraction.trim_end_matches('0'))
}

impl FromStr for Coins {
    type Err = DeployError;

    fn from_str(value: &str) -> Result<Self> {
        to_nano(value)
    }
}

impl fmt::Display for Coins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} TON", from_nano(*self))
    }
}
