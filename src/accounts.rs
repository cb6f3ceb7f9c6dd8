use crate::error::AccountError;
use fuels::types::Address;
use std::fmt;

/// Id of the singleton base account holding the global enemy counter.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct BaseAccountId(pub [u8; 32]);

/// Per-wallet user account key, see [`crate::derivation::derive_address`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct DerivedAddress(pub [u8; 32]);

impl BaseAccountId {
    pub fn from_address(address: &Address) -> Self {
        Self(**address)
    }
}

impl fmt::Display for BaseAccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Display for DerivedAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

/// A connected wallet: its address plus whatever signs on its behalf.
#[derive(Clone, Debug)]
pub struct WalletSession<P> {
    pub address: Address,
    pub payer: P,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct BaseAccountView {
    pub exists: bool,
    pub enemy_count: u64,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct UserAccountView {
    pub exists: bool,
    pub enemies_added: u64,
}

impl BaseAccountView {
    pub fn missing() -> Self {
        Self::default()
    }

    /// Builds a view from a raw contract record.
    ///
    /// An uninitialized record means the account was never created. An
    /// uninitialized record with a non-zero counter cannot come from a
    /// healthy contract and is treated as a bad response.
    pub fn validated(initialized: bool, enemies: u64) -> Result<Self, AccountError> {
        match (initialized, enemies) {
            (true, enemy_count) => Ok(Self {
                exists: true,
                enemy_count,
            }),
            (false, 0) => Err(AccountError::FetchNotFound),
            (false, enemies) => Err(AccountError::FetchTransient(format!(
                "malformed base account: uninitialized with {enemies} enemies"
            ))),
        }
    }
}

impl UserAccountView {
    pub fn missing() -> Self {
        Self::default()
    }

    pub fn validated(
        initialized: bool,
        enemies_added: u64,
    ) -> Result<Self, AccountError> {
        match (initialized, enemies_added) {
            (true, enemies_added) => Ok(Self {
                exists: true,
                enemies_added,
            }),
            (false, 0) => Err(AccountError::FetchNotFound),
            (false, enemies_added) => Err(AccountError::FetchTransient(format!(
                "malformed user account: uninitialized with {enemies_added} enemies added"
            ))),
        }
    }
}

pub fn format_address(address: &Address) -> String {
    format!("0x{}", hex::encode(**address))
}
