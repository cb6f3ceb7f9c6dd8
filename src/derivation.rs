use crate::accounts::DerivedAddress;
use fuels::types::{
    Address,
    ContractId,
};
use sha2::{
    Digest,
    Sha256,
};

/// Namespace tag for per-wallet user accounts.
pub const USER_ACCOUNT_TAG: &[u8] = b"user_account";

const DERIVATION_MARKER: &[u8] = b"ProgramDerivedAddress";

/// Derives the user account key for `wallet` under `program`.
///
/// sha256(tag || wallet || program || marker). Wallet and program ids are
/// fixed width, so for a given tag the preimage is unambiguous.
pub fn derive_address(
    program: &ContractId,
    tag: &[u8],
    wallet: &Address,
) -> DerivedAddress {
    let mut hasher = Sha256::new();
    hasher.update(tag);
    hasher.update(**wallet);
    hasher.update(**program);
    hasher.update(DERIVATION_MARKER);
    let digest = hasher.finalize();
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&digest);
    DerivedAddress(bytes)
}
