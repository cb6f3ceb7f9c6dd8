pub mod accounts;
pub mod controller;
pub mod deployment;
pub mod derivation;
pub mod error;
pub mod fuel;
pub mod readiness;
pub mod services;
pub mod wallets;

pub mod test_helpers;

pub mod shooter_types {
    use fuels::macros::abigen;

    abigen!(Contract(
        name = "ShooterContract",
        abi = "abi/shooter-abi.json"
    ));
}

/// Raw bytes of the contract ABI the bindings above were generated from.
pub const SHOOTER_ABI: &[u8] = include_bytes!("../abi/shooter-abi.json");

pub use accounts::{
    BaseAccountId,
    BaseAccountView,
    DerivedAddress,
    UserAccountView,
    WalletSession,
};
pub use controller::{
    AccountController,
    ControllerSettings,
    ControllerSnapshot,
};
pub use error::AccountError;
pub use readiness::{
    PresencePolicy,
    ReadinessState,
};

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;
    use serde_json::Value;
    use std::collections::HashSet;

    #[test]
    fn shooter_abi__every_referenced_type_id_is_declared() {
        // given
        let abi: Value = serde_json::from_slice(SHOOTER_ABI).unwrap();
        let declared: HashSet<&str> = abi["concreteTypes"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|ty| ty["concreteTypeId"].as_str())
            .collect();

        // when
        let component_ids: Vec<&str> = abi["metadataTypes"]
            .as_array()
            .unwrap()
            .iter()
            .flat_map(|ty| ty["components"].as_array().into_iter().flatten())
            .filter_map(|component| component["typeId"].as_str())
            .collect();
        let input_ids: Vec<&str> = abi["functions"]
            .as_array()
            .unwrap()
            .iter()
            .flat_map(|f| f["inputs"].as_array().into_iter().flatten())
            .filter_map(|input| input["concreteTypeId"].as_str())
            .collect();

        // then
        assert!(!component_ids.is_empty());
        for id in component_ids.iter().chain(input_ids.iter()) {
            assert!(declared.contains(id), "type id {id} is not declared");
        }
    }
}
