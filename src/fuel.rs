use crate::{
    accounts::{
        BaseAccountId,
        BaseAccountView,
        DerivedAddress,
        UserAccountView,
    },
    error::AccountError,
    services::{
        AccountFetcher,
        AccountMutator,
        ConnectRequest,
        Connected,
        ServiceResult,
        WalletProvider,
    },
    shooter_types::ShooterContract,
    wallets,
};
use color_eyre::eyre;
use fuels::{
    accounts::ViewOnlyAccount,
    crypto::SecretKey,
    prelude::{
        Bech32ContractId,
        Execution,
        Provider,
        TxPolicies,
        WalletUnlocked,
    },
    types::{
        Address,
        Bits256,
        ContractId,
    },
};
use std::path::{
    Path,
    PathBuf,
};
use tracing::debug;

/// The shooter contract, read through one wallet and written through the
/// payer handed to each call.
#[derive(Clone)]
pub struct ShooterProgram {
    contract_id: Bech32ContractId,
    reader: ShooterContract<WalletUnlocked>,
    script_gas_limit: Option<u64>,
}

impl ShooterProgram {
    pub fn new(contract_id: ContractId, reader: WalletUnlocked) -> Self {
        let contract_id = Bech32ContractId::from(contract_id);
        let reader = ShooterContract::new(contract_id.clone(), reader);
        Self {
            contract_id,
            reader,
            script_gas_limit: None,
        }
    }

    pub fn with_script_gas_limit(mut self, limit: u64) -> Self {
        self.script_gas_limit = Some(limit);
        self
    }

    fn tx_policies(&self) -> TxPolicies {
        match self.script_gas_limit {
            Some(limit) => TxPolicies::default().with_script_gas_limit(limit),
            None => TxPolicies::default(),
        }
    }

    fn signed_by(&self, payer: &WalletUnlocked) -> ShooterContract<WalletUnlocked> {
        ShooterContract::new(self.contract_id.clone(), payer.clone())
    }
}

fn fetch_error(err: fuels::types::errors::Error) -> AccountError {
    AccountError::FetchTransient(err.to_string())
}

fn mutation_error(err: fuels::types::errors::Error) -> AccountError {
    AccountError::MutationRejected(err.to_string())
}

impl AccountFetcher for ShooterProgram {
    async fn fetch_base_account(
        &self,
        id: &BaseAccountId,
    ) -> ServiceResult<BaseAccountView> {
        let record = self
            .reader
            .methods()
            .base_account(Bits256(id.0))
            .with_tx_policies(self.tx_policies())
            .simulate(Execution::StateReadOnly)
            .await
            .map_err(fetch_error)?
            .value;
        BaseAccountView::validated(record.initialized, record.enemies)
    }

    async fn fetch_user_account(
        &self,
        address: &DerivedAddress,
    ) -> ServiceResult<UserAccountView> {
        let record = self
            .reader
            .methods()
            .user_account(Bits256(address.0))
            .with_tx_policies(self.tx_policies())
            .simulate(Execution::StateReadOnly)
            .await
            .map_err(fetch_error)?
            .value;
        UserAccountView::validated(record.initialized, record.enemies_added)
    }
}

impl AccountMutator for ShooterProgram {
    type Payer = WalletUnlocked;

    async fn init_base_account(
        &self,
        id: &BaseAccountId,
        payer: &WalletUnlocked,
    ) -> ServiceResult<()> {
        self.signed_by(payer)
            .methods()
            .init_base_account(Bits256(id.0))
            .with_tx_policies(self.tx_policies())
            .call()
            .await
            .map_err(mutation_error)?;
        Ok(())
    }

    async fn init_user_account(
        &self,
        address: &DerivedAddress,
        payer: &WalletUnlocked,
    ) -> ServiceResult<()> {
        self.signed_by(payer)
            .methods()
            .init_user_account(Bits256(address.0))
            .with_tx_policies(self.tx_policies())
            .call()
            .await
            .map_err(mutation_error)?;
        Ok(())
    }

    async fn add_enemy(
        &self,
        amount: u64,
        base: &BaseAccountId,
        user: &DerivedAddress,
        payer: &WalletUnlocked,
    ) -> ServiceResult<()> {
        self.signed_by(payer)
            .methods()
            .add_enemy(amount, Bits256(base.0), Bits256(user.0))
            .with_tx_policies(self.tx_policies())
            .call()
            .await
            .map_err(mutation_error)?;
        Ok(())
    }
}

/// A forc-wallet keystore profile acting as the wallet provider.
pub struct KeystoreWallet {
    dir: PathBuf,
    name: String,
    provider: Provider,
    trusted_passphrase: Option<String>,
}

impl KeystoreWallet {
    pub fn new(dir: PathBuf, name: impl Into<String>, provider: Provider) -> Self {
        Self {
            dir,
            name: name.into(),
            provider,
            trusted_passphrase: None,
        }
    }

    /// Passphrase used for silent reconnects.
    pub fn with_trusted_passphrase(mut self, passphrase: Option<String>) -> Self {
        self.trusted_passphrase = passphrase.filter(|p| !p.is_empty());
        self
    }
}

fn select_passphrase(
    request: ConnectRequest,
    trusted: Option<&str>,
) -> ServiceResult<String> {
    if request.only_if_trusted {
        return trusted.map(str::to_owned).ok_or_else(|| {
            AccountError::ConnectionRejected(
                "wallet is not trusted for silent reconnect".to_string(),
            )
        });
    }
    match request.passphrase {
        Some(passphrase) if !passphrase.is_empty() => Ok(passphrase),
        _ => Err(AccountError::ConnectionRejected(
            "no passphrase entered".to_string(),
        )),
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum ConnectStage {
    Locate,
    Unlock,
}

/// A profile that cannot be found means there is no wallet to talk to; a
/// profile that will not open means the user did not authorize it.
fn connect_error(stage: ConnectStage, err: eyre::Report) -> AccountError {
    match stage {
        ConnectStage::Locate => AccountError::ProviderUnavailable(err.to_string()),
        ConnectStage::Unlock => AccountError::ConnectionRejected(err.to_string()),
    }
}

fn open_profile(
    dir: &Path,
    name: &str,
    request: ConnectRequest,
    trusted: Option<&str>,
) -> ServiceResult<SecretKey> {
    let descriptor = wallets::find_wallet(dir, name)
        .map_err(|e| connect_error(ConnectStage::Locate, e))?;
    let passphrase = select_passphrase(request, trusted)?;
    debug!(wallet = %descriptor.name, "unlocking keystore");
    wallets::decrypt_secret(&descriptor, &passphrase)
        .map_err(|e| connect_error(ConnectStage::Unlock, e))
}

impl WalletProvider for KeystoreWallet {
    type Payer = WalletUnlocked;

    async fn connect(
        &mut self,
        request: ConnectRequest,
    ) -> ServiceResult<Connected<WalletUnlocked>> {
        let dir = self.dir.clone();
        let name = self.name.clone();
        let trusted = self.trusted_passphrase.clone();
        // scrypt takes long enough to stall the runtime
        let secret = tokio::task::spawn_blocking(move || {
            open_profile(&dir, &name, request, trusted.as_deref())
        })
        .await
        .map_err(|e| {
            AccountError::ProviderUnavailable(format!("wallet unlock task failed: {e}"))
        })??;
        let wallet =
            WalletUnlocked::new_from_private_key(secret, Some(self.provider.clone()));
        let address = Address::from(wallet.address());
        Ok(Connected {
            address,
            payer: wallet,
        })
    }
}
