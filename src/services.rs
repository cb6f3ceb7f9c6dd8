use crate::{
    accounts::{
        BaseAccountId,
        BaseAccountView,
        DerivedAddress,
        UserAccountView,
    },
    error::AccountError,
};
use fuels::types::Address;

pub type ServiceResult<T> = Result<T, AccountError>;

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ConnectRequest {
    /// Only connect if the wallet can be opened without asking the user.
    pub only_if_trusted: bool,
    pub passphrase: Option<String>,
}

impl ConnectRequest {
    pub fn trusted() -> Self {
        Self {
            only_if_trusted: true,
            passphrase: None,
        }
    }

    pub fn interactive(passphrase: impl Into<String>) -> Self {
        Self {
            only_if_trusted: false,
            passphrase: Some(passphrase.into()),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Connected<P> {
    pub address: Address,
    pub payer: P,
}

pub trait WalletProvider {
    type Payer;

    fn connect(
        &mut self,
        request: ConnectRequest,
    ) -> impl Future<Output = ServiceResult<Connected<Self::Payer>>>;
}

pub trait AccountFetcher {
    /// `FetchNotFound` when the base account was never created.
    fn fetch_base_account(
        &self,
        id: &BaseAccountId,
    ) -> impl Future<Output = ServiceResult<BaseAccountView>>;

    /// `FetchNotFound` when the user account was never created.
    fn fetch_user_account(
        &self,
        address: &DerivedAddress,
    ) -> impl Future<Output = ServiceResult<UserAccountView>>;
}

pub trait AccountMutator {
    type Payer;

    fn init_base_account(
        &self,
        id: &BaseAccountId,
        payer: &Self::Payer,
    ) -> impl Future<Output = ServiceResult<()>>;

    fn init_user_account(
        &self,
        address: &DerivedAddress,
        payer: &Self::Payer,
    ) -> impl Future<Output = ServiceResult<()>>;

    /// Adds `amount` to both the base total and the user's own counter.
    fn add_enemy(
        &self,
        amount: u64,
        base: &BaseAccountId,
        user: &DerivedAddress,
        payer: &Self::Payer,
    ) -> impl Future<Output = ServiceResult<()>>;
}
