//! In-memory stand-ins for the wallet and the shooter contract.

use crate::{
    accounts::{
        BaseAccountId,
        BaseAccountView,
        DerivedAddress,
        UserAccountView,
    },
    derivation::{
        USER_ACCOUNT_TAG,
        derive_address,
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
};
use fuels::types::{
    Address,
    ContractId,
};
use std::{
    collections::HashMap,
    sync::{
        Arc,
        Mutex,
        MutexGuard,
        PoisonError,
    },
};

const PROGRAM_ID: [u8; 32] = [0x5a; 32];
const BASE_ACCOUNT_ID: [u8; 32] = [0xba; 32];

pub fn random_wallet_address() -> Address {
    Address::from(rand::random::<[u8; 32]>())
}

/// Who signed a fake transaction.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FixturePayer {
    Authority,
    Wallet(Address),
}

impl FixturePayer {
    pub fn authority() -> Self {
        FixturePayer::Authority
    }

    pub fn wallet(address: Address) -> Self {
        FixturePayer::Wallet(address)
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct Record {
    initialized: bool,
    counter: u64,
}

#[derive(Default)]
struct ProgramState {
    base_accounts: HashMap<BaseAccountId, Record>,
    user_accounts: HashMap<DerivedAddress, Record>,
    initial_enemies: u64,
    fetch_log: Vec<&'static str>,
    failing_fetches: usize,
    mutation_rejection: Option<String>,
    base_payers: Vec<FixturePayer>,
    user_payers: Vec<FixturePayer>,
    add_enemy_calls: usize,
}

/// Shared fake contract. Clones see the same storage.
#[derive(Clone, Default)]
pub struct InMemoryProgram {
    state: Arc<Mutex<ProgramState>>,
}

impl InMemoryProgram {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enemy count a freshly created base account starts with.
    pub fn with_initial_enemies(self, enemies: u64) -> Self {
        self.state().initial_enemies = enemies;
        self
    }

    pub fn program_id(&self) -> ContractId {
        ContractId::from(PROGRAM_ID)
    }

    pub fn base_account_id(&self) -> BaseAccountId {
        BaseAccountId(BASE_ACCOUNT_ID)
    }

    pub fn user_account_for(&self, wallet: &Address) -> DerivedAddress {
        derive_address(&self.program_id(), USER_ACCOUNT_TAG, wallet)
    }

    pub fn seed_base_account(&self, enemies: u64) {
        let id = self.base_account_id();
        self.state().base_accounts.insert(
            id,
            Record {
                initialized: true,
                counter: enemies,
            },
        );
    }

    pub fn seed_user_account(&self, wallet: &Address, enemies_added: u64) {
        let address = self.user_account_for(wallet);
        self.state().user_accounts.insert(
            address,
            Record {
                initialized: true,
                counter: enemies_added,
            },
        );
    }

    /// Stores a base record no healthy contract would return.
    pub fn corrupt_base_account(&self, enemies: u64) {
        let id = self.base_account_id();
        self.state().base_accounts.insert(
            id,
            Record {
                initialized: false,
                counter: enemies,
            },
        );
    }

    pub fn fail_next_fetches(&self, count: usize) {
        self.state().failing_fetches = count;
    }

    pub fn reject_mutations(&self, reason: impl Into<String>) {
        self.state().mutation_rejection = Some(reason.into());
    }

    pub fn fetch_log(&self) -> Vec<&'static str> {
        self.state().fetch_log.clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.state().fetch_log.len()
    }

    pub fn base_payers(&self) -> Vec<FixturePayer> {
        self.state().base_payers.clone()
    }

    pub fn user_payers(&self) -> Vec<FixturePayer> {
        self.state().user_payers.clone()
    }

    pub fn add_enemy_calls(&self) -> usize {
        self.state().add_enemy_calls
    }

    pub fn base_enemies(&self) -> Option<u64> {
        let id = self.base_account_id();
        self.state()
            .base_accounts
            .get(&id)
            .filter(|record| record.initialized)
            .map(|record| record.counter)
    }

    pub fn user_enemies(&self, wallet: &Address) -> Option<u64> {
        let address = self.user_account_for(wallet);
        self.state()
            .user_accounts
            .get(&address)
            .filter(|record| record.initialized)
            .map(|record| record.counter)
    }

    fn state(&self) -> MutexGuard<'_, ProgramState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ProgramState {
    fn begin_fetch(&mut self, kind: &'static str) -> ServiceResult<()> {
        self.fetch_log.push(kind);
        if self.failing_fetches > 0 {
            self.failing_fetches -= 1;
            return Err(AccountError::FetchTransient(
                "connection reset by peer".to_string(),
            ));
        }
        Ok(())
    }

    fn begin_mutation(&self) -> ServiceResult<()> {
        match &self.mutation_rejection {
            Some(reason) => Err(AccountError::MutationRejected(reason.clone())),
            None => Ok(()),
        }
    }
}

impl AccountFetcher for InMemoryProgram {
    async fn fetch_base_account(
        &self,
        id: &BaseAccountId,
    ) -> ServiceResult<BaseAccountView> {
        let mut state = self.state();
        state.begin_fetch("base")?;
        let record = state.base_accounts.get(id).copied().unwrap_or_default();
        BaseAccountView::validated(record.initialized, record.counter)
    }

    async fn fetch_user_account(
        &self,
        address: &DerivedAddress,
    ) -> ServiceResult<UserAccountView> {
        let mut state = self.state();
        state.begin_fetch("user")?;
        let record = state
            .user_accounts
            .get(address)
            .copied()
            .unwrap_or_default();
        UserAccountView::validated(record.initialized, record.counter)
    }
}

impl AccountMutator for InMemoryProgram {
    type Payer = FixturePayer;

    async fn init_base_account(
        &self,
        id: &BaseAccountId,
        payer: &FixturePayer,
    ) -> ServiceResult<()> {
        let mut state = self.state();
        state.begin_mutation()?;
        if state
            .base_accounts
            .get(id)
            .is_some_and(|record| record.initialized)
        {
            return Err(AccountError::MutationRejected(
                "base account already initialized".to_string(),
            ));
        }
        let enemies = state.initial_enemies;
        state.base_accounts.insert(
            *id,
            Record {
                initialized: true,
                counter: enemies,
            },
        );
        state.base_payers.push(payer.clone());
        Ok(())
    }

    async fn init_user_account(
        &self,
        address: &DerivedAddress,
        payer: &FixturePayer,
    ) -> ServiceResult<()> {
        let mut state = self.state();
        state.begin_mutation()?;
        if state
            .user_accounts
            .get(address)
            .is_some_and(|record| record.initialized)
        {
            return Err(AccountError::MutationRejected(
                "user account already initialized".to_string(),
            ));
        }
        state.user_accounts.insert(
            *address,
            Record {
                initialized: true,
                counter: 0,
            },
        );
        state.user_payers.push(payer.clone());
        Ok(())
    }

    async fn add_enemy(
        &self,
        amount: u64,
        base: &BaseAccountId,
        user: &DerivedAddress,
        _payer: &FixturePayer,
    ) -> ServiceResult<()> {
        let mut state = self.state();
        state.add_enemy_calls += 1;
        state.begin_mutation()?;
        let base_ready = state
            .base_accounts
            .get(base)
            .is_some_and(|record| record.initialized);
        let user_ready = state
            .user_accounts
            .get(user)
            .is_some_and(|record| record.initialized);
        if !base_ready || !user_ready {
            return Err(AccountError::MutationRejected(
                "account not initialized".to_string(),
            ));
        }
        if let Some(record) = state.base_accounts.get_mut(base) {
            record.counter += amount;
        }
        if let Some(record) = state.user_accounts.get_mut(user) {
            record.counter += amount;
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug)]
enum WalletBehaviour {
    Accept(Address),
    Reject,
    Unavailable,
}

struct WalletScript {
    behaviour: WalletBehaviour,
    reject_next: bool,
    requests: Vec<ConnectRequest>,
}

/// Fake wallet provider with a fixed answer.
#[derive(Clone)]
pub struct ScriptedWallet {
    script: Arc<Mutex<WalletScript>>,
}

impl ScriptedWallet {
    fn with_behaviour(behaviour: WalletBehaviour) -> Self {
        Self {
            script: Arc::new(Mutex::new(WalletScript {
                behaviour,
                reject_next: false,
                requests: Vec::new(),
            })),
        }
    }

    pub fn accepting(address: Address) -> Self {
        Self::with_behaviour(WalletBehaviour::Accept(address))
    }

    pub fn rejecting() -> Self {
        Self::with_behaviour(WalletBehaviour::Reject)
    }

    pub fn unavailable() -> Self {
        Self::with_behaviour(WalletBehaviour::Unavailable)
    }

    pub fn reject_next(&self) {
        self.script().reject_next = true;
    }

    pub fn requests(&self) -> Vec<ConnectRequest> {
        self.script().requests.clone()
    }

    fn script(&self) -> MutexGuard<'_, WalletScript> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl WalletProvider for ScriptedWallet {
    type Payer = FixturePayer;

    async fn connect(
        &mut self,
        request: ConnectRequest,
    ) -> ServiceResult<Connected<FixturePayer>> {
        let mut script = self.script();
        script.requests.push(request.clone());
        let declined = request.passphrase.as_deref() == Some("");
        if std::mem::take(&mut script.reject_next) || declined {
            return Err(AccountError::ConnectionRejected(
                "user declined".to_string(),
            ));
        }
        match script.behaviour {
            WalletBehaviour::Accept(address) => Ok(Connected {
                address,
                payer: FixturePayer::wallet(address),
            }),
            WalletBehaviour::Reject => Err(AccountError::ConnectionRejected(
                "user declined".to_string(),
            )),
            WalletBehaviour::Unavailable => Err(AccountError::ProviderUnavailable(
                "no wallet profile configured".to_string(),
            )),
        }
    }
}
