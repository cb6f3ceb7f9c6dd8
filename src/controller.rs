use crate::{
    accounts::{
        BaseAccountId,
        BaseAccountView,
        DerivedAddress,
        UserAccountView,
        WalletSession,
        format_address,
    },
    derivation::{
        USER_ACCOUNT_TAG,
        derive_address,
    },
    error::AccountError,
    readiness::{
        PresencePolicy,
        ReadinessState,
        evaluate_views,
    },
    services::{
        AccountFetcher,
        AccountMutator,
        ConnectRequest,
        Connected,
        WalletProvider,
    },
};
use fuels::types::{
    Address,
    ContractId,
};
use tracing::{
    debug,
    info,
    warn,
};

/// Enemies added per `add_enemy` call.
pub const ENEMY_INCREMENT: u64 = 1;
const MAX_NOTICES: usize = 50;

pub struct ControllerSettings<P> {
    pub program_id: ContractId,
    pub base_account_id: BaseAccountId,
    /// Pays for and signs the one-time base account creation.
    pub authority: P,
    pub user_tag: Vec<u8>,
    pub presence: PresencePolicy,
}

impl<P> ControllerSettings<P> {
    pub fn new(program_id: ContractId, base_account_id: BaseAccountId, authority: P) -> Self {
        Self {
            program_id,
            base_account_id,
            authority,
            user_tag: USER_ACCOUNT_TAG.to_vec(),
            presence: PresencePolicy::default(),
        }
    }

    pub fn with_presence(mut self, presence: PresencePolicy) -> Self {
        self.presence = presence;
        self
    }
}

/// What the front-end needs to draw the current panel.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ControllerSnapshot {
    pub state: ReadinessState,
    pub wallet_address: Option<Address>,
    pub user_account: Option<DerivedAddress>,
    pub base_account: BaseAccountId,
    pub base_exists: bool,
    pub enemy_count: u64,
    pub enemies_added: u64,
    pub status: String,
    pub notices: Vec<String>,
}

/// Tracks the base and user accounts and decides which panel to show.
///
/// Every operation swallows collaborator failures and returns the state it
/// ends in. The state is only ever recomputed from freshly fetched views.
pub struct AccountController<W, F, M>
where
    W: WalletProvider,
{
    wallet: W,
    fetcher: F,
    mutator: M,
    settings: ControllerSettings<W::Payer>,
    session: Option<WalletSession<W::Payer>>,
    user_address: Option<DerivedAddress>,
    base: Option<BaseAccountView>,
    user: Option<UserAccountView>,
    state: ReadinessState,
    status: String,
    notices: Vec<String>,
}

impl<W, F, M> AccountController<W, F, M>
where
    W: WalletProvider,
    F: AccountFetcher,
    M: AccountMutator<Payer = W::Payer>,
{
    pub fn new(
        wallet: W,
        fetcher: F,
        mutator: M,
        settings: ControllerSettings<W::Payer>,
    ) -> Self {
        Self {
            wallet,
            fetcher,
            mutator,
            settings,
            session: None,
            user_address: None,
            base: None,
            user: None,
            state: ReadinessState::Disconnected,
            status: String::from("Connect a wallet to start"),
            notices: Vec::new(),
        }
    }

    pub fn state(&self) -> ReadinessState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    pub fn base_view(&self) -> Option<&BaseAccountView> {
        self.base.as_ref()
    }

    pub fn user_address(&self) -> Option<DerivedAddress> {
        self.user_address
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn notices(&self) -> &[String] {
        &self.notices
    }

    pub fn snapshot(&self) -> ControllerSnapshot {
        let base = self.base.unwrap_or_default();
        let user = self.user.unwrap_or_default();
        ControllerSnapshot {
            state: self.state,
            wallet_address: self.session.as_ref().map(|session| session.address),
            user_account: self.user_address,
            base_account: self.settings.base_account_id,
            base_exists: base.exists,
            enemy_count: base.enemy_count,
            enemies_added: user.enemies_added,
            status: self.status.clone(),
            notices: self.notices.iter().rev().take(5).cloned().collect(),
        }
    }

    /// Asks the wallet for access, prompting the user if needed.
    pub async fn connect_wallet(&mut self, passphrase: impl Into<String>) -> ReadinessState {
        self.connect_with(ConnectRequest::interactive(passphrase))
            .await
    }

    /// Reconnects without prompting. A declined request stays quiet.
    pub async fn resume_session(&mut self) -> ReadinessState {
        self.connect_with(ConnectRequest::trusted()).await
    }

    async fn connect_with(&mut self, request: ConnectRequest) -> ReadinessState {
        let only_if_trusted = request.only_if_trusted;
        match self.wallet.connect(request).await {
            Ok(Connected { address, payer }) => {
                let user_address = derive_address(
                    &self.settings.program_id,
                    &self.settings.user_tag,
                    &address,
                );
                info!(
                    wallet = %format_address(&address),
                    user_account = %user_address,
                    "wallet connected"
                );
                self.session = Some(WalletSession { address, payer });
                self.user_address = Some(user_address);
                self.user = None;
                self.notices.clear();
                self.set_status(format!(
                    "Connected with address {}",
                    format_address(&address)
                ));
                self.refresh_base().await;
                self.refresh_user().await
            }
            Err(AccountError::ConnectionRejected(reason)) if only_if_trusted => {
                debug!(%reason, "trusted reconnect declined");
                self.reevaluate()
            }
            Err(err) => {
                warn!(error = %err, "wallet connection failed");
                self.clear_session();
                self.push_notice(connect_notice(&err));
                self.reevaluate()
            }
        }
    }

    pub fn disconnect(&mut self) -> ReadinessState {
        if self.session.is_some() {
            info!("wallet disconnected");
        }
        self.clear_session();
        self.base = None;
        self.set_status("Disconnected");
        self.reevaluate()
    }

    pub async fn refresh(&mut self) -> ReadinessState {
        self.refresh_base().await;
        self.refresh_user().await
    }

    pub async fn refresh_base(&mut self) -> ReadinessState {
        let id = self.settings.base_account_id;
        let view = match self.fetcher.fetch_base_account(&id).await {
            Ok(view) => {
                debug!(base_account = %id, enemies = view.enemy_count, "fetched base account");
                view
            }
            Err(AccountError::FetchNotFound) => {
                info!(base_account = %id, "base account not initialized");
                BaseAccountView::missing()
            }
            Err(err) => {
                warn!(base_account = %id, error = %err, "base account fetch failed; treating as uninitialized");
                BaseAccountView::missing()
            }
        };
        self.base = Some(view);
        self.reevaluate()
    }

    pub async fn refresh_user(&mut self) -> ReadinessState {
        let Some(address) = self.user_address else {
            debug!("no wallet connected; skipping user account refresh");
            return self.reevaluate();
        };
        let view = match self.fetcher.fetch_user_account(&address).await {
            Ok(view) => {
                debug!(user_account = %address, enemies_added = view.enemies_added, "fetched user account");
                view
            }
            Err(AccountError::FetchNotFound) => {
                info!(user_account = %address, "user account not initialized");
                UserAccountView::missing()
            }
            Err(err) => {
                warn!(user_account = %address, error = %err, "user account fetch failed; treating as uninitialized");
                UserAccountView::missing()
            }
        };
        self.user = Some(view);
        self.reevaluate()
    }

    pub async fn create_base_account(&mut self) -> ReadinessState {
        if self.base_initialized() {
            debug!("base account already initialized; skipping creation");
            return self.state;
        }
        let id = self.settings.base_account_id;
        let result = self
            .mutator
            .init_base_account(&id, &self.settings.authority)
            .await;
        match result {
            Ok(()) => {
                info!(base_account = %id, "created base account");
                self.set_status(format!("Created program account {id}"));
                self.refresh_base().await
            }
            Err(err) => {
                warn!(base_account = %id, error = %err, "base account creation failed");
                self.state
            }
        }
    }

    pub async fn create_user_account(&mut self) -> ReadinessState {
        let (Some(session), Some(address)) = (self.session.as_ref(), self.user_address)
        else {
            debug!("no wallet connected; skipping user account creation");
            return self.state;
        };
        if self.user.is_some_and(|view| view.exists) {
            debug!(user_account = %address, "user account already exists; skipping creation");
            return self.state;
        }
        let result = self
            .mutator
            .init_user_account(&address, &session.payer)
            .await;
        match result {
            Ok(()) => {
                info!(user_account = %address, "created user account");
                self.set_status(format!("Created user account {address}"));
                self.refresh_user().await
            }
            Err(err) => {
                warn!(user_account = %address, error = %err, "user account creation failed");
                self.state
            }
        }
    }

    /// Adds one enemy, then re-reads both counters from the contract.
    pub async fn add_enemy(&mut self) -> ReadinessState {
        if self.state != ReadinessState::Ready {
            debug!(state = %self.state, "add_enemy ignored outside Ready");
            return self.state;
        }
        let (Some(session), Some(address)) = (self.session.as_ref(), self.user_address)
        else {
            return self.state;
        };
        let base = self.settings.base_account_id;
        let result = self
            .mutator
            .add_enemy(ENEMY_INCREMENT, &base, &address, &session.payer)
            .await;
        match result {
            Ok(()) => {
                info!(user_account = %address, "enemy added");
                self.set_status("Enemy added");
            }
            Err(err) => {
                warn!(user_account = %address, error = %err, "adding enemy failed");
            }
        }
        self.refresh_base().await;
        self.refresh_user().await
    }

    fn base_initialized(&self) -> bool {
        self.base
            .as_ref()
            .is_some_and(|view| self.settings.presence.base_initialized(view))
    }

    fn reevaluate(&mut self) -> ReadinessState {
        self.state = evaluate_views(
            self.session.is_some(),
            self.settings.presence,
            self.base.as_ref(),
            self.user.as_ref(),
        );
        self.state
    }

    fn clear_session(&mut self) {
        self.session = None;
        self.user_address = None;
        self.user = None;
    }

    fn set_status(&mut self, message: impl Into<String>) {
        self.status = message.into();
    }

    fn push_notice(&mut self, notice: String) {
        self.notices.push(notice);
        if self.notices.len() > MAX_NOTICES {
            let drain = self.notices.len() - MAX_NOTICES;
            self.notices.drain(0..drain);
        }
    }
}

fn connect_notice(err: &AccountError) -> String {
    match err {
        AccountError::ProviderUnavailable(detail) => {
            format!("No wallet found ({detail}). Create one with forc-wallet.")
        }
        AccountError::ConnectionRejected(detail) => {
            format!("Wallet connection rejected: {detail}")
        }
        other => format!("Wallet connection failed: {other}"),
    }
}
