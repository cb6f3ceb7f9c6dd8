use crate::ui;
use collab_shooter::{
    AccountController,
    BaseAccountId,
    ControllerSettings,
    PresencePolicy,
    ReadinessState,
    SHOOTER_ABI,
    deployment::{
        self,
        DeploymentEnv,
        DeploymentRecord,
        DeploymentStore,
    },
    fuel::{
        KeystoreWallet,
        ShooterProgram,
    },
    services::{
        AccountFetcher,
        AccountMutator,
        WalletProvider,
    },
    wallets,
};
use color_eyre::eyre::{
    Result,
    WrapErr,
    eyre,
};
use fuels::{
    accounts::ViewOnlyAccount,
    prelude::Provider,
    types::{
        Address,
        ContractId,
    },
};
use std::{
    fs,
    path::{
        Path,
        PathBuf,
    },
    str::FromStr,
};
use tracing::{
    debug,
    info,
    warn,
};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

pub const DEFAULT_TESTNET_RPC_URL: &str = "https://testnet.fuel.network";
pub const DEFAULT_DEVNET_RPC_URL: &str = "https://devnet.fuel.network";
pub const DEFAULT_LOCAL_RPC_URL: &str = "http://localhost:4000/";
pub const TESTNET_FAUCET_URL: &str = "https://faucet-testnet.fuel.network";
pub const DEVNET_FAUCET_URL: &str = "https://faucet-devnet.fuel.network";
pub const DEFAULT_LOG_DIR: &str = "logs";
/// Passphrase that lets the client reopen the wallet without prompting.
pub const WALLET_PASSWORD_ENV: &str = "SHOOTER_WALLET_PASSWORD";
const DEFAULT_SAFE_SCRIPT_GAS_LIMIT: u64 = 29_000_000;
const LOG_FILE_PREFIX: &str = "collab-shooter.log";

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum NetworkTarget {
    Testnet { url: String },
    Devnet { url: String },
    LocalNode { url: String },
}

impl NetworkTarget {
    pub fn url(&self) -> &str {
        match self {
            NetworkTarget::Testnet { url }
            | NetworkTarget::Devnet { url }
            | NetworkTarget::LocalNode { url } => url,
        }
    }

    pub fn deployment_env(&self) -> DeploymentEnv {
        match self {
            NetworkTarget::Testnet { .. } => DeploymentEnv::Test,
            NetworkTarget::Devnet { .. } => DeploymentEnv::Dev,
            NetworkTarget::LocalNode { .. } => DeploymentEnv::Local,
        }
    }

    /// Where players can get gas tokens. Local nodes fund wallets at genesis.
    pub fn faucet_url(&self) -> Option<&'static str> {
        match self {
            NetworkTarget::Testnet { .. } => Some(TESTNET_FAUCET_URL),
            NetworkTarget::Devnet { .. } => Some(DEVNET_FAUCET_URL),
            NetworkTarget::LocalNode { .. } => None,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum WalletConfig {
    ForcKeystore { name: String, dir: PathBuf },
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AppConfig {
    pub network: NetworkTarget,
    pub wallet: WalletConfig,
    pub authority_key: PathBuf,
    pub presence: PresencePolicy,
    pub log_dir: PathBuf,
    /// Contract id to record as the current deployment before starting.
    pub record_contract: Option<String>,
}

type ShooterController = AccountController<KeystoreWallet, ShooterProgram, ShooterProgram>;

/// Installs the file logger. Keep the guard alive until exit to flush.
pub fn init_tracing(log_dir: &Path) -> Result<WorkerGuard> {
    fs::create_dir_all(log_dir).wrap_err_with(|| {
        format!("Failed to create log directory {}", log_dir.display())
    })?;
    let appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .map_err(|e| eyre!("Failed to install tracing subscriber: {e}"))?;
    Ok(guard)
}

async fn build_controller(config: &AppConfig) -> Result<ShooterController> {
    let url = config.network.url();
    let env = config.network.deployment_env();
    info!(%env, %url, "connecting to network");
    let provider = Provider::connect(url)
        .await
        .wrap_err_with(|| format!("Failed to connect to provider at {url}"))?;

    let authority = wallets::load_authority(&config.authority_key, &provider)
        .wrap_err("Unable to load the program authority key")?;

    let store = DeploymentStore::new(env)?;
    let abi_hash = deployment::compute_abi_hash(SHOOTER_ABI);
    if let Some(raw) = &config.record_contract {
        let record = record_deployment(&store, raw, &abi_hash, url)?;
        info!(contract_id = %record.contract_id, path = %store.path().display(), "recorded deployment");
    }
    let Some(selected) = store.latest_compatible(&abi_hash)? else {
        return Err(eyre!(format_deployment_summary(
            env,
            url,
            &store,
            store.load()?.last(),
            &abi_hash
        )));
    };
    let contract_id = parse_contract_id(&selected.contract_id)?;
    info!(contract_id = %selected.contract_id, deployed_at = %selected.deployed_at, "using deployment");

    let consensus_parameters = provider.consensus_parameters().await?;
    let max_gas_per_tx = consensus_parameters.tx_params().max_gas_per_tx();
    let safe_script_gas_limit = max_gas_per_tx
        .saturating_sub(1)
        .clamp(1, DEFAULT_SAFE_SCRIPT_GAS_LIMIT);
    debug!(safe_script_gas_limit, max_gas_per_tx, "script gas limit");

    let program = ShooterProgram::new(contract_id, authority.clone())
        .with_script_gas_limit(safe_script_gas_limit);
    let base_account_id = BaseAccountId::from_address(&Address::from(authority.address()));

    let WalletConfig::ForcKeystore { name, dir } = config.wallet.clone();
    let trusted_passphrase = std::env::var(WALLET_PASSWORD_ENV).ok();
    let wallet = KeystoreWallet::new(dir, name, provider)
        .with_trusted_passphrase(trusted_passphrase);

    let settings = ControllerSettings::new(contract_id, base_account_id, authority)
        .with_presence(config.presence);
    Ok(AccountController::new(wallet, program.clone(), program, settings))
}

fn parse_contract_id(raw: &str) -> Result<ContractId> {
    let trimmed = raw.trim().trim_start_matches("fuel");
    ContractId::from_str(trimmed).map_err(|e| {
        eyre!("Deployment record contains an invalid contract id {trimmed:?}: {e:?}")
    })
}

/// Appends `raw` to the store as a deployment of the current ABI.
fn record_deployment(
    store: &DeploymentStore,
    raw: &str,
    abi_hash: &str,
    url: &str,
) -> Result<DeploymentRecord> {
    parse_contract_id(raw)?;
    let record = DeploymentRecord::new(raw.trim(), abi_hash, url);
    store.append(record.clone())?;
    Ok(record)
}

fn format_deployment_summary(
    env: DeploymentEnv,
    url: &str,
    store: &DeploymentStore,
    latest: Option<&DeploymentRecord>,
    current_hash: &str,
) -> String {
    let mut message = format!(
        "No compatible deployment recorded for {env} at {url}.\n\nLatest recorded deployment for {env}:",
    );
    match latest {
        Some(record) => message.push_str(&format!(
            "\n  {} - {} @ {} (abi hash {})",
            record.deployed_at,
            record.contract_id,
            record.network_url,
            hash_preview(&record.abi_hash),
        )),
        None => message.push_str("\n  (none recorded)"),
    }
    message.push_str(&format!(
        "\n\nCurrent ABI hash: {}",
        hash_preview(current_hash)
    ));
    message.push_str(&format!(
        "\nDeployment records file: {}",
        store.path().display()
    ));
    message
}

fn hash_preview(hash: &str) -> String {
    const PREVIEW_CHARS: usize = 16;
    let mut preview: String = hash.chars().take(PREVIEW_CHARS).collect();
    if hash.chars().nth(PREVIEW_CHARS).is_some() {
        preview.push_str("...");
    }
    preview
}

pub async fn run_app(config: AppConfig) -> Result<()> {
    let mut controller = build_controller(&config).await?;
    let mut ui_state = ui::UiState::with_faucet(config.network.faucet_url());
    let mut input_events = ui::input_event_stream();

    ui::terminal_enter(&mut ui_state)?;
    info!("UI ready");
    let res = run_loop(&mut controller, &mut ui_state, &mut input_events).await;
    ui::terminal_exit()?;
    res
}

/// Forwards one UI action to the controller.
async fn dispatch<W, F, M>(
    controller: &mut AccountController<W, F, M>,
    event: ui::UserEvent,
) -> ReadinessState
where
    W: WalletProvider,
    F: AccountFetcher,
    M: AccountMutator<Payer = W::Payer>,
{
    match event {
        ui::UserEvent::Connect { passphrase } => controller.connect_wallet(passphrase).await,
        ui::UserEvent::Disconnect => controller.disconnect(),
        ui::UserEvent::CreateBase => controller.create_base_account().await,
        ui::UserEvent::CreateUser => controller.create_user_account().await,
        ui::UserEvent::AddEnemy => controller.add_enemy().await,
        ui::UserEvent::Refresh => controller.refresh().await,
        ui::UserEvent::Quit | ui::UserEvent::Redraw => controller.state(),
    }
}

async fn run_loop(
    controller: &mut ShooterController,
    ui_state: &mut ui::UiState,
    input_events: &mut ui::InputEventReceiver,
) -> Result<()> {
    ui::draw(ui_state, &controller.snapshot(), Some("Reconnecting wallet..."))
        .wrap_err("draw before reconnect failed")?;
    let state = controller.resume_session().await;
    info!(%state, "startup reconnect finished");
    ui::discard_pending(input_events);
    ui::draw(ui_state, &controller.snapshot(), None).wrap_err("initial draw failed")?;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            raw_ev = ui::next_raw_event(input_events) => {
                let event = raw_ev?;
                let Some(ev) = ui::interpret_event(ui_state, controller.state(), event) else {
                    continue;
                };
                match ev {
                    ui::UserEvent::Quit => break,
                    ui::UserEvent::Redraw => {
                        ui::draw(ui_state, &controller.snapshot(), None)
                            .wrap_err("redraw failed")?;
                    }
                    action => {
                        ui::draw(ui_state, &controller.snapshot(), Some(action.busy_message()))
                            .wrap_err("draw while busy failed")?;
                        let state = dispatch(controller, action).await;
                        let dropped = ui::discard_pending(input_events);
                        if dropped > 0 {
                            warn!(dropped, "discarded input received while busy");
                        }
                        debug!(%state, "action finished");
                        ui::draw(ui_state, &controller.snapshot(), None)
                            .wrap_err("draw after action failed")?;
                    }
                }
            }
        }
    }
    info!("shutting down");
    Ok(())
}
