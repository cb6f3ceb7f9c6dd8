use collab_shooter::{
    PresencePolicy,
    wallets,
};
use color_eyre::eyre::{
    Result,
    eyre,
};
use std::path::PathBuf;

mod client;
mod ui;

fn print_usage_and_exit() -> ! {
    println!(
        "Usage: collab-shooter [--devnet | --testnet | --local] [--rpc-url <url>]\n\
         --wallet <name> --authority-key <path> [--wallet-dir <path>]\n\
         [--presence <nonzero|exists>] [--log-dir <path>] [--contract-id <id>]\n\
         \n\
         Flags:\n\
           --devnet              Connect to Fuel devnet (default RPC {})\n\
           --testnet             Connect to Fuel testnet (default RPC {})\n\
           --local               Connect to a local Fuel node (default RPC {})\n\
           --rpc-url <url>       Override the RPC URL for the selected network\n\
           --wallet <name>       forc-wallet profile to play with\n\
           --wallet-dir <path>   Override forc-wallet directory (defaults to ~/.fuel/wallets)\n\
           --authority-key <path> JSON file holding the program authority secret key\n\
           --presence <policy>   When the program account counts as initialized:\n\
                                 nonzero (has enemies, default) or exists\n\
           --log-dir <path>      Directory for daily log files (default ./{})\n\
           --contract-id <id>    Record <id> as the network's deployment of the bundled ABI\n\
         \n\
         Set {} to reconnect the wallet at startup without a prompt.",
        client::DEFAULT_DEVNET_RPC_URL,
        client::DEFAULT_TESTNET_RPC_URL,
        client::DEFAULT_LOCAL_RPC_URL,
        client::DEFAULT_LOG_DIR,
        client::WALLET_PASSWORD_ENV,
    );
    std::process::exit(0);
}

fn parse_cli_args(args: impl IntoIterator<Item = String>) -> Result<client::AppConfig> {
    #[derive(Clone, Copy)]
    enum NetworkFlag {
        Devnet,
        Testnet,
        Local,
    }

    fn take_once(
        slot: &mut Option<String>,
        flag: &str,
        value: Option<String>,
    ) -> Result<()> {
        let value = value.ok_or_else(|| eyre!("{flag} requires an argument"))?;
        if slot.is_some() {
            return Err(eyre!("{flag} may only be specified once"));
        }
        *slot = Some(value);
        Ok(())
    }

    let mut args = args.into_iter();
    let mut network_flag: Option<NetworkFlag> = None;
    let mut custom_url: Option<String> = None;
    let mut wallet_dir: Option<String> = None;
    let mut wallet_name: Option<String> = None;
    let mut authority_key: Option<String> = None;
    let mut presence: Option<String> = None;
    let mut log_dir: Option<String> = None;
    let mut contract_id: Option<String> = None;

    while let Some(arg) = args.next() {
        let flag = match arg.as_str() {
            "--devnet" => Some(NetworkFlag::Devnet),
            "--testnet" => Some(NetworkFlag::Testnet),
            "--local" => Some(NetworkFlag::Local),
            _ => None,
        };
        if let Some(flag) = flag {
            if network_flag.is_some() {
                return Err(eyre!(
                    "Multiple network flags provided; choose one of --devnet/--testnet/--local"
                ));
            }
            network_flag = Some(flag);
            continue;
        }
        match arg.as_str() {
            "--rpc-url" => {
                if network_flag.is_none() {
                    return Err(eyre!(
                        "--rpc-url must follow a network flag (--devnet/--testnet/--local)"
                    ));
                }
                take_once(&mut custom_url, "--rpc-url", args.next())?;
            }
            "--wallet-dir" => take_once(&mut wallet_dir, "--wallet-dir", args.next())?,
            "--wallet" => take_once(&mut wallet_name, "--wallet", args.next())?,
            "--authority-key" => {
                take_once(&mut authority_key, "--authority-key", args.next())?
            }
            "--presence" => take_once(&mut presence, "--presence", args.next())?,
            "--log-dir" => take_once(&mut log_dir, "--log-dir", args.next())?,
            "--contract-id" => take_once(&mut contract_id, "--contract-id", args.next())?,
            "--help" | "-h" => print_usage_and_exit(),
            other => return Err(eyre!("Unknown argument: {other}")),
        }
    }

    let network = match network_flag {
        None => {
            return Err(eyre!(
                "Select a network with --devnet, --testnet, or --local"
            ));
        }
        Some(NetworkFlag::Devnet) => client::NetworkTarget::Devnet {
            url: custom_url.unwrap_or_else(|| client::DEFAULT_DEVNET_RPC_URL.to_string()),
        },
        Some(NetworkFlag::Testnet) => client::NetworkTarget::Testnet {
            url: custom_url
                .unwrap_or_else(|| client::DEFAULT_TESTNET_RPC_URL.to_string()),
        },
        Some(NetworkFlag::Local) => client::NetworkTarget::LocalNode {
            url: custom_url.unwrap_or_else(|| client::DEFAULT_LOCAL_RPC_URL.to_string()),
        },
    };

    let name = wallet_name.ok_or_else(|| {
        eyre!("Specify --wallet <name> to select a forc-wallet profile")
    })?;
    let dir = wallets::resolve_wallet_dir(wallet_dir.as_deref())?;
    let authority_key = authority_key.ok_or_else(|| {
        eyre!("Specify --authority-key <path> for the program authority")
    })?;
    let presence = match presence {
        Some(raw) => raw.parse::<PresencePolicy>().map_err(|e| eyre!(e))?,
        None => PresencePolicy::default(),
    };
    let log_dir = log_dir.unwrap_or_else(|| client::DEFAULT_LOG_DIR.to_string());

    Ok(client::AppConfig {
        network,
        wallet: client::WalletConfig::ForcKeystore { name, dir },
        authority_key: PathBuf::from(shellexpand::tilde(&authority_key).into_owned()),
        presence,
        log_dir: PathBuf::from(log_dir),
        record_contract: contract_id,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let app_config = parse_cli_args(std::env::args().skip(1))?;
    let _log_guard = client::init_tracing(&app_config.log_dir)?;
    tracing::info!(network = ?app_config.network, "starting collab-shooter client");
    client::run_app(app_config).await
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parse_cli_args__minimal_local_config__uses_defaults() {
        // given
        let raw = args(&[
            "--local",
            "--wallet",
            "alice",
            "--wallet-dir",
            "/tmp/wallets",
            "--authority-key",
            "/tmp/authority.json",
        ]);

        // when
        let config = parse_cli_args(raw).unwrap();

        // then
        assert_eq!(
            config.network,
            client::NetworkTarget::LocalNode {
                url: client::DEFAULT_LOCAL_RPC_URL.to_string()
            }
        );
        assert_eq!(
            config.wallet,
            client::WalletConfig::ForcKeystore {
                name: "alice".to_string(),
                dir: PathBuf::from("/tmp/wallets"),
            }
        );
        assert_eq!(config.presence, PresencePolicy::NonZeroCount);
        assert_eq!(config.log_dir, PathBuf::from(client::DEFAULT_LOG_DIR));
        assert_eq!(config.record_contract, None);
    }

    #[test]
    fn parse_cli_args__contract_id__is_kept_for_recording() {
        // given
        let raw = args(&[
            "--devnet",
            "--wallet",
            "alice",
            "--wallet-dir",
            "/tmp/w",
            "--authority-key",
            "/tmp/a.json",
            "--contract-id",
            "0xabc",
        ]);

        // when
        let config = parse_cli_args(raw).unwrap();

        // then
        assert_eq!(config.record_contract.as_deref(), Some("0xabc"));
    }

    #[test]
    fn parse_cli_args__conflicting_network_flags__errors() {
        let raw = args(&["--devnet", "--testnet", "--wallet", "alice"]);
        let err = parse_cli_args(raw).unwrap_err();
        assert!(err.to_string().contains("Multiple network flags"));
    }

    #[test]
    fn parse_cli_args__rpc_url_before_network__errors() {
        let raw = args(&["--rpc-url", "http://node", "--devnet"]);
        assert!(parse_cli_args(raw).is_err());
    }

    #[test]
    fn parse_cli_args__custom_rpc_and_presence() {
        // given
        let raw = args(&[
            "--testnet",
            "--rpc-url",
            "http://node:4000",
            "--wallet",
            "bob",
            "--wallet-dir",
            "/tmp/w",
            "--authority-key",
            "/tmp/a.json",
            "--presence",
            "exists",
        ]);

        // when
        let config = parse_cli_args(raw).unwrap();

        // then
        assert_eq!(config.network.url(), "http://node:4000");
        assert_eq!(config.presence, PresencePolicy::RecordExists);
    }

    #[test]
    fn parse_cli_args__missing_wallet__errors() {
        let raw = args(&["--local", "--authority-key", "/tmp/a.json"]);
        let err = parse_cli_args(raw).unwrap_err();
        assert!(err.to_string().contains("--wallet"));
    }

    #[test]
    fn parse_cli_args__unknown_presence__errors() {
        let raw = args(&[
            "--local",
            "--wallet",
            "alice",
            "--wallet-dir",
            "/tmp/w",
            "--authority-key",
            "/tmp/a.json",
            "--presence",
            "sometimes",
        ]);
        assert!(parse_cli_args(raw).is_err());
    }
}
