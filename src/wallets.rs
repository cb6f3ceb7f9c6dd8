use color_eyre::eyre::{
    Result,
    WrapErr,
    eyre,
};
use eth_keystore::decrypt_key;
use fuels::{
    crypto::SecretKey,
    prelude::{
        Provider,
        WalletUnlocked,
    },
};
use serde::Deserialize;
use std::{
    fs,
    path::{
        Path,
        PathBuf,
    },
};

/// Path forc-wallet uses for the first account of a mnemonic.
const FORC_WALLET_DERIVATION_PATH: &str = "m/44'/1179993420'/0'/0/0";

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WalletDescriptor {
    pub name: String,
    pub path: PathBuf,
}

impl WalletDescriptor {
    pub fn new(name: impl Into<String>, path: PathBuf) -> Self {
        Self {
            name: name.into(),
            path,
        }
    }
}

pub fn default_wallet_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").wrap_err("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".fuel").join("wallets"))
}

pub fn resolve_wallet_dir(dir: Option<&str>) -> Result<PathBuf> {
    match dir {
        Some(raw) => {
            let expanded = shellexpand::tilde(raw);
            Ok(PathBuf::from(expanded.into_owned()))
        }
        None => default_wallet_dir(),
    }
}

pub fn list_wallets(dir: &Path) -> Result<Vec<WalletDescriptor>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut wallets = Vec::new();
    for entry in fs::read_dir(dir).wrap_err("Failed to read wallet directory")? {
        let entry = entry.wrap_err("Failed to read wallet entry")?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if path.extension().and_then(|ext| ext.to_str()) != Some("wallet") {
            continue;
        }
        let name = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .ok_or_else(|| eyre!("Invalid wallet filename {:?}", path))?
            .to_owned();
        wallets.push(WalletDescriptor::new(name, path));
    }
    wallets.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(wallets)
}

pub fn find_wallet(dir: &Path, name: &str) -> Result<WalletDescriptor> {
    let wallets = list_wallets(dir)?;
    wallets
        .into_iter()
        .find(|w| w.name == name)
        .ok_or_else(|| eyre!("Wallet '{name}' not found in {}", dir.to_string_lossy()))
}

/// Decrypts a keystore file with `password`.
///
/// The keystore may hold a raw secret key or a mnemonic phrase. Runs the
/// keystore KDF, so callers on an async runtime should move it off the
/// reactor.
pub fn decrypt_secret(descriptor: &WalletDescriptor, password: &str) -> Result<SecretKey> {
    let secret = decrypt_key(&descriptor.path, password.as_bytes())
        .map_err(|_| eyre!("Invalid password for wallet '{}'", descriptor.name))?;

    if let Ok(secret_key) = SecretKey::try_from(secret.as_slice()) {
        return Ok(secret_key);
    }

    if let Ok(mnemonic) = std::str::from_utf8(&secret) {
        let word_count = mnemonic.split_whitespace().count();
        if word_count >= 12 {
            return SecretKey::new_from_mnemonic_phrase_with_path(
                mnemonic,
                FORC_WALLET_DERIVATION_PATH,
            )
            .map_err(|e| eyre!("Failed to derive key from mnemonic: {e}"));
        }
    }

    Err(eyre!(
        "Wallet '{}' contained unsupported key material",
        descriptor.name
    ))
}

#[derive(Debug, Deserialize)]
struct AuthorityKeyFile {
    secret_key: String,
}

pub fn parse_authority_key(raw: &str) -> Result<SecretKey> {
    let file: AuthorityKeyFile =
        serde_json::from_str(raw).wrap_err("Failed to parse authority key JSON")?;
    let trimmed = file.secret_key.trim().trim_start_matches("0x");
    let bytes = hex::decode(trimmed).wrap_err("Authority secret key is not valid hex")?;
    SecretKey::try_from(bytes.as_slice())
        .map_err(|_| eyre!("Authority secret key must be 32 bytes"))
}

/// Loads the identity that owns the base account.
pub fn load_authority(path: &Path, provider: &Provider) -> Result<WalletUnlocked> {
    let raw = fs::read_to_string(path).wrap_err_with(|| {
        format!("Failed to read authority key file {}", path.display())
    })?;
    let secret_key = parse_authority_key(&raw)?;
    Ok(WalletUnlocked::new_from_private_key(
        secret_key,
        Some(provider.clone()),
    ))
}
