use chrono::Utc;
use color_eyre::eyre::{Result, WrapErr};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::{
    fmt, fs,
    path::{Path, PathBuf},
};

pub const DEPLOYMENTS_ROOT: &str = ".deployments";
const DEPLOYMENTS_FILE: &str = "deployments.json";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DeploymentEnv {
    Dev,
    Test,
    Local,
}

impl DeploymentEnv {
    pub fn dir_name(self) -> &'static str {
        match self {
            DeploymentEnv::Dev => "dev",
            DeploymentEnv::Test => "test",
            DeploymentEnv::Local => "local",
        }
    }
}

impl fmt::Display for DeploymentEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeploymentEnv::Dev => "Devnet",
            DeploymentEnv::Test => "Testnet",
            DeploymentEnv::Local => "Local",
        };
        write!(f, "{name}")
    }
}

/// One shooter contract deployment on a network.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct DeploymentRecord {
    pub deployed_at: String,
    pub contract_id: String,
    /// SHA-256 of the ABI the contract was deployed with.
    pub abi_hash: String,
    pub network_url: String,
}

impl DeploymentRecord {
    pub fn new(
        contract_id: impl Into<String>,
        abi_hash: impl Into<String>,
        network_url: impl Into<String>,
    ) -> Self {
        Self {
            deployed_at: Utc::now().to_rfc3339(),
            contract_id: contract_id.into(),
            abi_hash: abi_hash.into(),
            network_url: network_url.into(),
        }
    }

    pub fn is_compatible_with_hash(&self, hash: &str) -> bool {
        self.abi_hash == hash
    }
}

#[derive(Debug)]
pub struct DeploymentStore {
    path: PathBuf,
}

impl DeploymentStore {
    pub fn new(env: DeploymentEnv) -> Result<Self> {
        Self::in_root(DEPLOYMENTS_ROOT, env)
    }

    pub fn in_root(root: impl AsRef<Path>, env: DeploymentEnv) -> Result<Self> {
        let path = ensure_store(root.as_ref(), env)?;
        Ok(Self { path })
    }

    pub fn load(&self) -> Result<Vec<DeploymentRecord>> {
        read_records(&self.path)
    }

    pub fn append(&self, record: DeploymentRecord) -> Result<()> {
        let mut records = self.load()?;
        records.push(record);
        write_records(&self.path, &records)
    }

    /// Most recently appended record deployed with `abi_hash`.
    pub fn latest_compatible(&self, abi_hash: &str) -> Result<Option<DeploymentRecord>> {
        let records = self.load()?;
        Ok(records
            .into_iter()
            .rev()
            .find(|record| record.is_compatible_with_hash(abi_hash)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

pub fn compute_abi_hash(abi: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(abi);
    format!("{:x}", hasher.finalize())
}

/// Creates `<root>/<env>/deployments.json` holding `[]` if it is missing.
fn ensure_store(root: &Path, env: DeploymentEnv) -> Result<PathBuf> {
    let env_dir = root.join(env.dir_name());
    fs::create_dir_all(&env_dir).wrap_err_with(|| {
        format!("Failed to create {env} deployment directory {}", env_dir.display())
    })?;
    let file_path = env_dir.join(DEPLOYMENTS_FILE);
    if !file_path.exists() {
        write_records(&file_path, &[])?;
    }
    Ok(file_path)
}

fn read_records(path: &Path) -> Result<Vec<DeploymentRecord>> {
    let data = fs::read(path)
        .wrap_err_with(|| format!("Failed to read deployment records {}", path.display()))?;
    if data.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }
    serde_json::from_slice(&data)
        .wrap_err_with(|| format!("Malformed deployment records in {}", path.display()))
}

fn write_records(path: &Path, records: &[DeploymentRecord]) -> Result<()> {
    let json = serde_json::to_vec_pretty(records)
        .wrap_err("Failed to serialize deployment records")?;
    fs::write(path, json)
        .wrap_err_with(|| format!("Failed to write deployment records {}", path.display()))
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;
    use tempdir::TempDir;

    fn record(contract_id: &str, abi_hash: &str) -> DeploymentRecord {
        DeploymentRecord::new(contract_id, abi_hash, "http://localhost:4000/")
    }

    #[test]
    fn in_root__creates_empty_record_file() {
        // given
        let root = TempDir::new("deployments").unwrap();

        // when
        let store = DeploymentStore::in_root(root.path(), DeploymentEnv::Local).unwrap();

        // then
        assert!(store.path().ends_with("local/deployments.json"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn append__records_survive_reopening_the_store() {
        // given
        let root = TempDir::new("deployments").unwrap();
        let store = DeploymentStore::in_root(root.path(), DeploymentEnv::Test).unwrap();
        let first = record("0xaaaa", "hash-a");

        // when
        store.append(first.clone()).unwrap();
        let reopened = DeploymentStore::in_root(root.path(), DeploymentEnv::Test).unwrap();

        // then
        assert_eq!(reopened.load().unwrap(), vec![first]);
    }

    #[test]
    fn latest_compatible__picks_newest_record_with_matching_hash() {
        // given
        let root = TempDir::new("deployments").unwrap();
        let store = DeploymentStore::in_root(root.path(), DeploymentEnv::Dev).unwrap();
        store.append(record("0x01", "current")).unwrap();
        store.append(record("0x02", "current")).unwrap();
        store.append(record("0x03", "stale")).unwrap();

        // when
        let selected = store.latest_compatible("current").unwrap();

        // then
        assert_eq!(selected.map(|r| r.contract_id), Some("0x02".to_string()));
    }

    #[test]
    fn latest_compatible__no_matching_hash__is_none() {
        let root = TempDir::new("deployments").unwrap();
        let store = DeploymentStore::in_root(root.path(), DeploymentEnv::Dev).unwrap();
        store.append(record("0x01", "stale")).unwrap();

        assert_eq!(store.latest_compatible("current").unwrap(), None);
    }

    #[test]
    fn load__hand_written_records_file__is_parsed() {
        // given
        let root = TempDir::new("deployments").unwrap();
        let store = DeploymentStore::in_root(root.path(), DeploymentEnv::Local).unwrap();
        fs::write(
            store.path(),
            r#"[{"deployed_at":"2026-01-01T00:00:00Z","contract_id":"0x01","abi_hash":"current","network_url":"http://localhost:4000/"}]"#,
        )
        .unwrap();

        // when
        let selected = store.latest_compatible("current").unwrap();

        // then
        assert_eq!(selected.map(|r| r.deployed_at), Some("2026-01-01T00:00:00Z".to_string()));
    }

    #[test]
    fn compute_abi_hash__is_hex_sha256() {
        let hash = compute_abi_hash(b"");
        assert_eq!(
            hash,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
