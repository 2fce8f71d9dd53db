//! Portal configuration.
//!
//! [`Settings`] is the user-facing, partially specified form read from a
//! TOML file and command line flags.  [`Settings::resolve`] turns it into a
//! [`Config`] which the controller is constructed with.

use core::fmt;
use core::str::FromStr;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::pubkey::{ParsePubkeyError, Pubkey};
use solana_sdk::signer::keypair::Keypair;

use crate::idl::{Idl, IdlError};
use crate::keypair::{read_keypair, KeypairError};

type Result<T = (), E = ConfigError> = core::result::Result<T, E>;

/// Default location of the shared account’s keypair.
pub const DEFAULT_BASE_ACCOUNT: &str = "keypair.json";


/// Solana cluster the portal talks to.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Cluster {
    #[default]
    Devnet,
    Testnet,
    MainnetBeta,
    Localnet,
    Custom(String),
}

impl Cluster {
    /// JSON RPC endpoint of the cluster.
    pub fn url(&self) -> &str {
        match self {
            Self::Devnet => "https://api.devnet.solana.com",
            Self::Testnet => "https://api.testnet.solana.com",
            Self::MainnetBeta => "https://api.mainnet-beta.solana.com",
            Self::Localnet => "http://127.0.0.1:8899",
            Self::Custom(url) => url.as_str(),
        }
    }
}

impl FromStr for Cluster {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self> {
        Ok(match value {
            "devnet" => Self::Devnet,
            "testnet" => Self::Testnet,
            "mainnet-beta" | "mainnet" => Self::MainnetBeta,
            "localnet" | "localhost" => Self::Localnet,
            url if url.starts_with("http://") ||
                url.starts_with("https://") =>
            {
                Self::Custom(url.into())
            }
            _ => return Err(ConfigError::Cluster(value.into())),
        })
    }
}

impl fmt::Display for Cluster {
    fn fmt(&self, fmtr: &mut fmt::Formatter) -> fmt::Result {
        fmtr.write_str(match self {
            Self::Devnet => "devnet",
            Self::Testnet => "testnet",
            Self::MainnetBeta => "mainnet-beta",
            Self::Localnet => "localnet",
            Self::Custom(url) => url.as_str(),
        })
    }
}

/// Parses commitment level name.
pub fn parse_commitment(value: &str) -> Result<CommitmentConfig> {
    match value {
        "processed" => Ok(CommitmentConfig::processed()),
        "confirmed" => Ok(CommitmentConfig::confirmed()),
        "finalized" => Ok(CommitmentConfig::finalized()),
        _ => Err(ConfigError::Commitment(value.into())),
    }
}


/// Resolved configuration the controller operates with.
pub struct Config {
    pub cluster: Cluster,
    /// Commitment used both for reads and for transaction preflight.
    pub commitment: CommitmentConfig,
    pub idl: Idl,
    pub program_id: Pubkey,
    /// Keypair of the shared account holding the GIF list.
    pub base_account: Keypair,
}

impl Config {
    /// Configuration using bundled IDL on devnet with `processed`
    /// commitment.
    pub fn new(base_account: Keypair) -> Result<Self> {
        let idl = Idl::bundled()?;
        let program_id = idl.program_id()?;
        Ok(Self {
            cluster: Cluster::default(),
            commitment: CommitmentConfig::processed(),
            idl,
            program_id,
            base_account,
        })
    }
}


/// Configuration as written in the settings file.  All fields are optional.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct Settings {
    pub cluster: Option<String>,
    pub commitment: Option<String>,
    /// Path to the program’s IDL; bundled IDL is used if missing.
    pub idl: Option<PathBuf>,
    /// Program address; taken from the IDL if missing.
    pub program_id: Option<String>,
    pub base_account: Option<PathBuf>,
    /// Keypair file of the wallet.
    pub wallet: Option<PathBuf>,
    /// File remembering wallets which approved the portal.
    pub trust_store: Option<PathBuf>,
}

impl Settings {
    pub fn from_toml(data: &str) -> Result<Self> { Ok(toml::from_str(data)?) }

    /// Reads settings from a TOML file.  A missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(data) => Self::from_toml(&data),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no settings file");
                Ok(Self::default())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Overlays `other` on top of `self`; fields set in `other` win.
    pub fn merge(self, other: Settings) -> Self {
        Self {
            cluster: other.cluster.or(self.cluster),
            commitment: other.commitment.or(self.commitment),
            idl: other.idl.or(self.idl),
            program_id: other.program_id.or(self.program_id),
            base_account: other.base_account.or(self.base_account),
            wallet: other.wallet.or(self.wallet),
            trust_store: other.trust_store.or(self.trust_store),
        }
    }

    /// Path to the wallet keypair, `~/.config/solana/id.json` by default.
    pub fn wallet_path(&self) -> Result<PathBuf> {
        match &self.wallet {
            Some(path) => Ok(path.clone()),
            None => Ok(home()?.join(".config/solana/id.json")),
        }
    }

    /// Path to the trust store, `~/.config/gif-portal/trusted` by default.
    pub fn trust_store_path(&self) -> Result<PathBuf> {
        match &self.trust_store {
            Some(path) => Ok(path.clone()),
            None => Ok(home()?.join(".config/gif-portal/trusted")),
        }
    }

    pub fn base_account_path(&self) -> &Path {
        self.base_account
            .as_deref()
            .unwrap_or(Path::new(DEFAULT_BASE_ACCOUNT))
    }

    /// Loads IDL and the shared account’s keypair and produces final
    /// configuration.
    pub fn resolve(&self) -> Result<Config> {
        let cluster = match &self.cluster {
            Some(cluster) => cluster.parse()?,
            None => Cluster::default(),
        };
        let commitment = match &self.commitment {
            Some(level) => parse_commitment(level)?,
            None => CommitmentConfig::processed(),
        };
        let idl = match &self.idl {
            Some(path) => Idl::load(path)?,
            None => Idl::bundled()?,
        };
        let program_id = match &self.program_id {
            Some(id) => Pubkey::from_str(id)?,
            None => idl.program_id()?,
        };
        let base_account = read_keypair(self.base_account_path())?;
        Ok(Config { cluster, commitment, idl, program_id, base_account })
    }
}

fn home() -> Result<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from).ok_or(ConfigError::NoHome)
}


#[derive(Debug, derive_more::Display, derive_more::From)]
pub enum ConfigError {
    #[display("io: {_0}")]
    Io(std::io::Error),
    #[display("malformed settings: {_0}")]
    Toml(toml::de::Error),
    #[display("{_0}")]
    Idl(IdlError),
    #[display("base account: {_0}")]
    Keypair(KeypairError),
    #[display("invalid program id: {_0}")]
    ProgramId(ParsePubkeyError),
    #[display("unknown cluster: {_0}")]
    #[from(ignore)]
    Cluster(String),
    #[display("unknown commitment level: {_0}")]
    #[from(ignore)]
    Commitment(String),
    #[display("HOME is not set")]
    #[from(ignore)]
    NoHome,
}

impl std::error::Error for ConfigError {}


#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use solana_sdk::commitment_config::CommitmentLevel;

    use super::*;

    #[test]
    fn test_cluster() {
        assert_eq!(Cluster::Devnet, "devnet".parse().unwrap());
        assert_eq!("https://api.devnet.solana.com", Cluster::Devnet.url());
        let custom: Cluster = "http://10.0.0.1:8899".parse().unwrap();
        assert_eq!("http://10.0.0.1:8899", custom.url());
        assert_eq!("mainnet-beta", Cluster::MainnetBeta.to_string());
        assert!("moon".parse::<Cluster>().is_err());
    }

    #[test]
    fn test_commitment() {
        assert_eq!(
            CommitmentLevel::Processed,
            parse_commitment("processed").unwrap().commitment
        );
        assert!(parse_commitment("recent").is_err());
    }

    #[test]
    fn test_settings_merge() {
        let file = Settings::from_toml(
            r#"
            cluster = "localnet"
            base-account = "assets/keypair.json"
            "#,
        )
        .unwrap();
        let flags = Settings {
            cluster: Some("devnet".into()),
            ..Settings::default()
        };
        let merged = file.merge(flags);
        assert_eq!(Some(String::from("devnet")), merged.cluster);
        assert_eq!(Path::new("assets/keypair.json"), merged.base_account_path());
        assert!(Settings::from_toml("colour = \"blue\"").is_err());
    }

    #[test]
    fn test_resolve() {
        let dir = std::env::temp_dir()
            .join(format!("gif-portal-config-{}", std::process::id()));
        let path = dir.join("keypair.json");
        let keypair = crate::keypair::provision(&path, true).unwrap();

        let settings =
            Settings { base_account: Some(path), ..Settings::default() };
        let config = settings.resolve().unwrap();
        assert_eq!(Cluster::Devnet, config.cluster);
        assert_eq!(CommitmentLevel::Processed, config.commitment.commitment);
        assert_eq!(config.idl.program_id().unwrap(), config.program_id);
        assert_eq!(
            solana_sdk::signature::Signer::pubkey(&keypair),
            solana_sdk::signature::Signer::pubkey(&config.base_account)
        );
        let _ = std::fs::remove_dir_all(&dir);
    }
}
