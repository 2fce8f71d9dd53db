//! Wallet capability used by the portal.
//!
//! The controller never handles user key material directly.  It talks to a
//! [`Wallet`] which grants connections and signs transactions as the fee
//! payer.  [`KeypairWallet`] is a wallet backed by a local keypair file which
//! remembers approved connections in a [`TrustStore`].

use std::collections::BTreeSet;
use std::path::PathBuf;

use solana_sdk::hash::Hash;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signer;
use solana_sdk::signer::keypair::Keypair;
use solana_sdk::signer::SignerError;
use solana_sdk::transaction::Transaction;

type Result<T = (), E = WalletError> = core::result::Result<T, E>;


pub trait Wallet {
    /// Whether the wallet is one the portal knows how to work with.
    fn is_compatible(&self) -> bool;

    /// Requests connection to the wallet and returns its public key.
    ///
    /// With `only_if_trusted` set the wallet must not ask the user for
    /// approval; if the portal hasn’t been approved before the request fails
    /// with [`WalletError::NotTrusted`].
    fn connect(&mut self, only_if_trusted: bool) -> Result<Pubkey>;

    /// Public key of the connected wallet or `None` if not connected.
    fn public_key(&self) -> Option<Pubkey>;

    /// Adds the wallet’s signature to a transaction.
    fn sign_transaction(
        &self,
        tx: &mut Transaction,
        blockhash: Hash,
    ) -> Result;
}

impl<W: Wallet + ?Sized> Wallet for Box<W> {
    fn is_compatible(&self) -> bool { (**self).is_compatible() }

    fn connect(&mut self, only_if_trusted: bool) -> Result<Pubkey> {
        (**self).connect(only_if_trusted)
    }

    fn public_key(&self) -> Option<Pubkey> { (**self).public_key() }

    fn sign_transaction(
        &self,
        tx: &mut Transaction,
        blockhash: Hash,
    ) -> Result {
        (**self).sign_transaction(tx, blockhash)
    }
}


/// Asks the user whether to allow the portal to use their wallet.
pub trait Approve {
    fn approve(&mut self, pubkey: &Pubkey) -> bool;
}

impl<F: FnMut(&Pubkey) -> bool> Approve for F {
    fn approve(&mut self, pubkey: &Pubkey) -> bool { self(pubkey) }
}


/// Set of wallets which approved the portal.
///
/// Persisted as a text file with one base58 public key per line.  Without
/// a path the store lives in memory only.
#[derive(Debug, Default)]
pub struct TrustStore {
    path: Option<PathBuf>,
    trusted: BTreeSet<Pubkey>,
}

impl TrustStore {
    pub fn in_memory() -> Self { Self::default() }

    /// Opens trust store at given path.  Missing file is treated as an empty
    /// store; unparseable lines are skipped.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let trusted = match std::fs::read_to_string(&path) {
            Ok(data) => data
                .lines()
                .filter_map(|line| line.trim().parse().ok())
                .collect(),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                BTreeSet::new()
            }
            Err(err) => return Err(err.into()),
        };
        Ok(Self { path: Some(path), trusted })
    }

    pub fn contains(&self, pubkey: &Pubkey) -> bool {
        self.trusted.contains(pubkey)
    }

    /// Records the key as trusted and writes the store back to disk.
    ///
    /// The key is remembered only once the store has been saved.
    pub fn insert(&mut self, pubkey: Pubkey) -> Result {
        if self.trusted.contains(&pubkey) {
            return Ok(());
        }
        if let Some(path) = &self.path {
            if let Some(dir) = path.parent() {
                std::fs::create_dir_all(dir)?;
            }
            let data: String = self
                .trusted
                .iter()
                .chain(core::iter::once(&pubkey))
                .map(|key| format!("{key}\n"))
                .collect();
            std::fs::write(path, data)?;
        }
        self.trusted.insert(pubkey);
        Ok(())
    }
}


/// Wallet backed by a keypair held in memory.
pub struct KeypairWallet<A> {
    keypair: Keypair,
    trust: TrustStore,
    approver: A,
    connected: bool,
}

impl<A: Approve> KeypairWallet<A> {
    pub fn new(keypair: Keypair, trust: TrustStore, approver: A) -> Self {
        Self { keypair, trust, approver, connected: false }
    }
}

impl<A: Approve> Wallet for KeypairWallet<A> {
    fn is_compatible(&self) -> bool { true }

    fn connect(&mut self, only_if_trusted: bool) -> Result<Pubkey> {
        let pubkey = self.keypair.pubkey();
        if !self.trust.contains(&pubkey) {
            if only_if_trusted {
                return Err(WalletError::NotTrusted);
            }
            if !self.approver.approve(&pubkey) {
                return Err(WalletError::Rejected);
            }
            self.trust.insert(pubkey)?;
        }
        self.connected = true;
        Ok(pubkey)
    }

    fn public_key(&self) -> Option<Pubkey> {
        self.connected.then(|| self.keypair.pubkey())
    }

    fn sign_transaction(
        &self,
        tx: &mut Transaction,
        blockhash: Hash,
    ) -> Result {
        if !self.connected {
            return Err(WalletError::NotConnected);
        }
        tx.try_partial_sign(&[&self.keypair], blockhash)?;
        Ok(())
    }
}


#[derive(Debug, derive_more::Display, derive_more::From)]
pub enum WalletError {
    #[display("portal has not been approved by the wallet")]
    #[from(ignore)]
    NotTrusted,
    #[display("user rejected the connection request")]
    #[from(ignore)]
    Rejected,
    #[display("wallet is not connected")]
    #[from(ignore)]
    NotConnected,
    #[display("signing failed: {_0}")]
    Signer(SignerError),
    #[display("io: {_0}")]
    Io(std::io::Error),
}

impl std::error::Error for WalletError {}
