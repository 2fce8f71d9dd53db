//! The portal’s flow: wallet connection, account initialisation and
//! submission of GIF links.
//!
//! All operations take `&mut self` and run to completion before returning
//! so no two remote calls issued by one controller ever overlap.  Nothing is
//! retried; failures are logged and returned to the caller.

use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Signature, Signer};

use crate::config::Config;
use crate::program::{CallError, FetchError, GifProgram, Network};
use crate::state::{GifList, Phase, Session, ViewState};
use crate::view::View;
use crate::wallet::{Wallet, WalletError};

type Result<T = (), E = Error> = core::result::Result<T, E>;

/// Alert raised when no wallet is available.
pub const WALLET_NOT_FOUND: &str =
    "Wallet not found! Configure a Solana wallet keypair to use the portal.";


pub struct Controller<W, N> {
    config: Config,
    wallet: Option<W>,
    network: N,
    state: ViewState,
}

impl<W: Wallet, N: Network> Controller<W, N> {
    /// Creates controller in the disconnected state.  `wallet` is `None`
    /// when no wallet is available in the environment.
    pub fn new(config: Config, wallet: Option<W>, network: N) -> Self {
        Self { config, wallet, network, state: ViewState::default() }
    }

    pub fn state(&self) -> &ViewState { &self.state }

    pub fn config(&self) -> &Config { &self.config }

    pub fn network(&self) -> &N { &self.network }

    pub fn view(&self) -> View { View::render(&self.state) }

    /// Address of the shared account the portal reads and writes.
    pub fn base_account(&self) -> Pubkey { self.config.base_account.pubkey() }

    /// Reconnects to a wallet which has approved the portal before.
    ///
    /// Meant to run once at start-up.  If there’s no wallet at all, raises an
    /// alert and fails with [`Error::WalletNotFound`].  Otherwise never asks
    /// the user; if the wallet hasn’t approved the portal the session stays
    /// disconnected and the error is only logged.
    pub fn detect_and_reconnect(&mut self) -> Result<Pubkey> {
        let Some(wallet) = self.wallet.as_ref() else {
            tracing::error!("{WALLET_NOT_FOUND}");
            self.state.alert = Some(WALLET_NOT_FOUND.into());
            return Err(Error::WalletNotFound);
        };
        if !wallet.is_compatible() {
            tracing::warn!("wallet is not supported");
            return Err(Error::IncompatibleWallet);
        }
        tracing::info!("wallet found");
        self.connect(true)
    }

    /// Connects to the wallet asking the user for approval if needed.
    pub fn connect_wallet(&mut self) -> Result<Pubkey> {
        if self.wallet.is_none() {
            tracing::warn!("no wallet to connect to");
            return Err(Error::WalletNotFound);
        }
        self.connect(false)
    }

    fn connect(&mut self, only_if_trusted: bool) -> Result<Pubkey> {
        let wallet = self.wallet.as_mut().ok_or(Error::WalletNotFound)?;
        let was_connected = self.state.session.public_key().is_some();
        if !was_connected {
            self.state.session = Session::Connecting;
        }
        let pubkey = match wallet.connect(only_if_trusted) {
            Ok(pubkey) => pubkey,
            Err(err) => {
                tracing::warn!(only_if_trusted, "connecting wallet: {err}");
                if !was_connected {
                    self.state.session = Session::Disconnected;
                }
                return Err(Error::Connect(err));
            }
        };
        tracing::info!(%pubkey, "connected with public key");
        self.state.session = Session::Connected(pubkey);
        if !was_connected {
            // A failure leaves the list marked as not initialised which is
            // all the caller needs; the connection itself succeeded.
            let _ = self.fetch_list();
        }
        Ok(pubkey)
    }

    /// Fetches the shared account and updates the list.
    ///
    /// Any failure, including the account not existing, marks the list as
    /// [`GifList::NotInitialized`].  Returns number of GIFs in the list.
    pub fn fetch_list(&mut self) -> Result<usize> {
        self.require_session()?;
        tracing::debug!("fetching GIF list");
        let program =
            self.network.connect(&self.config.idl, self.config.program_id);
        match program.fetch_base_account(&self.base_account()) {
            Ok(account) => {
                let count = account.gif_list.len();
                tracing::info!(count, total = account.total_gifs, "got the account");
                self.state.gif_list = account.into();
                Ok(count)
            }
            Err(err) => {
                tracing::warn!("fetching GIF list: {err}");
                self.state.gif_list = GifList::NotInitialized;
                Err(Error::Fetch(err))
            }
        }
    }

    /// Creates the shared account and refreshes the list.
    ///
    /// Only valid once the list has been fetched and found missing.
    pub fn create_account(&mut self) -> Result<Signature> {
        self.require_session()?;
        if self.state.gif_list != GifList::NotInitialized {
            return Err(Error::WrongPhase(self.state.phase()));
        }
        let wallet = self.wallet.as_ref().ok_or(Error::WalletNotFound)?;
        let program =
            self.network.connect(&self.config.idl, self.config.program_id);
        let signature = program
            .start_stuff_off(wallet, &self.config.base_account)
            .map_err(|err| {
                tracing::warn!("creating base account: {err}");
                Error::Create(err)
            })?;
        tracing::info!(
            address = %self.base_account(),
            %signature,
            "created base account"
        );
        let _ = self.fetch_list();
        Ok(signature)
    }

    /// Sets value of the link input field.
    pub fn set_input(&mut self, value: impl Into<String>) {
        self.state.input = value.into();
    }

    /// Submits the link from the input field.
    ///
    /// Empty input is a no-op.  Otherwise the input is cleared before the
    /// transaction is sent and is not restored if it fails.  On success the
    /// list is fetched again.
    pub fn send_entry(&mut self) -> Result<Signature> {
        if self.state.input.is_empty() {
            tracing::info!("no GIF link given");
            return Err(Error::EmptyLink);
        }
        self.require_session()?;
        let link = core::mem::take(&mut self.state.input);
        tracing::info!(link = %link, "sending GIF link");

        let wallet = self.wallet.as_ref().ok_or(Error::WalletNotFound)?;
        let program =
            self.network.connect(&self.config.idl, self.config.program_id);
        let signature = program
            .add_gif(wallet, &self.base_account(), &link)
            .map_err(|err| {
                tracing::warn!("sending GIF link: {err}");
                Error::Append(err)
            })?;
        tracing::info!(%signature, "GIF link sent");
        let _ = self.fetch_list();
        Ok(signature)
    }

    fn require_session(&self) -> Result<Pubkey> {
        self.state.session.public_key().copied().ok_or(Error::NotConnected)
    }
}


#[derive(Debug, derive_more::Display)]
pub enum Error {
    #[display("no wallet available")]
    WalletNotFound,
    #[display("wallet is not supported")]
    IncompatibleWallet,
    #[display("wallet is not connected")]
    NotConnected,
    #[display("no GIF link given")]
    EmptyLink,
    #[display("operation not available in {_0:?} phase")]
    WrongPhase(Phase),
    #[display("connecting wallet: {_0}")]
    Connect(WalletError),
    #[display("fetching GIF list: {_0}")]
    Fetch(FetchError),
    #[display("creating GIF account: {_0}")]
    Create(CallError),
    #[display("sending GIF link: {_0}")]
    Append(CallError),
}

impl std::error::Error for Error {}
