//! Client of the on-chain GIF Portal program.
//!
//! [`GifProgram`] is the typed interface the controller calls: one reader for
//! the shared account and one method per program instruction.
//! [`RpcGifProgram`] implements it over a JSON RPC connection.  A fresh
//! connection is opened by [`Network::connect`] each time the controller
//! talks to the cluster.

use core::slice;

use solana_client::client_error::ClientError;
use solana_client::rpc_client::RpcClient;
use solana_client::rpc_config::RpcTransactionConfig;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::instruction::Instruction;
use solana_sdk::message::Message;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Signature, Signer};
use solana_sdk::signer::keypair::Keypair;
use solana_sdk::signer::SignerError;
use solana_sdk::transaction::Transaction;
use solana_transaction_status::option_serializer::OptionSerializer;
use solana_transaction_status::UiTransactionEncoding;

use crate::account::{BaseAccount, DecodeError, BASE_ACCOUNT};
use crate::config::Config;
use crate::idl::{Idl, IdlError};
use crate::wallet::{Wallet, WalletError};

/// IDL name of the instruction creating the shared account.
pub const START_STUFF_OFF: &str = "startStuffOff";
/// IDL name of the instruction appending a GIF to the list.
pub const ADD_GIF: &str = "addGif";


pub trait GifProgram {
    /// Reads the shared account.
    fn fetch_base_account(
        &self,
        address: &Pubkey,
    ) -> Result<BaseAccount, FetchError>;

    /// Creates the shared account.  `base_account` co-signs the transaction
    /// and `wallet` pays for it.
    fn start_stuff_off(
        &self,
        wallet: &dyn Wallet,
        base_account: &Keypair,
    ) -> Result<Signature, CallError>;

    /// Appends a GIF link to the shared account’s list on behalf of `wallet`.
    fn add_gif(
        &self,
        wallet: &dyn Wallet,
        base_account: &Pubkey,
        gif_link: &str,
    ) -> Result<Signature, CallError>;
}

/// Source of program clients.
pub trait Network {
    type Program: GifProgram;

    /// Opens a new connection and builds a program client on top of it.
    fn connect(&self, idl: &Idl, program_id: Pubkey) -> Self::Program;
}


/// Network reached over JSON RPC.
#[derive(Clone, Debug)]
pub struct RpcNetwork {
    url: String,
    commitment: CommitmentConfig,
}

impl RpcNetwork {
    pub fn new(url: impl Into<String>, commitment: CommitmentConfig) -> Self {
        Self { url: url.into(), commitment }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.cluster.url(), config.commitment)
    }

    pub fn url(&self) -> &str { &self.url }
}

impl Network for RpcNetwork {
    type Program = RpcGifProgram;

    fn connect(&self, idl: &Idl, program_id: Pubkey) -> RpcGifProgram {
        tracing::debug!(url = %self.url, commitment = ?self.commitment.commitment, "opening connection");
        RpcGifProgram {
            client: RpcClient::new_with_commitment(
                self.url.clone(),
                self.commitment,
            ),
            idl: idl.clone(),
            program_id,
        }
    }
}


/// Program client over an RPC connection.
pub struct RpcGifProgram {
    client: RpcClient,
    idl: Idl,
    program_id: Pubkey,
}

impl RpcGifProgram {
    /// Returns log messages the program emitted in given transaction.
    pub fn transaction_logs(
        &self,
        signature: &Signature,
    ) -> Result<Vec<String>, CallError> {
        let config = RpcTransactionConfig {
            encoding: Some(UiTransactionEncoding::Binary),
            commitment: Some(CommitmentConfig::confirmed()),
            max_supported_transaction_version: Some(0),
        };
        let resp = self.client.get_transaction_with_config(signature, config)?;
        tracing::debug!(slot = resp.slot, %signature, "fetched transaction");
        let log_messages = resp
            .transaction
            .meta
            .map(|meta| meta.log_messages)
            .ok_or(CallError::Msg("No transaction metadata"))?;
        match log_messages {
            OptionSerializer::Some(messages) => Ok(messages),
            _ => Err(CallError::Msg("No log message")),
        }
    }

    /// Signs a transaction with the wallet and optional co-signer and sends
    /// it, waiting for confirmation at connection’s commitment.
    fn send(
        &self,
        wallet: &dyn Wallet,
        instruction: Instruction,
        cosigner: Option<&Keypair>,
    ) -> Result<Signature, CallError> {
        let payer = wallet.public_key().ok_or(WalletError::NotConnected)?;
        let blockhash = self.client.get_latest_blockhash()?;
        tracing::debug!(%blockhash, program = %instruction.program_id, "sending transaction");

        let message = Message::new_with_blockhash(
            slice::from_ref(&instruction),
            Some(&payer),
            &blockhash,
        );
        let mut tx = Transaction::new_unsigned(message);
        if let Some(cosigner) = cosigner {
            tx.try_partial_sign(&[cosigner], blockhash)?;
        }
        wallet.sign_transaction(&mut tx, blockhash)?;

        let signature = self.client.send_and_confirm_transaction(&tx)?;
        tracing::debug!(%signature, "transaction confirmed");
        Ok(signature)
    }
}

impl GifProgram for RpcGifProgram {
    fn fetch_base_account(
        &self,
        address: &Pubkey,
    ) -> Result<BaseAccount, FetchError> {
        let account = self
            .client
            .get_account_with_commitment(address, self.client.commitment())?
            .value
            .ok_or(FetchError::NotFound)?;
        if account.owner != self.program_id {
            return Err(FetchError::Owner(account.owner));
        }
        let discriminator = self.idl.account_discriminator(BASE_ACCOUNT)?;
        Ok(BaseAccount::decode(&discriminator, &account.data)?)
    }

    fn start_stuff_off(
        &self,
        wallet: &dyn Wallet,
        base_account: &Keypair,
    ) -> Result<Signature, CallError> {
        let user = wallet.public_key().ok_or(WalletError::NotConnected)?;
        let instruction = start_stuff_off_instruction(
            &self.idl,
            self.program_id,
            base_account.pubkey(),
            user,
        )?;
        self.send(wallet, instruction, Some(base_account))
    }

    fn add_gif(
        &self,
        wallet: &dyn Wallet,
        base_account: &Pubkey,
        gif_link: &str,
    ) -> Result<Signature, CallError> {
        let user = wallet.public_key().ok_or(WalletError::NotConnected)?;
        let instruction = add_gif_instruction(
            &self.idl,
            self.program_id,
            *base_account,
            user,
            gif_link,
        )?;
        self.send(wallet, instruction, None)
    }
}


/// Builds `startStuffOff` instruction.
pub fn start_stuff_off_instruction(
    idl: &Idl,
    program_id: Pubkey,
    base_account: Pubkey,
    user: Pubkey,
) -> Result<Instruction, CallError> {
    let ix = idl.instruction(START_STUFF_OFF)?;
    let accounts = ix.account_metas(&[
        ("baseAccount", base_account),
        ("user", user),
        ("systemProgram", solana_system_interface::program::ID),
    ])?;
    Ok(Instruction { program_id, accounts, data: ix.discriminator().to_vec() })
}

/// Builds `addGif` instruction.
///
/// The link is encoded as a Borsh string, i.e. prefixed by its length as
/// a 32-bit little-endian integer.
pub fn add_gif_instruction(
    idl: &Idl,
    program_id: Pubkey,
    base_account: Pubkey,
    user: Pubkey,
    gif_link: &str,
) -> Result<Instruction, CallError> {
    let ix = idl.instruction(ADD_GIF)?;
    let accounts =
        ix.account_metas(&[("baseAccount", base_account), ("user", user)])?;
    let data = [
        /* discriminator: */ &ix.discriminator()[..],
        /* gif_link: */ &borsh::to_vec(gif_link)?[..],
    ]
    .concat();
    Ok(Instruction { program_id, accounts, data })
}


/// Failure reading the shared account.
#[derive(Debug, derive_more::Display, derive_more::From)]
pub enum FetchError {
    #[display("account does not exist")]
    #[from(ignore)]
    NotFound,
    #[display("account is owned by {_0} rather than the GIF program")]
    #[from(ignore)]
    Owner(Pubkey),
    #[display("{_0}")]
    Idl(IdlError),
    #[display("{_0}")]
    Decode(DecodeError),
    #[display("rpc: {_0}")]
    Client(ClientError),
}

impl std::error::Error for FetchError {}

/// Failure invoking a program instruction.
#[derive(Debug, derive_more::Display, derive_more::From)]
pub enum CallError {
    #[display("{_0}")]
    Msg(&'static str),
    #[display("{_0}")]
    Idl(IdlError),
    #[display("wallet: {_0}")]
    Wallet(WalletError),
    #[display("signing: {_0}")]
    Signer(SignerError),
    #[display("encoding arguments: {_0}")]
    Borsh(std::io::Error),
    #[display("rpc: {_0}")]
    Client(ClientError),
}

impl std::error::Error for CallError {}


#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use solana_sdk::instruction::AccountMeta;

    use super::*;

    #[test]
    fn test_start_stuff_off_instruction() {
        let idl = Idl::bundled().unwrap();
        let program_id = idl.program_id().unwrap();
        let base = Pubkey::new_unique();
        let user = Pubkey::new_unique();

        let ix =
            start_stuff_off_instruction(&idl, program_id, base, user).unwrap();
        assert_eq!(program_id, ix.program_id);
        assert_eq!(
            vec![
                AccountMeta::new(base, true),
                AccountMeta::new(user, true),
                AccountMeta::new_readonly(
                    solana_system_interface::program::ID,
                    false
                ),
            ],
            ix.accounts
        );
        assert_eq!(
            idl.instruction(START_STUFF_OFF).unwrap().discriminator().to_vec(),
            ix.data
        );
    }

    #[test]
    fn test_add_gif_instruction() {
        let idl = Idl::bundled().unwrap();
        let program_id = idl.program_id().unwrap();
        let base = Pubkey::new_unique();
        let user = Pubkey::new_unique();

        let ix =
            add_gif_instruction(&idl, program_id, base, user, "http://x/1.gif")
                .unwrap();
        assert_eq!(
            vec![AccountMeta::new(base, false), AccountMeta::new(user, true)],
            ix.accounts
        );
        let disc = idl.instruction(ADD_GIF).unwrap().discriminator();
        let (head, tail) = ix.data.split_at(8);
        assert_eq!(&disc[..], head);
        assert_eq!(b"\x0e\0\0\0http://x/1.gif", tail);
    }

    #[test]
    fn test_network_connects_with_commitment() {
        let network = RpcNetwork::new(
            "http://127.0.0.1:8899",
            CommitmentConfig::processed(),
        );
        let idl = Idl::bundled().unwrap();
        let program = network.connect(&idl, idl.program_id().unwrap());
        assert_eq!(CommitmentConfig::processed(), program.client.commitment());
        assert_eq!("http://127.0.0.1:8899", program.client.url());
    }
}
