//! Reading and provisioning keypair files.
//!
//! Two formats are accepted.  The Solana CLI format is a JSON array of the 64
//! secret key bytes.  The web3.js format is a serialised `Keypair` object
//! with the secret key stored as an object mapping byte indices to values,
//! e.g. `{"_keypair": {"secretKey": {"0": 174, "1": 47, …}}}`.  Provisioning
//! always writes the Solana CLI format.

use std::path::Path;

use serde_json::Value;
use solana_sdk::signer::keypair::{write_keypair_file, Keypair};

type Result<T = (), E = KeypairError> = core::result::Result<T, E>;

const SECRET_KEY_LEN: usize = 64;


/// Reads keypair from a JSON file in either supported format.
pub fn read_keypair(path: &Path) -> Result<Keypair> {
    parse_keypair(&std::fs::read_to_string(path)?)
}

/// Parses keypair from JSON in either supported format.
pub fn parse_keypair(json: &str) -> Result<Keypair> {
    let value: Value = serde_json::from_str(json)?;
    let bytes = match &value {
        Value::Array(items) => {
            items.iter().map(byte).collect::<Result<Vec<u8>>>()?
        }
        Value::Object(_) => {
            let secret = value
                .pointer("/_keypair/secretKey")
                .and_then(Value::as_object)
                .ok_or(KeypairError::Format)?;
            let mut bytes = vec![0u8; secret.len()];
            for (idx, val) in secret {
                let idx: usize =
                    idx.parse().map_err(|_| KeypairError::Format)?;
                *bytes.get_mut(idx).ok_or(KeypairError::Format)? = byte(val)?;
            }
            bytes
        }
        _ => return Err(KeypairError::Format),
    };
    keypair_from_bytes(&bytes)
}

/// Generates a new keypair and writes it to `path`.
///
/// Refuses to replace an existing file unless `force` is set since doing so
/// would orphan the account the old keypair addresses.
pub fn provision(path: &Path, force: bool) -> Result<Keypair> {
    if !force && path.exists() {
        return Err(KeypairError::Exists(path.display().to_string()));
    }
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty())
    {
        std::fs::create_dir_all(dir)?;
    }
    let keypair = Keypair::new();
    write_keypair_file(&keypair, path)
        .map_err(|err| KeypairError::Write(err.to_string()))?;
    Ok(keypair)
}

fn byte(value: &Value) -> Result<u8> {
    value
        .as_u64()
        .and_then(|val| u8::try_from(val).ok())
        .ok_or(KeypairError::Format)
}

fn keypair_from_bytes(bytes: &[u8]) -> Result<Keypair> {
    if bytes.len() != SECRET_KEY_LEN {
        return Err(KeypairError::Length(bytes.len()));
    }
    Keypair::try_from(bytes).map_err(|err| KeypairError::Key(err.to_string()))
}


#[derive(Debug, derive_more::Display, derive_more::From)]
pub enum KeypairError {
    #[display("io: {_0}")]
    Io(std::io::Error),
    #[display("malformed keypair file: {_0}")]
    Json(serde_json::Error),
    #[display("unrecognised keypair file format")]
    #[from(ignore)]
    Format,
    #[display("secret key must be 64 bytes, got {_0}")]
    #[from(ignore)]
    Length(usize),
    #[display("invalid secret key: {_0}")]
    #[from(ignore)]
    Key(String),
    #[display("{_0}: file already exists")]
    #[from(ignore)]
    Exists(String),
    #[display("writing keypair: {_0}")]
    #[from(ignore)]
    Write(String),
}

impl std::error::Error for KeypairError {}
